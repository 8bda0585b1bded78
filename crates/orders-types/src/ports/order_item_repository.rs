use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order_item::{OrderItem, OrderItemChanges};
use crate::ports::order_repository::RepoError;

/// Item store. Every lookup is scoped by the owning order id, so an item
/// id paired with the wrong order behaves as missing.
#[async_trait]
pub trait OrderItemRepository: Send + Sync + 'static {
    async fn create_item(&self, item: OrderItem) -> Result<OrderItem, RepoError>;
    async fn get_item(&self, order_id: Uuid, id: Uuid) -> Result<Option<OrderItem>, RepoError>;
    async fn list_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, RepoError>;
    async fn update_item(
        &self,
        order_id: Uuid,
        id: Uuid,
        changes: OrderItemChanges,
    ) -> Result<Option<OrderItem>, RepoError>;
    async fn delete_item(&self, order_id: Uuid, id: Uuid) -> Result<bool, RepoError>;
}
