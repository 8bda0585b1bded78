use crate::errors::AppError;
use orders_types::domain::order_item::{OrderItem, OrderItemChanges};
use orders_types::ports::order_item_repository::OrderItemRepository;
use uuid::Uuid;

/// Line items, always addressed through their owning order id.
pub struct OrderItemService<R: OrderItemRepository> {
    repo: R,
}

impl<R: OrderItemRepository> OrderItemService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn create_item(
        &self,
        order_id: Uuid,
        product_name: Option<&str>,
        quantity: Option<i64>,
        unit_price: Option<i64>,
    ) -> Result<OrderItem, AppError> {
        let item = OrderItem::new(order_id, product_name, quantity, unit_price)?;
        let item = self.repo.create_item(item).await?;
        tracing::info!(%order_id, item_id = %item.id, "order item created");
        Ok(item)
    }

    pub async fn get_item(&self, order_id: Uuid, id: Uuid) -> Result<OrderItem, AppError> {
        match self.repo.get_item(order_id, id).await? {
            Some(item) => Ok(item),
            None => Err(AppError::NotFound("Order item doesn't exist".into())),
        }
    }

    pub async fn list_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, AppError> {
        Ok(self.repo.list_items(order_id).await?)
    }

    pub async fn update_item(
        &self,
        order_id: Uuid,
        id: Uuid,
        product_name: Option<&str>,
        quantity: Option<i64>,
        unit_price: Option<i64>,
    ) -> Result<OrderItem, AppError> {
        let changes = OrderItemChanges::new(product_name, quantity, unit_price)?;
        match self.repo.update_item(order_id, id, changes).await? {
            Some(item) => {
                tracing::info!(%order_id, item_id = %id, "order item updated");
                Ok(item)
            }
            None => Err(AppError::BadRequest(
                "Order item doesn't exist while updating data".into(),
            )),
        }
    }

    pub async fn delete_item(&self, order_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if self.repo.delete_item(order_id, id).await? {
            tracing::info!(%order_id, item_id = %id, "order item deleted");
            Ok(())
        } else {
            Err(AppError::NotFound("Order item doesn't exist".into()))
        }
    }
}
