#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use async_trait::async_trait;
use orders_types::domain::identity::Identity;
use orders_types::domain::order::{Order, OrderChanges};
use orders_types::domain::order_item::{OrderItem, OrderItemChanges};
use orders_types::ports::identity_repository::IdentityRepository;
use orders_types::ports::order_item_repository::OrderItemRepository;
use orders_types::ports::order_repository::{OrderRepository, RepoError};
use uuid::Uuid;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
type Backend = sqlite::SqliteRepo;
#[cfg(all(feature = "memory", not(feature = "sqlite")))]
type Backend = memory::InMemoryRepo;

/// Backend chosen at compile time. SQLite wins when both features are on;
/// the memory adapter then stays available as `memory::InMemoryRepo`.
#[derive(Clone)]
pub struct Repo {
    inner: Backend,
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_repo(_: Option<&str>) -> anyhow::Result<Self> {
        Ok(Self {
            inner: memory::InMemoryRepo::new(),
        })
    }

    #[cfg(feature = "sqlite")]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or("sqlite://orders.db");
        let inner = sqlite::SqliteRepo::new(url).await?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl OrderRepository for Repo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        self.inner.create(order).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        self.inner.get(id).await
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        self.inner.list().await
    }

    async fn update(&self, id: Uuid, changes: OrderChanges) -> Result<Option<Order>, RepoError> {
        self.inner.update(id, changes).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        self.inner.delete(id).await
    }
}

#[async_trait]
impl OrderItemRepository for Repo {
    async fn create_item(&self, item: OrderItem) -> Result<OrderItem, RepoError> {
        self.inner.create_item(item).await
    }

    async fn get_item(&self, order_id: Uuid, id: Uuid) -> Result<Option<OrderItem>, RepoError> {
        self.inner.get_item(order_id, id).await
    }

    async fn list_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, RepoError> {
        self.inner.list_items(order_id).await
    }

    async fn update_item(
        &self,
        order_id: Uuid,
        id: Uuid,
        changes: OrderItemChanges,
    ) -> Result<Option<OrderItem>, RepoError> {
        self.inner.update_item(order_id, id, changes).await
    }

    async fn delete_item(&self, order_id: Uuid, id: Uuid) -> Result<bool, RepoError> {
        self.inner.delete_item(order_id, id).await
    }
}

#[async_trait]
impl IdentityRepository for Repo {
    async fn create_identity(&self, identity: Identity) -> Result<Identity, RepoError> {
        self.inner.create_identity(identity).await
    }

    async fn find_identity_by_id(&self, id: Uuid) -> Result<Option<Identity>, RepoError> {
        self.inner.find_identity_by_id(id).await
    }

    async fn find_identity_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, RepoError> {
        self.inner.find_identity_by_username(username).await
    }

    async fn update_identity(&self, identity: Identity) -> Result<Option<Identity>, RepoError> {
        self.inner.update_identity(identity).await
    }
}
