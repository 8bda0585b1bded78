use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use orders_types::domain::identity::Identity;
use orders_types::domain::order::{Order, OrderChanges};
use orders_types::domain::order_item::{OrderItem, OrderItemChanges};
use orders_types::ports::identity_repository::IdentityRepository;
use orders_types::ports::order_item_repository::OrderItemRepository;
use orders_types::ports::order_repository::{OrderRepository, RepoError};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct InMemoryRepo {
    pub map: Arc<DashMap<Uuid, Order>>,
    pub items: Arc<DashMap<Uuid, OrderItem>>,
    identities: Arc<DashMap<Uuid, Identity>>,
    // Lower-cased username / email -> identity id.
    usernames: Arc<DashMap<String, Uuid>>,
    emails: Arc<DashMap<String, Uuid>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            map: Arc::new(DashMap::new()),
            items: Arc::new(DashMap::new()),
            identities: Arc::new(DashMap::new()),
            usernames: Arc::new(DashMap::new()),
            emails: Arc::new(DashMap::new()),
        }
    }

    fn reserve(index: &DashMap<String, Uuid>, key: String, id: Uuid) -> bool {
        match index.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(id);
                true
            }
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        self.map.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        Ok(self.map.get(&id).map(|r| r.clone()))
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        let mut orders: Vec<Order> = self.map.iter().map(|kv| kv.value().clone()).collect();
        orders.sort_by(|a, b| a.order_date.cmp(&b.order_date).then(a.id.cmp(&b.id)));
        Ok(orders)
    }

    async fn update(&self, id: Uuid, changes: OrderChanges) -> Result<Option<Order>, RepoError> {
        if let Some(mut v) = self.map.get_mut(&id) {
            v.apply(&changes);
            return Ok(Some(v.clone()));
        }
        Ok(None)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.map.remove(&id).is_some())
    }
}

#[async_trait]
impl OrderItemRepository for InMemoryRepo {
    async fn create_item(&self, item: OrderItem) -> Result<OrderItem, RepoError> {
        self.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get_item(&self, order_id: Uuid, id: Uuid) -> Result<Option<OrderItem>, RepoError> {
        Ok(self
            .items
            .get(&id)
            .filter(|r| r.order_id == order_id)
            .map(|r| r.clone()))
    }

    async fn list_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, RepoError> {
        let mut items: Vec<OrderItem> = self
            .items
            .iter()
            .filter(|kv| kv.value().order_id == order_id)
            .map(|kv| kv.value().clone())
            .collect();
        items.sort_by(|a, b| a.product_name.cmp(&b.product_name).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn update_item(
        &self,
        order_id: Uuid,
        id: Uuid,
        changes: OrderItemChanges,
    ) -> Result<Option<OrderItem>, RepoError> {
        if let Some(mut v) = self.items.get_mut(&id) {
            if v.order_id == order_id {
                v.apply(&changes);
                return Ok(Some(v.clone()));
            }
        }
        Ok(None)
    }

    async fn delete_item(&self, order_id: Uuid, id: Uuid) -> Result<bool, RepoError> {
        Ok(self
            .items
            .remove_if(&id, |_, item| item.order_id == order_id)
            .is_some())
    }
}

#[async_trait]
impl IdentityRepository for InMemoryRepo {
    async fn create_identity(&self, identity: Identity) -> Result<Identity, RepoError> {
        let username_key = identity.username.to_ascii_lowercase();
        let email_key = identity.email.to_ascii_lowercase();

        if !Self::reserve(&self.usernames, username_key.clone(), identity.id) {
            return Err(RepoError::Conflict(format!(
                "username {} is already taken",
                identity.username
            )));
        }
        if !Self::reserve(&self.emails, email_key, identity.id) {
            self.usernames.remove(&username_key);
            return Err(RepoError::Conflict(format!(
                "email {} is already registered",
                identity.email
            )));
        }
        self.identities.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn find_identity_by_id(&self, id: Uuid) -> Result<Option<Identity>, RepoError> {
        Ok(self.identities.get(&id).map(|r| r.clone()))
    }

    async fn find_identity_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, RepoError> {
        let id = match self.usernames.get(&username.to_ascii_lowercase()) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.identities.get(&id).map(|r| r.clone()))
    }

    async fn update_identity(&self, identity: Identity) -> Result<Option<Identity>, RepoError> {
        // Username and email are fixed after registration.
        if let Some(mut v) = self.identities.get_mut(&identity.id) {
            let username = std::mem::take(&mut v.username);
            let email = std::mem::take(&mut v.email);
            *v = Identity {
                username,
                email,
                ..identity
            };
            return Ok(Some(v.clone()));
        }
        Ok(None)
    }
}
