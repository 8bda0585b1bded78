use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::identity::Identity;
use crate::ports::order_repository::RepoError;

/// Credential store. Usernames and emails are unique ignoring ASCII case;
/// `create_identity` reports a clash as [`RepoError::Conflict`].
#[async_trait]
pub trait IdentityRepository: Send + Sync + 'static {
    async fn create_identity(&self, identity: Identity) -> Result<Identity, RepoError>;
    async fn find_identity_by_id(&self, id: Uuid) -> Result<Option<Identity>, RepoError>;
    async fn find_identity_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, RepoError>;
    /// Overwrites the stored record; `Ok(None)` when the id is unknown.
    async fn update_identity(&self, identity: Identity) -> Result<Option<Identity>, RepoError>;
}
