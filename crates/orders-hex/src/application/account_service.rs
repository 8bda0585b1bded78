use std::sync::Arc;

use chrono::{DateTime, Utc};
use orders_types::domain::identity::{AuthenticationResponse, Credentials, Identity, Registration};
use orders_types::ports::identity_repository::IdentityRepository;
use orders_types::ports::order_repository::RepoError;
use subtle::ConstantTimeEq;

use crate::application::password;
use crate::application::token_service::TokenService;
use crate::errors::AppError;

pub const INVALID_CREDENTIALS: &str = "Invalid username or password";
pub const INVALID_ACCESS_TOKEN: &str = "Invalid jwt access token";
pub const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";

pub struct AccountService<R: IdentityRepository> {
    repo: R,
    tokens: Arc<TokenService>,
}

/// True when `presented` equals the stored refresh token and the stored
/// expiry lies strictly after `now`.
pub fn refresh_token_is_valid(identity: &Identity, presented: &str, now: DateTime<Utc>) -> bool {
    let (Some(stored), Some(expires_at)) = (
        identity.refresh_token.as_deref(),
        identity.refresh_token_expiration,
    ) else {
        return false;
    };
    let matches: bool = stored.as_bytes().ct_eq(presented.as_bytes()).into();
    matches && expires_at > now
}

/// Verifies `plain` against `stored_hash`, or against
/// [`password::DUMMY_PASSWORD_HASH`] when there is no account. A missing
/// account never verifies.
async fn check_password(plain: String, stored_hash: Option<String>) -> Result<bool, AppError> {
    let known = stored_hash.is_some();
    let hash = stored_hash.unwrap_or_else(|| password::DUMMY_PASSWORD_HASH.to_string());
    let verified = tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(known && verified)
}

impl<R: IdentityRepository> AccountService<R> {
    pub fn new(repo: R, tokens: Arc<TokenService>) -> Self {
        Self { repo, tokens }
    }

    pub async fn register(
        &self,
        registration: Registration,
    ) -> Result<AuthenticationResponse, AppError> {
        if self
            .repo
            .find_identity_by_username(&registration.username)
            .await?
            .is_some()
        {
            return Err(already_registered());
        }

        let plain = registration.password.clone();
        let hash = tokio::task::spawn_blocking(move || password::hash_password(&plain))
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .map_err(|e| AppError::Internal(e.into()))?;

        let identity = match self
            .repo
            .create_identity(Identity::new(&registration, hash))
            .await
        {
            Ok(identity) => identity,
            Err(RepoError::Conflict(reason)) => {
                tracing::info!(%reason, "registration rejected");
                return Err(already_registered());
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(user_id = %identity.id, username = %identity.username, "registered");

        self.issue_and_store(identity).await
    }

    /// Unknown usernames and wrong passwords produce the same error, and
    /// both pay for one Argon2 verification.
    pub async fn login(
        &self,
        credentials: Credentials,
    ) -> Result<AuthenticationResponse, AppError> {
        let identity = self
            .repo
            .find_identity_by_username(&credentials.username)
            .await?;

        let stored_hash = identity.as_ref().map(|i| i.password_hash.clone());
        let verified = check_password(credentials.password, stored_hash).await?;
        let identity = match identity {
            Some(identity) if verified => identity,
            Some(identity) => {
                tracing::info!(user_id = %identity.id, "login failed");
                return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
            }
            None => {
                tracing::info!("login failed");
                return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
            }
        };

        tracing::info!(user_id = %identity.id, "logged in");
        self.issue_and_store(identity).await
    }

    /// Exchanges a signed (possibly expired) access token plus the current
    /// refresh token for a new pair. The stored refresh token is replaced.
    pub async fn refresh(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<AuthenticationResponse, AppError> {
        let (Some(access_token), Some(refresh_token)) = (access_token, refresh_token) else {
            return Err(AppError::BadRequest("Invalid client request".into()));
        };

        let principal = self
            .tokens
            .validate_and_extract_principal(access_token)
            .ok_or_else(|| AppError::BadRequest(INVALID_ACCESS_TOKEN.into()))?;

        let identity = self.repo.find_identity_by_id(principal.user_id).await?;
        let identity = match identity {
            Some(identity) if refresh_token_is_valid(&identity, refresh_token, Utc::now()) => {
                identity
            }
            _ => {
                tracing::info!(user_id = %principal.user_id, "refresh rejected");
                return Err(AppError::BadRequest(INVALID_REFRESH_TOKEN.into()));
            }
        };

        tracing::info!(user_id = %identity.id, "refreshed tokens");
        self.issue_and_store(identity).await
    }

    async fn issue_and_store(
        &self,
        mut identity: Identity,
    ) -> Result<AuthenticationResponse, AppError> {
        let response = self
            .tokens
            .create_token(&identity)
            .map_err(|e| AppError::Internal(e.into()))?;
        identity.set_refresh_token(
            response.refresh_token.clone(),
            response.refresh_token_expiration,
        );
        let id = identity.id;
        match self.repo.update_identity(identity).await? {
            Some(_) => Ok(response),
            None => Err(AppError::Internal(anyhow::anyhow!(
                "identity {id} vanished while storing its refresh token"
            ))),
        }
    }
}

fn already_registered() -> AppError {
    AppError::BadRequest("Username or email is already registered".into())
}
