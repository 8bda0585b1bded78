//! Access-token signing and verification plus refresh-token minting.
//!
//! Tokens are HS256 JWTs signed with the server secret. Verification for
//! the refresh flow deliberately skips the expiry check so a client holding
//! an expired access token can still identify itself together with its
//! refresh token.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use orders_types::domain::identity::{AuthenticationResponse, Identity};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{JwtConfig, MIN_SECRET_LEN};

const REFRESH_TOKEN_BYTES: usize = 64;

#[derive(thiserror::Error, Debug)]
pub enum TokenError {
    #[error("invalid token configuration: {0}")]
    Configuration(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Identity claims recovered from a correctly signed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub username: String,
    pub token_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    access_token_lifetime: Duration,
    refresh_token_lifetime: Duration,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Result<Self, TokenError> {
        if config.secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::Configuration(format!(
                "signing secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        let now = Utc::now();
        for lifetime in [config.access_token_lifetime, config.refresh_token_lifetime] {
            if now.checked_add_signed(lifetime).is_none() {
                return Err(TokenError::Configuration(format!(
                    "token lifetime {lifetime} is out of range"
                )));
            }
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_token_lifetime: config.access_token_lifetime,
            refresh_token_lifetime: config.refresh_token_lifetime,
        })
    }

    /// Mints an access token and a fresh refresh token for `identity`.
    ///
    /// Nothing is persisted; the caller stores the refresh token and its
    /// expiry on the identity.
    pub fn create_token(&self, identity: &Identity) -> Result<AuthenticationResponse, TokenError> {
        let now = Utc::now();
        let access_expires = expiry(now, self.access_token_lifetime)?;
        let refresh_expires = expiry(now, self.refresh_token_lifetime)?;
        let claims = Claims {
            sub: identity.id.to_string(),
            username: identity.username.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: access_expires.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let access_token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
                .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(AuthenticationResponse {
            person_name: identity.person_name.clone(),
            email: identity.email.clone(),
            access_token,
            access_token_expiration: access_expires,
            refresh_token: generate_refresh_token(),
            refresh_token_expiration: refresh_expires,
        })
    }

    /// Signature, algorithm, issuer and audience are checked; expiry is not.
    pub fn validate_and_extract_principal(&self, token: &str) -> Option<Principal> {
        self.decode(token, false)
    }

    /// Full validation including expiry, for authenticating requests.
    pub fn validate_access_token(&self, token: &str) -> Option<Principal> {
        self.decode(token, true)
    }

    fn decode(&self, token: &str, check_expiry: bool) -> Option<Principal> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = check_expiry;
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["sub", "exp", "iss", "aud"]);

        let claims = match jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!(error = %e, "rejected access token");
                return None;
            }
        };
        let user_id = Uuid::parse_str(&claims.sub).ok()?;
        Some(Principal {
            user_id,
            username: claims.username,
            token_id: claims.jti,
            issued_at: DateTime::from_timestamp(claims.iat, 0)?,
            expires_at: DateTime::from_timestamp(claims.exp, 0)?,
        })
    }
}

fn expiry(now: DateTime<Utc>, lifetime: Duration) -> Result<DateTime<Utc>, TokenError> {
    now.checked_add_signed(lifetime).ok_or_else(|| {
        TokenError::Configuration(format!("token lifetime {lifetime} is out of range"))
    })
}

/// 64 bytes from the OS CSPRNG, standard base64.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}
