use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use orders_types::domain::identity::{AuthenticationResponse, Credentials, Registration};
use orders_types::ports::Store;
use serde::Deserialize;

use super::server::AppState;
use crate::errors::AppError;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub person_name: Option<String>,
    pub user_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenRequest {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
}

pub fn routes<R: Store>() -> Router<AppState<R>> {
    Router::new()
        .route("/register", post(register::<R>))
        .route("/login", post(login::<R>))
        .route("/logout", get(logout))
        .route("/generate-new-token", post(generate_new_token::<R>))
}

async fn register<R: Store>(
    State(state): State<AppState<R>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<AuthenticationResponse>, AppError> {
    let Json(req) = payload?;
    let registration = Registration::new(
        req.person_name.as_deref(),
        req.user_name.as_deref(),
        req.phone.as_deref(),
        req.email.as_deref(),
        req.password.as_deref(),
        req.confirm_password.as_deref(),
    )?;
    let pair = state.accounts.register(registration).await?;
    Ok(Json(pair))
}

async fn login<R: Store>(
    State(state): State<AppState<R>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthenticationResponse>, AppError> {
    let Json(req) = payload?;
    let credentials = Credentials::new(req.username.as_deref(), req.password.as_deref())?;
    let pair = state.accounts.login(credentials).await?;
    Ok(Json(pair))
}

// Bearer tokens are stateless; they lapse on expiry or when a newer
// refresh token overwrites the stored one.
async fn logout() -> StatusCode {
    tracing::info!("logout");
    StatusCode::NO_CONTENT
}

async fn generate_new_token<R: Store>(
    State(state): State<AppState<R>>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<AuthenticationResponse>, AppError> {
    let Json(req) = payload?;
    let pair = state
        .accounts
        .refresh(req.token.as_deref(), req.refresh_token.as_deref())
        .await?;
    Ok(Json(pair))
}
