use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::application::token_service::TokenService;
use crate::errors::AppError;

/// Rejects the request with 401 unless it carries `Authorization: Bearer`
/// with an unexpired access token. The [`Principal`] is stored in the
/// request extensions for downstream handlers.
///
/// [`Principal`]: crate::application::token_service::Principal
pub async fn require_bearer(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;

    let principal = tokens
        .validate_access_token(token)
        .ok_or_else(|| AppError::Unauthorized("invalid or expired access token".into()))?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
