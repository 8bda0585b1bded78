use axum::{middleware, routing::get, serve, Json, Router};
use orders_types::ports::Store;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::{accounts, auth, orders};
use crate::application::account_service::AccountService;
use crate::application::order_item_service::OrderItemService;
use crate::application::order_service::OrderService;
use crate::application::token_service::TokenService;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
    /// Demand a valid bearer access token on every `/orders` route.
    pub require_auth: bool,
}

/// Shared, read-only handler state.
pub struct AppState<R: Store> {
    pub orders: Arc<OrderService<R>>,
    pub items: Arc<OrderItemService<R>>,
    pub accounts: Arc<AccountService<R>>,
    pub tokens: Arc<TokenService>,
}

impl<R: Store> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            orders: self.orders.clone(),
            items: self.items.clone(),
            accounts: self.accounts.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

impl<R: Store> AppState<R> {
    pub fn new(repo: R, tokens: TokenService) -> Self {
        let tokens = Arc::new(tokens);
        Self {
            orders: Arc::new(OrderService::new(repo.clone())),
            items: Arc::new(OrderItemService::new(repo.clone())),
            accounts: Arc::new(AccountService::new(repo, tokens.clone())),
            tokens,
        }
    }
}

#[derive(Clone)]
pub struct HttpServer<R: Store> {
    pub state: AppState<R>,
    pub config: HttpServerConfig,
}

impl<R: Store> HttpServer<R> {
    pub async fn new(state: AppState<R>, config: HttpServerConfig) -> anyhow::Result<Self> {
        Ok(Self { state, config })
    }

    pub fn router(&self) -> Router {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        let mut order_routes = orders::routes::<R>();
        if self.config.require_auth {
            order_routes = order_routes.route_layer(middleware::from_fn_with_state(
                self.state.tokens.clone(),
                auth::require_bearer,
            ));
        }

        Router::new()
            .route("/health", get(health))
            .merge(accounts::routes::<R>())
            .merge(order_routes)
            .layer(trace_layer)
            .with_state(self.state.clone())
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router();
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!(require_auth = self.config.require_auth, "starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

async fn health() -> (axum::http::StatusCode, Json<serde_json::Value>) {
    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({ "status": "ok" })),
    )
}
