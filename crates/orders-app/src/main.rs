use orders_hex::application::token_service::TokenService;
use orders_hex::config::Config;
use orders_hex::inbound::http::{AppState, HttpServer, HttpServerConfig};
use orders_repo::{build_repo, Repo};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / JWT_SECRET / SERVER_PORT when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let repo: Repo = build_repo(config.database_url.as_deref()).await?;
    let tokens = TokenService::new(&config.jwt)?;
    let state = AppState::new(repo, tokens);

    let server_cfg = HttpServerConfig {
        port: config.server_port.clone(),
        require_auth: config.require_auth,
    };

    tracing::info!(
        port = %server_cfg.port,
        require_auth = server_cfg.require_auth,
        "starting orders api"
    );
    let http = HttpServer::new(state, server_cfg).await?;
    http.run().await
}
