///  To run :
///  cargo r --example client_example
use orders_client::{CreateOrderRequest, OrderItemRequest, OrdersClient, RegisterRequest};
use orders_hex::application::token_service::TokenService;
use orders_hex::config::JwtConfig;
use orders_hex::inbound::http::{AppState, HttpServer, HttpServerConfig};
use orders_repo::build_repo;
use tempfile::tempdir;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port = find_free_port();
    let addr = format!("http://127.0.0.1:{port}/");

    // Use a temp file-backed SQLite DB so multiple connections see the same data.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("orders.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let repo = build_repo(Some(&db_url)).await?;
    let tokens = TokenService::new(&JwtConfig::with_secret(
        "example-secret-that-is-long-enough-for-hs256",
    ))?;
    let server = HttpServer::new(
        AppState::new(repo, tokens),
        HttpServerConfig {
            port: port.to_string(),
            require_auth: true,
        },
    )
    .await?;

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let anonymous = OrdersClient::new(&addr)?;
    let pair = anonymous
        .register(RegisterRequest {
            person_name: "Example User".into(),
            user_name: "example".into(),
            phone: "555-123-4567".into(),
            email: "example@example.com".into(),
            password: "example-pw".into(),
            confirm_password: "example-pw".into(),
        })
        .await?;
    println!("Registered {} ({})", pair.person_name, pair.email);

    let pair = anonymous.login("example", "example-pw").await?;
    let client = anonymous.with_access_token(&pair.access_token);

    let created = client
        .create_order(CreateOrderRequest {
            customer_name: "Example".into(),
            order_date: chrono::Utc::now(),
            total_amount: 1500,
        })
        .await?;
    println!("Created order {} id={}", created.order_number, created.id);

    let order_id = created.id.to_string();
    let item = client
        .create_item(
            &order_id,
            OrderItemRequest {
                product_name: "Widget".into(),
                quantity: 3,
                unit_price: 500,
            },
        )
        .await?;
    println!("Added item {} total_price={}", item.product_name, item.total_price);
    assert_eq!(item.total_price, 1500);

    // Rotate the pair and keep going with the new access token.
    let pair = anonymous
        .generate_new_token(&pair.access_token, &pair.refresh_token)
        .await?;
    let client = anonymous.with_access_token(&pair.access_token);
    println!("Refreshed; new access token expires {}", pair.access_token_expiration);

    let items = client.list_items(&order_id).await?;
    println!("Order has {} item(s)", items.len());

    client.delete_item(&order_id, &item.id.to_string()).await?;
    client.delete_order(&order_id).await?;
    println!("Deleted order id={}", created.id);
    client.logout().await?;

    handle.abort();
    Ok(())
}
