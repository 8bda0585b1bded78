use orders_hex::application::token_service::TokenService;
use orders_hex::config::JwtConfig;
use orders_hex::inbound::http::{AppState, HttpServer, HttpServerConfig};
use orders_repo::memory::InMemoryRepo;
use orders_types::domain::identity::AuthenticationResponse;
use orders_types::domain::order::Order;
use orders_types::domain::order_item::OrderItem;
use serde_json::{json, Value};

const SECRET: &str = "integration-secret-integration-secret";

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

struct TestServer {
    addr: String,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn start_server(require_auth: bool) -> TestServer {
    let port = find_free_port();
    let config = HttpServerConfig {
        port: port.to_string(),
        require_auth,
    };
    let tokens = TokenService::new(&JwtConfig::with_secret(SECRET)).unwrap();
    let state = AppState::new(InMemoryRepo::new(), tokens);
    let server = HttpServer::new(state, config).await.unwrap();

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });

    // Give the server a moment to start.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    TestServer {
        addr: format!("http://127.0.0.1:{}", port),
        handle,
    }
}

fn register_body(username: &str) -> Value {
    json!({
        "personName": "Alice Liddell",
        "userName": username,
        "phone": "555-010-9999",
        "email": format!("{username}@example.com"),
        "password": "wonderland1",
        "confirmPassword": "wonderland1",
    })
}

#[tokio::test]
async fn register_login_and_refresh_over_http() {
    let server = start_server(false).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/register", server.addr))
        .json(&register_body("alice"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let registered: AuthenticationResponse = res.json().await.unwrap();
    assert_eq!(registered.email, "alice@example.com");

    let res = client
        .post(format!("{}/login", server.addr))
        .json(&json!({ "username": "alice", "password": "wonderland1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let logged_in: AuthenticationResponse = res.json().await.unwrap();

    let res = client
        .post(format!("{}/generate-new-token", server.addr))
        .json(&json!({
            "token": logged_in.access_token,
            "refreshToken": logged_in.refresh_token,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let refreshed: AuthenticationResponse = res.json().await.unwrap();
    assert_ne!(refreshed.refresh_token, logged_in.refresh_token);
    assert_ne!(refreshed.access_token, logged_in.access_token);

    // The superseded refresh token no longer works.
    let res = client
        .post(format!("{}/generate-new-token", server.addr))
        .json(&json!({
            "token": refreshed.access_token,
            "refreshToken": logged_in.refresh_token,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    let res = client
        .get(format!("{}/logout", server.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn account_failures_are_problem_details() {
    let server = start_server(false).await;
    let client = reqwest::Client::new();

    let mut bad = register_body("bob");
    bad["confirmPassword"] = json!("different1");
    bad["email"] = json!("not-an-email");
    let res = client
        .post(format!("{}/register", server.addr))
        .json(&bad)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(
        res.headers()["content-type"],
        "application/problem+json"
    );
    let problem: Value = res.json().await.unwrap();
    assert_eq!(problem["status"], 400);
    assert!(problem["errors"]["confirmPassword"].is_array());
    assert!(problem["errors"]["email"].is_array());

    let res = client
        .post(format!("{}/register", server.addr))
        .json(&register_body("bob"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let res = client
        .post(format!("{}/register", server.addr))
        .json(&register_body("bob"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/login", server.addr))
        .json(&json!({ "username": "bob", "password": "nope-nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::UNAUTHORIZED);
    let problem: Value = res.json().await.unwrap();
    assert_eq!(problem["detail"], "Invalid username or password");

    let res = client
        .post(format!("{}/generate-new-token", server.addr))
        .json(&json!({ "token": "garbage", "refreshToken": "garbage" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn order_and_item_crud_over_http() {
    let server = start_server(false).await;
    let client = reqwest::Client::new();
    let addr = &server.addr;

    let res = client
        .post(format!("{}/orders", addr))
        .json(&json!({
            "customerName": "HttpUser",
            "orderDate": "2024-05-01T12:00:00Z",
            "totalAmount": 500,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    let location = res.headers()["location"].to_str().unwrap().to_string();
    let created: Order = res.json().await.unwrap();
    assert_eq!(location, format!("/orders/{}", created.id));
    assert!(created.order_number.starts_with("Order_"));

    let fetched: Order = client
        .get(format!("{}/orders/{}", addr, created.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched.customer_name, "HttpUser");

    let list: Vec<Order> = client
        .get(format!("{}/orders", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 1);

    let res = client
        .patch(format!("{}/orders/{}", addr, created.id))
        .json(&json!({ "customerName": "Renamed", "totalAmount": 900 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let updated: Order = res.json().await.unwrap();
    assert_eq!(updated.total_amount, 900);

    let res = client
        .post(format!("{}/orders/{}/items", addr, created.id))
        .json(&json!({ "productName": "Widget", "quantity": 3, "unitPrice": 700 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    let item: OrderItem = res.json().await.unwrap();
    assert_eq!(item.total_price, 2100);

    // A client-supplied total is ignored.
    let res = client
        .patch(format!("{}/orders/{}/items/{}", addr, created.id, item.id))
        .json(&json!({
            "productName": "Widget",
            "quantity": 4,
            "unitPrice": 25,
            "totalPrice": 1,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let item: OrderItem = res.json().await.unwrap();
    assert_eq!(item.total_price, 100);

    let items: Vec<OrderItem> = client
        .get(format!("{}/orders/{}/items", addr, created.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(items, vec![item.clone()]);

    let res = client
        .delete(format!("{}/orders/{}/items/{}", addr, created.id, item.id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NO_CONTENT);
    let res = client
        .get(format!("{}/orders/{}/items/{}", addr, created.id, item.id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);

    let res = client
        .delete(format!("{}/orders/{}", addr, created.id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NO_CONTENT);
    let res = client
        .get(format!("{}/orders/{}", addr, created.id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_request_and_not_found_paths() {
    let server = start_server(false).await;
    let client = reqwest::Client::new();
    let addr = &server.addr;

    let res = client
        .post(format!("{}/orders", addr))
        .json(&json!({ "customerName": "", "totalAmount": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    let problem: Value = res.json().await.unwrap();
    assert!(problem["errors"]["orderDate"].is_array());

    let res = client
        .post(format!("{}/orders", addr))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    let res = client
        .get(format!("{}/orders/not-a-uuid", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    let missing_id = uuid::Uuid::new_v4();
    let res = client
        .get(format!("{}/orders/{}", addr, missing_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);

    let res = client
        .delete(format!("{}/orders/{}", addr, missing_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);

    // Updates of a missing order answer 400.
    let res = client
        .patch(format!("{}/orders/{}", addr, missing_id))
        .json(&json!({ "customerName": "Ghost", "totalAmount": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    let res = client
        .patch(format!("{}/orders/{}/items/{}", addr, missing_id, missing_id))
        .json(&json!({ "productName": "Ghost", "quantity": 1, "unitPrice": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn orders_require_bearer_token_when_enabled() {
    let server = start_server(true).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/orders", server.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("{}/orders", server.addr))
        .bearer_auth("forged.token.value")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::UNAUTHORIZED);

    let pair: AuthenticationResponse = client
        .post(format!("{}/register", server.addr))
        .json(&register_body("carol"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let res = client
        .get(format!("{}/orders", server.addr))
        .bearer_auth(&pair.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    let res = client
        .get(format!("{}/health", server.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
}
