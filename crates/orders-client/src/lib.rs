use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use orders_types::domain::identity::AuthenticationResponse;
use orders_types::domain::order::Order;
use orders_types::domain::order_item::OrderItem;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Url;
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct OrdersClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

#[derive(Clone)]
pub struct OrdersClient {
    base: Url,
    client: reqwest::Client,
    bearer: Option<String>,
}

impl OrdersClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<OrdersClientBuilder> {
        let base = Url::parse(base_url).context("invalid base url")?;
        Ok(OrdersClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
        })
    }

    /// Copy of this client that sends `Authorization: Bearer <token>`.
    pub fn with_access_token(&self, token: impl Into<String>) -> Self {
        Self {
            bearer: Some(token.into()),
            ..self.clone()
        }
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> anyhow::Result<reqwest::RequestBuilder> {
        let mut req = self.client.request(method, self.url(path)?);
        if let Some(token) = &self.bearer {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        Ok(req)
    }

    pub async fn register(&self, req: RegisterRequest) -> anyhow::Result<AuthenticationResponse> {
        let res = self
            .request(reqwest::Method::POST, "register")?
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> anyhow::Result<AuthenticationResponse> {
        let res = self
            .request(reqwest::Method::POST, "login")?
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn logout(&self) -> anyhow::Result<()> {
        self.request(reqwest::Method::GET, "logout")?
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn generate_new_token(
        &self,
        token: &str,
        refresh_token: &str,
    ) -> anyhow::Result<AuthenticationResponse> {
        let res = self
            .request(reqwest::Method::POST, "generate-new-token")?
            .json(&TokenRequest {
                token: token.to_string(),
                refresh_token: refresh_token.to_string(),
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn create_order(&self, req: CreateOrderRequest) -> anyhow::Result<Order> {
        let res = self
            .request(reqwest::Method::POST, "orders")?
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn get_order(&self, id: &str) -> anyhow::Result<Order> {
        let res = self
            .request(reqwest::Method::GET, &format!("orders/{id}"))?
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn list_orders(&self) -> anyhow::Result<Vec<Order>> {
        let res = self
            .request(reqwest::Method::GET, "orders")?
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn update_order(&self, id: &str, req: UpdateOrderRequest) -> anyhow::Result<Order> {
        let res = self
            .request(reqwest::Method::PATCH, &format!("orders/{id}"))?
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn delete_order(&self, id: &str) -> anyhow::Result<()> {
        self.request(reqwest::Method::DELETE, &format!("orders/{id}"))?
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn create_item(
        &self,
        order_id: &str,
        req: OrderItemRequest,
    ) -> anyhow::Result<OrderItem> {
        let res = self
            .request(reqwest::Method::POST, &format!("orders/{order_id}/items"))?
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn list_items(&self, order_id: &str) -> anyhow::Result<Vec<OrderItem>> {
        let res = self
            .request(reqwest::Method::GET, &format!("orders/{order_id}/items"))?
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn get_item(&self, order_id: &str, id: &str) -> anyhow::Result<OrderItem> {
        let res = self
            .request(reqwest::Method::GET, &format!("orders/{order_id}/items/{id}"))?
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn update_item(
        &self,
        order_id: &str,
        id: &str,
        req: OrderItemRequest,
    ) -> anyhow::Result<OrderItem> {
        let res = self
            .request(reqwest::Method::PATCH, &format!("orders/{order_id}/items/{id}"))?
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn delete_item(&self, order_id: &str, id: &str) -> anyhow::Result<()> {
        self.request(reqwest::Method::DELETE, &format!("orders/{order_id}/items/{id}"))?
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl OrdersClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<OrdersClient> {
        if let Some(client) = self.client {
            return Ok(OrdersClient {
                base: self.base,
                client,
                bearer: None,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(OrdersClient {
            base: self.base,
            client,
            bearer: None,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub person_name: String,
    pub user_name: String,
    pub phone: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct TokenRequest {
    token: String,
    refresh_token: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub order_date: DateTime<Utc>,
    pub total_amount: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub customer_name: String,
    pub total_amount: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn sample_order() -> Order {
        Order {
            id: uuid::Uuid::new_v4(),
            order_number: "Order_202405011200".into(),
            customer_name: "User".into(),
            order_date: chrono::Utc::now(),
            total_amount: 500,
        }
    }

    fn sample_pair(refresh: &str) -> AuthenticationResponse {
        AuthenticationResponse {
            person_name: "Alice".into(),
            email: "alice@example.com".into(),
            access_token: "header.payload.sig".into(),
            access_token_expiration: chrono::Utc::now(),
            refresh_token: refresh.into(),
            refresh_token_expiration: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_and_get_order() {
        let server = MockServer::start();
        let order = sample_order();
        let create_body = CreateOrderRequest {
            customer_name: order.customer_name.clone(),
            order_date: order.order_date,
            total_amount: order.total_amount,
        };

        let create_mock = server.mock(|when, then| {
            when.method(POST).path("/orders").json_body_obj(&create_body);
            then.status(201).json_body_obj(&order);
        });

        let get_mock: httpmock::Mock<'_> = server.mock(|when, then| {
            when.method(GET).path(format!("/orders/{}", order.id));
            then.status(200).json_body_obj(&order);
        });

        let client = OrdersClient::new(&server.base_url()).unwrap();
        let created = client.create_order(create_body.clone()).await.unwrap();
        assert_eq!(created.id, order.id);

        let fetched = client.get_order(&order.id.to_string()).await.unwrap();
        assert_eq!(fetched.order_number, order.order_number);

        create_mock.assert();
        get_mock.assert();
    }

    #[tokio::test]
    async fn list_update_delete() {
        let server = MockServer::start();
        let order = sample_order();

        let list_mock = server.mock(|when, then| {
            when.method(GET).path("/orders");
            then.status(200).json_body_obj(&vec![order.clone()]);
        });

        let update_mock = server.mock(|when, then| {
            when.method(httpmock::Method::PATCH)
                .path(format!("/orders/{}", order.id))
                .json_body_obj(&UpdateOrderRequest {
                    customer_name: "Renamed".into(),
                    total_amount: 900,
                });
            let mut updated = order.clone();
            updated.customer_name = "Renamed".into();
            updated.total_amount = 900;
            then.status(200).json_body_obj(&updated);
        });

        let delete_mock = server.mock(|when, then| {
            when.method(DELETE).path(format!("/orders/{}", order.id));
            then.status(204);
        });

        let client = OrdersClient::new(&server.base_url()).unwrap();
        let listed = client.list_orders().await.unwrap();
        assert_eq!(listed.len(), 1);

        let updated = client
            .update_order(
                &order.id.to_string(),
                UpdateOrderRequest {
                    customer_name: "Renamed".into(),
                    total_amount: 900,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.total_amount, 900);

        client.delete_order(&order.id.to_string()).await.unwrap();

        list_mock.assert();
        update_mock.assert();
        delete_mock.assert();
    }

    #[tokio::test]
    async fn item_paths_are_scoped_to_order() {
        let server = MockServer::start();
        let order_id = uuid::Uuid::new_v4();
        let item = OrderItem {
            id: uuid::Uuid::new_v4(),
            order_id,
            product_name: "Widget".into(),
            quantity: 2,
            unit_price: 50,
            total_price: 100,
        };

        let create_mock = server.mock(|when, then| {
            when.method(POST)
                .path(format!("/orders/{order_id}/items"))
                .json_body_obj(&OrderItemRequest {
                    product_name: "Widget".into(),
                    quantity: 2,
                    unit_price: 50,
                });
            then.status(201).json_body_obj(&item);
        });
        let delete_mock = server.mock(|when, then| {
            when.method(DELETE)
                .path(format!("/orders/{order_id}/items/{}", item.id));
            then.status(204);
        });

        let client = OrdersClient::new(&server.base_url()).unwrap();
        let created = client
            .create_item(
                &order_id.to_string(),
                OrderItemRequest {
                    product_name: "Widget".into(),
                    quantity: 2,
                    unit_price: 50,
                },
            )
            .await
            .unwrap();
        assert_eq!(created.total_price, 100);
        client
            .delete_item(&order_id.to_string(), &item.id.to_string())
            .await
            .unwrap();

        create_mock.assert();
        delete_mock.assert();
    }

    #[tokio::test]
    async fn login_refresh_and_bearer_header() {
        let server = MockServer::start();

        let login_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/login")
                .json_body(serde_json::json!({ "username": "alice", "password": "pw123456" }));
            then.status(200).json_body_obj(&sample_pair("first"));
        });
        let refresh_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/generate-new-token")
                .json_body(serde_json::json!({
                    "token": "header.payload.sig",
                    "refreshToken": "first",
                }));
            then.status(200).json_body_obj(&sample_pair("second"));
        });
        let orders_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/orders")
                .header("authorization", "Bearer header.payload.sig");
            then.status(200).json_body(serde_json::json!([]));
        });

        let client = OrdersClient::new(&server.base_url()).unwrap();
        let pair = client.login("alice", "pw123456").await.unwrap();
        let next = client
            .generate_new_token(&pair.access_token, &pair.refresh_token)
            .await
            .unwrap();
        assert_eq!(next.refresh_token, "second");

        let authed = client.with_access_token(&next.access_token);
        assert!(authed.list_orders().await.unwrap().is_empty());

        login_mock.assert();
        refresh_mock.assert();
        orders_mock.assert();
    }

    #[tokio::test]
    async fn error_status_is_surfaced() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/login");
            then.status(401)
                .header("content-type", "application/problem+json")
                .json_body(serde_json::json!({
                    "status": 401,
                    "detail": "Invalid username or password",
                }));
        });

        let client = OrdersClient::new(&server.base_url()).unwrap();
        let err = client.login("alice", "wrong-pw").await.unwrap_err();
        let status = err
            .downcast_ref::<reqwest::Error>()
            .and_then(|e| e.status());
        assert_eq!(status, Some(reqwest::StatusCode::UNAUTHORIZED));
        mock.assert();
    }
}
