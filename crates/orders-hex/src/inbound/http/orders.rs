use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use orders_types::domain::order::Order;
use orders_types::domain::order_item::OrderItem;
use orders_types::ports::Store;
use serde::Deserialize;
use uuid::Uuid;

use super::server::AppState;
use crate::errors::AppError;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateOrderRequest {
    pub customer_name: Option<String>,
    pub order_date: Option<DateTime<Utc>>,
    pub total_amount: Option<i64>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateOrderRequest {
    pub customer_name: Option<String>,
    pub total_amount: Option<i64>,
}

/// Body for both creating and replacing an item.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderItemRequest {
    pub product_name: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<i64>,
}

pub fn routes<R: Store>() -> Router<AppState<R>> {
    Router::new()
        .route("/orders", get(list_orders::<R>).post(create_order::<R>))
        .route(
            "/orders/{id}",
            get(get_order::<R>)
                .patch(update_order::<R>)
                .delete(delete_order::<R>),
        )
        .route(
            "/orders/{id}/items",
            get(list_items::<R>).post(create_item::<R>),
        )
        .route(
            "/orders/{id}/items/{item_id}",
            get(get_item::<R>)
                .patch(update_item::<R>)
                .delete(delete_item::<R>),
        )
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|e| AppError::BadRequest(format!("invalid id {raw:?}: {e}")))
}

async fn list_orders<R: Store>(
    State(state): State<AppState<R>>,
) -> Result<Json<Vec<Order>>, AppError> {
    let list = state.orders.list_orders().await?;
    Ok(Json(list))
}

async fn create_order<R: Store>(
    State(state): State<AppState<R>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    let order = state
        .orders
        .create_order(req.customer_name.as_deref(), req.order_date, req.total_amount)
        .await?;
    let location = format!("/orders/{}", order.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(order)))
}

async fn get_order<R: Store>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    let order = state.orders.get_order(parse_id(&id)?).await?;
    Ok(Json(order))
}

async fn update_order<R: Store>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> Result<Json<Order>, AppError> {
    let id = parse_id(&id)?;
    let Json(req) = payload?;
    let updated = state
        .orders
        .update_order(id, req.customer_name.as_deref(), req.total_amount)
        .await?;
    Ok(Json(updated))
}

async fn delete_order<R: Store>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.orders.delete_order(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_items<R: Store>(
    State(state): State<AppState<R>>,
    Path(order_id): Path<String>,
) -> Result<Json<Vec<OrderItem>>, AppError> {
    let items = state.items.list_items(parse_id(&order_id)?).await?;
    Ok(Json(items))
}

async fn create_item<R: Store>(
    State(state): State<AppState<R>>,
    Path(order_id): Path<String>,
    payload: Result<Json<OrderItemRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let order_id = parse_id(&order_id)?;
    let Json(req) = payload?;
    let item = state
        .items
        .create_item(
            order_id,
            req.product_name.as_deref(),
            req.quantity,
            req.unit_price,
        )
        .await?;
    let location = format!("/orders/{}/items/{}", order_id, item.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(item)))
}

async fn get_item<R: Store>(
    State(state): State<AppState<R>>,
    Path((order_id, id)): Path<(String, String)>,
) -> Result<Json<OrderItem>, AppError> {
    let item = state
        .items
        .get_item(parse_id(&order_id)?, parse_id(&id)?)
        .await?;
    Ok(Json(item))
}

async fn update_item<R: Store>(
    State(state): State<AppState<R>>,
    Path((order_id, id)): Path<(String, String)>,
    payload: Result<Json<OrderItemRequest>, JsonRejection>,
) -> Result<Json<OrderItem>, AppError> {
    let (order_id, id) = (parse_id(&order_id)?, parse_id(&id)?);
    let Json(req) = payload?;
    let item = state
        .items
        .update_item(
            order_id,
            id,
            req.product_name.as_deref(),
            req.quantity,
            req.unit_price,
        )
        .await?;
    Ok(Json(item))
}

async fn delete_item<R: Store>(
    State(state): State<AppState<R>>,
    Path((order_id, id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    state
        .items
        .delete_item(parse_id(&order_id)?, parse_id(&id)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
