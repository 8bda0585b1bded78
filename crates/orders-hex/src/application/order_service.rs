use crate::errors::AppError;
use chrono::{DateTime, Utc};
use orders_types::domain::order::{Order, OrderChanges};
use orders_types::ports::order_repository::OrderRepository;
use uuid::Uuid;

pub struct OrderService<R: OrderRepository> {
    repo: R,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn create_order(
        &self,
        customer_name: Option<&str>,
        order_date: Option<DateTime<Utc>>,
        total_amount: Option<i64>,
    ) -> Result<Order, AppError> {
        let order = Order::new(customer_name, order_date, total_amount)?;
        let order = self.repo.create(order).await?;
        tracing::info!(order_id = %order.id, order_number = %order.order_number, "order created");
        Ok(order)
    }

    pub async fn get_order(&self, id: Uuid) -> Result<Order, AppError> {
        match self.repo.get(id).await? {
            Some(o) => Ok(o),
            None => Err(AppError::NotFound("Order doesn't exist".into())),
        }
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, AppError> {
        Ok(self.repo.list().await?)
    }

    /// A missing order is a 400 here, not a 404 like reads and deletes.
    pub async fn update_order(
        &self,
        id: Uuid,
        customer_name: Option<&str>,
        total_amount: Option<i64>,
    ) -> Result<Order, AppError> {
        let changes = OrderChanges::new(customer_name, total_amount)?;
        match self.repo.update(id, changes).await? {
            Some(o) => {
                tracing::info!(order_id = %id, "order updated");
                Ok(o)
            }
            None => Err(AppError::BadRequest(
                "Order doesn't exist while updating data".into(),
            )),
        }
    }

    pub async fn delete_order(&self, id: Uuid) -> Result<(), AppError> {
        let deleted = self.repo.delete(id).await?;
        if deleted {
            tracing::info!(order_id = %id, "order deleted");
            Ok(())
        } else {
            Err(AppError::NotFound("Order doesn't exist".into()))
        }
    }
}
