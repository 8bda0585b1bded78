use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::validation::{ValidationErrors, MAX_NAME_LEN};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub order_date: DateTime<Utc>,
    pub total_amount: i64,
}

/// Validated replacement values for a PATCH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderChanges {
    pub customer_name: String,
    pub total_amount: i64,
}

pub fn order_number_for(at: DateTime<Utc>) -> String {
    format!("Order_{}", at.format("%Y%m%d%H%M"))
}

impl Order {
    pub fn new(
        customer_name: Option<&str>,
        order_date: Option<DateTime<Utc>>,
        total_amount: Option<i64>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = validate_customer_name(&mut errors, customer_name);
        if order_date.is_none() {
            errors.add("orderDate", "orderDate is required");
        }
        let total = errors.amount("totalAmount", total_amount);

        match (name, order_date, total) {
            (Some(name), Some(order_date), Some(total)) if errors.is_empty() => Ok(Self {
                id: Uuid::new_v4(),
                order_number: order_number_for(Utc::now()),
                customer_name: name.to_string(),
                order_date,
                total_amount: total,
            }),
            _ => Err(errors),
        }
    }

    pub fn apply(&mut self, changes: &OrderChanges) {
        self.customer_name = changes.customer_name.clone();
        self.total_amount = changes.total_amount;
    }
}

impl OrderChanges {
    pub fn new(
        customer_name: Option<&str>,
        total_amount: Option<i64>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = validate_customer_name(&mut errors, customer_name);
        let total = errors.amount("totalAmount", total_amount);
        match (name, total) {
            (Some(name), Some(total)) if errors.is_empty() => Ok(Self {
                customer_name: name.to_string(),
                total_amount: total,
            }),
            _ => Err(errors),
        }
    }
}

fn validate_customer_name<'a>(
    errors: &mut ValidationErrors,
    customer_name: Option<&'a str>,
) -> Option<&'a str> {
    let name = errors.required("customerName", customer_name)?;
    errors.max_len("customerName", name, MAX_NAME_LEN);
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn new_order_gets_id_and_number() {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let order = Order::new(Some("Alice"), Some(date), Some(1250)).unwrap();
        assert_eq!(order.customer_name, "Alice");
        assert_eq!(order.total_amount, 1250);
        assert_eq!(order.order_date, date);
        assert!(order.order_number.starts_with("Order_"));
        assert_eq!(order.order_number.len(), "Order_".len() + 12);
    }

    #[test]
    fn order_number_format() {
        let at = Utc.with_ymd_and_hms(2023, 1, 9, 7, 5, 59).unwrap();
        assert_eq!(order_number_for(at), "Order_202301090705");
    }

    #[test]
    fn validation_errors() {
        let err = Order::new(None, None, None).unwrap_err();
        assert!(err.has_field("customerName"));
        assert!(err.has_field("orderDate"));
        assert!(err.has_field("totalAmount"));

        let long_name = "x".repeat(51);
        let err = Order::new(Some(&long_name), Some(Utc::now()), Some(10)).unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert!(err.has_field("customerName"));

        let err = Order::new(Some("Bob"), Some(Utc::now()), Some(0)).unwrap_err();
        assert!(err.has_field("totalAmount"));
    }

    #[test]
    fn apply_changes_keeps_identity() {
        let mut order = Order::new(Some("Carol"), Some(Utc::now()), Some(100)).unwrap();
        let id = order.id;
        let number = order.order_number.clone();
        let changes = OrderChanges::new(Some("Caroline"), Some(300)).unwrap();
        order.apply(&changes);
        assert_eq!(order.id, id);
        assert_eq!(order.order_number, number);
        assert_eq!(order.customer_name, "Caroline");
        assert_eq!(order.total_amount, 300);
    }

    #[test]
    fn changes_require_both_fields() {
        let err = OrderChanges::new(Some("Dan"), None).unwrap_err();
        assert!(err.has_field("totalAmount"));
        assert!(!err.has_field("customerName"));
    }
}
