use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::validation::{ValidationErrors, MAX_NAME_LEN};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: i64,
    /// Always `quantity * unit_price`; recomputed on every write.
    pub total_price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemChanges {
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: i64,
}

impl OrderItem {
    pub fn new(
        order_id: Uuid,
        product_name: Option<&str>,
        quantity: Option<i64>,
        unit_price: Option<i64>,
    ) -> Result<Self, ValidationErrors> {
        let changes = OrderItemChanges::new(product_name, quantity, unit_price)?;
        let mut item = Self {
            id: Uuid::new_v4(),
            order_id,
            product_name: String::new(),
            quantity: 0,
            unit_price: 0,
            total_price: 0,
        };
        item.apply(&changes);
        Ok(item)
    }

    pub fn apply(&mut self, changes: &OrderItemChanges) {
        self.product_name = changes.product_name.clone();
        self.quantity = changes.quantity;
        self.unit_price = changes.unit_price;
        self.total_price = self.quantity * self.unit_price;
    }
}

impl OrderItemChanges {
    pub fn new(
        product_name: Option<&str>,
        quantity: Option<i64>,
        unit_price: Option<i64>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = errors.required("productName", product_name);
        if let Some(name) = name {
            errors.max_len("productName", name, MAX_NAME_LEN);
        }
        let quantity = errors.amount("quantity", quantity);
        let unit_price = errors.amount("unitPrice", unit_price);
        match (name, quantity, unit_price) {
            (Some(name), Some(quantity), Some(unit_price)) if errors.is_empty() => Ok(Self {
                product_name: name.to_string(),
                quantity,
                unit_price,
            }),
            _ => Err(errors),
        }
    }
}
