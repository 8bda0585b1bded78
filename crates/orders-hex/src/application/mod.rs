pub mod account_service;
pub mod order_item_service;
pub mod order_service;
pub mod password;
pub mod token_service;
