//! orders-hex: orders and accounts API (services, token issuance, inbound HTTP)

pub mod config;
pub mod errors;

pub mod application;

pub use orders_types::{domain, ports};

pub mod inbound; // HTTP adapter (server, auth middleware, handlers)
