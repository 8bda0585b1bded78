mod accounts;
pub mod auth;
mod orders;
mod server;

pub use server::{AppState, HttpServer, HttpServerConfig};
