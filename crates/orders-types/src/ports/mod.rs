pub mod identity_repository;
pub mod order_item_repository;
pub mod order_repository;

use identity_repository::IdentityRepository;
use order_item_repository::OrderItemRepository;
use order_repository::OrderRepository;

/// Everything the HTTP service needs from one storage backend.
pub trait Store: OrderRepository + OrderItemRepository + IdentityRepository + Clone {}

impl<T> Store for T where T: OrderRepository + OrderItemRepository + IdentityRepository + Clone {}
