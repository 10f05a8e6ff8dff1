//! Application services: each borrows the pool for the duration of a request.
pub mod auth;
pub mod cart;
pub mod catalog;

pub use auth::{AuthService, NewUser};
pub use cart::{CartService, CheckoutReceipt};
pub use catalog::CatalogService;
