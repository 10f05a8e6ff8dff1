//! Aggregates module
pub mod cart;
pub mod checkout;
pub mod product;

pub use cart::{check_requested_quantity, parse_cart_items, CartAddPolicy, NewCartItem};
pub use checkout::{CheckoutPlan, StockDecrement};
pub use product::{assemble_details, contains_pattern, ensure_category};
