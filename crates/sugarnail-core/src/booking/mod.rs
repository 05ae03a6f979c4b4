//! Booking helpers used by the page shell.
//!
//! The cart and order history live in a small key-value store, one JSON file
//! per key. Checking out produces an `Order` that is handed to the admin over
//! WhatsApp; there is no order backend.

pub mod cart;
pub mod format;
pub mod models;
pub mod storage;
pub mod whatsapp;

pub use cart::{Cart, OrderHistory, MAX_ORDER_HISTORY};
pub use format::{format_date, format_rupiah, generate_order_id};
pub use models::{Addon, Order, Package};
pub use storage::LocalStorage;
pub use whatsapp::{order_message, whatsapp_link};

/// WhatsApp number orders are sent to unless configured otherwise.
pub const DEFAULT_ADMIN_NUMBER: &str = "6282297978885";
