use chrono::Utc;
use tracing::{debug, info};

use super::format::generate_order_id;
use super::models::{Addon, Order, Package};
use super::storage::LocalStorage;
use crate::error::BookingError;

// Storage keys shared with the page shell
const SELECTED_PACKAGE_KEY: &str = "selectedPackage";
const SELECTED_ADDONS_KEY: &str = "selectedAddons";
const ORDER_NOTES_KEY: &str = "orderNotes";
const ORDER_HISTORY_KEY: &str = "orderHistory";

/// Orders kept in history; older ones are dropped.
pub const MAX_ORDER_HISTORY: usize = 50;

/// The order being assembled: one package, any add-ons, free-text notes.
#[derive(Debug, Clone)]
pub struct Cart {
    storage: LocalStorage,
}

impl Cart {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    /// Select a package, replacing any previous selection.
    pub fn add_package(&self, name: &str, price: u64) {
        let package = Package {
            name: name.to_string(),
            price,
        };
        self.storage.save(SELECTED_PACKAGE_KEY, &package);
    }

    pub fn package(&self) -> Option<Package> {
        self.storage.get(SELECTED_PACKAGE_KEY)
    }

    /// Add an add-on. Selecting the same add-on twice keeps one copy.
    pub fn add_addon(&self, name: &str, price: u64) {
        let mut addons = self.addons();
        if addons.iter().any(|a| a.name == name) {
            debug!(addon = name, "Add-on already selected");
            return;
        }
        addons.push(Addon {
            name: name.to_string(),
            price,
        });
        self.storage.save(SELECTED_ADDONS_KEY, &addons);
    }

    pub fn addons(&self) -> Vec<Addon> {
        self.storage.get(SELECTED_ADDONS_KEY).unwrap_or_default()
    }

    /// Blank notes clear the stored value.
    pub fn set_notes(&self, notes: &str) {
        if notes.trim().is_empty() {
            self.storage.remove(ORDER_NOTES_KEY);
        } else {
            self.storage.save(ORDER_NOTES_KEY, &notes.to_string());
        }
    }

    pub fn notes(&self) -> Option<String> {
        self.storage.get(ORDER_NOTES_KEY)
    }

    pub fn clear(&self) {
        self.storage.remove(SELECTED_PACKAGE_KEY);
        self.storage.remove(SELECTED_ADDONS_KEY);
        self.storage.remove(ORDER_NOTES_KEY);
    }

    /// Build an order from the cart contents. The cart itself is left as is.
    pub fn checkout(&self) -> Result<Order, BookingError> {
        let package = self.package().ok_or(BookingError::EmptyCart)?;
        let order = Order::new(
            generate_order_id(),
            &package,
            self.addons(),
            self.notes().unwrap_or_default(),
            Utc::now().to_rfc3339(),
        );
        info!(order_id = %order.id, total = order.total, "Order created");
        Ok(order)
    }
}

/// Past orders, newest first.
#[derive(Debug, Clone)]
pub struct OrderHistory {
    storage: LocalStorage,
}

impl OrderHistory {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    pub fn save(&self, order: Order) {
        let mut orders = self.all();
        orders.insert(0, order);
        orders.truncate(MAX_ORDER_HISTORY);
        self.storage.save(ORDER_HISTORY_KEY, &orders);
    }

    pub fn all(&self) -> Vec<Order> {
        self.storage.get(ORDER_HISTORY_KEY).unwrap_or_default()
    }

    pub fn clear(&self) {
        self.storage.remove(ORDER_HISTORY_KEY);
    }
}
