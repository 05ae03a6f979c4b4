use serde::{Deserialize, Serialize};

/// A nail-art package. Prices are whole rupiah.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Package {
    pub name: String,
    pub price: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Addon {
    pub name: String,
    pub price: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Order {
    pub id: String,
    #[serde(rename = "packageName")]
    pub package_name: String,
    #[serde(rename = "packagePrice")]
    pub package_price: u64,
    #[serde(default)]
    pub addons: Vec<Addon>,
    #[serde(default)]
    pub notes: String,
    pub total: u64,
    /// RFC 3339 timestamp
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl Order {
    pub fn new(
        id: String,
        package: &Package,
        addons: Vec<Addon>,
        notes: String,
        created_at: String,
    ) -> Self {
        let total = package.price + addons.iter().map(|a| a.price).sum::<u64>();
        Self {
            id,
            package_name: package.name.clone(),
            package_price: package.price,
            addons,
            notes,
            total,
            created_at,
        }
    }

    /// Whitespace-only notes count as none, so the message never gets an
    /// empty notes section. `Cart::set_notes` already stores blanks as absent.
    pub fn has_notes(&self) -> bool {
        !self.notes.trim().is_empty()
    }
}
