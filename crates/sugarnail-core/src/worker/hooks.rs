//! Background sync and push handlers.
//!
//! Both are placeholders for future features: sync only acknowledges the
//! order tag, and push builds the notification a host would display.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const SYNC_ORDERS_TAG: &str = "sync-orders";

const NOTIFICATION_TITLE: &str = "Sugar Nail Art";
const DEFAULT_NOTIFICATION_BODY: &str = "New notification from Sugar Nail Art";
const NOTIFICATION_ICON: &str = "/assets/icon-192.png";

/// Vibration pattern in milliseconds, alternating on/off.
const VIBRATE_PATTERN: [u32; 3] = [200, 100, 200];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Acknowledged,
    Ignored,
}

pub fn handle_sync(tag: &str) -> SyncOutcome {
    if tag == SYNC_ORDERS_TAG {
        info!(tag, "Syncing orders");
        SyncOutcome::Acknowledged
    } else {
        debug!(tag, "Ignoring unknown sync tag");
        SyncOutcome::Ignored
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
}

impl Notification {
    /// Build the notification for a push message. A missing payload gets the
    /// generic body; payload bytes are read as lossy UTF-8.
    pub fn from_push(payload: Option<&[u8]>) -> Self {
        let body = match payload {
            Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            None => DEFAULT_NOTIFICATION_BODY.to_string(),
        };
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            body,
            icon: NOTIFICATION_ICON.to_string(),
            badge: NOTIFICATION_ICON.to_string(),
            vibrate: VIBRATE_PATTERN.to_vec(),
        }
    }
}
