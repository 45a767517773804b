//! Storefront: read-only catalog listing. Purchases are not wired up yet;
//! the catalog itself is managed from the admin view.

use std::sync::Arc;

use crate::gateway::Gateway;
use crate::model::StoreItem;
use crate::notify::{Notice, Notifier};

pub struct StorefrontView {
    gateway: Arc<dyn Gateway>,
    notifier: Arc<dyn Notifier>,
    pub items: Vec<StoreItem>,
    pub loading: bool,
}

impl StorefrontView {
    pub fn new(gateway: Arc<dyn Gateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            gateway,
            notifier,
            items: Vec::new(),
            loading: true,
        }
    }

    pub async fn load(&mut self) {
        self.loading = true;
        match self.gateway.store_items().await {
            Ok(items) => self.items = items,
            Err(e) => self
                .notifier
                .notify(Notice::error("Failed to load store", e.to_string())),
        }
        self.loading = false;
    }
}

/// Stock line as rendered on the card.
pub fn stock_label(item: &StoreItem) -> String {
    if item.stock > 0 {
        format!("{} in stock", item.stock)
    } else {
        "Out of stock".to_string()
    }
}
