//! Admin audit log: the transactions table, newest first, with display
//! names resolved through joins and placeholder text where a join came back
//! empty.

use std::sync::Arc;

use crate::gateway::Gateway;
use crate::model::TransactionRow;
use crate::notify::{Notice, Notifier};

/// One table row, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub id: uuid::Uuid,
    pub user_name: String,
    pub author_name: String,
    pub event_title: String,
    pub kind: crate::model::TransactionKind,
    pub amount: i64,
    pub metadata: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<TransactionRow> for LogEntry {
    fn from(tx: TransactionRow) -> Self {
        Self {
            id: tx.id,
            user_name: tx.user_name.unwrap_or_else(|| "Unknown".to_string()),
            author_name: tx.author_name.unwrap_or_else(|| "N/A".to_string()),
            event_title: tx.event_title.unwrap_or_else(|| "No event".to_string()),
            kind: tx.kind,
            amount: tx.amount,
            metadata: tx
                .metadata
                .map(|m| m.to_string())
                .unwrap_or_else(|| "null".to_string()),
            created_at: tx.created_at,
        }
    }
}

pub struct LogsView {
    gateway: Arc<dyn Gateway>,
    notifier: Arc<dyn Notifier>,
    pub entries: Vec<LogEntry>,
    pub loading: bool,
}

impl LogsView {
    pub fn new(gateway: Arc<dyn Gateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            gateway,
            notifier,
            entries: Vec::new(),
            loading: true,
        }
    }

    pub async fn load(&mut self) {
        match self.gateway.transactions().await {
            Ok(rows) => self.entries = rows.into_iter().map(LogEntry::from).collect(),
            Err(e) => self
                .notifier
                .notify(Notice::error("Failed to load transactions", e.to_string())),
        }
        self.loading = false;
    }
}
