//! User-facing notifications. The embedding UI decides how to render them
//! (toast, banner, log line); the core only emits.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub detail: Option<String>,
}

impl Notice {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: title.into(),
            detail: None,
        }
    }

    pub fn error(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: title.into(),
            detail: Some(detail.into()),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Default sink: structured log lines.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Success => {
                tracing::info!(title = %notice.title, "notice");
            }
            NoticeKind::Error => {
                tracing::warn!(
                    title = %notice.title,
                    detail = notice.detail.as_deref().unwrap_or(""),
                    "notice"
                );
            }
        }
    }
}
