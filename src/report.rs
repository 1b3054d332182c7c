//! Error classification, user-facing copy, and the bounded error log.
//!
//! Failures are normalized into [`ErrorInfo`] records: categorized, stamped,
//! logged into a per-instance ring buffer, and optionally surfaced as a
//! transient notice through an injected [`NoticeSink`]. The log is owned by
//! whoever owns the [`Reporter`] — there is no process-wide singleton, so
//! multiple engine instances never cross-contaminate.

use chrono::Utc;
use serde_json::Value;
use std::collections::VecDeque;

/// Shown in place of a context payload that cannot be serialized.
const UNSERIALIZABLE_CONTEXT: &str = "<context unavailable>";

const DEFAULT_LOG_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Host-communication failures.
    Api,
    /// Validation and persistence failures.
    Data,
    /// Presentation failures; never surfaced as a notice from this layer.
    Ui,
    General,
}

/// Normalized failure record. Produced for logging and reporting, never
/// persisted into the plugin record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Technical message, as extracted from the failure.
    pub message: String,
    /// Sanitized copy fit for a user-facing notice.
    pub details: String,
    pub category: ErrorCategory,
    /// Millisecond epoch when the failure was handled.
    pub timestamp: i64,
    /// Caller-supplied context, serialized. Optional.
    pub context: Option<String>,
}

/// Receives short-lived, auto-dismissing notices. Implemented by the
/// presentation layer; the engine ships without one and stays silent.
pub trait NoticeSink {
    fn notice(&self, message: &str);
}

/// Maps a technical message to category-specific user copy via lowercase
/// substring heuristics.
pub fn user_message(category: ErrorCategory, technical: &str) -> String {
    let lower = technical.to_lowercase();
    let copy = match category {
        ErrorCategory::Api => {
            if lower.contains("vault") || lower.contains("storage") || lower.contains("disk") {
                "Couldn't reach your notes storage. Recent changes are kept in memory."
            } else if lower.contains("timeout") || lower.contains("timed out") {
                "The host took too long to respond. Will keep trying in the background."
            } else {
                "Communication with the host failed."
            }
        }
        ErrorCategory::Data => {
            if lower.contains("corrupt") {
                "Stored view settings look corrupted. A backup will be restored if available."
            } else if lower.contains("migrat") {
                "Your settings were saved by a different version and could not be fully upgraded."
            } else {
                "Your view settings could not be saved."
            }
        }
        ErrorCategory::Ui => "Something went wrong while rendering the card grid.",
        ErrorCategory::General => "An unexpected error occurred.",
    };
    copy.to_string()
}

fn serialize_context(context: &Value) -> String {
    serde_json::to_string(context).unwrap_or_else(|_| UNSERIALIZABLE_CONTEXT.to_string())
}

/// Bounded, newest-last ring of handled failures.
#[derive(Debug)]
pub struct ErrorLog {
    capacity: usize,
    entries: VecDeque<ErrorInfo>,
}

impl ErrorLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    fn push(&mut self, info: ErrorInfo) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(info);
    }

    pub fn entries(&self) -> impl Iterator<Item = &ErrorInfo> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

/// Owns the error log and the optional notice sink for one engine instance.
pub struct Reporter {
    log: ErrorLog,
    sink: Option<Box<dyn NoticeSink>>,
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            log: ErrorLog::default(),
            sink: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            log: ErrorLog::new(capacity),
            sink: None,
        }
    }

    pub fn set_sink(&mut self, sink: Box<dyn NoticeSink>) {
        self.sink = Some(sink);
    }

    pub fn log(&self) -> &ErrorLog {
        &self.log
    }

    pub fn clear(&mut self) {
        self.log.clear();
    }

    /// Normalizes any failure into an [`ErrorInfo`], records it, and raises
    /// a transient notice for every category except `Ui` (the presentation
    /// layer owns its own error surface). Returns the recorded info.
    pub fn handle(
        &mut self,
        error: &dyn std::fmt::Display,
        category: ErrorCategory,
        context: Option<&Value>,
    ) -> ErrorInfo {
        let message = error.to_string();
        let details = user_message(category, &message);
        let info = ErrorInfo {
            message: message.clone(),
            details: details.clone(),
            category,
            timestamp: Utc::now().timestamp_millis(),
            context: context.map(serialize_context),
        };

        log::warn!(
            "{:?} error: {}{}",
            category,
            message,
            info.context
                .as_deref()
                .map(|c| format!(" (context: {})", c))
                .unwrap_or_default()
        );
        self.log.push(info.clone());

        if category != ErrorCategory::Ui {
            if let Some(sink) = &self.sink {
                sink.notice(&details);
            }
        }
        info
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct RecordingSink(Rc<RefCell<Vec<String>>>);

    impl NoticeSink for RecordingSink {
        fn notice(&self, message: &str) {
            self.0.borrow_mut().push(message.to_string());
        }
    }

    #[test]
    fn test_handle_normalizes_and_records() {
        let mut reporter = Reporter::new();
        let info = reporter.handle(
            &"vault read failed",
            ErrorCategory::Api,
            Some(&json!({ "dataVersion": 1, "existingBackupsCount": 2 })),
        );
        assert_eq!(info.category, ErrorCategory::Api);
        assert!(info.details.contains("notes storage"));
        assert!(info.context.unwrap().contains("dataVersion"));
        assert_eq!(reporter.log().len(), 1);
    }

    #[test]
    fn test_copy_heuristics_are_case_insensitive() {
        assert!(user_message(ErrorCategory::Data, "Record is CORRUPT").contains("backup"));
        assert!(user_message(ErrorCategory::Api, "Storage offline").contains("storage"));
        assert_eq!(
            user_message(ErrorCategory::General, "???"),
            "An unexpected error occurred."
        );
    }

    #[test]
    fn test_log_is_bounded_ring() {
        let mut reporter = Reporter::with_capacity(3);
        for i in 0..5 {
            reporter.handle(&format!("err {}", i), ErrorCategory::General, None);
        }
        let messages: Vec<_> = reporter.log().entries().map(|e| e.message.clone()).collect();
        assert_eq!(messages, vec!["err 2", "err 3", "err 4"]);
    }

    #[test]
    fn test_instances_do_not_share_logs() {
        let mut a = Reporter::new();
        let b = Reporter::new();
        a.handle(&"only in a", ErrorCategory::Data, None);
        assert_eq!(a.log().len(), 1);
        assert!(b.log().is_empty());
    }

    #[test]
    fn test_ui_category_never_raises_notices() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut reporter = Reporter::new();
        reporter.set_sink(Box::new(RecordingSink(seen.clone())));

        reporter.handle(&"render glitch", ErrorCategory::Ui, None);
        assert!(seen.borrow().is_empty());

        reporter.handle(&"save failed", ErrorCategory::Data, None);
        assert_eq!(seen.borrow().len(), 1);
    }
}
