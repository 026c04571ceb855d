//! Logger capability for the resolve/dispatch flow.
//!
//! The handler and dispatcher never log through an ambient global; they take
//! a logger capability at construction. The default implementation forwards
//! to `tracing`, so hosts that install a `tracing` subscriber get the events
//! for free, while tests can inject a collecting logger and assert on the
//! emitted entries.

/// Trait for the injected logger.
pub trait StorageLog: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Default logger backed by `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl StorageLog for TracingLog {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}
