pub mod json;
pub mod raw;
pub mod summary;

use std::time::Duration;

use sqlshape::digest::DigestCollector;

/// A statement after canonicalization, ready for display.
#[derive(Clone, Debug)]
pub struct CanonicalEvent {
    pub wall_time: chrono::DateTime<chrono::Local>,
    pub seq: u64,
    pub sql: String,
    pub canonical: String,
    pub duration: Option<Duration>,
}

/// Processes canonicalized statements.
pub trait OutputSink: Send + 'static {
    fn handle_event(&mut self, event: &CanonicalEvent);
    fn shutdown(&mut self, digests: &DigestCollector);
}
