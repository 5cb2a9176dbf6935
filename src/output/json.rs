use sqlshape::digest::DigestCollector;
use tracing::error;

use super::{CanonicalEvent, OutputSink};

/// Digest report as a single JSON document on stdout.
pub struct JsonSink {
    top: usize,
}

impl JsonSink {
    pub fn new(top: usize) -> Self {
        Self { top }
    }
}

impl OutputSink for JsonSink {
    fn handle_event(&mut self, _event: &CanonicalEvent) {}

    fn shutdown(&mut self, digests: &DigestCollector) {
        match serde_json::to_string_pretty(&digests.report(self.top)) {
            Ok(json) => println!("{json}"),
            Err(e) => error!("Failed to serialize digest report: {e}"),
        }
    }
}
