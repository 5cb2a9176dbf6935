use sqlshape::digest::{as_ms, DigestCollector};

use super::{CanonicalEvent, OutputSink};

/// One canonical statement per line, pipe-friendly.
pub struct RawSink {
    verbose: bool,
}

impl RawSink {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl OutputSink for RawSink {
    fn handle_event(&mut self, event: &CanonicalEvent) {
        if !self.verbose {
            println!("{}", event.canonical);
            return;
        }

        let time = event.wall_time.format("%H:%M:%S%.3f");
        let seq = event.seq;
        let dur_str = event
            .duration
            .map(|d| format!("{:>8.1}ms", as_ms(d)))
            .unwrap_or_else(|| "          ".to_string());
        println!("{time} [stmt:{seq}] {dur_str}  {}", event.canonical);
        println!("{time} [stmt:{seq}]             <- {}", event.sql);
    }

    fn shutdown(&mut self, _digests: &DigestCollector) {
        // No-op
    }
}
