use sqlshape::digest::{as_ms, truncate, DigestCollector};

use super::{CanonicalEvent, OutputSink};

const MAX_SHAPE_WIDTH: usize = 100;

/// Top-N digest table, printed once input is exhausted.
pub struct SummarySink {
    top: usize,
}

impl SummarySink {
    pub fn new(top: usize) -> Self {
        Self { top }
    }
}

impl OutputSink for SummarySink {
    fn handle_event(&mut self, _event: &CanonicalEvent) {}

    fn shutdown(&mut self, digests: &DigestCollector) {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        println!(
            "{now}  {} statements, {} distinct shapes",
            digests.total_statements(),
            digests.distinct_shapes()
        );
        println!(
            "{:>8} {:>12} {:>10} {:>10}  {}",
            "COUNT", "TOTAL(ms)", "AVG(ms)", "MAX(ms)", "SHAPE"
        );

        for digest in digests.top_digests(self.top) {
            let ms = |d: Option<std::time::Duration>| {
                d.map(|d| format!("{:.1}", as_ms(d))).unwrap_or_else(|| "-".to_string())
            };
            println!(
                "{:>8} {:>12.1} {:>10} {:>10}  {}",
                digest.count,
                as_ms(digest.total_duration),
                ms(digest.avg_duration()),
                ms(digest.max_duration),
                truncate(&digest.canonical, MAX_SHAPE_WIDTH)
            );
        }
    }
}
