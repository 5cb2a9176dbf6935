use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::trace;

use crate::canonical::get_canonical_query;

const MAX_SAMPLE_LEN: usize = 1024;

/// Groups statements by canonical shape.
#[derive(Default)]
pub struct DigestCollector {
    digests: HashMap<String, QueryDigest>,
    total_statements: u64,
    timed_statements: u64,
}

/// Everything seen for one canonical shape.
#[derive(Clone, Debug)]
pub struct QueryDigest {
    pub canonical: String,
    /// First raw statement of this shape, truncated.
    pub sample: String,
    pub count: u64,
    /// Statements of this shape that carried an execution time.
    pub timed: u64,
    pub total_duration: Duration,
    pub min_duration: Option<Duration>,
    pub max_duration: Option<Duration>,
    pub first_seen: DateTime<Local>,
    pub last_seen: DateTime<Local>,
}

impl QueryDigest {
    pub fn avg_duration(&self) -> Option<Duration> {
        let nanos = self.total_duration.as_nanos().checked_div(u128::from(self.timed))?;
        Some(Duration::from_nanos(nanos as u64))
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct DigestReport {
    pub generated_at: String,
    pub total_statements: u64,
    pub timed_statements: u64,
    pub distinct_shapes: usize,
    pub digests: Vec<DigestEntry>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DigestEntry {
    pub canonical: String,
    pub sample: String,
    pub count: u64,
    pub total_ms: f64,
    pub avg_ms: Option<f64>,
    pub min_ms: Option<f64>,
    pub max_ms: Option<f64>,
    pub first_seen: String,
    pub last_seen: String,
}

impl DigestCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all accumulated digests.
    pub fn reset(&mut self) {
        self.digests.clear();
        self.total_statements = 0;
        self.timed_statements = 0;
    }

    /// Canonicalize `sql` and fold it into its shape's digest.
    pub fn record(&mut self, sql: &str, duration: Option<Duration>) -> &QueryDigest {
        let canonical = get_canonical_query(sql);
        let now = Local::now();

        self.total_statements += 1;
        if duration.is_some() {
            self.timed_statements += 1;
        }

        let digest = self
            .digests
            .entry(canonical)
            .or_insert_with_key(|canonical| {
                trace!("New shape: {canonical}");
                QueryDigest {
                    canonical: canonical.clone(),
                    sample: truncate(sql, MAX_SAMPLE_LEN),
                    count: 0,
                    timed: 0,
                    total_duration: Duration::ZERO,
                    min_duration: None,
                    max_duration: None,
                    first_seen: now,
                    last_seen: now,
                }
            });

        digest.count += 1;
        digest.last_seen = now;
        if let Some(duration) = duration {
            digest.timed += 1;
            digest.total_duration += duration;
            digest.min_duration = Some(digest.min_duration.map_or(duration, |d| d.min(duration)));
            digest.max_duration = Some(digest.max_duration.map_or(duration, |d| d.max(duration)));
        }
        digest
    }

    pub fn get(&self, canonical: &str) -> Option<&QueryDigest> {
        self.digests.get(canonical)
    }

    pub fn total_statements(&self) -> u64 {
        self.total_statements
    }

    pub fn distinct_shapes(&self) -> usize {
        self.digests.len()
    }

    /// Heaviest shapes first: by total time, then by count.
    pub fn top_digests(&self, n: usize) -> Vec<QueryDigest> {
        let mut digests: Vec<_> = self.digests.values().cloned().collect();
        digests.sort_unstable_by(|a, b| {
            b.total_duration
                .cmp(&a.total_duration)
                .then_with(|| b.count.cmp(&a.count))
                .then_with(|| a.canonical.cmp(&b.canonical))
        });
        digests.truncate(n);
        digests
    }

    pub fn report(&self, top: usize) -> DigestReport {
        let digests = self
            .top_digests(top)
            .into_iter()
            .map(|d| DigestEntry {
                total_ms: as_ms(d.total_duration),
                avg_ms: d.avg_duration().map(as_ms),
                min_ms: d.min_duration.map(as_ms),
                max_ms: d.max_duration.map(as_ms),
                first_seen: d.first_seen.to_rfc3339(),
                last_seen: d.last_seen.to_rfc3339(),
                canonical: d.canonical,
                sample: d.sample,
                count: d.count,
            })
            .collect();

        DigestReport {
            generated_at: Local::now().to_rfc3339(),
            total_statements: self.total_statements,
            timed_statements: self.timed_statements,
            distinct_shapes: self.digests.len(),
            digests,
        }
    }
}

pub fn as_ms(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

/// Cut `s` to at most `max` bytes on a char boundary.
pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Option<Duration> {
        Some(Duration::from_millis(n))
    }

    #[test]
    fn test_groups_by_shape() {
        let mut collector = DigestCollector::new();
        collector.record("SELECT * FROM t WHERE x=1", ms(2));
        collector.record("SELECT  *  FROM  t  WHERE x=42", ms(4));
        collector.record("SELECT * FROM u", None);

        assert_eq!(collector.total_statements(), 3);
        assert_eq!(collector.distinct_shapes(), 2);

        let digest = collector.get("SELECT * FROM t WHERE x=?").unwrap();
        assert_eq!(digest.count, 2);
        assert_eq!(digest.sample, "SELECT * FROM t WHERE x=1");
        assert_eq!(digest.total_duration, Duration::from_millis(6));
        assert_eq!(digest.min_duration, ms(2));
        assert_eq!(digest.max_duration, ms(4));
        assert_eq!(digest.avg_duration(), ms(3));
    }

    #[test]
    fn test_untimed_digest_has_no_latency() {
        let mut collector = DigestCollector::new();
        let digest = collector.record("DELETE FROM t WHERE id = 9", None);
        assert_eq!(digest.canonical, "DELETE FROM t WHERE id = ?");
        assert_eq!(digest.timed, 0);
        assert_eq!(digest.avg_duration(), None);
        assert_eq!(digest.min_duration, None);
    }

    #[test]
    fn test_top_digests_order() {
        let mut collector = DigestCollector::new();
        collector.record("SELECT 1", ms(1));
        collector.record("SELECT a FROM b", ms(50));
        collector.record("SELECT 2", ms(1));
        collector.record("INSERT INTO t VALUES (1),(2)", None);

        let top = collector.top_digests(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].canonical, "SELECT a FROM b");
        assert_eq!(top[1].canonical, "SELECT ?");
        assert_eq!(top[1].count, 2);
    }

    #[test]
    fn test_reset() {
        let mut collector = DigestCollector::new();
        collector.record("SELECT 1", ms(1));
        collector.reset();
        assert_eq!(collector.total_statements(), 0);
        assert_eq!(collector.distinct_shapes(), 0);
    }

    #[test]
    fn test_report_serializes() {
        let mut collector = DigestCollector::new();
        collector.record("UPDATE t SET a='x' WHERE id=1", ms(10));
        collector.record("UPDATE t SET a='y' WHERE id=2", None);

        let report = collector.report(10);
        assert_eq!(report.distinct_shapes, 1);
        assert_eq!(report.timed_statements, 1);

        let json = serde_json::to_value(&report).unwrap();
        let entry = &json["digests"][0];
        assert_eq!(entry["canonical"], "UPDATE t SET a=? WHERE id=?");
        assert_eq!(entry["count"], 2);
        assert_eq!(entry["max_ms"], 10.0);
    }

    #[test]
    fn test_truncate_utf8_boundary() {
        let s = "a".repeat(9) + "\u{1F600}";
        assert_eq!(truncate(&s, 10), format!("{}...", "a".repeat(9)));
        assert_eq!(truncate("short", 10), "short");
    }
}
