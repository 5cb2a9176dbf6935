use std::time::Duration;

use clap::ValueEnum;
use tracing::{trace, warn};

use crate::canonical::delimiter::find_closing;

/// How an input stream is cut into statements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SplitMode {
    /// SQL script: statements end at `;` outside quotes and comments.
    Script,
    /// Query log: one statement per line, optionally `<ms>\t<sql>`.
    Lines,
}

/// One statement cut from the input.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub seq: u64,
    pub sql: String,
    pub duration: Option<Duration>,
}

/// Incremental statement splitter. One instance per input stream.
///
/// The buffer handed to [`StatementSplitter::try_split`] must always start
/// at a statement boundary; callers drop the consumed prefix after each hit.
pub struct StatementSplitter {
    mode: SplitMode,
    statements: u64,
}

enum Scan {
    /// Statement body ends before `usize`; the terminator is consumed too.
    Terminated(usize),
    /// Nothing complete in the buffer yet.
    Incomplete,
}

impl StatementSplitter {
    pub fn new(mode: SplitMode) -> Self {
        Self { mode, statements: 0 }
    }

    pub fn statements(&self) -> u64 {
        self.statements
    }

    /// Next complete statement in `buf` and the bytes it consumed.
    ///
    /// Blank statements and skipped lines are consumed along with the
    /// statement that follows them.
    pub fn try_split(&mut self, buf: &[u8]) -> Option<(Statement, usize)> {
        let mut offset = 0;
        loop {
            let rest = &buf[offset..];
            let end = match self.scan(rest) {
                Scan::Terminated(end) => end,
                Scan::Incomplete => return None,
            };
            let consumed = offset + end + 1;
            if let Some(statement) = self.build(&rest[..end]) {
                return Some((statement, consumed));
            }
            offset = consumed;
        }
    }

    /// Whatever is left at end of input, if it holds a statement.
    ///
    /// `buf` is what remains after draining [`StatementSplitter::try_split`],
    /// so any terminated piece still in it is blank.
    pub fn finish(&mut self, buf: &[u8]) -> Option<Statement> {
        let mut rest = buf;
        while let Scan::Terminated(end) = self.scan(rest) {
            rest = &rest[end + 1..];
        }
        if !rest.is_empty() {
            trace!("Flushing {} trailing bytes", rest.len());
        }
        self.build(rest)
    }

    fn scan(&self, buf: &[u8]) -> Scan {
        match self.mode {
            SplitMode::Lines => match buf.iter().position(|&b| b == b'\n') {
                Some(end) => Scan::Terminated(end),
                None => Scan::Incomplete,
            },
            SplitMode::Script => scan_script(buf),
        }
    }

    fn build(&mut self, raw: &[u8]) -> Option<Statement> {
        let text = String::from_utf8_lossy(raw);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let (sql, duration) = match self.mode {
            SplitMode::Script => (text.to_string(), None),
            SplitMode::Lines => {
                if text.starts_with('#') {
                    return None;
                }
                parse_timed_line(text)
            }
        };

        self.statements += 1;
        Some(Statement {
            seq: self.statements,
            sql,
            duration,
        })
    }
}

/// Find the `;` closing the first statement of a script fragment.
fn scan_script(buf: &[u8]) -> Scan {
    let mut i = 0;
    while i < buf.len() {
        match buf[i] {
            b';' => return Scan::Terminated(i),
            b'\'' | b'"' | b'`' => match find_closing(buf, i + 1, buf[i]) {
                Some(close) => i = close + 1,
                None => return Scan::Incomplete,
            },
            b'-' if buf.get(i + 1) == Some(&b'-') => match line_end(buf, i) {
                Some(end) => i = end + 1,
                None => return Scan::Incomplete,
            },
            b'#' => match line_end(buf, i) {
                Some(end) => i = end + 1,
                None => return Scan::Incomplete,
            },
            b'/' if buf.get(i + 1) == Some(&b'*') => {
                match buf[i + 2..].windows(2).position(|w| w == b"*/") {
                    Some(rel) => i = i + 2 + rel + 2,
                    None => return Scan::Incomplete,
                }
            }
            _ => i += 1,
        }
    }
    Scan::Incomplete
}

fn line_end(buf: &[u8], from: usize) -> Option<usize> {
    buf[from..].iter().position(|&b| b == b'\n').map(|rel| from + rel)
}

/// Split `<ms>\t<sql>`; a line without a numeric prefix is all SQL.
fn parse_timed_line(line: &str) -> (String, Option<Duration>) {
    if let Some((prefix, sql)) = line.split_once('\t') {
        let prefix = prefix.trim().trim_end_matches("ms");
        match prefix.parse::<f64>() {
            Ok(ms) if ms.is_finite() && ms >= 0.0 => {
                let nanos = (ms * 1_000_000.0).round() as u64;
                return (sql.trim().to_string(), Some(Duration::from_nanos(nanos)));
            }
            Ok(ms) => warn!("Ignoring invalid duration {ms}"),
            Err(_) => {}
        }
    }
    (line.to_string(), None)
}
