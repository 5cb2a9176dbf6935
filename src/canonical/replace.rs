use super::delimiter::{find_closing, find_opener, find_pair};
use super::literal::{is_identifier_byte, is_negative_number, is_numeric_value};
use super::ranges::{IgnoreSet, Range};

/// Swap `span` (inclusive) for `placeholder` and keep `ignore` in step.
///
/// The placeholder itself becomes an ignored range. Returns the offset
/// just past the inserted placeholder.
pub fn replace_span(
    haystack: &mut String,
    span: Range,
    placeholder: &str,
    ignore: &mut IgnoreSet,
) -> usize {
    haystack.replace_range(span.start..=span.end, placeholder);
    let delta = placeholder.len() as isize - span.len() as isize;
    ignore.update_positions(span.start, delta);
    if !placeholder.is_empty() {
        ignore.add_ignore_positions([Range::new(span.start, span.start + placeholder.len() - 1)]);
    }
    span.start + placeholder.len()
}

/// Replace every span opened by one of `open_delims`, delimiters included.
///
/// Spans close on `close_delim`, or on their own opening byte when it is
/// `None`, so `b"'\""` handles both quote styles in one left-to-right
/// pass. Delimiters inside plain comments open nothing; the comment text is
/// left for later passes. When an opening delimiter has no match, `jump_if_not_found` decides
/// between retrying past the next ignored range and stopping. Returns the
/// number of spans replaced.
pub fn replace_between(
    haystack: &mut String,
    open_delims: &[u8],
    close_delim: Option<u8>,
    placeholder: &str,
    jump_if_not_found: bool,
    ignore: &mut IgnoreSet,
) -> usize {
    let mut from = 0;
    let mut replaced = 0;

    loop {
        let bytes = haystack.as_bytes();
        match find_pair(bytes, open_delims, close_delim, from, ignore) {
            Some(span) => {
                let span = with_introducer(bytes, span);
                from = replace_span(haystack, span, placeholder, ignore);
                replaced += 1;
            }
            None if jump_if_not_found => {
                let Some(opener) = find_opener(bytes, open_delims, from, ignore) else {
                    break;
                };
                let Some(next) = ignore.next_after(opener) else {
                    break;
                };
                from = next.end + 1;
            }
            None => break,
        }
    }

    replaced
}

/// Widen a single-quoted span over a hex, bit or national introducer
/// (`x'4D'`, `b'01'`, `N'abc'`).
fn with_introducer(bytes: &[u8], span: Range) -> Range {
    if bytes[span.start] != b'\'' || span.start == 0 {
        return span;
    }
    let intro = span.start - 1;
    let standalone = intro == 0 || !is_identifier_byte(bytes[intro - 1]);
    if standalone && matches!(bytes[intro], b'x' | b'X' | b'b' | b'B' | b'n' | b'N') {
        Range::new(intro, span.end)
    } else {
        span
    }
}

/// Replace every numeric literal outside ignored zones.
///
/// Identifier words and backtick-quoted names are stepped over whole, so
/// digits inside `table1` or `` `2024_sales` `` are kept. Returns the
/// number of literals replaced.
pub fn replace_numeric(haystack: &mut String, placeholder: &str, ignore: &mut IgnoreSet) -> usize {
    let mut pos = 0;
    let mut replaced = 0;

    loop {
        pos = ignore.jump_ignore(pos);
        let bytes = haystack.as_bytes();
        let Some(&b) = bytes.get(pos) else { break };

        let end = match b {
            b'-' => is_negative_number(haystack, pos),
            b'0'..=b'9' | b'.' => is_numeric_value(haystack, pos),
            b'`' => {
                pos = find_closing(bytes, pos + 1, b'`').map_or(bytes.len(), |close| close + 1);
                continue;
            }
            b if is_identifier_byte(b) => {
                while pos < bytes.len() && is_identifier_byte(bytes[pos]) {
                    pos += 1;
                }
                continue;
            }
            _ => None,
        };

        match end {
            Some(end) => {
                pos = replace_span(haystack, Range::new(pos, end - 1), placeholder, ignore);
                replaced += 1;
            }
            None => pos += 1,
        }
    }

    replaced
}
