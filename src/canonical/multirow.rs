use tracing::debug;

use super::delimiter::{comment_end, find_closing, find_next, get_between_delimiter, Delimited};
use super::literal::is_identifier_byte;
use super::ranges::{IgnoreSet, Range};

const MULTIROW_STATEMENTS: [&str; 3] = ["INSERT", "REPLACE", "UPSERT"];

/// One parenthesized row of a VALUES list.
#[derive(Clone, Debug, PartialEq, Eq)]
struct ValueGroup {
    /// First byte of the group, including a `ROW` prefix.
    start: usize,
    span: Delimited,
}

/// What two rows must share to be folded together.
#[derive(Debug, PartialEq, Eq)]
struct GroupShape {
    fields: usize,
    signature: String,
}

/// Reduce `VALUES (..), (..), ...` to its first group when every group
/// has the same shape.
///
/// Only INSERT, REPLACE and UPSERT statements qualify. A single differing
/// group leaves the whole statement untouched. Returns whether anything
/// was removed.
pub fn collapse_multirows(haystack: &mut String, ignore: &mut IgnoreSet) -> bool {
    let text = haystack.as_str();
    let Some(groups) = value_groups(text, ignore) else {
        return false;
    };
    if groups.len() < 2 {
        return false;
    }

    let first = group_shape(text, &groups[0]);
    if let Some(idx) = groups[1..]
        .iter()
        .position(|g| group_shape(text, g) != first)
    {
        debug!(
            groups = groups.len(),
            mismatch = idx + 1,
            "value groups differ in shape, statement left as is"
        );
        return false;
    }

    let cut = Range::new(groups[0].span.close + 1, groups[groups.len() - 1].span.close);
    haystack.replace_range(cut.start..=cut.end, "");
    ignore.remove_within(cut);
    ignore.update_positions(cut.end + 1, -(cut.len() as isize));
    true
}

/// Locate the comma-separated value groups following `VALUES`.
///
/// `None` when the statement is not a multi-row candidate or the list is
/// malformed.
fn value_groups(haystack: &str, ignore: &IgnoreSet) -> Option<Vec<ValueGroup>> {
    let bytes = haystack.as_bytes();
    let (verb_start, verb_end) = next_word(bytes, 0, ignore)?;
    let verb = &haystack[verb_start..verb_end];
    if !MULTIROW_STATEMENTS.iter().any(|kw| verb.eq_ignore_ascii_case(kw)) {
        return None;
    }

    let mut pos = verb_end;
    loop {
        let (start, end) = next_word(bytes, pos, ignore)?;
        let word = &haystack[start..end];
        pos = end;
        if word.eq_ignore_ascii_case("VALUES") || word.eq_ignore_ascii_case("VALUE") {
            break;
        }
    }

    let mut groups = Vec::new();
    loop {
        let start = ignore.jump_ignore(skip_blanks(bytes, pos));
        let mut open_from = start;
        if let Some((word_start, word_end)) = word_at(bytes, start) {
            if !haystack[word_start..word_end].eq_ignore_ascii_case("ROW") {
                return None;
            }
            open_from = word_end;
        }

        let span = get_between_delimiter(haystack, b'(', b')', open_from, b" ", ignore)?;
        groups.push(ValueGroup { start, span });

        match find_next(haystack, b',', span.close + 1, b" ", ignore) {
            Some(comma) => pos = comma + 1,
            None => break,
        }
    }

    Some(groups)
}

fn group_shape(haystack: &str, group: &ValueGroup) -> GroupShape {
    let text = &haystack[group.start..=group.span.close];
    GroupShape {
        fields: field_count(group.span.inner_text(haystack)),
        signature: text.chars().filter(|c| !c.is_whitespace()).collect(),
    }
}

/// Top-level comma-separated fields of a group body.
fn field_count(inner: &str) -> usize {
    let bytes = inner.as_bytes();
    if inner.trim().is_empty() {
        return 0;
    }
    let mut fields = 1;
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' | b'`' => {
                i = find_closing(bytes, i + 1, bytes[i]).unwrap_or(bytes.len());
            }
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => fields += 1,
            _ => {}
        }
        i += 1;
    }
    fields
}

fn skip_blanks(bytes: &[u8], from: usize) -> usize {
    let mut i = from;
    while i < bytes.len() && bytes[i] == b' ' {
        i += 1;
    }
    i
}

/// Identifier word beginning exactly at `at`.
fn word_at(bytes: &[u8], at: usize) -> Option<(usize, usize)> {
    let first = *bytes.get(at)?;
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return None;
    }
    let mut end = at;
    while end < bytes.len() && is_identifier_byte(bytes[end]) {
        end += 1;
    }
    Some((at, end))
}

/// Next bare identifier word at or after `from`.
///
/// Ignored ranges, comments, quoted spans and non-word bytes are stepped
/// over.
fn next_word(bytes: &[u8], from: usize, ignore: &IgnoreSet) -> Option<(usize, usize)> {
    let mut pos = from;
    loop {
        pos = ignore.jump_ignore(pos);
        let b = *bytes.get(pos)?;
        if let Some(end) = comment_end(bytes, pos) {
            pos = end + 1;
            continue;
        }
        if let Some(word) = word_at(bytes, pos) {
            return Some(word);
        }
        pos = match b {
            b'\'' | b'"' | b'`' => find_closing(bytes, pos + 1, b)? + 1,
            b if is_identifier_byte(b) => {
                let mut end = pos;
                while end < bytes.len() && is_identifier_byte(bytes[end]) {
                    end += 1;
                }
                end
            }
            _ => pos + 1,
        };
    }
}
