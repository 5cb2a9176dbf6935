use super::ranges::{IgnoreSet, Range};

/// Positions of a balanced open/close delimiter pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Delimited {
    pub open: usize,
    pub close: usize,
}

impl Delimited {
    /// Offsets strictly between the delimiters, as a half-open range.
    pub fn inner(&self) -> std::ops::Range<usize> {
        self.open + 1..self.close
    }

    pub fn inner_text<'a>(&self, haystack: &'a str) -> &'a str {
        &haystack[self.inner()]
    }
}

/// Locate every `start_delim ... end_delim` pair, left to right.
///
/// `end_delim` defaults to `start_delim` (quotes). Ignored zones and plain
/// comments are never taken as an opening delimiter. Scanning stops at the first opening
/// delimiter with no closing match.
pub fn find_positions(
    haystack: &str,
    start_delim: u8,
    end_delim: Option<u8>,
    ignore: &IgnoreSet,
) -> Vec<Range> {
    let bytes = haystack.as_bytes();
    let mut pairs = Vec::new();
    let mut from = 0;

    let opener = std::slice::from_ref(&start_delim);
    while let Some(pair) = find_pair(bytes, opener, end_delim, from, ignore) {
        from = pair.end + 1;
        pairs.push(pair);
    }

    pairs
}

/// Next pair opened by any of `start_delims` at or after `from`.
///
/// The closing delimiter is `end_delim`, or the opening byte itself. A
/// pair that would swallow an ignored range is not a match.
pub(super) fn find_pair(
    bytes: &[u8],
    start_delims: &[u8],
    end_delim: Option<u8>,
    from: usize,
    ignore: &IgnoreSet,
) -> Option<Range> {
    let start = find_opener(bytes, start_delims, from, ignore)?;
    let end = match end_delim {
        Some(close) if close != bytes[start] => {
            start + 1 + bytes[start + 1..].iter().position(|&b| b == close)?
        }
        _ => find_closing(bytes, start + 1, bytes[start])?,
    };
    if ignore.next_after(start + 1).is_some_and(|r| r.start <= end) {
        return None;
    }
    Some(Range::new(start, end))
}

/// First byte from `needles` at or after `from` outside ignored zones and
/// plain comments.
pub(super) fn find_opener(
    bytes: &[u8],
    needles: &[u8],
    from: usize,
    ignore: &IgnoreSet,
) -> Option<usize> {
    let mut pos = from;
    loop {
        pos = ignore.jump_ignore(pos);
        let b = *bytes.get(pos)?;
        if needles.contains(&b) {
            return Some(pos);
        }
        pos = match comment_end(bytes, pos) {
            Some(end) => end + 1,
            None => pos + 1,
        };
    }
}

/// Last byte of the comment opening at `at`, if one does.
///
/// `/* ... */` ends at its `*/`; `-- ` runs to the end of the text, which
/// holds a single line once blanks are collapsed. An unterminated block
/// comment also runs to the end.
pub fn comment_end(bytes: &[u8], at: usize) -> Option<usize> {
    match bytes.get(at..at + 2)? {
        b"/*" => Some(
            bytes[at + 2..]
                .windows(2)
                .position(|w| w == b"*/")
                .map_or(bytes.len() - 1, |rel| at + 2 + rel + 1),
        ),
        b"--" if bytes.get(at + 2).map_or(true, |b| b.is_ascii_whitespace()) => {
            Some(bytes.len() - 1)
        }
        _ => None,
    }
}

/// Closing `delim` of a quoted span whose content starts at `from`.
///
/// A backslash escapes the next byte and a doubled delimiter (`''`) stands
/// for itself, so neither closes the span.
pub fn find_closing(bytes: &[u8], from: usize, delim: u8) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == delim => {
                if bytes.get(i + 1) == Some(&delim) {
                    i += 2;
                } else {
                    return Some(i);
                }
            }
            _ => i += 1,
        }
    }
    None
}

/// Position of `needle` right after a run of `ignore_chars` from `offset`.
///
/// Ignored ranges are skipped like ignorable characters. Any other byte
/// before `needle` means "not found".
pub fn find_next(
    haystack: &str,
    needle: u8,
    offset: usize,
    ignore_chars: &[u8],
    ignore: &IgnoreSet,
) -> Option<usize> {
    let bytes = haystack.as_bytes();
    let mut pos = offset;
    loop {
        pos = ignore.jump_ignore(pos);
        let b = *bytes.get(pos)?;
        if b == needle {
            return Some(pos);
        }
        if !ignore_chars.contains(&b) {
            return None;
        }
        pos += 1;
    }
}

/// Balanced `open ... close` span starting right after `ignore_chars`.
///
/// Nested pairs are counted, quoted spans and ignored ranges are skipped,
/// so `(COALESCE(?,"?"),?)` resolves to the outermost parentheses.
pub fn get_between_delimiter(
    haystack: &str,
    open: u8,
    close: u8,
    offset: usize,
    ignore_chars: &[u8],
    ignore: &IgnoreSet,
) -> Option<Delimited> {
    let bytes = haystack.as_bytes();
    let start = find_next(haystack, open, offset, ignore_chars, ignore)?;

    let mut depth = 0usize;
    let mut pos = start;
    while pos < bytes.len() {
        pos = ignore.jump_ignore(pos);
        let Some(&b) = bytes.get(pos) else { break };
        match b {
            b'\'' | b'"' | b'`' => {
                pos = find_closing(bytes, pos + 1, b)?;
            }
            b if b == open => depth += 1,
            b if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(Delimited { open: start, close: pos });
                }
            }
            _ => {}
        }
        pos += 1;
    }

    None
}
