use super::PLACEHOLDER;

/// Bytes that may appear inside an unquoted identifier.
pub fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

/// Does a numeric literal start at `offset`? Returns one past its end.
///
/// Recognizes integers, decimals (`1.5`, `.5`), hex (`0x1F`), binary
/// (`0b101`) and exponential notation (`3.8E-11`). A literal glued to an
/// identifier on either side (`col1`, `1abc`) is not numeric.
pub fn is_numeric_value(haystack: &str, offset: usize) -> Option<usize> {
    let bytes = haystack.as_bytes();
    let first = *bytes.get(offset)?;

    if offset > 0 {
        let prev = bytes[offset - 1];
        if is_identifier_byte(prev) || (first == b'.' && prev == b'.') {
            return None;
        }
    }

    let end = match first {
        b'0' if matches!(bytes.get(offset + 1), Some(b'x' | b'X')) => {
            radix_end(bytes, offset + 2, |b| b.is_ascii_hexdigit())
        }
        b'0' if matches!(bytes.get(offset + 1), Some(b'b' | b'B')) => {
            radix_end(bytes, offset + 2, |b| b == b'0' || b == b'1')
        }
        b'0'..=b'9' | b'.' => decimal_end(bytes, offset),
        _ => None,
    }?;

    match bytes.get(end) {
        Some(&b) if is_identifier_byte(b) => None,
        _ => Some(end),
    }
}

/// Numeric literal with a leading sign at `offset`.
///
/// The `-` only counts as a sign when the byte before it is not a
/// placeholder; after a placeholder it is a subtraction operator.
pub fn is_negative_number(haystack: &str, offset: usize) -> Option<usize> {
    let bytes = haystack.as_bytes();
    if bytes.get(offset) != Some(&b'-') {
        return None;
    }
    if offset > 0 && haystack[..offset].ends_with(PLACEHOLDER) {
        return None;
    }
    // "--" opens a comment, not a double negation.
    if offset > 0 && bytes[offset - 1] == b'-' {
        return None;
    }
    is_numeric_value(haystack, offset + 1)
}

fn radix_end(bytes: &[u8], from: usize, is_digit: impl Fn(u8) -> bool) -> Option<usize> {
    let end = scan(bytes, from, is_digit);
    (end > from).then_some(end)
}

fn decimal_end(bytes: &[u8], offset: usize) -> Option<usize> {
    let int_end = scan(bytes, offset, |b| b.is_ascii_digit());
    let mut end = int_end;
    let mut digits = int_end - offset;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = scan(bytes, end + 1, |b| b.is_ascii_digit());
        digits += frac_end - (end + 1);
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = scan(bytes, exp, |b| b.is_ascii_digit());
        if exp_end > exp {
            end = exp_end;
        }
    }

    Some(end)
}

fn scan(bytes: &[u8], from: usize, accept: impl Fn(u8) -> bool) -> usize {
    let mut i = from;
    while i < bytes.len() && accept(bytes[i]) {
        i += 1;
    }
    i
}
