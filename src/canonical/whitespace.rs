/// Turn every line ending into a blank, collapse blank runs to one space
/// and trim both ends.
pub fn remove_eol_blank_spaces(haystack: &str) -> String {
    let mut normalized = String::with_capacity(haystack.len());
    // `\r\n`, `\n` and `\r` are all whitespace, so splitting covers EOLs too.
    for segment in haystack.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(segment);
    }
    normalized
}
