pub mod delimiter;
pub mod literal;
pub mod multirow;
pub mod ranges;
pub mod replace;
pub mod whitespace;

use tracing::trace;

use delimiter::{comment_end, find_closing};
use multirow::collapse_multirows;
use ranges::{IgnoreSet, Range};
use replace::{replace_between, replace_numeric};
use whitespace::remove_eol_blank_spaces;

/// Token substituted for every literal value.
pub const PLACEHOLDER: &str = "?";

/// Comment openers whose body is kept verbatim: MySQL versioned comments
/// and optimizer hints.
const HINT_OPENERS: [&str; 2] = ["/*!", "/*+"];

/// Canonical shape of a SQL statement.
///
/// - Line endings and blank runs collapse to single spaces
/// - Quoted strings and numeric literals become `?`
/// - Same-shape VALUES rows of INSERT/REPLACE/UPSERT fold into one
/// - Keywords, identifiers and comment hints are left as written
///
/// The result is stable: canonicalizing it again returns it unchanged.
pub fn get_canonical_query(raw_query: &str) -> String {
    let mut query = remove_eol_blank_spaces(raw_query);
    let mut ignore = IgnoreSet::new();

    ignore.add_ignore_positions(protected_ranges(&query));
    let protected = ignore.len();

    let quoted = replace_between(&mut query, b"'\"", None, PLACEHOLDER, true, &mut ignore);
    let numeric = replace_numeric(&mut query, PLACEHOLDER, &mut ignore);
    let collapsed = collapse_multirows(&mut query, &mut ignore);

    trace!(protected, quoted, numeric, collapsed, "canonical: {query}");
    query
}

/// Zones no literal pass may touch: comment hints and backtick-quoted
/// identifiers.
///
/// Quote state is tracked so a `/*!` or backtick inside a string literal
/// does not count. An unterminated zone runs to the end of the text.
pub fn protected_ranges(query: &str) -> Vec<Range> {
    let bytes = query.as_bytes();
    let mut ranges = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => {
                i = find_closing(bytes, i + 1, bytes[i]).map_or(bytes.len(), |close| close + 1);
            }
            b'`' => {
                let end = find_closing(bytes, i + 1, b'`').unwrap_or(bytes.len() - 1);
                ranges.push(Range::new(i, end));
                i = end + 1;
            }
            b'/' | b'-' => match comment_end(bytes, i) {
                Some(end) => {
                    if HINT_OPENERS.iter().any(|opener| query[i..].starts_with(opener)) {
                        ranges.push(Range::new(i, end));
                    }
                    // Plain comments are stepped over only so quotes inside
                    // them do not flip the quote state.
                    i = end + 1;
                }
                None => i += 1,
            },
            _ => i += 1,
        }
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_canonical(raw: &str, expected: &str) {
        let canonical = get_canonical_query(raw);
        assert_eq!(canonical, expected, "raw: {raw}");
        assert_eq!(get_canonical_query(&canonical), canonical, "not stable: {raw}");
    }

    #[test]
    fn test_shape_invariance() {
        assert_canonical("SELECT * FROM t WHERE x=1", "SELECT * FROM t WHERE x=?");
        assert_canonical("SELECT  *  FROM  t  WHERE x=42", "SELECT * FROM t WHERE x=?");
    }

    #[test]
    fn test_quoted_literal_is_atomic() {
        assert_canonical(r#"UPDATE t SET value="123""#, "UPDATE t SET value=?");
        assert_canonical(
            "SELECT * FROM t WHERE name='O''Reilly' AND b = \"x\"",
            "SELECT * FROM t WHERE name=? AND b = ?",
        );
    }

    #[test]
    fn test_numeric_formats() {
        assert_canonical("SELECT 0x47, 1.245, 3.82384E-11", "SELECT ?, ?, ?");
        assert_canonical("SELECT * FROM t WHERE h = X'4D2F'", "SELECT * FROM t WHERE h = ?");
    }

    #[test]
    fn test_sign_versus_operator() {
        assert_canonical("SELECT * FROM t WHERE value=-123", "SELECT * FROM t WHERE value=?");
        assert_canonical("SELECT * FROM t WHERE value=5-123", "SELECT * FROM t WHERE value=?-?");
    }

    #[test]
    fn test_eol_variants() {
        let lf = get_canonical_query("SELECT a\nFROM t\nWHERE id = 7\n");
        let crlf = get_canonical_query("SELECT a\r\nFROM t\r\nWHERE id = 7\r\n");
        let cr = get_canonical_query("SELECT a\rFROM t\rWHERE id = 7\r");
        assert_eq!(lf, "SELECT a FROM t WHERE id = ?");
        assert_eq!(lf, crlf);
        assert_eq!(lf, cr);
    }

    #[test]
    fn test_multirow_same_shape() {
        assert_canonical("INSERT INTO t VALUES (1,2),(3,4)", "INSERT INTO t VALUES (?,?)");
        assert_canonical(
            "INSERT INTO t (a, b) VALUES ('x', -1),\r\n  ('y', 2.5),\n  (\"z\", 0x1F)",
            "INSERT INTO t (a, b) VALUES (?, ?)",
        );
    }

    #[test]
    fn test_multirow_differing_shape() {
        assert_canonical(
            "INSERT INTO t VALUES (1,2),(3,4,5)",
            "INSERT INTO t VALUES (?,?),(?,?,?)",
        );
    }

    #[test]
    fn test_hints_survive() {
        assert_canonical(
            "SELECT /*+ MAX_EXECUTION_TIME(1000) */ * FROM t WHERE id = 3",
            "SELECT /*+ MAX_EXECUTION_TIME(1000) */ * FROM t WHERE id = ?",
        );
        assert_canonical(
            "/*!40101 SET character_set_client = 'utf8' */",
            "/*!40101 SET character_set_client = 'utf8' */",
        );
    }

    #[test]
    fn test_plain_comments_are_canonicalized() {
        assert_canonical("SELECT 1 /* req 42 */", "SELECT ? /* req ? */");
    }

    #[test]
    fn test_quote_in_plain_comment_keeps_shape() {
        let x = get_canonical_query("SELECT /* it's */ 'x', 1");
        let y = get_canonical_query("SELECT /* it's */ 'y', 1");
        assert_eq!(x, "SELECT /* it's */ ?, ?");
        assert_eq!(x, y);
        assert_canonical("SELECT 'a', 2 -- don't 5", "SELECT ?, ? -- don't ?");
        assert_canonical(
            "INSERT INTO t /* bob's */ VALUES ('a', 1), ('b', 2)",
            "INSERT INTO t /* bob's */ VALUES (?, ?)",
        );
    }

    #[test]
    fn test_identifiers_untouched() {
        assert_canonical(
            "SELECT `col 1`, t2.c3 FROM `db`.`table'1` t2 WHERE t2.c3 > 10",
            "SELECT `col 1`, t2.c3 FROM `db`.`table'1` t2 WHERE t2.c3 > ?",
        );
    }

    #[test]
    fn test_hint_inside_string_is_a_literal() {
        assert_canonical("SELECT '/*! 1 */', 2", "SELECT ?, ?");
    }

    #[test]
    fn test_protected_ranges() {
        let sql = "SELECT /*+ H */ `a` FROM t /* c */ WHERE x = '/*!' -- `b`";
        let ranges = protected_ranges(sql);
        let texts: Vec<_> = ranges.iter().map(|r| &sql[r.start..=r.end]).collect();
        assert_eq!(texts, vec!["/*+ H */", "`a`"]);
    }

    #[test]
    fn test_unterminated_hint_runs_to_end() {
        let sql = "SELECT 1 /*! 2";
        let ranges = protected_ranges(sql);
        assert_eq!(ranges, vec![Range::new(9, sql.len() - 1)]);
        assert_eq!(get_canonical_query(sql), "SELECT ? /*! 2");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(get_canonical_query(""), "");
        assert_eq!(get_canonical_query(" \r\n "), "");
    }
}
