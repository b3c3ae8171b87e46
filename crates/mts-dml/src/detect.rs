//! Lightweight SQL text inspection.
//!
//! These helpers do not parse SQL. They pattern-match keywords and use a small scanner to
//! ignore string literals, quoted identifiers, comments and anything nested inside
//! parentheses, which is enough to tell whether a `SELECT` already carries its own
//! top-level `ORDER BY` or references `ROWID`.

use regex::Regex;
use std::sync::OnceLock;

fn select_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bselect\b").expect("invalid built-in select regex"))
}

fn leading_select_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*select\b").expect("invalid built-in leading select regex")
    })
}

fn from_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bfrom\b").expect("invalid built-in from regex"))
}

fn order_by_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\border\s+by\b").expect("invalid built-in order by regex"))
}

fn row_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\browid\b").expect("invalid built-in rowid regex"))
}

/// Per-byte nesting depth; `None` for bytes inside literals, quoted identifiers or comments.
fn scan_depths(sql: &str) -> Vec<Option<u32>> {
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut out = vec![None; len];
    let mut depth = 0u32;
    let mut i = 0;

    while i < len {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                i += 1;
                while i < len {
                    if bytes[i] == quote {
                        // Doubled quote is an escape.
                        if i + 1 < len && bytes[i + 1] == quote {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
            }
            b'-' if i + 1 < len && bytes[i + 1] == b'-' => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            b'/' if i + 1 < len && bytes[i + 1] == b'*' => {
                i += 2;
                while i + 1 < len && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 1;
            }
            b'(' => {
                out[i] = Some(depth);
                depth += 1;
            }
            b')' => {
                depth = depth.saturating_sub(1);
                out[i] = Some(depth);
            }
            _ => out[i] = Some(depth),
        }
        i += 1;
    }

    out
}

fn top_level<'s>(
    re: &'static Regex,
    sql: &'s str,
    depths: &'s [Option<u32>],
) -> impl Iterator<Item = regex::Match<'s>> + 's {
    re.find_iter(sql)
        .filter(move |m| depths.get(m.start()).copied().flatten() == Some(0))
}

/// Returns `true` if the statement begins with `SELECT` (case-insensitive, after trimming).
pub fn is_select(sql: &str) -> bool {
    leading_select_re().is_match(sql)
}

/// Byte offset of the last top-level `ORDER BY`, if any.
///
/// `ORDER BY` inside sub-queries, window specifications, string literals or comments is
/// ignored.
pub fn find_top_level_order_by(sql: &str) -> Option<usize> {
    let depths = scan_depths(sql);
    top_level(order_by_re(), sql, &depths)
        .last()
        .map(|m| m.start())
}

/// Returns `true` if the statement already has its own top-level `ORDER BY`.
pub fn has_order_by(sql: &str) -> bool {
    find_top_level_order_by(sql).is_some()
}

/// The top-level `ORDER BY ...` tail of the statement.
pub fn order_by_clause(sql: &str) -> Option<&str> {
    find_top_level_order_by(sql).map(|pos| &sql[pos..])
}

/// Text between the top-level `SELECT` and its `FROM` (the projection list).
pub fn select_list(sql: &str) -> Option<&str> {
    let depths = scan_depths(sql);
    let select = top_level(select_re(), sql, &depths).next()?;
    let end = top_level(from_re(), sql, &depths)
        .find(|m| m.start() >= select.end())
        .map_or(sql.len(), |m| m.start());
    Some(sql[select.end()..end].trim())
}

/// Returns `true` if the statement ends inside a `--` comment, which would swallow any
/// text appended to it.
pub fn ends_in_line_comment(sql: &str) -> bool {
    let depths = scan_depths(sql);
    let tail_start = depths.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
    let tail = &sql[tail_start..];
    tail.trim_start().starts_with("--") && !tail.contains('\n')
}

/// Returns `true` if the fragment mentions the `ROWID` pseudo-column outside of literals.
pub fn references_row_id(fragment: &str) -> bool {
    let depths = scan_depths(fragment);
    row_id_re()
        .find_iter(fragment)
        .any(|m| depths.get(m.start()).copied().flatten().is_some())
}
