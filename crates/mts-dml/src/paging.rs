//! Per-dialect pagination strategies.
//!
//! Each [`Dialect`] maps to one [`PageStrategy`]:
//!
//! | strategy        | dialects                      | page wrapper                              |
//! |-----------------|-------------------------------|-------------------------------------------|
//! | [`OffsetFetch`] | Derby, SQL Server, PostgreSQL | `OFFSET n ROWS FETCH NEXT m ROWS ONLY`    |
//! | [`LimitOffset`] | MySQL                         | `LIMIT m OFFSET n`                        |
//! | [`RowNum`]      | Oracle                        | nested `ROWNUM` sub-select                |
//!
//! Strategies only render text. Input validation (select-only, page size, dialect
//! presence) lives in [`crate::dml`].

use crate::detect;
use crate::dialect::Dialect;
use crate::error::{MtsError, MtsResult};
use std::borrow::Cow;
use std::fmt;

/// Offset and size of one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageSpec {
    /// Rows to skip.
    pub offset: i64,
    /// Maximum rows to return. `<= 0` means "not paged".
    pub page_size: i64,
}

impl PageSpec {
    pub fn new(offset: i64, page_size: i64) -> Self {
        Self { offset, page_size }
    }

    /// Page-number form. Page numbers start at 1.
    pub fn page(page: i64, per_page: i64) -> MtsResult<Self> {
        if page < 1 {
            return Err(MtsError::validation(format!(
                "page must be >= 1, got {page}"
            )));
        }
        Ok(Self {
            offset: (page - 1).saturating_mul(per_page.max(0)),
            page_size: per_page,
        })
    }

    /// Whether a page wrapper should be applied at all.
    pub fn is_paged(&self) -> bool {
        self.page_size > 0
    }

    /// Exclusive upper row bound (`offset + page_size`).
    pub fn end(&self) -> i64 {
        self.offset.saturating_add(self.page_size)
    }
}

/// Ordering settings a strategy may consult when making page order deterministic.
#[derive(Debug, Clone, Copy)]
pub struct OrderContext<'a> {
    /// Alias of the driving table, with or without a trailing `.`; empty disables qualification.
    pub table_alias: &'a str,
    /// Append the row identity column when the ORDER BY lacks it.
    pub force_row_id_order: bool,
}

impl Default for OrderContext<'_> {
    fn default() -> Self {
        Self {
            table_alias: "",
            force_row_id_order: false,
        }
    }
}

/// Renders dialect-specific ordering, paging and row caps around a `SELECT`.
pub trait PageStrategy: fmt::Debug + Send + Sync {
    /// Dialect this strategy renders for.
    fn dialect(&self) -> Dialect;

    /// Attach `order_by` to `query`.
    ///
    /// The default defers to an existing top-level `ORDER BY` in `query`.
    fn order(&self, query: &str, order_by: &str, ctx: &OrderContext<'_>) -> String {
        let _ = ctx;
        append_order_by(query, order_by)
    }

    /// Wrap an already ordered query so that it returns one page.
    fn page(&self, ordered: &str, page: PageSpec) -> String;

    /// Wrap a query so that it returns at most `limit` rows.
    fn cap(&self, query: &str, limit: i64) -> String;
}

/// `query`, with a newline appended when it ends in a `--` comment.
pub fn close_line_comment(query: &str) -> Cow<'_, str> {
    if detect::ends_in_line_comment(query) {
        Cow::Owned(format!("{query}\n"))
    } else {
        Cow::Borrowed(query)
    }
}

/// `query + order_by`, unless `query` already has a top-level `ORDER BY`.
pub fn append_order_by(query: &str, order_by: &str) -> String {
    if order_by.trim().is_empty() {
        return query.to_string();
    }
    if detect::has_order_by(query) {
        tracing::debug!(
            target: "mts.sql",
            order_by,
            "query has its own ORDER BY; supplied ordering ignored"
        );
        return query.to_string();
    }
    let query = close_line_comment(query);
    if order_by.starts_with(char::is_whitespace) {
        format!("{query}{order_by}")
    } else {
        format!("{query} {order_by}")
    }
}

/// `OFFSET n ROWS FETCH NEXT m ROWS ONLY` (SQL:2008).
#[derive(Debug, Clone, Copy)]
pub struct OffsetFetch {
    dialect: Dialect,
}

impl OffsetFetch {
    pub const fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }
}

impl PageStrategy for OffsetFetch {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn page(&self, ordered: &str, page: PageSpec) -> String {
        let ordered = close_line_comment(ordered);
        format!(
            "{ordered} OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
            page.offset, page.page_size
        )
    }

    fn cap(&self, query: &str, limit: i64) -> String {
        let query = close_line_comment(query);
        format!("{query} OFFSET 0 ROWS FETCH NEXT {limit} ROWS ONLY")
    }
}

/// `LIMIT m OFFSET n` (MySQL).
#[derive(Debug, Clone, Copy)]
pub struct LimitOffset;

impl PageStrategy for LimitOffset {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    fn page(&self, ordered: &str, page: PageSpec) -> String {
        let ordered = close_line_comment(ordered);
        format!("{ordered} LIMIT {} OFFSET {}", page.page_size, page.offset)
    }

    fn cap(&self, query: &str, limit: i64) -> String {
        let query = close_line_comment(query);
        format!("{query} LIMIT {limit} OFFSET 0")
    }
}

/// Nested `ROWNUM` sub-select (Oracle).
///
/// `ROWNUM` is assigned before `ORDER BY` is applied, so the ordered query is nested once to
/// number rows after sorting and once more to filter the window. Rows with equal sort keys may
/// come back in any order, so [`RowNum::order`] appends the table's `ROWID` as a tie-breaker.
#[derive(Debug, Clone, Copy)]
pub struct RowNum;

impl RowNum {
    fn qualified_row_id(alias: &str) -> String {
        if alias.ends_with('.') {
            format!("{alias}rowid")
        } else {
            format!("{alias}.rowid")
        }
    }
}

impl PageStrategy for RowNum {
    fn dialect(&self) -> Dialect {
        Dialect::Oracle
    }

    fn order(&self, query: &str, order_by: &str, ctx: &OrderContext<'_>) -> String {
        let mut ordered = append_order_by(query, order_by);
        let alias = ctx.table_alias.trim();
        if !ctx.force_row_id_order || alias.is_empty() {
            return ordered;
        }

        let (has_order_by, ordered_by_row_id) = match detect::order_by_clause(&ordered) {
            Some(clause) => (true, detect::references_row_id(clause)),
            None => (false, false),
        };
        if ordered_by_row_id {
            return ordered;
        }

        let selects_row_id = detect::select_list(query).is_some_and(detect::references_row_id);
        let row_id = Self::qualified_row_id(alias);
        tracing::debug!(
            target: "mts.sql",
            selects_row_id,
            row_id = %row_id,
            "adding row identity tie-breaker to ORDER BY"
        );

        if detect::ends_in_line_comment(&ordered) {
            ordered.push('\n');
        }
        if has_order_by {
            ordered.push_str(", ");
        } else {
            ordered.push_str(" ORDER BY ");
        }
        ordered.push_str(&row_id);
        ordered
    }

    fn page(&self, ordered: &str, page: PageSpec) -> String {
        let ordered = close_line_comment(ordered);
        format!(
            "SELECT * FROM (SELECT row_.*, ROWNUM rnum FROM ({ordered}) row_) WHERE rnum > {} AND rnum <= {}",
            page.offset,
            page.end()
        )
    }

    fn cap(&self, query: &str, limit: i64) -> String {
        let query = close_line_comment(query);
        format!("SELECT * FROM ({query}) WHERE ROWNUM <= {limit}")
    }
}
