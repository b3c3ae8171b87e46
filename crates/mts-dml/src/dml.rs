//! Query DML builder: ordering, pagination and row caps for caller-supplied `SELECT` text.
//!
//! [`QueryDml`] holds the per-query configuration (dialect, driving table alias, row limit,
//! sort-field map) and is immutable once built, so one instance can be shared across
//! threads and requests.
//!
//! # Example
//! ```ignore
//! use mts_dml::{Dialect, QueryDml, SortFieldMap, SortSpec, PageSpec};
//!
//! let dml = QueryDml::for_dialect(Dialect::Oracle)
//!     .table_alias("t.")
//!     .sort_fields(SortFieldMap::new().with("name", "t.name")?);
//!
//! let sql = dml.paginate_sorted(
//!     "select t.id, t.name from users t",
//!     Some(&SortSpec::asc("name")),
//!     PageSpec::new(20, 10),
//! )?;
//! // SELECT * FROM (SELECT row_.*, ROWNUM rnum FROM (select t.id, t.name from users t
//! //   ORDER BY t.name ASC, t.rowid) row_) WHERE rnum > 20 AND rnum <= 30
//! # Ok::<(), mts_dml::MtsError>(())
//! ```

use crate::detect;
use crate::dialect::Dialect;
use crate::error::{MtsError, MtsResult};
use crate::order::{SortFieldMap, SortSpec};
use crate::paging::{OrderContext, PageSpec, PageStrategy, append_order_by};


/// Dialect-aware SQL pagination builder.
#[derive(Debug, Clone, Default)]
pub struct QueryDml {
    strategy: Option<&'static dyn PageStrategy>,
    table_alias: String,
    row_limit: Option<i64>,
    dont_force_row_id_order: bool,
    sort_fields: SortFieldMap,
}

impl QueryDml {
    /// Builder without a dialect. Paging and capping fail until one is set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_dialect(dialect: Dialect) -> Self {
        Self::new().dialect(dialect)
    }

    /// Select the pagination strategy for `dialect`.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.strategy = Some(dialect.strategy());
        self
    }

    /// Alias of the driving table (e.g. `"t."`), used to qualify the row identity column.
    pub fn table_alias(mut self, alias: impl Into<String>) -> Self {
        self.table_alias = alias.into();
        self
    }

    /// Row cap applied by [`QueryDml::cap`].
    pub fn row_limit(mut self, limit: i64) -> Self {
        self.row_limit = Some(limit);
        self
    }

    /// Do not append the row identity column to Oracle page ordering.
    pub fn dont_force_row_id_order(mut self, dont_force: bool) -> Self {
        self.dont_force_row_id_order = dont_force;
        self
    }

    pub fn sort_fields(mut self, sort_fields: SortFieldMap) -> Self {
        self.sort_fields = sort_fields;
        self
    }

    // ==================== Accessors ====================

    pub fn get_dialect(&self) -> Option<Dialect> {
        self.strategy.map(|s| s.dialect())
    }

    pub fn get_table_alias(&self) -> &str {
        &self.table_alias
    }

    pub fn get_row_limit(&self) -> Option<i64> {
        self.row_limit
    }

    pub fn get_sort_fields(&self) -> &SortFieldMap {
        &self.sort_fields
    }

    fn strategy(&self) -> MtsResult<&'static dyn PageStrategy> {
        self.strategy.ok_or(MtsError::DialectNotSet)
    }

    fn order_context(&self) -> OrderContext<'_> {
        OrderContext {
            table_alias: &self.table_alias,
            force_row_id_order: !self.dont_force_row_id_order,
        }
    }

    // ==================== Ordering ====================

    /// Resolve a logical sort field to ` ORDER BY ...`.
    pub fn order_by(&self, field: &str, ascending: bool) -> MtsResult<String> {
        self.sort_fields.resolve(&SortSpec::new(field, ascending))
    }

    /// Resolve a logical sort field, logging and returning `None` when it is unknown.
    pub fn order_by_or_log(&self, field: &str, ascending: bool) -> Option<String> {
        self.sort_fields
            .resolve_or_log(&SortSpec::new(field, ascending))
    }

    // ==================== Pagination ====================

    /// Order and paginate `query`.
    ///
    /// - Empty or non-`SELECT` input is returned unchanged.
    /// - `page_size <= 0` applies `order_by` only, with a warning.
    /// - A top-level `ORDER BY` already in `query` wins over `order_by`.
    pub fn paginate(
        &self,
        query: &str,
        order_by: &str,
        offset: i64,
        page_size: i64,
    ) -> MtsResult<String> {
        self.paginate_page(query, order_by, PageSpec::new(offset, page_size))
    }

    /// [`QueryDml::paginate`] taking a [`PageSpec`].
    pub fn paginate_page(&self, query: &str, order_by: &str, page: PageSpec) -> MtsResult<String> {
        if !detect::is_select(query) {
            tracing::trace!(target: "mts.sql", "not a SELECT; pagination skipped");
            return Ok(query.to_string());
        }
        if page.offset < 0 {
            return Err(MtsError::validation(format!(
                "page offset must be >= 0, got {}",
                page.offset
            )));
        }

        let strategy = self.strategy()?;
        if !page.is_paged() {
            tracing::warn!(
                target: "mts.sql",
                page_size = page.page_size,
                "page size not configured; query is not paged"
            );
            return Ok(append_order_by(query, order_by));
        }

        let ordered = strategy.order(query, order_by, &self.order_context());
        let sql = strategy.page(&ordered, page);
        tracing::debug!(
            target: "mts.sql",
            dialect = %strategy.dialect(),
            offset = page.offset,
            page_size = page.page_size,
            sql = %sql,
            "paginated query"
        );
        Ok(sql)
    }

    /// Resolve `sort` through the sort-field map, then paginate.
    pub fn paginate_sorted(
        &self,
        query: &str,
        sort: Option<&SortSpec>,
        page: PageSpec,
    ) -> MtsResult<String> {
        let order_by = match sort {
            Some(spec) => self.sort_fields.resolve(spec)?,
            None => String::new(),
        };
        self.paginate_page(query, &order_by, page)
    }

    // ==================== Row caps ====================

    /// Cap `query` at `limit` rows without paging.
    ///
    /// Empty or non-`SELECT` input, and `limit <= 0`, return the query unchanged.
    pub fn limit(&self, query: &str, limit: i64) -> MtsResult<String> {
        if !detect::is_select(query) {
            return Ok(query.to_string());
        }

        let strategy = self.strategy()?;
        if limit <= 0 {
            tracing::warn!(target: "mts.sql", limit, "row limit <= 0; query is not capped");
            return Ok(query.to_string());
        }

        let sql = strategy.cap(query, limit);
        tracing::debug!(
            target: "mts.sql",
            dialect = %strategy.dialect(),
            limit,
            sql = %sql,
            "capped query"
        );
        Ok(sql)
    }

    /// Cap `query` at the configured row limit.
    ///
    /// Without a configured limit this logs an error and returns the query unchanged.
    pub fn cap(&self, query: &str) -> MtsResult<String> {
        match self.row_limit {
            Some(limit) => self.limit(query, limit),
            None => {
                tracing::error!(target: "mts.sql", "row limit not configured; query is not capped");
                Ok(query.to_string())
            }
        }
    }
}

/// Order and paginate `query` for `dialect` with default settings.
///
/// ```ignore
/// use mts_dml::{Dialect, paginate};
///
/// assert_eq!(
///     paginate("select * from t", "", 0, 10, Dialect::Mysql)?,
///     "select * from t LIMIT 10 OFFSET 0"
/// );
/// # Ok::<(), mts_dml::MtsError>(())
/// ```
pub fn paginate(
    query: &str,
    order_by: &str,
    offset: i64,
    page_size: i64,
    dialect: Dialect,
) -> MtsResult<String> {
    QueryDml::for_dialect(dialect).paginate(query, order_by, offset, page_size)
}

/// Cap `query` at `limit` rows for `dialect`.
pub fn limit(query: &str, limit: i64, dialect: Dialect) -> MtsResult<String> {
    QueryDml::for_dialect(dialect).limit(query, limit)
}
