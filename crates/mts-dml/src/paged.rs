//! Paged query execution.
//!
//! [`PagedQuery`] runs a `SELECT` one page at a time through a [`GenericClient`], using a
//! [`QueryDml`] to render the page SQL and a `COUNT(*)` wrapper for the total.
//!
//! # Example
//! ```ignore
//! use mts_dml::{PagedQuery, PageSpec, SortSpec};
//!
//! let page = PagedQuery::new(&dml, "SELECT u.id, u.last_name FROM users u WHERE u.active = $1")
//!     .bind(&true)
//!     .sort(SortSpec::asc("name"))
//!     .tag("users.list")
//!     .fetch_page_as::<User>(&client, PageSpec::page(2, 50)?)
//!     .await?;
//!
//! println!("{} of {} users", page.items.len(), page.total);
//! ```

use crate::client::GenericClient;
use crate::detect;
use crate::dml::QueryDml;
use crate::error::{MtsError, MtsResult};
use crate::order::SortSpec;
use crate::paging::{PageSpec, append_order_by, close_line_comment};
use crate::row::FromRow;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// One page of results plus the total row count of the unpaged query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub offset: i64,
    pub page_size: i64,
}

impl<T> Page<T> {
    /// Whether rows exist past this page.
    pub fn has_next(&self) -> bool {
        self.page_size > 0 && self.offset.saturating_add(self.items.len() as i64) < self.total
    }

    /// Number of pages needed for `total` rows.
    pub fn page_count(&self) -> i64 {
        if self.page_size <= 0 {
            return i64::from(self.total > 0);
        }
        (self.total + self.page_size - 1) / self.page_size
    }

    /// 1-based number of this page.
    pub fn page_number(&self) -> i64 {
        if self.page_size <= 0 {
            return 1;
        }
        self.offset / self.page_size + 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            page_size: self.page_size,
        }
    }

    pub fn try_map<U>(self, f: impl FnMut(T) -> MtsResult<U>) -> MtsResult<Page<U>> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<MtsResult<Vec<_>>>()?,
            total: self.total,
            offset: self.offset,
            page_size: self.page_size,
        })
    }
}

/// A `SELECT` that can be fetched page by page.
pub struct PagedQuery<'a> {
    dml: &'a QueryDml,
    sql: String,
    params: Vec<&'a (dyn ToSql + Sync)>,
    sort: Option<SortSpec>,
    tag: Option<String>,
}

impl<'a> PagedQuery<'a> {
    pub fn new(dml: &'a QueryDml, sql: impl Into<String>) -> Self {
        Self {
            dml,
            sql: sql.into(),
            params: Vec::new(),
            sort: None,
            tag: None,
        }
    }

    /// Bind the next `$n` parameter.
    pub fn bind(mut self, param: &'a (dyn ToSql + Sync)) -> Self {
        self.params.push(param);
        self
    }

    /// Sort by a logical field of the builder's sort-field map.
    pub fn sort(mut self, spec: SortSpec) -> Self {
        self.sort = Some(spec);
        self
    }

    /// Label used in log events.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    fn ensure_select(&self) -> MtsResult<()> {
        if detect::is_select(&self.sql) {
            Ok(())
        } else {
            Err(MtsError::validation(
                "paged queries must be SELECT statements",
            ))
        }
    }

    /// `SELECT COUNT(*)` over the unpaged query.
    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM ({}) count_", close_line_comment(&self.sql))
    }

    /// SQL for one page, ordered by the configured sort.
    pub fn page_sql(&self, page: PageSpec) -> MtsResult<String> {
        self.ensure_select()?;
        self.dml.paginate_sorted(&self.sql, self.sort.as_ref(), page)
    }

    /// SQL capped at the builder's row limit.
    pub fn capped_sql(&self) -> MtsResult<String> {
        self.ensure_select()?;
        let order_by = match &self.sort {
            Some(spec) => self.dml.get_sort_fields().resolve(spec)?,
            None => String::new(),
        };
        let ordered = append_order_by(&self.sql, &order_by);
        self.dml.cap(&ordered)
    }

    /// Total rows of the unpaged query.
    pub async fn count(&self, client: &impl GenericClient) -> MtsResult<i64> {
        self.ensure_select()?;
        let sql = self.count_sql();
        self.log("count", &sql);
        let row = client.query_one(&sql, &self.params).await?;
        Ok(row.try_get(0)?)
    }

    /// Fetch one page of raw rows.
    ///
    /// The count query is skipped when the first page is not full.
    pub async fn fetch_page(
        &self,
        client: &impl GenericClient,
        page: PageSpec,
    ) -> MtsResult<Page<Row>> {
        let sql = self.page_sql(page)?;
        self.log("page", &sql);
        let items = client.query(&sql, &self.params).await?;

        let fetched = items.len() as i64;
        let total = if page.offset == 0 && (!page.is_paged() || fetched < page.page_size) {
            fetched
        } else {
            self.count(client).await?
        };

        Ok(Page {
            items,
            total,
            offset: page.offset,
            page_size: page.page_size,
        })
    }

    /// Fetch one page mapped through [`FromRow`].
    pub async fn fetch_page_as<T: FromRow>(
        &self,
        client: &impl GenericClient,
        page: PageSpec,
    ) -> MtsResult<Page<T>> {
        self.fetch_page(client, page)
            .await?
            .try_map(|row| T::from_row(&row))
    }

    /// Fetch at most the builder's row limit, without paging.
    pub async fn fetch_capped(&self, client: &impl GenericClient) -> MtsResult<Vec<Row>> {
        let sql = self.capped_sql()?;
        self.log("capped", &sql);
        client.query(&sql, &self.params).await
    }

    fn log(&self, phase: &'static str, sql: &str) {
        tracing::debug!(
            target: "mts.sql",
            tag = self.tag.as_deref().unwrap_or("-"),
            phase,
            param_count = self.params.len(),
            sql = %sql,
            "executing paged query"
        );
    }
}
