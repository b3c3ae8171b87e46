//! # mts-dml
//!
//! Dialect-aware SQL pagination and ordering for the MTS middle tier.
//!
//! ## Features
//!
//! - **Strings in, strings out**: the builder rewrites a caller's `SELECT`; it never parses
//!   or re-renders it
//! - **One strategy per dialect family**: `OFFSET … FETCH`, `LIMIT … OFFSET` and Oracle
//!   `ROWNUM` wrapping, picked once when the dialect is configured
//! - **Stable Oracle pages**: a `rowid` tie-breaker is appended to the ORDER BY unless
//!   disabled
//! - **Logical sort fields**: callers sort by name; the configured map supplies the columns
//! - **Explicit wiring**: configuration, pools and the migration bootstrap are plain values
//!   passed to whoever needs them
//!
//! ## Rewriting SQL
//!
//! ```ignore
//! use mts_dml::{Dialect, QueryDml};
//!
//! let dml = QueryDml::for_dialect(Dialect::Postgresql).row_limit(500);
//!
//! let sql = dml.paginate("SELECT * FROM t", " ORDER BY id", 20, 10)?;
//! assert_eq!(sql, "SELECT * FROM t ORDER BY id OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY");
//!
//! let sql = mts_dml::limit("SELECT * FROM t", 5, Dialect::Mysql)?;
//! assert_eq!(sql, "SELECT * FROM t LIMIT 5 OFFSET 0");
//! ```
//!
//! ## Executing pages
//!
//! ```ignore
//! use mts_dml::{MtsConfig, DataSources, PagedQuery, PageSpec, SortSpec};
//!
//! let config = MtsConfig::load("mts.toml")?;
//! let dml = config.query_dml()?;
//! let sources = DataSources::from_config(&config)?;
//! let client = sources.get("main")?.get().await?;
//!
//! let page = PagedQuery::new(&dml, "SELECT id, last_name FROM users")
//!     .sort(SortSpec::asc("name"))
//!     .fetch_page(&client, PageSpec::page(1, 25)?)
//!     .await?;
//! ```

pub mod client;
pub mod config;
pub mod detect;
pub mod dialect;
pub mod dml;
pub mod error;
pub mod order;
pub mod paged;
pub mod paging;
pub mod row;

pub use client::GenericClient;
pub use config::{DataSourceConfig, DmlConfig, MigrationsConfig, MtsConfig};
pub use dialect::Dialect;
pub use dml::{QueryDml, limit, paginate};
pub use error::{MtsError, MtsResult};
pub use order::{SortDir, SortFieldMap, SortSpec};
pub use paged::{Page, PagedQuery};
pub use paging::{LimitOffset, OffsetFetch, OrderContext, PageSpec, PageStrategy, RowNum};
pub use row::{FromRow, RowExt};

#[cfg(feature = "pool")]
pub mod pool;
#[cfg(feature = "pool")]
pub use pool::{DataSources, create_pool, create_pool_with_config};

#[cfg(feature = "migrate")]
pub mod migrate;
#[cfg(feature = "migrate")]
pub use migrate::MigrationBootstrap;
