//! Connection pools and named data sources.
//!
//! Services receive a [`DataSources`] (or a single [`Pool`] taken from it) through their
//! constructors; there is no process-wide registry to look handles up in.
//!
//! ```ignore
//! let config = mts_dml::MtsConfig::load("mts.toml")?;
//! let sources = mts_dml::DataSources::from_config(&config)?;
//! let client = sources.get("main")?.get().await?;
//! ```

use crate::config::{DataSourceConfig, MtsConfig};
use crate::error::{MtsError, MtsResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use std::collections::BTreeMap;
use tokio_postgres::NoTls;

/// Create a connection pool from a database URL.
///
/// This uses `NoTls`. Pool creation is lazy: no connection is opened until the first
/// `get()`.
pub fn create_pool(database_url: &str) -> MtsResult<Pool> {
    create_pool_with_config(database_url, 16)
}

/// Create a connection pool with a custom maximum size.
pub fn create_pool_with_config(database_url: &str, max_size: usize) -> MtsResult<Pool> {
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| MtsError::config(format!("invalid database url: {e}")))?;

    let mgr = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );
    Pool::builder(mgr)
        .max_size(max_size)
        .build()
        .map_err(|e| MtsError::Pool(e.to_string()))
}

/// Named connection pools.
#[derive(Clone, Default)]
pub struct DataSources {
    pools: BTreeMap<String, Pool>,
}

impl std::fmt::Debug for DataSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSources")
            .field("names", &self.pools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DataSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one pool per `[datasources.<name>]` entry.
    pub fn from_config(config: &MtsConfig) -> MtsResult<Self> {
        let mut sources = Self::new();
        for (name, ds) in &config.datasources {
            sources = sources.with_config(name, ds)?;
        }
        tracing::info!(
            target: "mts.pool",
            count = sources.pools.len(),
            "data sources configured"
        );
        Ok(sources)
    }

    fn with_config(self, name: &str, ds: &DataSourceConfig) -> MtsResult<Self> {
        let in_datasource = |e: MtsError| match e {
            MtsError::Config(msg) => MtsError::config(format!("datasource '{name}': {msg}")),
            other => other,
        };
        let url = ds.resolved_url().map_err(in_datasource)?;
        let pool = create_pool_with_config(&url, ds.max_size).map_err(in_datasource)?;
        Ok(self.with_pool(name, pool))
    }

    /// Register an existing pool under `name`, replacing any previous one.
    pub fn with_pool(mut self, name: impl Into<String>, pool: Pool) -> Self {
        self.pools.insert(name.into(), pool);
        self
    }

    pub fn get(&self, name: &str) -> MtsResult<&Pool> {
        self.pools
            .get(name)
            .ok_or_else(|| MtsError::not_found(format!("data source '{name}'")))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pools.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}
