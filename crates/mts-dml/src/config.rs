//! TOML configuration for the DML builder, data sources and migration bootstrap.
//!
//! ```toml
//! [dml]
//! dialect = "oracle"
//! table_alias = "t."
//! row_limit = 500
//! dont_force_row_id_order = false
//!
//! [sort_fields]
//! name = "t.last_name, t.first_name"
//! created = "t.created_at"
//!
//! [datasources.main]
//! url = "${DATABASE_URL}"
//! max_size = 16
//!
//! [migrations]
//! enabled = true
//! dir = "migrations"
//! datasource = "main"
//! ```
//!
//! `${VAR}` references in data source URLs and the migrations directory are expanded from
//! the environment when a pool or the migration bootstrap needs them, so rendering SQL
//! works without database credentials in the environment.

use crate::dialect::Dialect;
use crate::dml::QueryDml;
use crate::error::{MtsError, MtsResult};
use crate::order::SortFieldMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const DEFAULT_POOL_SIZE: usize = 16;
const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MtsConfig {
    #[serde(default)]
    pub dml: DmlConfig,

    /// Logical sort field → physical ORDER BY fragment.
    #[serde(default)]
    pub sort_fields: BTreeMap<String, String>,

    #[serde(default)]
    pub datasources: BTreeMap<String, DataSourceConfig>,

    #[serde(default)]
    pub migrations: MigrationsConfig,

    /// Directory of the loaded file; relative paths resolve against it.
    #[serde(skip)]
    pub config_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DmlConfig {
    pub dialect: Option<Dialect>,
    #[serde(default)]
    pub table_alias: String,
    pub row_limit: Option<i64>,
    #[serde(default)]
    pub dont_force_row_id_order: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataSourceConfig {
    /// Connection URL as written, `${VAR}` references included.
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub max_size: usize,
}

impl DataSourceConfig {
    /// The URL with `${VAR}` references expanded.
    pub fn resolved_url(&self) -> MtsResult<String> {
        expand_env_vars(&self.url)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MigrationsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_migrations_dir")]
    pub dir: String,
    pub target_version: Option<i64>,
    /// Data source to migrate; may be omitted when exactly one is configured.
    pub datasource: Option<String>,
}

fn default_pool_size() -> usize {
    DEFAULT_POOL_SIZE
}

fn default_migrations_dir() -> String {
    DEFAULT_MIGRATIONS_DIR.to_string()
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_migrations_dir(),
            target_version: None,
            datasource: None,
        }
    }
}

impl MtsConfig {
    /// Read, expand and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> MtsResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            MtsError::config(format!("failed to read config file {}: {e}", path.display()))
        })?;

        let mut config = Self::from_toml_str(&raw).map_err(|e| match e {
            MtsError::Config(msg) => MtsError::config(format!("{}: {msg}", path.display())),
            other => other,
        })?;
        config.config_dir = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(raw: &str) -> MtsResult<Self> {
        let config: MtsConfig = toml::from_str(raw)
            .map_err(|e| MtsError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn resolve_path(&self, p: impl AsRef<Path>) -> PathBuf {
        let p = p.as_ref();
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.config_dir.join(p)
        }
    }

    /// Build the DML builder described by `[dml]` and `[sort_fields]`.
    pub fn query_dml(&self) -> MtsResult<QueryDml> {
        let mut dml = QueryDml::new()
            .table_alias(self.dml.table_alias.clone())
            .dont_force_row_id_order(self.dml.dont_force_row_id_order)
            .sort_fields(SortFieldMap::from_map(self.sort_fields.clone())?);
        if let Some(dialect) = self.dml.dialect {
            dml = dml.dialect(dialect);
        }
        if let Some(limit) = self.dml.row_limit {
            dml = dml.row_limit(limit);
        }
        Ok(dml)
    }

    /// Name of the data source the migration bootstrap runs against.
    pub fn migration_datasource(&self) -> MtsResult<&str> {
        if let Some(name) = &self.migrations.datasource {
            return Ok(name.as_str());
        }
        let mut names = self.datasources.keys();
        match (names.next(), names.next()) {
            (Some(only), None) => Ok(only.as_str()),
            (None, _) => Err(MtsError::config("no [datasources] configured for migrations")),
            (Some(_), Some(_)) => Err(MtsError::config(
                "migrations.datasource is required when several data sources are configured",
            )),
        }
    }

    /// Migrations directory, env-expanded and resolved against the config file location.
    pub fn migrations_dir(&self) -> MtsResult<PathBuf> {
        Ok(self.resolve_path(expand_env_vars(&self.migrations.dir)?))
    }

    fn validate(&self) -> MtsResult<()> {
        if let Some(limit) = self.dml.row_limit {
            if limit <= 0 {
                return Err(MtsError::config(format!(
                    "dml.row_limit must be > 0, got {limit}"
                )));
            }
        }

        SortFieldMap::from_map(self.sort_fields.clone())
            .map_err(|e| MtsError::config(format!("invalid [sort_fields]: {e}")))?;

        for (name, ds) in &self.datasources {
            if ds.url.trim().is_empty() {
                return Err(MtsError::config(format!(
                    "datasources.{name}.url must not be empty"
                )));
            }
            if ds.max_size == 0 {
                return Err(MtsError::config(format!(
                    "datasources.{name}.max_size must be >= 1"
                )));
            }
        }

        if let Some(name) = &self.migrations.datasource {
            if !self.datasources.contains_key(name) {
                return Err(MtsError::config(format!(
                    "migrations.datasource '{name}' is not a configured data source"
                )));
            }
        }
        if self.migrations.enabled {
            if self.migrations.dir.trim().is_empty() {
                return Err(MtsError::config("migrations.dir must not be empty"));
            }
            self.migration_datasource()?;
        }
        if let Some(v) = self.migrations.target_version {
            if v <= 0 {
                return Err(MtsError::config(format!(
                    "migrations.target_version must be > 0, got {v}"
                )));
            }
        }

        Ok(())
    }
}

fn expand_env_vars(input: &str) -> MtsResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' || chars.peek() != Some(&'{') {
            out.push(c);
            continue;
        }
        chars.next();

        let mut key = String::new();
        let mut closed = false;
        for ch in chars.by_ref() {
            if ch == '}' {
                closed = true;
                break;
            }
            key.push(ch);
        }

        if !closed {
            return Err(MtsError::config(format!(
                "unterminated env var reference: ${{{key}"
            )));
        }
        if key.is_empty() {
            return Err(MtsError::config("invalid env var reference: ${}"));
        }

        let value = std::env::var(&key)
            .map_err(|_| MtsError::config(format!("missing env var for config expansion: {key}")))?;
        out.push_str(&value);
    }

    Ok(out)
}
