//! Migration bootstrap via [`refinery`].
//!
//! At startup the application points a [`MigrationBootstrap`] at a directory of
//! `V<version>__<name>.sql` files and applies whatever the target database has not seen
//! yet. Applied versions are tracked by refinery in `refinery_schema_history`.
//!
//! ```ignore
//! let config = mts_dml::MtsConfig::load("mts.toml")?;
//! let sources = mts_dml::DataSources::from_config(&config)?;
//! let pool = sources.get(config.migration_datasource()?)?;
//!
//! mts_dml::migrate::MigrationBootstrap::from_config(&config)?
//!     .run_pool(pool)
//!     .await?;
//! ```

use crate::config::MtsConfig;
use crate::error::{MtsError, MtsResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub use refinery::{Migration, Report, Runner, SchemaVersion, Target};

/// A `V<version>__<name>.sql` file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub version: i64,
    pub name: String,
    pub path: PathBuf,
}

/// Split `V12__add_users.sql` into `(12, "add_users")`.
fn parse_file_name(file_name: &str) -> Option<(i64, String)> {
    let stem = file_name.strip_prefix('V')?.strip_suffix(".sql")?;
    let (version, name) = stem.split_once("__")?;
    let version = version.parse::<i64>().ok().filter(|v| *v > 0)?;
    if name.is_empty() {
        return None;
    }
    Some((version, name.to_string()))
}

/// Applies pending SQL migrations from a directory.
#[derive(Debug, Clone)]
pub struct MigrationBootstrap {
    dir: PathBuf,
    target_version: Option<i64>,
    enabled: bool,
}

impl MigrationBootstrap {
    /// Enabled bootstrap over `dir`, migrating to the latest version.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            target_version: None,
            enabled: true,
        }
    }

    /// Bootstrap described by the `[migrations]` section.
    pub fn from_config(config: &MtsConfig) -> MtsResult<Self> {
        Ok(Self {
            dir: config.migrations_dir()?,
            target_version: config.migrations.target_version,
            enabled: config.migrations.enabled,
        })
    }

    /// Stop at `version` (inclusive).
    pub fn target_version(mut self, version: i64) -> Self {
        self.target_version = Some(version);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Migration files in the directory, ordered by version.
    ///
    /// Files that do not follow the naming scheme are ignored; two files with the same
    /// version are an error.
    pub fn scan(&self) -> MtsResult<Vec<MigrationFile>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            MtsError::Migration(format!(
                "failed to read migrations dir {}: {e}",
                self.dir.display()
            ))
        })?;

        let mut by_version = BTreeMap::new();
        for entry in entries {
            let path = entry
                .map_err(|e| MtsError::Migration(format!("failed to read dir entry: {e}")))?
                .path();
            if !path.is_file() {
                continue;
            }
            let Some((version, name)) = path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(parse_file_name)
            else {
                tracing::trace!(target: "mts.migrate", path = %path.display(), "skipping non-migration file");
                continue;
            };

            if let Some(existing) = by_version.insert(
                version,
                MigrationFile {
                    version,
                    name,
                    path: path.clone(),
                },
            ) {
                return Err(MtsError::Migration(format!(
                    "duplicate migration version {version}: {} and {}",
                    existing.path.display(),
                    path.display()
                )));
            }
        }

        Ok(by_version.into_values().collect())
    }

    /// Build a refinery runner over the scanned files.
    pub fn runner(&self) -> MtsResult<Runner> {
        let mut migrations = Vec::new();
        for file in self.scan()? {
            let sql = fs::read_to_string(&file.path).map_err(|e| {
                MtsError::Migration(format!(
                    "failed to read migration {}: {e}",
                    file.path.display()
                ))
            })?;
            let name = format!("V{}__{}.sql", file.version, file.name);
            migrations.push(Migration::unapplied(&name, &sql)?);
        }

        let mut runner = Runner::new(&migrations);
        if let Some(v) = self.target_version {
            let version = SchemaVersion::try_from(v)
                .map_err(|_| MtsError::Migration(format!("target version out of range: {v}")))?;
            runner = runner.set_target(Target::Version(version));
        }
        Ok(runner)
    }

    /// Apply pending migrations on one connection.
    ///
    /// Returns `None` when the bootstrap is disabled.
    pub async fn run(&self, client: &mut tokio_postgres::Client) -> MtsResult<Option<Report>> {
        if !self.enabled {
            tracing::info!(target: "mts.migrate", "migration bootstrap disabled");
            return Ok(None);
        }

        let runner = self.runner()?;
        tracing::info!(
            target: "mts.migrate",
            dir = %self.dir.display(),
            target_version = ?self.target_version,
            "running migrations"
        );
        let report = runner.run_async(client).await?;
        for m in report.applied_migrations() {
            tracing::info!(
                target: "mts.migrate",
                version = m.version(),
                name = %m.name(),
                "applied migration"
            );
        }
        Ok(Some(report))
    }

    /// Acquire a pooled connection and [`MigrationBootstrap::run`] on it.
    #[cfg(feature = "pool")]
    pub async fn run_pool(&self, pool: &deadpool_postgres::Pool) -> MtsResult<Option<Report>> {
        if !self.enabled {
            tracing::info!(target: "mts.migrate", "migration bootstrap disabled");
            return Ok(None);
        }
        let mut client = pool.get().await?;
        self.run(&mut client).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn make_temp_dir() -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!("mts-migrate-test-{nonce}-{seq}"));
        fs::create_dir_all(&dir).expect("mkdir");
        dir
    }

    #[test]
    fn parses_file_names() {
        assert_eq!(parse_file_name("V1__init.sql"), Some((1, "init".to_string())));
        assert_eq!(
            parse_file_name("V12__add_users.sql"),
            Some((12, "add_users".to_string()))
        );
        assert_eq!(parse_file_name("V0__zero.sql"), None);
        assert_eq!(parse_file_name("V1__.sql"), None);
        assert_eq!(parse_file_name("README.md"), None);
        assert_eq!(parse_file_name("U1__undo.sql"), None);
    }

    #[test]
    fn scan_orders_by_version_and_skips_other_files() {
        let dir = make_temp_dir();
        fs::write(dir.join("V2__users.sql"), "CREATE TABLE users(id int);").expect("write");
        fs::write(dir.join("V1__init.sql"), "CREATE TABLE t(id int);").expect("write");
        fs::write(dir.join("notes.txt"), "ignore me").expect("write");

        let files = MigrationBootstrap::new(&dir).scan().expect("scan");
        let versions: Vec<_> = files.iter().map(|f| f.version).collect();
        assert_eq!(versions, vec![1, 2]);
        assert_eq!(files[1].name, "users");

        fs::remove_dir_all(dir).expect("cleanup");
    }

    #[test]
    fn scan_rejects_duplicate_versions() {
        let dir = make_temp_dir();
        fs::write(dir.join("V1__a.sql"), "SELECT 1;").expect("write");
        fs::write(dir.join("V1__b.sql"), "SELECT 2;").expect("write");

        let err = MigrationBootstrap::new(&dir).scan().expect_err("must fail");
        assert!(err.to_string().contains("duplicate migration version 1"));

        fs::remove_dir_all(dir).expect("cleanup");
    }

    #[test]
    fn runner_builds_from_dir() {
        let dir = make_temp_dir();
        fs::write(dir.join("V1__init.sql"), "CREATE TABLE t(id int);").expect("write");

        let bootstrap = MigrationBootstrap::new(&dir).target_version(1);
        assert!(bootstrap.runner().is_ok());

        fs::remove_dir_all(dir).expect("cleanup");
    }

    #[cfg(feature = "pool")]
    #[tokio::test]
    async fn disabled_bootstrap_is_a_no_op() {
        let pool = crate::pool::create_pool("postgres://mts@localhost/mts").unwrap();
        let report = MigrationBootstrap::new("/nonexistent/migrations")
            .enabled(false)
            .run_pool(&pool)
            .await
            .unwrap();
        assert!(report.is_none());
    }

    #[test]
    fn scan_reports_missing_dir() {
        let err = MigrationBootstrap::new("/nonexistent/migrations")
            .scan()
            .unwrap_err();
        assert!(matches!(err, MtsError::Migration(_)));
    }

    #[test]
    fn from_config_reads_section() {
        let mut config = MtsConfig::from_toml_str(
            "[datasources.main]\nurl = \"postgres://localhost/mts\"\n\
             [migrations]\nenabled = true\ndir = \"db/migrations\"\ntarget_version = 4\n",
        )
        .unwrap();
        config.config_dir = PathBuf::from("/srv/mts");

        let bootstrap = MigrationBootstrap::from_config(&config).unwrap();
        assert!(bootstrap.is_enabled());
        assert_eq!(bootstrap.dir(), Path::new("/srv/mts/db/migrations"));
        assert_eq!(bootstrap.target_version, Some(4));
    }
}
