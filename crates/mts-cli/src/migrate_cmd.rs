use crate::cli::MigrateArgs;
use anyhow::Context;
use mts_dml::{DataSources, MigrationBootstrap, MtsConfig};

pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    let cfg = MtsConfig::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    let mut bootstrap = MigrationBootstrap::from_config(&cfg)?.enabled(true);
    if let Some(v) = args.to {
        bootstrap = bootstrap.target_version(v);
    }

    let name = match args.datasource.as_deref() {
        Some(name) => name,
        None => cfg.migration_datasource()?,
    };
    let sources = DataSources::from_config(&cfg)?;
    let pool = sources.get(name)?;

    let report = bootstrap
        .run_pool(pool)
        .await
        .with_context(|| format!("migrating data source '{name}'"))?;

    let applied = report
        .as_ref()
        .map(|r| r.applied_migrations().len())
        .unwrap_or(0);
    if applied == 0 {
        println!("no pending migrations");
    } else {
        println!(
            "applied {applied} migration(s) from {} to '{name}'",
            bootstrap.dir().display()
        );
    }
    Ok(())
}
