use crate::cli::{LimitArgs, PaginateArgs};
use anyhow::Context;
use mts_dml::{Dialect, MtsConfig, PageSpec, QueryDml, SortSpec};
use std::path::Path;

fn load_dml(config: &Path, dialect: Option<&str>) -> anyhow::Result<(MtsConfig, QueryDml)> {
    let cfg = MtsConfig::load(config)
        .with_context(|| format!("failed to load {}", config.display()))?;
    let mut dml = cfg.query_dml()?;
    if let Some(name) = dialect {
        let dialect: Dialect = name.parse()?;
        dml = dml.dialect(dialect);
    }
    Ok((cfg, dml))
}

pub fn run_paginate(args: PaginateArgs) -> anyhow::Result<()> {
    let (_, dml) = load_dml(&args.config, args.dialect.as_deref())?;
    let sort = args
        .sort
        .as_deref()
        .map(|field| SortSpec::new(field, !args.descending));

    let sql = dml.paginate_sorted(&args.sql, sort.as_ref(), PageSpec::new(args.offset, args.size))?;
    println!("{sql}");
    Ok(())
}

pub fn run_limit(args: LimitArgs) -> anyhow::Result<()> {
    let (_, dml) = load_dml(&args.config, args.dialect.as_deref())?;
    let sql = match args.limit {
        Some(limit) => dml.limit(&args.sql, limit)?,
        None => {
            if dml.get_row_limit().is_none() {
                anyhow::bail!("no --limit given and dml.row_limit is not configured");
            }
            dml.cap(&args.sql)?
        }
    };
    println!("{sql}");
    Ok(())
}
