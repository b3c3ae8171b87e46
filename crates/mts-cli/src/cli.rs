use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Paginate,
    Limit,
    Migrate,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Paginate(PaginateArgs),
    Limit(LimitArgs),
    Migrate(MigrateArgs),
}

#[derive(Debug, Clone)]
pub struct PaginateArgs {
    pub config: PathBuf,
    pub dialect: Option<String>,
    pub offset: i64,
    pub size: i64,
    pub sort: Option<String>,
    pub descending: bool,
    pub sql: String,
}

#[derive(Debug, Clone)]
pub struct LimitArgs {
    pub config: PathBuf,
    pub dialect: Option<String>,
    /// Falls back to `dml.row_limit` when absent.
    pub limit: Option<i64>,
    pub sql: String,
}

#[derive(Debug, Clone)]
pub struct MigrateArgs {
    pub config: PathBuf,
    pub datasource: Option<String>,
    pub to: Option<i64>,
}

const DEFAULT_CONFIG: &str = "mts.toml";

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help(HelpTopic::Root)),
        "paginate" => parse_paginate(it.map(|s| s.as_str())),
        "limit" => parse_limit(it.map(|s| s.as_str())),
        "migrate" => parse_migrate(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

fn value<'a>(flag: &str, it: &mut impl Iterator<Item = &'a str>) -> anyhow::Result<&'a str> {
    let Some(v) = it.next() else {
        anyhow::bail!("{flag} requires a value");
    };
    Ok(v)
}

fn parse_i64(flag: &str, raw: &str) -> anyhow::Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| anyhow::anyhow!("{flag} expects an integer, got '{raw}'"))
}

/// Handles `--flag value` and `--flag=value`; returns `None` when `token` is not `flag`.
fn flag_value<'a>(
    flag: &str,
    token: &'a str,
    it: &mut impl Iterator<Item = &'a str>,
) -> anyhow::Result<Option<&'a str>> {
    if token == flag {
        return value(flag, it).map(Some);
    }
    Ok(token
        .strip_prefix(flag)
        .and_then(|rest| rest.strip_prefix('=')))
}

fn parse_paginate<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut dialect = None;
    let mut offset = 0;
    let mut size = 0;
    let mut sort = None;
    let mut descending = false;
    let mut sql: Option<String> = None;

    while let Some(token) = it.next() {
        if matches!(token, "-h" | "--help") {
            return Ok(Command::Help(HelpTopic::Paginate));
        }
        if token == "--desc" {
            descending = true;
        } else if let Some(v) = flag_value("--config", token, &mut it)? {
            config = PathBuf::from(v);
        } else if let Some(v) = flag_value("--dialect", token, &mut it)? {
            dialect = Some(v.to_string());
        } else if let Some(v) = flag_value("--offset", token, &mut it)? {
            offset = parse_i64("--offset", v)?;
        } else if let Some(v) = flag_value("--size", token, &mut it)? {
            size = parse_i64("--size", v)?;
        } else if let Some(v) = flag_value("--sort", token, &mut it)? {
            sort = Some(v.to_string());
        } else if token.starts_with("--") {
            anyhow::bail!("unknown argument: {token}");
        } else if sql.is_some() {
            anyhow::bail!("unexpected argument: {token} (quote the SQL as one argument)");
        } else {
            sql = Some(token.to_string());
        }
    }

    let Some(sql) = sql else {
        anyhow::bail!("paginate requires a SQL argument");
    };
    Ok(Command::Paginate(PaginateArgs {
        config,
        dialect,
        offset,
        size,
        sort,
        descending,
        sql,
    }))
}

fn parse_limit<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut dialect = None;
    let mut limit = None;
    let mut sql: Option<String> = None;

    while let Some(token) = it.next() {
        if matches!(token, "-h" | "--help") {
            return Ok(Command::Help(HelpTopic::Limit));
        }
        if let Some(v) = flag_value("--config", token, &mut it)? {
            config = PathBuf::from(v);
        } else if let Some(v) = flag_value("--dialect", token, &mut it)? {
            dialect = Some(v.to_string());
        } else if let Some(v) = flag_value("--limit", token, &mut it)? {
            limit = Some(parse_i64("--limit", v)?);
        } else if token.starts_with("--") {
            anyhow::bail!("unknown argument: {token}");
        } else if sql.is_some() {
            anyhow::bail!("unexpected argument: {token} (quote the SQL as one argument)");
        } else {
            sql = Some(token.to_string());
        }
    }

    let Some(sql) = sql else {
        anyhow::bail!("limit requires a SQL argument");
    };
    Ok(Command::Limit(LimitArgs {
        config,
        dialect,
        limit,
        sql,
    }))
}

fn parse_migrate<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut datasource = None;
    let mut to = None;

    while let Some(token) = it.next() {
        if matches!(token, "-h" | "--help") {
            return Ok(Command::Help(HelpTopic::Migrate));
        }
        if let Some(v) = flag_value("--config", token, &mut it)? {
            config = PathBuf::from(v);
        } else if let Some(v) = flag_value("--datasource", token, &mut it)? {
            datasource = Some(v.to_string());
        } else if let Some(v) = flag_value("--to", token, &mut it)? {
            to = Some(parse_i64("--to", v)?);
        } else {
            anyhow::bail!("unknown argument: {token}");
        }
    }

    Ok(Command::Migrate(MigrateArgs {
        config,
        datasource,
        to,
    }))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
mts - render paged SQL and bootstrap MTS databases

USAGE:
  mts <COMMAND> [OPTIONS]

COMMANDS:
  paginate      Print the paged form of a SELECT
  limit         Print a SELECT capped at N rows
  migrate       Apply pending SQL migrations
  help          Print this message

Run `mts <command> --help` for more.
Set RUST_LOG (e.g. RUST_LOG=mts=debug) to see builder decisions."
            );
        }
        HelpTopic::Paginate => {
            println!(
                "\
USAGE:
  mts paginate [OPTIONS] <SQL>

OPTIONS:
  --config <FILE>       Config file path (default: mts.toml)
  --dialect <NAME>      Override dml.dialect (oracle, derby, sqlserver, postgresql, mysql)
  --offset <N>          Rows to skip (default: 0)
  --size <N>            Page size; 0 or less only applies the ORDER BY (default: 0)
  --sort <FIELD>        Logical sort field from [sort_fields]
  --desc                Sort descending
  -h, --help            Print help"
            );
        }
        HelpTopic::Limit => {
            println!(
                "\
USAGE:
  mts limit [OPTIONS] <SQL>

OPTIONS:
  --config <FILE>       Config file path (default: mts.toml)
  --dialect <NAME>      Override dml.dialect
  --limit <N>           Maximum rows (default: dml.row_limit)
  -h, --help            Print help"
            );
        }
        HelpTopic::Migrate => {
            println!(
                "\
USAGE:
  mts migrate [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: mts.toml)
  --datasource <NAME>   Override migrations.datasource
  --to <VERSION>        Stop at this version (inclusive)
  -h, --help            Print help"
            );
        }
    }
}
