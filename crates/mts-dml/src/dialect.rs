//! Supported SQL dialects.

use crate::error::MtsError;
use crate::paging::{LimitOffset, OffsetFetch, PageStrategy, RowNum};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Target database SQL variant. Determines pagination syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Dialect {
    Oracle,
    Derby,
    SqlServer,
    Postgresql,
    Mysql,
}

impl Dialect {
    /// All supported dialects.
    pub const ALL: [Dialect; 5] = [
        Dialect::Oracle,
        Dialect::Derby,
        Dialect::SqlServer,
        Dialect::Postgresql,
        Dialect::Mysql,
    ];

    /// Canonical lower-case name, as accepted in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Oracle => "oracle",
            Dialect::Derby => "derby",
            Dialect::SqlServer => "sqlserver",
            Dialect::Postgresql => "postgresql",
            Dialect::Mysql => "mysql",
        }
    }

    /// Pagination strategy for this dialect.
    pub fn strategy(self) -> &'static dyn PageStrategy {
        static OFFSET_FETCH_DERBY: OffsetFetch = OffsetFetch::new(Dialect::Derby);
        static OFFSET_FETCH_SQLSERVER: OffsetFetch = OffsetFetch::new(Dialect::SqlServer);
        static OFFSET_FETCH_POSTGRESQL: OffsetFetch = OffsetFetch::new(Dialect::Postgresql);
        static LIMIT_OFFSET: LimitOffset = LimitOffset;
        static ROW_NUM: RowNum = RowNum;

        match self {
            Dialect::Oracle => &ROW_NUM,
            Dialect::Derby => &OFFSET_FETCH_DERBY,
            Dialect::SqlServer => &OFFSET_FETCH_SQLSERVER,
            Dialect::Postgresql => &OFFSET_FETCH_POSTGRESQL,
            Dialect::Mysql => &LIMIT_OFFSET,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = MtsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oracle" => Ok(Dialect::Oracle),
            "derby" => Ok(Dialect::Derby),
            "sqlserver" | "mssql" => Ok(Dialect::SqlServer),
            "postgresql" | "postgres" => Ok(Dialect::Postgresql),
            "mysql" => Ok(Dialect::Mysql),
            _ => Err(MtsError::UnsupportedDialect(s.to_string())),
        }
    }
}

impl TryFrom<String> for Dialect {
    type Error = MtsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
