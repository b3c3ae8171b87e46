//! Logical sort fields and their physical ORDER BY fragments.
//!
//! Callers sort by *logical* names (`"name"`, `"created"`); the map translates them into
//! the column expressions of the underlying query (`"t.last_name, t.first_name"`).
//!
//! # Example
//! ```ignore
//! use mts_dml::{SortFieldMap, SortSpec};
//!
//! let map = SortFieldMap::new()
//!     .with("name", "t.last_name, t.first_name")?
//!     .with("created", "t.created_at")?;
//!
//! assert_eq!(
//!     map.resolve(&SortSpec::desc("name"))?,
//!     " ORDER BY t.last_name DESC, t.first_name DESC"
//! );
//! # Ok::<(), mts_dml::MtsError>(())
//! ```

use crate::error::{MtsError, MtsResult};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending { SortDir::Asc } else { SortDir::Desc }
    }

    pub fn to_sql(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// A logical sort field plus direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub dir: SortDir,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, ascending: bool) -> Self {
        Self {
            field: field.into(),
            dir: SortDir::from_ascending(ascending),
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, true)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, false)
    }
}

/// Mapping from logical sort-field name to physical ORDER BY fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortFieldMap {
    fields: BTreeMap<String, String>,
}

impl SortFieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw name → fragment pairs, validating every fragment.
    pub fn from_map(fields: BTreeMap<String, String>) -> MtsResult<Self> {
        let mut map = Self::new();
        for (name, fragment) in fields {
            map.insert(name, fragment)?;
        }
        Ok(map)
    }

    /// Builder-style [`SortFieldMap::insert`].
    pub fn with(mut self, name: impl Into<String>, fragment: impl Into<String>) -> MtsResult<Self> {
        self.insert(name, fragment)?;
        Ok(self)
    }

    /// Register a fragment. Names are trimmed; empty names or fragments are rejected.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        fragment: impl Into<String>,
    ) -> MtsResult<()> {
        let name = name.into().trim().to_string();
        let fragment = fragment.into().trim().to_string();
        if name.is_empty() {
            return Err(MtsError::validation("sort field name must not be empty"));
        }
        if split_columns(&fragment).is_empty() {
            return Err(MtsError::validation(format!(
                "sort field '{name}' has an empty ORDER BY fragment"
            )));
        }
        self.fields.insert(name, fragment);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render ` ORDER BY ...` for a sort spec.
    ///
    /// The direction is applied to each comma-separated column of the fragment; columns that
    /// already carry `ASC`/`DESC` keep it.
    pub fn resolve(&self, spec: &SortSpec) -> MtsResult<String> {
        let fragment = self
            .get(&spec.field)
            .ok_or_else(|| MtsError::UnknownSortField(spec.field.clone()))?;

        let mut out = String::from(" ORDER BY ");
        for (i, column) in split_columns(fragment).into_iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            push_column(&mut out, column, spec.dir);
        }
        Ok(out)
    }

    /// Like [`SortFieldMap::resolve`], but logs unknown fields and returns `None` so the
    /// caller can carry on unordered.
    pub fn resolve_or_log(&self, spec: &SortSpec) -> Option<String> {
        match self.resolve(spec) {
            Ok(order_by) => Some(order_by),
            Err(err) => {
                tracing::error!(
                    target: "mts.sql",
                    field = %spec.field,
                    error = %err,
                    "cannot resolve sort field; continuing without ORDER BY"
                );
                None
            }
        }
    }
}

/// Split a fragment on commas that are not nested inside parentheses.
fn split_columns(fragment: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0u32;
    let mut start = 0;
    for (i, c) in fragment.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                out.push(fragment[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(fragment[start..].trim());
    out.retain(|c| !c.is_empty());
    out
}

/// `<expr> [ASC|DESC] [NULLS FIRST|LAST]`
fn column_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)^(?P<expr>.*?)(?:\s+(?P<dir>asc|desc))?(?P<nulls>\s+nulls\s+(?:first|last))?\s*$")
            .expect("invalid built-in sort column regex")
    })
}

/// Append `column` with `dir`, unless it already names a direction.
///
/// The direction goes before a trailing `NULLS FIRST|LAST`.
fn push_column(out: &mut String, column: &str, dir: SortDir) {
    let Some(caps) = column_re().captures(column) else {
        out.push_str(column);
        return;
    };
    if caps.name("dir").is_some() {
        out.push_str(column);
        return;
    }
    out.push_str(&caps["expr"]);
    out.push(' ');
    out.push_str(dir.to_sql());
    if let Some(nulls) = caps.name("nulls") {
        out.push_str(nulls.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> SortFieldMap {
        SortFieldMap::new()
            .with("name", "t.last_name, t.first_name")
            .unwrap()
            .with("created", "t.created_at")
            .unwrap()
            .with("score", "coalesce(t.score, 0), t.id asc")
            .unwrap()
    }

    #[test]
    fn resolve_single_column() {
        assert_eq!(
            map().resolve(&SortSpec::asc("created")).unwrap(),
            " ORDER BY t.created_at ASC"
        );
    }

    #[test]
    fn resolve_applies_direction_to_each_column() {
        assert_eq!(
            map().resolve(&SortSpec::desc("name")).unwrap(),
            " ORDER BY t.last_name DESC, t.first_name DESC"
        );
    }

    #[test]
    fn resolve_keeps_nested_commas_and_explicit_direction() {
        assert_eq!(
            map().resolve(&SortSpec::desc("score")).unwrap(),
            " ORDER BY coalesce(t.score, 0) DESC, t.id asc"
        );
    }

    #[test]
    fn resolve_unknown_field_is_error() {
        let err = map().resolve(&SortSpec::asc("nickname")).unwrap_err();
        assert!(err.is_unknown_sort_field());
    }

    #[test]
    fn resolve_or_log_degrades_to_none() {
        assert_eq!(map().resolve_or_log(&SortSpec::asc("nickname")), None);
        assert!(map().resolve_or_log(&SortSpec::asc("name")).is_some());
    }

    #[test]
    fn resolve_places_direction_before_nulls_clause() {
        let map = SortFieldMap::new()
            .with("score", "t.score NULLS LAST")
            .unwrap()
            .with("rank", "t.rank DESC NULLS FIRST, t.id")
            .unwrap();
        assert_eq!(
            map.resolve(&SortSpec::desc("score")).unwrap(),
            " ORDER BY t.score DESC NULLS LAST"
        );
        assert_eq!(
            map.resolve(&SortSpec::asc("rank")).unwrap(),
            " ORDER BY t.rank DESC NULLS FIRST, t.id ASC"
        );
    }

    #[test]
    fn direction_words_inside_names_are_not_directions() {
        let map = SortFieldMap::new()
            .with("d", "t.ascension_desc")
            .unwrap()
            .with("n", "t.nulls_last_seen")
            .unwrap();
        assert_eq!(
            map.resolve(&SortSpec::asc("d")).unwrap(),
            " ORDER BY t.ascension_desc ASC"
        );
        assert_eq!(
            map.resolve(&SortSpec::desc("n")).unwrap(),
            " ORDER BY t.nulls_last_seen DESC"
        );
    }

    #[test]
    fn insert_rejects_empty_fragment() {
        assert!(SortFieldMap::new().with("name", " , ").is_err());
        assert!(SortFieldMap::new().with("  ", "t.id").is_err());
    }
}
