//! Dynamic, schema-less row representation shared by the catalog library and
//! the differ, plus the category and diff-event types that travel between
//! producers and consumers.

use chrono::{DateTime, Utc};
use std::fmt;

/// A single cell value from a catalog or row-data query.
///
/// Catalog rows carry arbitrary, category-specific column sets; rather than
/// binding every category to its own Rust struct, cells are kept as this
/// tagged variant so the differ can compare rows from any category without
/// per-category specialization.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Int(i64),
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Bytes(Vec<u8>),
}

impl CellValue {
    /// Null-aware equality: `NULL == NULL`, otherwise same tag and payload.
    pub fn diff_equal(&self, other: &CellValue) -> bool {
        self == other
    }

    /// Render the value as it appears in generated DML: dollar-quoted for
    /// non-null text-like content, the bare token `NULL` for nulls.
    pub fn as_literal(&self) -> String {
        match self {
            CellValue::Null => "NULL".to_string(),
            CellValue::Int(v) => format!("$data_comparer${v}$data_comparer$"),
            CellValue::Text(v) => format!("$data_comparer${v}$data_comparer$"),
            CellValue::Bool(v) => format!("$data_comparer${v}$data_comparer$"),
            CellValue::Timestamp(v) => format!("$data_comparer${}$data_comparer$", v.to_rfc3339()),
            CellValue::Bytes(v) => {
                format!("$data_comparer${}$data_comparer$", String::from_utf8_lossy(v))
            }
        }
    }

    /// Stringified form used for diff-key comparison.
    pub fn as_key_string(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Int(v) => v.to_string(),
            CellValue::Text(v) => v.clone(),
            CellValue::Bool(v) => v.to_string(),
            CellValue::Timestamp(v) => v.to_rfc3339(),
            CellValue::Bytes(v) => String::from_utf8_lossy(v).into_owned(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_key_string())
    }
}

/// An ordered mapping of column name to value produced by a catalog SQL.
///
/// Column order is preserved as returned by the query; the differ never
/// needs random access by name for more than a handful of lookups per row,
/// so a `Vec` is kept rather than a hash map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogRow {
    columns: Vec<(String, CellValue)>,
}

impl CatalogRow {
    pub fn new(columns: Vec<(String, CellValue)>) -> Self {
        Self { columns }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, CellValue)> {
        self.columns.iter()
    }

    /// Build the composite diff key as an ordered tuple of the named columns'
    /// stringified values. Kept as a `Vec<String>` rather than the original's
    /// `_`-joined string: comparing an ordered tuple of values is exactly as
    /// cheap and cannot collide across a boundary the way a joined string can
    /// when a value itself contains the separator (see SPEC_FULL.md §9).
    pub fn key_tuple(&self, key_cols: &[&str]) -> Vec<String> {
        key_cols
            .iter()
            .map(|col| {
                self.get(col)
                    .map(CellValue::as_key_string)
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Content-column equality check against another row with the same shape,
    /// returning the names of columns that differ.
    pub fn diff_columns(&self, other: &CatalogRow, content_cols: &[&str]) -> Vec<String> {
        content_cols
            .iter()
            .filter(|col| {
                let a = self.get(col);
                let b = other.get(col);
                match (a, b) {
                    (Some(a), Some(b)) => !a.diff_equal(b),
                    (None, None) => false,
                    _ => true,
                }
            })
            .map(|c| c.to_string())
            .collect()
    }
}

/// One of the 18 catalog object categories compared by this tool.
///
/// Spelled `TablesExcludes` consistently (the original's `tables_exludes`
/// typo in one of its two validation lists is not reproduced — see
/// SPEC_FULL.md §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Schemas,
    Tables,
    TablesColumns,
    TablesPks,
    TablesFks,
    TablesUniques,
    TablesChecks,
    TablesExcludes,
    TablesRules,
    TablesTriggers,
    Indexes,
    Sequences,
    Views,
    Mviews,
    Functions,
    TriggerFunctions,
    Procedures,
    TablesData,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Category::Schemas => "schemas",
            Category::Tables => "tables",
            Category::TablesColumns => "tables_columns",
            Category::TablesPks => "tables_pks",
            Category::TablesFks => "tables_fks",
            Category::TablesUniques => "tables_uniques",
            Category::TablesChecks => "tables_checks",
            Category::TablesExcludes => "tables_excludes",
            Category::TablesRules => "tables_rules",
            Category::TablesTriggers => "tables_triggers",
            Category::Indexes => "indexes",
            Category::Sequences => "sequences",
            Category::Views => "views",
            Category::Mviews => "mviews",
            Category::Functions => "functions",
            Category::TriggerFunctions => "trigger_functions",
            Category::Procedures => "procedures",
            Category::TablesData => "tables_data",
        }
    }

    /// Every non-row-data category, in the fixed order producers are spawned.
    pub fn structural_categories() -> &'static [Category] {
        &[
            Category::Schemas,
            Category::Tables,
            Category::TablesColumns,
            Category::TablesPks,
            Category::TablesFks,
            Category::TablesUniques,
            Category::TablesChecks,
            Category::TablesExcludes,
            Category::TablesRules,
            Category::TablesTriggers,
            Category::Indexes,
            Category::Sequences,
            Category::Views,
            Category::Mviews,
            Category::Functions,
            Category::TriggerFunctions,
            Category::Procedures,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The status of a single diff event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffStatus {
    Inserted,
    Updated,
    Deleted,
}

impl DiffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffStatus::Inserted => "INSERTED",
            DiffStatus::Updated => "UPDATED",
            DiffStatus::Deleted => "DELETED",
        }
    }
}

/// Category-specific identifying fields for a diff event. Only the fields
/// relevant to the category are set; the rest are `None`, matching the
/// report table's "unused identity columns are unset" contract.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub schema_name: Option<String>,
    pub table_name: Option<String>,
    pub column_name: Option<String>,
    pub constraint_name: Option<String>,
    pub trigger_name: Option<String>,
    pub index_name: Option<String>,
    pub sequence_name: Option<String>,
    pub view_name: Option<String>,
    pub mview_name: Option<String>,
    pub function_id: Option<String>,
}

/// The unit placed on the shared queue (C4) by a producer and consumed by a
/// consumer (C5).
#[derive(Debug, Clone)]
pub struct DiffEvent {
    pub category: Category,
    pub status: DiffStatus,
    pub identity: Identity,
    pub changed_columns: Vec<String>,
    pub sql: String,
}

impl DiffEvent {
    pub fn new(
        category: Category,
        status: DiffStatus,
        identity: Identity,
        changed_columns: Vec<String>,
        sql: impl Into<String>,
    ) -> Self {
        Self {
            category,
            status,
            identity,
            changed_columns,
            sql: sql.into(),
        }
    }
}
