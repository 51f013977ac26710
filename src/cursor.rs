//! Blockwise-fetched cursor abstraction over catalog and row-data queries.
//!
//! The differ (C2) only needs "give me the next row, refilling a block at a
//! time"; it does not care whether those rows come from a live Postgres
//! connection or an in-memory fixture. [`RowSource`] is that seam.

use crate::error::{CompareError, Result};
use crate::model::{CatalogRow, CellValue};
use postgres::GenericClient;
use std::collections::VecDeque;

/// Anything that can hand back blocks of [`CatalogRow`]s on demand.
///
/// `next_row` returns `Ok(None)` exactly once the underlying source is
/// exhausted: a plain `None`, not a double-negative flag to check first.
pub trait RowSource {
    fn next_row(&mut self) -> Result<Option<CatalogRow>>;
    fn column_names(&self) -> &[String];
}

/// Lets the row-data worker pick between a live [`BlockCursor`] and an
/// [`EmptyCursor`] at runtime (source table present vs. missing) without
/// making every caller of [`crate::differ::SortedMergeDiff`] generic over
/// which concrete source it got.
impl<T: RowSource + ?Sized> RowSource for Box<T> {
    fn next_row(&mut self) -> Result<Option<CatalogRow>> {
        (**self).next_row()
    }

    fn column_names(&self) -> &[String] {
        (**self).column_names()
    }
}

/// A [`RowSource`] backed by a live `postgres::Client` query, refetched in
/// fixed-size blocks via `LIMIT`/`OFFSET`.
///
/// The underlying SQL is expected to already carry a stable `ORDER BY` on the
/// diff-key columns (C1's responsibility); this type only paginates it.
pub struct BlockCursor<'a> {
    client: &'a mut dyn GenericClient,
    base_sql: String,
    block_size: i64,
    offset: i64,
    buffer: VecDeque<CatalogRow>,
    column_names: Vec<String>,
    exhausted: bool,
}

impl<'a> BlockCursor<'a> {
    pub fn new(
        client: &'a mut dyn GenericClient,
        base_sql: impl Into<String>,
        block_size: i64,
    ) -> Result<Self> {
        let mut cursor = Self {
            client,
            base_sql: base_sql.into(),
            block_size,
            offset: 0,
            buffer: VecDeque::new(),
            column_names: Vec::new(),
            exhausted: false,
        };
        cursor.discover_columns()?;
        cursor.refill()?;
        Ok(cursor)
    }

    /// Resolve the projection's column names from the statement itself
    /// (via `PREPARE`), not from the first returned row — a query that
    /// matches zero rows still has a well-defined column list, and the
    /// differ's `SchemaMismatch` check depends on knowing it even then.
    fn discover_columns(&mut self) -> Result<()> {
        let stmt = self
            .client
            .prepare(&self.base_sql)
            .map_err(|e| CompareError::CursorFailure(e.to_string()))?;
        self.column_names = stmt.columns().iter().map(|c| c.name().to_string()).collect();
        Ok(())
    }

    /// An empty cursor presenting the given column names — used when the
    /// source side of a row-data comparison is missing a table, so every
    /// target row surfaces as INSERTED (SPEC_FULL.md §4.4 step 3).
    pub fn empty(column_names: Vec<String>) -> EmptyCursor {
        EmptyCursor { column_names }
    }

    fn refill(&mut self) -> Result<()> {
        if self.exhausted {
            return Ok(());
        }
        let paginated = format!(
            "{} LIMIT {} OFFSET {}",
            self.base_sql, self.block_size, self.offset
        );
        let rows = self
            .client
            .query(paginated.as_str(), &[])
            .map_err(|e| CompareError::CursorFailure(e.to_string()))?;

        self.offset += rows.len() as i64;
        if (rows.len() as i64) < self.block_size {
            self.exhausted = true;
        }
        for row in rows {
            self.buffer.push_back(pg_row_to_catalog_row(&row));
        }
        Ok(())
    }
}

impl<'a> RowSource for BlockCursor<'a> {
    fn next_row(&mut self) -> Result<Option<CatalogRow>> {
        if self.buffer.is_empty() && !self.exhausted {
            self.refill()?;
        }
        Ok(self.buffer.pop_front())
    }

    fn column_names(&self) -> &[String] {
        &self.column_names
    }
}

/// A [`RowSource`] with no rows, used to stand in for a table missing on one
/// side of a row-data comparison.
pub struct EmptyCursor {
    column_names: Vec<String>,
}

impl RowSource for EmptyCursor {
    fn next_row(&mut self) -> Result<Option<CatalogRow>> {
        Ok(None)
    }

    fn column_names(&self) -> &[String] {
        &self.column_names
    }
}

/// An in-memory [`RowSource`] used by differ unit tests, refilling in the
/// same blockwise shape a live cursor would (so tests exercise the same
/// refill-on-exhaustion code path the differ relies on).
pub struct FakeCursor {
    rows: VecDeque<CatalogRow>,
    column_names: Vec<String>,
}

impl FakeCursor {
    pub fn new(column_names: Vec<String>, rows: Vec<CatalogRow>) -> Self {
        Self {
            rows: rows.into(),
            column_names,
        }
    }
}

impl RowSource for FakeCursor {
    fn next_row(&mut self) -> Result<Option<CatalogRow>> {
        Ok(self.rows.pop_front())
    }

    fn column_names(&self) -> &[String] {
        &self.column_names
    }
}

fn pg_row_to_catalog_row(row: &postgres::Row) -> CatalogRow {
    let mut columns = Vec::with_capacity(row.len());
    for (idx, col) in row.columns().iter().enumerate() {
        let value = cell_from_row(row, idx, col.type_());
        columns.push((col.name().to_string(), value));
    }
    CatalogRow::new(columns)
}

fn cell_from_row(row: &postgres::Row, idx: usize, ty: &postgres::types::Type) -> CellValue {
    use postgres::types::Type;

    match *ty {
        Type::INT2 => row
            .get::<_, Option<i16>>(idx)
            .map(|v| CellValue::Int(v as i64))
            .unwrap_or(CellValue::Null),
        Type::INT4 => row
            .get::<_, Option<i32>>(idx)
            .map(|v| CellValue::Int(v as i64))
            .unwrap_or(CellValue::Null),
        Type::INT8 => row
            .get::<_, Option<i64>>(idx)
            .map(CellValue::Int)
            .unwrap_or(CellValue::Null),
        Type::BOOL => row
            .get::<_, Option<bool>>(idx)
            .map(CellValue::Bool)
            .unwrap_or(CellValue::Null),
        Type::TIMESTAMPTZ | Type::TIMESTAMP => row
            .get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)
            .map(CellValue::Timestamp)
            .unwrap_or(CellValue::Null),
        Type::BYTEA => row
            .get::<_, Option<Vec<u8>>>(idx)
            .map(CellValue::Bytes)
            .unwrap_or(CellValue::Null),
        _ => row
            .get::<_, Option<String>>(idx)
            .map(CellValue::Text)
            .unwrap_or(CellValue::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cursor_never_yields_rows() {
        let mut c = EmptyCursor {
            column_names: vec!["a".into()],
        };
        assert!(c.next_row().unwrap().is_none());
        assert!(c.next_row().unwrap().is_none());
    }

    #[test]
    fn fake_cursor_yields_rows_then_none() {
        let row = CatalogRow::new(vec![("a".into(), CellValue::Int(1))]);
        let mut c = FakeCursor::new(vec!["a".into()], vec![row.clone()]);
        assert_eq!(c.next_row().unwrap(), Some(row));
        assert_eq!(c.next_row().unwrap(), None);
    }
}
