//! The generic sorted-merge differ (C2).
//!
//! Drives two [`RowSource`]s in lock-step and yields a [`DiffOutcome`] per
//! transition. This is the one piece of the engine every producer — whether
//! comparing schemas or table rows — is built on top of.

use crate::cursor::RowSource;
use crate::error::{CompareError, Result};
use crate::model::CatalogRow;

/// A single transition produced by comparing the heads of two sorted
/// cursors. Expressed as a tagged variant rather than four optional
/// callbacks, per SPEC_FULL.md §9.
#[derive(Debug, Clone)]
pub enum DiffOutcome {
    Inserted(CatalogRow),
    Deleted(CatalogRow),
    Updated {
        old: CatalogRow,
        new: CatalogRow,
        changed: Vec<String>,
    },
    Equal(CatalogRow),
}

/// Streams INSERTED/UPDATED/DELETED/EQUAL transitions between two sorted
/// row sources, given the diff-key and content-column projections.
///
/// Both sources must present the same columns; this is checked once, on
/// construction, against each source's `column_names()`.
pub struct SortedMergeDiff<'a, A: RowSource, B: RowSource> {
    a: A,
    b: B,
    key_cols: Vec<&'a str>,
    content_cols: Vec<&'a str>,
    head_a: Option<CatalogRow>,
    head_b: Option<CatalogRow>,
    done: bool,
}

impl<'a, A: RowSource, B: RowSource> SortedMergeDiff<'a, A, B> {
    /// Construct a new differ. Fails with [`CompareError::ColumnMismatch`]
    /// immediately if the two sources' columns disagree — this is checked
    /// eagerly so a caller never sees a spurious mid-stream diff caused by
    /// misaligned columns.
    pub fn new(
        mut a: A,
        mut b: B,
        key_cols: Vec<&'a str>,
        content_cols: Vec<&'a str>,
        schema: &str,
        table: &str,
    ) -> Result<Self> {
        let head_a = a.next_row()?;
        let head_b = b.next_row()?;

        if a.column_names() != b.column_names() && !a.column_names().is_empty() && !b.column_names().is_empty()
        {
            return Err(CompareError::ColumnMismatch {
                schema: schema.to_string(),
                table: table.to_string(),
            });
        }

        Ok(Self {
            a,
            b,
            key_cols,
            content_cols,
            head_a,
            head_b,
            done: false,
        })
    }

    fn advance_a(&mut self) -> Result<Option<CatalogRow>> {
        let taken = self.head_a.take();
        self.head_a = self.a.next_row()?;
        Ok(taken)
    }

    fn advance_b(&mut self) -> Result<Option<CatalogRow>> {
        let taken = self.head_b.take();
        self.head_b = self.b.next_row()?;
        Ok(taken)
    }

    fn step(&mut self) -> Result<Option<DiffOutcome>> {
        match (&self.head_a, &self.head_b) {
            (None, None) => {
                self.done = true;
                Ok(None)
            }
            (Some(_), None) => {
                let row = self.advance_a()?.expect("checked Some above");
                Ok(Some(DiffOutcome::Deleted(row)))
            }
            (None, Some(_)) => {
                let row = self.advance_b()?.expect("checked Some above");
                Ok(Some(DiffOutcome::Inserted(row)))
            }
            (Some(row_a), Some(row_b)) => {
                let key_a = row_a.key_tuple(&self.key_cols);
                let key_b = row_b.key_tuple(&self.key_cols);

                if key_a == key_b {
                    let old = self.advance_a()?.expect("checked Some above");
                    let new = self.advance_b()?.expect("checked Some above");
                    let changed = old.diff_columns(&new, &self.content_cols);
                    if changed.is_empty() {
                        Ok(Some(DiffOutcome::Equal(new)))
                    } else {
                        Ok(Some(DiffOutcome::Updated { old, new, changed }))
                    }
                } else if key_a < key_b {
                    let row = self.advance_a()?.expect("checked Some above");
                    Ok(Some(DiffOutcome::Deleted(row)))
                } else {
                    let row = self.advance_b()?.expect("checked Some above");
                    Ok(Some(DiffOutcome::Inserted(row)))
                }
            }
        }
    }
}

impl<'a, A: RowSource, B: RowSource> Iterator for SortedMergeDiff<'a, A, B> {
    type Item = Result<DiffOutcome>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(outcome)) => Some(Ok(outcome)),
            Ok(None) => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::FakeCursor;
    use crate::model::CellValue;

    fn row(id: i64, v: &str) -> CatalogRow {
        CatalogRow::new(vec![
            ("id".into(), CellValue::Int(id)),
            ("v".into(), CellValue::Text(v.into())),
        ])
    }

    fn cols() -> Vec<String> {
        vec!["id".into(), "v".into()]
    }

    fn diff(a: Vec<CatalogRow>, b: Vec<CatalogRow>) -> Vec<DiffOutcome> {
        let cursor_a = FakeCursor::new(cols(), a);
        let cursor_b = FakeCursor::new(cols(), b);
        let differ =
            SortedMergeDiff::new(cursor_a, cursor_b, vec!["id"], vec!["v"], "public", "t").unwrap();
        differ.map(|r| r.unwrap()).collect()
    }

    #[test]
    fn equal_rows_emit_equal() {
        let out = diff(vec![row(1, "x")], vec![row(1, "x")]);
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], DiffOutcome::Equal(_)));
    }

    #[test]
    fn differing_content_emits_updated_with_changed_columns() {
        let out = diff(vec![row(1, "x")], vec![row(1, "y")]);
        assert_eq!(out.len(), 1);
        match &out[0] {
            DiffOutcome::Updated { changed, .. } => assert_eq!(changed, &vec!["v".to_string()]),
            other => panic!("expected Updated, got {other:?}"),
        }
    }

    #[test]
    fn key_only_in_a_emits_deleted() {
        let out = diff(vec![row(1, "x")], vec![]);
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], DiffOutcome::Deleted(_)));
    }

    #[test]
    fn key_only_in_b_emits_inserted() {
        let out = diff(vec![], vec![row(1, "x")]);
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], DiffOutcome::Inserted(_)));
    }

    #[test]
    fn smaller_key_precedes_larger_key_as_deleted_then_inserted() {
        // a has key 1, b has key 2: 1 < 2 so a's row is DELETED first,
        // then b's remaining row is INSERTED on the drain pass.
        let out = diff(vec![row(1, "x")], vec![row(2, "y")]);
        assert_eq!(out.len(), 2);
        assert!(matches!(out[0], DiffOutcome::Deleted(_)));
        assert!(matches!(out[1], DiffOutcome::Inserted(_)));
    }

    #[test]
    fn drain_remaining_rows_after_one_side_exhausts() {
        let out = diff(
            vec![row(1, "x"), row(2, "y"), row(3, "z")],
            vec![row(1, "x")],
        );
        assert_eq!(out.len(), 3);
        assert!(matches!(out[0], DiffOutcome::Equal(_)));
        assert!(matches!(out[1], DiffOutcome::Deleted(_)));
        assert!(matches!(out[2], DiffOutcome::Deleted(_)));
    }

    #[test]
    fn null_equals_null_is_not_updated() {
        let a = CatalogRow::new(vec![
            ("id".into(), CellValue::Int(1)),
            ("v".into(), CellValue::Null),
        ]);
        let b = CatalogRow::new(vec![
            ("id".into(), CellValue::Int(1)),
            ("v".into(), CellValue::Null),
        ]);
        let out = diff(vec![a], vec![b]);
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], DiffOutcome::Equal(_)));
    }

    #[test]
    fn ordering_within_a_single_source_is_monotonic() {
        let out = diff(
            vec![row(1, "a"), row(2, "b"), row(3, "c")],
            vec![row(1, "a"), row(2, "b"), row(3, "c")],
        );
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|o| matches!(o, DiffOutcome::Equal(_))));
    }

    #[test]
    fn mismatched_columns_fail_fast() {
        let cursor_a = FakeCursor::new(vec!["id".into()], vec![]);
        let cursor_b = FakeCursor::new(vec!["id".into(), "v".into()], vec![row(1, "x")]);
        let result = SortedMergeDiff::new(cursor_a, cursor_b, vec!["id"], vec!["v"], "public", "t");
        assert!(matches!(result, Err(CompareError::ColumnMismatch { .. })));
    }
}
