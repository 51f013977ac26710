//! Row-Data Differ (C6): the producer specialization that diffs the rows of
//! one leaf table rather than a catalog category. Discovers the table's key
//! and column types once (in the master, via [`discover_leaf_tables`]),
//! then each per-table worker runs the same [`SortedMergeDiff`] engine C3
//! uses, translating outcomes into INSERT/UPDATE/DELETE DML instead of DDL.

use crate::catalog::row_data::{self, ColumnSpec, TableTask};
use crate::cursor::{BlockCursor, RowSource};
use crate::differ::{DiffOutcome, SortedMergeDiff};
use crate::error::{CompareError, Result};
use crate::model::{CatalogRow, Category, CellValue, DiffEvent, DiffStatus, Identity};
use crate::queue::Liveness;
use crossbeam::channel::Sender;
use postgres::{Client, Config, NoTls};
use tracing::{error, info, instrument};

pub struct RowDataContext {
    pub source: Config,
    pub target: Config,
    pub block_size: i64,
    pub queue: Sender<DiffEvent>,
    pub liveness: Liveness,
    pub index: usize,
}

/// Run the discovery query against the target once, in the master, before
/// any row-data producer is spawned. Tables named on `-e/--exclude-tables`
/// are filtered out by the caller (exclusion is row-data-only, per
/// SPEC_FULL.md §4.4 — structural categories still compare them).
pub fn discover_leaf_tables(client: &mut Client) -> Result<Vec<TableTask>> {
    let rows = client
        .query(row_data::DISCOVER_LEAF_TABLES_SQL, &[])
        .map_err(CompareError::Query)?;
    Ok(rows
        .iter()
        .map(|row| TableTask {
            schema_name: row.get("table_schema"),
            table_name: row.get("table_name"),
            table_key: row.get("table_key"),
            columns_names_types: row.get("columns_names_types"),
        })
        .collect())
}

/// Run one table's row-data producer to completion, per SPEC_FULL.md §4.4.
#[instrument(skip(ctx, task), fields(table = %format!("{}.{}", task.schema_name, task.table_name)))]
pub fn run_row_data_producer(task: TableTask, ctx: RowDataContext) -> Result<()> {
    let result = run_inner(&task, &ctx);
    ctx.liveness.mark_done(ctx.index);
    match &result {
        Ok(count) => info!(events = count, "row-data producer finished"),
        Err(e) => error!(error = %e, "row-data producer failed"),
    }
    result.map(|_| ())
}

fn unquote_ident(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].replace("\"\"", "\"")
    } else {
        trimmed.to_string()
    }
}

fn run_inner(task: &TableTask, ctx: &RowDataContext) -> Result<usize> {
    let columns = row_data::parse_columns(&task.columns_names_types);
    let key_cols_raw: Vec<String> = row_data::parse_key(&task.table_key)
        .iter()
        .map(|c| unquote_ident(c))
        .collect();
    let key_cols: Vec<&str> = key_cols_raw.iter().map(String::as_str).collect();

    let content_cols_raw: Vec<String> = columns
        .iter()
        .map(|c| unquote_ident(&c.name))
        .filter(|name| !key_cols_raw.contains(name))
        .collect();
    let content_cols: Vec<&str> = content_cols_raw.iter().map(String::as_str).collect();

    let select_sql =
        row_data::select_table_ordered_sql(&task.schema_name, &task.table_name, &task.table_key);

    // A-side is the target (DELETED/DELETE FROM when absent from the
    // source), B-side is the source (INSERTED/INSERT INTO when absent from
    // the target), matching the structural producer's convention.
    let mut target_client = ctx.target.connect(NoTls).map_err(|e| CompareError::Connection {
        label: "target".to_string(),
        source: e,
    })?;
    let mut target_tx = target_client.transaction().map_err(|e| CompareError::Connection {
        label: "target".to_string(),
        source: e,
    })?;
    let cursor_a = BlockCursor::new(&mut target_tx, select_sql.clone(), ctx.block_size)?;

    let mut source_client = ctx.source.connect(NoTls).map_err(|e| CompareError::Connection {
        label: "source".to_string(),
        source: e,
    })?;
    let mut source_tx = source_client.transaction().map_err(|e| CompareError::Connection {
        label: "source".to_string(),
        source: e,
    })?;

    let table_exists_on_source = source_tx
        .query_opt(
            "SELECT 1 FROM information_schema.tables WHERE table_schema = $1 AND table_name = $2",
            &[
                &unquote_ident(&task.schema_name),
                &unquote_ident(&task.table_name),
            ],
        )
        .map_err(CompareError::Query)?
        .is_some();

    // If the source table is missing, synthesize an empty B-side cursor
    // presenting the target's own column list, so every target row is
    // A-only and surfaces as DELETED (the target has rows the source does
    // not, and the source is this tool's desired state).
    let cursor_b: Box<dyn RowSource + '_> = if table_exists_on_source {
        Box::new(BlockCursor::new(&mut source_tx, select_sql, ctx.block_size)?)
    } else {
        Box::new(BlockCursor::empty(cursor_a.column_names().to_vec()))
    };

    let differ = SortedMergeDiff::new(
        cursor_a,
        cursor_b,
        key_cols,
        content_cols,
        &task.schema_name,
        &task.table_name,
    )?;

    let mut emitted = 0usize;
    for outcome in differ {
        let outcome = outcome?;
        for event in translate(task, &columns, &key_cols_raw, outcome) {
            ctx.queue.send(event).map_err(|_| {
                CompareError::WorkerFailed(
                    format!("{}.{}", task.schema_name, task.table_name),
                    "queue closed".to_string(),
                )
            })?;
            emitted += 1;
        }
    }

    Ok(emitted)
}

fn identity(task: &TableTask) -> Identity {
    Identity {
        schema_name: Some(task.schema_name.clone()),
        table_name: Some(task.table_name.clone()),
        ..Default::default()
    }
}

fn translate(
    task: &TableTask,
    columns: &[ColumnSpec],
    key_cols: &[String],
    outcome: DiffOutcome,
) -> Vec<DiffEvent> {
    match outcome {
        DiffOutcome::Inserted(row) => vec![DiffEvent::new(
            Category::TablesData,
            DiffStatus::Inserted,
            identity(task),
            vec![],
            insert_sql(task, columns, &row),
        )],
        DiffOutcome::Deleted(row) => vec![DiffEvent::new(
            Category::TablesData,
            DiffStatus::Deleted,
            identity(task),
            vec![],
            delete_sql(task, columns, key_cols, &row),
        )],
        DiffOutcome::Updated { new, changed, .. } => vec![DiffEvent::new(
            Category::TablesData,
            DiffStatus::Updated,
            identity(task),
            changed.clone(),
            update_sql(task, columns, key_cols, &new, &changed),
        )],
        DiffOutcome::Equal(_) => vec![],
    }
}

/// `VALUE::type` for a non-null value; the bare token `NULL` for a null one
/// (SPEC_FULL.md §4.4: "NULL values bypass quoting").
fn literal(value: &CellValue, pg_type: &str) -> String {
    match value {
        CellValue::Null => "NULL".to_string(),
        other => format!("{}::{}", other.as_literal(), pg_type),
    }
}

fn column_value<'a>(row: &'a CatalogRow, raw_name: &str) -> &'a CellValue {
    row.get(raw_name).unwrap_or(&CellValue::Null)
}

fn insert_sql(task: &TableTask, columns: &[ColumnSpec], row: &CatalogRow) -> String {
    let col_list = columns
        .iter()
        .map(|c| c.name.clone())
        .collect::<Vec<_>>()
        .join(", ");
    let values = columns
        .iter()
        .map(|c| {
            let raw = unquote_ident(&c.name);
            literal(column_value(row, &raw), &c.pg_type)
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {}.{} ({col_list}) VALUES ({values});",
        task.schema_name, task.table_name
    )
}

fn update_sql(
    task: &TableTask,
    columns: &[ColumnSpec],
    key_cols: &[String],
    new: &CatalogRow,
    changed: &[String],
) -> String {
    let type_of = |raw: &str| -> &str {
        columns
            .iter()
            .find(|c| unquote_ident(&c.name) == raw)
            .map(|c| c.pg_type.as_str())
            .unwrap_or("text")
    };

    let set_clause = changed
        .iter()
        .map(|raw| {
            let quoted = quote_ident(raw);
            format!("{quoted} = {}", literal(column_value(new, raw), type_of(raw)))
        })
        .collect::<Vec<_>>()
        .join(", ");

    let where_clause = key_cols
        .iter()
        .map(|raw| {
            let quoted = quote_ident(raw);
            format!("{quoted} = {}", literal(column_value(new, raw), type_of(raw)))
        })
        .collect::<Vec<_>>()
        .join(" AND ");

    format!(
        "UPDATE {}.{} SET {set_clause} WHERE {where_clause};",
        task.schema_name, task.table_name
    )
}

fn delete_sql(task: &TableTask, columns: &[ColumnSpec], key_cols: &[String], row: &CatalogRow) -> String {
    let type_of = |raw: &str| -> &str {
        columns
            .iter()
            .find(|c| unquote_ident(&c.name) == raw)
            .map(|c| c.pg_type.as_str())
            .unwrap_or("text")
    };

    let where_clause = key_cols
        .iter()
        .map(|raw| {
            let quoted = quote_ident(raw);
            format!("{quoted} = {}", literal(column_value(row, raw), type_of(raw)))
        })
        .collect::<Vec<_>>()
        .join(" AND ");

    format!(
        "DELETE FROM {}.{} WHERE {where_clause};",
        task.schema_name, task.table_name
    )
}

/// Re-quote a raw (unescaped) identifier for use in generated DML.
fn quote_ident(raw: &str) -> String {
    format!("\"{}\"", raw.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> TableTask {
        TableTask {
            schema_name: "public".to_string(),
            table_name: "t".to_string(),
            table_key: "\"id\"".to_string(),
            columns_names_types: "\"id\"(integer),\"v\"(text)".to_string(),
        }
    }

    fn row(id: i64, v: Option<&str>) -> CatalogRow {
        CatalogRow::new(vec![
            ("id".to_string(), CellValue::Int(id)),
            (
                "v".to_string(),
                v.map(|s| CellValue::Text(s.to_string())).unwrap_or(CellValue::Null),
            ),
        ])
    }

    #[test]
    fn delete_matches_s3_scenario_shape() {
        let columns = row_data::parse_columns(&task().columns_names_types);
        let key_cols = vec!["id".to_string()];
        let sql = delete_sql(&task(), &columns, &key_cols, &row(2, Some("y")));
        assert_eq!(
            sql,
            "DELETE FROM public.t WHERE \"id\" = $data_comparer$2$data_comparer$::integer;"
        );
    }

    #[test]
    fn insert_lists_all_columns_in_order() {
        let columns = row_data::parse_columns(&task().columns_names_types);
        let sql = insert_sql(&task(), &columns, &row(1, Some("x")));
        assert_eq!(
            sql,
            "INSERT INTO public.t (\"id\", \"v\") VALUES ($data_comparer$1$data_comparer$::integer, $data_comparer$x$data_comparer$::text);"
        );
    }

    #[test]
    fn update_sets_only_changed_columns() {
        let columns = row_data::parse_columns(&task().columns_names_types);
        let key_cols = vec!["id".to_string()];
        let sql = update_sql(
            &task(),
            &columns,
            &key_cols,
            &row(1, Some("y")),
            &["v".to_string()],
        );
        assert_eq!(
            sql,
            "UPDATE public.t SET \"v\" = $data_comparer$y$data_comparer$::text WHERE \"id\" = $data_comparer$1$data_comparer$::integer;"
        );
    }

    #[test]
    fn null_value_bypasses_quoting_and_cast() {
        let columns = row_data::parse_columns(&task().columns_names_types);
        let sql = insert_sql(&task(), &columns, &row(1, None));
        assert!(sql.contains("VALUES ($data_comparer$1$data_comparer$::integer, NULL)"));
    }
}
