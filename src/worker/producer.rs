//! Producer Workers (C3): one per structural category. Each owns its own
//! source/target connections, runs the catalog query for its category on
//! both, drives the sorted-merge differ, and translates transitions into
//! [`DiffEvent`]s pushed onto the shared queue.

use crate::catalog::{self, columns, sequences, triggers};
use crate::cursor::BlockCursor;
use crate::differ::{DiffOutcome, SortedMergeDiff};
use crate::error::{CompareError, Result};
use crate::model::{Category, CatalogRow, CellValue, DiffEvent, DiffStatus, Identity};
use crate::queue::Liveness;
use crossbeam::channel::Sender;
use postgres::{Config, NoTls};
use tracing::{debug, error, info, instrument};

/// Everything a producer needs that isn't specific to its category.
pub struct ProducerContext {
    pub source: Config,
    pub target: Config,
    pub block_size: i64,
    pub queue: Sender<DiffEvent>,
    pub liveness: Liveness,
    pub index: usize,
}

/// Run one structural category's producer to completion. Pushes diff
/// events onto the queue as they're produced and clears this producer's
/// liveness cell on every exit path, per SPEC_FULL.md §4.3.
#[instrument(skip(ctx), fields(category = %category))]
pub fn run_structural_producer(category: Category, ctx: ProducerContext) -> Result<()> {
    let result = run_structural_producer_inner(category, &ctx);
    ctx.liveness.mark_done(ctx.index);
    match &result {
        Ok(count) => info!(events = count, "producer finished"),
        Err(e) => error!(error = %e, "producer failed"),
    }
    result.map(|_| ())
}

fn run_structural_producer_inner(category: Category, ctx: &ProducerContext) -> Result<usize> {
    let def = catalog::definition_for(category);

    let mut source_client = ctx
        .source
        .connect(NoTls)
        .map_err(|e| CompareError::Connection {
            label: "source".to_string(),
            source: e,
        })?;
    let mut target_client = ctx
        .target
        .connect(NoTls)
        .map_err(|e| CompareError::Connection {
            label: "target".to_string(),
            source: e,
        })?;

    let mut source_tx = source_client
        .transaction()
        .map_err(|e| CompareError::Connection {
            label: "source".to_string(),
            source: e,
        })?;
    let mut target_tx = target_client
        .transaction()
        .map_err(|e| CompareError::Connection {
            label: "target".to_string(),
            source: e,
        })?;

    // A-side is the target (DELETED/drop when absent from the source),
    // B-side is the source (INSERTED/add when absent from the target), so
    // an `Updated{new, ..}` pair carries the source's desired state.
    let cursor_a = BlockCursor::new(&mut target_tx, def.sql, ctx.block_size)?;
    let cursor_b = BlockCursor::new(&mut source_tx, def.sql, ctx.block_size)?;

    let differ = SortedMergeDiff::new(
        cursor_a,
        cursor_b,
        def.key_cols.to_vec(),
        def.content_cols.to_vec(),
        "catalog",
        category.name(),
    )?;

    let mut emitted = 0usize;
    for outcome in differ {
        let outcome = outcome?;
        debug!(?outcome, "diff outcome");
        for event in translate(category, outcome) {
            ctx.queue
                .send(event)
                .map_err(|_| CompareError::WorkerFailed(category.to_string(), "queue closed".into()))?;
            emitted += 1;
        }
    }

    // Transactions are dropped here without commit, matching the
    // "closed without commit" discipline of SPEC_FULL.md §5.
    Ok(emitted)
}

fn text(row: &CatalogRow, col: &str) -> String {
    row.get(col).map(CellValue::as_key_string).unwrap_or_default()
}

fn opt_text(row: &CatalogRow, col: &str) -> Option<String> {
    match row.get(col) {
        None | Some(CellValue::Null) => None,
        Some(v) => Some(v.as_key_string()),
    }
}

/// Translate one sorted-merge outcome into zero, one, or several diff
/// events, applying the per-category UPDATED expansion policy of
/// SPEC_FULL.md §4.3.
fn translate(category: Category, outcome: DiffOutcome) -> Vec<DiffEvent> {
    match category {
        Category::Schemas => translate_ddl_only(
            category,
            outcome,
            "schema_add_ddl",
            "schema_drop_ddl",
            |row| Identity {
                schema_name: Some(text(row, "schema_name")),
                ..Default::default()
            },
        ),
        Category::Tables => translate_ddl_only(category, outcome, "table_add_ddl", "table_drop_ddl", |row| {
            Identity {
                schema_name: Some(text(row, "schema_name")),
                table_name: Some(text(row, "table_name")),
                ..Default::default()
            }
        }),
        Category::TablesColumns => translate_columns(outcome),
        Category::TablesPks
        | Category::TablesFks
        | Category::TablesUniques
        | Category::TablesChecks
        | Category::TablesExcludes => translate_ddl_only(
            category,
            outcome,
            "constraint_add_ddl",
            "constraint_drop_ddl",
            |row| Identity {
                schema_name: Some(text(row, "schema_name")),
                table_name: Some(text(row, "table_name")),
                constraint_name: Some(text(row, "constraint_name")),
                ..Default::default()
            },
        ),
        Category::TablesRules => {
            translate_ddl_only(category, outcome, "rule_add_ddl", "rule_drop_ddl", |row| Identity {
                schema_name: Some(text(row, "schema_name")),
                table_name: Some(text(row, "table_name")),
                ..Default::default()
            })
        }
        Category::TablesTriggers => translate_triggers(outcome),
        Category::Indexes => {
            translate_ddl_only(category, outcome, "index_add_ddl", "index_drop_ddl", |row| Identity {
                schema_name: Some(text(row, "schema_name")),
                table_name: Some(text(row, "table_name")),
                index_name: Some(text(row, "index_name")),
                ..Default::default()
            })
        }
        Category::Sequences => translate_sequences(outcome),
        Category::Views => {
            translate_ddl_only(category, outcome, "view_add_ddl", "view_drop_ddl", |row| Identity {
                schema_name: Some(text(row, "schema_name")),
                view_name: Some(text(row, "view_name")),
                ..Default::default()
            })
        }
        Category::Mviews => translate_ddl_only(
            category,
            outcome,
            "create_mview_ddl",
            "drop_mview_ddl",
            |row| Identity {
                schema_name: Some(text(row, "schema_name")),
                mview_name: Some(text(row, "mview_name")),
                ..Default::default()
            },
        ),
        Category::Functions | Category::TriggerFunctions | Category::Procedures => translate_ddl_only(
            category,
            outcome,
            "routine_add_ddl",
            "routine_drop_ddl",
            |row| Identity {
                schema_name: Some(text(row, "schema_name")),
                function_id: Some(text(row, "function_id")),
                ..Default::default()
            },
        ),
        Category::TablesData => unreachable!("tables_data is translated by worker::row_data"),
    }
}

/// Shared shape for every category whose only content field is a full DDL
/// text: INSERTED -> add_ddl, DELETED -> drop_ddl, UPDATED -> drop_ddl then
/// add_ddl (read from the *current* row pair, never a stale one — this is
/// what structurally prevents the mview bug described in SPEC_FULL.md §9).
fn translate_ddl_only(
    category: Category,
    outcome: DiffOutcome,
    add_col: &str,
    drop_col: &str,
    identity_of: impl Fn(&CatalogRow) -> Identity,
) -> Vec<DiffEvent> {
    match outcome {
        DiffOutcome::Inserted(row) => vec![DiffEvent::new(
            category,
            DiffStatus::Inserted,
            identity_of(&row),
            vec![],
            text(&row, add_col),
        )],
        DiffOutcome::Deleted(row) => vec![DiffEvent::new(
            category,
            DiffStatus::Deleted,
            identity_of(&row),
            vec![],
            text(&row, drop_col),
        )],
        DiffOutcome::Updated { new, changed, .. } => {
            let identity = identity_of(&new);
            let drop_ddl = text(&new, drop_col);
            let add_ddl = text(&new, add_col);
            vec![DiffEvent::new(
                category,
                DiffStatus::Updated,
                identity,
                changed,
                format!("{drop_ddl}\n{add_ddl}"),
            )]
        }
        DiffOutcome::Equal(_) => vec![],
    }
}

fn translate_columns(outcome: DiffOutcome) -> Vec<DiffEvent> {
    match outcome {
        DiffOutcome::Inserted(row) => vec![DiffEvent::new(
            Category::TablesColumns,
            DiffStatus::Inserted,
            column_identity(&row),
            vec![],
            text(&row, "column_add_ddl"),
        )],
        DiffOutcome::Deleted(row) => vec![DiffEvent::new(
            Category::TablesColumns,
            DiffStatus::Deleted,
            column_identity(&row),
            vec![],
            text(&row, "column_drop_ddl"),
        )],
        DiffOutcome::Updated { new, changed, .. } => changed
            .iter()
            .map(|field| {
                let sql = columns::alter_for_field(
                    &text(&new, "schema_name"),
                    &text(&new, "table_name"),
                    &text(&new, "column_name"),
                    field,
                    &text(&new, "data_type"),
                    &text(&new, "is_nullable"),
                    opt_text(&new, "column_default").as_deref(),
                );
                DiffEvent::new(
                    Category::TablesColumns,
                    DiffStatus::Updated,
                    column_identity(&new),
                    vec![field.clone()],
                    sql,
                )
            })
            .collect(),
        DiffOutcome::Equal(_) => vec![],
    }
}

fn column_identity(row: &CatalogRow) -> Identity {
    Identity {
        schema_name: Some(text(row, "schema_name")),
        table_name: Some(text(row, "table_name")),
        column_name: Some(text(row, "column_name")),
        ..Default::default()
    }
}

fn translate_sequences(outcome: DiffOutcome) -> Vec<DiffEvent> {
    match outcome {
        DiffOutcome::Inserted(row) => vec![DiffEvent::new(
            Category::Sequences,
            DiffStatus::Inserted,
            sequence_identity(&row),
            vec![],
            text(&row, "sequence_add_ddl"),
        )],
        DiffOutcome::Deleted(row) => vec![DiffEvent::new(
            Category::Sequences,
            DiffStatus::Deleted,
            sequence_identity(&row),
            vec![],
            text(&row, "sequence_drop_ddl"),
        )],
        DiffOutcome::Updated { new, changed, .. } => changed
            .iter()
            .map(|field| {
                let sql = sequences::alter_for_field(
                    &text(&new, "schema_name"),
                    &text(&new, "sequence_name"),
                    field,
                    &text(&new, field),
                );
                DiffEvent::new(
                    Category::Sequences,
                    DiffStatus::Updated,
                    sequence_identity(&new),
                    vec![field.clone()],
                    sql,
                )
            })
            .collect(),
        DiffOutcome::Equal(_) => vec![],
    }
}

fn sequence_identity(row: &CatalogRow) -> Identity {
    Identity {
        schema_name: Some(text(row, "schema_name")),
        sequence_name: Some(text(row, "sequence_name")),
        ..Default::default()
    }
}

fn translate_triggers(outcome: DiffOutcome) -> Vec<DiffEvent> {
    match outcome {
        DiffOutcome::Inserted(row) => vec![DiffEvent::new(
            Category::TablesTriggers,
            DiffStatus::Inserted,
            trigger_identity(&row),
            vec![],
            text(&row, "trigger_add_ddl"),
        )],
        DiffOutcome::Deleted(row) => vec![DiffEvent::new(
            Category::TablesTriggers,
            DiffStatus::Deleted,
            trigger_identity(&row),
            vec![],
            text(&row, "trigger_drop_ddl"),
        )],
        DiffOutcome::Updated { new, changed, .. } => {
            let new_enabled = text(&new, "tgenabled").chars().next().unwrap_or('O');
            let stmts = triggers::alter_for_update(
                &text(&new, "schema_name"),
                &text(&new, "table_name"),
                &text(&new, "trigger_name"),
                &changed,
                new_enabled,
                &text(&new, "trigger_drop_ddl"),
                &text(&new, "trigger_add_ddl"),
            );
            vec![DiffEvent::new(
                Category::TablesTriggers,
                DiffStatus::Updated,
                trigger_identity(&new),
                changed,
                stmts.join("\n"),
            )]
        }
        DiffOutcome::Equal(_) => vec![],
    }
}

fn trigger_identity(row: &CatalogRow) -> Identity {
    Identity {
        schema_name: Some(text(row, "schema_name")),
        table_name: Some(text(row, "table_name")),
        trigger_name: Some(text(row, "trigger_name")),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CatalogRow, CellValue};

    fn mview_row(schema: &str, name: &str) -> CatalogRow {
        CatalogRow::new(vec![
            ("schema_name".into(), CellValue::Text(schema.into())),
            ("mview_name".into(), CellValue::Text(name.into())),
            ("mview_def".into(), CellValue::Text("SELECT 1".into())),
            (
                "create_mview_ddl".into(),
                CellValue::Text(format!("CREATE MATERIALIZED VIEW {schema}.{name} AS SELECT 1;")),
            ),
            (
                "drop_mview_ddl".into(),
                CellValue::Text(format!("DROP MATERIALIZED VIEW {schema}.{name};")),
            ),
        ])
    }

    #[test]
    fn mview_update_reads_ddl_from_the_current_row_pair() {
        let old = mview_row("public", "mv1");
        let new = mview_row("public", "mv1");
        let events = translate(
            Category::Mviews,
            DiffOutcome::Updated {
                old,
                new: new.clone(),
                changed: vec!["mview_def".to_string()],
            },
        );
        assert_eq!(events.len(), 1);
        assert!(events[0].sql.starts_with("DROP MATERIALIZED VIEW public.mv1;"));
        assert!(events[0].sql.contains("CREATE MATERIALIZED VIEW public.mv1"));
    }

    #[test]
    fn trigger_update_with_only_enable_flag_changed_emits_single_statement() {
        let row = CatalogRow::new(vec![
            ("schema_name".into(), CellValue::Text("public".into())),
            ("table_name".into(), CellValue::Text("t".into())),
            ("trigger_name".into(), CellValue::Text("trg".into())),
            ("tgenabled".into(), CellValue::Text("O".into())),
            ("trigger_drop_ddl".into(), CellValue::Text("DROP TRIGGER trg ON public.t;".into())),
            ("trigger_add_ddl".into(), CellValue::Text("CREATE TRIGGER trg ...;".into())),
        ]);
        let events = translate(
            Category::TablesTriggers,
            DiffOutcome::Updated {
                old: row.clone(),
                new: row,
                changed: vec!["tgenabled".to_string()],
            },
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].sql, "ALTER TABLE public.t ENABLE TRIGGER trg;");
    }

    #[test]
    fn sequence_update_emits_one_event_per_changed_field() {
        let row = CatalogRow::new(vec![
            ("schema_name".into(), CellValue::Text("s1".into())),
            ("sequence_name".into(), CellValue::Text("seq".into())),
            ("increment".into(), CellValue::Text("2".into())),
            ("cycle_option".into(), CellValue::Text("YES".into())),
        ]);
        let events = translate(
            Category::Sequences,
            DiffOutcome::Updated {
                old: row.clone(),
                new: row,
                changed: vec!["increment".to_string(), "cycle_option".to_string()],
            },
        );
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sql, "ALTER SEQUENCE s1.seq INCREMENT BY 2;");
        assert_eq!(events[1].sql, "ALTER SEQUENCE s1.seq CYCLE;");
    }
}
