//! Report Sink (C4.6 in SPEC_FULL.md §4.6): idempotent schema bootstrap for
//! `database_comparer_report`, plus the translation of one [`DiffEvent`]
//! into one `output_report_fnc_add(...)` call string.
//!
//! The schema bootstrap runs once, synchronously, in the master before any
//! worker thread starts; it is not itself parallelized.

use crate::error::{CompareError, Result};
use crate::model::DiffEvent;
use postgres::Client;

/// Idempotent bootstrap executed once against the report database before any
/// producer or consumer is spawned. Creates the schema, table and function if
/// they don't already exist, then truncates the table so each run starts
/// from an empty report.
pub const BOOTSTRAP_SQL: &str = r#"
CREATE SCHEMA IF NOT EXISTS database_comparer_report;

CREATE TABLE IF NOT EXISTS database_comparer_report.output_report (
    id BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    category TEXT NOT NULL,
    schema_name TEXT,
    table_name TEXT,
    column_name TEXT,
    constraint_name TEXT,
    trigger_name TEXT,
    index_name TEXT,
    sequence_name TEXT,
    view_name TEXT,
    mview_name TEXT,
    function_id TEXT,
    status TEXT NOT NULL,
    sql TEXT NOT NULL
);

CREATE OR REPLACE FUNCTION database_comparer_report.output_report_fnc_add(
    p_category TEXT,
    p_schema_name TEXT DEFAULT NULL,
    p_table_name TEXT DEFAULT NULL,
    p_column_name TEXT DEFAULT NULL,
    p_constraint_name TEXT DEFAULT NULL,
    p_trigger_name TEXT DEFAULT NULL,
    p_index_name TEXT DEFAULT NULL,
    p_sequence_name TEXT DEFAULT NULL,
    p_view_name TEXT DEFAULT NULL,
    p_mview_name TEXT DEFAULT NULL,
    p_function_id TEXT DEFAULT NULL,
    p_status TEXT DEFAULT NULL,
    p_sql TEXT DEFAULT NULL
) RETURNS BIGINT AS $output_report_fnc_add$
DECLARE
    v_id BIGINT;
BEGIN
    INSERT INTO database_comparer_report.output_report
        (category, schema_name, table_name, column_name, constraint_name,
         trigger_name, index_name, sequence_name, view_name, mview_name,
         function_id, status, sql)
    VALUES
        (p_category, p_schema_name, p_table_name, p_column_name, p_constraint_name,
         p_trigger_name, p_index_name, p_sequence_name, p_view_name, p_mview_name,
         p_function_id, p_status, p_sql)
    RETURNING id INTO v_id;
    RETURN v_id;
END;
$output_report_fnc_add$ LANGUAGE plpgsql;

TRUNCATE database_comparer_report.output_report;
"#;

/// Run the bootstrap against an already-open connection to the report
/// database. Idempotent: safe to run on every invocation.
pub fn bootstrap(client: &mut Client) -> Result<()> {
    client
        .batch_execute(BOOTSTRAP_SQL)
        .map_err(|e| CompareError::ReportSinkFailure(e.to_string()))
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn opt_literal(value: Option<&str>) -> String {
    match value {
        Some(v) => quote_literal(v),
        None => "NULL".to_string(),
    }
}

/// Dollar-quoted so the remediation SQL's own quotes and semicolons never
/// need escaping and never terminate the call early when batched.
fn dollar_quote(s: &str) -> String {
    format!("$report_sql${s}$report_sql$")
}

/// Render one diff event as a single `SELECT output_report_fnc_add(...)`
/// call, passing only the identity columns that apply to the event's
/// category (the rest default to `NULL`), per SPEC_FULL.md §4.5 step 2.
pub fn render_call(event: &DiffEvent) -> String {
    format!(
        "SELECT database_comparer_report.output_report_fnc_add(\
            p_category => {category}, \
            p_schema_name => {schema}, \
            p_table_name => {table}, \
            p_column_name => {column}, \
            p_constraint_name => {constraint}, \
            p_trigger_name => {trigger}, \
            p_index_name => {index}, \
            p_sequence_name => {sequence}, \
            p_view_name => {view}, \
            p_mview_name => {mview}, \
            p_function_id => {function}, \
            p_status => {status}, \
            p_sql => {sql})",
        category = quote_literal(event.category.name()),
        schema = opt_literal(event.identity.schema_name.as_deref()),
        table = opt_literal(event.identity.table_name.as_deref()),
        column = opt_literal(event.identity.column_name.as_deref()),
        constraint = opt_literal(event.identity.constraint_name.as_deref()),
        trigger = opt_literal(event.identity.trigger_name.as_deref()),
        index = opt_literal(event.identity.index_name.as_deref()),
        sequence = opt_literal(event.identity.sequence_name.as_deref()),
        view = opt_literal(event.identity.view_name.as_deref()),
        mview = opt_literal(event.identity.mview_name.as_deref()),
        function = opt_literal(event.identity.function_id.as_deref()),
        status = quote_literal(event.status.as_str()),
        sql = dollar_quote(&event.sql),
    )
}

/// Join a batch of rendered calls into the single semicolon-joined script a
/// consumer executes per flush, per SPEC_FULL.md §4.5 step 3.
pub fn render_batch(calls: &[String]) -> String {
    calls.join(";\n")
}
