//! `functions`, `trigger_functions`, and `procedures` categories: all three
//! are rows of `pg_proc` filtered by `prokind` and return type, diffed on
//! `pg_get_functiondef`-style text. Diff key is `(schema_name, function_id)`
//! where `function_id` is the routine's argument-typed signature, matching
//! SPEC_FULL.md §4.1 ("diff key is schema_name, function_id").

use super::CategoryDef;

macro_rules! routine_sql {
    ($prokind_filter:literal) => {
        concat!(
            r#"
        SELECT
            QUOTE_IDENT(n.nspname) AS schema_name,
            QUOTE_IDENT(p.proname) || '(' || pg_catalog.pg_get_function_identity_arguments(p.oid) || ')' AS function_id,
            pg_catalog.pg_get_functiondef(p.oid) AS routine_def,
            pg_catalog.pg_get_functiondef(p.oid) AS routine_add_ddl,
            (
                'DROP ROUTINE ' || QUOTE_IDENT(n.nspname) || '.' || QUOTE_IDENT(p.proname) ||
                '(' || pg_catalog.pg_get_function_identity_arguments(p.oid) || ');'
            ) AS routine_drop_ddl
        FROM pg_catalog.pg_proc p
        INNER JOIN pg_catalog.pg_namespace n ON n.oid = p.pronamespace
        WHERE "#,
            $prokind_filter,
            r#"
          AND n.nspname NOT IN ('information_schema', 'pg_catalog', 'pg_toast')
          AND n.nspname NOT LIKE 'pg%temp%'
        ORDER BY QUOTE_IDENT(n.nspname), function_id
    "#
        )
    };
}

const ROUTINE_KEY_COLS: &[&str] = &["schema_name", "function_id"];
const ROUTINE_CONTENT_COLS: &[&str] = &["routine_def"];

pub const FUNCTIONS_DEFINITION: CategoryDef = CategoryDef {
    sql: routine_sql!("p.prokind = 'f' AND p.oid NOT IN (SELECT tgfoid FROM pg_catalog.pg_trigger)"),
    key_cols: ROUTINE_KEY_COLS,
    content_cols: ROUTINE_CONTENT_COLS,
};

pub const TRIGGER_FUNCTIONS_DEFINITION: CategoryDef = CategoryDef {
    sql: routine_sql!("p.prokind = 'f' AND p.oid IN (SELECT tgfoid FROM pg_catalog.pg_trigger)"),
    key_cols: ROUTINE_KEY_COLS,
    content_cols: ROUTINE_CONTENT_COLS,
};

pub const PROCEDURES_DEFINITION: CategoryDef = CategoryDef {
    sql: routine_sql!("p.prokind = 'p'"),
    key_cols: ROUTINE_KEY_COLS,
    content_cols: ROUTINE_CONTENT_COLS,
};
