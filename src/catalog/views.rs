//! `views` and `mviews` categories.
//!
//! Both have a single content field (their definition text). A view UPDATE
//! emits `CREATE OR REPLACE VIEW`; a materialized view cannot be replaced in
//! place, so its UPDATE emits DROP then CREATE, reading both DDL strings off
//! the *current* row pair (SPEC_FULL.md §9 — the original reads the mview
//! UPDATE branch's DDL off an unrelated row variable; this implementation's
//! `DiffOutcome::Updated { new, .. }` makes that bug structurally
//! impossible, since there is no other row in scope to read from by
//! mistake).

use super::CategoryDef;

pub const VIEWS_DEFINITION: CategoryDef = CategoryDef {
    sql: r#"
        SELECT
            QUOTE_IDENT(n.nspname) AS schema_name,
            QUOTE_IDENT(c.relname) AS view_name,
            pg_catalog.pg_get_viewdef(c.oid) AS view_def,
            (
                'CREATE OR REPLACE VIEW ' || QUOTE_IDENT(n.nspname) || '.' || QUOTE_IDENT(c.relname) ||
                ' AS ' || pg_catalog.pg_get_viewdef(c.oid)
            ) AS view_add_ddl,
            'DROP VIEW ' || QUOTE_IDENT(n.nspname) || '.' || QUOTE_IDENT(c.relname) || ';' AS view_drop_ddl
        FROM pg_catalog.pg_class c
        INNER JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
        WHERE c.relkind = 'v'
          AND n.nspname NOT IN ('information_schema', 'pg_catalog', 'pg_toast')
          AND n.nspname NOT LIKE 'pg%temp%'
        ORDER BY QUOTE_IDENT(n.nspname), QUOTE_IDENT(c.relname)
    "#,
    key_cols: &["schema_name", "view_name"],
    content_cols: &["view_def"],
};

pub const MVIEWS_DEFINITION: CategoryDef = CategoryDef {
    sql: r#"
        SELECT
            QUOTE_IDENT(n.nspname) AS schema_name,
            QUOTE_IDENT(c.relname) AS mview_name,
            pg_catalog.pg_get_viewdef(c.oid) AS mview_def,
            (
                'CREATE MATERIALIZED VIEW ' || QUOTE_IDENT(n.nspname) || '.' || QUOTE_IDENT(c.relname) ||
                ' AS ' || pg_catalog.pg_get_viewdef(c.oid)
            ) AS create_mview_ddl,
            'DROP MATERIALIZED VIEW ' || QUOTE_IDENT(n.nspname) || '.' || QUOTE_IDENT(c.relname) || ';' AS drop_mview_ddl
        FROM pg_catalog.pg_class c
        INNER JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
        WHERE c.relkind = 'm'
          AND n.nspname NOT IN ('information_schema', 'pg_catalog', 'pg_toast')
          AND n.nspname NOT LIKE 'pg%temp%'
        ORDER BY QUOTE_IDENT(n.nspname), QUOTE_IDENT(c.relname)
    "#,
    key_cols: &["schema_name", "mview_name"],
    content_cols: &["mview_def"],
};
