//! `tables_pks` / `tables_fks` / `tables_uniques` / `tables_checks` /
//! `tables_excludes`: all five are rows of `pg_constraint` filtered by
//! `contype`, each carrying `pg_get_constraintdef` as their sole content
//! field, so their UPDATE path is always DROP+CREATE (SPEC_FULL.md §4.3).
//!
//! Spelled `tables_excludes` consistently; the original's `tables_exludes`
//! validation-list typo (SPEC_FULL.md §9) has no counterpart anywhere here.

use super::CategoryDef;

const fn constraint_query(contype: &'static str) -> &'static str {
    match contype {
        "p" => PKS_SQL,
        "f" => FKS_SQL,
        "u" => UNIQUES_SQL,
        "c" => CHECKS_SQL,
        "x" => EXCLUDES_SQL,
        _ => unreachable!(),
    }
}

macro_rules! constraint_sql {
    ($contype:literal) => {
        concat!(
            r#"
        SELECT
            QUOTE_IDENT(n.nspname) AS schema_name,
            QUOTE_IDENT(c.relname) AS table_name,
            QUOTE_IDENT(con.conname) AS constraint_name,
            pg_catalog.pg_get_constraintdef(con.oid) AS constraint_def,
            (
                'ALTER TABLE ' || QUOTE_IDENT(n.nspname) || '.' || QUOTE_IDENT(c.relname) ||
                ' ADD CONSTRAINT ' || QUOTE_IDENT(con.conname) || ' ' ||
                pg_catalog.pg_get_constraintdef(con.oid) || ';'
            ) AS constraint_add_ddl,
            (
                'ALTER TABLE ' || QUOTE_IDENT(n.nspname) || '.' || QUOTE_IDENT(c.relname) ||
                ' DROP CONSTRAINT ' || QUOTE_IDENT(con.conname) || ';'
            ) AS constraint_drop_ddl
        FROM pg_catalog.pg_constraint con
        INNER JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
        INNER JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
        WHERE con.contype = '"#,
            $contype,
            r#"'
          AND n.nspname NOT IN ('information_schema', 'pg_catalog', 'pg_toast')
          AND n.nspname NOT LIKE 'pg%temp%'
        ORDER BY QUOTE_IDENT(n.nspname), QUOTE_IDENT(c.relname), QUOTE_IDENT(con.conname)
    "#
        )
    };
}

const PKS_SQL: &str = constraint_sql!("p");
const FKS_SQL: &str = constraint_sql!("f");
const UNIQUES_SQL: &str = constraint_sql!("u");
const CHECKS_SQL: &str = constraint_sql!("c");
const EXCLUDES_SQL: &str = constraint_sql!("x");

const CONSTRAINT_KEY_COLS: &[&str] = &["schema_name", "table_name", "constraint_name"];
const CONSTRAINT_CONTENT_COLS: &[&str] = &["constraint_def"];

pub const PKS_DEFINITION: CategoryDef = CategoryDef {
    sql: constraint_query("p"),
    key_cols: CONSTRAINT_KEY_COLS,
    content_cols: CONSTRAINT_CONTENT_COLS,
};
pub const FKS_DEFINITION: CategoryDef = CategoryDef {
    sql: constraint_query("f"),
    key_cols: CONSTRAINT_KEY_COLS,
    content_cols: CONSTRAINT_CONTENT_COLS,
};
pub const UNIQUES_DEFINITION: CategoryDef = CategoryDef {
    sql: constraint_query("u"),
    key_cols: CONSTRAINT_KEY_COLS,
    content_cols: CONSTRAINT_CONTENT_COLS,
};
pub const CHECKS_DEFINITION: CategoryDef = CategoryDef {
    sql: constraint_query("c"),
    key_cols: CONSTRAINT_KEY_COLS,
    content_cols: CONSTRAINT_CONTENT_COLS,
};
pub const EXCLUDES_DEFINITION: CategoryDef = CategoryDef {
    sql: constraint_query("x"),
    key_cols: CONSTRAINT_KEY_COLS,
    content_cols: CONSTRAINT_CONTENT_COLS,
};
