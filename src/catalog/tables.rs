//! `tables` category: table existence/ownership/storage-option diff.
//!
//! Column-level, constraint-level, index-level and trigger-level content are
//! each their own category (`tables_columns`, `tables_pks`, …); this query
//! only carries the table's own shell DDL (kind, persistence, owner,
//! partitioning) so its content columns stay narrow and its `CREATE TABLE`
//! never needs to be reconciled against every other category's DDL.

use super::CategoryDef;

pub const DEFINITION: CategoryDef = CategoryDef {
    sql: r#"
        SELECT
            QUOTE_IDENT(n.nspname) AS schema_name,
            QUOTE_IDENT(c.relname) AS table_name,
            c.relkind AS relkind,
            c.relpersistence AS relpersistence,
            pg_catalog.pg_get_userbyid(c.relowner) AS owner,
            (
                'CREATE ' ||
                CASE c.relpersistence WHEN 'u' THEN 'UNLOGGED ' WHEN 't' THEN 'TEMPORARY ' ELSE '' END ||
                CASE c.relkind WHEN 'p' THEN 'TABLE ' WHEN 'f' THEN 'FOREIGN TABLE ' ELSE 'TABLE ' END ||
                QUOTE_IDENT(n.nspname) || '.' || QUOTE_IDENT(c.relname) || ' ();' ||
                E'\nALTER TABLE ' || QUOTE_IDENT(n.nspname) || '.' || QUOTE_IDENT(c.relname) ||
                ' OWNER TO ' || QUOTE_IDENT(pg_catalog.pg_get_userbyid(c.relowner)) || ';'
            ) AS table_add_ddl,
            'DROP TABLE ' || QUOTE_IDENT(n.nspname) || '.' || QUOTE_IDENT(c.relname) || ' CASCADE;' AS table_drop_ddl
        FROM pg_catalog.pg_class c
        INNER JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
        WHERE c.relkind IN ('r', 'p', 'f')
          AND n.nspname NOT IN ('information_schema', 'pg_catalog', 'pg_toast')
          AND n.nspname NOT LIKE 'pg%temp%'
        ORDER BY QUOTE_IDENT(n.nspname), QUOTE_IDENT(c.relname)
    "#,
    key_cols: &["schema_name", "table_name"],
    content_cols: &["relkind", "relpersistence", "owner"],
};
