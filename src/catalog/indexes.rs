//! `indexes` category: `pg_get_indexdef`, except an index that backs a
//! constraint (its `pg_depend` refers to `pg_constraint`) is excluded here —
//! it surfaces instead as the owning constraint's category, since dropping
//! and recreating the constraint implicitly manages the index.

use super::CategoryDef;

pub const DEFINITION: CategoryDef = CategoryDef {
    sql: r#"
        SELECT
            QUOTE_IDENT(n.nspname) AS schema_name,
            QUOTE_IDENT(c.relname) AS table_name,
            QUOTE_IDENT(i.relname) AS index_name,
            pg_catalog.pg_get_indexdef(ix.indexrelid) AS index_def,
            pg_catalog.pg_get_indexdef(ix.indexrelid) || ';' AS index_add_ddl,
            'DROP INDEX ' || QUOTE_IDENT(n.nspname) || '.' || QUOTE_IDENT(i.relname) || ';' AS index_drop_ddl
        FROM pg_catalog.pg_index ix
        INNER JOIN pg_catalog.pg_class i ON i.oid = ix.indexrelid
        INNER JOIN pg_catalog.pg_class c ON c.oid = ix.indrelid
        INNER JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
        WHERE n.nspname NOT IN ('information_schema', 'pg_catalog', 'pg_toast')
          AND n.nspname NOT LIKE 'pg%temp%'
          AND NOT EXISTS (
              SELECT 1
              FROM pg_catalog.pg_depend d
              WHERE d.objid = ix.indexrelid
                AND d.classid = 'pg_catalog.pg_class'::regclass
                AND d.refclassid = 'pg_catalog.pg_constraint'::regclass
          )
        ORDER BY QUOTE_IDENT(n.nspname), QUOTE_IDENT(c.relname), QUOTE_IDENT(i.relname)
    "#,
    key_cols: &["schema_name", "table_name", "index_name"],
    content_cols: &["index_def"],
};
