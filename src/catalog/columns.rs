//! `tables_columns` category: one row per column, with independently
//! alterable content fields (data_type, is_nullable, column_default) so its
//! producer emits one UPDATED event per differing field rather than a
//! single DROP+CREATE (SPEC_FULL.md §4.3).

use super::CategoryDef;

pub const DEFINITION: CategoryDef = CategoryDef {
    sql: r#"
        SELECT
            QUOTE_IDENT(c.table_schema) AS schema_name,
            QUOTE_IDENT(c.table_name) AS table_name,
            QUOTE_IDENT(c.column_name) AS column_name,
            c.ordinal_position AS ordinal_position,
            FORMAT(
                '%s%s',
                c.data_type,
                (CASE WHEN c.character_maximum_length IS NOT NULL
                      THEN FORMAT('(%s)', c.character_maximum_length)
                      WHEN c.numeric_precision IS NOT NULL AND NULLIF(c.numeric_scale, 0) IS NOT NULL
                      THEN FORMAT('(%s, %s)', c.numeric_precision, c.numeric_scale)
                      ELSE '' END)
            ) AS data_type,
            c.is_nullable AS is_nullable,
            c.column_default AS column_default,
            c.collation_name AS collation_name,
            (
                'ALTER TABLE ' || QUOTE_IDENT(c.table_schema) || '.' || QUOTE_IDENT(c.table_name) ||
                ' ADD COLUMN ' || QUOTE_IDENT(c.column_name) || ' ' || c.data_type ||
                CASE WHEN c.collation_name IS NOT NULL THEN ' COLLATE ' || QUOTE_IDENT(c.collation_name) ELSE '' END ||
                CASE WHEN c.is_nullable = 'NO' THEN ' NOT NULL' ELSE '' END ||
                CASE WHEN c.column_default IS NOT NULL THEN ' DEFAULT ' || c.column_default ELSE '' END || ';'
            ) AS column_add_ddl,
            (
                'ALTER TABLE ' || QUOTE_IDENT(c.table_schema) || '.' || QUOTE_IDENT(c.table_name) ||
                ' DROP COLUMN ' || QUOTE_IDENT(c.column_name) || ';'
            ) AS column_drop_ddl
        FROM information_schema.columns c
        WHERE c.table_schema NOT IN ('information_schema', 'pg_catalog', 'pg_toast')
          AND c.table_schema NOT LIKE 'pg%temp%'
        ORDER BY QUOTE_IDENT(c.table_schema), QUOTE_IDENT(c.table_name), c.ordinal_position
    "#,
    key_cols: &["schema_name", "table_name", "column_name"],
    content_cols: &["data_type", "is_nullable", "column_default"],
};

/// Build the narrowest `ALTER COLUMN` statement for one differing content
/// field, per SPEC_FULL.md §4.1's `tables_columns` UPDATE path.
pub fn alter_for_field(
    schema: &str,
    table: &str,
    column: &str,
    field: &str,
    new_data_type: &str,
    new_is_nullable: &str,
    new_default: Option<&str>,
) -> String {
    let qualified = format!("ALTER TABLE {schema}.{table} ALTER COLUMN {column}");
    match field {
        "data_type" => format!("{qualified} TYPE {new_data_type};"),
        "is_nullable" => {
            if new_is_nullable == "NO" {
                format!("{qualified} SET NOT NULL;")
            } else {
                format!("{qualified} DROP NOT NULL;")
            }
        }
        "column_default" => match new_default {
            Some(d) => format!("{qualified} SET DEFAULT {d};"),
            None => format!("{qualified} DROP DEFAULT;"),
        },
        other => unreachable!("tables_columns has no content field named {other}"),
    }
}
