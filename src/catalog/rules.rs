//! `tables_rules` category: `pg_rewrite` rules, whose only content field is
//! their full definition text, so UPDATED always emits DROP then CREATE.

use super::CategoryDef;

pub const DEFINITION: CategoryDef = CategoryDef {
    sql: r#"
        SELECT
            QUOTE_IDENT(n.nspname) AS schema_name,
            QUOTE_IDENT(c.relname) AS table_name,
            QUOTE_IDENT(r.rulename) AS rule_name,
            pg_catalog.pg_get_ruledef(r.oid) AS rule_def,
            pg_catalog.pg_get_ruledef(r.oid) || ';' AS rule_add_ddl,
            (
                'DROP RULE ' || QUOTE_IDENT(r.rulename) || ' ON ' ||
                QUOTE_IDENT(n.nspname) || '.' || QUOTE_IDENT(c.relname) || ';'
            ) AS rule_drop_ddl
        FROM pg_catalog.pg_rewrite r
        INNER JOIN pg_catalog.pg_class c ON c.oid = r.ev_class
        INNER JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
        WHERE r.rulename <> '_RETURN'
          AND n.nspname NOT IN ('information_schema', 'pg_catalog', 'pg_toast')
          AND n.nspname NOT LIKE 'pg%temp%'
        ORDER BY QUOTE_IDENT(n.nspname), QUOTE_IDENT(c.relname), QUOTE_IDENT(r.rulename)
    "#,
    key_cols: &["schema_name", "table_name", "rule_name"],
    content_cols: &["rule_def"],
};
