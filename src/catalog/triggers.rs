//! `tables_triggers` category: `pg_get_triggerdef`, with a content model
//! split into an enable/disable flag and the trigger's definition text.
//!
//! The UPDATE path distinguishes the two: an enable/disable-only change
//! emits a single `ALTER TABLE … ENABLE|DISABLE TRIGGER`; any change to the
//! definition itself emits DROP *then* CREATE, in that order (SPEC_FULL.md
//! §9 — the original orders these the wrong way round for a definition
//! change; this implementation does not reproduce that).

use super::CategoryDef;

pub const DEFINITION: CategoryDef = CategoryDef {
    sql: r#"
        SELECT
            QUOTE_IDENT(n.nspname) AS schema_name,
            QUOTE_IDENT(c.relname) AS table_name,
            QUOTE_IDENT(t.tgname) AS trigger_name,
            t.tgenabled AS tgenabled,
            pg_catalog.pg_get_triggerdef(t.oid) AS trigger_def,
            pg_catalog.pg_get_triggerdef(t.oid) || ';' AS trigger_add_ddl,
            (
                'DROP TRIGGER ' || QUOTE_IDENT(t.tgname) || ' ON ' ||
                QUOTE_IDENT(n.nspname) || '.' || QUOTE_IDENT(c.relname) || ';'
            ) AS trigger_drop_ddl
        FROM pg_catalog.pg_trigger t
        INNER JOIN pg_catalog.pg_class c ON c.oid = t.tgrelid
        INNER JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
        WHERE NOT t.tgisinternal
          AND n.nspname NOT IN ('information_schema', 'pg_catalog', 'pg_toast')
          AND n.nspname NOT LIKE 'pg%temp%'
        ORDER BY QUOTE_IDENT(n.nspname), QUOTE_IDENT(c.relname), QUOTE_IDENT(t.tgname)
    "#,
    key_cols: &["schema_name", "table_name", "trigger_name"],
    content_cols: &["tgenabled", "trigger_def"],
};

/// The narrowest statement(s) that reconcile an UPDATED trigger.
///
/// If only `tgenabled` differs, a single `ENABLE|DISABLE TRIGGER` statement
/// suffices. Otherwise the definition itself changed (regardless of whether
/// `tgenabled` also changed) and the trigger must be dropped and recreated,
/// DROP before CREATE.
pub fn alter_for_update(
    schema: &str,
    table: &str,
    trigger: &str,
    changed: &[String],
    new_enabled: char,
    drop_ddl: &str,
    add_ddl: &str,
) -> Vec<String> {
    if changed == ["tgenabled".to_string()] {
        let verb = if new_enabled == 'D' { "DISABLE" } else { "ENABLE" };
        vec![format!("ALTER TABLE {schema}.{table} {verb} TRIGGER {trigger};")]
    } else {
        vec![drop_ddl.to_string(), add_ddl.to_string()]
    }
}
