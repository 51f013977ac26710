//! `schemas` category: `CREATE SCHEMA` + owner + ACL, matched by name alone.
//!
//! A schema has no independently-alterable content field — renames aside
//! (explicitly out of scope), the only content is the schema itself — so the
//! producer for this category never emits an UPDATED event (SPEC_FULL.md
//! §4.2's "callbacks are filtered, not absent").

use super::CategoryDef;

pub const DEFINITION: CategoryDef = CategoryDef {
    sql: r#"
        SELECT
            QUOTE_IDENT(n.nspname) AS schema_name,
            pg_catalog.pg_get_userbyid(n.nspowner) AS owner,
            obj_description(n.oid, 'pg_namespace') AS comment,
            (
                'CREATE SCHEMA ' || QUOTE_IDENT(n.nspname) || ';' ||
                CASE WHEN obj_description(n.oid, 'pg_namespace') IS NOT NULL THEN
                    E'\nCOMMENT ON SCHEMA ' || QUOTE_IDENT(n.nspname) || ' IS ' ||
                    quote_literal(obj_description(n.oid, 'pg_namespace')) || ';'
                ELSE '' END ||
                E'\nALTER SCHEMA ' || QUOTE_IDENT(n.nspname) || ' OWNER TO ' ||
                QUOTE_IDENT(pg_catalog.pg_get_userbyid(n.nspowner)) || ';' ||
                COALESCE(
                    (
                        SELECT string_agg(
                            E'\nGRANT ' || acl.privilege_type || ' ON SCHEMA ' ||
                            QUOTE_IDENT(n.nspname) || ' TO ' ||
                            CASE WHEN acl.grantee = 'PUBLIC' THEN 'PUBLIC' ELSE QUOTE_IDENT(acl.grantee) END ||
                            CASE WHEN acl.is_grantable THEN ' WITH GRANT OPTION' ELSE '' END || ';',
                            ''
                        )
                        FROM information_schema.usage_privileges acl
                        WHERE acl.object_schema = n.nspname
                          AND acl.object_type = 'SCHEMA'
                    ),
                    ''
                )
            ) AS schema_add_ddl,
            'DROP SCHEMA ' || QUOTE_IDENT(n.nspname) || ' CASCADE;' AS schema_drop_ddl
        FROM pg_catalog.pg_namespace n
        WHERE n.nspname NOT IN ('information_schema', 'pg_catalog', 'pg_toast')
          AND n.nspname NOT LIKE 'pg%temp%'
        ORDER BY QUOTE_IDENT(n.nspname)
    "#,
    key_cols: &["schema_name"],
    content_cols: &[],
};
