//! `sequences` category, grounded on the original's `compare_sequences`
//! worker: `information_schema.sequences` with one independently alterable
//! content field per attribute, so UPDATED emits one `ALTER SEQUENCE` per
//! differing attribute rather than a single DROP+CREATE.

use super::CategoryDef;

pub const DEFINITION: CategoryDef = CategoryDef {
    sql: r#"
        SELECT
            QUOTE_IDENT(s.sequence_schema) AS schema_name,
            QUOTE_IDENT(s.sequence_name) AS sequence_name,
            s.start_value AS start_value,
            s.minimum_value AS minimum_value,
            s.maximum_value AS maximum_value,
            s.increment AS increment,
            s.cycle_option AS cycle_option,
            (
                'CREATE SEQUENCE ' || QUOTE_IDENT(s.sequence_schema) || '.' || QUOTE_IDENT(s.sequence_name) ||
                ' INCREMENT BY ' || s.increment ||
                ' MINVALUE ' || s.minimum_value ||
                ' MAXVALUE ' || s.maximum_value ||
                ' START WITH ' || s.start_value ||
                CASE WHEN s.cycle_option = 'YES' THEN ' CYCLE' ELSE ' NO CYCLE' END || ';'
            ) AS sequence_add_ddl,
            (
                'DROP SEQUENCE ' || QUOTE_IDENT(s.sequence_schema) || '.' || QUOTE_IDENT(s.sequence_name) || ';'
            ) AS sequence_drop_ddl
        FROM information_schema.sequences s
        WHERE s.sequence_schema NOT IN ('information_schema', 'pg_catalog', 'pg_toast')
          AND s.sequence_schema NOT LIKE 'pg%temp%'
        ORDER BY QUOTE_IDENT(s.sequence_schema), QUOTE_IDENT(s.sequence_name)
    "#,
    key_cols: &["schema_name", "sequence_name"],
    content_cols: &[
        "start_value",
        "minimum_value",
        "maximum_value",
        "increment",
        "cycle_option",
    ],
};

/// One `ALTER SEQUENCE` statement per differing attribute, matching the
/// original's `compare_sequences` callbacks one-for-one.
pub fn alter_for_field(schema: &str, sequence: &str, field: &str, new_value: &str) -> String {
    let qualified = format!("ALTER SEQUENCE {schema}.{sequence}");
    match field {
        "start_value" => format!("{qualified} START WITH {new_value};"),
        "minimum_value" => format!("{qualified} MINVALUE {new_value};"),
        "maximum_value" => format!("{qualified} MAXVALUE {new_value};"),
        "increment" => format!("{qualified} INCREMENT BY {new_value};"),
        "cycle_option" => {
            let clause = if new_value == "YES" { "CYCLE" } else { "NO CYCLE" };
            format!("{qualified} {clause};")
        }
        other => unreachable!("sequences has no content field named {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_change_matches_s4_scenario() {
        let sql = alter_for_field("s1", "seq", "increment", "2");
        assert_eq!(sql, "ALTER SEQUENCE s1.seq INCREMENT BY 2;");
    }

    #[test]
    fn cycle_on_emits_cycle() {
        assert_eq!(
            alter_for_field("s1", "seq", "cycle_option", "YES"),
            "ALTER SEQUENCE s1.seq CYCLE;"
        );
    }

    #[test]
    fn cycle_off_emits_no_cycle() {
        assert_eq!(
            alter_for_field("s1", "seq", "cycle_option", "NO"),
            "ALTER SEQUENCE s1.seq NO CYCLE;"
        );
    }
}
