//! Leaf-table discovery for the row-data differ (C6), run once by the
//! master before row-data producers are spawned.
//!
//! Grounded directly on the original's `get_compare_tables_data_tasks`
//! query: a table is a leaf iff it has no child in `pg_inherits`, so
//! partitioned parents and non-leaf inheritance ancestors never get their
//! own row-data comparison (a row reachable through a child would otherwise
//! be double-counted — SPEC_FULL.md §4.4, property 7).

/// One row-data-comparable table discovered on the target.
#[derive(Debug, Clone, PartialEq)]
pub struct TableTask {
    pub schema_name: String,
    pub table_name: String,
    /// Comma-separated PK columns, or the full column list if no PK exists.
    pub table_key: String,
    /// `col(type), col(type), ...` used to build the per-table query.
    pub columns_names_types: String,
}

/// The discovery query: leaf tables, their key (PK or full column list), and
/// column type descriptors, sorted for stable task ordering.
pub const DISCOVER_LEAF_TABLES_SQL: &str = r#"
    WITH leaf_tables AS (
        SELECT n.nspname AS table_schema,
               QUOTE_IDENT(c.relname) AS table_name
        FROM pg_catalog.pg_class c
        INNER JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
        WHERE c.relkind IN ('r', 'p')
          AND n.nspname NOT IN ('information_schema', 'pg_catalog', 'pg_toast')
          AND n.nspname NOT LIKE 'pg%temp%'
          AND NOT EXISTS (
              SELECT 1 FROM pg_catalog.pg_inherits i WHERE i.inhparent = c.oid
          )
    ),
    select_pks AS (
        SELECT tc.table_schema,
               tc.table_name,
               STRING_AGG(QUOTE_IDENT(kc.column_name), ',' ORDER BY kc.ordinal_position) AS column_names
        FROM information_schema.table_constraints tc
        INNER JOIN information_schema.key_column_usage kc
                ON tc.table_name = kc.table_name
               AND tc.table_schema = kc.table_schema
               AND tc.constraint_name = kc.constraint_name
        WHERE tc.constraint_type = 'PRIMARY KEY'
          AND tc.table_schema NOT IN ('information_schema', 'pg_catalog', 'pg_toast')
          AND tc.table_schema NOT LIKE 'pg%temp%'
        GROUP BY tc.table_schema, tc.table_name
    ),
    select_columns AS (
        SELECT table_schema,
               table_name,
               STRING_AGG(QUOTE_IDENT(column_name), ',' ORDER BY ordinal_position) AS column_names,
               STRING_AGG(
                   FORMAT(
                       '%s(%s%s)',
                       QUOTE_IDENT(column_name),
                       data_type,
                       (CASE WHEN character_maximum_length IS NOT NULL
                             THEN FORMAT('(%s)', character_maximum_length)
                             WHEN numeric_precision IS NOT NULL AND NULLIF(numeric_scale, 0) IS NOT NULL
                             THEN FORMAT('(%s, %s)', numeric_precision, numeric_scale)
                             ELSE '' END)
                   ),
                   ',' ORDER BY ordinal_position
               ) AS columns_names_types
        FROM information_schema.columns
        WHERE table_schema NOT IN ('information_schema', 'pg_catalog', 'pg_toast')
          AND table_schema NOT LIKE 'pg%temp%'
        GROUP BY table_schema, table_name
    )
    SELECT QUOTE_IDENT(lt.table_schema) AS table_schema,
           lt.table_name,
           COALESCE(sp.column_names, sc.column_names) AS table_key,
           sc.columns_names_types
    FROM leaf_tables lt
    INNER JOIN select_columns sc
            ON lt.table_schema = sc.table_schema
           AND lt.table_name = sc.table_name
    LEFT JOIN select_pks sp
           ON lt.table_schema = sp.table_schema
          AND lt.table_name = sp.table_name
    ORDER BY lt.table_schema, lt.table_name
"#;

/// The comparison SQL for a single table, ordered by its key. `SELECT *`
/// mirrors the original so the emitted column list always matches whatever
/// columns the table actually has, including ones added after this tool was
/// written.
pub fn select_table_ordered_sql(schema: &str, table: &str, key: &str) -> String {
    format!("SELECT * FROM {schema}.{table} ORDER BY {key}")
}

/// One column's name and PostgreSQL type, parsed out of a `TableTask`'s
/// `columns_names_types` descriptor (`col(type),col(type),...`), used to
/// cast literals in generated DML (`VALUE::type`).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub pg_type: String,
}

/// Parse `col1(int4),col2(character varying(255)),...` into ordered column
/// specs. Column names arrive already `QUOTE_IDENT`-quoted by the discovery
/// query; types may themselves contain parentheses (e.g. `numeric(10, 2)`),
/// so the first `(` splits the name from the type and the last `)` is
/// stripped rather than matching greedily on the first pair.
pub fn parse_columns(columns_names_types: &str) -> Vec<ColumnSpec> {
    split_top_level(columns_names_types)
        .into_iter()
        .filter_map(|field| {
            let open = field.find('(')?;
            let close = field.rfind(')')?;
            if close <= open {
                return None;
            }
            Some(ColumnSpec {
                name: field[..open].to_string(),
                pg_type: field[open + 1..close].to_string(),
            })
        })
        .collect()
}

/// Split a `table_key` descriptor (`col1,col2,...`) into its column names.
pub fn parse_key(table_key: &str) -> Vec<String> {
    table_key.split(',').map(str::to_string).collect()
}

/// Split on commas that are not nested inside a column type's own
/// parentheses, e.g. `a(numeric(10, 2)),b(int4)` splits into two fields,
/// not four.
fn split_top_level(s: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in s.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        fields.push(current);
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_query_excludes_children_via_not_exists_pg_inherits() {
        assert!(DISCOVER_LEAF_TABLES_SQL.contains("pg_inherits"));
        assert!(DISCOVER_LEAF_TABLES_SQL.contains("NOT EXISTS"));
    }

    #[test]
    fn per_table_query_orders_by_key() {
        let sql = select_table_ordered_sql("public", "t", "id");
        assert_eq!(sql, "SELECT * FROM public.t ORDER BY id");
    }

    #[test]
    fn parse_columns_splits_simple_types() {
        let cols = parse_columns("\"id\"(integer),\"v\"(text)");
        assert_eq!(
            cols,
            vec![
                ColumnSpec {
                    name: "\"id\"".to_string(),
                    pg_type: "integer".to_string()
                },
                ColumnSpec {
                    name: "\"v\"".to_string(),
                    pg_type: "text".to_string()
                },
            ]
        );
    }

    #[test]
    fn parse_columns_handles_nested_parens_in_type() {
        let cols = parse_columns("\"amount\"(numeric(10, 2))");
        assert_eq!(cols.len(), 1);
        assert_eq!(cols[0].pg_type, "numeric(10, 2)");
    }

    #[test]
    fn parse_key_splits_comma_separated_columns() {
        assert_eq!(
            parse_key("\"id\",\"region\""),
            vec!["\"id\"".to_string(), "\"region\"".to_string()]
        );
    }
}
