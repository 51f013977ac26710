//! Catalog Query Library (C1): one SQL statement per object category, each
//! producing rows sorted by the diff key and carrying the precomputed
//! `add`/`drop` DDL strings (SPEC_FULL.md §4.1).
//!
//! Every query here excludes `information_schema`, `pg_catalog`, `pg_toast`,
//! and anything matching `pg*temp*`, via [`SYSTEM_SCHEMA_FILTER`], and orders
//! its result by the diff-key columns ascending so the differ can stream it
//! without buffering.

mod indexes;
mod rules;
mod schemas;
mod tables;
mod views;

pub mod columns;
pub mod constraints;
pub mod routines;
pub mod row_data;
pub mod sequences;
pub mod triggers;

use crate::model::Category;

/// Fragment shared by every catalog query to exclude system schemas.
/// Applied against a `table_schema`/`schema_name`/`nspname`-shaped column
/// named by the caller.
pub fn system_schema_filter(schema_col: &str) -> String {
    format!(
        "{schema_col} NOT IN ('information_schema', 'pg_catalog', 'pg_toast') \
         AND {schema_col} NOT LIKE 'pg%temp%'"
    )
}

/// The static shape of one category's catalog query: its SQL text plus the
/// diff-key and content-column projections the differ needs.
pub struct CategoryDef {
    pub sql: &'static str,
    pub key_cols: &'static [&'static str],
    pub content_cols: &'static [&'static str],
}

/// Look up the catalog query definition for a structural category.
/// `tables_data`'s per-table queries are generated dynamically by
/// [`row_data`] instead, since they're parameterised by schema/table/key.
pub fn definition_for(category: Category) -> CategoryDef {
    match category {
        Category::Schemas => schemas::DEFINITION,
        Category::Tables => tables::DEFINITION,
        Category::TablesColumns => columns::DEFINITION,
        Category::TablesPks => constraints::PKS_DEFINITION,
        Category::TablesFks => constraints::FKS_DEFINITION,
        Category::TablesUniques => constraints::UNIQUES_DEFINITION,
        Category::TablesChecks => constraints::CHECKS_DEFINITION,
        Category::TablesExcludes => constraints::EXCLUDES_DEFINITION,
        Category::TablesRules => rules::DEFINITION,
        Category::TablesTriggers => triggers::DEFINITION,
        Category::Indexes => indexes::DEFINITION,
        Category::Sequences => sequences::DEFINITION,
        Category::Views => views::VIEWS_DEFINITION,
        Category::Mviews => views::MVIEWS_DEFINITION,
        Category::Functions => routines::FUNCTIONS_DEFINITION,
        Category::TriggerFunctions => routines::TRIGGER_FUNCTIONS_DEFINITION,
        Category::Procedures => routines::PROCEDURES_DEFINITION,
        Category::TablesData => {
            panic!("tables_data queries are generated per-table by catalog::row_data")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_schema_filter_excludes_expected_schemas() {
        let f = system_schema_filter("table_schema");
        assert!(f.contains("information_schema"));
        assert!(f.contains("pg_catalog"));
        assert!(f.contains("pg_toast"));
        assert!(f.contains("pg%temp%"));
    }

    #[test]
    fn every_structural_category_has_a_definition() {
        for category in Category::structural_categories() {
            let def = definition_for(*category);
            assert!(!def.sql.is_empty(), "{category} has empty SQL");
            assert!(!def.key_cols.is_empty(), "{category} has no key columns");
        }
    }
}
