//! CLI & run configuration: parses the five required flags into a
//! validated [`RunConfig`], delegating argument parsing to `clap` and
//! connection-string parsing to `postgres::Config` rather than reinventing
//! either.

use crate::error::{CompareError, Result};
use clap::Parser;
use postgres::Config as PgConfig;

/// The five flags this tool accepts: source/target/output connections, the
/// shared block size, and the row-data exclude list.
#[derive(Debug, Parser)]
#[command(
    name = "db_comparer",
    about = "Compares two PostgreSQL databases and reports remediation SQL to a report database"
)]
pub struct Cli {
    /// Fetch/insert batch size shared by cursors and the report-sink consumers.
    #[arg(short = 'b', long = "block-size")]
    pub block_size: i64,

    /// `HOST:PORT:DATABASE:USER:PASSWORD` for the database being brought up to date with.
    #[arg(short = 's', long = "source-database-connection")]
    pub source_database_connection: String,

    /// `HOST:PORT:DATABASE:USER:PASSWORD` for the database being compared against.
    #[arg(short = 't', long = "target-database-connection")]
    pub target_database_connection: String,

    /// `HOST:PORT:DATABASE:USER:PASSWORD` for the database that receives the report.
    #[arg(short = 'o', long = "output-database-connection")]
    pub output_database_connection: String,

    /// Schema-qualified table names (`schema.table`) excluded from row-data comparison only.
    #[arg(short = 'e', long = "exclude-tables", num_args = 0..)]
    pub exclude_tables: Vec<String>,
}

/// The validated, in-memory form of the CLI arguments: three connection
/// configs in their fixed roles, the shared block size, and the row-data
/// exclude set.
pub struct RunConfig {
    pub block_size: i64,
    pub source: PgConfig,
    pub target: PgConfig,
    pub output: PgConfig,
    pub exclude_tables: Vec<String>,
}

impl RunConfig {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        if cli.block_size <= 0 {
            return Err(CompareError::InvalidParameterValue {
                message: "block size must be a positive integer".to_string(),
                received: cli.block_size.to_string(),
            });
        }

        for name in &cli.exclude_tables {
            if !name.contains('.') {
                return Err(CompareError::InvalidParameterValue {
                    message: "excluded table names must be schema-qualified (schema.table)"
                        .to_string(),
                    received: name.clone(),
                });
            }
        }

        Ok(Self {
            block_size: cli.block_size,
            source: parse_connection("source", &cli.source_database_connection)?,
            target: parse_connection("target", &cli.target_database_connection)?,
            output: parse_connection("output", &cli.output_database_connection)?,
            exclude_tables: cli.exclude_tables,
        })
    }

    /// Whether `schema.table` was named on `-e/--exclude-tables`.
    pub fn is_excluded(&self, schema: &str, table: &str) -> bool {
        let qualified = format!("{schema}.{table}");
        self.exclude_tables.iter().any(|e| e == &qualified)
    }
}

/// Parse one `HOST:PORT:DATABASE:USER:PASSWORD` connection string into a
/// `postgres::Config`. An empty password segment is allowed — libpq then
/// falls through to `.pgpass`.
fn parse_connection(label: &'static str, raw: &str) -> Result<PgConfig> {
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() != 5 {
        return Err(CompareError::ConnectionStringError {
            label: label.to_string(),
            reason: format!(
                "expected HOST:PORT:DATABASE:USER:PASSWORD, got {} field(s)",
                parts.len()
            ),
        });
    }
    let [host, port, dbname, user, password] = parts[..] else {
        unreachable!("length checked above");
    };

    let port: u16 = port.parse().map_err(|_| CompareError::ConnectionStringError {
        label: label.to_string(),
        reason: format!("invalid port: {port}"),
    })?;

    let mut config = PgConfig::new();
    config.host(host).port(port).dbname(dbname).user(user);
    if !password.is_empty() {
        config.password(password);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(block_size: i64, exclude: Vec<&str>) -> Cli {
        Cli {
            block_size,
            source_database_connection: "localhost:5432:src:postgres:pw".to_string(),
            target_database_connection: "localhost:5432:tgt:postgres:pw".to_string(),
            output_database_connection: "localhost:5432:rpt:postgres:pw".to_string(),
            exclude_tables: exclude.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn valid_cli_parses_into_run_config() {
        let cfg = RunConfig::from_cli(cli(500, vec!["public.audit_log"])).unwrap();
        assert_eq!(cfg.block_size, 500);
        assert!(cfg.is_excluded("public", "audit_log"));
        assert!(!cfg.is_excluded("public", "other"));
    }

    #[test]
    fn zero_block_size_is_rejected() {
        let result = RunConfig::from_cli(cli(0, vec![]));
        assert!(matches!(
            result,
            Err(CompareError::InvalidParameterValue { .. })
        ));
    }

    #[test]
    fn unqualified_exclude_table_is_rejected() {
        let result = RunConfig::from_cli(cli(500, vec!["no_schema"]));
        assert!(matches!(
            result,
            Err(CompareError::InvalidParameterValue { .. })
        ));
    }

    #[test]
    fn empty_password_segment_is_allowed() {
        let mut c = cli(500, vec![]);
        c.source_database_connection = "localhost:5432:src:postgres:".to_string();
        assert!(RunConfig::from_cli(c).is_ok());
    }

    #[test]
    fn malformed_connection_string_is_rejected() {
        let mut c = cli(500, vec![]);
        c.source_database_connection = "localhost:5432:src".to_string();
        let result = RunConfig::from_cli(c);
        assert!(matches!(
            result,
            Err(CompareError::ConnectionStringError { .. })
        ));
    }
}
