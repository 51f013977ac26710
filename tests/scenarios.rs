//! End-to-end scenarios against real PostgreSQL containers, per
//! SPEC_FULL.md §8 (S1-S6). Requires Docker; run with `cargo test --test
//! scenarios` on a machine with a working Docker daemon.

mod common;

use common::TestDb;
use db_comparer::config::{Cli, RunConfig};
use postgres::NoTls;

/// One reported row, as seen back out of `database_comparer_report.output_report`.
struct ReportRow {
    category: String,
    status: String,
    sql: String,
    schema_name: Option<String>,
    table_name: Option<String>,
    column_name: Option<String>,
    trigger_name: Option<String>,
    sequence_name: Option<String>,
}

fn run_comparison(source: &TestDb, target: &TestDb, output: &TestDb) -> Vec<ReportRow> {
    let cli = Cli {
        block_size: 100,
        source_database_connection: source.connection_string(),
        target_database_connection: target.connection_string(),
        output_database_connection: output.connection_string(),
        exclude_tables: vec![],
    };
    let config = RunConfig::from_cli(cli).expect("valid test connection strings");
    let summary = db_comparer::run(&config).expect("comparison run should not hit a config error");
    assert!(
        summary.failed_workers.is_empty(),
        "unexpected worker failures: {:?}",
        summary.failed_workers
    );

    let mut client = postgres::Client::connect(&as_pg_uri(&output.connection_string()), NoTls).unwrap();
    client
        .query(
            "SELECT category, status, sql, schema_name, table_name, column_name, trigger_name, sequence_name
             FROM database_comparer_report.output_report ORDER BY id",
            &[],
        )
        .unwrap()
        .into_iter()
        .map(|row| ReportRow {
            category: row.get(0),
            status: row.get(1),
            sql: row.get(2),
            schema_name: row.get(3),
            table_name: row.get(4),
            column_name: row.get(5),
            trigger_name: row.get(6),
            sequence_name: row.get(7),
        })
        .collect()
}

fn as_pg_uri(conn: &str) -> String {
    let parts: Vec<&str> = conn.split(':').collect();
    format!(
        "host={} port={} user={} password={} dbname={}",
        parts[0], parts[1], parts[3], parts[4], parts[2]
    )
}

#[test]
fn s1_schema_create_emits_inserted_schemas_event() {
    let target = TestDb::new();
    let mut source = TestDb::new();
    let output = TestDb::new();
    source.execute("CREATE SCHEMA s1;");

    let rows = run_comparison(&source, &target, &output);
    let row = rows
        .iter()
        .find(|r| r.category == "schemas" && r.schema_name.as_deref() == Some("s1"))
        .expect("expected one schemas event for s1");
    assert_eq!(row.status, "INSERTED");
    assert!(row.sql.starts_with("CREATE SCHEMA \"s1\";"));
}

#[test]
fn s2_column_type_change_emits_updated_tables_columns_event() {
    let mut target = TestDb::new();
    let mut source = TestDb::new();
    let output = TestDb::new();
    target.execute("CREATE TABLE public.t (a int);");
    source.execute("CREATE TABLE public.t (a bigint);");

    let rows = run_comparison(&source, &target, &output);
    let row = rows
        .iter()
        .find(|r| r.category == "tables_columns" && r.column_name.as_deref() == Some("a"))
        .expect("expected one tables_columns event for a");
    assert_eq!(row.status, "UPDATED");
    assert_eq!(row.sql, "ALTER TABLE public.t ALTER COLUMN a TYPE bigint;");
}

#[test]
fn s3_row_insert_in_target_emits_deleted_tables_data_event() {
    let mut target = TestDb::new();
    let mut source = TestDb::new();
    let output = TestDb::new();
    let ddl = "CREATE TABLE public.t (id int primary key, v text);";
    target.execute(ddl);
    source.execute(ddl);
    target.execute("INSERT INTO public.t VALUES (1, 'x'), (2, 'y');");
    source.execute("INSERT INTO public.t VALUES (1, 'x');");

    let rows = run_comparison(&source, &target, &output);
    let row = rows
        .iter()
        .find(|r| r.category == "tables_data" && r.table_name.as_deref() == Some("t") && r.status == "DELETED")
        .expect("expected one tables_data DELETED event");
    assert_eq!(
        row.sql,
        "DELETE FROM public.t WHERE \"id\" = $data_comparer$2$data_comparer$::integer;"
    );
}

#[test]
fn s4_sequence_attribute_emits_updated_sequences_event() {
    let mut target = TestDb::new();
    let mut source = TestDb::new();
    let output = TestDb::new();
    target.execute("CREATE SCHEMA s1; CREATE SEQUENCE s1.seq INCREMENT 1;");
    source.execute("CREATE SCHEMA s1; CREATE SEQUENCE s1.seq INCREMENT 2;");

    let rows = run_comparison(&source, &target, &output);
    let row = rows
        .iter()
        .find(|r| r.category == "sequences" && r.sequence_name.as_deref() == Some("seq"))
        .expect("expected one sequences event for seq");
    assert_eq!(row.status, "UPDATED");
    assert_eq!(row.sql, "ALTER SEQUENCE s1.seq INCREMENT BY 2;");
}

#[test]
fn s6_trigger_disable_emits_updated_tables_triggers_event() {
    let mut target = TestDb::new();
    let mut source = TestDb::new();
    let output = TestDb::new();
    let ddl = "CREATE TABLE public.t (id int);
               CREATE FUNCTION public.trg_fn() RETURNS trigger AS $$ BEGIN RETURN NEW; END; $$ LANGUAGE plpgsql;
               CREATE TRIGGER trg BEFORE INSERT ON public.t FOR EACH ROW EXECUTE FUNCTION public.trg_fn();";
    target.execute(ddl);
    source.execute(ddl);
    source.execute("ALTER TABLE public.t DISABLE TRIGGER trg;");

    let rows = run_comparison(&source, &target, &output);
    let row = rows
        .iter()
        .find(|r| r.category == "tables_triggers" && r.trigger_name.as_deref() == Some("trg"))
        .expect("expected one tables_triggers event for trg");
    assert_eq!(row.status, "UPDATED");
    assert!(row.sql.contains("ENABLE TRIGGER trg"));
}

#[test]
fn idempotence_of_structure_discovery_when_databases_match() {
    let mut target = TestDb::new();
    let mut source = TestDb::new();
    let output = TestDb::new();
    let ddl = "CREATE SCHEMA s1; CREATE TABLE s1.t (id int primary key, v text); INSERT INTO s1.t VALUES (1, 'x');";
    target.execute(ddl);
    source.execute(ddl);

    let rows = run_comparison(&source, &target, &output);
    assert!(
        rows.is_empty(),
        "expected zero diff events for identical databases, got {} rows",
        rows.len()
    );
}

#[test]
fn report_sink_bootstrap_is_idempotent_and_truncates() {
    let output = TestDb::new();
    let mut client = postgres::Client::connect(&as_pg_uri(&output.connection_string()), NoTls).unwrap();
    db_comparer::report::bootstrap(&mut client).unwrap();
    client
        .execute(
            "SELECT database_comparer_report.output_report_fnc_add(p_category => 'schemas', p_status => 'INSERTED', p_sql => 'CREATE SCHEMA x;')",
            &[],
        )
        .unwrap();
    let count: i64 = client
        .query_one("SELECT count(*) FROM database_comparer_report.output_report", &[])
        .unwrap()
        .get(0);
    assert_eq!(count, 1);

    // Bootstrapping again truncates the table back to empty.
    db_comparer::report::bootstrap(&mut client).unwrap();
    let count: i64 = client
        .query_one("SELECT count(*) FROM database_comparer_report.output_report", &[])
        .unwrap()
        .get(0);
    assert_eq!(count, 0);
}
