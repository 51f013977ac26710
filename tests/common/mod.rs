//! Shared test helpers for integration tests using Testcontainers.
//!
//! Unlike the unit tests under `src/`, these boot a real PostgreSQL via
//! Docker and drive it with the same synchronous `postgres::Client` the
//! rest of this crate uses — there is no async runtime anywhere in this
//! crate, so the containers are started with testcontainers' blocking
//! runner rather than `tokio`.

use postgres::{Client, NoTls};
use testcontainers::runners::SyncRunner;
use testcontainers::ImageExt;
use testcontainers_modules::postgres::Postgres;

/// A test database backed by a Testcontainers PostgreSQL 18 instance.
/// The container is torn down when `TestDb` is dropped.
#[allow(dead_code)]
pub struct TestDb {
    client: Client,
    _container: testcontainers::Container<Postgres>,
}

#[allow(dead_code)]
impl TestDb {
    /// Start a fresh PostgreSQL container and connect to it.
    pub fn new() -> Self {
        let container = Postgres::default()
            .with_tag("18-alpine")
            .start()
            .expect("failed to start PostgreSQL container");
        let port = container
            .get_host_port_ipv4(5432)
            .expect("failed to get mapped port");
        let conn = format!("host=127.0.0.1 port={port} user=postgres password=postgres dbname=postgres");
        let client = Client::connect(&conn, NoTls).expect("failed to connect to test database");
        TestDb {
            client,
            _container: container,
        }
    }

    /// The `HOST:PORT:DATABASE:USER:PASSWORD` connection string for this
    /// container, in the form `RunConfig::from_cli` expects.
    pub fn connection_string(&self) -> String {
        let port = self
            ._container
            .get_host_port_ipv4(5432)
            .expect("failed to get mapped port");
        format!("127.0.0.1:{port}:postgres:postgres:postgres")
    }

    pub fn execute(&mut self, sql: &str) {
        self.client
            .batch_execute(sql)
            .unwrap_or_else(|e| panic!("SQL execution failed: {e}\nSQL: {sql}"));
    }

    pub fn client(&mut self) -> &mut Client {
        &mut self.client
    }
}
