//! db_comparer — compares two PostgreSQL databases and emits, for every
//! structural or row-data difference, a remediation SQL statement to a
//! report database.
//!
//! The core is a producer/consumer pipeline: one producer thread per
//! catalog category plus one per comparable table streams a sorted-merge
//! diff (see [`differ`]) over two blockwise-fetched cursors (see [`cursor`])
//! and pushes [`model::DiffEvent`]s onto a shared queue (see [`queue`]);
//! consumer threads batch and write them to the report sink (see
//! [`report`]). See `SPEC_FULL.md` for the full design.

pub mod catalog;
pub mod config;
pub mod cursor;
pub mod differ;
pub mod error;
pub mod model;
pub mod queue;
pub mod report;
pub mod worker;

use crate::config::RunConfig;
use crate::error::{CompareError, Result};
use crate::model::Category;
use crate::queue::{diff_event_channel, Liveness};
use crate::worker::consumer::{self, ConsumerContext};
use crate::worker::producer::{self, ProducerContext};
use crate::worker::row_data::{self, RowDataContext};
use postgres::NoTls;
use std::thread;
use tracing::{info, warn};

/// Totals reported back to the caller once a run completes. A non-empty
/// `failed_workers` does not change the process exit code (SPEC_FULL.md
/// §7): the run is considered complete, just possibly partial.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub rows_reported: usize,
    pub failed_workers: Vec<String>,
}

/// Run one full comparison end to end: bootstrap the report sink, discover
/// row-data tasks on the target, then spawn and join every producer and
/// consumer (SPEC_FULL.md §2, §5).
pub fn run(config: &RunConfig) -> Result<RunSummary> {
    bootstrap_report_sink(config)?;
    let row_data_tasks = discover_row_data_tasks(config)?;

    let structural_categories = Category::structural_categories();
    let producer_count = structural_categories.len() + row_data_tasks.len();
    let consumer_count = num_cpus::get().max(1);

    let liveness = Liveness::new(producer_count);
    let (tx, rx) = diff_event_channel();

    info!(
        producers = producer_count,
        consumers = consumer_count,
        tables = row_data_tasks.len(),
        "starting comparison"
    );

    let producer_handles = spawn_producers(config, structural_categories, row_data_tasks, &liveness, &tx);
    drop(tx);

    let consumer_handles = spawn_consumers(config, consumer_count, &liveness, &rx);
    drop(rx);

    let failed_workers = join_producers(producer_handles);
    let (rows_reported, mut consumer_failures) = join_consumers(consumer_handles);

    let mut failed_workers = failed_workers;
    failed_workers.append(&mut consumer_failures);

    info!(
        rows_reported,
        failed = failed_workers.len(),
        "comparison complete"
    );

    Ok(RunSummary {
        rows_reported,
        failed_workers,
    })
}

fn bootstrap_report_sink(config: &RunConfig) -> Result<()> {
    let mut output_client = config.output.connect(NoTls).map_err(|e| CompareError::Connection {
        label: "output".to_string(),
        source: e,
    })?;
    report::bootstrap(&mut output_client)
}

fn discover_row_data_tasks(config: &RunConfig) -> Result<Vec<catalog::row_data::TableTask>> {
    let mut target_client = config.target.connect(NoTls).map_err(|e| CompareError::Connection {
        label: "target".to_string(),
        source: e,
    })?;
    let all_tasks = row_data::discover_leaf_tables(&mut target_client)?;
    Ok(all_tasks
        .into_iter()
        .filter(|t| !config.is_excluded(&t.schema_name, &t.table_name))
        .collect())
}

type ProducerHandle = (String, thread::JoinHandle<Result<()>>);

fn spawn_producers(
    config: &RunConfig,
    structural_categories: &'static [Category],
    row_data_tasks: Vec<catalog::row_data::TableTask>,
    liveness: &Liveness,
    tx: &crossbeam::channel::Sender<model::DiffEvent>,
) -> Vec<ProducerHandle> {
    let mut handles = Vec::with_capacity(structural_categories.len() + row_data_tasks.len());

    for (index, category) in structural_categories.iter().copied().enumerate() {
        let ctx = ProducerContext {
            source: config.source.clone(),
            target: config.target.clone(),
            block_size: config.block_size,
            queue: tx.clone(),
            liveness: liveness.clone(),
            index,
        };
        handles.push((
            format!("producer:{category}"),
            thread::spawn(move || producer::run_structural_producer(category, ctx)),
        ));
    }

    for (offset, task) in row_data_tasks.into_iter().enumerate() {
        let index = structural_categories.len() + offset;
        let label = format!("row_data:{}.{}", task.schema_name, task.table_name);
        let ctx = RowDataContext {
            source: config.source.clone(),
            target: config.target.clone(),
            block_size: config.block_size,
            queue: tx.clone(),
            liveness: liveness.clone(),
            index,
        };
        handles.push((
            label,
            thread::spawn(move || row_data::run_row_data_producer(task, ctx)),
        ));
    }

    handles
}

fn spawn_consumers(
    config: &RunConfig,
    consumer_count: usize,
    liveness: &Liveness,
    rx: &crossbeam::channel::Receiver<model::DiffEvent>,
) -> Vec<thread::JoinHandle<Result<usize>>> {
    (0..consumer_count)
        .map(|index| {
            let ctx = ConsumerContext {
                output: config.output.clone(),
                block_size: config.block_size.max(1) as usize,
                queue: rx.clone(),
                liveness: liveness.clone(),
                index,
            };
            thread::spawn(move || consumer::run_consumer(ctx))
        })
        .collect()
}

fn join_producers(handles: Vec<ProducerHandle>) -> Vec<String> {
    let mut failures = Vec::new();
    for (label, handle) in handles {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(worker = %label, error = %e, "producer failed");
                failures.push(format!("{label}: {e}"));
            }
            Err(_) => {
                warn!(worker = %label, "producer panicked");
                failures.push(format!("{label}: panicked"));
            }
        }
    }
    failures
}

fn join_consumers(handles: Vec<thread::JoinHandle<Result<usize>>>) -> (usize, Vec<String>) {
    let mut rows_reported = 0usize;
    let mut failures = Vec::new();
    for (index, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(Ok(count)) => rows_reported += count,
            Ok(Err(e)) => {
                warn!(consumer = index, error = %e, "consumer failed");
                failures.push(format!("consumer:{index}: {e}"));
            }
            Err(_) => {
                warn!(consumer = index, "consumer panicked");
                failures.push(format!("consumer:{index}: panicked"));
            }
        }
    }
    (rows_reported, failures)
}
