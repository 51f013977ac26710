//! Consumer Workers (C5): drain the shared queue, batch rendered report
//! calls, and flush them as one script per batch against the report sink.

use crate::error::{CompareError, Result};
use crate::model::DiffEvent;
use crate::queue::{should_terminate, Liveness};
use crate::report;
use crossbeam::channel::{Receiver, TryRecvError};
use postgres::{Client, Config, NoTls};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Everything one consumer needs: its own dedicated report-sink connection,
/// the shared queue and liveness vector, and the flush batch size.
pub struct ConsumerContext {
    pub output: Config,
    pub block_size: usize,
    pub queue: Receiver<DiffEvent>,
    pub liveness: Liveness,
    pub index: usize,
}

/// Run one consumer to completion: loop until every producer is done and
/// the queue is empty, batching `block_size` report calls per flush.
#[instrument(skip(ctx), fields(consumer))]
pub fn run_consumer(ctx: ConsumerContext) -> Result<usize> {
    tracing::Span::current().record("consumer", ctx.index);
    let mut client = ctx
        .output
        .connect(NoTls)
        .map_err(|e| CompareError::Connection {
            label: "output".to_string(),
            source: e,
        })?;

    let result = drain(&mut client, &ctx);
    match &result {
        Ok(count) => info!(rows = count, "consumer finished"),
        Err(e) => error!(error = %e, "consumer failed"),
    }
    result
}

fn drain(client: &mut Client, ctx: &ConsumerContext) -> Result<usize> {
    let mut buffer: Vec<String> = Vec::with_capacity(ctx.block_size);
    let mut total = 0usize;

    loop {
        match ctx.queue.try_recv() {
            Ok(event) => {
                buffer.push(report::render_call(&event));
                if buffer.len() >= ctx.block_size {
                    total += flush(client, &mut buffer)?;
                }
            }
            Err(TryRecvError::Empty) => {
                if should_terminate(&ctx.liveness, &ctx.queue) {
                    break;
                }
                std::thread::sleep(Duration::from_millis(1));
            }
            Err(TryRecvError::Disconnected) => break,
        }
    }

    total += flush(client, &mut buffer)?;
    Ok(total)
}

fn flush(client: &mut Client, buffer: &mut Vec<String>) -> Result<usize> {
    if buffer.is_empty() {
        return Ok(0);
    }
    let script = report::render_batch(buffer);
    debug!(calls = buffer.len(), "flushing report batch");
    client
        .batch_execute(&script)
        .map_err(|e| CompareError::ReportSinkFailure(e.to_string()))?;
    let flushed = buffer.len();
    buffer.clear();
    Ok(flushed)
}
