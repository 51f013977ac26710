//! Producer Workers (C3/C6) and Consumer Workers (C5).

pub mod consumer;
pub mod producer;
pub mod row_data;

use crate::error::CompareError;

/// What a worker thread reports to the master at join time: either it ran
/// to completion (possibly having logged its own row-level errors) or it
/// hit a fatal error of its own. SPEC_FULL.md §7: a worker's failure aborts
/// that worker, not the whole pipeline.
pub type WorkerResult = Result<(), CompareError>;
