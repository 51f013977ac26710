//! The change-event and liveness channel (C4): a multi-producer /
//! multi-consumer queue of [`DiffEvent`]s paired with a per-producer
//! liveness vector.

use crate::model::DiffEvent;
use crossbeam::channel::{self, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One writable cell per producer. Each cell is written exactly once
/// (true → false) when that producer finishes emitting, normal or not.
#[derive(Clone)]
pub struct Liveness {
    cells: Arc<Vec<AtomicBool>>,
}

impl Liveness {
    pub fn new(producer_count: usize) -> Self {
        let cells = (0..producer_count).map(|_| AtomicBool::new(true)).collect();
        Self {
            cells: Arc::new(cells),
        }
    }

    /// Mark producer `index` as finished. Idempotent, but SPEC_FULL.md's
    /// contract is that each producer calls this exactly once.
    pub fn mark_done(&self, index: usize) {
        self.cells[index].store(false, Ordering::SeqCst);
    }

    /// Whether every producer has finished.
    pub fn all_done(&self) -> bool {
        self.cells.iter().all(|c| !c.load(Ordering::SeqCst))
    }

    /// Indices of producers that have not yet cleared their cell, for
    /// diagnostics when a run appears to hang.
    pub fn still_alive(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.load(Ordering::SeqCst))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Construct the shared diff-event queue. Unbounded per SPEC_FULL.md §5:
/// producers never block on `send`, and cross-producer ordering is
/// unspecified.
pub fn diff_event_channel() -> (Sender<DiffEvent>, Receiver<DiffEvent>) {
    channel::unbounded()
}

/// The consumer termination predicate: exit only when every liveness cell
/// is false **and** the queue is empty. Neither condition alone is
/// sufficient (SPEC_FULL.md §4.5).
pub fn should_terminate(liveness: &Liveness, queue: &Receiver<DiffEvent>) -> bool {
    liveness.all_done() && queue.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_liveness_is_not_all_done() {
        let l = Liveness::new(3);
        assert!(!l.all_done());
        assert_eq!(l.still_alive(), vec![0, 1, 2]);
    }

    #[test]
    fn marking_all_cells_done_flips_all_done() {
        let l = Liveness::new(2);
        l.mark_done(0);
        assert!(!l.all_done());
        l.mark_done(1);
        assert!(l.all_done());
        assert!(l.still_alive().is_empty());
    }

    #[test]
    fn termination_requires_both_drained_queue_and_dead_producers() {
        let (tx, rx) = diff_event_channel();
        let liveness = Liveness::new(1);

        // Alive producer, empty queue: not done.
        assert!(!should_terminate(&liveness, &rx));

        liveness.mark_done(0);
        // Dead producer, but an event is still sitting in the queue: not done.
        tx.send(crate::model::DiffEvent::new(
            crate::model::Category::Schemas,
            crate::model::DiffStatus::Inserted,
            crate::model::Identity::default(),
            vec![],
            "CREATE SCHEMA s;",
        ))
        .unwrap();
        assert!(!should_terminate(&liveness, &rx));

        rx.recv().unwrap();
        assert!(should_terminate(&liveness, &rx));
    }
}
