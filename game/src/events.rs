use std::sync::{Arc, Mutex, MutexGuard};

use engine::{GameState, Node, ScoreReport};
use serde::Serialize;

use crate::lock_window::LockTicket;

/// Emitted once per accepted move. `path` runs from the previous position to
/// the chosen node, both ends included.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveApplied {
    pub move_number: u32,
    pub layer: u32,
    pub path: Vec<Node>,
    pub step_cost: u64,
    pub total_cost: u64,
    pub ticket: LockTicket,
}

/// Outcome of closing (or trying to close) a lock window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LockRelease {
    /// Nothing was locked, or the signal belonged to another move/session.
    Ignored,
    Resumed { current_layer: u32 },
    Completed { report: ScoreReport },
}

/// Optional hook interface for presentation and logging consumers.
///
/// Every method defaults to a no-op so observers only implement what they
/// care about. Observers are called after the controller's state is updated.
pub trait TraversalObserver {
    fn on_game_started(&mut self, _state: &GameState) {}
    fn on_move_applied(&mut self, _event: &MoveApplied) {}
    fn on_game_complete(&mut self, _report: &ScoreReport) {}
    fn on_restart(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum TraversalEvent {
    Started { width: u32, depth: u32 },
    MoveApplied(MoveApplied),
    Complete(ScoreReport),
    Restart,
}

/// Shared, cloneable recorder. Hand one clone to the controller and keep the
/// other to read back what happened.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<TraversalEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TraversalEvent> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, event: TraversalEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TraversalEvent>> {
        self.events.lock().expect("event log lock should be available")
    }
}

impl TraversalObserver for EventLog {
    fn on_game_started(&mut self, state: &GameState) {
        self.push(TraversalEvent::Started {
            width: state.width(),
            depth: state.depth(),
        });
    }

    fn on_move_applied(&mut self, event: &MoveApplied) {
        self.push(TraversalEvent::MoveApplied(event.clone()));
    }

    fn on_game_complete(&mut self, report: &ScoreReport) {
        self.push(TraversalEvent::Complete(*report));
    }

    fn on_restart(&mut self) {
        self.push(TraversalEvent::Restart);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_keeps_events_in_order() {
        let mut log = EventLog::new();
        log.on_restart();
        log.on_game_complete(&ScoreReport::new(
            3,
            engine::Dimensions::new(2, 3).unwrap(),
            engine::ScoringPolicy::PerDepth,
        ));
        let events = log.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], TraversalEvent::Restart));
        assert!(matches!(events[1], TraversalEvent::Complete(r) if r.total_cost == 3));
    }

    #[test]
    fn poisoned_recorder_fails_loudly() {
        let log = EventLog::new();
        let shared = log.events.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.lock().unwrap();
            panic!("observer crashed mid-write");
        })
        .join();

        let read = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| log.len()));
        assert!(read.is_err());
    }
}
