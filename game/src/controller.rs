use std::sync::Arc;
use std::time::Duration;

use engine::{
    Error, GameState, IllegalMoveReason, Node, NodeId, Result, ScoreReport, ScoringPolicy,
};
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::events::{LockRelease, MoveApplied, TraversalObserver};
use crate::lock_window::{LockTicket, LockWindow};
use crate::settings::GameSettings;

/// 1000 ms path highlight plus a 50 ms margin before input re-opens.
pub const DEFAULT_LOCK_WINDOW: Duration = Duration::from_millis(1050);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Idle,
    AwaitingMove,
    Locked,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    pub move_number: u32,
    pub node: NodeId,
    pub layer: u32,
    pub step_cost: u64,
    pub total_cost: u64,
}

/// Read-only view handed to renderers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: Phase,
    /// Shared with the controller; snapshots never copy the tree.
    pub tree: Option<Arc<GameState>>,
    pub agent_node: Option<Node>,
    pub current_layer: Option<u32>,
    pub total_cost: u64,
    pub move_count: u32,
    pub lock_remaining_ms: Option<u64>,
    pub history: Vec<MoveRecord>,
    pub report: Option<ScoreReport>,
}

#[derive(Debug)]
struct Session {
    state: Arc<GameState>,
    agent: NodeId,
    current_layer: u32,
    total_cost: u64,
    move_count: u32,
    lock: Option<LockWindow>,
    history: Vec<MoveRecord>,
    report: Option<ScoreReport>,
}

impl Session {
    fn new(state: GameState) -> Self {
        let agent = state.root().id;
        Self {
            state: Arc::new(state),
            agent,
            current_layer: 1,
            total_cost: 0,
            move_count: 0,
            lock: None,
            history: Vec::new(),
            report: None,
        }
    }

    fn phase(&self) -> Phase {
        if self.report.is_some() {
            Phase::Complete
        } else if self.lock.is_some() {
            Phase::Locked
        } else {
            Phase::AwaitingMove
        }
    }

    fn final_layer_reached(&self) -> bool {
        self.current_layer == self.state.depth() + 1
    }
}

/// Turn state machine for one player.
///
/// `Idle → AwaitingMove ⇄ Locked → Complete`. Every accepted move locks the
/// controller until the lock window is closed, either explicitly through
/// [`TraversalController::complete_lock_window`] or by [`TraversalController::tick`]
/// running out the configured duration.
pub struct TraversalController {
    rng: StdRng,
    lock_window: Duration,
    scoring: ScoringPolicy,
    epoch: u64,
    session: Option<Session>,
    observers: Vec<Box<dyn TraversalObserver + Send>>,
}

impl std::fmt::Debug for TraversalController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraversalController")
            .field("lock_window", &self.lock_window)
            .field("scoring", &self.scoring)
            .field("epoch", &self.epoch)
            .field("session", &self.session)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for TraversalController {
    fn default() -> Self {
        Self::new()
    }
}

impl TraversalController {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_rng(&mut rand::rng()))
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            lock_window: DEFAULT_LOCK_WINDOW,
            scoring: ScoringPolicy::default(),
            epoch: 0,
            session: None,
            observers: Vec::new(),
        }
    }

    pub fn from_settings(settings: &GameSettings) -> Self {
        let controller = match settings.seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        };
        controller
            .with_lock_window(settings.lock_window())
            .with_scoring(settings.scoring)
    }

    pub fn with_lock_window(mut self, lock_window: Duration) -> Self {
        self.lock_window = lock_window;
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringPolicy) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn TraversalObserver + Send>) {
        self.observers.push(observer);
    }

    pub fn lock_window(&self) -> Duration {
        self.lock_window
    }

    pub fn scoring(&self) -> ScoringPolicy {
        self.scoring
    }

    pub fn phase(&self) -> Phase {
        self.session.as_ref().map_or(Phase::Idle, Session::phase)
    }

    pub fn is_locked(&self) -> bool {
        self.phase() == Phase::Locked
    }

    pub fn state(&self) -> Option<&GameState> {
        self.session.as_ref().map(|s| &*s.state)
    }

    pub fn agent_node(&self) -> Option<&Node> {
        let session = self.session.as_ref()?;
        session.state.node(session.agent).ok()
    }

    /// The only layer whose nodes are currently selectable.
    pub fn current_layer(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.current_layer)
    }

    pub fn total_cost(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.total_cost)
    }

    pub fn move_count(&self) -> u32 {
        self.session.as_ref().map_or(0, |s| s.move_count)
    }

    pub fn history(&self) -> &[MoveRecord] {
        self.session
            .as_ref()
            .map(|s| s.history.as_slice())
            .unwrap_or_default()
    }

    pub fn report(&self) -> Option<ScoreReport> {
        self.session.as_ref().and_then(|s| s.report)
    }

    pub fn pending_ticket(&self) -> Option<LockTicket> {
        self.session
            .as_ref()
            .and_then(|s| s.lock.as_ref())
            .map(LockWindow::ticket)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.as_ref();
        SessionSnapshot {
            phase: self.phase(),
            tree: session.map(|s| Arc::clone(&s.state)),
            agent_node: self.agent_node().copied(),
            current_layer: self.current_layer(),
            total_cost: self.total_cost(),
            move_count: self.move_count(),
            lock_remaining_ms: session
                .and_then(|s| s.lock.as_ref())
                .map(|lock| lock.remaining().as_millis() as u64),
            history: self.history().to_vec(),
            report: self.report(),
        }
    }

    /// Generates a fresh tree from the controller's random source and opens
    /// layer 1 for selection. A finished session is replaced silently; a
    /// running one must be restarted first.
    pub fn start_game(&mut self, width: u32, depth: u32) -> Result<&GameState> {
        self.ensure_not_running()?;
        let state = GameState::generate(width, depth, &mut self.rng)?;
        self.begin(state)
    }

    /// Like [`TraversalController::start_game`] with a caller-built tree.
    pub fn start_with_tree(&mut self, state: GameState) -> Result<&GameState> {
        self.ensure_not_running()?;
        self.begin(state)
    }

    fn ensure_not_running(&self) -> Result<()> {
        match self.phase() {
            Phase::AwaitingMove | Phase::Locked => Err(Error::AlreadyInProgress),
            Phase::Idle | Phase::Complete => Ok(()),
        }
    }

    fn begin(&mut self, state: GameState) -> Result<&GameState> {
        self.epoch += 1;
        info!(
            width = state.width(),
            depth = state.depth(),
            session = self.epoch,
            "new game"
        );
        for observer in &mut self.observers {
            observer.on_game_started(&state);
        }

        let mut session = Session::new(state);
        // A depth-0 tree has nothing to select: the root is already the last layer.
        if session.final_layer_reached() {
            let report = ScoreReport::new(0, session.state.dimensions(), self.scoring);
            session.report = Some(report);
            self.session = Some(session);
            self.finish(report);
        } else {
            self.session = Some(session);
        }

        self.state().ok_or(Error::illegal_move(IllegalMoveReason::NoActiveGame))
    }

    /// Selects `target` as the next position. Refusals leave every counter
    /// untouched and notify nobody.
    pub fn attempt_move(&mut self, target: NodeId) -> Result<MoveApplied> {
        let result = self.apply_move(target);
        match &result {
            Ok(event) => {
                info!(
                    layer = event.layer,
                    node = target,
                    step_cost = event.step_cost,
                    total_cost = event.total_cost,
                    "move applied"
                );
                for observer in &mut self.observers {
                    observer.on_move_applied(event);
                }
            }
            Err(err) => debug!(node = target, %err, "move rejected"),
        }
        result
    }

    fn apply_move(&mut self, target: NodeId) -> Result<MoveApplied> {
        let Some(session) = self.session.as_mut() else {
            return Err(Error::illegal_move(IllegalMoveReason::NoActiveGame));
        };
        let target = *session.state.node(target)?;

        if session.report.is_some() {
            return Err(Error::illegal_move(IllegalMoveReason::GameComplete));
        }
        if session.lock.is_some() {
            return Err(Error::illegal_move(IllegalMoveReason::Locked));
        }
        if target.depth != session.current_layer {
            return Err(Error::illegal_move(IllegalMoveReason::WrongLayer {
                expected: session.current_layer,
                actual: target.depth,
            }));
        }

        let path = session.state.path_between(session.agent, target.id)?;
        let step_cost = path.len() as u64 - 1;
        session.total_cost += step_cost;
        session.move_count += 1;
        session.agent = target.id;
        let layer = session.current_layer;
        session.current_layer += 1;

        let ticket = LockTicket {
            session: self.epoch,
            move_number: session.move_count,
        };
        session.lock = Some(LockWindow::new(ticket, self.lock_window));
        session.history.push(MoveRecord {
            move_number: session.move_count,
            node: target.id,
            layer,
            step_cost,
            total_cost: session.total_cost,
        });

        Ok(MoveApplied {
            move_number: session.move_count,
            layer,
            path,
            step_cost,
            total_cost: session.total_cost,
            ticket,
        })
    }

    /// Closes the current lock window. Called by whoever plays the move
    /// animation once it has finished; harmless if the window already closed.
    pub fn complete_lock_window(&mut self) -> LockRelease {
        match self.pending_ticket() {
            Some(ticket) => self.release(ticket),
            None => LockRelease::Ignored,
        }
    }

    /// Closes the lock window only if `ticket` names the move still in flight.
    /// Timers scheduled for an abandoned session or an already released move
    /// land here and are ignored.
    pub fn complete_lock_window_for(&mut self, ticket: LockTicket) -> LockRelease {
        if self.pending_ticket() != Some(ticket) {
            debug!(
                session = ticket.session,
                move_number = ticket.move_number,
                "stale lock ticket ignored"
            );
            return LockRelease::Ignored;
        }
        self.release(ticket)
    }

    /// Advances the lock window's clock; releases it once the configured
    /// duration has elapsed.
    pub fn tick(&mut self, dt: Duration) -> LockRelease {
        let Some(lock) = self.session.as_mut().and_then(|s| s.lock.as_mut()) else {
            return LockRelease::Ignored;
        };
        lock.tick(dt);
        if !lock.is_up() {
            return LockRelease::Ignored;
        }
        let ticket = lock.ticket();
        self.release(ticket)
    }

    fn release(&mut self, ticket: LockTicket) -> LockRelease {
        let scoring = self.scoring;
        let Some(session) = self.session.as_mut() else {
            return LockRelease::Ignored;
        };
        if session.lock.map(|lock| lock.ticket()) != Some(ticket) {
            return LockRelease::Ignored;
        }
        session.lock = None;

        if !session.final_layer_reached() {
            return LockRelease::Resumed {
                current_layer: session.current_layer,
            };
        }

        let report = ScoreReport::new(session.total_cost, session.state.dimensions(), scoring);
        session.report = Some(report);
        self.finish(report);
        LockRelease::Completed { report }
    }

    fn finish(&mut self, report: ScoreReport) {
        info!(
            total_cost = report.total_cost,
            depth = report.depth,
            width = report.width,
            relative_score = ?report.relative_score,
            "game complete"
        );
        for observer in &mut self.observers {
            observer.on_game_complete(&report);
        }
    }

    /// Abandons whatever is running and returns to `Idle`. Tickets issued
    /// before the restart never match again.
    pub fn restart(&mut self) {
        self.epoch += 1;
        self.session = None;
        info!(session = self.epoch, "game restarted");
        for observer in &mut self.observers {
            observer.on_restart();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sibling_tree() -> GameState {
        // 0 ── 1 ── 3, 4
        //   └─ 2
        GameState::from_parent_layers(&[vec![0, 0], vec![1, 1]]).unwrap()
    }

    #[test]
    fn starts_idle() {
        let controller = TraversalController::with_seed(0);
        assert_eq!(controller.phase(), Phase::Idle);
        assert_eq!(controller.current_layer(), None);
        assert!(controller.history().is_empty());
    }

    #[test]
    fn ticket_session_changes_on_restart() {
        let mut controller = TraversalController::with_seed(0);
        controller.start_with_tree(sibling_tree()).unwrap();
        let first = controller.attempt_move(1).unwrap().ticket;

        controller.restart();
        controller.start_with_tree(sibling_tree()).unwrap();
        let second = controller.attempt_move(1).unwrap().ticket;

        assert_eq!(first.move_number, second.move_number);
        assert_ne!(first.session, second.session);
        assert_eq!(controller.complete_lock_window_for(first), LockRelease::Ignored);
        assert!(controller.is_locked());
    }

    #[test]
    fn tick_short_of_the_window_keeps_the_lock() {
        let mut controller =
            TraversalController::with_seed(0).with_lock_window(Duration::from_millis(100));
        controller.start_with_tree(sibling_tree()).unwrap();
        controller.attempt_move(1).unwrap();

        assert_eq!(controller.tick(Duration::from_millis(60)), LockRelease::Ignored);
        assert!(controller.is_locked());
        assert_eq!(controller.snapshot().lock_remaining_ms, Some(40));

        assert_eq!(
            controller.tick(Duration::from_millis(60)),
            LockRelease::Resumed { current_layer: 2 }
        );
        assert_eq!(controller.phase(), Phase::AwaitingMove);
    }
}
