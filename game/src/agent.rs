use engine::{Error, IllegalMoveReason, NodeId, Result, ScoreReport};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::controller::{Phase, TraversalController};
use crate::events::LockRelease;

/// Headless move pickers used by the CLI and by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    /// Leftmost node of the open layer.
    First,
    /// Cheapest next step; ties go to the lowest id.
    Greedy,
    Random,
}

impl Strategy {
    pub fn choose<R: Rng>(self, controller: &TraversalController, rng: &mut R) -> Option<NodeId> {
        let state = controller.state()?;
        let agent = controller.agent_node()?.id;
        let layer = state.layer(controller.current_layer()?)?;

        match self {
            Strategy::First => layer.first().copied(),
            Strategy::Random => layer.choose(rng).copied(),
            Strategy::Greedy => layer
                .iter()
                .filter_map(|&id| state.distance(agent, id).ok().map(|cost| (cost, id)))
                .min()
                .map(|(_, id)| id),
        }
    }
}

/// Plays the running game to the end, closing each lock window as soon as the
/// move is accepted.
pub fn play_session<R: Rng>(
    controller: &mut TraversalController,
    strategy: Strategy,
    rng: &mut R,
) -> Result<ScoreReport> {
    loop {
        match controller.phase() {
            Phase::Idle => return Err(Error::illegal_move(IllegalMoveReason::NoActiveGame)),
            Phase::Complete => {
                return controller
                    .report()
                    .ok_or(Error::illegal_move(IllegalMoveReason::GameComplete));
            }
            Phase::Locked => {
                controller.complete_lock_window();
            }
            Phase::AwaitingMove => {
                let Some(target) = strategy.choose(controller, rng) else {
                    return Err(Error::illegal_move(IllegalMoveReason::NoActiveGame));
                };
                controller.attempt_move(target)?;
                if let LockRelease::Completed { report } = controller.complete_lock_window() {
                    return Ok(report);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::GameState;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn greedy_prefers_staying_in_the_subtree() {
        // 0 ── 1 ── 3 ── 6
        //   │    └─ 4 ── 5
        //   └─ 2
        let tree = GameState::from_parent_layers(&[vec![0, 0], vec![1, 1], vec![4, 3]]).unwrap();
        let mut controller = TraversalController::with_seed(0);
        controller.start_with_tree(tree).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(Strategy::Greedy.choose(&controller, &mut rng), Some(1));
        controller.attempt_move(1).unwrap();
        controller.complete_lock_window();
        assert_eq!(Strategy::Greedy.choose(&controller, &mut rng), Some(3));
    }

    #[test]
    fn idle_controller_cannot_be_played() {
        let mut controller = TraversalController::with_seed(0);
        let mut rng = StdRng::seed_from_u64(0);
        let err = play_session(&mut controller, Strategy::First, &mut rng).unwrap_err();
        assert_eq!(err, Error::illegal_move(IllegalMoveReason::NoActiveGame));
    }
}
