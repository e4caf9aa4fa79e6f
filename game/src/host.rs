use std::time::Duration;

use engine::{Dimensions, NodeId, Result};
use serde::{Deserialize, Serialize};

use crate::controller::{SessionSnapshot, TraversalController};
use crate::events::{LockRelease, MoveApplied};
use crate::lock_window::LockTicket;

/// Everything an input, timing or rendering collaborator can ask of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum SessionCommand {
    Start { width: i64, depth: i64 },
    Move { node: NodeId },
    CompleteLock,
    CompleteLockFor { ticket: LockTicket },
    Tick { ms: u64 },
    Restart,
    GetSnapshot,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SessionResponse {
    State {
        snapshot: SessionSnapshot,
    },
    Moved {
        event: MoveApplied,
        snapshot: SessionSnapshot,
    },
    Released {
        release: LockRelease,
        snapshot: SessionSnapshot,
    },
}

impl SessionResponse {
    pub fn snapshot(&self) -> &SessionSnapshot {
        match self {
            SessionResponse::State { snapshot }
            | SessionResponse::Moved { snapshot, .. }
            | SessionResponse::Released { snapshot, .. } => snapshot,
        }
    }
}

/// Command dispatcher in front of a single [`TraversalController`].
#[derive(Debug)]
pub struct SessionHost {
    controller: TraversalController,
}

impl SessionHost {
    pub fn new(controller: TraversalController) -> Self {
        Self { controller }
    }

    pub fn handle(&mut self, command: SessionCommand) -> Result<SessionResponse> {
        match command {
            SessionCommand::Start { width, depth } => {
                let dims = Dimensions::from_signed(width, depth)?;
                self.controller.start_game(dims.width(), dims.depth())?;
                Ok(self.state())
            }
            SessionCommand::Move { node } => {
                let event = self.controller.attempt_move(node)?;
                Ok(SessionResponse::Moved {
                    event,
                    snapshot: self.controller.snapshot(),
                })
            }
            SessionCommand::CompleteLock => {
                let release = self.controller.complete_lock_window();
                Ok(self.released(release))
            }
            SessionCommand::CompleteLockFor { ticket } => {
                let release = self.controller.complete_lock_window_for(ticket);
                Ok(self.released(release))
            }
            SessionCommand::Tick { ms } => {
                let release = self.controller.tick(Duration::from_millis(ms));
                Ok(self.released(release))
            }
            SessionCommand::Restart => {
                self.controller.restart();
                Ok(self.state())
            }
            SessionCommand::GetSnapshot => Ok(self.state()),
        }
    }

    pub fn controller(&self) -> &TraversalController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut TraversalController {
        &mut self.controller
    }

    fn state(&self) -> SessionResponse {
        SessionResponse::State {
            snapshot: self.controller.snapshot(),
        }
    }

    fn released(&self, release: LockRelease) -> SessionResponse {
        SessionResponse::Released {
            release,
            snapshot: self.controller.snapshot(),
        }
    }
}
