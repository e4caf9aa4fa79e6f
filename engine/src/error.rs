use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tree::NodeId;

/// Why a move was refused. Refusals never mutate the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IllegalMoveReason {
    NoActiveGame,
    Locked,
    GameComplete,
    WrongLayer { expected: u32, actual: u32 },
}

impl std::fmt::Display for IllegalMoveReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IllegalMoveReason::NoActiveGame => write!(f, "no game is running"),
            IllegalMoveReason::Locked => write!(f, "a previous move is still animating"),
            IllegalMoveReason::GameComplete => write!(f, "the game is already complete"),
            IllegalMoveReason::WrongLayer { expected, actual } => {
                write!(f, "target is on layer {actual}, only layer {expected} is selectable")
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("illegal move: {reason}")]
    IllegalMove { reason: IllegalMoveReason },

    #[error("node {id} does not belong to the current tree")]
    UnknownNode { id: NodeId },

    #[error("a game is already in progress; restart it first")]
    AlreadyInProgress,
}

impl Error {
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            message: message.into(),
        }
    }

    pub fn illegal_move(reason: IllegalMoveReason) -> Self {
        Error::IllegalMove { reason }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
