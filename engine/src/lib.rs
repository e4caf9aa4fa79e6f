//! Tree generation and path queries for the ultrametric traversal puzzle.
//!
//! A [`GameState`] is a random rooted tree, `width` nodes per layer, `depth`
//! layers below the root. Moving between two nodes costs the number of edges
//! on the path through their lowest common ancestor.

pub mod error;
pub mod score;
pub mod tree;

pub use error::{Error, IllegalMoveReason, Result};
pub use score::{ScoreReport, ScoringPolicy};
pub use tree::{Dimensions, Edge, GameState, MAX_NODES, Node, NodeId};
