pub mod agent;
pub mod api;
pub mod controller;
pub mod events;
pub mod host;
pub mod leaderboard;
pub mod lock_window;
pub mod logging;
pub mod settings;

pub use controller::{Phase, SessionSnapshot, TraversalController};
pub use events::{LockRelease, MoveApplied, TraversalObserver};
