//! HEXFALL Core - Game engine and placement search
//!
//! This crate provides the core logic for the hex falling-unit puzzle:
//! - Hex geometry (odd-r offset cells, cube math, rotations)
//! - Units interned by footprint, with cached action results
//! - Board with incremental column ceilings and row clearing
//! - Game state machine, deterministic unit source and scoring
//! - Placement enumeration, placement evaluation and A* path search

pub mod hex;
pub mod unit;
pub mod board;
pub mod rng;
pub mod game;
pub mod eval;
pub mod search;
pub mod placement;
pub mod problem;
pub mod error;

// Re-exports for convenient access
pub use hex::{Cell, Direction, Hex, Turn};
pub use unit::{Action, Footprint, Unit, UnitId, UnitTable};
pub use board::Board;
pub use rng::SourceRng;
pub use game::{EndReason, GameState, LockReport, MoveResult, MoveSet, ReplayReport, Step};
pub use eval::{PlacementScore, ScoreWeights, Scorer};
pub use search::{astar, find_path, Path, SearchSpace, UnitSearch};
pub use placement::PlacementEnumerator;
pub use problem::{Problem, Solution, UnitSpec};
pub use error::GameError;
