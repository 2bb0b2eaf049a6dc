//! Error types for the game engine

use crate::unit::Action;

/// Errors raised by game construction and state transitions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The action would move the active unit onto a footprint it already occupied
    #[error("illegal move {action:?}: footprint already visited by the active unit")]
    IllegalMove { action: Action },

    #[error("no active unit: the game has ended")]
    NoActiveUnit,

    #[error("unit catalog is empty")]
    EmptyCatalog,

    #[error("cell ({col}, {row}) lies outside the board")]
    InvalidCell { col: i32, row: i32 },

    #[error("unit {index} in the catalog has no members")]
    EmptyUnit { index: usize },

    #[error("invalid board size {width}x{height}")]
    InvalidSize { width: i32, height: i32 },

    #[error("seed index {index} out of range ({count} seeds)")]
    InvalidSeedIndex { index: usize, count: usize },
}
