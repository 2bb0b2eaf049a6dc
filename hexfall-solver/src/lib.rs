//! HEXFALL Solver - Strategies and batch running
//!
//! This crate plays games to completion:
//! - The `Solver` capability and its strategies (placement, greedy, random, backtrack)
//! - Per-seed runs on a worker pool with a wall-clock budget
//! - Command alphabet and power phrase splicing
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run_problems (orchestration)
//! - Level 2: PlacementSolver, BacktrackSolver (phases)
//! - Level 3: GreedySolver, per-seed steps
//! - Level 4: commands, configuration

mod backtrack;
mod commands;
mod config;
mod greedy;
mod placement;
mod random;
mod runner;
mod solver;

pub use backtrack::BacktrackSolver;
pub use commands::{action_for, apply_phrases, command_char, decode, encode, substitute, CommandError};
pub use config::{RunConfig, SolverConfig, SolverKind};
pub use greedy::GreedySolver;
pub use placement::PlacementSolver;
pub use random::RandomSolver;
pub use runner::{run_problems, run_problems_with_callback, run_seed, RunResult, FAILED_SOLUTION};
pub use solver::{CancelToken, SolveError, Solver};
