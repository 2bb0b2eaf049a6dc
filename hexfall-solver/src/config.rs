//! Configuration types for solving
//!
//! Level 4 - Utilities and configuration

use std::time::Duration;

use clap::ValueEnum;
use hexfall_core::ScoreWeights;
use serde::{Deserialize, Serialize};

use crate::backtrack::BacktrackSolver;
use crate::greedy::GreedySolver;
use crate::placement::PlacementSolver;
use crate::random::RandomSolver;
use crate::solver::Solver;

/// Solving strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// Enumerate resting placements, score them, path-find to the best reachable one
    #[default]
    Placement,
    /// Always take the move that ends lowest
    Greedy,
    /// Random legal moves
    Random,
    /// Depth-limited search over move sequences of each unit
    Backtrack,
}

/// Solver configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub kind: SolverKind,
    /// Candidates scored and searched per batch
    pub batch_size: usize,
    /// Placement evaluation weights
    pub weights: ScoreWeights,
    /// Add the orientation term to the path-finding heuristic
    pub rotation_term: bool,
    /// Base seed for the random solver, mixed with the source seed of each run
    pub seed: u64,
    /// Nodes expanded per unit by the backtracking solver
    pub node_budget: usize,
    /// Longest move sequence the backtracking solver explores
    pub max_depth: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            kind: SolverKind::Placement,
            batch_size: 100,
            weights: ScoreWeights::default(),
            rotation_term: true,
            seed: 42,
            node_budget: 200_000,
            max_depth: 64,
        }
    }
}

impl SolverConfig {
    /// Config for the given strategy with default parameters
    pub fn new(kind: SolverKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// Set placement weights
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set candidate batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set backtracking limits
    pub fn with_search_limits(mut self, node_budget: usize, max_depth: usize) -> Self {
        self.node_budget = node_budget;
        self.max_depth = max_depth;
        self
    }

    /// Build a fresh solver for one run
    pub fn build(&self, source_seed: u32) -> Box<dyn Solver> {
        match self.kind {
            SolverKind::Placement => Box::new(
                PlacementSolver::new(self.weights.clone())
                    .with_batch_size(self.batch_size)
                    .with_rotation_term(self.rotation_term),
            ),
            SolverKind::Greedy => Box::new(GreedySolver::new()),
            SolverKind::Random => Box::new(RandomSolver::new(self.seed ^ source_seed as u64)),
            SolverKind::Backtrack => Box::new(BacktrackSolver::new(self.node_budget, self.max_depth)),
        }
    }
}

/// Configuration for a batch of runs
#[derive(Clone, Debug, Default)]
pub struct RunConfig {
    pub solver: SolverConfig,
    /// Worker threads (0 = one per core)
    pub cores: usize,
    /// Wall-clock budget for the whole batch
    pub time_limit: Option<Duration>,
    /// Power phrases substituted into every solution, in order
    pub phrases: Vec<String>,
    /// Tag copied into every solution
    pub tag: Option<String>,
}

impl RunConfig {
    pub fn new(solver: SolverConfig) -> Self {
        Self {
            solver,
            ..Default::default()
        }
    }

    /// Set worker count
    pub fn with_cores(mut self, cores: usize) -> Self {
        self.cores = cores;
        self
    }

    /// Set wall-clock budget
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Set power phrases
    pub fn with_phrases(mut self, phrases: Vec<String>) -> Self {
        self.phrases = phrases;
        self
    }

    /// Set solution tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}
