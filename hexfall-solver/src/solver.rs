//! The solver capability shared by every strategy
//!
//! Level 4 - Interfaces and utilities

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use hexfall_core::{Action, GameError, GameState};
use thiserror::Error;

/// Errors a solver run can end with
#[derive(Debug, Error)]
pub enum SolveError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error("run cancelled")]
    Cancelled,

    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Plays one game to its end, returning the commands it applied.
///
/// Implementations apply every returned action to `game` as they go, so on return the
/// game holds the final board and score.
pub trait Solver {
    fn name(&self) -> &'static str;

    fn solve(&mut self, game: &mut GameState, cancel: &CancelToken) -> Result<Vec<Action>, SolveError>;
}

/// Cooperative cancellation shared by a batch of runs.
///
/// Solvers check it between turns only; a search in progress always runs to completion.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that fires once `budget` has elapsed from now
    pub fn with_deadline(budget: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + budget),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::Relaxed) {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.cancel();
                true
            }
            _ => false,
        }
    }

    /// `Err(Cancelled)` once the token has fired
    pub fn check(&self) -> Result<(), SolveError> {
        if self.is_cancelled() {
            Err(SolveError::Cancelled)
        } else {
            Ok(())
        }
    }
}
