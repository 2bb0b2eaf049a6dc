//! Random solver - a baseline that wanders until it locks

use hexfall_core::{Action, GameState};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::solver::{CancelToken, SolveError, Solver};

/// Picks a random falling move, or a random locking move when none is left
pub struct RandomSolver {
    rng: ChaCha8Rng,
}

impl RandomSolver {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn choose(&mut self, game: &mut GameState) -> Option<Action> {
        let moves = game.moves()?;
        let falling: Vec<Action> = moves.ok().map(|(a, _)| a).collect();
        if let Some(&action) = falling.choose(&mut self.rng) {
            return Some(action);
        }
        let locking: Vec<Action> = moves.locking().collect();
        locking.choose(&mut self.rng).copied()
    }
}

impl Solver for RandomSolver {
    fn name(&self) -> &'static str {
        "random"
    }

    fn solve(&mut self, game: &mut GameState, cancel: &CancelToken) -> Result<Vec<Action>, SolveError> {
        let mut commands = Vec::new();
        while !game.is_over() {
            cancel.check()?;
            let Some(action) = self.choose(game) else {
                break;
            };
            game.apply(action)?;
            commands.push(action);
        }
        Ok(commands)
    }
}
