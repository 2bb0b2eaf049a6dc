//! Greedy solver - always move as low as possible
//!
//! Level 3 - Step-level implementation

use hexfall_core::{Action, GameState, UnitId};

use crate::solver::{CancelToken, SolveError, Solver};

/// Takes the falling move that ends lowest; locks only when nothing keeps falling
#[derive(Debug, Default)]
pub struct GreedySolver;

impl GreedySolver {
    pub fn new() -> Self {
        Self
    }

    /// Next action for the active unit, `None` once the game has ended
    fn choose(game: &mut GameState) -> Option<Action> {
        let moves = game.moves()?;
        let mut best: Option<(i32, Action)> = None;
        for (action, next) in moves.ok() {
            let depth = row_sum(game, next);
            // Strictly greater keeps the earlier action on ties
            if best.map_or(true, |(d, _)| depth > d) {
                best = Some((depth, action));
            }
        }
        best.map(|(_, a)| a).or_else(|| moves.first_lock())
    }
}

/// Sum of member rows; every configuration of a unit has the same member count
fn row_sum(game: &GameState, unit: UnitId) -> i32 {
    game.unit(unit).members().iter().map(|m| m.row).sum()
}

impl Solver for GreedySolver {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn solve(&mut self, game: &mut GameState, cancel: &CancelToken) -> Result<Vec<Action>, SolveError> {
        let mut commands = Vec::new();
        while !game.is_over() {
            cancel.check()?;
            let Some(action) = Self::choose(game) else {
                break;
            };
            game.apply(action)?;
            commands.push(action);
        }
        Ok(commands)
    }
}
