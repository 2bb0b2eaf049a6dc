//! Placement solver - choose a resting place, then find a way there
//!
//! Level 2 - Phase-level implementation
//!
//! Each turn enumerates the lockable configurations of the active shape, scores them in
//! batches (deepest rows first), and path-finds to the best reachable one. The route is
//! replayed move by move and a locking action finishes the turn.

use std::cmp::Reverse;

use hexfall_core::{find_path, Action, GameState, PlacementEnumerator, ScoreWeights, Scorer, UnitId};
use rustc_hash::FxHashSet;

use crate::solver::{CancelToken, SolveError, Solver};

/// Route to a chosen placement
#[derive(Clone, Debug)]
struct Plan {
    target: UnitId,
    score: f64,
    route: Vec<Action>,
}

/// Enumerate-score-pathfind solver
pub struct PlacementSolver {
    weights: ScoreWeights,
    batch_size: usize,
    rotation_term: bool,
    enumerator: PlacementEnumerator,
    /// (spawn shape, candidate) pairs with no route, valid until the board loses a line
    unreachable: FxHashSet<(UnitId, UnitId)>,
}

impl PlacementSolver {
    pub fn new(weights: ScoreWeights) -> Self {
        Self {
            weights,
            batch_size: 100,
            rotation_term: true,
            enumerator: PlacementEnumerator::new(),
            unreachable: FxHashSet::default(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_rotation_term(mut self, enabled: bool) -> Self {
        self.rotation_term = enabled;
        self
    }

    /// Best reachable placement for the active unit
    fn plan(&mut self, game: &mut GameState, shape: UnitId) -> Option<Plan> {
        let mut candidates = self.enumerator.lockable(game, shape);
        // Stable: generation order breaks ties
        candidates.sort_by_key(|&u| Reverse(game.unit(u).north));
        tracing::debug!(candidates = candidates.len(), "turn start");

        for batch in candidates.chunks(self.batch_size) {
            let mut scored: Vec<(f64, UnitId)> = {
                let scorer = Scorer::new(game.board(), &self.weights);
                batch
                    .iter()
                    .map(|&u| (scorer.score(game.unit(u)).total, u))
                    .collect()
            };
            scored.sort_by(|a, b| b.0.total_cmp(&a.0));

            for (score, target) in scored {
                if self.unreachable.contains(&(shape, target)) {
                    continue;
                }
                match find_path(game, target, self.rotation_term) {
                    Some(route) => return Some(Plan { target, score, route }),
                    None => {
                        self.unreachable.insert((shape, target));
                    }
                }
            }
        }
        None
    }

    /// Replay a plan and lock the unit at its target
    fn execute(&mut self, game: &mut GameState, plan: &Plan, commands: &mut Vec<Action>) -> Result<bool, SolveError> {
        for &action in &plan.route {
            game.apply(action)?;
            commands.push(action);
        }
        let Some(lock) = game.moves().and_then(|m| m.first_lock()) else {
            tracing::warn!(placement = plan.target.index(), "placement has no locking move");
            return Ok(false);
        };
        game.apply(lock)?;
        commands.push(lock);
        if game.last_lines_cleared() > 0 {
            tracing::trace!(
                entries = self.unreachable.len(),
                "lines cleared, unreachable cache dropped"
            );
            self.unreachable.clear();
        }
        tracing::trace!("board after lock:\n{}", game.board().render(&[]));
        Ok(true)
    }
}

impl Solver for PlacementSolver {
    fn name(&self) -> &'static str {
        "placement"
    }

    fn solve(&mut self, game: &mut GameState, cancel: &CancelToken) -> Result<Vec<Action>, SolveError> {
        // Unit ids belong to the game's own table
        self.enumerator = PlacementEnumerator::new();
        self.unreachable.clear();

        let mut commands = Vec::new();
        while let Some(shape) = game.active_shape() {
            cancel.check()?;
            let Some(plan) = self.plan(game, shape) else {
                tracing::debug!(spawned = game.spawned(), "no reachable placement");
                break;
            };
            tracing::debug!(
                placement = plan.target.index(),
                score = plan.score,
                moves = plan.route.len(),
                "placement chosen"
            );
            if !self.execute(game, &plan, &mut commands)? {
                break;
            }
        }
        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexfall_core::{Board, Cell, Direction, EndReason, Footprint};

    fn bar_game(width: i32, height: i32, max_units: u32) -> GameState {
        let bar = (Cell::new(0, 0), vec![Cell::new(0, 0), Cell::new(1, 0)]);
        GameState::new(Board::new(width, height).unwrap(), &[bar], max_units, 0).unwrap()
    }

    fn cell_game(board: Board, max_units: u32) -> GameState {
        let cell = (Cell::new(0, 0), vec![Cell::new(0, 0)]);
        GameState::new(board, &[cell], max_units, 0).unwrap()
    }

    /// Single-cell configuration at `cell`
    fn cell_unit(game: &GameState, cell: Cell) -> UnitId {
        game.units().find(&Footprint::new(cell, [cell])).unwrap()
    }

    #[test]
    fn test_plays_every_unit() {
        let mut game = bar_game(6, 6, 5);
        let mut solver = PlacementSolver::new(ScoreWeights::default());
        let commands = solver.solve(&mut game, &CancelToken::new()).unwrap();
        assert!(!commands.is_empty());
        assert_eq!(game.end_reason(), Some(EndReason::SourceExhausted));
        assert!(game.score() >= 10);
    }

    #[test]
    fn test_commands_replay_to_same_score() {
        let mut game = bar_game(6, 8, 6);
        let fresh = game.clone();
        let mut solver = PlacementSolver::new(ScoreWeights::default());
        let commands = solver.solve(&mut game, &CancelToken::new()).unwrap();

        let mut replay = fresh;
        let report = replay.replay(&commands).unwrap();
        assert_eq!(report.score, game.score());
        assert!(report.ended);
    }

    #[test]
    fn test_clears_lines_on_narrow_board() {
        // Two dominoes fill a 4-wide row
        let mut game = bar_game(4, 6, 8);
        let mut solver = PlacementSolver::new(ScoreWeights::default());
        solver.solve(&mut game, &CancelToken::new()).unwrap();
        assert!(game.score() > 8 * 2, "score {}", game.score());
    }

    #[test]
    fn test_cancelled_before_first_turn() {
        let mut game = bar_game(6, 6, 5);
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut solver = PlacementSolver::new(ScoreWeights::default());
        assert!(matches!(solver.solve(&mut game, &cancel), Err(SolveError::Cancelled)));
    }

    #[test]
    fn test_first_batch_is_deepest_row() {
        let mut game = bar_game(6, 6, 3);
        let shape = game.active_shape().unwrap();
        let mut solver = PlacementSolver::new(ScoreWeights::default()).with_batch_size(1);
        let plan = solver.plan(&mut game, shape).unwrap();
        assert_eq!(game.unit(plan.target).north, 5);
    }

    #[test]
    fn test_walled_off_candidate_is_cached() {
        // Bottom row full except a hole whose upper neighbours are filled
        let hole = Cell::new(2, 5);
        let mut filled: Vec<Cell> = [0, 1, 3, 4].iter().map(|&c| Cell::new(c, 5)).collect();
        filled.push(hole.step(Direction::NW));
        filled.push(hole.step(Direction::NE));
        let mut game = cell_game(Board::with_filled(5, 6, &filled).unwrap(), 3);
        let shape = game.active_shape().unwrap();
        let mut solver = PlacementSolver::new(ScoreWeights::default()).with_batch_size(1);

        let plan = solver.plan(&mut game, shape).unwrap();
        let hole_unit = cell_unit(&game, hole);
        assert_ne!(plan.target, hole_unit);
        assert!(solver.unreachable.contains(&(shape, hole_unit)));
        assert_eq!(solver.unreachable.len(), 1);

        // The next turn with this shape skips the hole without searching it again
        let plan = solver.plan(&mut game, shape).unwrap();
        assert_ne!(plan.target, hole_unit);
        assert_eq!(solver.unreachable.len(), 1);
    }

    #[test]
    fn test_cached_pair_is_skipped() {
        let mut game = bar_game(6, 6, 3);
        let shape = game.active_shape().unwrap();
        let mut solver = PlacementSolver::new(ScoreWeights::default()).with_batch_size(1);
        let first = solver.plan(&mut game, shape).unwrap();

        solver.unreachable.insert((shape, first.target));
        let second = solver.plan(&mut game, shape).unwrap();
        assert_ne!(second.target, first.target);
        assert_eq!(game.unit(second.target).north, 5);
    }

    #[test]
    fn test_line_clear_drops_cache() {
        let hole = Cell::new(1, 3);
        let board = Board::with_filled(3, 4, &[Cell::new(0, 3), Cell::new(2, 3)]).unwrap();
        let mut game = cell_game(board, 4);
        let shape = game.active_shape().unwrap();
        let mut solver = PlacementSolver::new(ScoreWeights::default()).with_batch_size(1);
        let mut commands = Vec::new();

        // Filling the hole clears the bottom row
        let plan = solver.plan(&mut game, shape).unwrap();
        assert_eq!(plan.target, cell_unit(&game, hole));
        solver.unreachable.insert((shape, shape));
        assert!(solver.execute(&mut game, &plan, &mut commands).unwrap());
        assert_eq!(game.last_lines_cleared(), 1);
        assert!(solver.unreachable.is_empty());

        // A lock that clears nothing keeps the cache
        solver.unreachable.insert((shape, shape));
        let plan = solver.plan(&mut game, shape).unwrap();
        assert!(solver.execute(&mut game, &plan, &mut commands).unwrap());
        assert_eq!(game.last_lines_cleared(), 0);
        assert!(solver.unreachable.contains(&(shape, shape)));
    }

    #[test]
    fn test_small_batches_still_find_placements() {
        let mut game = bar_game(6, 6, 4);
        let mut solver = PlacementSolver::new(ScoreWeights::default()).with_batch_size(1);
        solver.solve(&mut game, &CancelToken::new()).unwrap();
        assert_eq!(game.end_reason(), Some(EndReason::SourceExhausted));
    }
}
