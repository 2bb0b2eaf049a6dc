//! Backtracking solver - bounded depth-first search per unit
//!
//! Level 2 - Phase-level implementation
//!
//! For each spawned unit, move sequences are explored depth first with an explicit stack.
//! Every locking move found is a leaf, rated by the points the lock would earn with a
//! small bonus for resting low. The best leaf sequence is then played.

use hexfall_core::{Action, GameState, MoveResult, UnitId};
use rustc_hash::FxHashSet;

use crate::solver::{CancelToken, SolveError, Solver};

/// Falling moves first, so the search reaches resting positions quickly
const PREFERENCE: [Action; 6] = [
    Action::SE,
    Action::SW,
    Action::E,
    Action::W,
    Action::CW,
    Action::CCW,
];

/// One configuration on the current search path
struct Frame {
    unit: UnitId,
    /// Index into `PREFERENCE` of the next action to try
    next: usize,
}

#[derive(Clone, Debug)]
struct Leaf {
    value: f64,
    actions: Vec<Action>,
}

/// Depth-limited search solver
pub struct BacktrackSolver {
    node_budget: usize,
    max_depth: usize,
}

impl BacktrackSolver {
    pub fn new(node_budget: usize, max_depth: usize) -> Self {
        Self {
            node_budget: node_budget.max(1),
            max_depth: max_depth.max(1),
        }
    }

    /// Best locking sequence for the active unit within the node budget
    fn search(&self, game: &mut GameState, root: UnitId) -> Option<Leaf> {
        let mut on_path: FxHashSet<UnitId> = game.visited_set().clone();
        let mut stack = vec![Frame { unit: root, next: 0 }];
        let mut actions: Vec<Action> = Vec::new();
        let mut best: Option<Leaf> = None;
        let mut expanded = 0usize;

        while let Some(frame) = stack.last_mut() {
            if frame.next == PREFERENCE.len() || expanded >= self.node_budget {
                let done = frame.unit;
                stack.pop();
                if done != root {
                    on_path.remove(&done);
                }
                actions.pop();
                continue;
            }
            let unit = frame.unit;
            let action = PREFERENCE[frame.next];
            frame.next += 1;
            expanded += 1;

            match game.classify_with(unit, action, &on_path) {
                (MoveResult::Ok, next) => {
                    if stack.len() <= self.max_depth {
                        on_path.insert(next);
                        actions.push(action);
                        stack.push(Frame { unit: next, next: 0 });
                    }
                }
                (MoveResult::Lock, _) => {
                    let value = leaf_value(game, unit);
                    if best.as_ref().map_or(true, |b| value > b.value) {
                        let mut sequence = actions.clone();
                        sequence.push(action);
                        best = Some(Leaf {
                            value,
                            actions: sequence,
                        });
                    }
                }
                (MoveResult::Error, _) => {}
            }
        }
        tracing::trace!(expanded, found = best.is_some(), "backtrack search");
        best
    }
}

/// Points for locking `unit` now, nudged towards lower rows
fn leaf_value(game: &GameState, unit: UnitId) -> f64 {
    let points = game.preview_lock(unit).total() as f64;
    let u = game.unit(unit);
    let rows: i32 = u.members().iter().map(|m| m.row).sum();
    let downness = rows as f64 / (u.len().max(1) as f64 * game.board().height() as f64);
    points + downness / (1.0 + points)
}

impl Solver for BacktrackSolver {
    fn name(&self) -> &'static str {
        "backtrack"
    }

    fn solve(&mut self, game: &mut GameState, cancel: &CancelToken) -> Result<Vec<Action>, SolveError> {
        let mut commands = Vec::new();
        while let Some(active) = game.active() {
            cancel.check()?;
            match self.search(game, active) {
                Some(leaf) => {
                    for &action in &leaf.actions {
                        game.apply(action)?;
                    }
                    commands.extend(leaf.actions);
                }
                None => {
                    // Nothing locks within reach: step down and search again from there
                    let Some(moves) = game.moves() else { break };
                    let step = PREFERENCE
                        .iter()
                        .copied()
                        .find(|&a| moves.get(a).0 != MoveResult::Error);
                    let Some(action) = step else { break };
                    game.apply(action)?;
                    commands.push(action);
                }
            }
        }
        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexfall_core::{Board, Cell, EndReason};

    fn game(width: i32, height: i32, max_units: u32) -> GameState {
        let bar = (Cell::new(0, 0), vec![Cell::new(0, 0), Cell::new(1, 0)]);
        GameState::new(Board::new(width, height).unwrap(), &[bar], max_units, 0).unwrap()
    }

    #[test]
    fn test_search_prefers_line_clear() {
        // Bottom row has a two-cell gap the domino can fill
        let filled = [Cell::new(0, 3), Cell::new(1, 3)];
        let bar = (Cell::new(0, 0), vec![Cell::new(0, 0), Cell::new(1, 0)]);
        let board = Board::with_filled(4, 4, &filled).unwrap();
        let mut game = GameState::new(board, &[bar], 1, 0).unwrap();
        let solver = BacktrackSolver::new(100_000, 32);
        let root = game.active().unwrap();
        let leaf = solver.search(&mut game, root).expect("some lock reachable");
        assert!(leaf.value > 100.0, "value {}", leaf.value);

        let report = game.replay(&leaf.actions).unwrap();
        assert_eq!(report.lines_cleared, 1);
    }

    #[test]
    fn test_backtrack_finishes_game() {
        let mut played = game(5, 6, 4);
        let fresh = played.clone();
        let mut solver = BacktrackSolver::new(20_000, 24);
        let commands = solver.solve(&mut played, &CancelToken::new()).unwrap();
        assert_eq!(played.end_reason(), Some(EndReason::SourceExhausted));
        let mut replay = fresh;
        assert_eq!(replay.replay(&commands).unwrap().score, played.score());
    }

    #[test]
    fn test_tiny_budget_still_progresses() {
        let mut played = game(5, 6, 2);
        let mut solver = BacktrackSolver::new(1, 1);
        solver.solve(&mut played, &CancelToken::new()).unwrap();
        assert!(played.is_over());
    }
}
