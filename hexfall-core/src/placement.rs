//! Enumeration of resting placements
//!
//! For a unit shape, the set of every rotation and board-aligned translation that keeps
//! all members on the board does not depend on which cells are filled, so it is
//! computed once per shape and reused for the rest of the game. The board-dependent part
//! is the lockable filter: configurations that are free and have at least one action
//! that would lock them.

use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::game::GameState;
use crate::hex::{Cell, Turn};
use crate::unit::UnitId;

/// Memoised placement generator, owned by one solver run
#[derive(Debug, Default)]
pub struct PlacementEnumerator {
    possible: FxHashMap<UnitId, Rc<[UnitId]>>,
}

impl PlacementEnumerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of shapes with a cached placement set
    pub fn cached_shapes(&self) -> usize {
        self.possible.len()
    }

    /// Every distinct on-board configuration of `shape`, in generation order
    pub fn possible(&mut self, game: &mut GameState, shape: UnitId) -> Rc<[UnitId]> {
        if let Some(cached) = self.possible.get(&shape) {
            return Rc::clone(cached);
        }
        let (width, height) = (game.board().width(), game.board().height());
        let units = game.units_mut();
        let mut seen = FxHashSet::default();
        let mut placements = Vec::new();
        for steps in 0..6 {
            let rotated = units.rotate_steps(shape, Turn::Cw, steps);
            for row in 0..height {
                for col in 0..width {
                    let candidate = units.to_position_nw(rotated, Cell::new(col, row));
                    let unit = units.get(candidate);
                    let on_board = unit.east < width && unit.south < height;
                    if on_board && seen.insert(candidate) {
                        placements.push(candidate);
                    }
                }
            }
        }
        tracing::debug!(shape = shape.index(), placements = placements.len(), "placements enumerated");
        let placements: Rc<[UnitId]> = placements.into();
        self.possible.insert(shape, Rc::clone(&placements));
        placements
    }

    /// Free configurations of `shape` from which some action locks
    pub fn lockable(&mut self, game: &mut GameState, shape: UnitId) -> Vec<UnitId> {
        let possible = self.possible(game, shape);
        possible
            .iter()
            .copied()
            .filter(|&u| game.is_valid(u) && game.moves_from(u).any_lock())
            .collect()
    }
}
