//! Placement evaluation
//!
//! A candidate resting configuration is overlaid on the board (without mutating it) and
//! rated by a weighted sum of shape features. Every term is oriented so that higher is
//! better.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::hex::Cell;
use crate::unit::Unit;

/// Heuristic weights for placement evaluation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Per row completed by the placement
    pub filled_rows: f64,
    /// Low average column height
    pub average_height: f64,
    /// Low maximum column height
    pub max_height: f64,
    /// Few holes under the ceiling
    pub filledness: f64,
    /// Small height differences between neighbouring columns
    pub evenness: f64,
    /// Placement sits low on the board
    pub downness: f64,
    /// Fewer filled/empty transitions after placing
    pub connectedness: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            filled_rows: 10.0,
            average_height: 1.0,
            max_height: 1.0,
            filledness: 1.0,
            evenness: 1.0,
            downness: 1.0,
            connectedness: 1.0,
        }
    }
}

/// Individual features of one placement
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlacementScore {
    pub filled_rows: u32,
    pub average_height: f64,
    pub max_height: f64,
    pub filledness: f64,
    pub evenness: f64,
    pub downness: f64,
    pub connectedness: f64,
    pub total: f64,
}

/// Scores candidates against one board snapshot.
///
/// Board-wide quantities that do not depend on the candidate are computed once.
pub struct Scorer<'a> {
    board: &'a Board,
    weights: &'a ScoreWeights,
    transitions_before: i64,
}

impl<'a> Scorer<'a> {
    pub fn new(board: &'a Board, weights: &'a ScoreWeights) -> Self {
        let transitions_before = count_transitions(board, &[]);
        Self {
            board,
            weights,
            transitions_before,
        }
    }

    /// Rate a resting configuration
    pub fn score(&self, unit: &Unit) -> PlacementScore {
        let board = self.board;
        let members = unit.members();
        let w = board.width();
        let h = board.height();
        let fh = h as f64;

        let filled_at = |cell: Cell| board.is_filled(cell) || members.contains(&cell);

        let filled_rows = (unit.north.max(0)..=unit.south.min(h - 1))
            .filter(|&row| (0..w).all(|col| filled_at(Cell::new(col, row))))
            .count() as u32;

        let mut ceiling = board.ceilings().to_vec();
        for m in members {
            if board.contains(*m) {
                let c = &mut ceiling[m.col as usize];
                *c = (*c).min(m.row);
            }
        }
        let heights: Vec<i32> = ceiling.iter().map(|&c| h - c).collect();
        let max_height = heights.iter().copied().max().unwrap_or(0) as f64;
        let sum_height: i32 = heights.iter().sum();
        let average_height = sum_height as f64 / w as f64;

        let jaggedness: i32 = heights.windows(2).map(|p| (p[0] - p[1]).abs()).sum();
        let max_jaggedness = board.area() as f64 / 2.0;

        let mut holes = 0i32;
        for col in 0..w {
            let ceil = ceiling[col as usize];
            holes += (ceil..h).filter(|&row| !filled_at(Cell::new(col, row))).count() as i32;
        }

        let transitions_after = count_transitions(board, members);
        let connectedness = (self.transitions_before - transitions_after) as f64;

        // Share of the area under the skyline that is actually filled
        let filledness = if sum_height > 0 {
            (sum_height - holes) as f64 / sum_height as f64
        } else {
            1.0
        };
        let evenness = (max_jaggedness - jaggedness as f64) / max_jaggedness;
        let average_height = (fh - average_height) / fh;
        let max_height = (fh - max_height) / fh;
        let row_sum: i32 = members.iter().map(|m| m.row).sum();
        let downness = row_sum as f64 / (members.len().max(1) as f64 * fh);

        let wt = self.weights;
        let total = wt.filled_rows * filled_rows as f64
            + wt.average_height * average_height
            + wt.max_height * max_height
            + wt.filledness * filledness
            + wt.evenness * evenness
            + wt.downness * downness
            + wt.connectedness * connectedness;

        PlacementScore {
            filled_rows,
            average_height,
            max_height,
            filledness,
            evenness,
            downness,
            connectedness,
            total,
        }
    }
}

/// Filled/empty changes in a row-major scan, starting from "empty"
fn count_transitions(board: &Board, overlay: &[Cell]) -> i64 {
    let mut last = false;
    let mut changes = 0;
    for row in 0..board.height() {
        for col in 0..board.width() {
            let cell = Cell::new(col, row);
            let filled = board.is_filled(cell) || overlay.contains(&cell);
            if filled != last {
                changes += 1;
            }
            last = filled;
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::UnitTable;

    fn place(table: &mut UnitTable, cells: &[(i32, i32)]) -> crate::unit::UnitId {
        let members: Vec<Cell> = cells.iter().map(|&(c, r)| Cell::new(c, r)).collect();
        table.intern(members[0], members)
    }

    #[test]
    fn test_completed_row_counts() {
        let board = Board::with_filled(3, 4, &[Cell::new(0, 3)]).unwrap();
        let weights = ScoreWeights::default();
        let scorer = Scorer::new(&board, &weights);
        let mut table = UnitTable::new();
        let u = place(&mut table, &[(1, 3), (2, 3)]);
        let score = scorer.score(table.get(u));
        assert_eq!(score.filled_rows, 1);
        assert!(score.total > 10.0);
    }

    #[test]
    fn test_lower_placement_scores_higher() {
        let board = Board::new(5, 6).unwrap();
        let weights = ScoreWeights::default();
        let scorer = Scorer::new(&board, &weights);
        let mut table = UnitTable::new();
        let low = place(&mut table, &[(1, 5), (2, 5)]);
        let high = place(&mut table, &[(1, 2), (2, 2)]);
        let low_score = scorer.score(table.get(low));
        let high_score = scorer.score(table.get(high));
        assert!(low_score.downness > high_score.downness);
        assert!(low_score.total > high_score.total);
    }

    #[test]
    fn test_holes_reduce_filledness() {
        let board = Board::new(4, 4).unwrap();
        let weights = ScoreWeights::default();
        let scorer = Scorer::new(&board, &weights);
        let mut table = UnitTable::new();
        let flat = place(&mut table, &[(0, 3), (1, 3)]);
        let floating = place(&mut table, &[(0, 2), (1, 2)]);
        let flat_score = scorer.score(table.get(flat));
        let floating_score = scorer.score(table.get(floating));
        assert_eq!(flat_score.filledness, 1.0);
        assert!(floating_score.filledness < 1.0);
    }

    #[test]
    fn test_contiguous_placement_is_more_connected() {
        let board = Board::with_filled(6, 4, &[Cell::new(0, 3), Cell::new(1, 3)]).unwrap();
        let weights = ScoreWeights::default();
        let scorer = Scorer::new(&board, &weights);
        let mut table = UnitTable::new();
        let adjacent = place(&mut table, &[(2, 3), (3, 3)]);
        let apart = place(&mut table, &[(4, 3), (5, 3)]);
        let a = scorer.score(table.get(adjacent));
        let b = scorer.score(table.get(apart));
        assert!(a.connectedness > b.connectedness);
    }

    #[test]
    fn test_evenness_penalises_towers() {
        let board = Board::new(4, 6).unwrap();
        let weights = ScoreWeights::default();
        let scorer = Scorer::new(&board, &weights);
        let mut table = UnitTable::new();
        let flat = place(&mut table, &[(1, 5), (2, 5)]);
        let tower = place(&mut table, &[(1, 5), (1, 4)]);
        assert!(scorer.score(table.get(flat)).evenness > scorer.score(table.get(tower)).evenness);
    }

    #[test]
    fn test_weights_round_trip_with_defaults() {
        let weights: ScoreWeights = serde_json::from_str(r#"{"connectedness": 0.5}"#).unwrap();
        assert_eq!(weights.connectedness, 0.5);
        assert_eq!(weights.filled_rows, 10.0);
    }
}
