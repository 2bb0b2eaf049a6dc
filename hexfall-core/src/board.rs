//! Board: grid of filled cells with an incrementally maintained per-column ceiling

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::error::GameError;
use crate::hex::{circle, Cell, Direction};

/// Directions a unit can travel; a unit never moves north
const FALL_DIRECTIONS: [Direction; 4] = [Direction::E, Direction::W, Direction::SE, Direction::SW];

/// Hex board, row 0 at the top
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    width: i32,
    height: i32,
    /// Row-major filled flags
    cells: Vec<bool>,
    /// Topmost filled row per column, `height` for an empty column
    ceiling: Vec<i32>,
}

impl Board {
    /// Create an empty board
    pub fn new(width: i32, height: i32) -> Result<Self, GameError> {
        let area = match width.checked_mul(height) {
            Some(area) if width > 0 && height > 0 => area,
            _ => return Err(GameError::InvalidSize { width, height }),
        };
        Ok(Self {
            width,
            height,
            cells: vec![false; area as usize],
            ceiling: vec![height; width as usize],
        })
    }

    /// Create a board with the given cells filled
    pub fn with_filled(width: i32, height: i32, filled: &[Cell]) -> Result<Self, GameError> {
        let mut board = Self::new(width, height)?;
        for &cell in filled {
            if !board.contains(cell) {
                return Err(GameError::InvalidCell {
                    col: cell.col,
                    row: cell.row,
                });
            }
            board.fill_cell(cell);
        }
        Ok(board)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Number of cells on the board
    pub fn area(&self) -> i32 {
        self.width * self.height
    }

    #[inline]
    fn index(&self, cell: Cell) -> usize {
        (cell.row * self.width + cell.col) as usize
    }

    /// Whether `cell` lies on the board
    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.col >= 0 && cell.col < self.width && cell.row >= 0 && cell.row < self.height
    }

    /// Whether `cell` is on the board and filled
    #[inline]
    pub fn is_filled(&self, cell: Cell) -> bool {
        self.contains(cell) && self.cells[self.index(cell)]
    }

    /// Whether `cell` is on the board and empty
    #[inline]
    pub fn is_free(&self, cell: Cell) -> bool {
        self.contains(cell) && !self.cells[self.index(cell)]
    }

    /// Topmost filled row of `col`, or `height` if the column is empty
    pub fn ceiling(&self, col: i32) -> i32 {
        self.ceiling[col as usize]
    }

    pub fn ceilings(&self) -> &[i32] {
        &self.ceiling
    }

    /// Mark a cell filled. Off-board cells are ignored.
    pub fn fill_cell(&mut self, cell: Cell) {
        if !self.contains(cell) {
            return;
        }
        let idx = self.index(cell);
        self.cells[idx] = true;
        let c = &mut self.ceiling[cell.col as usize];
        *c = (*c).min(cell.row);
    }

    /// Fill every cell of a locked unit
    pub fn lock(&mut self, cells: &[Cell]) {
        for &cell in cells {
            self.fill_cell(cell);
        }
    }

    /// All columns of `row` filled
    pub fn filled_row(&self, row: i32) -> bool {
        let start = (row * self.width) as usize;
        self.cells[start..start + self.width as usize].iter().all(|&f| f)
    }

    /// Remove `row`, shifting everything above it down by one and emptying row 0
    pub fn clear_row(&mut self, row: i32) {
        let w = self.width as usize;
        let end = (row as usize + 1) * w;
        // Rotating the prefix right by one row moves rows 0..row down and brings the
        // cleared row to the top, where it is emptied.
        self.cells[..end].rotate_right(w);
        self.cells[..w].fill(false);

        for col in 0..self.width {
            let old = self.ceiling[col as usize];
            let new = if old < row {
                old + 1
            } else if old == row {
                self.scan_ceiling(col, row)
            } else {
                old
            };
            self.ceiling[col as usize] = new;
        }
    }

    fn scan_ceiling(&self, col: i32, from_row: i32) -> i32 {
        (from_row..self.height)
            .find(|&r| self.cells[(r * self.width + col) as usize])
            .unwrap_or(self.height)
    }

    /// Clear every full row, bottom-up. Returns the number of rows removed.
    pub fn clear_full_rows(&mut self) -> u32 {
        let mut cleared = 0;
        let mut row = self.height - 1;
        while row >= 0 {
            if self.filled_row(row) {
                self.clear_row(row);
                cleared += 1;
            } else {
                row -= 1;
            }
        }
        cleared
    }

    /// Number of filled cells
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|&&f| f).count()
    }

    /// Iterate filled cells in row-major order
    pub fn filled_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let w = self.width;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &f)| f)
            .map(move |(i, _)| Cell::new(i as i32 % w, i as i32 / w))
    }

    /// On-board cells within `distance` of some filled cell
    pub fn close_to_filled(&self, distance: u32, include_filled: bool) -> FxHashSet<Cell> {
        let mut close = FxHashSet::default();
        for filled in self.filled_cells() {
            if include_filled {
                close.insert(filled);
            }
            for radius in 1..=distance {
                close.extend(circle(filled, radius).into_iter().filter(|&c| self.contains(c)));
            }
        }
        close
    }

    /// Cells a falling unit could sweep from `from` without passing within
    /// `distance` of a filled cell (flood fill over E, W, SE, SW)
    pub fn reachable_cells(&self, from: Cell, distance: u32) -> FxHashSet<Cell> {
        let blocked = self.close_to_filled(distance, true);
        let mut reached = FxHashSet::default();
        if !self.contains(from) || blocked.contains(&from) {
            return reached;
        }
        let mut queue = VecDeque::from([from]);
        reached.insert(from);
        while let Some(cell) = queue.pop_front() {
            for d in FALL_DIRECTIONS {
                let next = cell.step(d);
                if self.contains(next) && !blocked.contains(&next) && reached.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        reached
    }

    /// ASCII picture: `*` filled, `@` overlay, `.` empty, odd rows indented
    pub fn render(&self, overlay: &[Cell]) -> String {
        let overlay: FxHashSet<Cell> = overlay.iter().copied().collect();
        let mut out = String::with_capacity(((self.width * 2 + 2) * self.height) as usize);
        for row in 0..self.height {
            if row % 2 == 1 {
                out.push(' ');
            }
            for col in 0..self.width {
                let cell = Cell::new(col, row);
                let ch = if overlay.contains(&cell) {
                    '@'
                } else if self.is_filled(cell) {
                    '*'
                } else {
                    '.'
                };
                out.push(ch);
                if col + 1 < self.width {
                    out.push(' ');
                }
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(list: &[(i32, i32)]) -> Vec<Cell> {
        list.iter().map(|&(c, r)| Cell::new(c, r)).collect()
    }

    fn brute_ceiling(board: &Board, col: i32) -> i32 {
        (0..board.height())
            .find(|&r| board.is_filled(Cell::new(col, r)))
            .unwrap_or(board.height())
    }

    #[test]
    fn test_filled_cell() {
        let board = Board::with_filled(5, 5, &cells(&[(1, 1), (1, 2)])).unwrap();
        assert!(board.is_filled(Cell::new(1, 1)));
        assert!(board.is_filled(Cell::new(1, 2)));
        assert!(!board.is_filled(Cell::new(2, 1)));
        assert!(!board.is_filled(Cell::new(-1, 1)));
        assert_eq!(board.ceiling(1), 1);
        assert_eq!(board.ceiling(0), 5);
    }

    #[test]
    fn test_invalid_filled_cell() {
        let err = Board::with_filled(3, 3, &cells(&[(3, 0)])).unwrap_err();
        assert_eq!(err, GameError::InvalidCell { col: 3, row: 0 });
        assert!(Board::new(0, 4).is_err());
    }

    #[test]
    fn test_filled_row() {
        let board = Board::with_filled(3, 3, &cells(&[(0, 1), (1, 1), (2, 1), (1, 2)])).unwrap();
        assert!(!board.filled_row(0));
        assert!(board.filled_row(1));
        assert!(!board.filled_row(2));
    }

    #[test]
    fn test_clear_row_shifts_down() {
        let mut board = Board::with_filled(5, 5, &cells(&[(0, 1), (0, 3)])).unwrap();
        board.clear_row(3);
        assert!(!board.is_filled(Cell::new(0, 1)));
        assert!(board.is_filled(Cell::new(0, 2)));
        assert!(!board.is_filled(Cell::new(0, 3)));
        assert_eq!(board.ceiling(0), 2);
    }

    #[test]
    fn test_clear_row_exposes_buried_cell() {
        // Column 0 has its topmost cell in the cleared row and another one below it
        let mut board = Board::with_filled(
            3,
            5,
            &cells(&[(0, 2), (1, 2), (2, 2), (0, 4)]),
        )
        .unwrap();
        assert_eq!(board.ceiling(0), 2);
        board.clear_row(2);
        assert_eq!(board.ceiling(0), 4);
        assert_eq!(board.ceiling(1), 5);
    }

    #[test]
    fn test_ceiling_matches_rescan() {
        let mut board = Board::new(4, 6).unwrap();
        let script: &[&[(i32, i32)]] = &[
            &[(0, 5), (1, 5), (2, 5)],
            &[(1, 3), (3, 4)],
            &[(3, 5)],
            &[(0, 4), (1, 4), (2, 4)],
            &[(2, 1), (0, 2)],
            &[(0, 3), (2, 3), (3, 3)],
        ];
        for step in script {
            board.lock(&cells(step));
            board.clear_full_rows();
            for col in 0..board.width() {
                assert_eq!(board.ceiling(col), brute_ceiling(&board, col), "col {}", col);
            }
        }
    }

    #[test]
    fn test_clear_full_rows_counts_adjacent_rows() {
        let mut filled = Vec::new();
        for col in 0..3 {
            filled.push(Cell::new(col, 3));
            filled.push(Cell::new(col, 4));
        }
        filled.push(Cell::new(1, 2));
        let mut board = Board::with_filled(3, 5, &filled).unwrap();
        assert_eq!(board.clear_full_rows(), 2);
        assert_eq!(board.filled_count(), 1);
        assert!(board.is_filled(Cell::new(1, 4)));
    }

    #[test]
    fn test_close_to_filled() {
        let board = Board::with_filled(5, 5, &cells(&[(2, 2)])).unwrap();
        let close = board.close_to_filled(1, false);
        assert_eq!(close.len(), 6);
        assert!(!close.contains(&Cell::new(2, 2)));
        let close = board.close_to_filled(1, true);
        assert_eq!(close.len(), 7);
    }

    #[test]
    fn test_reachable_cells() {
        let board = Board::new(4, 4).unwrap();
        assert_eq!(board.reachable_cells(Cell::new(0, 0), 0).len(), 16);

        // A full wall on row 2 stops the flood
        let board = Board::with_filled(4, 4, &cells(&[(0, 2), (1, 2), (2, 2), (3, 2)])).unwrap();
        let reached = board.reachable_cells(Cell::new(0, 0), 0);
        assert_eq!(reached.len(), 8);
        assert!(!reached.contains(&Cell::new(0, 3)));
    }

    #[test]
    fn test_reachable_cells_keep_distance() {
        let filled = Cell::new(3, 3);
        let board = Board::with_filled(7, 7, &[filled]).unwrap();
        let reached = board.reachable_cells(Cell::new(0, 0), 1);
        assert!(!reached.contains(&filled));
        for ring in circle(filled, 1) {
            assert!(!reached.contains(&ring), "{:?}", ring);
        }
        // Everything else is reached around the blocked patch
        assert_eq!(reached.len(), 49 - 7);
        assert!(reached.contains(&Cell::new(3, 6)));
    }

    #[test]
    fn test_reachable_cells_from_blocked_start() {
        let board = Board::with_filled(7, 7, &cells(&[(3, 3)])).unwrap();
        assert!(board.reachable_cells(Cell::new(4, 3), 1).is_empty());
        assert!(board.reachable_cells(Cell::new(3, 3), 0).is_empty());
        assert!(board.reachable_cells(Cell::new(9, 0), 0).is_empty());
    }

    #[test]
    fn test_new_rejects_bad_sizes() {
        assert_eq!(
            Board::new(0, 5).unwrap_err(),
            GameError::InvalidSize { width: 0, height: 5 }
        );
        assert_eq!(
            Board::new(i32::MAX, 2).unwrap_err(),
            GameError::InvalidSize { width: i32::MAX, height: 2 }
        );
    }

    #[test]
    fn test_render() {
        let board = Board::with_filled(3, 2, &cells(&[(0, 1)])).unwrap();
        assert_eq!(board.render(&cells(&[(2, 0)])), ". . @\n * . .\n");
    }
}
