//! Hex grid geometry: offset cells, cube coordinates, moves and rotations
//!
//! The board is addressed with "odd-r" offset coordinates (odd rows are shifted half a
//! cell to the east). All movement and rotation math happens in cube coordinates, where
//! every operation is exact integer arithmetic.

use serde::{Deserialize, Serialize};

/// Offset (column, row) address of a board cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    #[serde(rename = "x")]
    pub col: i32,
    #[serde(rename = "y")]
    pub row: i32,
}

impl Cell {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Cube coordinates of this cell
    pub fn to_hex(self) -> Hex {
        Hex::from_offset(self)
    }

    /// Neighbouring cell in a direction
    pub fn step(self, direction: Direction) -> Cell {
        (self.to_hex() + direction.vector()).to_offset()
    }

    /// Rotate this cell 60 degrees about `pivot`
    pub fn rotate(self, pivot: Cell, turn: Turn) -> Cell {
        self.to_hex().rotate(pivot.to_hex(), turn).to_offset()
    }

    /// Hex distance to another cell
    pub fn distance_to(self, other: Cell) -> i32 {
        self.to_hex().distance_to(other.to_hex())
    }

    /// Translate by a cube vector
    pub fn translate(self, vector: Hex) -> Cell {
        (self.to_hex() + vector).to_offset()
    }
}

/// Cube coordinates (x + y + z == 0)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Hex {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Hex {
    pub const ZERO: Hex = Hex::new(0, 0, 0);

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn from_offset(cell: Cell) -> Self {
        let x = cell.col - (cell.row - cell.row.rem_euclid(2)) / 2;
        let z = cell.row;
        Hex::new(x, -x - z, z)
    }

    pub fn to_offset(self) -> Cell {
        let col = self.x + (self.z - self.z.rem_euclid(2)) / 2;
        Cell::new(col, self.z)
    }

    pub fn scale(self, factor: i32) -> Hex {
        Hex::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Distance between two hexes
    pub fn distance_to(self, other: Hex) -> i32 {
        let d = other - self;
        (d.x.abs() + d.y.abs() + d.z.abs()) / 2
    }

    /// Rotate 60 degrees about `pivot`
    pub fn rotate(self, pivot: Hex, turn: Turn) -> Hex {
        let v = self - pivot;
        let rotated = match turn {
            Turn::Cw => Hex::new(-v.z, -v.x, -v.y),
            Turn::Ccw => Hex::new(-v.y, -v.z, -v.x),
        };
        pivot + rotated
    }

    fn dot(self, other: Hex) -> i64 {
        self.x as i64 * other.x as i64 + self.y as i64 * other.y as i64 + self.z as i64 * other.z as i64
    }
}

impl std::ops::Add for Hex {
    type Output = Hex;
    fn add(self, rhs: Hex) -> Hex {
        Hex::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Hex {
    type Output = Hex;
    fn sub(self, rhs: Hex) -> Hex {
        Hex::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// The six hex directions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    E,
    W,
    SE,
    SW,
    NE,
    NW,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::E,
        Direction::W,
        Direction::SE,
        Direction::SW,
        Direction::NE,
        Direction::NW,
    ];

    /// Cube vector of a single step
    pub const fn vector(self) -> Hex {
        match self {
            Direction::E => Hex::new(1, -1, 0),
            Direction::W => Hex::new(-1, 1, 0),
            Direction::SE => Hex::new(0, -1, 1),
            Direction::SW => Hex::new(-1, 0, 1),
            Direction::NE => Hex::new(1, 0, -1),
            Direction::NW => Hex::new(0, 1, -1),
        }
    }

    pub const fn opposite(self) -> Direction {
        match self {
            Direction::E => Direction::W,
            Direction::W => Direction::E,
            Direction::SE => Direction::NW,
            Direction::SW => Direction::NE,
            Direction::NE => Direction::SW,
            Direction::NW => Direction::SE,
        }
    }
}

/// Rotation sense
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Turn {
    Cw,
    Ccw,
}

/// Order in which a ring is walked, starting from its north-west corner
const RING_WALK: [Direction; 6] = [
    Direction::E,
    Direction::SE,
    Direction::SW,
    Direction::W,
    Direction::NW,
    Direction::NE,
];

/// Cells at exactly `radius` from `center`, clockwise from the north-west corner
pub fn circle(center: Cell, radius: u32) -> Vec<Cell> {
    if radius == 0 {
        return vec![center];
    }
    let r = radius as i32;
    let mut members = Vec::with_capacity(6 * radius as usize);
    let mut h = center.to_hex() + Direction::NW.vector().scale(r);
    for direction in RING_WALK {
        for _ in 0..r {
            members.push(h.to_offset());
            h = h + direction.vector();
        }
    }
    members
}

/// Cube vector that carries `from` onto `to`
pub fn offset_vector(from: Cell, to: Cell) -> Hex {
    to.to_hex() - from.to_hex()
}

/// Bucketed angle between two orientation vectors.
///
/// 0 for under ~37 degrees, 1 up to 90, 2 up to ~143, 3 beyond. Each bucket is the
/// minimum number of 60 degree turns separating vectors on the hex lattice. A zero
/// vector has no orientation and is at distance 0 from everything.
pub fn rotation_distance(v0: Hex, v1: Hex) -> u32 {
    let s = v0.dot(v1);
    let norms = v0.dot(v0) * v1.dot(v1);
    if norms == 0 {
        return 0;
    }
    // s > 0.8 * |v0||v1|  <=>  s > 0 && 25 s^2 > 16 |v0|^2 |v1|^2
    let s2 = 25 * s * s;
    let bound = 16 * norms;
    if s > 0 && s2 > bound {
        0
    } else if s > 0 {
        1
    } else if s == 0 || s2 < bound {
        2
    } else {
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_round_trip() {
        for row in -3..12 {
            for col in -3..12 {
                let cell = Cell::new(col, row);
                assert_eq!(cell.to_hex().to_offset(), cell);
            }
        }
    }

    #[test]
    fn test_distance() {
        let c0 = Cell::new(2, 2);
        assert_eq!(c0.distance_to(c0), 0);
        assert_eq!(c0.distance_to(Cell::new(1, 3)), 1);
        assert_eq!(c0.distance_to(Cell::new(4, 5)), 4);
    }

    #[test]
    fn test_step_odd_and_even_rows() {
        let odd = Cell::new(2, 1);
        assert_eq!(odd.step(Direction::E), Cell::new(3, 1));
        assert_eq!(odd.step(Direction::W), Cell::new(1, 1));
        assert_eq!(odd.step(Direction::SE), Cell::new(3, 2));
        assert_eq!(odd.step(Direction::SW), Cell::new(2, 2));

        let even = Cell::new(2, 2);
        assert_eq!(even.step(Direction::E), Cell::new(3, 2));
        assert_eq!(even.step(Direction::W), Cell::new(1, 2));
        assert_eq!(even.step(Direction::SE), Cell::new(2, 3));
        assert_eq!(even.step(Direction::SW), Cell::new(1, 3));
    }

    #[test]
    fn test_step_then_opposite_returns() {
        for row in 0..6 {
            for col in 0..6 {
                let cell = Cell::new(col, row);
                for d in Direction::ALL {
                    assert_eq!(cell.step(d).step(d.opposite()), cell);
                }
            }
        }
    }

    #[test]
    fn test_rotate() {
        let pivot = Cell::new(1, 5);
        let cell = Cell::new(4, 4);
        assert_eq!(cell.rotate(pivot, Turn::Cw), Cell::new(3, 7));
        assert_eq!(cell.rotate(pivot, Turn::Ccw), Cell::new(2, 2));
    }

    #[test]
    fn test_rotation_periodicity() {
        let pivot = Cell::new(3, 4);
        for row in 0..8 {
            for col in 0..8 {
                let cell = Cell::new(col, row);
                let mut c = cell;
                for _ in 0..6 {
                    c = c.rotate(pivot, Turn::Cw);
                }
                assert_eq!(c, cell);
                assert_eq!(cell.rotate(pivot, Turn::Cw).rotate(pivot, Turn::Ccw), cell);
            }
        }
    }

    #[test]
    fn test_translate() {
        let c0 = Cell::new(1, 2);
        let c1 = Cell::new(4, 1);
        assert_eq!(c0.translate(offset_vector(c0, c1)), c1);
    }

    #[test]
    fn test_circle() {
        let center = Cell::new(2, 2);
        assert_eq!(
            circle(center, 1),
            vec![
                Cell::new(1, 1),
                Cell::new(2, 1),
                Cell::new(3, 2),
                Cell::new(2, 3),
                Cell::new(1, 3),
                Cell::new(1, 2),
            ]
        );
        let ring2: Vec<(i32, i32)> = circle(center, 2).iter().map(|c| (c.col, c.row)).collect();
        assert_eq!(
            ring2,
            vec![
                (1, 0), (2, 0), (3, 0), (3, 1), (4, 2), (3, 3),
                (3, 4), (2, 4), (1, 4), (0, 3), (0, 2), (0, 1),
            ]
        );
        assert_eq!(circle(center, 0), vec![center]);
    }

    #[test]
    fn test_rotation_distance() {
        let pivot = Cell::new(1, 2);
        let mut cells = vec![Cell::new(4, 3)];
        for _ in 0..6 {
            let last = *cells.last().unwrap();
            cells.push(last.rotate(pivot, Turn::Cw));
        }
        let v: Vec<Hex> = cells.iter().map(|&c| offset_vector(pivot, c)).collect();
        let expected = [0, 1, 2, 3, 2, 1, 0];
        for (i, &e) in expected.iter().enumerate() {
            assert_eq!(rotation_distance(v[0], v[i]), e, "rotation {}", i);
        }
        assert_eq!(rotation_distance(Hex::ZERO, v[3]), 0);
    }
}
