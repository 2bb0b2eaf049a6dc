//! Units: immutable piece configurations, interned by footprint
//!
//! A unit is a pivot plus a set of member cells. Every configuration is stored once in a
//! [`UnitTable`] and referred to by a [`UnitId`], so equal configurations compare and hash
//! as a single integer. Action results are cached on the table, which makes repeated
//! neighbour queries during search nearly free.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::hex::{offset_vector, Cell, Direction, Hex, Turn};

// ============================================================================
// ACTIONS
// ============================================================================

/// One of the six commands that can be applied to the active unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    E,
    W,
    SE,
    SW,
    CW,
    CCW,
}

impl Action {
    /// All actions, in the fixed preference order used when several are equivalent
    pub const ALL: [Action; 6] = [
        Action::E,
        Action::W,
        Action::SE,
        Action::SW,
        Action::CW,
        Action::CCW,
    ];

    pub const fn index(self) -> usize {
        match self {
            Action::E => 0,
            Action::W => 1,
            Action::SE => 2,
            Action::SW => 3,
            Action::CW => 4,
            Action::CCW => 5,
        }
    }

    /// Translation direction, or `None` for rotations
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Action::E => Some(Direction::E),
            Action::W => Some(Direction::W),
            Action::SE => Some(Direction::SE),
            Action::SW => Some(Direction::SW),
            Action::CW | Action::CCW => None,
        }
    }

    /// Rotation sense, or `None` for translations
    pub const fn turn(self) -> Option<Turn> {
        match self {
            Action::CW => Some(Turn::Cw),
            Action::CCW => Some(Turn::Ccw),
            _ => None,
        }
    }
}

// ============================================================================
// FOOTPRINT AND UNIT
// ============================================================================

/// Canonical identity of a configuration: sorted members plus pivot
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Footprint {
    members: Box<[Cell]>,
    pivot: Cell,
}

impl Footprint {
    pub fn new(pivot: Cell, members: impl IntoIterator<Item = Cell>) -> Self {
        let mut members: Vec<Cell> = members.into_iter().collect();
        members.sort_unstable();
        members.dedup();
        Self {
            members: members.into_boxed_slice(),
            pivot,
        }
    }

    pub fn members(&self) -> &[Cell] {
        &self.members
    }

    pub fn pivot(&self) -> Cell {
        self.pivot
    }
}

/// Interned handle to a unit configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u32);

impl UnitId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Unit configuration with its bounding box
#[derive(Clone, Debug)]
pub struct Unit {
    footprint: Footprint,
    /// Smallest member row
    pub north: i32,
    /// Largest member row
    pub south: i32,
    /// Smallest member column
    pub west: i32,
    /// Largest member column
    pub east: i32,
    transitions: [Option<UnitId>; 6],
}

impl Unit {
    fn new(footprint: Footprint) -> Self {
        let members = footprint.members();
        let north = members.iter().map(|c| c.row).min().unwrap_or(footprint.pivot.row);
        let south = members.iter().map(|c| c.row).max().unwrap_or(footprint.pivot.row);
        let west = members.iter().map(|c| c.col).min().unwrap_or(footprint.pivot.col);
        let east = members.iter().map(|c| c.col).max().unwrap_or(footprint.pivot.col);
        Self {
            footprint,
            north,
            south,
            west,
            east,
            transitions: [None; 6],
        }
    }

    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    pub fn pivot(&self) -> Cell {
        self.footprint.pivot
    }

    pub fn members(&self) -> &[Cell] {
        &self.footprint.members
    }

    pub fn len(&self) -> usize {
        self.footprint.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.footprint.members.is_empty()
    }

    /// Sum of the member vectors relative to the pivot.
    ///
    /// Rotates with the unit and is unchanged by translation, so the angle between two
    /// orientations of the same shape bounds the turns needed to go from one to the other.
    pub fn orientation(&self) -> Hex {
        let pivot = self.pivot();
        self.members()
            .iter()
            .fold(Hex::ZERO, |acc, &m| acc + offset_vector(pivot, m))
    }
}

// ============================================================================
// INTERN TABLE
// ============================================================================

/// Hash-consing table owning every unit configuration of one game
#[derive(Clone, Debug, Default)]
pub struct UnitTable {
    units: Vec<Unit>,
    index: FxHashMap<Footprint, UnitId>,
}

impl UnitTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct configurations interned so far
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Intern a configuration, returning the shared handle for its footprint
    pub fn intern(&mut self, pivot: Cell, members: impl IntoIterator<Item = Cell>) -> UnitId {
        self.intern_footprint(Footprint::new(pivot, members))
    }

    pub fn intern_footprint(&mut self, footprint: Footprint) -> UnitId {
        if let Some(&id) = self.index.get(&footprint) {
            return id;
        }
        let id = UnitId(self.units.len() as u32);
        self.units.push(Unit::new(footprint.clone()));
        self.index.insert(footprint, id);
        id
    }

    /// Look up an already interned footprint
    pub fn find(&self, footprint: &Footprint) -> Option<UnitId> {
        self.index.get(footprint).copied()
    }

    pub fn get(&self, id: UnitId) -> &Unit {
        &self.units[id.index()]
    }

    /// Result of applying `action`, cached per unit
    pub fn action(&mut self, id: UnitId, action: Action) -> UnitId {
        if let Some(next) = self.units[id.index()].transitions[action.index()] {
            return next;
        }
        let next = match (action.direction(), action.turn()) {
            (Some(direction), _) => self.translate(id, direction.vector()),
            (None, Some(turn)) => self.rotate(id, turn),
            (None, None) => unreachable!("every action is a move or a turn"),
        };
        self.units[id.index()].transitions[action.index()] = Some(next);
        next
    }

    /// Translate members and pivot by a cube vector
    pub fn translate(&mut self, id: UnitId, vector: Hex) -> UnitId {
        if vector == Hex::ZERO {
            return id;
        }
        let unit = self.get(id);
        let pivot = unit.pivot().translate(vector);
        let members: Vec<Cell> = unit.members().iter().map(|m| m.translate(vector)).collect();
        self.intern(pivot, members)
    }

    /// Rotate members 60 degrees about the pivot
    pub fn rotate(&mut self, id: UnitId, turn: Turn) -> UnitId {
        let unit = self.get(id);
        let pivot = unit.pivot();
        let members: Vec<Cell> = unit.members().iter().map(|m| m.rotate(pivot, turn)).collect();
        self.intern(pivot, members)
    }

    /// Apply `steps` successive rotations
    pub fn rotate_steps(&mut self, id: UnitId, turn: Turn, steps: usize) -> UnitId {
        (0..steps).fold(id, |u, _| self.rotate(u, turn))
    }

    /// Translate so the bounding box's north-west corner lands on `target`.
    ///
    /// The shift is done in two exact steps: a vertical translation moving the northmost
    /// row onto `target.row`, then an east/west shift moving the westmost column onto
    /// `target.col`. Every translation of the shape has exactly one such corner.
    pub fn to_position_nw(&mut self, id: UnitId, target: Cell) -> UnitId {
        let north = self.get(id).north;
        let vertical = offset_vector(Cell::new(0, north), Cell::new(0, target.row));
        let shifted = self.translate(id, vertical);
        let dx = target.col - self.get(shifted).west;
        self.translate(shifted, Direction::E.vector().scale(dx))
    }

    /// Spawn placement: northmost row on row 0, bounding box centred in `width`,
    /// rounding toward the lower column when the slack is odd
    pub fn to_spawn_position(&mut self, id: UnitId, width: i32) -> UnitId {
        let top = self.to_position_nw(id, Cell::new(0, 0));
        let unit = self.get(top);
        let span = unit.east - unit.west + 1;
        let left = (width - span).div_euclid(2);
        self.to_position_nw(top, Cell::new(left, 0))
    }

    /// Which single action, if any, turns `from` into `to`
    pub fn move_to_reach(&mut self, from: UnitId, to: UnitId, allowed: &[Action]) -> Option<Action> {
        allowed.iter().copied().find(|&a| self.action(from, a) == to)
    }
}
