//! Game state machine: spawning, moving, locking and scoring
//!
//! A game is either falling (it has an active unit) or ended. Spawning happens inside
//! construction and after every lock, so callers only ever observe those two states.

use rustc_hash::FxHashSet;

use crate::board::Board;
use crate::error::GameError;
use crate::hex::Cell;
use crate::rng::SourceRng;
use crate::unit::{Action, Unit, UnitId, UnitTable};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Points per cleared line, scaled by the triangular number of lines cleared
const LINE_POINTS: u64 = 100;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Classification of an action from some configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveResult {
    /// Resulting configuration is on the board and free
    Ok,
    /// Resulting configuration collides; the unit would lock where it is
    Lock,
    /// Resulting configuration was already visited by the active unit
    Error,
}

/// Every action from one configuration, with its classification and result
#[derive(Clone, Copy, Debug)]
pub struct MoveSet {
    entries: [(Action, MoveResult, UnitId); 6],
}

impl MoveSet {
    pub fn entries(&self) -> &[(Action, MoveResult, UnitId)] {
        &self.entries
    }

    pub fn get(&self, action: Action) -> (MoveResult, UnitId) {
        let (_, result, unit) = self.entries[action.index()];
        (result, unit)
    }

    /// Actions that keep the unit falling, with the configuration they reach
    pub fn ok(&self) -> impl Iterator<Item = (Action, UnitId)> + '_ {
        self.with(MoveResult::Ok)
    }

    /// Actions that would lock the unit
    pub fn locking(&self) -> impl Iterator<Item = Action> + '_ {
        self.with(MoveResult::Lock).map(|(a, _)| a)
    }

    /// First locking action in preference order
    pub fn first_lock(&self) -> Option<Action> {
        self.locking().next()
    }

    pub fn any_lock(&self) -> bool {
        self.first_lock().is_some()
    }

    fn with(&self, wanted: MoveResult) -> impl Iterator<Item = (Action, UnitId)> + '_ {
        self.entries
            .iter()
            .filter(move |(_, r, _)| *r == wanted)
            .map(|&(a, _, u)| (a, u))
    }
}

/// Why a game ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndReason {
    /// All `max_units` units have been spawned and locked
    SourceExhausted,
    /// A freshly spawned unit overlapped filled cells or the board edge
    SpawnBlocked,
}

/// Outcome of one lock
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LockReport {
    pub lines_cleared: u32,
    /// Unit size plus line points
    pub points: u64,
    /// Multi-line bonus carried over from the previous lock
    pub bonus: u64,
}

impl LockReport {
    pub fn total(&self) -> u64 {
        self.points + self.bonus
    }
}

/// Result of a successfully applied action
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Moved,
    Locked(LockReport),
}

/// Summary of replaying a command list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub score: u64,
    pub locks: u32,
    pub lines_cleared: u32,
    pub ended: bool,
}

// ============================================================================
// GAME STATE
// ============================================================================

/// One run of the game for a fixed problem and seed
#[derive(Clone, Debug)]
pub struct GameState {
    board: Board,
    units: UnitTable,
    /// Catalog shapes already moved to their spawn position
    spawn_units: Vec<UnitId>,
    max_units: u32,
    spawned: u32,
    rng: SourceRng,
    active: Option<UnitId>,
    /// Catalog entry of the active unit
    active_shape: Option<UnitId>,
    visited: FxHashSet<UnitId>,
    last_lines_cleared: u32,
    score: u64,
    end_reason: Option<EndReason>,
}

impl GameState {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Build a game and spawn its first unit
    pub fn new(
        board: Board,
        catalog: &[(Cell, Vec<Cell>)],
        max_units: u32,
        seed: u32,
    ) -> Result<Self, GameError> {
        if catalog.is_empty() {
            return Err(GameError::EmptyCatalog);
        }
        let mut units = UnitTable::new();
        let mut spawn_units = Vec::with_capacity(catalog.len());
        for (index, (pivot, members)) in catalog.iter().enumerate() {
            if members.is_empty() {
                return Err(GameError::EmptyUnit { index });
            }
            let shape = units.intern(*pivot, members.iter().copied());
            spawn_units.push(units.to_spawn_position(shape, board.width()));
        }

        let mut game = Self {
            board,
            units,
            spawn_units,
            max_units,
            spawned: 0,
            rng: SourceRng::new(seed),
            active: None,
            active_shape: None,
            visited: FxHashSet::default(),
            last_lines_cleared: 0,
            score: 0,
            end_reason: None,
        };
        game.spawn();
        Ok(game)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn units(&self) -> &UnitTable {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut UnitTable {
        &mut self.units
    }

    pub fn unit(&self, id: UnitId) -> &Unit {
        self.units.get(id)
    }

    /// Active unit, `None` once the game has ended
    pub fn active(&self) -> Option<UnitId> {
        self.active
    }

    /// Spawn configuration of the active unit, shared by every spawn of that shape
    pub fn active_shape(&self) -> Option<UnitId> {
        self.active_shape
    }

    pub fn is_over(&self) -> bool {
        self.active.is_none()
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// Units spawned so far, including the active one
    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    pub fn max_units(&self) -> u32 {
        self.max_units
    }

    /// Lines cleared by the most recent lock
    pub fn last_lines_cleared(&self) -> u32 {
        self.last_lines_cleared
    }

    /// Whether `unit` was already occupied since the last spawn
    pub fn visited(&self, unit: UnitId) -> bool {
        self.visited.contains(&unit)
    }

    pub fn visited_set(&self) -> &FxHashSet<UnitId> {
        &self.visited
    }

    /// Every member on the board and on a free cell
    pub fn is_valid(&self, unit: UnitId) -> bool {
        self.units.get(unit).members().iter().all(|&m| self.board.is_free(m))
    }

    // ========================================================================
    // MOVE CLASSIFICATION
    // ========================================================================

    /// Classify one action from `unit` against an explicit visited set
    pub fn classify_with(
        &mut self,
        unit: UnitId,
        action: Action,
        visited: &FxHashSet<UnitId>,
    ) -> (MoveResult, UnitId) {
        let next = self.units.action(unit, action);
        let result = if visited.contains(&next) {
            MoveResult::Error
        } else if self.is_valid(next) {
            MoveResult::Ok
        } else {
            MoveResult::Lock
        };
        (result, next)
    }

    /// Classify every action from `unit` without changing the game
    pub fn moves_from(&mut self, unit: UnitId) -> MoveSet {
        let visited = std::mem::take(&mut self.visited);
        let entries = Action::ALL.map(|action| {
            let (result, next) = self.classify_with(unit, action, &visited);
            (action, result, next)
        });
        self.visited = visited;
        MoveSet { entries }
    }

    /// Classify every action from the active unit
    pub fn moves(&mut self) -> Option<MoveSet> {
        self.active.map(|u| self.moves_from(u))
    }

    // ========================================================================
    // TRANSITIONS
    // ========================================================================

    /// Apply one action to the active unit
    pub fn apply(&mut self, action: Action) -> Result<Step, GameError> {
        let current = self.active.ok_or(GameError::NoActiveUnit)?;
        let next = self.units.action(current, action);
        if self.visited.contains(&next) {
            return Err(GameError::IllegalMove { action });
        }
        if self.is_valid(next) {
            self.active = Some(next);
            self.visited.insert(next);
            return Ok(Step::Moved);
        }
        let report = self.lock(current);
        self.spawn();
        Ok(Step::Locked(report))
    }

    /// Apply a command list, stopping at the first failure
    pub fn replay(&mut self, actions: &[Action]) -> Result<ReplayReport, GameError> {
        let mut report = ReplayReport::default();
        for &action in actions {
            if let Step::Locked(lock) = self.apply(action)? {
                report.locks += 1;
                report.lines_cleared += lock.lines_cleared;
            }
        }
        report.score = self.score;
        report.ended = self.is_over();
        Ok(report)
    }

    /// Score that locking `unit` right now would earn, without changing the board
    pub fn preview_lock(&self, unit: UnitId) -> LockReport {
        let members = self.units.get(unit).members();
        let mut lines = 0;
        for row in 0..self.board.height() {
            let full = (0..self.board.width()).all(|col| {
                let cell = Cell::new(col, row);
                self.board.is_filled(cell) || members.contains(&cell)
            });
            if full {
                lines += 1;
            }
        }
        self.lock_report(members.len(), lines)
    }

    fn lock(&mut self, unit: UnitId) -> LockReport {
        let size = {
            let members = self.units.get(unit).members();
            self.board.lock(members);
            members.len()
        };
        let lines = self.board.clear_full_rows();
        let report = self.lock_report(size, lines);
        self.score += report.total();
        self.last_lines_cleared = lines;
        self.active = None;
        self.active_shape = None;
        tracing::trace!(
            lines,
            points = report.points,
            bonus = report.bonus,
            score = self.score,
            "unit locked"
        );
        report
    }

    fn lock_report(&self, size: usize, lines: u32) -> LockReport {
        let l = lines as u64;
        let points = size as u64 + LINE_POINTS * (1 + l) * l / 2;
        let bonus = if self.last_lines_cleared > 1 {
            (self.last_lines_cleared as u64 - 1) * points / 10
        } else {
            0
        };
        LockReport {
            lines_cleared: lines,
            points,
            bonus,
        }
    }

    fn spawn(&mut self) {
        self.visited.clear();
        if self.spawned >= self.max_units {
            self.end(EndReason::SourceExhausted);
            return;
        }
        let index = self.rng.next_index(self.spawn_units.len());
        self.spawned += 1;
        let unit = self.spawn_units[index];
        if !self.is_valid(unit) {
            self.end(EndReason::SpawnBlocked);
            return;
        }
        self.active = Some(unit);
        self.active_shape = Some(unit);
        self.visited.insert(unit);
    }

    fn end(&mut self, reason: EndReason) {
        self.active = None;
        self.active_shape = None;
        self.end_reason = Some(reason);
        tracing::debug!(?reason, score = self.score, spawned = self.spawned, "game over");
    }
}
