//! A* shortest-path search
//!
//! [`astar`] is generic over any [`SearchSpace`]. [`UnitSearch`] specialises it to unit
//! configurations of a game, where edges are the actions that keep the unit falling.
//!
//! Entries with equal `f` are popped in insertion order, which keeps results
//! reproducible across runs.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::game::GameState;
use crate::hex::rotation_distance;
use crate::unit::{Action, UnitId};

// ============================================================================
// GENERIC SEARCH
// ============================================================================

/// Graph explored by [`astar`]
pub trait SearchSpace {
    type Node: Copy + Eq + Hash;

    /// Append the nodes adjacent to `node` to `out`
    fn neighbours(&mut self, node: Self::Node, out: &mut Vec<Self::Node>);

    /// Cost of the edge `from -> to`
    fn cost(&self, _from: Self::Node, _to: Self::Node) -> u32 {
        1
    }

    /// Admissible estimate of the remaining cost from `node` to `goal`
    fn heuristic(&self, node: Self::Node, goal: Self::Node) -> u32;
}

/// A found path, start and goal included
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path<N> {
    pub cost: u32,
    pub nodes: Vec<N>,
}

impl<N> Path<N> {
    /// Number of edges
    pub fn len(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct OpenEntry<N> {
    f: u32,
    seq: u64,
    node: N,
}

impl<N> PartialEq for OpenEntry<N> {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.seq == other.seq
    }
}

impl<N> Eq for OpenEntry<N> {}

impl<N> PartialOrd for OpenEntry<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<N> Ord for OpenEntry<N> {
    // BinaryHeap is a max-heap: reverse so the lowest (f, seq) pops first
    fn cmp(&self, other: &Self) -> Ordering {
        other.f.cmp(&self.f).then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Shortest path from `start` to `goal`, or `None` when the goal cannot be reached
pub fn astar<S: SearchSpace>(space: &mut S, start: S::Node, goal: S::Node) -> Option<Path<S::Node>> {
    let mut open = BinaryHeap::new();
    let mut g_score: FxHashMap<S::Node, u32> = FxHashMap::default();
    let mut came_from: FxHashMap<S::Node, S::Node> = FxHashMap::default();
    let mut closed: FxHashSet<S::Node> = FxHashSet::default();
    let mut seq = 0u64;
    let mut neighbours = Vec::new();

    g_score.insert(start, 0);
    open.push(OpenEntry {
        f: space.heuristic(start, goal),
        seq,
        node: start,
    });

    while let Some(OpenEntry { node, .. }) = open.pop() {
        if node == goal {
            let cost = g_score[&goal];
            return Some(Path {
                cost,
                nodes: reconstruct(&came_from, goal),
            });
        }
        // Stale entries left behind by a later improvement
        if !closed.insert(node) {
            continue;
        }
        let g = g_score[&node];

        neighbours.clear();
        space.neighbours(node, &mut neighbours);
        for &next in &neighbours {
            if closed.contains(&next) {
                continue;
            }
            let tentative = g + space.cost(node, next);
            let better = g_score.get(&next).map_or(true, |&known| tentative < known);
            if better {
                g_score.insert(next, tentative);
                came_from.insert(next, node);
                seq += 1;
                open.push(OpenEntry {
                    f: tentative + space.heuristic(next, goal),
                    seq,
                    node: next,
                });
            }
        }
    }
    None
}

fn reconstruct<N: Copy + Eq + Hash>(came_from: &FxHashMap<N, N>, goal: N) -> Vec<N> {
    let mut nodes = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        nodes.push(prev);
        current = prev;
    }
    nodes.reverse();
    nodes
}

// ============================================================================
// UNIT SEARCH
// ============================================================================

/// Unit configurations of a game, connected by actions classified OK
pub struct UnitSearch<'a> {
    game: &'a mut GameState,
    rotation_term: bool,
}

impl<'a> UnitSearch<'a> {
    pub fn new(game: &'a mut GameState) -> Self {
        Self {
            game,
            rotation_term: true,
        }
    }

    /// Add the bucketed orientation distance to the pivot distance
    pub fn with_rotation_term(mut self, enabled: bool) -> Self {
        self.rotation_term = enabled;
        self
    }
}

impl SearchSpace for UnitSearch<'_> {
    type Node = UnitId;

    fn neighbours(&mut self, node: UnitId, out: &mut Vec<UnitId>) {
        let moves = self.game.moves_from(node);
        out.extend(moves.ok().map(|(_, next)| next));
    }

    fn heuristic(&self, node: UnitId, goal: UnitId) -> u32 {
        let n = self.game.unit(node);
        let g = self.game.unit(goal);
        let mut h = n.pivot().distance_to(g.pivot()) as u32;
        if self.rotation_term {
            h += rotation_distance(n.orientation(), g.orientation());
        }
        h
    }
}

/// Actions carrying the active unit to `goal` through falling configurations only.
///
/// `Some(vec![])` means the active unit already is the goal; `None` means unreachable.
pub fn find_path(game: &mut GameState, goal: UnitId, rotation_term: bool) -> Option<Vec<Action>> {
    let start = game.active()?;
    let path = {
        let mut space = UnitSearch::new(game).with_rotation_term(rotation_term);
        astar(&mut space, start, goal)?
    };
    path.nodes
        .windows(2)
        .map(|pair| game.units_mut().move_to_reach(pair[0], pair[1], &Action::ALL))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::hex::Cell;

    /// 4-neighbour grid with `*` walls, `s` start and `g` goal
    struct GridWorld {
        rows: Vec<Vec<u8>>,
    }

    impl GridWorld {
        fn new(map: &[&str]) -> Self {
            Self {
                rows: map.iter().map(|r| r.as_bytes().to_vec()).collect(),
            }
        }

        fn find(&self, sym: u8) -> (i32, i32) {
            for (y, row) in self.rows.iter().enumerate() {
                for (x, &c) in row.iter().enumerate() {
                    if c == sym {
                        return (x as i32, y as i32);
                    }
                }
            }
            panic!("symbol not found");
        }
    }

    impl SearchSpace for GridWorld {
        type Node = (i32, i32);

        fn neighbours(&mut self, (x, y): (i32, i32), out: &mut Vec<(i32, i32)>) {
            for (dx, dy) in [(-1, 0), (0, 1), (1, 0), (0, -1)] {
                let (nx, ny) = (x + dx, y + dy);
                if ny >= 0 && (ny as usize) < self.rows.len() && nx >= 0 && (nx as usize) < self.rows[0].len()
                    && self.rows[ny as usize][nx as usize] != b'*'
                {
                    out.push((nx, ny));
                }
            }
        }

        fn heuristic(&self, (x, y): (i32, i32), (gx, gy): (i32, i32)) -> u32 {
            ((x - gx).abs() + (y - gy).abs()) as u32
        }
    }

    #[test]
    fn test_grid_detour() {
        let mut world = GridWorld::new(&[
            "**********",
            "*  s     *",
            "*        *",
            "****** ***",
            "*        *",
            "* g      *",
            "**********",
        ]);
        let start = world.find(b's');
        let goal = world.find(b'g');
        let path = astar(&mut world, start, goal).expect("path exists");
        // Through the gap at column 6: 3 right, 4 down, 4 left
        assert_eq!(path.cost, 11);
        assert_eq!(path.len(), 11);
        assert_eq!(path.nodes.first(), Some(&start));
        assert_eq!(path.nodes.last(), Some(&goal));
        assert!(path.nodes.contains(&(6, 3)));
    }

    #[test]
    fn test_grid_straight_line() {
        let mut world = GridWorld::new(&["*****", "*s g*", "*****"]);
        let path = astar(&mut world, (1, 1), (3, 1)).unwrap();
        assert_eq!(path.nodes, vec![(1, 1), (2, 1), (3, 1)]);
    }

    #[test]
    fn test_grid_walled_off_is_none() {
        let mut world = GridWorld::new(&["*******", "*s * g*", "*******"]);
        assert!(astar(&mut world, (1, 1), (5, 1)).is_none());
    }

    #[test]
    fn test_start_is_goal() {
        let mut world = GridWorld::new(&["***", "*s*", "***"]);
        let path = astar(&mut world, (1, 1), (1, 1)).unwrap();
        assert_eq!(path.cost, 0);
        assert!(path.is_empty());
    }

    fn domino_game(board: Board) -> GameState {
        let domino = (Cell::new(0, 0), vec![Cell::new(0, 0), Cell::new(1, 0)]);
        GameState::new(board, &[domino], 1, 0).unwrap()
    }

    #[test]
    fn test_unit_path_replays() {
        let mut game = domino_game(Board::new(10, 10).unwrap());
        let start = game.active().unwrap();
        let goal = [Action::SE, Action::SE, Action::SW, Action::CW, Action::SE]
            .into_iter()
            .fold(start, |u, a| game.units_mut().action(u, a));
        let actions = find_path(&mut game, goal, true).expect("reachable");
        assert!(actions.len() <= 5);
        for a in actions {
            assert_eq!(game.apply(a), Ok(crate::game::Step::Moved));
        }
        assert_eq!(game.active(), Some(goal));
    }

    #[test]
    fn test_unit_walled_off_is_unreachable() {
        // Row 2 is a solid wall; nothing below it can be reached
        let wall: Vec<Cell> = (0..6).map(|c| Cell::new(c, 2)).collect();
        let mut game = domino_game(Board::with_filled(6, 6, &wall).unwrap());
        let goal = game.units_mut().intern(Cell::new(2, 4), [Cell::new(2, 4), Cell::new(3, 4)]);
        assert_eq!(find_path(&mut game, goal, true), None);
    }

    #[test]
    fn test_unit_already_at_goal() {
        let mut game = domino_game(Board::new(6, 6).unwrap());
        let start = game.active().unwrap();
        assert_eq!(find_path(&mut game, start, true), Some(vec![]));
    }
}
