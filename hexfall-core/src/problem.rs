//! Problem definition and solution records

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::GameError;
use crate::game::GameState;
use crate::hex::Cell;

/// One entry of the unit catalog, in board coordinates
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub members: Vec<Cell>,
    pub pivot: Cell,
}

/// A board, a unit catalog and the seeds to play it with
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: u32,
    pub units: Vec<UnitSpec>,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub filled: Vec<Cell>,
    /// Number of units the source yields per game
    pub source_length: u32,
    pub source_seeds: Vec<u32>,
}

impl Problem {
    /// Load from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let problem: Problem = serde_json::from_str(content)?;
        Ok(problem)
    }

    /// Starting board with the pre-filled cells
    pub fn board(&self) -> Result<Board, GameError> {
        Board::with_filled(self.width, self.height, &self.filled)
    }

    /// Source seed at `seed_index`
    pub fn seed(&self, seed_index: usize) -> Result<u32, GameError> {
        self.source_seeds
            .get(seed_index)
            .copied()
            .ok_or(GameError::InvalidSeedIndex {
                index: seed_index,
                count: self.source_seeds.len(),
            })
    }

    /// Build the game for the seed at `seed_index`
    pub fn make_game(&self, seed_index: usize) -> Result<GameState, GameError> {
        let seed = self.seed(seed_index)?;
        self.make_game_with_seed(seed)
    }

    /// Build the game for an explicit seed
    pub fn make_game_with_seed(&self, seed: u32) -> Result<GameState, GameError> {
        let catalog: Vec<(Cell, Vec<Cell>)> = self
            .units
            .iter()
            .map(|u| (u.pivot, u.members.clone()))
            .collect();
        GameState::new(self.board()?, &catalog, self.source_length, seed)
    }
}

/// One submitted command string
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub problem_id: u32,
    pub seed: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub solution: String,
}
