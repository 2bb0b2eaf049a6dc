//! Deterministic unit source
//!
//! Linear congruential generator fixed by the problem format:
//! `state = (1103515245 * state + 12345) mod 2^32`, each draw yielding
//! bits 30..16 of the state before it advances.

const MULTIPLIER: u32 = 1103515245;
const INCREMENT: u32 = 12345;

/// LCG driving the spawn order
#[derive(Debug, Clone)]
pub struct SourceRng {
    state: u32,
}

impl SourceRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Next 15-bit output
    pub fn next_value(&mut self) -> u32 {
        let out = (self.state >> 16) & 0x7fff;
        self.state = self.state.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT);
        out
    }

    /// Next catalog index in `[0, len)`
    pub fn next_index(&mut self, len: usize) -> usize {
        self.next_value() as usize % len
    }
}
