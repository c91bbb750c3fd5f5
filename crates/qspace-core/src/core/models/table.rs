use serde::{Deserialize, Serialize};

/// One direction of the numeric table: three coordinates plus a shell index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionRow {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub shell: usize,
}

/// Strength (b-value) of one shell, keyed by shell index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrengthRow {
    pub shell: usize,
    pub strength: f64,
}

/// The tabular shape of a [`Scheme`](super::scheme::Scheme): one row per
/// direction in flat order and a parallel strength table. Shells without a
/// strength entry are unlabeled.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchemeTable {
    pub directions: Vec<DirectionRow>,
    pub strengths: Vec<StrengthRow>,
}

impl SchemeTable {
    pub fn strength_of(&self, shell: usize) -> Option<f64> {
        self.strengths
            .iter()
            .find(|row| row.shell == shell)
            .map(|row| row.strength)
    }
}
