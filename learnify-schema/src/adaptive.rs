use serde::{Deserialize, Serialize};

use crate::CpaPhase;

/// Which way an adjustment moved the difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Easier,
    Harder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyReplayRequest {
    #[serde(default = "default_initial")]
    pub initial_difficulty: u8,
    /// Answer outcomes in the order they were given.
    pub outcomes: Vec<bool>,
    /// Phase of the step the learner is on; selects the phase hint.
    #[serde(default)]
    pub phase: Option<CpaPhase>,
}

fn default_initial() -> u8 {
    3
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentView {
    /// Number of answers recorded when the adjustment fired.
    pub after_answers: usize,
    pub from: u8,
    pub to: u8,
    pub direction: Direction,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyReplayResponse {
    pub difficulty: u8,
    pub adjustments: Vec<AdjustmentView>,
    /// Hints for the most recent adjustment, when the last evaluation changed the level.
    pub hints: Vec<String>,
}
