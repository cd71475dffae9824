use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizCreate {
    pub title: String,
    pub subject_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttemptCreate {
    /// Percentage score, 0..=100.
    pub score: f64,
    #[serde(default)]
    pub time_spent_minutes: Option<i64>,
}
