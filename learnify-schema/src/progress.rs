use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonCompleteRequest {
    pub lesson_id: i64,
    /// Step id -> submitted answer. Graded server-side.
    #[serde(default)]
    pub responses: BTreeMap<i64, String>,
    pub difficulty_level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedResponse {
    pub answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementAward {
    pub achievement_type: String,
    pub name: String,
    pub description: String,
    pub xp_awarded: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonCompleteResponse {
    pub xp_earned: i64,
    /// Rounded percentage.
    pub accuracy: i64,
    pub achievements: Vec<AchievementAward>,
}
