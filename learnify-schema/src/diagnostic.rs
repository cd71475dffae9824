use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticQuestionCreate {
    pub subject_id: i64,
    #[serde(default)]
    pub topic: Option<String>,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    pub skill: String,
}

fn default_difficulty() -> u8 {
    1
}

/// Placement question as shown to the learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticQuestionView {
    pub id: i64,
    pub question: String,
    pub options: Vec<String>,
    pub difficulty: u8,
    pub skill: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticSubmit {
    pub subject_id: i64,
    #[serde(default)]
    pub learning_path_id: Option<i64>,
    /// Question id -> submitted answer.
    pub responses: BTreeMap<i64, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub question_id: i64,
    pub skill: String,
    pub answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillScore {
    pub skill: String,
    pub correct: u32,
    pub total: u32,
    pub percentage: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticScore {
    pub evaluations: Vec<Evaluation>,
    pub skills: Vec<SkillScore>,
    pub overall_proficiency: i64,
    pub mastered_skills: Vec<String>,
    pub in_progress_skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningInsights {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub areas_for_improvement: Vec<String>,
    #[serde(default)]
    pub recommended_activities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticSubmitResponse {
    pub result_id: i64,
    #[serde(flatten)]
    pub score: DiagnosticScore,
    pub learning_insights: Option<LearningInsights>,
}
