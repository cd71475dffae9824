use serde::{Deserialize, Serialize};

use crate::CpaPhase;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectCreate {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Question attached to a lesson step, persisted as JSON.
///
/// `simple*` and `advanced*` variants are optional overrides used when the
/// learner's requested difficulty is below or above the step's own level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionData {
    pub text: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced_options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced_explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonStepCreate {
    #[serde(rename = "type")]
    pub phase: CpaPhase,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_step_difficulty")]
    pub difficulty_level: u8,
    #[serde(default)]
    pub question: Option<QuestionData>,
}

fn default_step_difficulty() -> u8 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonCreate {
    pub title: String,
    pub description: String,
    pub subject_id: i64,
    pub level: String,
    pub content: String,
    #[serde(default)]
    pub steps: Vec<LessonStepCreate>,
}

/// Question as delivered to the learner: never carries the answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredQuestion {
    pub text: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredStep {
    pub id: i64,
    #[serde(rename = "type")]
    pub phase: CpaPhase,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub difficulty_level: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<DeliveredQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonHeader {
    pub id: i64,
    pub title: String,
    pub subject: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerCheckRequest {
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerCheckResponse {
    pub step_id: i64,
    pub correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}
