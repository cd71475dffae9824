use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub student_response: String,
    pub question_context: String,
    #[serde(default)]
    pub subject_area: Option<String>,
    #[serde(default)]
    pub learning_objectives: Option<Vec<String>>,
    #[serde(default)]
    pub student_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedResource {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Structured feedback returned by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub overall_feedback: String,
    #[serde(default)]
    pub strength_points: Vec<String>,
    #[serde(default)]
    pub improvement_points: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub conceptual_understanding: Option<String>,
    #[serde(default)]
    pub suggested_resources: Vec<SuggestedResource>,
    #[serde(default)]
    pub misconceptions: Vec<String>,
}
