use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodCreate {
    pub mood: String,
    pub intensity: i64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffirmationCreate {
    pub text: String,
    pub age_group: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindfulnessPromptCreate {
    pub title: String,
    pub instructions: String,
    pub age_group: String,
    #[serde(default = "default_duration")]
    pub duration_minutes: i64,
}

fn default_duration() -> i64 {
    3
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionRequest {
    #[serde(default)]
    pub reflection: Option<String>,
}
