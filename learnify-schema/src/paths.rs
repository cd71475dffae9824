use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeCreate {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lesson_id: Option<i64>,
    #[serde(default)]
    pub skill: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPathCreate {
    pub title: String,
    pub subject_id: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub nodes: Vec<NodeCreate>,
}

/// Snapshot of a learner's position in a path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathProgressState {
    pub current_node_id: Option<i64>,
    pub completed_node_ids: Vec<i64>,
    pub mastered_skills: Vec<String>,
    pub in_progress_skills: Vec<String>,
    pub overall_progress: i64,
}
