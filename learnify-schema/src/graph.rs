use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptCreate {
    pub name: String,
    pub subject_id: i64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionCreate {
    pub source_id: i64,
    pub target_id: i64,
    #[serde(default = "default_strength")]
    pub strength: f64,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
}

fn default_strength() -> f64 {
    1.0
}

fn default_kind() -> String {
    "prerequisite".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphConcept {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub mastery_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub source: i64,
    pub target: i64,
    pub strength: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeGraph {
    pub concepts: Vec<GraphConcept>,
    pub connections: Vec<GraphEdge>,
}
