use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeachBackCreate {
    pub session_id: String,
    pub question_id: String,
    pub answer: String,
    pub correct: bool,
}
