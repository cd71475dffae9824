use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyClaimResponse {
    pub message: String,
    pub xp_gained: i64,
    pub bonus_xp: i64,
    pub xp: i64,
    pub streak: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpAwardRequest {
    pub user_id: i64,
    pub amount: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpAwardResponse {
    pub user_id: i64,
    pub new_xp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeView {
    pub label: String,
    pub awarded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpSummary {
    pub user_id: i64,
    pub current_xp: i64,
    pub streak: i64,
    pub last_active: Option<DateTime<Utc>>,
    pub badges: Vec<BadgeView>,
}
