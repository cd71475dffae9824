use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::SessionKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySessionCreate {
    #[serde(rename = "type")]
    pub kind: SessionKind,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub subject_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPerformance {
    pub subject: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySlice {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub subject: String,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub score: i64,
    pub time_spent: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VelocityPoint {
    pub date: NaiveDate,
    pub velocity: i64,
    pub xp_per_day: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    pub day: String,
    pub week: u32,
    pub value: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodChange {
    pub score_change: i64,
    pub time_change: i64,
    pub xp_change: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub average_score: i64,
    pub total_study_time: i64,
    pub total_xp: i64,
    pub subject_performance: Vec<SubjectPerformance>,
    pub activity_distribution: Vec<ActivitySlice>,
    pub recent_activities: Vec<RecentActivity>,
    pub performance_trend: Vec<TrendPoint>,
    pub learning_velocity: Vec<VelocityPoint>,
    pub study_heatmap: Vec<HeatmapCell>,
    /// Absent for the `all` window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<PeriodChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedPoint {
    pub date: NaiveDate,
    pub projected_score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub action_text: Option<String>,
    #[serde(default, alias = "actionUrl")]
    pub action_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveInsights {
    pub predictions: Vec<ProjectedPoint>,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceResponse {
    pub user_id: i64,
    pub time_range: crate::TimeRange,
    #[serde(flatten)]
    pub summary: PerformanceSummary,
    /// Only present once enough activity exists to project from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predictive_insights: Option<PredictiveInsights>,
}
