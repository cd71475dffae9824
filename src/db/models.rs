use chrono::{DateTime, NaiveDate, Utc};
use learnify_rules::Difficulty;
use learnify_rules::adaptation::StoredStep;
use learnify_schema::{CpaPhase, QuestionData};
use learnify_schema::diagnostic::{Evaluation, SkillScore};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use crate::error::LearnifyError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub age: Option<i64>,
    pub grade_level: Option<String>,
    pub xp: i64,
    pub streak: i64,
    pub last_active: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbBadge {
    pub id: i64,
    pub user_id: i64,
    pub label: String,
    pub awarded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbSubject {
    pub id: i64,
    pub name: String,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Lesson joined with its subject name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbLesson {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub subject_id: i64,
    pub subject: String,
    pub level: String,
    pub content: String,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbLessonStep {
    pub id: i64,
    pub lesson_id: i64,
    pub position: i64,
    pub phase: String,
    pub content: String,
    pub image_url: Option<String>,
    pub difficulty_level: i64,
    pub question: Option<Json<QuestionData>>,
}

impl DbLessonStep {
    pub fn into_stored(self) -> Result<StoredStep, LearnifyError> {
        let phase = self
            .phase
            .parse::<CpaPhase>()
            .map_err(|e| LearnifyError::Unexpected(format!("lesson step {}: {e}", self.id)))?;
        Ok(StoredStep {
            id: self.id,
            phase,
            content: self.content,
            image_url: self.image_url,
            difficulty: Difficulty::new(self.difficulty_level),
            question: self.question.map(|Json(q)| q),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbLessonProgress {
    pub id: i64,
    pub user_id: i64,
    pub lesson_id: i64,
    pub completed: bool,
    pub attempts_count: i64,
    pub highest_difficulty_completed: i64,
    pub best_accuracy: f64,
    pub response_data: Json<serde_json::Value>,
    pub last_attempt_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbXpTransaction {
    pub id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub source: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbQuiz {
    pub id: i64,
    pub title: String,
    pub subject_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbQuizAttempt {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,
    pub score: f64,
    pub time_spent_minutes: Option<i64>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbStudySession {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub subject_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbDiagnosticQuestion {
    pub id: i64,
    pub subject_id: i64,
    pub topic: Option<String>,
    pub question: String,
    pub options: Json<Vec<String>>,
    pub correct_answer: String,
    pub difficulty: i64,
    pub skill: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbDiagnosticResult {
    pub id: i64,
    pub user_id: i64,
    pub subject_id: i64,
    pub responses: Json<Vec<Evaluation>>,
    pub skill_scores: Json<Vec<SkillScore>>,
    pub overall_proficiency: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbLearningPath {
    pub id: i64,
    pub title: String,
    pub subject_id: i64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbLearningPathNode {
    pub id: i64,
    pub path_id: i64,
    pub position: i64,
    pub title: String,
    pub description: Option<String>,
    pub lesson_id: Option<i64>,
    pub skill: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbLearningPathProgress {
    pub id: i64,
    pub user_id: i64,
    pub path_id: i64,
    pub current_node_id: Option<i64>,
    pub completed_node_ids: Json<Vec<i64>>,
    pub mastered_skills: Json<Vec<String>>,
    pub in_progress_skills: Json<Vec<String>>,
    pub overall_progress: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbConcept {
    pub id: i64,
    pub name: String,
    pub subject_id: i64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbConceptConnection {
    pub id: i64,
    pub source_id: i64,
    pub target_id: i64,
    pub strength: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbMoodEntry {
    pub id: i64,
    pub user_id: i64,
    pub mood: String,
    pub intensity: i64,
    pub note: Option<String>,
    pub factors: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbAffirmation {
    pub id: i64,
    pub text: String,
    pub age_group: String,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Today's affirmation for a learner, joined with its text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbDailyAffirmation {
    pub id: i64,
    pub user_id: i64,
    pub affirmation_id: i64,
    pub day: NaiveDate,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub reflection: Option<String>,
    pub text: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbMindfulnessPrompt {
    pub id: i64,
    pub title: String,
    pub instructions: String,
    pub age_group: String,
    pub duration_minutes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbDailyMindfulness {
    pub id: i64,
    pub user_id: i64,
    pub prompt_id: i64,
    pub day: NaiveDate,
    pub completed_at: Option<DateTime<Utc>>,
    pub reflection: Option<String>,
    pub title: String,
    pub instructions: String,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbLearningStyleProfile {
    pub user_id: i64,
    pub visual: f64,
    pub auditory: f64,
    pub reading: f64,
    pub kinesthetic: f64,
    pub dominant_style: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbTeachBack {
    pub id: i64,
    pub user_id: i64,
    pub session_id: String,
    pub question_id: String,
    pub answer: String,
    pub correct: bool,
    pub created_at: DateTime<Utc>,
}
