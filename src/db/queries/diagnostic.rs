use chrono::Utc;
use learnify_rules::diagnostic::{AnswerKey, MasteryTally};
use learnify_rules::paths;
use learnify_schema::diagnostic::{DiagnosticQuestionCreate, DiagnosticQuestionView, DiagnosticScore};
use sqlx::SqlitePool;
use sqlx::types::Json;
use tracing::debug;

use super::paths::{load_progress_state, node_ids, save_progress_state};
use crate::db::models::DbDiagnosticQuestion;
use crate::error::LearnifyError;

const QUESTION_LIMIT: i64 = 10;

pub async fn create_question(
    pool: &SqlitePool,
    question: DiagnosticQuestionCreate,
) -> Result<i64, LearnifyError> {
    let id: i64 = sqlx::query_scalar(
        r"
        INSERT INTO diagnostic_questions (
            subject_id, topic, question, options, correct_answer, difficulty, skill, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        ",
    )
    .bind(question.subject_id)
    .bind(question.topic)
    .bind(question.question)
    .bind(Json(question.options))
    .bind(question.correct_answer)
    .bind(i64::from(question.difficulty))
    .bind(question.skill)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(id)
}

fn to_view(row: DbDiagnosticQuestion) -> DiagnosticQuestionView {
    DiagnosticQuestionView {
        id: row.id,
        question: row.question,
        options: row.options.0,
        difficulty: u8::try_from(row.difficulty).unwrap_or(1),
        skill: row.skill,
    }
}

/// Up to ten placement questions, easiest first. With a topic, questions whose
/// topic contains it; when none match, questions with no topic.
pub async fn placement_questions(
    pool: &SqlitePool,
    subject_id: i64,
    topic: Option<&str>,
) -> Result<Vec<DiagnosticQuestionView>, LearnifyError> {
    const SELECT: &str = r"
        SELECT id, subject_id, topic, question, options, correct_answer, difficulty, skill
        FROM diagnostic_questions
    ";

    let rows = match topic.map(str::trim).filter(|t| !t.is_empty()) {
        Some(topic) => {
            let sql = format!(
                "{SELECT} WHERE subject_id = ? AND instr(topic, ?) > 0 ORDER BY difficulty, id LIMIT ?"
            );
            let matched = sqlx::query_as::<_, DbDiagnosticQuestion>(&sql)
                .bind(subject_id)
                .bind(topic)
                .bind(QUESTION_LIMIT)
                .fetch_all(pool)
                .await?;
            if matched.is_empty() {
                let sql = format!(
                    "{SELECT} WHERE subject_id = ? AND topic IS NULL ORDER BY difficulty, id LIMIT ?"
                );
                sqlx::query_as::<_, DbDiagnosticQuestion>(&sql)
                    .bind(subject_id)
                    .bind(QUESTION_LIMIT)
                    .fetch_all(pool)
                    .await?
            } else {
                matched
            }
        }
        None => {
            let sql = format!("{SELECT} WHERE subject_id = ? ORDER BY difficulty, id LIMIT ?");
            sqlx::query_as::<_, DbDiagnosticQuestion>(&sql)
                .bind(subject_id)
                .bind(QUESTION_LIMIT)
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows.into_iter().map(to_view).collect())
}

pub async fn answer_keys(pool: &SqlitePool, subject_id: i64) -> Result<Vec<AnswerKey>, LearnifyError> {
    let rows: Vec<(i64, String, String)> = sqlx::query_as(
        r"
        SELECT id, skill, correct_answer FROM diagnostic_questions WHERE subject_id = ?
        ",
    )
    .bind(subject_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, skill, correct_answer)| AnswerKey {
            id,
            skill,
            correct_answer,
        })
        .collect())
}

#[derive(Debug, Clone)]
pub struct DiagnosticSubmission {
    pub user_id: i64,
    pub subject_id: i64,
    pub learning_path_id: Option<i64>,
    pub score: DiagnosticScore,
}

/// Persists a scored diagnostic, folds skill tallies into concept mastery and
/// refreshes learning-path progress. Returns the result id.
pub async fn save_submission(
    pool: &SqlitePool,
    submission: DiagnosticSubmission,
) -> Result<i64, LearnifyError> {
    let now = Utc::now();
    let DiagnosticSubmission {
        user_id,
        subject_id,
        learning_path_id,
        score,
    } = submission;
    let mut tx = pool.begin().await?;

    let result_id: i64 = sqlx::query_scalar(
        r"
        INSERT INTO diagnostic_results (
            user_id, subject_id, responses, skill_scores, overall_proficiency, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id
        ",
    )
    .bind(user_id)
    .bind(subject_id)
    .bind(Json(&score.evaluations))
    .bind(Json(&score.skills))
    .bind(score.overall_proficiency)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    for skill in &score.skills {
        let Some(concept_id): Option<i64> = sqlx::query_scalar(
            r"
            SELECT id FROM concepts WHERE subject_id = ? AND name = ?
            ",
        )
        .bind(subject_id)
        .bind(&skill.skill)
        .fetch_optional(&mut *tx)
        .await?
        else {
            continue;
        };

        let previous: Option<(i64, i64)> = sqlx::query_as(
            r"
            SELECT correct, total FROM concept_mastery WHERE user_id = ? AND concept_id = ?
            ",
        )
        .bind(user_id)
        .bind(concept_id)
        .fetch_optional(&mut *tx)
        .await?;

        let tally = previous
            .map(|(correct, total)| MasteryTally {
                correct: u32::try_from(correct).unwrap_or(0),
                total: u32::try_from(total).unwrap_or(0),
            })
            .unwrap_or_default()
            .absorb(skill);

        sqlx::query(
            r"
            INSERT INTO concept_mastery (user_id, concept_id, correct, total, mastery_level, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, concept_id) DO UPDATE SET
                correct = excluded.correct,
                total = excluded.total,
                mastery_level = excluded.mastery_level,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user_id)
        .bind(concept_id)
        .bind(i64::from(tally.correct))
        .bind(i64::from(tally.total))
        .bind(tally.level())
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    if let Some(path_id) = learning_path_id {
        let nodes = node_ids(&mut tx, path_id).await?;
        let state = load_progress_state(&mut tx, user_id, path_id)
            .await?
            .unwrap_or_else(|| paths::start(&nodes));
        let state = paths::apply_skills(state, &score.mastered_skills, &score.in_progress_skills);
        save_progress_state(&mut tx, user_id, path_id, &state).await?;
    }

    tx.commit().await?;
    debug!(
        user_id,
        subject_id,
        result_id,
        proficiency = score.overall_proficiency,
        "diagnostic saved"
    );
    Ok(result_id)
}
