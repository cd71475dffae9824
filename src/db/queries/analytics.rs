use chrono::{DateTime, Utc};
use learnify_rules::analytics::{ActivityData, LessonRecord, QuizRecord, SessionRecord, XpRecord};
use learnify_schema::SessionKind;
use learnify_schema::analytics::StudySessionCreate;
use sqlx::SqlitePool;
use tracing::warn;

use crate::db::models::DbStudySession;
use crate::error::LearnifyError;

const NO_SUBJECT: &str = "General";

pub async fn record_study_session(
    pool: &SqlitePool,
    user_id: i64,
    session: StudySessionCreate,
) -> Result<DbStudySession, LearnifyError> {
    let row = sqlx::query_as::<_, DbStudySession>(
        r"
        INSERT INTO study_sessions (user_id, kind, subject_id, start_time, end_time, notes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id, user_id, kind, subject_id, start_time, end_time, notes, created_at
        ",
    )
    .bind(user_id)
    .bind(session.kind.as_str())
    .bind(session.subject_id)
    .bind(session.start_time)
    .bind(session.end_time)
    .bind(session.notes)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Sessions starting in `[from, until)`, oldest first.
pub async fn list_study_sessions(
    pool: &SqlitePool,
    user_id: i64,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<DbStudySession>, LearnifyError> {
    let rows = sqlx::query_as::<_, DbStudySession>(
        r"
        SELECT id, user_id, kind, subject_id, start_time, end_time, notes, created_at
        FROM study_sessions
        WHERE user_id = ? AND start_time >= ? AND start_time < ?
        ORDER BY start_time
        ",
    )
    .bind(user_id)
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Everything the analytics rules aggregate over, optionally narrowed to one
/// subject. XP is never subject-scoped.
pub async fn activity_data(
    pool: &SqlitePool,
    user_id: i64,
    subject_id: Option<i64>,
) -> Result<ActivityData, LearnifyError> {
    let lessons: Vec<(String, String, f64, DateTime<Utc>)> = sqlx::query_as(
        r"
        SELECT l.title, s.name, lp.best_accuracy, lp.last_attempt_at
        FROM lesson_progress lp
        JOIN lessons l ON l.id = lp.lesson_id
        JOIN subjects s ON s.id = l.subject_id
        WHERE lp.user_id = ? AND (? IS NULL OR l.subject_id = ?)
        ",
    )
    .bind(user_id)
    .bind(subject_id)
    .bind(subject_id)
    .fetch_all(pool)
    .await?;

    let quizzes: Vec<(String, String, f64, DateTime<Utc>, Option<i64>)> = sqlx::query_as(
        r"
        SELECT q.title, s.name, qa.score, qa.completed_at, qa.time_spent_minutes
        FROM quiz_attempts qa
        JOIN quizzes q ON q.id = qa.quiz_id
        JOIN subjects s ON s.id = q.subject_id
        WHERE qa.user_id = ? AND (? IS NULL OR q.subject_id = ?)
        ",
    )
    .bind(user_id)
    .bind(subject_id)
    .bind(subject_id)
    .fetch_all(pool)
    .await?;

    let sessions: Vec<(String, Option<String>, DateTime<Utc>, Option<DateTime<Utc>>)> =
        sqlx::query_as(
            r"
        SELECT ss.kind, s.name, ss.start_time, ss.end_time
        FROM study_sessions ss
        LEFT JOIN subjects s ON s.id = ss.subject_id
        WHERE ss.user_id = ? AND (? IS NULL OR ss.subject_id = ?)
        ",
        )
        .bind(user_id)
        .bind(subject_id)
        .bind(subject_id)
        .fetch_all(pool)
        .await?;

    let xp: Vec<(i64, DateTime<Utc>)> = sqlx::query_as(
        r"
        SELECT amount, created_at FROM xp_transactions WHERE user_id = ?
        ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(ActivityData {
        lessons: lessons
            .into_iter()
            .map(|(title, subject, accuracy, date)| LessonRecord {
                title,
                subject,
                score: accuracy * 100.0,
                date,
            })
            .collect(),
        quizzes: quizzes
            .into_iter()
            .map(|(title, subject, score, date, minutes)| QuizRecord {
                title,
                subject,
                score,
                date,
                minutes,
            })
            .collect(),
        sessions: sessions
            .into_iter()
            .filter_map(|(kind, subject, start, end)| {
                let kind = kind
                    .parse::<SessionKind>()
                    .inspect_err(|e| warn!(error = %e, "skipping study session with unknown kind"))
                    .ok()?;
                Some(SessionRecord {
                    kind,
                    subject: subject.unwrap_or_else(|| NO_SUBJECT.to_string()),
                    start,
                    end,
                })
            })
            .collect(),
        xp: xp
            .into_iter()
            .map(|(amount, date)| XpRecord { amount, date })
            .collect(),
    })
}
