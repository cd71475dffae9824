use chrono::Utc;
use learnify_rules::xp::{SOURCE_ACHIEVEMENT, SOURCE_LESSON, subject_achievement};
use learnify_schema::progress::{AchievementAward, GradedResponse};
use sqlx::types::Json;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::db::models::DbLessonProgress;
use crate::error::LearnifyError;

/// A graded lesson attempt, ready to persist.
#[derive(Debug, Clone)]
pub struct LessonCompletion {
    pub user_id: i64,
    pub lesson_id: i64,
    pub subject_id: i64,
    pub subject: String,
    pub difficulty: u8,
    pub accuracy: f64,
    pub xp: i64,
    pub responses: BTreeMap<i64, GradedResponse>,
}

pub async fn get_progress(
    pool: &SqlitePool,
    user_id: i64,
    lesson_id: i64,
) -> Result<Option<DbLessonProgress>, LearnifyError> {
    let row = sqlx::query_as::<_, DbLessonProgress>(
        r"
        SELECT id, user_id, lesson_id, completed, attempts_count, highest_difficulty_completed,
               best_accuracy, response_data, last_attempt_at
        FROM lesson_progress
        WHERE user_id = ? AND lesson_id = ?
        ",
    )
    .bind(user_id)
    .bind(lesson_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub(crate) async fn add_xp(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: i64,
    amount: i64,
    source: &str,
    reason: Option<&str>,
) -> Result<i64, LearnifyError> {
    let new_xp: i64 = sqlx::query_scalar(
        r"
        UPDATE users SET xp = xp + ? WHERE id = ? RETURNING xp
        ",
    )
    .bind(amount)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| LearnifyError::not_found(format!("User {user_id}")))?;

    sqlx::query(
        r"
        INSERT INTO xp_transactions (user_id, amount, source, reason, created_at)
        VALUES (?, ?, ?, ?, ?)
        ",
    )
    .bind(user_id)
    .bind(amount)
    .bind(source)
    .bind(reason)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    Ok(new_xp)
}

/// Records the attempt, awards lesson XP and any subject milestone in one
/// transaction. Returns the milestones newly earned by this attempt.
pub async fn complete_lesson(
    pool: &SqlitePool,
    done: LessonCompletion,
) -> Result<Vec<AchievementAward>, LearnifyError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r"
        INSERT INTO lesson_progress (
            user_id, lesson_id, completed, attempts_count, highest_difficulty_completed,
            best_accuracy, response_data, last_attempt_at
        )
        VALUES (?, ?, 1, 1, ?, ?, ?, ?)
        ON CONFLICT(user_id, lesson_id) DO UPDATE SET
            completed = 1,
            attempts_count = attempts_count + 1,
            highest_difficulty_completed = MAX(highest_difficulty_completed, excluded.highest_difficulty_completed),
            best_accuracy = MAX(best_accuracy, excluded.best_accuracy),
            response_data = excluded.response_data,
            last_attempt_at = excluded.last_attempt_at
        ",
    )
    .bind(done.user_id)
    .bind(done.lesson_id)
    .bind(i64::from(done.difficulty))
    .bind(done.accuracy)
    .bind(Json(&done.responses))
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let reason = format!("Completed lesson {}", done.lesson_id);
    add_xp(&mut tx, done.user_id, done.xp, SOURCE_LESSON, Some(reason.as_str())).await?;

    let completed_in_subject: i64 = sqlx::query_scalar(
        r"
        SELECT COUNT(*)
        FROM lesson_progress lp
        JOIN lessons l ON l.id = lp.lesson_id
        WHERE lp.user_id = ? AND l.subject_id = ? AND lp.completed = 1
        ",
    )
    .bind(done.user_id)
    .bind(done.subject_id)
    .fetch_one(&mut *tx)
    .await?;

    let mut earned = Vec::new();
    if let Some(award) = subject_achievement(completed_in_subject, &done.subject) {
        let inserted = sqlx::query(
            r"
            INSERT INTO achievements (
                user_id, achievement_type, subject_id, name, description, xp_awarded, awarded_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, achievement_type, subject_id) DO NOTHING
            ",
        )
        .bind(done.user_id)
        .bind(&award.achievement_type)
        .bind(done.subject_id)
        .bind(&award.name)
        .bind(&award.description)
        .bind(award.xp_awarded)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 1 {
            add_xp(
                &mut tx,
                done.user_id,
                award.xp_awarded,
                SOURCE_ACHIEVEMENT,
                Some(award.name.as_str()),
            )
            .await?;
            info!(
                user_id = done.user_id,
                achievement = %award.achievement_type,
                subject = %done.subject,
                "achievement unlocked"
            );
            earned.push(award);
        }
    }

    tx.commit().await?;
    debug!(
        user_id = done.user_id,
        lesson_id = done.lesson_id,
        xp = done.xp,
        completed_in_subject,
        "lesson completion recorded"
    );
    Ok(earned)
}
