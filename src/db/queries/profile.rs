use chrono::Utc;
use learnify_schema::peer::TeachBackCreate;
use learnify_schema::styles::LearningStyleProfileInput;
use sqlx::SqlitePool;

use crate::db::models::{DbLearningStyleProfile, DbTeachBack};
use crate::error::LearnifyError;

pub async fn upsert_style_profile(
    pool: &SqlitePool,
    user_id: i64,
    input: LearningStyleProfileInput,
) -> Result<DbLearningStyleProfile, LearnifyError> {
    let row = sqlx::query_as::<_, DbLearningStyleProfile>(
        r"
        INSERT INTO learning_style_profiles (
            user_id, visual, auditory, reading, kinesthetic, dominant_style, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            visual = excluded.visual,
            auditory = excluded.auditory,
            reading = excluded.reading,
            kinesthetic = excluded.kinesthetic,
            dominant_style = excluded.dominant_style,
            updated_at = excluded.updated_at
        RETURNING user_id, visual, auditory, reading, kinesthetic, dominant_style, updated_at
        ",
    )
    .bind(user_id)
    .bind(input.visual)
    .bind(input.auditory)
    .bind(input.reading)
    .bind(input.kinesthetic)
    .bind(input.dominant_style.as_str())
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn get_style_profile(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Option<DbLearningStyleProfile>, LearnifyError> {
    let row = sqlx::query_as::<_, DbLearningStyleProfile>(
        r"
        SELECT user_id, visual, auditory, reading, kinesthetic, dominant_style, updated_at
        FROM learning_style_profiles
        WHERE user_id = ?
        ",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn record_teach_back(
    pool: &SqlitePool,
    user_id: i64,
    response: TeachBackCreate,
) -> Result<DbTeachBack, LearnifyError> {
    let row = sqlx::query_as::<_, DbTeachBack>(
        r"
        INSERT INTO teach_back_responses (user_id, session_id, question_id, answer, correct, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, user_id, session_id, question_id, answer, correct, created_at
        ",
    )
    .bind(user_id)
    .bind(response.session_id)
    .bind(response.question_id)
    .bind(response.answer)
    .bind(response.correct)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}
