use chrono::Utc;
use learnify_schema::lessons::{LessonCreate, SubjectCreate};
use learnify_schema::quizzes::{QuizAttemptCreate, QuizCreate};
use sqlx::SqlitePool;
use sqlx::types::Json;
use tracing::debug;

use crate::db::models::{DbLesson, DbLessonStep, DbQuiz, DbQuizAttempt, DbSubject};
use crate::error::LearnifyError;

const LESSON_COLUMNS: &str = r"
    l.id, l.title, l.description, l.subject_id, s.name AS subject,
    l.level, l.content, l.created_by, l.created_at
";

pub async fn create_subject(
    pool: &SqlitePool,
    subject: SubjectCreate,
) -> Result<DbSubject, LearnifyError> {
    let row = sqlx::query_as::<_, DbSubject>(
        r"
        INSERT INTO subjects (name, color, created_at)
        VALUES (?, ?, ?)
        RETURNING id, name, color, created_at
        ",
    )
    .bind(subject.name)
    .bind(subject.color)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn list_subjects(pool: &SqlitePool) -> Result<Vec<DbSubject>, LearnifyError> {
    let rows = sqlx::query_as::<_, DbSubject>(
        r"
        SELECT id, name, color, created_at FROM subjects ORDER BY name
        ",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Inserts a lesson and its steps in one transaction. Step order follows the
/// request order.
pub async fn create_lesson(
    pool: &SqlitePool,
    lesson: LessonCreate,
    created_by: i64,
) -> Result<i64, LearnifyError> {
    let mut tx = pool.begin().await?;

    let lesson_id: i64 = sqlx::query_scalar(
        r"
        INSERT INTO lessons (title, description, subject_id, level, content, created_by, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        ",
    )
    .bind(&lesson.title)
    .bind(&lesson.description)
    .bind(lesson.subject_id)
    .bind(&lesson.level)
    .bind(&lesson.content)
    .bind(created_by)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    for (position, step) in lesson.steps.into_iter().enumerate() {
        sqlx::query(
            r"
            INSERT INTO lesson_steps (lesson_id, position, phase, content, image_url, difficulty_level, question)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(lesson_id)
        .bind(i64::try_from(position).unwrap_or(i64::MAX))
        .bind(step.phase.as_str())
        .bind(step.content)
        .bind(step.image_url)
        .bind(i64::from(step.difficulty_level))
        .bind(step.question.map(Json))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    debug!(lesson_id, "lesson created");
    Ok(lesson_id)
}

pub async fn list_lessons(pool: &SqlitePool) -> Result<Vec<DbLesson>, LearnifyError> {
    let sql = format!(
        "SELECT {LESSON_COLUMNS} FROM lessons l JOIN subjects s ON s.id = l.subject_id \
         ORDER BY l.created_at DESC, l.id DESC"
    );
    let rows = sqlx::query_as::<_, DbLesson>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn get_lesson(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<(DbLesson, Vec<DbLessonStep>)>, LearnifyError> {
    let sql = format!(
        "SELECT {LESSON_COLUMNS} FROM lessons l JOIN subjects s ON s.id = l.subject_id WHERE l.id = ?"
    );
    let Some(lesson) = sqlx::query_as::<_, DbLesson>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
    else {
        return Ok(None);
    };

    let steps = sqlx::query_as::<_, DbLessonStep>(
        r"
        SELECT id, lesson_id, position, phase, content, image_url, difficulty_level, question
        FROM lesson_steps
        WHERE lesson_id = ?
        ORDER BY position
        ",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Some((lesson, steps)))
}

pub async fn create_quiz(pool: &SqlitePool, quiz: QuizCreate) -> Result<DbQuiz, LearnifyError> {
    let row = sqlx::query_as::<_, DbQuiz>(
        r"
        INSERT INTO quizzes (title, subject_id, created_at)
        VALUES (?, ?, ?)
        RETURNING id, title, subject_id, created_at
        ",
    )
    .bind(quiz.title)
    .bind(quiz.subject_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn record_quiz_attempt(
    pool: &SqlitePool,
    quiz_id: i64,
    user_id: i64,
    attempt: QuizAttemptCreate,
) -> Result<DbQuizAttempt, LearnifyError> {
    let row = sqlx::query_as::<_, DbQuizAttempt>(
        r"
        INSERT INTO quiz_attempts (quiz_id, user_id, score, time_spent_minutes, completed_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, quiz_id, user_id, score, time_spent_minutes, completed_at
        ",
    )
    .bind(quiz_id)
    .bind(user_id)
    .bind(attempt.score)
    .bind(attempt.time_spent_minutes)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}
