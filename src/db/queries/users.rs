use chrono::Utc;
use learnify_schema::Role;
use learnify_schema::users::UserCreate;
use sqlx::SqlitePool;

use crate::db::models::DbUser;
use crate::error::LearnifyError;

pub async fn create_user(pool: &SqlitePool, user: UserCreate) -> Result<DbUser, LearnifyError> {
    let row = sqlx::query_as::<_, DbUser>(
        r"
        INSERT INTO users (name, email, role, age, grade_level, xp, streak, last_active, created_at)
        VALUES (?, ?, ?, ?, ?, 0, 0, NULL, ?)
        RETURNING id, name, email, role, age, grade_level, xp, streak, last_active, created_at
        ",
    )
    .bind(user.name)
    .bind(user.email)
    .bind(user.role.as_str())
    .bind(user.age)
    .bind(user.grade_level)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<Option<DbUser>, LearnifyError> {
    let row = sqlx::query_as::<_, DbUser>(
        r"
        SELECT id, name, email, role, age, grade_level, xp, streak, last_active, created_at
        FROM users
        WHERE id = ?
        ",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Links a student to a parent account; repeated links are a no-op.
pub async fn link_parent(
    pool: &SqlitePool,
    parent_id: i64,
    student_id: i64,
) -> Result<(), LearnifyError> {
    let parent = get_user(pool, parent_id)
        .await?
        .ok_or_else(|| LearnifyError::not_found(format!("User {parent_id}")))?;
    let student = get_user(pool, student_id)
        .await?
        .ok_or_else(|| LearnifyError::not_found(format!("User {student_id}")))?;

    if parent.role != Role::Parent.as_str() {
        return Err(LearnifyError::validation(
            "INVALID_PARENT",
            "target account is not a parent",
        ));
    }
    if student.role != Role::Student.as_str() {
        return Err(LearnifyError::validation(
            "INVALID_STUDENT",
            "linked account is not a student",
        ));
    }

    sqlx::query(
        r"
        INSERT INTO parent_links (parent_id, student_id, created_at)
        VALUES (?, ?, ?)
        ON CONFLICT(parent_id, student_id) DO NOTHING
        ",
    )
    .bind(parent_id)
    .bind(student_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn is_parent_of(
    pool: &SqlitePool,
    parent_id: i64,
    student_id: i64,
) -> Result<bool, LearnifyError> {
    let linked: Option<i64> = sqlx::query_scalar(
        r"
        SELECT 1 FROM parent_links WHERE parent_id = ? AND student_id = ?
        ",
    )
    .bind(parent_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await?;

    Ok(linked.is_some())
}
