use chrono::Utc;
use learnify_rules::paths;
use learnify_schema::paths::{LearningPathCreate, PathProgressState};
use sqlx::types::Json;
use sqlx::{SqliteConnection, SqlitePool};

use crate::db::models::{DbLearningPath, DbLearningPathNode, DbLearningPathProgress};
use crate::error::LearnifyError;

pub async fn create_path(pool: &SqlitePool, path: LearningPathCreate) -> Result<i64, LearnifyError> {
    let mut tx = pool.begin().await?;

    let path_id: i64 = sqlx::query_scalar(
        r"
        INSERT INTO learning_paths (title, subject_id, description, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING id
        ",
    )
    .bind(path.title)
    .bind(path.subject_id)
    .bind(path.description)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    for (position, node) in path.nodes.into_iter().enumerate() {
        sqlx::query(
            r"
            INSERT INTO learning_path_nodes (path_id, position, title, description, lesson_id, skill)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(path_id)
        .bind(i64::try_from(position).unwrap_or(i64::MAX))
        .bind(node.title)
        .bind(node.description)
        .bind(node.lesson_id)
        .bind(node.skill)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(path_id)
}

pub async fn get_path(
    pool: &SqlitePool,
    path_id: i64,
) -> Result<Option<(DbLearningPath, Vec<DbLearningPathNode>)>, LearnifyError> {
    let Some(path) = sqlx::query_as::<_, DbLearningPath>(
        r"
        SELECT id, title, subject_id, description, created_at FROM learning_paths WHERE id = ?
        ",
    )
    .bind(path_id)
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    let nodes = sqlx::query_as::<_, DbLearningPathNode>(
        r"
        SELECT id, path_id, position, title, description, lesson_id, skill
        FROM learning_path_nodes
        WHERE path_id = ?
        ORDER BY position
        ",
    )
    .bind(path_id)
    .fetch_all(pool)
    .await?;

    Ok(Some((path, nodes)))
}

pub async fn get_progress(
    pool: &SqlitePool,
    user_id: i64,
    path_id: i64,
) -> Result<Option<DbLearningPathProgress>, LearnifyError> {
    let row = sqlx::query_as::<_, DbLearningPathProgress>(
        r"
        SELECT id, user_id, path_id, current_node_id, completed_node_ids, mastered_skills,
               in_progress_skills, overall_progress, updated_at
        FROM learning_path_progress
        WHERE user_id = ? AND path_id = ?
        ",
    )
    .bind(user_id)
    .bind(path_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Node ids of an existing path in order; a missing path is an error.
pub(crate) async fn node_ids(
    conn: &mut SqliteConnection,
    path_id: i64,
) -> Result<Vec<i64>, LearnifyError> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM learning_paths WHERE id = ?")
        .bind(path_id)
        .fetch_optional(&mut *conn)
        .await?;
    if exists.is_none() {
        return Err(LearnifyError::not_found(format!("Learning path {path_id}")));
    }

    let ids = sqlx::query_scalar(
        r"
        SELECT id FROM learning_path_nodes WHERE path_id = ? ORDER BY position
        ",
    )
    .bind(path_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(ids)
}

pub(crate) async fn load_progress_state(
    conn: &mut SqliteConnection,
    user_id: i64,
    path_id: i64,
) -> Result<Option<PathProgressState>, LearnifyError> {
    let row: Option<(Option<i64>, Json<Vec<i64>>, Json<Vec<String>>, Json<Vec<String>>, i64)> =
        sqlx::query_as(
            r"
            SELECT current_node_id, completed_node_ids, mastered_skills, in_progress_skills, overall_progress
            FROM learning_path_progress
            WHERE user_id = ? AND path_id = ?
            ",
        )
        .bind(user_id)
        .bind(path_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(
        |(current_node_id, completed, mastered, in_progress, overall_progress)| PathProgressState {
            current_node_id,
            completed_node_ids: completed.0,
            mastered_skills: mastered.0,
            in_progress_skills: in_progress.0,
            overall_progress,
        },
    ))
}

pub(crate) async fn save_progress_state(
    conn: &mut SqliteConnection,
    user_id: i64,
    path_id: i64,
    state: &PathProgressState,
) -> Result<DbLearningPathProgress, LearnifyError> {
    let row = sqlx::query_as::<_, DbLearningPathProgress>(
        r"
        INSERT INTO learning_path_progress (
            user_id, path_id, current_node_id, completed_node_ids, mastered_skills,
            in_progress_skills, overall_progress, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id, path_id) DO UPDATE SET
            current_node_id = excluded.current_node_id,
            completed_node_ids = excluded.completed_node_ids,
            mastered_skills = excluded.mastered_skills,
            in_progress_skills = excluded.in_progress_skills,
            overall_progress = excluded.overall_progress,
            updated_at = excluded.updated_at
        RETURNING id, user_id, path_id, current_node_id, completed_node_ids, mastered_skills,
                  in_progress_skills, overall_progress, updated_at
        ",
    )
    .bind(user_id)
    .bind(path_id)
    .bind(state.current_node_id)
    .bind(Json(&state.completed_node_ids))
    .bind(Json(&state.mastered_skills))
    .bind(Json(&state.in_progress_skills))
    .bind(state.overall_progress)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;

    Ok(row)
}

/// Marks a node complete for the learner, creating progress on first use.
pub async fn complete_node(
    pool: &SqlitePool,
    user_id: i64,
    path_id: i64,
    node_id: i64,
) -> Result<DbLearningPathProgress, LearnifyError> {
    let mut tx = pool.begin().await?;

    let nodes = node_ids(&mut tx, path_id).await?;
    if !nodes.contains(&node_id) {
        return Err(LearnifyError::not_found(format!(
            "Node {node_id} in learning path {path_id}"
        )));
    }

    let state = load_progress_state(&mut tx, user_id, path_id)
        .await?
        .unwrap_or_else(|| paths::start(&nodes));
    let state = paths::complete_node(state, &nodes, node_id);
    let row = save_progress_state(&mut tx, user_id, path_id, &state).await?;

    tx.commit().await?;
    Ok(row)
}
