use chrono::Utc;
use learnify_schema::graph::{ConceptCreate, ConnectionCreate, GraphConcept, GraphEdge, KnowledgeGraph};
use sqlx::SqlitePool;
use std::collections::HashSet;

use crate::db::models::{DbConcept, DbConceptConnection};
use crate::error::LearnifyError;

pub async fn create_concept(
    pool: &SqlitePool,
    concept: ConceptCreate,
) -> Result<DbConcept, LearnifyError> {
    let row = sqlx::query_as::<_, DbConcept>(
        r"
        INSERT INTO concepts (name, subject_id, description, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING id, name, subject_id, description, created_at
        ",
    )
    .bind(concept.name)
    .bind(concept.subject_id)
    .bind(concept.description)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn create_connection(
    pool: &SqlitePool,
    connection: ConnectionCreate,
) -> Result<DbConceptConnection, LearnifyError> {
    let row = sqlx::query_as::<_, DbConceptConnection>(
        r"
        INSERT INTO concept_connections (source_id, target_id, strength, kind)
        VALUES (?, ?, ?, ?)
        RETURNING id, source_id, target_id, strength, kind
        ",
    )
    .bind(connection.source_id)
    .bind(connection.target_id)
    .bind(connection.strength)
    .bind(connection.kind)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Concepts the learner has a mastery record for, and the connections whose
/// both ends are among them.
pub async fn knowledge_graph(
    pool: &SqlitePool,
    user_id: i64,
    subject_id: Option<i64>,
) -> Result<KnowledgeGraph, LearnifyError> {
    let concepts: Vec<(i64, String, Option<String>, f64)> = sqlx::query_as(
        r"
        SELECT c.id, c.name, c.description, cm.mastery_level
        FROM concept_mastery cm
        JOIN concepts c ON c.id = cm.concept_id
        WHERE cm.user_id = ? AND (? IS NULL OR c.subject_id = ?)
        ORDER BY c.name
        ",
    )
    .bind(user_id)
    .bind(subject_id)
    .bind(subject_id)
    .fetch_all(pool)
    .await?;

    let ids: HashSet<i64> = concepts.iter().map(|c| c.0).collect();

    let edges: Vec<(i64, i64, f64, String)> = sqlx::query_as(
        r"
        SELECT cc.source_id, cc.target_id, cc.strength, cc.kind
        FROM concept_connections cc
        JOIN concept_mastery ms ON ms.concept_id = cc.source_id AND ms.user_id = ?
        JOIN concept_mastery mt ON mt.concept_id = cc.target_id AND mt.user_id = ?
        ORDER BY cc.id
        ",
    )
    .bind(user_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(KnowledgeGraph {
        concepts: concepts
            .into_iter()
            .map(|(id, name, description, mastery_level)| GraphConcept {
                id,
                name,
                description,
                mastery_level,
            })
            .collect(),
        connections: edges
            .into_iter()
            .filter(|(source, target, ..)| ids.contains(source) && ids.contains(target))
            .map(|(source, target, strength, kind)| GraphEdge {
                source,
                target,
                strength,
                kind,
            })
            .collect(),
    })
}
