//! Persistent storage behind a single actor.
//!
//! Layout:
//! - `models.rs`: row structs
//! - `schema.rs`: SQLite DDL applied at startup
//! - `queries/`: plain async functions over the pool, one file per area
//! - `actor.rs`: the `DbActor` that owns the pool and serves queries over RPC

pub mod actor;
pub mod models;
pub mod queries;
pub mod schema;

pub use actor::{DailyClaim, DbActorHandle, DbActorMessage, DiagnosticSubmission, LessonCompletion, spawn};
pub use schema::SQLITE_INIT;
