//! SQL for each table group. Every function takes the pool (or an open
//! transaction) owned by the `DbActor`.

pub mod analytics;
pub mod content;
pub mod diagnostic;
pub mod graph;
pub mod paths;
pub mod profile;
pub mod progress;
pub mod sel;
pub mod users;
pub mod xp;
