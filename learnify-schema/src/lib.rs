pub mod adaptive;
pub mod analytics;
pub mod chat;
pub mod common;
pub mod diagnostic;
pub mod feedback;
pub mod graph;
pub mod lessons;
pub mod paths;
pub mod peer;
pub mod progress;
pub mod quizzes;
pub mod sel;
pub mod styles;
pub mod users;
pub mod xp;

pub use common::{CpaPhase, Role, SessionKind, TimeRange};
pub use lessons::{DeliveredQuestion, DeliveredStep, QuestionData};
