pub mod adaptation;
pub mod analytics;
pub mod diagnostic;
pub mod difficulty;
pub mod paths;
pub mod sel;
pub mod streak;
pub mod xp;

pub use difficulty::{Adjustment, Difficulty, DifficultyTracker, ReplayOutcome};
pub use streak::{StreakOutcome, claim_daily};
