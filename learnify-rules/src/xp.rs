use learnify_schema::progress::AchievementAward;

use crate::Difficulty;

pub const SOURCE_LESSON: &str = "LESSON_COMPLETION";
pub const SOURCE_ACHIEVEMENT: &str = "ACHIEVEMENT";
pub const SOURCE_DAILY: &str = "DAILY_LOGIN";
pub const SOURCE_MANUAL: &str = "MANUAL_AWARD";

const ACCURACY_FLOOR: f64 = 0.5;

/// Share of graded answers that were correct; 0 with nothing graded.
pub fn accuracy(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(correct) / f64::from(total)
}

#[allow(clippy::cast_possible_truncation)]
pub fn accuracy_percent(correct: u32, total: u32) -> i64 {
    (accuracy(correct, total) * 100.0).round() as i64
}

/// `round(10 × difficulty × max(0.5, accuracy))`.
#[allow(clippy::cast_possible_truncation)]
pub fn lesson_xp(difficulty: Difficulty, correct: u32, total: u32) -> i64 {
    let multiplier = accuracy(correct, total).max(ACCURACY_FLOOR);
    (10.0 * f64::from(difficulty.get()) * multiplier).round() as i64
}

/// Milestone achievement for the n-th completed lesson in a subject.
pub fn subject_achievement(completed_in_subject: i64, subject: &str) -> Option<AchievementAward> {
    let (kind, name) = match completed_in_subject {
        1 => ("FIRST_LESSON", format!("First {subject} Lesson")),
        5 => ("FIVE_LESSONS", format!("{subject} Explorer")),
        10 => ("TEN_LESSONS", format!("{subject} Master")),
        _ => return None,
    };
    let plural = if completed_in_subject == 1 { "" } else { "s" };
    Some(AchievementAward {
        achievement_type: kind.to_string(),
        name,
        description: format!("Completed {completed_in_subject} {subject} lesson{plural}"),
        xp_awarded: completed_in_subject * 10,
    })
}

/// Manual awards may only add XP.
pub fn validate_award(amount: i64) -> Result<i64, &'static str> {
    if amount > 0 {
        Ok(amount)
    } else {
        Err("amount must be a positive number of XP")
    }
}
