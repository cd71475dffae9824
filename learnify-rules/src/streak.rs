use chrono::{DateTime, Utc};

pub const DAILY_XP: i64 = 10;
pub const STREAK_BONUS_XP: i64 = 5;
const BONUS_FROM: i64 = 5;
const BADGE_MILESTONES: [i64; 3] = [5, 10, 20];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreakOutcome {
    /// Already claimed on this UTC day.
    AlreadyClaimed { streak: i64 },
    Claimed {
        streak: i64,
        xp_gained: i64,
        bonus_xp: i64,
        badge: Option<String>,
    },
}

/// Daily claim by UTC calendar-day delta: 1 continues the streak, 0 is a
/// repeat, anything else (first claim, gap, skew) restarts at 1.
pub fn claim_daily(
    now: DateTime<Utc>,
    last_active: Option<DateTime<Utc>>,
    current_streak: i64,
) -> StreakOutcome {
    let delta = last_active.map(|last| (now.date_naive() - last.date_naive()).num_days());

    let streak = match delta {
        Some(0) => {
            return StreakOutcome::AlreadyClaimed {
                streak: current_streak,
            };
        }
        Some(1) => current_streak.max(0) + 1,
        _ => 1,
    };

    let bonus_xp = if streak >= BONUS_FROM { STREAK_BONUS_XP } else { 0 };
    let badge = BADGE_MILESTONES
        .contains(&streak)
        .then(|| format!("{streak}-Day Streak"));

    StreakOutcome::Claimed {
        streak,
        xp_gained: DAILY_XP + bonus_xp,
        bonus_xp,
        badge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn first_claim_starts_streak() {
        let out = claim_daily(at(10, 9), None, 0);
        assert_eq!(
            out,
            StreakOutcome::Claimed {
                streak: 1,
                xp_gained: 10,
                bonus_xp: 0,
                badge: None
            }
        );
    }

    #[test]
    fn consecutive_day_extends_even_across_midnight() {
        let out = claim_daily(at(11, 0), Some(at(10, 23)), 3);
        assert!(matches!(out, StreakOutcome::Claimed { streak: 4, .. }));
    }

    #[test]
    fn same_day_is_rejected() {
        let out = claim_daily(at(10, 22), Some(at(10, 1)), 4);
        assert_eq!(out, StreakOutcome::AlreadyClaimed { streak: 4 });
    }

    #[test]
    fn gap_resets_to_one() {
        let out = claim_daily(at(14, 9), Some(at(10, 9)), 8);
        assert!(matches!(out, StreakOutcome::Claimed { streak: 1, .. }));
    }

    #[test]
    fn clock_skew_resets_to_one() {
        let out = claim_daily(at(9, 9), Some(at(10, 9)), 8);
        assert!(matches!(out, StreakOutcome::Claimed { streak: 1, .. }));
    }

    #[test]
    fn fifth_day_earns_bonus_and_badge() {
        let out = claim_daily(at(11, 9), Some(at(10, 9)), 4);
        assert_eq!(
            out,
            StreakOutcome::Claimed {
                streak: 5,
                xp_gained: 15,
                bonus_xp: 5,
                badge: Some("5-Day Streak".to_string())
            }
        );
    }

    #[test]
    fn bonus_without_badge_between_milestones() {
        let out = claim_daily(at(11, 9), Some(at(10, 9)), 6);
        assert!(matches!(
            out,
            StreakOutcome::Claimed {
                streak: 7,
                xp_gained: 15,
                badge: None,
                ..
            }
        ));
    }
}
