pub const YOUNG: &str = "5-7";
pub const MIDDLE: &str = "8-11";
pub const OLDER: &str = "12-14";

/// Lookback window for avoiding repeated daily content.
pub const REPEAT_WINDOW_DAYS: i64 = 7;

pub const MOOD_INTENSITY: std::ops::RangeInclusive<i64> = 1..=10;

pub fn age_group(age: Option<i64>) -> &'static str {
    match age {
        Some(a) if a < 8 => YOUNG,
        Some(a) if a >= 12 => OLDER,
        _ => MIDDLE,
    }
}

pub fn validate_age_group(group: &str) -> bool {
    matches!(group, YOUNG | MIDDLE | OLDER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_boundaries() {
        assert_eq!(age_group(Some(7)), "5-7");
        assert_eq!(age_group(Some(8)), "8-11");
        assert_eq!(age_group(Some(11)), "8-11");
        assert_eq!(age_group(Some(12)), "12-14");
        assert_eq!(age_group(None), "8-11");
    }

    #[test]
    fn only_known_groups_validate() {
        assert!(validate_age_group("12-14"));
        assert!(!validate_age_group("15-18"));
    }
}
