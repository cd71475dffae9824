use learnify_schema::CpaPhase;
use learnify_schema::adaptive::{AdjustmentView, Direction};
use rand::seq::IndexedRandom;

/// Answers per evaluation window.
pub const WINDOW: usize = 3;
const RAISE_ABOVE: f64 = 0.8;
const LOWER_BELOW: f64 = 0.4;

/// Difficulty level in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: Difficulty = Difficulty(1);
    pub const MAX: Difficulty = Difficulty(5);

    pub fn new(level: i64) -> Self {
        let clamped = level.clamp(i64::from(Self::MIN.0), i64::from(Self::MAX.0));
        Difficulty(u8::try_from(clamped).unwrap_or(3))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    fn raised(self) -> Self {
        Difficulty((self.0 + 1).min(Self::MAX.0))
    }

    fn lowered(self) -> Self {
        Difficulty(self.0.saturating_sub(1).max(Self::MIN.0))
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty(3)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    pub after_answers: usize,
    pub from: Difficulty,
    pub to: Difficulty,
    pub success_rate: f64,
}

impl Adjustment {
    pub fn direction(&self) -> Direction {
        if self.to > self.from {
            Direction::Harder
        } else {
            Direction::Easier
        }
    }

    pub fn to_view(&self) -> AdjustmentView {
        AdjustmentView {
            after_answers: self.after_answers,
            from: self.from.get(),
            to: self.to.get(),
            direction: self.direction(),
            success_rate: self.success_rate,
        }
    }
}

/// Tracks answer outcomes within one lesson session.
#[derive(Debug, Clone, Default)]
pub struct DifficultyTracker {
    current: Difficulty,
    outcomes: Vec<bool>,
}

impl DifficultyTracker {
    pub fn new(initial: Difficulty) -> Self {
        Self {
            current: initial,
            outcomes: Vec::new(),
        }
    }

    pub fn current(&self) -> Difficulty {
        self.current
    }

    pub fn answered(&self) -> usize {
        self.outcomes.len()
    }

    /// Records one answer; returns the adjustment if this answer closed a
    /// window and moved the level.
    pub fn record(&mut self, correct: bool) -> Option<Adjustment> {
        self.outcomes.push(correct);
        let answered = self.outcomes.len();
        if answered % WINDOW != 0 {
            return None;
        }

        let recent = &self.outcomes[answered - WINDOW..];
        let hits = recent.iter().filter(|&&ok| ok).count();
        #[allow(clippy::cast_precision_loss)]
        let rate = hits as f64 / WINDOW as f64;

        let next = if rate > RAISE_ABOVE {
            self.current.raised()
        } else if rate < LOWER_BELOW {
            self.current.lowered()
        } else {
            self.current
        };

        if next == self.current {
            return None;
        }
        let adjustment = Adjustment {
            after_answers: answered,
            from: self.current,
            to: next,
            success_rate: rate,
        };
        self.current = next;
        Some(adjustment)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOutcome {
    pub difficulty: Difficulty,
    pub adjustments: Vec<Adjustment>,
    /// Whether the final evaluation window changed the level.
    pub changed_last: bool,
}

pub fn replay(initial: Difficulty, outcomes: &[bool]) -> ReplayOutcome {
    let mut tracker = DifficultyTracker::new(initial);
    let mut adjustments = Vec::new();
    let mut changed_last = false;
    for &correct in outcomes {
        let adjustment = tracker.record(correct);
        if tracker.answered() % WINDOW == 0 {
            changed_last = adjustment.is_some();
        }
        adjustments.extend(adjustment);
    }
    ReplayOutcome {
        difficulty: tracker.current(),
        adjustments,
        changed_last,
    }
}

const CONCRETE_HINTS: [&str; 3] = [
    "Try using physical objects to represent the problem",
    "Draw out the scenario step by step",
    "Think about a real-world example of this concept",
];
const PICTORIAL_HINTS: [&str; 3] = [
    "Look for patterns in the diagram",
    "Try to visualize how the elements relate to each other",
    "Connect this diagram to the concrete examples we saw earlier",
];
const ABSTRACT_HINTS: [&str; 3] = [
    "Break down the formula into smaller parts",
    "Try substituting simple numbers to test your understanding",
    "Connect this abstract concept back to the pictorial representation",
];
const EASIER_HINTS: [&str; 3] = [
    "Let's simplify this problem a bit",
    "Focus on just one part of the problem at a time",
    "We'll adjust the difficulty to help you build confidence",
];
const HARDER_HINTS: [&str; 3] = [
    "Let's challenge you with a more complex version",
    "Now try applying this concept in a new context",
    "This more advanced problem will help deepen your understanding",
];

pub fn phase_hints(phase: CpaPhase) -> &'static [&'static str] {
    match phase {
        CpaPhase::Concrete => &CONCRETE_HINTS,
        CpaPhase::Pictorial => &PICTORIAL_HINTS,
        CpaPhase::Abstract => &ABSTRACT_HINTS,
    }
}

pub fn direction_hints(direction: Direction) -> &'static [&'static str] {
    match direction {
        Direction::Easier => &EASIER_HINTS,
        Direction::Harder => &HARDER_HINTS,
    }
}

/// One direction hint followed by one phase hint.
pub fn pick_hints<R: rand::Rng + ?Sized>(
    rng: &mut R,
    direction: Direction,
    phase: CpaPhase,
) -> Vec<String> {
    [direction_hints(direction), phase_hints(phase)]
        .into_iter()
        .filter_map(|pool| pool.choose(rng))
        .map(|hint| (*hint).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replay_levels(initial: i64, outcomes: &[bool]) -> u8 {
        replay(Difficulty::new(initial), outcomes).difficulty.get()
    }

    #[test]
    fn constructor_clamps_into_range() {
        assert_eq!(Difficulty::new(0).get(), 1);
        assert_eq!(Difficulty::new(9).get(), 5);
        assert_eq!(Difficulty::new(4).get(), 4);
        assert_eq!(Difficulty::default().get(), 3);
    }

    #[test]
    fn three_correct_raises_one_level() {
        assert_eq!(replay_levels(3, &[true, true, true]), 4);
    }

    #[test]
    fn two_of_three_holds_level() {
        assert_eq!(replay_levels(3, &[true, false, true]), 3);
    }

    #[test]
    fn one_of_three_lowers_level() {
        assert_eq!(replay_levels(3, &[false, true, false]), 2);
    }

    #[test]
    fn no_evaluation_before_window_closes() {
        let mut tracker = DifficultyTracker::new(Difficulty::default());
        assert!(tracker.record(true).is_none());
        assert!(tracker.record(true).is_none());
        assert_eq!(tracker.current().get(), 3);
        let adj = tracker.record(true).expect("window closes on third answer");
        assert_eq!(adj.after_answers, 3);
        assert_eq!(adj.direction(), Direction::Harder);
    }

    #[test]
    fn windows_use_only_latest_three() {
        // First window raises to 4, second (three misses) lowers back to 3.
        let out = replay(Difficulty::new(3), &[true, true, true, false, false, false]);
        assert_eq!(out.difficulty.get(), 3);
        assert_eq!(out.adjustments.len(), 2);
        assert!(out.changed_last);
    }

    #[test]
    fn cap_and_floor_report_no_change() {
        let out = replay(Difficulty::MAX, &[true, true, true]);
        assert_eq!(out.difficulty, Difficulty::MAX);
        assert!(out.adjustments.is_empty());

        let out = replay(Difficulty::MIN, &[false, false, false]);
        assert_eq!(out.difficulty, Difficulty::MIN);
        assert!(!out.changed_last);
    }

    #[test]
    fn trailing_partial_window_keeps_last_flag() {
        let out = replay(Difficulty::new(3), &[true, true, true, false]);
        assert_eq!(out.difficulty.get(), 4);
        assert!(out.changed_last);
    }

    #[test]
    fn hints_come_from_fixed_pools() {
        let mut rng = rand::rng();
        let hints = pick_hints(&mut rng, Direction::Easier, CpaPhase::Pictorial);
        assert_eq!(hints.len(), 2);
        assert!(EASIER_HINTS.contains(&hints[0].as_str()));
        assert!(PICTORIAL_HINTS.contains(&hints[1].as_str()));
    }
}
