//! Per-request adaptation of lesson steps to the learner's difficulty.

use learnify_schema::{CpaPhase, DeliveredQuestion, DeliveredStep, QuestionData};
use std::cmp::Ordering;

use crate::Difficulty;

/// Step as stored; the question still carries its answer.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredStep {
    pub id: i64,
    pub phase: CpaPhase,
    pub content: String,
    pub image_url: Option<String>,
    pub difficulty: Difficulty,
    pub question: Option<QuestionData>,
}

pub fn adapt_question(question: &QuestionData, step: Difficulty, target: Difficulty) -> DeliveredQuestion {
    let (text, options, explanation) = match target.cmp(&step) {
        Ordering::Greater => (
            question.advanced_text.as_ref(),
            question.advanced_options.as_ref(),
            question.advanced_explanation.as_ref(),
        ),
        Ordering::Less => (
            question.simple_text.as_ref(),
            question.simple_options.as_ref(),
            question.simple_explanation.as_ref(),
        ),
        Ordering::Equal => (None, None, None),
    };

    DeliveredQuestion {
        text: text.unwrap_or(&question.text).clone(),
        options: options.unwrap_or(&question.options).clone(),
        explanation: explanation.or(question.explanation.as_ref()).cloned(),
    }
}

pub fn adapt_step(step: &StoredStep, target: Difficulty) -> DeliveredStep {
    DeliveredStep {
        id: step.id,
        phase: step.phase,
        content: step.content.clone(),
        image_url: step.image_url.clone(),
        difficulty_level: step.difficulty.get(),
        question: step
            .question
            .as_ref()
            .map(|q| adapt_question(q, step.difficulty, target)),
    }
}

/// CPA phases with no step in the lesson, in canonical order.
pub fn missing_phases(steps: &[StoredStep]) -> Vec<CpaPhase> {
    CpaPhase::ALL
        .into_iter()
        .filter(|phase| !steps.iter().any(|s| s.phase == *phase))
        .collect()
}

/// Exact comparison against the stored answer. Steps without a question or
/// answer never grade as correct.
pub fn grade(question: Option<&QuestionData>, answer: &str) -> Option<bool> {
    let expected = question?.correct_answer.as_deref()?;
    Some(expected == answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> QuestionData {
        QuestionData {
            text: "2 + 2?".into(),
            options: vec!["3".into(), "4".into()],
            correct_answer: Some("4".into()),
            explanation: Some("Two pairs".into()),
            simple_text: Some("1 + 1?".into()),
            simple_options: Some(vec!["2".into(), "3".into()]),
            advanced_text: Some("12 + 12?".into()),
            ..QuestionData::default()
        }
    }

    fn step(phase: CpaPhase) -> StoredStep {
        StoredStep {
            id: 1,
            phase,
            content: "Count the blocks".into(),
            image_url: None,
            difficulty: Difficulty::new(3),
            question: Some(question()),
        }
    }

    #[test]
    fn equal_difficulty_delivers_base_fields() {
        let out = adapt_step(&step(CpaPhase::Concrete), Difficulty::new(3));
        let q = out.question.unwrap();
        assert_eq!(q.text, "2 + 2?");
        assert_eq!(q.options, vec!["3", "4"]);
    }

    #[test]
    fn lower_difficulty_uses_simple_variant() {
        let q = adapt_question(&question(), Difficulty::new(3), Difficulty::new(1));
        assert_eq!(q.text, "1 + 1?");
        assert_eq!(q.options, vec!["2", "3"]);
        assert_eq!(q.explanation.as_deref(), Some("Two pairs"));
    }

    #[test]
    fn higher_difficulty_falls_back_per_field() {
        let q = adapt_question(&question(), Difficulty::new(3), Difficulty::new(5));
        assert_eq!(q.text, "12 + 12?");
        // No advanced options were authored.
        assert_eq!(q.options, vec!["3", "4"]);
    }

    #[test]
    fn delivered_step_keeps_step_metadata() {
        let out = adapt_step(&step(CpaPhase::Abstract), Difficulty::new(4));
        assert_eq!(out.id, 1);
        assert_eq!(out.phase, CpaPhase::Abstract);
        assert_eq!(out.difficulty_level, 3);
        assert_eq!(out.question.unwrap().text, "12 + 12?");
    }

    #[test]
    fn reports_missing_phases_in_order() {
        let steps = vec![step(CpaPhase::Pictorial)];
        assert_eq!(missing_phases(&steps), vec![CpaPhase::Concrete, CpaPhase::Abstract]);
        let full: Vec<_> = CpaPhase::ALL.into_iter().map(step).collect();
        assert!(missing_phases(&full).is_empty());
    }

    #[test]
    fn grading_is_exact() {
        let q = question();
        assert_eq!(grade(Some(&q), "4"), Some(true));
        assert_eq!(grade(Some(&q), " 4"), Some(false));
        assert_eq!(grade(None, "4"), None);
    }
}
