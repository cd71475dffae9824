use learnify_schema::diagnostic::{DiagnosticScore, Evaluation, SkillScore};
use std::collections::{BTreeMap, HashMap};

pub const MASTERY_THRESHOLD: i64 = 80;

/// Answer key for one stored diagnostic question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerKey {
    pub id: i64,
    pub skill: String,
    pub correct_answer: String,
}

#[allow(clippy::cast_possible_truncation)]
fn percent(correct: u32, total: u32) -> i64 {
    if total == 0 {
        return 0;
    }
    (f64::from(correct) / f64::from(total) * 100.0).round() as i64
}

/// Scores submitted answers. Ids without a stored question are skipped.
pub fn score(keys: &[AnswerKey], responses: &BTreeMap<i64, String>) -> DiagnosticScore {
    let by_id: HashMap<i64, &AnswerKey> = keys.iter().map(|k| (k.id, k)).collect();

    let evaluations: Vec<Evaluation> = responses
        .iter()
        .filter_map(|(id, answer)| {
            let key = by_id.get(id)?;
            Some(Evaluation {
                question_id: *id,
                skill: key.skill.clone(),
                answer: answer.clone(),
                correct_answer: key.correct_answer.clone(),
                is_correct: *answer == key.correct_answer,
            })
        })
        .collect();

    let mut tallies: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
    for eval in &evaluations {
        let entry = tallies.entry(eval.skill.as_str()).or_default();
        entry.1 += 1;
        if eval.is_correct {
            entry.0 += 1;
        }
    }

    let skills: Vec<SkillScore> = tallies
        .into_iter()
        .map(|(skill, (correct, total))| SkillScore {
            skill: skill.to_string(),
            correct,
            total,
            percentage: percent(correct, total),
        })
        .collect();

    let (mastered, in_progress): (Vec<&SkillScore>, Vec<&SkillScore>) = skills
        .iter()
        .partition(|s| s.percentage >= MASTERY_THRESHOLD);

    let correct = evaluations.iter().filter(|e| e.is_correct).count();
    let overall = percent(
        u32::try_from(correct).unwrap_or(u32::MAX),
        u32::try_from(evaluations.len()).unwrap_or(u32::MAX),
    );

    DiagnosticScore {
        mastered_skills: mastered.into_iter().map(|s| s.skill.clone()).collect(),
        in_progress_skills: in_progress.into_iter().map(|s| s.skill.clone()).collect(),
        evaluations,
        skills,
        overall_proficiency: overall,
    }
}

/// Running per-concept tally.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MasteryTally {
    pub correct: u32,
    pub total: u32,
}

impl MasteryTally {
    pub fn absorb(self, skill: &SkillScore) -> Self {
        Self {
            correct: self.correct + skill.correct,
            total: self.total + skill.total,
        }
    }

    pub fn level(self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(self.total) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: i64, skill: &str, answer: &str) -> AnswerKey {
        AnswerKey {
            id,
            skill: skill.into(),
            correct_answer: answer.into(),
        }
    }

    fn keys() -> Vec<AnswerKey> {
        vec![
            key(1, "fractions", "1/2"),
            key(2, "fractions", "3/4"),
            key(3, "decimals", "0.5"),
            key(4, "decimals", "0.25"),
            key(5, "place value", "100"),
        ]
    }

    #[test]
    fn tallies_per_skill_and_classifies() {
        let responses = BTreeMap::from([
            (1, "1/2".to_string()),
            (2, "3/4".to_string()),
            (3, "0.5".to_string()),
            (4, "0.2".to_string()),
            (5, "10".to_string()),
        ]);
        let out = score(&keys(), &responses);

        assert_eq!(out.overall_proficiency, 60);
        assert_eq!(out.mastered_skills, vec!["fractions"]);
        // Zero-percent skills are still in progress.
        assert_eq!(out.in_progress_skills, vec!["decimals", "place value"]);
        let decimals = out.skills.iter().find(|s| s.skill == "decimals").unwrap();
        assert_eq!((decimals.correct, decimals.total, decimals.percentage), (1, 2, 50));
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let responses = BTreeMap::from([(1, "1/2".to_string()), (99, "x".to_string())]);
        let out = score(&keys(), &responses);
        assert_eq!(out.evaluations.len(), 1);
        assert_eq!(out.overall_proficiency, 100);
    }

    #[test]
    fn comparison_is_exact() {
        let responses = BTreeMap::from([(3, "0.50".to_string())]);
        let out = score(&keys(), &responses);
        assert!(!out.evaluations[0].is_correct);
    }

    #[test]
    fn empty_submission_scores_zero() {
        let out = score(&keys(), &BTreeMap::new());
        assert_eq!(out.overall_proficiency, 0);
        assert!(out.skills.is_empty());
        assert!(out.mastered_skills.is_empty());
    }

    #[test]
    fn mastery_accumulates_across_attempts() {
        let first = SkillScore {
            skill: "fractions".into(),
            correct: 1,
            total: 2,
            percentage: 50,
        };
        let second = SkillScore {
            skill: "fractions".into(),
            correct: 2,
            total: 2,
            percentage: 100,
        };
        let tally = MasteryTally::default().absorb(&first).absorb(&second);
        assert_eq!(tally, MasteryTally { correct: 3, total: 4 });
        assert!((tally.level() - 75.0).abs() < f64::EPSILON);
    }
}
