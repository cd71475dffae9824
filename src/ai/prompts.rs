//! Prompt text and reply parsing for the completion backend.

use learnify_schema::analytics::PerformanceSummary;
use learnify_schema::diagnostic::DiagnosticScore;
use learnify_schema::feedback::FeedbackRequest;
use serde::de::DeserializeOwned;
use std::fmt::Write;

pub const SYSTEM_PROMPT: &str = "You are an experienced teacher who writes personalised, encouraging \
guidance for school students. Always answer with a single JSON value and nothing else.";

pub fn feedback_prompt(req: &FeedbackRequest) -> String {
    let subject = req.subject_area.as_deref().unwrap_or("general studies");
    let mut prompt = format!(
        "Subject: {subject}\n\nQuestion context:\n{}\n\nStudent response:\n{}\n",
        req.question_context, req.student_response
    );
    if let Some(level) = &req.student_level {
        let _ = writeln!(prompt, "\nStudent level: {level}");
    }
    if let Some(objectives) = req.learning_objectives.as_ref().filter(|o| !o.is_empty()) {
        prompt.push_str("\nLearning objectives:\n");
        for objective in objectives {
            let _ = writeln!(prompt, "- {objective}");
        }
    }
    prompt.push_str(
        r#"
Analyse the response and reply with this JSON object:
{
  "overallFeedback": "one paragraph",
  "strengthPoints": ["..."],
  "improvementPoints": ["..."],
  "nextSteps": ["..."],
  "conceptualUnderstanding": "excellent|good|partial|limited|unclear",
  "suggestedResources": [{"title": "...", "type": "video|article|practice|interactive", "description": "..."}],
  "misconceptions": ["..."]
}"#,
    );
    prompt
}

pub fn insights_prompt(subject: &str, topic: Option<&str>, score: &DiagnosticScore) -> String {
    let mut prompt = format!(
        "Diagnostic results\nSubject: {subject}\nOverall proficiency: {}%\n",
        score.overall_proficiency
    );
    if let Some(topic) = topic {
        let _ = writeln!(prompt, "Topic: {topic}");
    }
    prompt.push_str("\nSkills:\n");
    for skill in &score.skills {
        let _ = writeln!(
            prompt,
            "- {}: {}% ({}/{})",
            skill.skill, skill.percentage, skill.correct, skill.total
        );
    }
    prompt.push_str(
        r#"
Reply with this JSON object, at most 3 entries per list:
{
  "summary": "two sentences",
  "strengths": ["..."],
  "areasForImprovement": ["..."],
  "recommendedActivities": ["..."]
}"#,
    );
    prompt
}

pub fn recommendations_prompt(
    student: &str,
    grade_level: Option<&str>,
    subject: &str,
    summary: &PerformanceSummary,
) -> String {
    let data = serde_json::to_string_pretty(summary)
        .unwrap_or_else(|error| format!("<performance data unavailable: {error}>"));
    format!(
        r#"Student: {student}
Grade level: {}
Subject: {subject}

Performance data:
{data}

Reply with a JSON array of 3 recommendations:
[{{"title": "...", "description": "...", "tags": ["..."], "actionText": "...", "actionLink": "/dashboard/..."}}]"#,
        grade_level.unwrap_or("unknown")
    )
}

/// Models like to wrap JSON in markdown fences; peel them off.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

pub fn parse_json_reply<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(strip_code_fences(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnify_schema::diagnostic::SkillScore;

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[1, 2]\n```  "), "[1, 2]");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn parse_accepts_fenced_and_bare_json() {
        let v: Vec<i32> = parse_json_reply("```json\n[1,2,3]\n```").unwrap();
        assert_eq!(v, vec![1, 2, 3]);
        assert!(parse_json_reply::<Vec<i32>>("Sure! Here you go").is_err());
    }

    #[test]
    fn insights_prompt_lists_every_skill() {
        let score = DiagnosticScore {
            evaluations: vec![],
            skills: vec![
                SkillScore {
                    skill: "fractions".into(),
                    correct: 1,
                    total: 2,
                    percentage: 50,
                },
                SkillScore {
                    skill: "decimals".into(),
                    correct: 2,
                    total: 2,
                    percentage: 100,
                },
            ],
            overall_proficiency: 75,
            mastered_skills: vec!["decimals".into()],
            in_progress_skills: vec!["fractions".into()],
        };
        let prompt = insights_prompt("Math", Some("number sense"), &score);
        assert!(prompt.contains("- fractions: 50% (1/2)"));
        assert!(prompt.contains("- decimals: 100% (2/2)"));
        assert!(prompt.contains("Topic: number sense"));
    }
}
