//! Request and result types shared by the prompt builder, normalizer and pipeline.

use serde::{Deserialize, Serialize};

use crate::extraction::Document;

/// Selects both the prompt template and the expected response schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    #[serde(rename = "summary")]
    Summary,
    #[serde(rename = "experience")]
    ExperienceBullets,
    #[serde(rename = "education")]
    EducationBullets,
    #[serde(rename = "quiz")]
    QuizQuestions,
    #[serde(rename = "ats-match")]
    AtsMatchReport,
    #[serde(rename = "resume-review")]
    ResumeReview,
}

impl TaskKind {
    /// Required element count for structured kinds; `None` for free-text reports.
    pub fn arity(self) -> Option<usize> {
        match self {
            TaskKind::Summary | TaskKind::ExperienceBullets | TaskKind::EducationBullets => {
                Some(SUGGESTION_COUNT)
            }
            TaskKind::QuizQuestions => Some(QUIZ_QUESTION_COUNT),
            TaskKind::AtsMatchReport | TaskKind::ResumeReview => None,
        }
    }

    pub fn is_report(self) -> bool {
        self.arity().is_none()
    }

    /// Report kinds may carry an uploaded resume that needs extraction.
    pub fn accepts_document(self) -> bool {
        self.is_report()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Summary => "summary",
            TaskKind::ExperienceBullets => "experience",
            TaskKind::EducationBullets => "education",
            TaskKind::QuizQuestions => "quiz",
            TaskKind::AtsMatchReport => "ats-match",
            TaskKind::ResumeReview => "resume-review",
        }
    }
}

pub const SUGGESTION_COUNT: usize = 3;
pub const QUIZ_QUESTION_COUNT: usize = 5;

/// Optional context fields for a generation request. Blank values are treated
/// as missing; the prompt builder substitutes placeholders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationContext {
    /// Target job title (summary) or position title (experience).
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub university_name: Option<String>,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    /// What the user has already written for this entry.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub job_profile: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
    /// Resume text supplied directly instead of as an uploaded document.
    #[serde(default)]
    pub resume_text: Option<String>,
    #[serde(skip)]
    pub document: Option<Document>,
}

/// Returns the trimmed value when present and non-blank.
pub fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Common shape of summary, experience and education suggestions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub level: String,
    pub content: String,
}

impl Suggestion {
    pub fn new(level: &str, content: &str) -> Self {
        Self {
            level: level.to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerKey {
    A,
    B,
    C,
    D,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuizOptions {
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "B")]
    pub b: String,
    #[serde(rename = "C")]
    pub c: String,
    #[serde(rename = "D")]
    pub d: String,
}

/// One multiple-choice interview question. The wire format is the same
/// camelCase shape the model is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QuizQuestion {
    pub id: u8,
    pub question: String,
    pub options: QuizOptions,
    pub correct_answer: AnswerKey,
    pub explanation: String,
}

/// Typed outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationResult {
    Suggestions { items: Vec<Suggestion> },
    Quiz { questions: Vec<QuizQuestion> },
    Report { text: String },
    ExtractionFailure { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_kind_path_names() {
        let kind: TaskKind = serde_json::from_str(r#""ats-match""#).unwrap();
        assert_eq!(kind, TaskKind::AtsMatchReport);
        let kind: TaskKind = serde_json::from_str(r#""experience""#).unwrap();
        assert_eq!(kind, TaskKind::ExperienceBullets);
        assert_eq!(TaskKind::QuizQuestions.as_str(), "quiz");
    }

    #[test]
    fn test_arity() {
        assert_eq!(TaskKind::Summary.arity(), Some(3));
        assert_eq!(TaskKind::EducationBullets.arity(), Some(3));
        assert_eq!(TaskKind::QuizQuestions.arity(), Some(5));
        assert_eq!(TaskKind::AtsMatchReport.arity(), None);
        assert!(TaskKind::ResumeReview.accepts_document());
        assert!(!TaskKind::Summary.accepts_document());
    }

    #[test]
    fn test_present_ignores_blank_values() {
        assert_eq!(present(&Some("  Acme ".to_string())), Some("Acme"));
        assert_eq!(present(&Some("   ".to_string())), None);
        assert_eq!(present(&None), None);
    }

    #[test]
    fn test_quiz_question_rejects_unknown_fields() {
        let json = r#"{
            "id": 1, "question": "Q?", "options": {"A": "a", "B": "b", "C": "c", "D": "d"},
            "correctAnswer": "B", "explanation": "because", "difficulty": "easy"
        }"#;
        assert!(serde_json::from_str::<QuizQuestion>(json).is_err());
    }

    #[test]
    fn test_result_is_tagged() {
        let result = GenerationResult::Report {
            text: "Match: 80%".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "report");
        assert_eq!(json["text"], "Match: 80%");
    }
}
