//! Response normalization — turns raw model text into a typed `GenerationResult`.
//!
//! Steps:
//! 1. strip code fences and surrounding whitespace
//! 2. locate the first bracket-balanced JSON array (string- and escape-aware)
//! 3. parse it
//! 4. validate keys, arity and non-blank fields for the task kind
//! 5. on any failure, substitute the kind's canned suggestions
//!
//! Report kinds skip 2–5: the fence-stripped text is the result.
//! Quiz output has no canned value; an unusable quiz is `Rejected`.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;

use crate::generation::fallback::fallback_suggestions;
use crate::generation::models::{
    GenerationResult, QuizQuestion, Suggestion, TaskKind, QUIZ_QUESTION_COUNT, SUGGESTION_COUNT,
};

/// Outcome of normalization. Never an error: every variant is a value the
/// pipeline knows how to handle.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// Model output recovered and validated.
    Recovered(GenerationResult),
    /// Model output unusable; the canned value was substituted.
    Fallback {
        result: GenerationResult,
        reason: String,
    },
    /// Model output unusable and the kind has no canned value.
    Rejected { reason: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SummaryWire {
    experience_level: String,
    summary: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ActivityWire {
    activity_level: String,
    description: String,
}

pub fn normalize(kind: TaskKind, raw: &str) -> Normalized {
    let stripped = strip_code_fences(raw);

    if kind.is_report() {
        return Normalized::Recovered(GenerationResult::Report {
            text: stripped.to_string(),
        });
    }

    let parsed = extract_json_array(stripped)
        .ok_or_else(|| "no parseable JSON array in response".to_string())
        .and_then(|value| validate(kind, value));

    match parsed {
        Ok(result) => Normalized::Recovered(result),
        Err(reason) => match fallback_suggestions(kind) {
            Some(items) => Normalized::Fallback {
                result: GenerationResult::Suggestions { items },
                reason,
            },
            None => Normalized::Rejected { reason },
        },
    }
}

fn validate(kind: TaskKind, value: Value) -> Result<GenerationResult, String> {
    match kind {
        TaskKind::Summary => {
            let wire: Vec<SummaryWire> = serde_json::from_value(value).map_err(schema_error)?;
            let items = wire
                .into_iter()
                .map(|w| Suggestion {
                    level: w.experience_level,
                    content: w.summary,
                })
                .collect();
            check_suggestions(items)
        }
        TaskKind::ExperienceBullets | TaskKind::EducationBullets => {
            let wire: Vec<ActivityWire> = serde_json::from_value(value).map_err(schema_error)?;
            let items = wire
                .into_iter()
                .map(|w| Suggestion {
                    level: w.activity_level,
                    content: w.description,
                })
                .collect();
            check_suggestions(items)
        }
        TaskKind::QuizQuestions => {
            let questions: Vec<QuizQuestion> =
                serde_json::from_value(value).map_err(schema_error)?;
            check_quiz(questions)
        }
        TaskKind::AtsMatchReport | TaskKind::ResumeReview => {
            Err(format!("{} is not a structured task", kind.as_str()))
        }
    }
}

fn schema_error(e: serde_json::Error) -> String {
    format!("schema mismatch: {e}")
}

fn check_suggestions(items: Vec<Suggestion>) -> Result<GenerationResult, String> {
    if items.len() != SUGGESTION_COUNT {
        return Err(format!(
            "expected {SUGGESTION_COUNT} suggestions, got {}",
            items.len()
        ));
    }
    if let Some(blank) = items
        .iter()
        .position(|s| is_blank(&s.level) || is_blank(&s.content))
    {
        return Err(format!("suggestion {blank} has a blank field"));
    }
    Ok(GenerationResult::Suggestions { items })
}

fn check_quiz(questions: Vec<QuizQuestion>) -> Result<GenerationResult, String> {
    if questions.len() != QUIZ_QUESTION_COUNT {
        return Err(format!(
            "expected {QUIZ_QUESTION_COUNT} questions, got {}",
            questions.len()
        ));
    }

    let ids: BTreeSet<u8> = questions.iter().map(|q| q.id).collect();
    let expected: BTreeSet<u8> = (1..=QUIZ_QUESTION_COUNT as u8).collect();
    if ids != expected {
        return Err(format!("question ids must be 1..={QUIZ_QUESTION_COUNT}, each once"));
    }

    if let Some(q) = questions.iter().find(|q| {
        is_blank(&q.question)
            || is_blank(&q.explanation)
            || [&q.options.a, &q.options.b, &q.options.c, &q.options.d]
                .iter()
                .any(|o| o.trim().is_empty())
    }) {
        return Err(format!("question {} has a blank field", q.id));
    }

    Ok(GenerationResult::Quiz { questions })
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Strips a surrounding markdown code fence (with or without a language tag)
/// and whitespace. Text without a leading fence is only trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    let body = match rest.find('\n') {
        Some(newline) if is_language_tag(&rest[..newline]) => &rest[newline + 1..],
        _ => rest,
    };

    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn is_language_tag(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
}

/// Returns the first bracket-balanced substring starting at a `[` that parses
/// as a JSON array. Candidates that are unbalanced or fail to parse are
/// skipped in order of their opening bracket.
///
/// Each region of the text is walked once: one pass from an opening `[`
/// records every nested array it closes, and the next pass starts after the
/// point where the first one stopped.
pub fn extract_json_array(text: &str) -> Option<Value> {
    let mut from = 0;
    while let Some(offset) = text[from..].find('[') {
        let pass = scan_from(text, from + offset);
        let mut spans = pass.spans;
        spans.sort_unstable_by_key(|&(open, _)| open);

        let found = spans.into_iter().find_map(|(open, close)| {
            match serde_json::from_str::<Value>(&text[open..=close]) {
                Ok(value @ Value::Array(_)) => Some(value),
                _ => None,
            }
        });
        if found.is_some() {
            return found;
        }
        from = pass.resume_at;
    }
    None
}

/// Result of one forward walk from an opening `[`.
#[derive(Debug, PartialEq)]
struct ScanPass {
    /// `(open, close)` byte offsets of every array closed during the walk.
    spans: Vec<(usize, usize)>,
    /// Where the next walk may start.
    resume_at: usize,
}

/// Walks from `start` (which must be `[`) until its bracket closes, a closer
/// mismatches, or the text ends, ignoring brackets inside string literals.
/// Arrays opened inside the walk that were still open when it stopped are
/// unbalanced and not reported.
fn scan_from(text: &str, start: usize) -> ScanPass {
    let bytes = text.as_bytes();
    let mut open: Vec<(u8, usize)> = Vec::new();
    let mut spans = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (index, &byte) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'[' => open.push((b']', index)),
            b'{' => open.push((b'}', index)),
            b']' | b'}' => match open.pop() {
                Some((closer, opened_at)) if closer == byte => {
                    // brackets are ASCII, so both offsets are char boundaries
                    if byte == b']' {
                        spans.push((opened_at, index));
                    }
                    if open.is_empty() {
                        return ScanPass {
                            spans,
                            resume_at: index + 1,
                        };
                    }
                }
                _ => {
                    return ScanPass {
                        spans,
                        resume_at: index + 1,
                    }
                }
            },
            _ => {}
        }
    }

    ScanPass {
        spans,
        resume_at: text.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::fallback::expected_levels;

    const SUMMARY_JSON: &str = r#"[
        {"experience_level": "Entry-Level", "summary": "Junior engineer [Rust] with {curly} interests."},
        {"experience_level": "Mid-Level", "summary": "Built \"fast\" services."},
        {"experience_level": "Senior-Level", "summary": "Led platform teams."}
    ]"#;

    fn quiz_json(count: u8) -> String {
        let questions: Vec<String> = (1..=count)
            .map(|id| {
                format!(
                    r#"{{"id": {id}, "question": "Question {id}?", "options": {{"A": "a", "B": "b", "C": "c", "D": "d"}}, "correctAnswer": "C", "explanation": "Because {id}."}}"#
                )
            })
            .collect();
        format!("[{}]", questions.join(","))
    }

    fn suggestions(normalized: Normalized) -> Vec<Suggestion> {
        match normalized {
            Normalized::Recovered(GenerationResult::Suggestions { items }) => items,
            other => panic!("expected recovered suggestions, got {other:?}"),
        }
    }

    fn fallback_levels(normalized: Normalized) -> Vec<String> {
        match normalized {
            Normalized::Fallback {
                result: GenerationResult::Suggestions { items },
                ..
            } => items.into_iter().map(|s| s.level).collect(),
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_array_is_returned_unchanged() {
        let items = suggestions(normalize(TaskKind::Summary, SUMMARY_JSON));
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].level, "Entry-Level");
        assert_eq!(items[0].content, "Junior engineer [Rust] with {curly} interests.");
        assert_eq!(items[1].content, "Built \"fast\" services.");
        assert_eq!(items[2].level, "Senior-Level");
    }

    #[test]
    fn test_code_fence_is_a_no_op_on_content() {
        let plain = normalize(TaskKind::Summary, SUMMARY_JSON);
        let tagged = normalize(TaskKind::Summary, &format!("```json\n{SUMMARY_JSON}\n```"));
        let untagged = normalize(TaskKind::Summary, &format!("```\n{SUMMARY_JSON}\n```"));
        assert_eq!(plain, tagged);
        assert_eq!(plain, untagged);
    }

    #[test]
    fn test_prose_around_array_is_ignored() {
        let raw = format!("Sure! Here you go:\n{SUMMARY_JSON}\nHope that helps. [1]");
        let items = suggestions(normalize(TaskKind::Summary, &raw));
        assert_eq!(items[1].level, "Mid-Level");
    }

    #[test]
    fn test_bracketed_prose_before_array_is_skipped() {
        let raw = format!("[Note] results below {{see docs}}:\n{SUMMARY_JSON}");
        let items = suggestions(normalize(TaskKind::Summary, &raw));
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_malformed_truncated_and_empty_fall_back() {
        let truncated = &SUMMARY_JSON[..SUMMARY_JSON.len() / 2];
        for raw in ["", "   ", "I cannot help with that.", "{\"a\": 1}", truncated] {
            let levels = fallback_levels(normalize(TaskKind::Summary, raw));
            assert_eq!(levels, expected_levels(TaskKind::Summary), "input: {raw:?}");
        }
    }

    #[test]
    fn test_education_fallback_levels() {
        let levels = fallback_levels(normalize(TaskKind::EducationBullets, "oops"));
        assert_eq!(levels, vec!["Basic", "Intermediate", "Advanced"]);
    }

    #[test]
    fn test_fallback_output_passes_validation() {
        for kind in [
            TaskKind::Summary,
            TaskKind::ExperienceBullets,
            TaskKind::EducationBullets,
        ] {
            let Normalized::Fallback {
                result: GenerationResult::Suggestions { items },
                ..
            } = normalize(kind, "not json")
            else {
                panic!("expected fallback for {kind:?}");
            };
            let (level_key, content_key) = match kind {
                TaskKind::Summary => ("experience_level", "summary"),
                _ => ("activity_level", "description"),
            };
            let wire: Vec<Value> = items
                .iter()
                .map(|s| serde_json::json!({ level_key: s.level, content_key: s.content }))
                .collect();
            let reparsed = normalize(kind, &Value::Array(wire).to_string());
            assert!(matches!(reparsed, Normalized::Recovered(_)), "{kind:?}");
        }
    }

    #[test]
    fn test_wrong_arity_falls_back() {
        let two = r#"[{"activity_level": "Entry-Level", "description": "a"},
                      {"activity_level": "Mid-Level", "description": "b"}]"#;
        let normalized = normalize(TaskKind::ExperienceBullets, two);
        match normalized {
            Normalized::Fallback { reason, .. } => assert!(reason.contains("expected 3")),
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_or_extra_keys_fall_back() {
        let missing = r#"[{"activity_level": "A"}, {"activity_level": "B"}, {"activity_level": "C"}]"#;
        assert!(matches!(
            normalize(TaskKind::ExperienceBullets, missing),
            Normalized::Fallback { .. }
        ));

        let extra = r#"[
            {"experience_level": "Entry-Level", "summary": "a", "tone": "x"},
            {"experience_level": "Mid-Level", "summary": "b"},
            {"experience_level": "Senior-Level", "summary": "c"}
        ]"#;
        assert!(matches!(
            normalize(TaskKind::Summary, extra),
            Normalized::Fallback { .. }
        ));
    }

    #[test]
    fn test_summary_keys_are_not_accepted_for_experience() {
        assert!(matches!(
            normalize(TaskKind::ExperienceBullets, SUMMARY_JSON),
            Normalized::Fallback { .. }
        ));
    }

    #[test]
    fn test_valid_quiz_is_recovered() {
        let raw = format!("```json\n{}\n```", quiz_json(5));
        match normalize(TaskKind::QuizQuestions, &raw) {
            Normalized::Recovered(GenerationResult::Quiz { questions }) => {
                assert_eq!(questions.len(), 5);
                assert_eq!(questions[4].id, 5);
            }
            other => panic!("expected quiz, got {other:?}"),
        }
    }

    #[test]
    fn test_quiz_wrapped_in_questions_object_is_recovered() {
        let raw = format!(r#"{{"questions": {}}}"#, quiz_json(5));
        assert!(matches!(
            normalize(TaskKind::QuizQuestions, &raw),
            Normalized::Recovered(GenerationResult::Quiz { .. })
        ));
    }

    #[test]
    fn test_four_questions_are_rejected() {
        match normalize(TaskKind::QuizQuestions, &quiz_json(4)) {
            Normalized::Rejected { reason } => assert!(reason.contains("expected 5")),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_quiz_with_bad_answer_key_is_rejected() {
        let raw = quiz_json(5).replace(r#""correctAnswer": "C""#, r#""correctAnswer": "E""#);
        assert!(matches!(
            normalize(TaskKind::QuizQuestions, &raw),
            Normalized::Rejected { .. }
        ));
    }

    #[test]
    fn test_quiz_with_duplicate_ids_is_rejected() {
        let raw = quiz_json(5).replace(r#""id": 5"#, r#""id": 1"#);
        assert!(matches!(
            normalize(TaskKind::QuizQuestions, &raw),
            Normalized::Rejected { .. }
        ));
    }

    #[test]
    fn test_report_is_returned_verbatim() {
        let report = "## Overall Match: 35%\n\n- Missing: Python, SQL\n- Add keywords: [Python], {SQL}";
        assert_eq!(
            normalize(TaskKind::AtsMatchReport, report),
            Normalized::Recovered(GenerationResult::Report {
                text: report.to_string()
            })
        );
    }

    #[test]
    fn test_report_fence_is_stripped() {
        let raw = "```markdown\n# ATS Score: 72/100\n```";
        assert_eq!(
            normalize(TaskKind::ResumeReview, raw),
            Normalized::Recovered(GenerationResult::Report {
                text: "# ATS Score: 72/100".to_string()
            })
        );
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("  [1]  "), "[1]");
        assert_eq!(strip_code_fences("```[1]```"), "[1]");
        assert_eq!(strip_code_fences("```json\n[1]"), "[1]");
    }

    #[test]
    fn test_scan_respects_strings_and_escapes() {
        let text = r#"xx ["a]b", "c\"]", {"k": [1, 2]}] trailing ]"#;
        let start = text.find('[').unwrap();
        let pass = scan_from(text, start);
        let outer = pass.spans.iter().find(|&&(open, _)| open == start).unwrap();
        assert_eq!(
            &text[outer.0..=outer.1],
            r#"["a]b", "c\"]", {"k": [1, 2]}]"#
        );
        assert_eq!(pass.resume_at, outer.1 + 1);
        // The nested `[1, 2]` is reported too.
        assert_eq!(pass.spans.len(), 2);
    }

    #[test]
    fn test_scan_rejects_mismatched_and_unterminated() {
        assert!(scan_from("[1, 2}", 0).spans.is_empty());
        let unterminated = scan_from("[[1, 2]", 0);
        assert_eq!(unterminated.spans, vec![(1, 6)]);
        assert_eq!(unterminated.resume_at, 7);
    }

    #[test]
    fn test_inner_array_of_unterminated_outer_is_found() {
        let value = extract_json_array("[ oops [1, 2] and more").unwrap();
        assert_eq!(value, serde_json::json!([1, 2]));
    }

    #[test]
    fn test_first_opening_bracket_wins() {
        let value = extract_json_array("[[1], 2] then [3]").unwrap();
        assert_eq!(value, serde_json::json!([[1], 2]));
        let value = extract_json_array("[x [1] [2]").unwrap();
        assert_eq!(value, serde_json::json!([1]));
    }

    #[test]
    fn test_large_unterminated_input_falls_back() {
        let raw = "[".repeat(200_000);
        let levels = fallback_levels(normalize(TaskKind::Summary, &raw));
        assert_eq!(levels, expected_levels(TaskKind::Summary));

        let raw = "[1, ".repeat(50_000) + &"]}".repeat(10);
        assert!(matches!(
            normalize(TaskKind::Summary, &raw),
            Normalized::Fallback { .. }
        ));
    }

    #[test]
    fn test_extract_json_array_handles_multibyte_text() {
        let value = extract_json_array("Voilà — résumé: [\"• naïve\"] fin").unwrap();
        assert_eq!(value, serde_json::json!(["• naïve"]));
    }
}
