//! Quiz grading for generated interview questions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::generation::models::{AnswerKey, QuizQuestion};

#[derive(Debug, Deserialize)]
pub struct GradeRequest {
    pub questions: Vec<QuizQuestion>,
    /// Question id → chosen option. Unanswered questions count as wrong.
    #[serde(default)]
    pub answers: HashMap<u8, AnswerKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissedQuestion {
    pub id: u8,
    pub chosen: Option<AnswerKey>,
    pub correct_answer: AnswerKey,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
    pub message: String,
    pub missed: Vec<MissedQuestion>,
}

pub fn grade(questions: &[QuizQuestion], answers: &HashMap<u8, AnswerKey>) -> QuizScore {
    let missed: Vec<MissedQuestion> = questions
        .iter()
        .filter_map(|q| {
            let chosen = answers.get(&q.id).copied();
            (chosen != Some(q.correct_answer)).then(|| MissedQuestion {
                id: q.id,
                chosen,
                correct_answer: q.correct_answer,
                explanation: q.explanation.clone(),
            })
        })
        .collect();

    let total = questions.len();
    let correct = total - missed.len();
    QuizScore {
        correct,
        total,
        message: format!("You got {correct} out of {total} correct!"),
        missed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::models::QuizOptions;

    fn question(id: u8, correct: AnswerKey) -> QuizQuestion {
        QuizQuestion {
            id,
            question: format!("Question {id}"),
            options: QuizOptions {
                a: "a".into(),
                b: "b".into(),
                c: "c".into(),
                d: "d".into(),
            },
            correct_answer: correct,
            explanation: format!("Explanation {id}"),
        }
    }

    #[test]
    fn test_grade_counts_correct_and_explains_misses() {
        let questions = vec![
            question(1, AnswerKey::A),
            question(2, AnswerKey::B),
            question(3, AnswerKey::C),
        ];
        let answers = HashMap::from([(1, AnswerKey::A), (2, AnswerKey::D)]);

        let score = grade(&questions, &answers);

        assert_eq!(score.correct, 1);
        assert_eq!(score.total, 3);
        assert_eq!(score.message, "You got 1 out of 3 correct!");
        assert_eq!(score.missed.len(), 2);
        assert_eq!(score.missed[0].id, 2);
        assert_eq!(score.missed[0].chosen, Some(AnswerKey::D));
        assert_eq!(score.missed[1].chosen, None);
        assert_eq!(score.missed[1].explanation, "Explanation 3");
    }

    #[test]
    fn test_answers_deserialize_from_string_keys() {
        let json = r#"{
            "questions": [{"id": 1, "question": "Q", "options": {"A": "a", "B": "b", "C": "c", "D": "d"},
                           "correctAnswer": "B", "explanation": "E"}],
            "answers": {"1": "B"}
        }"#;
        let request: GradeRequest = serde_json::from_str(json).unwrap();
        let score = grade(&request.questions, &request.answers);
        assert_eq!(score.correct, 1);
        assert!(score.missed.is_empty());
    }
}
