use crate::dto::public_dto::SubmittedAnswer;
use crate::models::question::{Question, QuestionKind};
use crate::models::test_result::AnswerDetail;
use crate::utils::text::{cosine_similarity, normalize_letter, parse_pair_lines};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone)]
pub struct GradedSubmission {
    pub total_score: f64,
    pub max_score: f64,
    pub closed_score: f64,
    pub open_score: f64,
    pub details: Vec<AnswerDetail>,
}

pub struct GradingService;

impl GradingService {
    /// Grade every question of a test against the submitted answers.
    /// A question without a matching answer scores 0 but still appears
    /// in the details, so the breakdown always covers the whole test.
    pub fn grade_submission(
        questions: &[Question],
        answers: &[SubmittedAnswer],
    ) -> GradedSubmission {
        let mut details = Vec::with_capacity(questions.len());
        let mut max_score = 0.0;
        let mut closed_score = 0.0;
        let mut open_score = 0.0;

        for q in questions {
            let points = q.points as f64;
            max_score += points;

            let submitted = answers
                .iter()
                .find(|a| a.question_id == q.id)
                .map(|a| &a.answer);

            let kind = q.kind();
            let (score, user_answer, correct_answer) = match kind {
                Some(QuestionKind::Closed) => Self::grade_closed(submitted, &q.answer, points),
                Some(QuestionKind::Multiclosed) => {
                    Self::grade_multiclosed(submitted, &q.answer, points)
                }
                Some(QuestionKind::Open) => Self::grade_open(submitted, &q.answer, points),
                Some(QuestionKind::Pairs) => Self::grade_pairs(submitted, &q.answer, points),
                None => (0.0, answer_as_text(submitted), q.answer.clone()),
            };

            if kind == Some(QuestionKind::Open) {
                open_score += score;
            } else {
                closed_score += score;
            }

            details.push(AnswerDetail {
                question_id: q.id,
                text: q.question.clone(),
                user_answer,
                correct_answer,
                score,
                max_score: points,
                kind: q.kind.clone(),
            });
        }

        GradedSubmission {
            total_score: closed_score + open_score,
            max_score,
            closed_score,
            open_score,
            details,
        }
    }

    fn grade_closed(
        submitted: Option<&JsonValue>,
        correct: &str,
        points: f64,
    ) -> (f64, String, String) {
        let user = answer_as_text(submitted);
        let score = if submitted.is_some() && user.trim() == correct.trim() {
            points
        } else {
            0.0
        };
        (score, user, correct.to_string())
    }

    fn grade_multiclosed(
        submitted: Option<&JsonValue>,
        correct: &str,
        points: f64,
    ) -> (f64, String, String) {
        let correct_options = selection_from_text(correct);
        let user_options = submitted_selection(submitted);

        let matched = user_options
            .iter()
            .filter(|o| correct_options.contains(o))
            .count();
        let score = if correct_options.is_empty() {
            0.0
        } else {
            matched as f64 / correct_options.len() as f64 * points
        };

        (score, user_options.join(","), correct.to_string())
    }

    fn grade_open(
        submitted: Option<&JsonValue>,
        correct: &str,
        points: f64,
    ) -> (f64, String, String) {
        let user = answer_as_text(submitted);
        let score = if submitted.is_none() {
            0.0
        } else if correct.contains('$') {
            // LaTeX answers are all-or-nothing, compared whitespace-blind.
            let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
            if strip(&user) == strip(correct) {
                points
            } else {
                0.0
            }
        } else {
            cosine_similarity(&user, correct) * points
        };
        (score, user, correct.to_string())
    }

    fn grade_pairs(
        submitted: Option<&JsonValue>,
        correct: &str,
        points: f64,
    ) -> (f64, String, String) {
        let user_pairs: Vec<(String, String)> = match submitted {
            Some(JsonValue::Array(items)) => items
                .iter()
                .filter_map(|item| {
                    let term = item.get("term").and_then(JsonValue::as_str)?;
                    let definition = item.get("definition").and_then(JsonValue::as_str)?;
                    Some((
                        leading_digits(term).unwrap_or_else(|| term.to_string()),
                        leading_alpha(definition).unwrap_or_else(|| definition.to_string()),
                    ))
                })
                .collect(),
            Some(JsonValue::String(s)) => parse_pair_lines(s),
            _ => Vec::new(),
        };

        let correct_pairs = parse_pair_lines(correct);

        let matched = correct_pairs
            .iter()
            .filter(|(term, def)| {
                user_pairs
                    .iter()
                    .any(|(ut, ud)| ut == term && normalize_letter(ud) == normalize_letter(def))
            })
            .count();
        let score = if correct_pairs.is_empty() {
            0.0
        } else {
            matched as f64 / correct_pairs.len() as f64 * points
        };

        (score, join_pairs(&user_pairs), join_pairs(&correct_pairs))
    }
}

fn join_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(term, def)| format!("{} – {}", term, def))
        .collect::<Vec<_>>()
        .join("\n")
}

fn answer_as_text(answer: Option<&JsonValue>) -> String {
    match answer {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Array(items)) => items
            .iter()
            .map(value_to_text)
            .collect::<Vec<_>>()
            .join(","),
        Some(other) => other.to_string(),
    }
}

fn value_to_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Stored multiclosed answers are either a JSON array or a
/// comma-separated list.
fn selection_from_text(raw: &str) -> Vec<String> {
    if let Ok(JsonValue::Array(items)) = serde_json::from_str::<JsonValue>(raw) {
        return items
            .iter()
            .map(value_to_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn submitted_selection(answer: Option<&JsonValue>) -> Vec<String> {
    match answer {
        Some(JsonValue::String(s)) => s
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect(),
        Some(JsonValue::Array(items)) => items
            .iter()
            .map(value_to_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn leading_digits(s: &str) -> Option<String> {
    let digits: String = s
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

fn leading_alpha(s: &str) -> Option<String> {
    s.trim()
        .chars()
        .next()
        .filter(|c| c.is_alphabetic())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question(id: i64, kind: &str, points: i32, answer: &str) -> Question {
        Question {
            id,
            block_id: None,
            discipline_id: None,
            competence_id: None,
            kind: kind.to_string(),
            points,
            question: format!("Question {}", id),
            answer: answer.to_string(),
        }
    }

    fn answer(question_id: i64, value: JsonValue) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id,
            answer: value,
        }
    }

    fn approx(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-9
    }

    #[test]
    fn closed_question_is_all_or_nothing() {
        let questions = vec![question(1, "closed", 2, "b"), question(2, "closed", 2, "a")];
        let answers = vec![answer(1, json!("b")), answer(2, json!("c"))];

        let graded = GradingService::grade_submission(&questions, &answers);
        assert_eq!(graded.details[0].score, 2.0);
        assert_eq!(graded.details[1].score, 0.0);
        assert_eq!(graded.closed_score, 2.0);
        assert_eq!(graded.max_score, 4.0);
    }

    #[test]
    fn closed_answer_is_trimmed_before_comparison() {
        let questions = vec![question(1, "closed", 1, " b ")];
        let answers = vec![answer(1, json!("b"))];

        let graded = GradingService::grade_submission(&questions, &answers);
        assert_eq!(graded.total_score, 1.0);
    }

    #[test]
    fn multiclosed_scores_fraction_of_correct_options() {
        let questions = vec![question(1, "multiclosed", 4, "a,b")];
        let answers = vec![answer(1, json!("a"))];

        let graded = GradingService::grade_submission(&questions, &answers);
        assert_eq!(graded.total_score, 2.0);
    }

    #[test]
    fn multiclosed_accepts_array_payloads_and_json_answers() {
        let questions = vec![question(1, "multiclosed", 3, r#"["a","b","c"]"#)];
        let answers = vec![answer(1, json!(["a", "c"]))];

        let graded = GradingService::grade_submission(&questions, &answers);
        assert!(approx(graded.total_score, 2.0));
    }

    #[test]
    fn open_exact_match_gets_full_points() {
        let questions = vec![question(1, "open", 5, "borrow checker")];
        let answers = vec![answer(1, json!("borrow checker"))];

        let graded = GradingService::grade_submission(&questions, &answers);
        assert!(approx(graded.open_score, 5.0));
        assert_eq!(graded.closed_score, 0.0);
    }

    #[test]
    fn open_latex_answer_is_whitespace_blind_exact() {
        let questions = vec![question(1, "open", 3, "$x^2 + 1$")];

        let exact =
            GradingService::grade_submission(&questions, &[answer(1, json!("$x^2+1$"))]);
        assert_eq!(exact.open_score, 3.0);

        let wrong =
            GradingService::grade_submission(&questions, &[answer(1, json!("$x^2+2$"))]);
        assert_eq!(wrong.open_score, 0.0);
    }

    #[test]
    fn pairs_scores_matched_fraction_with_letter_folding() {
        let questions = vec![question(1, "pairs", 4, "1 – A\n2 – B")];
        // Cyrillic А in the submission must match the stored Latin A.
        let answers = vec![answer(
            1,
            json!([
                {"term": "1. TCP", "definition": "А. Connection-oriented"},
                {"term": "2. UDP", "definition": "C. Something else"},
            ]),
        )];

        let graded = GradingService::grade_submission(&questions, &answers);
        assert_eq!(graded.total_score, 2.0);
        assert_eq!(graded.details[0].user_answer, "1 – А\n2 – C");
    }

    #[test]
    fn pairs_accepts_typed_lines() {
        let questions = vec![question(1, "pairs", 2, "1 – A\n2 – B")];
        let answers = vec![answer(1, json!("1 - A\n2 - B"))];

        let graded = GradingService::grade_submission(&questions, &answers);
        assert_eq!(graded.total_score, 2.0);
    }

    #[test]
    fn missing_answer_scores_zero_but_is_reported() {
        let questions = vec![question(1, "closed", 2, "a")];

        let graded = GradingService::grade_submission(&questions, &[]);
        assert_eq!(graded.details.len(), 1);
        assert_eq!(graded.details[0].score, 0.0);
        assert_eq!(graded.details[0].user_answer, "");
        assert_eq!(graded.max_score, 2.0);
    }

    #[test]
    fn unknown_kind_scores_zero() {
        let questions = vec![question(1, "image", 2, "whatever")];
        let answers = vec![answer(1, json!("whatever"))];

        let graded = GradingService::grade_submission(&questions, &answers);
        assert_eq!(graded.total_score, 0.0);
        assert_eq!(graded.details[0].kind, "image");
    }

    #[test]
    fn open_and_closed_scores_split_by_kind() {
        let questions = vec![
            question(1, "closed", 2, "a"),
            question(2, "open", 4, "ownership moves values"),
        ];
        let answers = vec![
            answer(1, json!("a")),
            answer(2, json!("ownership moves values")),
        ];

        let graded = GradingService::grade_submission(&questions, &answers);
        assert_eq!(graded.closed_score, 2.0);
        assert!(approx(graded.open_score, 4.0));
        assert!(approx(graded.total_score, 6.0));
        assert_eq!(graded.max_score, 6.0);
    }
}
