use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{Duration, Utc};
use serde_json::json;
use std::collections::HashMap;
use validator::Validate;

use crate::dto::public_dto::{
    MatchingPairs, PasscodeRequest, PresentedQuestion, SubmitTestRequest, SubmitTestResponse,
    TestBlockInfo, TestDetailResponse, TestSummary,
};
use crate::error::Result;
use crate::models::question::{Question, QuestionKind};
use crate::services::grading_service::GradingService;
use crate::utils::text::{parse_matching_terms_defs, parse_question_options};
use crate::AppState;

#[axum::debug_handler]
pub async fn list_tests(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let tests = state.test_service.all_tests().await?;
    let summaries: Vec<TestSummary> = tests
        .into_iter()
        .map(|t| TestSummary {
            id: t.id,
            title: t.name,
            time_limit: t.timer_minutes,
        })
        .collect();
    Ok(Json(summaries))
}

enum PasscodeOutcome {
    Granted,
    NotRequired,
    Invalid,
}

/// Access-code check: an unset code admits only an empty submission; a
/// set code requires an exact match.
fn check_passcode(stored: &str, supplied: &str) -> PasscodeOutcome {
    if stored.is_empty() {
        if supplied.is_empty() {
            PasscodeOutcome::Granted
        } else {
            PasscodeOutcome::NotRequired
        }
    } else if stored == supplied {
        PasscodeOutcome::Granted
    } else {
        PasscodeOutcome::Invalid
    }
}

#[axum::debug_handler]
pub async fn verify_passcode(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<PasscodeRequest>,
) -> Result<Response> {
    let test = state.test_service.get_test(id).await?;
    let supplied = payload.passcode.unwrap_or_default();

    let response = match check_passcode(&test.access_code, &supplied) {
        PasscodeOutcome::Granted => Json(json!({ "success": true })).into_response(),
        PasscodeOutcome::NotRequired => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Access code is not required for this test" })),
        )
            .into_response(),
        PasscodeOutcome::Invalid => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid access code" })),
        )
            .into_response(),
    };
    Ok(response)
}

/// Prepare a question for the test runner. Closed kinds present as
/// multiple choice with the options split out of the body; pairs
/// present as matching with terms and definitions. Stored answers never
/// leave the server.
fn present_question(q: &Question, block_names: &HashMap<i64, String>) -> PresentedQuestion {
    let block = q
        .block_id
        .and_then(|id| block_names.get(&id).cloned())
        .unwrap_or_default();

    let (presented_kind, text, options, pairs) = match q.kind() {
        Some(QuestionKind::Closed) | Some(QuestionKind::Multiclosed) => {
            let (stem, options) = parse_question_options(&q.question);
            (
                "multiple_choice".to_string(),
                stem,
                Some(options),
                None,
            )
        }
        Some(QuestionKind::Pairs) => {
            let (terms, definitions) = parse_matching_terms_defs(&q.question);
            (
                "matching".to_string(),
                "Match the terms with the definitions".to_string(),
                None,
                Some(MatchingPairs { terms, definitions }),
            )
        }
        _ => (q.kind.clone(), q.question.clone(), None, None),
    };

    PresentedQuestion {
        id: q.id,
        block,
        presented_kind,
        original_kind: q.kind.clone(),
        text,
        options,
        pairs,
        points: q.points,
    }
}

#[axum::debug_handler]
pub async fn get_test(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let test = state.test_service.get_test(id).await?;
    let quotas = state.test_service.block_quotas(id).await?;
    let questions = state.test_service.questions_of_test(id).await?;

    let block_names: HashMap<i64, String> = state
        .bank_service
        .list_blocks()
        .await?
        .into_iter()
        .map(|b| (b.id, b.name))
        .collect();

    let response = TestDetailResponse {
        id: test.id,
        title: test.name,
        description: test.description,
        time_limit: test.timer_minutes,
        blocks: quotas
            .into_iter()
            .map(|q| TestBlockInfo {
                id: q.id,
                name: q.name,
                questions_count: q.num_questions,
            })
            .collect(),
        questions: questions
            .iter()
            .map(|q| present_question(q, &block_names))
            .collect(),
    };

    Ok(Json(response))
}

/// Grade a submission against the test's questions and persist the
/// result with its per-question breakdown.
#[axum::debug_handler]
pub async fn submit_test(
    State(state): State<AppState>,
    Json(payload): Json<SubmitTestRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let test = state.test_service.get_test(payload.test_id).await?;
    let questions = state.test_service.questions_of_test(test.id).await?;

    let graded = GradingService::grade_submission(&questions, &payload.answers);

    let duration_sec = payload.duration_sec.unwrap_or(0).clamp(0, i32::MAX as i64);
    let finished_at = Utc::now();
    let started_at = finished_at - Duration::seconds(duration_sec);

    let result = state
        .result_service
        .create_result(
            test.id,
            &payload.student_info.full_name,
            &payload.student_info.group,
            &graded,
            started_at,
            finished_at,
            duration_sec as i32,
        )
        .await?;

    Ok(Json(SubmitTestResponse {
        result_id: result.id,
        total_score: graded.total_score,
        max_score: graded.max_score,
        percent: result.percent,
        closed_score: graded.closed_score,
        open_score: graded.open_score,
        duration_sec,
        results: graded.details,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_code_admits_only_empty_input() {
        assert!(matches!(check_passcode("", ""), PasscodeOutcome::Granted));
        assert!(matches!(
            check_passcode("", "anything"),
            PasscodeOutcome::NotRequired
        ));
    }

    #[test]
    fn set_code_requires_exact_match() {
        assert!(matches!(
            check_passcode("secret", "secret"),
            PasscodeOutcome::Granted
        ));
        assert!(matches!(
            check_passcode("secret", "wrong"),
            PasscodeOutcome::Invalid
        ));
        assert!(matches!(
            check_passcode("secret", ""),
            PasscodeOutcome::Invalid
        ));
    }

    #[test]
    fn closed_question_presents_as_multiple_choice_without_answer() {
        let q = Question {
            id: 7,
            block_id: Some(1),
            discipline_id: None,
            competence_id: None,
            kind: "closed".to_string(),
            points: 2,
            question: "Which layer is TCP?\na) Network\nb) Transport".to_string(),
            answer: "b".to_string(),
        };
        let mut names = HashMap::new();
        names.insert(1, "Networking".to_string());

        let presented = present_question(&q, &names);
        assert_eq!(presented.presented_kind, "multiple_choice");
        assert_eq!(presented.original_kind, "closed");
        assert_eq!(presented.block, "Networking");
        assert_eq!(presented.text, "Which layer is TCP?");
        assert_eq!(
            presented.options.as_deref(),
            Some(&["Network".to_string(), "Transport".to_string()][..])
        );
        let encoded = serde_json::to_string(&presented).unwrap();
        assert!(!encoded.contains("\"answer\""));
    }

    #[test]
    fn pairs_question_presents_terms_and_definitions() {
        let q = Question {
            id: 8,
            block_id: None,
            discipline_id: None,
            competence_id: None,
            kind: "pairs".to_string(),
            points: 3,
            question: "1. TCP\n2. UDP\nA. Reliable\nB. Best effort".to_string(),
            answer: "1 – A\n2 – B".to_string(),
        };

        let presented = present_question(&q, &HashMap::new());
        assert_eq!(presented.presented_kind, "matching");
        let pairs = presented.pairs.unwrap();
        assert_eq!(pairs.terms, vec!["1. TCP", "2. UDP"]);
        assert_eq!(pairs.definitions, vec!["A. Reliable", "B. Best effort"]);
    }
}
