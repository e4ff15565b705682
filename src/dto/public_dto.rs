use crate::models::test_result::AnswerDetail;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct PasscodeRequest {
    pub passcode: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedAnswer {
    #[serde(rename = "questionId")]
    pub question_id: i64,
    /// String for closed/open answers, array for multiclosed, array of
    /// `{term, definition}` objects or `N – L` lines for pairs.
    pub answer: JsonValue,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StudentInfo {
    #[serde(rename = "fullName")]
    #[validate(length(min = 1, message = "Student name must not be empty"))]
    pub full_name: String,
    #[serde(default)]
    pub group: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitTestRequest {
    #[serde(rename = "testId")]
    pub test_id: i64,
    pub answers: Vec<SubmittedAnswer>,
    #[serde(rename = "studentInfo")]
    #[validate(nested)]
    pub student_info: StudentInfo,
    #[serde(rename = "durationSec")]
    pub duration_sec: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TestSummary {
    pub id: i64,
    pub title: String,
    #[serde(rename = "timeLimit")]
    pub time_limit: i32,
}

#[derive(Debug, Serialize)]
pub struct TestBlockInfo {
    pub id: i64,
    pub name: String,
    #[serde(rename = "questionsCount")]
    pub questions_count: i32,
}

#[derive(Debug, Serialize)]
pub struct MatchingPairs {
    pub terms: Vec<String>,
    pub definitions: Vec<String>,
}

/// A question prepared for presentation: closed kinds are split into a
/// stem plus options, pairs into terms and definitions.
#[derive(Debug, Serialize)]
pub struct PresentedQuestion {
    pub id: i64,
    pub block: String,
    #[serde(rename = "type")]
    pub presented_kind: String,
    #[serde(rename = "originalType")]
    pub original_kind: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairs: Option<MatchingPairs>,
    pub points: i32,
}

#[derive(Debug, Serialize)]
pub struct TestDetailResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(rename = "timeLimit")]
    pub time_limit: i32,
    pub blocks: Vec<TestBlockInfo>,
    pub questions: Vec<PresentedQuestion>,
}

#[derive(Debug, Serialize)]
pub struct SubmitTestResponse {
    #[serde(rename = "resultId")]
    pub result_id: i64,
    #[serde(rename = "totalScore")]
    pub total_score: f64,
    #[serde(rename = "maxScore")]
    pub max_score: f64,
    pub percent: f64,
    #[serde(rename = "closedScore")]
    pub closed_score: f64,
    #[serde(rename = "openScore")]
    pub open_score: f64,
    #[serde(rename = "durationSec")]
    pub duration_sec: i64,
    pub results: Vec<AnswerDetail>,
}
