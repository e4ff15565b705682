use crate::models::question::QuestionKind;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTagPayload {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionPayload {
    pub block_id: Option<i64>,
    pub discipline_id: Option<i64>,
    pub competence_id: Option<i64>,
    pub kind: QuestionKind,
    #[validate(range(min = 1, message = "Points must be at least 1"))]
    pub points: Option<i32>,
    #[validate(length(min = 1, message = "Question text must not be empty"))]
    pub question: String,
    pub answer: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestionPayload {
    pub block_id: Option<i64>,
    pub discipline_id: Option<i64>,
    pub competence_id: Option<i64>,
    pub kind: Option<QuestionKind>,
    #[validate(range(min = 1, message = "Points must be at least 1"))]
    pub points: Option<i32>,
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub question: Option<String>,
    pub answer: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub kind: Option<QuestionKind>,
    pub block_id: Option<i64>,
    pub discipline_id: Option<i64>,
    pub competence_id: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTestPayload {
    #[validate(length(min = 1, message = "Test name must not be empty"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Timer must be at least 1 minute"))]
    pub timer_minutes: Option<i32>,
    pub access_code: Option<String>,
    pub question_ids: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTestPayload {
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Timer must be at least 1 minute"))]
    pub timer_minutes: Option<i32>,
    pub access_code: Option<String>,
    /// When present, replaces the whole question membership of the test.
    pub question_ids: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
pub struct TestListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SmartTestPayload {
    #[validate(length(min = 1, message = "Test name must not be empty"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Timer must be at least 1 minute"))]
    pub timer_minutes: Option<i32>,
    pub access_code: Option<String>,
    #[serde(default)]
    pub blocks: Vec<i64>,
    #[serde(default)]
    pub disciplines: Vec<i64>,
    #[serde(default)]
    pub competences: Vec<i64>,
    #[validate(range(min = 1, message = "Question count must be at least 1"))]
    pub num_questions: i64,
}

#[derive(Debug, Deserialize)]
pub struct ResultListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub test_id: Option<i64>,
    pub group: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateResultPayload {
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub student_full_name: Option<String>,
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub student_group: Option<String>,
    pub open_score: Option<f64>,
    pub max_score: Option<f64>,
    pub details: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// "xlsx" (default) or "csv".
    pub format: Option<String>,
}

// Custom deserializer to trim strings and convert empty strings to None
fn trim_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}
