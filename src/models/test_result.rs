use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TestResult {
    pub id: i64,
    pub student_full_name: String,
    pub student_group: String,
    pub test_id: i64,
    pub total_score: f64,
    pub max_score: f64,
    pub percent: f64,
    pub closed_score: f64,
    pub open_score: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_sec: i32,
    /// Per-question outcome list; see [`AnswerDetail`] for the entry
    /// shape. Kept as raw JSON because admin edits and older writers may
    /// leave it malformed, and the scorer must tolerate that.
    pub details: JsonValue,
    pub created_at: DateTime<Utc>,
}

/// One per-question outcome inside `TestResult::details`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerDetail {
    pub question_id: i64,
    pub text: String,
    #[serde(rename = "userAnswer")]
    pub user_answer: String,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
    pub score: f64,
    #[serde(rename = "maxScore")]
    pub max_score: f64,
    #[serde(rename = "type")]
    pub kind: String,
}
