use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Test {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub timer_minutes: i32,
    /// Empty string means the test is open without a code.
    pub access_code: String,
    pub created_at: DateTime<Utc>,
}

/// Per-(test, block) row recording how many questions the admin wants
/// drawn from that block. Recorded and surfaced, but the smart assembler
/// samples against a single total count and never consults it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TestBlock {
    pub test_id: i64,
    pub block_id: i64,
    pub num_questions: i32,
}
