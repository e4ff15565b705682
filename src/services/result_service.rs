use crate::dto::admin_dto::{ResultListQuery, UpdateResultPayload};
use crate::error::Result;
use crate::models::test_result::TestResult;
use crate::services::grading_service::GradedSubmission;
use crate::services::scoring_service::ScoringService;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;

#[derive(Debug, serde::Serialize)]
pub struct PaginatedResults {
    #[serde(rename = "items")]
    pub results: Vec<TestResult>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

const RESULT_COLUMNS: &str = "id, student_full_name, student_group, test_id, total_score, \
     max_score, percent, closed_score, open_score, started_at, finished_at, duration_sec, \
     details, created_at";

#[derive(Clone)]
pub struct ResultService {
    pool: PgPool,
}

impl ResultService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a freshly graded submission.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_result(
        &self,
        test_id: i64,
        student_full_name: &str,
        student_group: &str,
        graded: &GradedSubmission,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        duration_sec: i32,
    ) -> Result<TestResult> {
        let details = serde_json::to_value(&graded.details)?;
        let percent = if graded.max_score != 0.0 {
            graded.total_score / graded.max_score * 100.0
        } else {
            0.0
        };

        let result = sqlx::query_as::<_, TestResult>(&format!(
            r#"
            INSERT INTO test_results (
                student_full_name, student_group, test_id,
                total_score, max_score, percent, closed_score, open_score,
                started_at, finished_at, duration_sec, details
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            RESULT_COLUMNS
        ))
        .bind(student_full_name)
        .bind(student_group)
        .bind(test_id)
        .bind(graded.total_score)
        .bind(graded.max_score)
        .bind(percent)
        .bind(graded.closed_score)
        .bind(graded.open_score)
        .bind(started_at)
        .bind(finished_at)
        .bind(duration_sec)
        .bind(details)
        .fetch_one(&self.pool)
        .await?;

        info!(
            result_id = result.id,
            test_id,
            total = result.total_score,
            max = result.max_score,
            "stored test result"
        );

        Ok(result)
    }

    pub async fn get_result(&self, id: i64) -> Result<TestResult> {
        let result = sqlx::query_as::<_, TestResult>(&format!(
            "SELECT {} FROM test_results WHERE id = $1",
            RESULT_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(result)
    }

    pub async fn list_results(&self, query: &ResultListQuery) -> Result<PaginatedResults> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(25).clamp(1, 200);
        let offset = (page - 1) * per_page;
        let search_param = query.search.as_ref().map(|s| format!("%{}%", s));

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM test_results
            WHERE ($1::bigint IS NULL OR test_id = $1)
              AND ($2::text IS NULL OR student_group = $2)
              AND ($3::text IS NULL OR student_full_name ILIKE $3)
            "#,
        )
        .bind(query.test_id)
        .bind(&query.group)
        .bind(&search_param)
        .fetch_one(&self.pool)
        .await?;

        let results = sqlx::query_as::<_, TestResult>(&format!(
            r#"
            SELECT {} FROM test_results
            WHERE ($1::bigint IS NULL OR test_id = $1)
              AND ($2::text IS NULL OR student_group = $2)
              AND ($3::text IS NULL OR student_full_name ILIKE $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
            RESULT_COLUMNS
        ))
        .bind(query.test_id)
        .bind(&query.group)
        .bind(&search_param)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total_pages = if per_page > 0 {
            ((total as f64) / (per_page as f64)).ceil() as i64
        } else {
            1
        };

        Ok(PaginatedResults {
            results,
            total,
            page,
            per_page,
            total_pages,
        })
    }

    /// Apply an administrative edit. The stored `closed_score`,
    /// `total_score` and `percent` are never trusted: they are rederived
    /// from `details` and `open_score` on every save.
    pub async fn update_result(&self, id: i64, payload: UpdateResultPayload) -> Result<TestResult> {
        let existing = self.get_result(id).await?;

        let student_full_name = payload
            .student_full_name
            .unwrap_or(existing.student_full_name);
        let student_group = payload.student_group.unwrap_or(existing.student_group);
        let open_score = payload.open_score.unwrap_or(existing.open_score);
        let max_score = payload.max_score.unwrap_or(existing.max_score);
        let details = payload.details.unwrap_or(existing.details);

        let breakdown = ScoringService::recompute(&details, open_score, max_score);

        let result = sqlx::query_as::<_, TestResult>(&format!(
            r#"
            UPDATE test_results
            SET
                student_full_name = $1,
                student_group = $2,
                open_score = $3,
                max_score = $4,
                details = $5,
                closed_score = $6,
                total_score = $7,
                percent = $8
            WHERE id = $9
            RETURNING {}
            "#,
            RESULT_COLUMNS
        ))
        .bind(&student_full_name)
        .bind(&student_group)
        .bind(open_score)
        .bind(max_score)
        .bind(&details)
        .bind(breakdown.closed_score)
        .bind(breakdown.total_score)
        .bind(breakdown.percent)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    pub async fn delete_result(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM test_results WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
