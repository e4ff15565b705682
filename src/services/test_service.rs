use crate::dto::admin_dto::{CreateTestPayload, TestListQuery, UpdateTestPayload};
use crate::error::Result;
use crate::models::question::Question;
use crate::models::test::Test;
use sqlx::PgPool;

#[derive(Debug, serde::Serialize)]
pub struct PaginatedTests {
    #[serde(rename = "items")]
    pub tests: Vec<Test>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

/// A block attached to a test together with its desired question count.
#[derive(Debug, serde::Serialize, sqlx::FromRow)]
pub struct BlockQuota {
    pub id: i64,
    pub name: String,
    pub num_questions: i32,
}

const TEST_COLUMNS: &str = "id, name, description, timer_minutes, access_code, created_at";

#[derive(Clone)]
pub struct TestService {
    pool: PgPool,
}

impl TestService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_test(&self, payload: CreateTestPayload) -> Result<Test> {
        let mut tx = self.pool.begin().await?;

        let test = sqlx::query_as::<_, Test>(&format!(
            r#"
            INSERT INTO tests (name, description, timer_minutes, access_code)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            TEST_COLUMNS
        ))
        .bind(&payload.name)
        .bind(payload.description.unwrap_or_default())
        .bind(payload.timer_minutes.unwrap_or(30))
        .bind(payload.access_code.unwrap_or_default())
        .fetch_one(&mut *tx)
        .await?;

        if let Some(question_ids) = &payload.question_ids {
            sqlx::query(
                r#"
                INSERT INTO test_questions (test_id, question_id)
                SELECT $1, UNNEST($2::bigint[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(test.id)
            .bind(question_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(test)
    }

    /// Every test, oldest first, for the public test picker.
    pub async fn all_tests(&self) -> Result<Vec<Test>> {
        let tests = sqlx::query_as::<_, Test>(&format!(
            "SELECT {} FROM tests ORDER BY id",
            TEST_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(tests)
    }

    pub async fn get_test(&self, id: i64) -> Result<Test> {
        let test = sqlx::query_as::<_, Test>(&format!(
            "SELECT {} FROM tests WHERE id = $1",
            TEST_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(test)
    }

    pub async fn list_tests(&self, query: &TestListQuery) -> Result<PaginatedTests> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(25).clamp(1, 200);
        let offset = (page - 1) * per_page;
        let search_param = query.search.as_ref().map(|s| format!("%{}%", s));

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM tests
            WHERE ($1::text IS NULL OR name ILIKE $1 OR description ILIKE $1)
            "#,
        )
        .bind(&search_param)
        .fetch_one(&self.pool)
        .await?;

        let tests = sqlx::query_as::<_, Test>(&format!(
            r#"
            SELECT {} FROM tests
            WHERE ($1::text IS NULL OR name ILIKE $1 OR description ILIKE $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            TEST_COLUMNS
        ))
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

        Ok(PaginatedTests {
            tests,
            total,
            page,
            per_page,
            total_pages,
        })
    }

    pub async fn update_test(&self, id: i64, payload: UpdateTestPayload) -> Result<Test> {
        let mut tx = self.pool.begin().await?;

        let test = sqlx::query_as::<_, Test>(&format!(
            r#"
            UPDATE tests
            SET
                name = COALESCE($1, name),
                description = COALESCE($2, description),
                timer_minutes = COALESCE($3, timer_minutes),
                access_code = COALESCE($4, access_code)
            WHERE id = $5
            RETURNING {}
            "#,
            TEST_COLUMNS
        ))
        .bind(payload.name)
        .bind(payload.description)
        .bind(payload.timer_minutes)
        .bind(payload.access_code)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        // Question membership is replaced wholesale when supplied; the
        // assembled content never changes behind the admin's back.
        if let Some(question_ids) = &payload.question_ids {
            sqlx::query("DELETE FROM test_questions WHERE test_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query(
                r#"
                INSERT INTO test_questions (test_id, question_id)
                SELECT $1, UNNEST($2::bigint[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(id)
            .bind(question_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(test)
    }

    pub async fn delete_test(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn name_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tests WHERE name = $1")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn questions_of_test(&self, test_id: i64) -> Result<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT q.id, q.block_id, q.discipline_id, q.competence_id,
                   q.kind, q.points, q.question, q.answer
            FROM questions q
            JOIN test_questions tq ON tq.question_id = q.id
            WHERE tq.test_id = $1
            ORDER BY q.id
            "#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    pub async fn block_quotas(&self, test_id: i64) -> Result<Vec<BlockQuota>> {
        let quotas = sqlx::query_as::<_, BlockQuota>(
            r#"
            SELECT b.id, b.name, tb.num_questions
            FROM test_blocks tb
            JOIN blocks b ON b.id = tb.block_id
            WHERE tb.test_id = $1
            ORDER BY b.name
            "#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(quotas)
    }

    pub async fn attach_block(&self, test_id: i64, block_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO test_blocks (test_id, block_id)
            VALUES ($1, $2)
            ON CONFLICT (test_id, block_id) DO NOTHING
            "#,
        )
        .bind(test_id)
        .bind(block_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn attach_question(&self, test_id: i64, question_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO test_questions (test_id, question_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(test_id)
        .bind(question_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
