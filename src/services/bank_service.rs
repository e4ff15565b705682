use crate::dto::admin_dto::{CreateQuestionPayload, QuestionListQuery, UpdateQuestionPayload};
use crate::error::Result;
use crate::models::question::Question;
use crate::models::taxonomy::{Block, Competence, Discipline};
use sqlx::PgPool;

#[derive(Debug, serde::Serialize)]
pub struct PaginatedQuestions {
    #[serde(rename = "items")]
    pub questions: Vec<Question>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Clone)]
pub struct BankService {
    pool: PgPool,
}

impl BankService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_blocks(&self) -> Result<Vec<Block>> {
        let rows = sqlx::query_as::<_, Block>("SELECT id, name FROM blocks ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_disciplines(&self) -> Result<Vec<Discipline>> {
        let rows = sqlx::query_as::<_, Discipline>("SELECT id, name FROM disciplines ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_competences(&self) -> Result<Vec<Competence>> {
        let rows = sqlx::query_as::<_, Competence>("SELECT id, name FROM competences ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_or_create_block(&self, name: &str) -> Result<Block> {
        let (id, name) = self.get_or_create_named("blocks", name).await?;
        Ok(Block { id, name })
    }

    pub async fn get_or_create_discipline(&self, name: &str) -> Result<Discipline> {
        let (id, name) = self.get_or_create_named("disciplines", name).await?;
        Ok(Discipline { id, name })
    }

    pub async fn get_or_create_competence(&self, name: &str) -> Result<Competence> {
        let (id, name) = self.get_or_create_named("competences", name).await?;
        Ok(Competence { id, name })
    }

    /// Get-or-create on a (id, name UNIQUE) tag table. Concurrent
    /// imports referencing the same new name race on the uniqueness
    /// constraint; the loser's insert returns no row and the surviving
    /// row is re-read.
    async fn get_or_create_named(&self, table: &str, name: &str) -> Result<(i64, String)> {
        let select = format!("SELECT id, name FROM {} WHERE name = $1", table);
        if let Some(row) = sqlx::query_as::<_, (i64, String)>(&select)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
        {
            return Ok(row);
        }

        let insert = format!(
            "INSERT INTO {} (name) VALUES ($1) ON CONFLICT (name) DO NOTHING RETURNING id, name",
            table
        );
        if let Some(row) = sqlx::query_as::<_, (i64, String)>(&insert)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
        {
            return Ok(row);
        }

        let row = sqlx::query_as::<_, (i64, String)>(&select)
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn delete_block(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blocks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_discipline(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM disciplines WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_competence(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM competences WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn create_question(&self, payload: CreateQuestionPayload) -> Result<Question> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (block_id, discipline_id, competence_id, kind, points, question, answer)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, block_id, discipline_id, competence_id, kind, points, question, answer
            "#,
        )
        .bind(payload.block_id)
        .bind(payload.discipline_id)
        .bind(payload.competence_id)
        .bind(payload.kind.as_str())
        .bind(payload.points.unwrap_or(1))
        .bind(&payload.question)
        .bind(payload.answer.unwrap_or_default())
        .fetch_one(&self.pool)
        .await?;

        Ok(question)
    }

    pub async fn get_question(&self, id: i64) -> Result<Question> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, block_id, discipline_id, competence_id, kind, points, question, answer
            FROM questions WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(question)
    }

    pub async fn update_question(
        &self,
        id: i64,
        payload: UpdateQuestionPayload,
    ) -> Result<Question> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            UPDATE questions
            SET
                block_id = COALESCE($1, block_id),
                discipline_id = COALESCE($2, discipline_id),
                competence_id = COALESCE($3, competence_id),
                kind = COALESCE($4, kind),
                points = COALESCE($5, points),
                question = COALESCE($6, question),
                answer = COALESCE($7, answer)
            WHERE id = $8
            RETURNING id, block_id, discipline_id, competence_id, kind, points, question, answer
            "#,
        )
        .bind(payload.block_id)
        .bind(payload.discipline_id)
        .bind(payload.competence_id)
        .bind(payload.kind.map(|k| k.as_str().to_string()))
        .bind(payload.points)
        .bind(payload.question)
        .bind(payload.answer)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(question)
    }

    pub async fn delete_question(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_questions(&self, query: &QuestionListQuery) -> Result<PaginatedQuestions> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(25).clamp(1, 200);
        let offset = (page - 1) * per_page;

        let kind_param = query.kind.map(|k| k.as_str().to_string());
        let search_param = query.search.as_ref().map(|s| format!("%{}%", s));

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM questions
            WHERE ($1::text IS NULL OR kind = $1)
              AND ($2::bigint IS NULL OR block_id = $2)
              AND ($3::bigint IS NULL OR discipline_id = $3)
              AND ($4::bigint IS NULL OR competence_id = $4)
              AND ($5::text IS NULL OR question ILIKE $5)
            "#,
        )
        .bind(&kind_param)
        .bind(query.block_id)
        .bind(query.discipline_id)
        .bind(query.competence_id)
        .bind(&search_param)
        .fetch_one(&self.pool)
        .await?;

        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, block_id, discipline_id, competence_id, kind, points, question, answer
            FROM questions
            WHERE ($1::text IS NULL OR kind = $1)
              AND ($2::bigint IS NULL OR block_id = $2)
              AND ($3::bigint IS NULL OR discipline_id = $3)
              AND ($4::bigint IS NULL OR competence_id = $4)
              AND ($5::text IS NULL OR question ILIKE $5)
            ORDER BY id
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(&kind_param)
        .bind(query.block_id)
        .bind(query.discipline_id)
        .bind(query.competence_id)
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

        Ok(PaginatedQuestions {
            questions,
            total,
            page,
            per_page,
            total_pages,
        })
    }
}
