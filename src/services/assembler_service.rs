use crate::error::{Error, Result};
use crate::models::test::Test;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sqlx::PgPool;
use tracing::info;

/// Inputs for smart test creation. The three tag sets are generation
/// filters: a question must match at least one value in every non-empty
/// dimension. An empty set places no constraint on that dimension.
#[derive(Debug, Clone)]
pub struct SmartTestSpec {
    pub name: String,
    pub description: String,
    pub timer_minutes: i32,
    pub access_code: String,
    pub blocks: Vec<i64>,
    pub disciplines: Vec<i64>,
    pub competences: Vec<i64>,
    pub count: usize,
}

#[derive(Clone)]
pub struct AssemblerService {
    pool: PgPool,
}

impl AssemblerService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn assemble(&self, spec: &SmartTestSpec) -> Result<Test> {
        let mut rng = StdRng::from_entropy();
        self.assemble_with_rng(spec, &mut rng).await
    }

    /// Create a test from a uniform random sample of the eligible pool.
    ///
    /// The pool read, the test row, its tag associations, and its
    /// question membership all happen in one transaction, so the count
    /// and the draw see the same snapshot and a failed draw leaves no
    /// partial test behind.
    pub async fn assemble_with_rng<R: Rng + Send>(
        &self,
        spec: &SmartTestSpec,
        rng: &mut R,
    ) -> Result<Test> {
        if spec.count == 0 {
            return Err(Error::BadRequest(
                "Requested question count must be positive".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let pool_ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM questions
            WHERE (cardinality($1::bigint[]) = 0 OR block_id = ANY($1))
              AND (cardinality($2::bigint[]) = 0 OR discipline_id = ANY($2))
              AND (cardinality($3::bigint[]) = 0 OR competence_id = ANY($3))
            "#,
        )
        .bind(&spec.blocks)
        .bind(&spec.disciplines)
        .bind(&spec.competences)
        .fetch_all(&mut *tx)
        .await?;

        let chosen = draw_sample(&pool_ids, spec.count, rng)?;

        let test = sqlx::query_as::<_, Test>(
            r#"
            INSERT INTO tests (name, description, timer_minutes, access_code)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, timer_minutes, access_code, created_at
            "#,
        )
        .bind(&spec.name)
        .bind(&spec.description)
        .bind(spec.timer_minutes)
        .bind(&spec.access_code)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO test_blocks (test_id, block_id)
            SELECT $1, UNNEST($2::bigint[])
            ON CONFLICT (test_id, block_id) DO NOTHING
            "#,
        )
        .bind(test.id)
        .bind(&spec.blocks)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO test_disciplines (test_id, discipline_id)
            SELECT $1, UNNEST($2::bigint[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(test.id)
        .bind(&spec.disciplines)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO test_competences (test_id, competence_id)
            SELECT $1, UNNEST($2::bigint[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(test.id)
        .bind(&spec.competences)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO test_questions (test_id, question_id)
            SELECT $1, UNNEST($2::bigint[])
            "#,
        )
        .bind(test.id)
        .bind(&chosen)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            test_id = test.id,
            pool = pool_ids.len(),
            selected = chosen.len(),
            "assembled smart test"
        );

        Ok(test)
    }
}

/// Uniform sample without replacement: every subset of `count` ids from
/// the pool is equally likely.
pub fn draw_sample<R: Rng + ?Sized>(pool: &[i64], count: usize, rng: &mut R) -> Result<Vec<i64>> {
    if pool.len() < count {
        return Err(Error::InsufficientPool {
            available: pool.len(),
            requested: count,
        });
    }
    Ok(pool.choose_multiple(rng, count).copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sample_has_exact_size_and_no_duplicates() {
        let pool: Vec<i64> = (1..=20).collect();
        let mut rng = StdRng::seed_from_u64(7);

        let sample = draw_sample(&pool, 8, &mut rng).unwrap();
        assert_eq!(sample.len(), 8);

        let unique: HashSet<i64> = sample.iter().copied().collect();
        assert_eq!(unique.len(), 8);
        assert!(sample.iter().all(|id| pool.contains(id)));
    }

    #[test]
    fn requesting_more_than_available_fails_with_counts() {
        let pool: Vec<i64> = vec![1, 2, 3];
        let mut rng = StdRng::seed_from_u64(0);

        match draw_sample(&pool, 5, &mut rng) {
            Err(Error::InsufficientPool {
                available,
                requested,
            }) => {
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("expected InsufficientPool, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn draw_of_full_pool_returns_everything() {
        let pool: Vec<i64> = (1..=5).collect();
        let mut rng = StdRng::seed_from_u64(3);

        let mut sample = draw_sample(&pool, 5, &mut rng).unwrap();
        sample.sort_unstable();
        assert_eq!(sample, pool);
    }

    #[test]
    fn seeded_draws_are_reproducible() {
        let pool: Vec<i64> = (1..=50).collect();

        let a = draw_sample(&pool, 10, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = draw_sample(&pool, 10, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn sampling_is_roughly_uniform() {
        let pool: Vec<i64> = (0..10).collect();
        let count = 3;
        let trials = 6000;
        let mut rng = StdRng::seed_from_u64(1234);

        let mut hits = vec![0usize; pool.len()];
        for _ in 0..trials {
            for id in draw_sample(&pool, count, &mut rng).unwrap() {
                hits[id as usize] += 1;
            }
        }

        // Expected inclusion frequency is k/n = 0.3 per element.
        let expected = count as f64 / pool.len() as f64;
        for (id, &h) in hits.iter().enumerate() {
            let freq = h as f64 / trials as f64;
            assert!(
                (freq - expected).abs() < 0.05,
                "element {} frequency {} too far from {}",
                id,
                freq,
                expected
            );
        }
    }
}
