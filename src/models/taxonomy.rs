use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Topic grouping for questions. A question belongs to at most one block.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Block {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Discipline {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Competence {
    pub id: i64,
    pub name: String,
}
