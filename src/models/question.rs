use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: i64,
    pub block_id: Option<i64>,
    pub discipline_id: Option<i64>,
    pub competence_id: Option<i64>,
    /// Stored as text; see [`QuestionKind`] for the known values.
    pub kind: String,
    pub points: i32,
    /// Question body, may carry HTML markup from the rich-text editor.
    pub question: String,
    /// Answer format depends on the kind and is not validated here.
    pub answer: String,
}

impl Question {
    pub fn kind(&self) -> Option<QuestionKind> {
        QuestionKind::parse(&self.kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// Single choice, checked by exact answer match.
    Closed,
    /// Multiple choice, scored by the fraction of correct options picked.
    Multiclosed,
    /// Free text, graded by similarity or manually.
    Open,
    /// Term/definition matching.
    Pairs,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Closed => "closed",
            QuestionKind::Multiclosed => "multiclosed",
            QuestionKind::Open => "open",
            QuestionKind::Pairs => "pairs",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "closed" => Some(QuestionKind::Closed),
            "multiclosed" => Some(QuestionKind::Multiclosed),
            "open" => Some(QuestionKind::Open),
            "pairs" => Some(QuestionKind::Pairs),
            _ => None,
        }
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
