use serde::{Deserialize, Serialize};

/// A trivia question. Ids are assigned by the store and never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    /// Category id by convention; not enforced against the categories table.
    pub category: i64,
    pub difficulty: i64,
}

/// A question category. Read-only through the API, pre-seeded in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Fields for a question about to be inserted. All optional: the store
/// decides whether missing fields are acceptable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewQuestion {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub category: Option<i64>,
    pub difficulty: Option<i64>,
}
