use crate::domain::NewQuestion;
use crate::error::Result;
use crate::storage::Storage;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Shape of a seed file: pre-seeded categories plus an optional starting
/// question set. Question `category` values are indices into the store's
/// category table, same as at runtime.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub questions: Vec<SeedQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct SeedQuestion {
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: i64,
}

#[derive(Debug, Default, PartialEq)]
pub struct SeedSummary {
    pub categories: usize,
    pub questions: usize,
}

/// Loads a JSON seed file into the store.
pub async fn seed_from_file<P: AsRef<Path>>(
    storage: &dyn Storage,
    path: P,
) -> Result<SeedSummary> {
    let content = fs::read_to_string(&path)?;
    let seed: SeedFile = serde_json::from_str(&content)?;

    let mut summary = SeedSummary::default();
    for category in &seed.categories {
        storage.create_category(&category.kind).await?;
        summary.categories += 1;
    }
    for question in &seed.questions {
        storage
            .create_question(&NewQuestion {
                question: Some(question.question.clone()),
                answer: Some(question.answer.clone()),
                category: Some(question.category),
                difficulty: Some(question.difficulty),
            })
            .await?;
        summary.questions += 1;
    }

    info!(
        "Seeded {} categories and {} questions from {}",
        summary.categories,
        summary.questions,
        path.as_ref().display()
    );
    Ok(summary)
}
