use crate::domain::{Category, NewQuestion, Question};
use crate::error::{ApiError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::debug;

/// Predicate over questions, used identically for listing and counting.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionFilter {
    /// Every question.
    All,
    /// Questions in one category.
    ByCategory(i64),
    /// Quiz candidates: optionally restricted to one category, always
    /// excluding already-played ids.
    Excluding {
        category: Option<i64>,
        previous: Vec<i64>,
    },
    /// Case-insensitive substring match on the question text.
    TextContains(String),
}

/// Storage trait for trivia data. Listings are always ordered by id
/// ascending.
#[async_trait]
pub trait Storage: Send + Sync {
    // Category operations
    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn get_category(&self, id: i64) -> Result<Option<Category>>;
    /// Seed-time insert; no API endpoint exposes this.
    async fn create_category(&self, kind: &str) -> Result<i64>;

    // Question operations
    async fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>>;
    async fn count_questions(&self, filter: &QuestionFilter) -> Result<usize>;
    async fn get_question(&self, id: i64) -> Result<Option<Question>>;
    async fn create_question(&self, new: &NewQuestion) -> Result<i64>;
    async fn delete_question(&self, id: i64) -> Result<()>;
}

impl QuestionFilter {
    /// Shared predicate so in-memory filtering and counting never diverge.
    pub fn matches(&self, question: &Question) -> bool {
        match self {
            QuestionFilter::All => true,
            QuestionFilter::ByCategory(category) => question.category == *category,
            QuestionFilter::Excluding { category, previous } => {
                category.map_or(true, |c| question.category == c)
                    && !previous.contains(&question.id)
            }
            QuestionFilter::TextContains(term) => question
                .question
                .to_lowercase()
                .contains(&term.to_lowercase()),
        }
    }
}

/// In-memory storage implementation for development/testing. Ids are
/// assigned monotonically and never reused, matching SQLite AUTOINCREMENT.
pub struct InMemoryStorage {
    categories: Mutex<BTreeMap<i64, Category>>,
    questions: Mutex<BTreeMap<i64, Question>>,
    next_category_id: Mutex<i64>,
    next_question_id: Mutex<i64>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            categories: Mutex::new(BTreeMap::new()),
            questions: Mutex::new(BTreeMap::new()),
            next_category_id: Mutex::new(1),
            next_question_id: Mutex::new(1),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let categories = self.categories.lock().unwrap();
        Ok(categories.values().cloned().collect())
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let categories = self.categories.lock().unwrap();
        Ok(categories.get(&id).cloned())
    }

    async fn create_category(&self, kind: &str) -> Result<i64> {
        let mut next_id = self.next_category_id.lock().unwrap();
        let id = *next_id;
        *next_id += 1;

        let mut categories = self.categories.lock().unwrap();
        categories.insert(
            id,
            Category {
                id,
                kind: kind.to_string(),
            },
        );

        debug!("Created category {} with id {}", kind, id);
        Ok(id)
    }

    async fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>> {
        let questions = self.questions.lock().unwrap();
        Ok(questions
            .values()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect())
    }

    async fn count_questions(&self, filter: &QuestionFilter) -> Result<usize> {
        let questions = self.questions.lock().unwrap();
        Ok(questions.values().filter(|q| filter.matches(q)).count())
    }

    async fn get_question(&self, id: i64) -> Result<Option<Question>> {
        let questions = self.questions.lock().unwrap();
        Ok(questions.get(&id).cloned())
    }

    async fn create_question(&self, new: &NewQuestion) -> Result<i64> {
        // Mirror the SQLite NOT NULL constraints on every column.
        let question = Question {
            id: 0,
            question: new.question.clone().ok_or_else(|| ApiError::Database {
                message: "NOT NULL constraint failed: questions.question".to_string(),
            })?,
            answer: new.answer.clone().ok_or_else(|| ApiError::Database {
                message: "NOT NULL constraint failed: questions.answer".to_string(),
            })?,
            category: new.category.ok_or_else(|| ApiError::Database {
                message: "NOT NULL constraint failed: questions.category".to_string(),
            })?,
            difficulty: new.difficulty.ok_or_else(|| ApiError::Database {
                message: "NOT NULL constraint failed: questions.difficulty".to_string(),
            })?,
        };

        let mut next_id = self.next_question_id.lock().unwrap();
        let id = *next_id;
        *next_id += 1;

        let mut questions = self.questions.lock().unwrap();
        questions.insert(id, Question { id, ..question });

        debug!("Created question with id {}", id);
        Ok(id)
    }

    async fn delete_question(&self, id: i64) -> Result<()> {
        let mut questions = self.questions.lock().unwrap();
        if questions.remove(&id).is_none() {
            return Err(ApiError::Database {
                message: format!("No question with id {id}"),
            });
        }
        debug!("Deleted question with id {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_question(text: &str, category: i64) -> NewQuestion {
        NewQuestion {
            question: Some(text.to_string()),
            answer: Some("answer".to_string()),
            category: Some(category),
            difficulty: Some(1),
        }
    }

    #[tokio::test]
    async fn test_create_and_list_ordered_by_id() {
        let storage = InMemoryStorage::new();
        let first = storage
            .create_question(&new_question("first", 1))
            .await
            .unwrap();
        let second = storage
            .create_question(&new_question("second", 2))
            .await
            .unwrap();
        assert!(second > first);

        let listed = storage.list_questions(&QuestionFilter::All).await.unwrap();
        let ids: Vec<i64> = listed.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[tokio::test]
    async fn test_missing_field_rejected() {
        let storage = InMemoryStorage::new();
        let partial = NewQuestion {
            question: Some("no answer".to_string()),
            ..NewQuestion::default()
        };
        assert!(storage.create_question(&partial).await.is_err());
        assert_eq!(
            storage.count_questions(&QuestionFilter::All).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_delete_removes_and_missing_fails() {
        let storage = InMemoryStorage::new();
        let id = storage
            .create_question(&new_question("ephemeral", 1))
            .await
            .unwrap();

        storage.delete_question(id).await.unwrap();
        assert!(storage.get_question(id).await.unwrap().is_none());
        assert!(storage.delete_question(id).await.is_err());
    }

    #[tokio::test]
    async fn test_ids_never_reused() {
        let storage = InMemoryStorage::new();
        let first = storage
            .create_question(&new_question("one", 1))
            .await
            .unwrap();
        storage.delete_question(first).await.unwrap();
        let second = storage
            .create_question(&new_question("two", 1))
            .await
            .unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_filters() {
        let storage = InMemoryStorage::new();
        storage
            .create_question(&new_question("What is the heaviest organ?", 1))
            .await
            .unwrap();
        storage
            .create_question(&new_question("Who painted the Mona Lisa?", 2))
            .await
            .unwrap();
        storage
            .create_question(&new_question("What boxer's original name is Cassius Clay?", 1))
            .await
            .unwrap();

        let by_category = storage
            .list_questions(&QuestionFilter::ByCategory(1))
            .await
            .unwrap();
        assert_eq!(by_category.len(), 2);

        let search = storage
            .list_questions(&QuestionFilter::TextContains("mona lisa".to_string()))
            .await
            .unwrap();
        assert_eq!(search.len(), 1);
        assert_eq!(search[0].category, 2);

        let candidates = storage
            .list_questions(&QuestionFilter::Excluding {
                category: Some(1),
                previous: vec![1],
            })
            .await
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, 3);

        let all_but_first = storage
            .count_questions(&QuestionFilter::Excluding {
                category: None,
                previous: vec![1],
            })
            .await
            .unwrap();
        assert_eq!(all_but_first, 2);
    }

    #[tokio::test]
    async fn test_categories_roundtrip() {
        let storage = InMemoryStorage::new();
        assert!(storage.list_categories().await.unwrap().is_empty());

        let science = storage.create_category("Science").await.unwrap();
        let art = storage.create_category("Art").await.unwrap();

        let listed = storage.list_categories().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, science);
        assert_eq!(listed[0].kind, "Science");

        assert_eq!(
            storage.get_category(art).await.unwrap().map(|c| c.kind),
            Some("Art".to_string())
        );
        assert!(storage.get_category(99).await.unwrap().is_none());
    }
}
