use crate::domain::{Category, NewQuestion, Question};
use crate::error::{ApiError, Result};
use crate::storage::{QuestionFilter, Storage};
use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

const QUESTION_COLUMNS: &str = "id, question, answer, category, difficulty";

/// SQLite-backed storage. The connection lives behind a mutex, so store
/// access is serialized per process.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Opening trivia database at {}", path.as_ref().display());
        let conn = Connection::open(path).map_err(|e| ApiError::Database {
            message: format!("Failed to open database: {e}"),
        })?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| ApiError::Database {
            message: format!("Failed to open in-memory database: {e}"),
        })?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Applies the embedded schema migration. Idempotent.
    pub fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");
        let migration_sql = include_str!("../migrations/001_create_categories_and_questions.sql");

        let conn = self.conn.lock().unwrap();
        conn.execute_batch(migration_sql)
            .map_err(|e| ApiError::Database {
                message: format!("Failed to run migrations: {e}"),
            })?;

        info!("Database migrations completed successfully");
        Ok(())
    }
}

/// Renders a filter as a WHERE clause plus its positional parameters.
/// Both listing and counting go through this, so the predicates never
/// diverge.
fn filter_sql(filter: &QuestionFilter) -> (String, Vec<Value>) {
    match filter {
        QuestionFilter::All => (String::new(), Vec::new()),
        QuestionFilter::ByCategory(category) => (
            " WHERE category = ?1".to_string(),
            vec![Value::Integer(*category)],
        ),
        QuestionFilter::Excluding { category, previous } => {
            let mut clauses = Vec::new();
            let mut values = Vec::new();
            if let Some(category) = category {
                values.push(Value::Integer(*category));
                clauses.push(format!("category = ?{}", values.len()));
            }
            if !previous.is_empty() {
                let placeholders: Vec<String> = previous
                    .iter()
                    .map(|id| {
                        values.push(Value::Integer(*id));
                        format!("?{}", values.len())
                    })
                    .collect();
                clauses.push(format!("id NOT IN ({})", placeholders.join(", ")));
            }
            if clauses.is_empty() {
                (String::new(), values)
            } else {
                (format!(" WHERE {}", clauses.join(" AND ")), values)
            }
        }
        QuestionFilter::TextContains(term) => (
            " WHERE LOWER(question) LIKE '%' || LOWER(?1) || '%'".to_string(),
            vec![Value::Text(term.clone())],
        ),
    }
}

fn row_to_question(row: &rusqlite::Row<'_>) -> rusqlite::Result<Question> {
    Ok(Question {
        id: row.get(0)?,
        question: row.get(1)?,
        answer: row.get(2)?,
        category: row.get(3)?,
        difficulty: row.get(4)?,
    })
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id, type FROM categories ORDER BY id ASC")
            .map_err(|e| ApiError::Database {
                message: format!("Failed to prepare category listing: {e}"),
            })?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    kind: row.get(1)?,
                })
            })
            .map_err(|e| ApiError::Database {
                message: format!("Failed to query categories: {e}"),
            })?;

        let mut categories = Vec::new();
        for row in rows {
            categories.push(row.map_err(|e| ApiError::Database {
                message: format!("Failed to read category row: {e}"),
            })?);
        }
        Ok(categories)
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, type FROM categories WHERE id = ?1",
            params![id],
            |row| {
                Ok(Category {
                    id: row.get(0)?,
                    kind: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(|e| ApiError::Database {
            message: format!("Failed to query category: {e}"),
        })
    }

    async fn create_category(&self, kind: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO categories (type) VALUES (?1)",
            params![kind],
        )
        .map_err(|e| ApiError::Database {
            message: format!("Failed to insert category: {e}"),
        })?;
        let id = conn.last_insert_rowid();
        debug!("Created category {} with id {}", kind, id);
        Ok(id)
    }

    async fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>> {
        let (clause, values) = filter_sql(filter);
        let sql =
            format!("SELECT {QUESTION_COLUMNS} FROM questions{clause} ORDER BY id ASC");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql).map_err(|e| ApiError::Database {
            message: format!("Failed to prepare question listing: {e}"),
        })?;
        let rows = stmt
            .query_map(params_from_iter(values), row_to_question)
            .map_err(|e| ApiError::Database {
                message: format!("Failed to query questions: {e}"),
            })?;

        let mut questions = Vec::new();
        for row in rows {
            questions.push(row.map_err(|e| ApiError::Database {
                message: format!("Failed to read question row: {e}"),
            })?);
        }
        Ok(questions)
    }

    async fn count_questions(&self, filter: &QuestionFilter) -> Result<usize> {
        let (clause, values) = filter_sql(filter);
        let sql = format!("SELECT COUNT(*) FROM questions{clause}");

        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row(&sql, params_from_iter(values), |row| row.get(0))
            .map_err(|e| ApiError::Database {
                message: format!("Failed to count questions: {e}"),
            })?;
        Ok(count as usize)
    }

    async fn get_question(&self, id: i64) -> Result<Option<Question>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?1"),
            params![id],
            row_to_question,
        )
        .optional()
        .map_err(|e| ApiError::Database {
            message: format!("Failed to query question: {e}"),
        })
    }

    async fn create_question(&self, new: &NewQuestion) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        // Missing fields become NULL and fail the NOT NULL constraints.
        conn.execute(
            "INSERT INTO questions (question, answer, category, difficulty) VALUES (?1, ?2, ?3, ?4)",
            params![new.question, new.answer, new.category, new.difficulty],
        )
        .map_err(|e| ApiError::Database {
            message: format!("Failed to insert question: {e}"),
        })?;
        let id = conn.last_insert_rowid();
        debug!("Created question with id {}", id);
        Ok(id)
    }

    async fn delete_question(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let affected = conn
            .execute("DELETE FROM questions WHERE id = ?1", params![id])
            .map_err(|e| ApiError::Database {
                message: format!("Failed to delete question: {e}"),
            })?;
        if affected == 0 {
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

    fn storage() -> SqliteStorage {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage.run_migrations().unwrap();
        storage
    }

    fn new_question(text: &str, category: i64) -> NewQuestion {
        NewQuestion {
            question: Some(text.to_string()),
            answer: Some("answer".to_string()),
            category: Some(category),
            difficulty: Some(2),
        }
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let storage = storage();
        storage.run_migrations().unwrap();
    }

    #[tokio::test]
    async fn test_question_roundtrip() {
        let storage = storage();
        let id = storage
            .create_question(&new_question("What is the capital of France?", 3))
            .await
            .unwrap();

        let fetched = storage.get_question(id).await.unwrap().unwrap();
        assert_eq!(fetched.question, "What is the capital of France?");
        assert_eq!(fetched.category, 3);
        assert_eq!(fetched.difficulty, 2);

        storage.delete_question(id).await.unwrap();
        assert!(storage.get_question(id).await.unwrap().is_none());
        assert!(storage.delete_question(id).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_fields_violate_constraints() {
        let storage = storage();
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
    async fn test_unknown_category_value_accepted() {
        // No foreign key on questions.category: a bogus value inserts fine.
        let storage = storage();
        let id = storage
            .create_question(&new_question("orphaned", 999))
            .await
            .unwrap();
        assert_eq!(
            storage.get_question(id).await.unwrap().unwrap().category,
            999
        );
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let storage = storage();
        storage
            .create_question(&new_question("Whose autobiography is Anansi Boys?", 4))
            .await
            .unwrap();

        let hits = storage
            .list_questions(&QuestionFilter::TextContains("ANANSI".to_string()))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let misses = storage
            .list_questions(&QuestionFilter::TextContains("nonexistent".to_string()))
            .await
            .unwrap();
        assert!(misses.is_empty());
    }

    #[tokio::test]
    async fn test_excluding_filter() {
        let storage = storage();
        for i in 0..3 {
            storage
                .create_question(&new_question(&format!("q{i}"), 1))
                .await
                .unwrap();
        }
        storage
            .create_question(&new_question("other", 2))
            .await
            .unwrap();

        let candidates = storage
            .list_questions(&QuestionFilter::Excluding {
                category: Some(1),
                previous: vec![1, 2],
            })
            .await
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, 3);

        let unrestricted = storage
            .count_questions(&QuestionFilter::Excluding {
                category: None,
                previous: Vec::new(),
            })
            .await
            .unwrap();
        assert_eq!(unrestricted, 4);
    }

    #[tokio::test]
    async fn test_categories_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trivia.db");

        let storage = SqliteStorage::open(&path).unwrap();
        storage.run_migrations().unwrap();
        let id = storage.create_category("Geography").await.unwrap();
        drop(storage);

        let reopened = SqliteStorage::open(&path).unwrap();
        let listed = reopened.list_categories().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].kind, "Geography");
    }
}
