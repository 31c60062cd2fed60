pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod pagination;
pub mod seed;
pub mod server;
pub mod storage;

pub use config::Config;
pub use db::SqliteStorage;
pub use domain::{Category, NewQuestion, Question};
pub use error::{ApiError, Result};
pub use server::create_router;
pub use storage::{InMemoryStorage, QuestionFilter, Storage};
