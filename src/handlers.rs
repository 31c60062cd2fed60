use crate::domain::NewQuestion;
use crate::error::{ApiError, Result};
use crate::pagination::{page_from_query, paginate};
use crate::storage::{QuestionFilter, Storage};
use axum::extract::{Path, Query};
use axum::{Extension, Json};
use rand::seq::SliceRandom;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::info;

type SharedStorage = Extension<Arc<dyn Storage>>;

/// Category id -> label mapping used by several responses. An empty
/// category table is a NotFound for the caller.
async fn categories_map(storage: &dyn Storage) -> Result<BTreeMap<i64, String>> {
    let categories = storage.list_categories().await?;
    if categories.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(categories.into_iter().map(|c| (c.id, c.kind)).collect())
}

/// Boundary coercion: client-supplied ids arrive as JSON numbers or numeric
/// strings; both become i64, anything else is rejected by the caller.
fn coerce_i64(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn page_of(params: &HashMap<String, String>) -> usize {
    page_from_query(params.get("page").map(String::as_str))
}

/// GET /categories
pub async fn get_categories(Extension(storage): SharedStorage) -> Result<Json<Value>> {
    let categories = categories_map(storage.as_ref()).await?;
    Ok(Json(json!({
        "success": true,
        "categories": categories,
    })))
}

/// GET /questions?page=N
pub async fn get_questions(
    Extension(storage): SharedStorage,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>> {
    let page = page_of(&params);
    let selection = storage.list_questions(&QuestionFilter::All).await?;
    let current_questions = paginate(page, &selection);
    if current_questions.is_empty() {
        return Err(ApiError::NotFound);
    }

    let total_questions = storage.count_questions(&QuestionFilter::All).await?;
    let categories = categories_map(storage.as_ref()).await?;
    Ok(Json(json!({
        "success": true,
        "questions": current_questions,
        "total_questions": total_questions,
        "categories": categories,
    })))
}

/// DELETE /questions/{id}?page=N
///
/// A missing id (or any store failure) surfaces as Unprocessable, not
/// NotFound.
pub async fn delete_question(
    Extension(storage): SharedStorage,
    Path(question_id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>> {
    delete_question_inner(storage.as_ref(), question_id, page_of(&params))
        .await
        .map_err(|_| ApiError::Unprocessable)
}

async fn delete_question_inner(
    storage: &dyn Storage,
    question_id: i64,
    page: usize,
) -> Result<Json<Value>> {
    if storage.get_question(question_id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    storage.delete_question(question_id).await?;
    info!("Deleted question {}", question_id);

    // Relist whatever remains; an empty page here is fine (no 404).
    let selection = storage.list_questions(&QuestionFilter::All).await?;
    let current_questions = paginate(page, &selection);
    let total_questions = storage.count_questions(&QuestionFilter::All).await?;
    let categories = categories_map(storage).await?;
    Ok(Json(json!({
        "success": true,
        "deleted": question_id,
        "questions": current_questions,
        "total_questions": total_questions,
        "categories": categories,
    })))
}

/// POST /questions
///
/// Two mutually exclusive modes keyed on `searchTerm`: substring search
/// when it is present and non-empty, creation otherwise. Any failure in
/// either mode is Unprocessable.
pub async fn post_questions(
    Extension(storage): SharedStorage,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    post_questions_inner(storage.as_ref(), &params, &body)
        .await
        .map_err(|_| ApiError::Unprocessable)
}

async fn post_questions_inner(
    storage: &dyn Storage,
    params: &HashMap<String, String>,
    body: &Value,
) -> Result<Json<Value>> {
    let search_term = body
        .get("searchTerm")
        .and_then(Value::as_str)
        .filter(|term| !term.is_empty());

    if let Some(term) = search_term {
        let selection = storage
            .list_questions(&QuestionFilter::TextContains(term.to_string()))
            .await?;
        let current_questions = paginate(page_of(params), &selection);
        // Zero matches is still a 200 with an empty list.
        return Ok(Json(json!({
            "success": true,
            "questions": current_questions,
            "total_questions": selection.len(),
        })));
    }

    let new_question = NewQuestion {
        question: body
            .get("question")
            .and_then(Value::as_str)
            .map(str::to_string),
        answer: body
            .get("answer")
            .and_then(Value::as_str)
            .map(str::to_string),
        category: coerce_i64(body.get("category")),
        difficulty: coerce_i64(body.get("difficulty")),
    };
    let created = storage.create_question(&new_question).await?;
    info!("Created question {}", created);
    Ok(Json(json!({
        "success": true,
        "created": created,
    })))
}

/// GET /categories/{id}/questions?page=N
pub async fn get_questions_by_category(
    Extension(storage): SharedStorage,
    Path(category_id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>> {
    let selection = storage
        .list_questions(&QuestionFilter::ByCategory(category_id))
        .await?;
    let current_questions = paginate(page_of(&params), &selection);
    if current_questions.is_empty() {
        return Err(ApiError::NotFound);
    }

    let category = storage
        .get_category(category_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    // total_questions is the count across ALL questions, not just this
    // category.
    let total_questions = storage.count_questions(&QuestionFilter::All).await?;
    Ok(Json(json!({
        "success": true,
        "questions": current_questions,
        "total_questions": total_questions,
        "current_category": category.kind,
    })))
}

/// POST /quizzes
///
/// Picks a random question the player has not seen. Category id 0 means
/// "all categories". Running out of candidates is a normal 200 with no
/// `question` field.
pub async fn post_quizzes(
    Extension(storage): SharedStorage,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    let previous = match body.get("previous_questions") {
        Some(value) if !value.is_null() => value,
        _ => return Err(ApiError::BadRequest),
    };
    let quiz_category = match body.get("quiz_category") {
        Some(value) if !value.is_null() => value,
        _ => return Err(ApiError::BadRequest),
    };

    play_quiz_inner(storage.as_ref(), previous, quiz_category)
        .await
        .map_err(|_| ApiError::Unprocessable)
}

async fn play_quiz_inner(
    storage: &dyn Storage,
    previous: &Value,
    quiz_category: &Value,
) -> Result<Json<Value>> {
    let previous: Vec<i64> = previous
        .as_array()
        .ok_or(ApiError::Unprocessable)?
        .iter()
        .map(|id| coerce_i64(Some(id)).ok_or(ApiError::Unprocessable))
        .collect::<Result<_>>()?;
    let category_id = coerce_i64(quiz_category.get("id")).ok_or(ApiError::Unprocessable)?;

    let filter = QuestionFilter::Excluding {
        category: (category_id != 0).then_some(category_id),
        previous,
    };
    let candidates = storage.list_questions(&filter).await?;

    match candidates.choose(&mut rand::thread_rng()) {
        Some(question) => Ok(Json(json!({
            "success": true,
            "question": question,
        }))),
        // Game over: every candidate has been played.
        None => Ok(Json(json!({
            "success": true,
        }))),
    }
}

/// Fallback for unmatched paths.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
