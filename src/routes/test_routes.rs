use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use validator::Validate;

use crate::dto::admin_dto::{CreateTestPayload, SmartTestPayload, TestListQuery, UpdateTestPayload};
use crate::error::{Error, Result};
use crate::services::assembler_service::SmartTestSpec;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_tests(
    State(state): State<AppState>,
    Query(query): Query<TestListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.test_service.list_tests(&query).await?;
    Ok(Json(page))
}

#[axum::debug_handler]
pub async fn create_test(
    State(state): State<AppState>,
    Json(payload): Json<CreateTestPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let test = state.test_service.create_test(payload).await?;
    Ok((StatusCode::CREATED, Json(test)))
}

/// Test detail for the admin: the row itself, its block quotas and its
/// full question membership (answers included).
#[axum::debug_handler]
pub async fn get_test(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let test = state.test_service.get_test(id).await?;
    let blocks = state.test_service.block_quotas(id).await?;
    let questions = state.test_service.questions_of_test(id).await?;

    Ok(Json(json!({
        "test": test,
        "blocks": blocks,
        "questions": questions,
    })))
}

#[axum::debug_handler]
pub async fn update_test(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTestPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let test = state.test_service.update_test(id, payload).await?;
    Ok(Json(test))
}

#[axum::debug_handler]
pub async fn delete_test(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    if state.test_service.delete_test(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound("Test not found".to_string()))
    }
}

/// Smart test creation: uniform random sample over the tag-filtered
/// question pool.
#[axum::debug_handler]
pub async fn create_smart_test(
    State(state): State<AppState>,
    Json(payload): Json<SmartTestPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let spec = SmartTestSpec {
        name: payload.name,
        description: payload.description.unwrap_or_default(),
        timer_minutes: payload.timer_minutes.unwrap_or(30),
        access_code: payload.access_code.unwrap_or_default(),
        blocks: payload.blocks,
        disciplines: payload.disciplines,
        competences: payload.competences,
        count: payload.num_questions as usize,
    };

    let test = state.assembler_service.assemble(&spec).await?;
    Ok((StatusCode::CREATED, Json(test)))
}
