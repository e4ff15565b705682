use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::dto::admin_dto::{ResultListQuery, UpdateResultPayload};
use crate::error::{Error, Result};
use crate::AppState;

#[axum::debug_handler]
pub async fn list_results(
    State(state): State<AppState>,
    Query(query): Query<ResultListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.result_service.list_results(&query).await?;
    Ok(Json(page))
}

#[axum::debug_handler]
pub async fn get_result(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let result = state.result_service.get_result(id).await?;
    Ok(Json(result))
}

/// Admin edit of a stored result. The derived scores are recomputed
/// from the (possibly edited) details and open score on every save.
#[axum::debug_handler]
pub async fn update_result(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateResultPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let result = state.result_service.update_result(id, payload).await?;
    Ok(Json(result))
}

#[axum::debug_handler]
pub async fn delete_result(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    if state.result_service.delete_result(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound("Result not found".to_string()))
    }
}
