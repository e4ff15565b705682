use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::dto::admin_dto::CreateTagPayload;
use crate::error::{Error, Result};
use crate::AppState;

#[axum::debug_handler]
pub async fn list_blocks(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let blocks = state.bank_service.list_blocks().await?;
    Ok(Json(blocks))
}

#[axum::debug_handler]
pub async fn create_block(
    State(state): State<AppState>,
    Json(payload): Json<CreateTagPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let block = state.bank_service.get_or_create_block(&payload.name).await?;
    Ok((StatusCode::CREATED, Json(block)))
}

#[axum::debug_handler]
pub async fn delete_block(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    if state.bank_service.delete_block(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound("Block not found".to_string()))
    }
}

#[axum::debug_handler]
pub async fn list_disciplines(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let disciplines = state.bank_service.list_disciplines().await?;
    Ok(Json(disciplines))
}

#[axum::debug_handler]
pub async fn create_discipline(
    State(state): State<AppState>,
    Json(payload): Json<CreateTagPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let discipline = state
        .bank_service
        .get_or_create_discipline(&payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(discipline)))
}

#[axum::debug_handler]
pub async fn delete_discipline(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    if state.bank_service.delete_discipline(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound("Discipline not found".to_string()))
    }
}

#[axum::debug_handler]
pub async fn list_competences(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let competences = state.bank_service.list_competences().await?;
    Ok(Json(competences))
}

#[axum::debug_handler]
pub async fn create_competence(
    State(state): State<AppState>,
    Json(payload): Json<CreateTagPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let competence = state
        .bank_service
        .get_or_create_competence(&payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(competence)))
}

#[axum::debug_handler]
pub async fn delete_competence(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    if state.bank_service.delete_competence(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound("Competence not found".to_string()))
    }
}
