use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::collections::HashMap;

use crate::config::get_config;
use crate::dto::admin_dto::ExportQuery;
use crate::error::{Error, Result};
use crate::services::export_service::{ExportRow, ExportService};
use crate::AppState;

async fn read_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>, Option<String>)> {
    let mut filename = String::new();
    let mut data: Vec<u8> = Vec::new();
    let mut default_block: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(Error::Multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                filename = field.file_name().unwrap_or("import.csv").to_string();
                data = field.bytes().await.map_err(Error::Multipart)?.to_vec();
            }
            "default_block" => {
                let text = field.text().await.map_err(Error::Multipart)?;
                if !text.trim().is_empty() {
                    default_block = Some(text.trim().to_string());
                }
            }
            _ => {}
        }
    }

    if data.is_empty() {
        return Err(Error::BadRequest("No file uploaded".to_string()));
    }

    Ok((filename, data, default_block))
}

/// Upload a spreadsheet of questions into the bank. Rows are upserted
/// by question text; failures are reported per row without aborting the
/// batch.
#[axum::debug_handler]
pub async fn import_questions(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let (filename, data, default_block) = read_upload(multipart).await?;
    let default_block = default_block.or_else(|| get_config().default_import_block.clone());

    let outcome = state
        .import_service
        .import_questions(&filename, &data, default_block.as_deref())
        .await?;

    Ok(Json(outcome))
}

/// Upload a spreadsheet as a brand-new test named after the file.
#[axum::debug_handler]
pub async fn import_test(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let (filename, data, _) = read_upload(multipart).await?;

    let report = state.import_service.import_test(&filename, &data).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// Download a test's questions as XLSX (default) or CSV, in the column
/// order the importers accept.
#[axum::debug_handler]
pub async fn export_test(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse> {
    let test = state.test_service.get_test(id).await?;
    let questions = state.test_service.questions_of_test(id).await?;

    let block_names: HashMap<i64, String> = state
        .bank_service
        .list_blocks()
        .await?
        .into_iter()
        .map(|b| (b.id, b.name))
        .collect();

    let rows: Vec<ExportRow> = questions
        .iter()
        .map(|q| ExportRow {
            block: q
                .block_id
                .and_then(|id| block_names.get(&id).cloned())
                .unwrap_or_default(),
            kind: q.kind.clone(),
            points: q.points,
            question: q.question.clone(),
            answer: q.answer.clone(),
        })
        .collect();

    let safe_name = test.name.replace(' ', "_");
    let (buffer, content_type, filename) = match query.format.as_deref() {
        Some("csv") => (
            ExportService::test_to_csv(&rows)?,
            "text/csv",
            format!("{}.csv", safe_name),
        ),
        _ => (
            ExportService::test_to_xlsx(&test, &rows)?,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            format!("{}.xlsx", safe_name),
        ),
    };
    let disposition = format!("attachment; filename=\"{}\"", filename);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}
