//! Extraction routes
//!
//! Endpoints:
//! - POST /upload - upload a PDF, extract its text, persist the record
//! - GET /history - list extraction records
//! - GET /history/:id - fetch one record
//! - DELETE /history/:id - delete one record

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::db::{Extraction, ExtractionRepository, NewExtraction};
use crate::error::{AppError, Result};
use crate::pdf::{render_pdf_to_images, RenderOptions};
use crate::state::AppState;
use crate::vision::{BatchExtractor, GeminiClient};

/// Uploads can be large scanned documents; the axum default (2 MB) is far
/// too small.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Create the extraction router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_pdf))
        .route("/history", get(read_history))
        .route("/history/:id", get(read_extraction).delete(delete_extraction))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// POST /upload
///
/// Accepts a multipart `file` field containing a PDF, renders every page,
/// extracts text via Gemini Vision, and persists the result.
async fn upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Extraction>> {
    let start = Instant::now();

    let upload = read_file_field(&mut multipart).await?;

    if upload.content_type.as_deref() != Some("application/pdf") {
        return Err(AppError::Validation(
            "Invalid file type. Only PDF allowed.".to_string(),
        ));
    }

    let file_size = upload.data.len() as i64;
    tracing::info!(
        filename = %upload.filename,
        file_size,
        "Started processing upload"
    );

    let settings = state.settings().read().await.clone();

    let render_options = RenderOptions {
        dpi: settings.render_dpi,
        debug_dir: settings.debug_image_dir.as_ref().map(Into::into),
    };
    let images = render_pdf_to_images(upload.data, render_options).await?;
    let page_count = images.len();
    tracing::info!(page_count, "PDF rendered, sending to Gemini Vision");

    // Fails fast on a missing credential before any call is issued
    let client = GeminiClient::new(&settings.gemini_api_key, &settings.gemini_model)?;
    let extractor = BatchExtractor::new(
        Arc::new(client),
        settings.batch_size,
        settings.batch_delay,
    );

    let output = extractor.extract(&images).await?;

    if !output.skipped.is_empty() {
        tracing::warn!(
            filename = %upload.filename,
            skipped = ?output.skipped,
            "Extraction completed with skipped batches"
        );
    }

    let processing_time = start.elapsed().as_secs_f64();
    tracing::info!(
        chars = output.text.len(),
        processing_time,
        "Extraction finished, saving record"
    );

    let record = ExtractionRepository::new(state.db())
        .create(&NewExtraction {
            filename: upload.filename,
            file_size,
            extracted_text: output.text,
            page_count: Some(page_count as i64),
            processing_time: Some(processing_time),
        })
        .await?;

    Ok(Json(record))
}

struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    data: Vec<u8>,
}

/// Pull the `file` field out of the multipart body.
async fn read_file_field(multipart: &mut Multipart) -> Result<UploadedFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .unwrap_or("upload.pdf")
            .to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?
            .to_vec();

        return Ok(UploadedFile {
            filename,
            content_type,
            data,
        });
    }

    Err(AppError::Validation("Missing 'file' field".to_string()))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    100
}

/// GET /history
async fn read_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Extraction>>> {
    let extractions = ExtractionRepository::new(state.db())
        .list(query.skip, query.limit)
        .await?;

    Ok(Json(extractions))
}

/// GET /history/:id
async fn read_extraction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Extraction>> {
    let extraction = ExtractionRepository::new(state.db())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Extraction".to_string()))?;

    Ok(Json(extraction))
}

/// DELETE /history/:id
async fn delete_extraction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let deleted = ExtractionRepository::new(state.db()).delete(id).await?;

    if !deleted {
        return Err(AppError::NotFound("Extraction".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
