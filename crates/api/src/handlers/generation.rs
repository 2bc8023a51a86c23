//! Storefront generation endpoints: job submission, polling and swatch upload.

use std::collections::BTreeMap;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use stylist_core::catalog::validate_identifier;
use stylist_core::cut::{parse_cuts, Cut};
use stylist_core::error::CoreError;
use stylist_core::generation::{ImageResult, Quality};
use stylist_core::upload::{swatch_upload_key, validate_upload};
use stylist_db::models::generation_job::{CreateGenerationJob, GenerationJob};
use stylist_db::models::status::GenerationJobStatus;
use stylist_db::repositories::GenerationJobRepo;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Dimensions reported when a job stored no per-image metadata.
pub const DEFAULT_IMAGE_SIZE: u32 = 1024;

/// Request body for `POST /generate`.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub family_id: String,
    pub color_id: String,
    /// Defaults to both cuts when empty.
    #[serde(default)]
    pub cuts: Vec<String>,
    pub seed: Option<u32>,
    pub quality: Option<String>,
    /// Fabric swatch for the inpaint engine.
    pub swatch_url: Option<String>,
}

impl GenerateRequest {
    fn into_job(self) -> Result<CreateGenerationJob, CoreError> {
        validate_identifier("family_id", &self.family_id)?;
        validate_identifier("color_id", &self.color_id)?;
        let cuts = parse_cuts(&self.cuts)?;
        let quality = match self.quality.as_deref() {
            Some(q) => Quality::parse(q)?,
            None => Quality::default(),
        };
        let swatch_url = self
            .swatch_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        Ok(CreateGenerationJob {
            family_id: self.family_id,
            color_id: self.color_id,
            cuts,
            seed: self.seed,
            quality,
            swatch_url,
        })
    }
}

/// Body of `POST /generate` and `GET /jobs/{job_id}`.
#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub request_id: String,
    pub status: &'static str,
    pub images: Vec<ImageResult>,
    pub duration_ms: Option<i64>,
    pub meta: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct SwatchUploadResponse {
    pub swatch_url: String,
    pub filename: String,
    pub size_bytes: usize,
}

/// POST /generate
///
/// Queue a generation job and return immediately with its id.
pub async fn generate(
    State(state): State<AppState>,
    Json(input): Json<GenerateRequest>,
) -> AppResult<(StatusCode, Json<GenerationResponse>)> {
    let job = GenerationJobRepo::create(&state.pool, &input.into_job()?).await?;
    tracing::info!(
        job_id = %job.job_id,
        family_id = %job.family_id,
        color_id = %job.color_id,
        "Generation job queued",
    );

    let mut meta = BTreeMap::new();
    meta.insert(
        "message".to_string(),
        format!("Job created. Poll /jobs/{} for status.", job.job_id),
    );
    Ok((
        StatusCode::CREATED,
        Json(GenerationResponse {
            request_id: job.job_id.to_string(),
            status: GenerationJobStatus::Pending.name(),
            images: Vec::new(),
            duration_ms: None,
            meta,
        }),
    ))
}

/// GET /jobs/{job_id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<Json<GenerationResponse>> {
    let not_found = || {
        AppError::Core(CoreError::NotFoundByKey {
            entity: "Job",
            key: job_id.clone(),
        })
    };
    let id = Uuid::parse_str(&job_id).map_err(|_| not_found())?;
    let job = GenerationJobRepo::find_by_job_id(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(job_response(&job)))
}

/// Shape a job row as the polling response.
///
/// Completed jobs list one image per stored URL; the cut comes from the
/// job's cut list by position and the size from the worker's metadata.
pub fn job_response(job: &GenerationJob) -> GenerationResponse {
    let status = job.status();
    let mut images = Vec::new();
    let mut meta = BTreeMap::new();

    match status {
        Some(GenerationJobStatus::Completed) => {
            let cuts = job.cut_list();
            let stored = job.result_images();
            for (idx, url) in job.result_url_list().into_iter().enumerate() {
                let cut = cuts.get(idx).copied().unwrap_or(Cut::Recto);
                let (width, height, image_meta) = match stored.get(idx) {
                    Some(img) => (img.width, img.height, img.meta.clone()),
                    None => (DEFAULT_IMAGE_SIZE, DEFAULT_IMAGE_SIZE, serde_json::json!({})),
                };
                images.push(ImageResult {
                    cut,
                    url,
                    width,
                    height,
                    watermark: true,
                    meta: image_meta,
                });
            }
            if let Some(engine) = &job.engine {
                meta.insert("engine".to_string(), engine.clone());
            }
        }
        Some(GenerationJobStatus::Failed) => {
            if let Some(error) = &job.error_message {
                meta.insert("error".to_string(), error.clone());
            }
        }
        _ => {}
    }

    GenerationResponse {
        request_id: job.job_id.to_string(),
        status: job.status_name(),
        images,
        duration_ms: job.duration_ms(),
        meta,
    }
}

/// POST /upload-swatch
///
/// Accepts a multipart form with a `file` field (JPEG, PNG or WebP, at most
/// 5 MB) and stores it under `temp-uploads/`. The returned URL can be sent
/// as `swatch_url` to `POST /generate`.
pub async fn upload_swatch(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<SwatchUploadResponse>> {
    let mut upload: Option<(Option<String>, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        upload = Some((filename, content_type, data.to_vec()));
    }

    let (filename, content_type, data) =
        upload.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
    let size_bytes = data.len();
    validate_upload(content_type.as_deref(), size_bytes)?;

    let key = swatch_upload_key(filename.as_deref());
    let content_type = content_type.unwrap_or_else(|| "image/jpeg".to_string());
    let swatch_url = state.storage.save_bytes(data, &key, &content_type).await?;
    tracing::info!(key = %key, size_bytes, backend = state.storage.backend_name(), "Swatch uploaded");

    let filename = filename.unwrap_or_else(|| {
        key.rsplit('/').next().unwrap_or(key.as_str()).to_string()
    });
    Ok(Json(SwatchUploadResponse {
        swatch_url,
        filename,
        size_bytes,
    }))
}
