//! HTTP inbound adapter.
//!
//! - `POST /upload-video` runs a highlight job on the uploaded video and
//!   answers with the zip archive.
//! - `GET /` reports service identity.
//! - `GET /static/...` serves produced clips and archives.

pub mod intake;

use crate::application::workspace::new_job_id;
use crate::application::{JobRunner, WorkspaceRetention};
use crate::domain::clips::ARCHIVE_NAME;
use crate::domain::{ArchiveResult, HighlightError};
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use intake::{path_is_valid, sanitize_file_name, stream_to_file, IntakeDir};
use serde_json::json;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::io::ReaderStream;
use tower_http::services::ServeDir;
use tracing::info;

pub const HIGHLIGHT_COUNT_HEADER: &str = "x-highlight-count";

pub struct AppState {
    pub runner: Arc<dyn JobRunner>,
    pub upload_dir: PathBuf,
    pub workspaces: WorkspaceRetention,
    pub jobs: Arc<Semaphore>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(state.workspaces.root());

    Router::new()
        .route("/", get(root))
        .route("/upload-video", post(upload_video))
        .route("/upload-video/", post(upload_video))
        .nest_service("/static", static_files)
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Welcome to the Highlights Generator API",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn status_for(err: &HighlightError) -> StatusCode {
    match err {
        HighlightError::Input(_) => StatusCode::BAD_REQUEST,
        HighlightError::Processing(_) | HighlightError::Encoding(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

// Stores the first file field of the form, runs the job and streams back the archive.
async fn upload_video(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, (StatusCode, String)> {
    let job_id = new_job_id();

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?
    {
        let file_name = match field.file_name() {
            Some(name) => sanitize_file_name(name),
            None => continue,
        };
        if !path_is_valid(Path::new(&file_name)) {
            return Err((StatusCode::BAD_REQUEST, "Invalid file name".to_owned()));
        }

        let intake = IntakeDir::create(state.upload_dir.join(&job_id))
            .await
            .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
        let path = intake.path().join(&file_name);
        info!("Job {}: saving upload to {:?}", job_id, path);
        stream_to_file(&path, field).await?;
        upload = Some((intake, path));
        break;
    }

    let Some((intake, source)) = upload else {
        return Err((StatusCode::BAD_REQUEST, "No video file provided".to_owned()));
    };

    let (archive, file) = run_job(state, job_id, intake, source).await?;
    let body = Body::from_stream(ReaderStream::new(tokio::fs::File::from_std(file)));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", ARCHIVE_NAME),
        )
        .header(HIGHLIGHT_COUNT_HEADER, archive.clip_count)
        .body(body)
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
}

/// Run a job on the blocking pool. The job slot and the intake directory
/// belong to the blocking task, so they are only released once the job
/// itself ends, even when the request is dropped first. The archive is
/// opened before the workspace can be pruned.
async fn run_job(
    state: Arc<AppState>,
    job_id: String,
    intake: IntakeDir,
    source: PathBuf,
) -> Result<(ArchiveResult, File), (StatusCode, String)> {
    let permit = state
        .jobs
        .clone()
        .acquire_owned()
        .await
        .map_err(|err| (StatusCode::SERVICE_UNAVAILABLE, err.to_string()))?;

    tokio::task::spawn_blocking(move || {
        let _permit = permit;
        let _intake = intake;

        let job = state.workspaces.open(&job_id).map_err(|err| {
            HighlightError::encoding(format!("Cannot create job directory: {}", err))
        })?;
        let archive = state.runner.process(&source, &job.workspace)?;
        let file = File::open(&archive.archive_path).map_err(|err| {
            HighlightError::encoding(format!("Cannot read archive: {}", err))
        })?;
        Ok::<_, HighlightError>((archive, file))
    })
    .await
    .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
    .map_err(|err| (status_for(&err), format!("An error occurred: {}", err)))
}
