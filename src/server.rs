use crate::compositing::{
    CompositeResult, Compositor, Image, LightingParams, Placement, Quad, StageTiming,
};
use crate::config::Config;
use crate::error::{GreenScreenError, Result};
use crate::{imaging, templates};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

/// Detection response
#[derive(Serialize)]
pub struct DetectResponse {
    pub corners: [[f32; 2]; 4],
    pub image: String,
    pub width: u32,
    pub height: u32,
    pub preview_scale: f32,
}

/// Preview response
#[derive(Serialize)]
pub struct PreviewResponse {
    pub image: String,
    pub processing_time_ms: u64,
    pub stages: Vec<StageTiming>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub max_file_size_bytes: usize,
    pub preview_width: u32,
    pub hue_range: [u8; 2],
    pub sat_min: u8,
    pub val_min: u8,
}

/// Build the application router
pub fn router(config: Config) -> Router {
    let max_file_size = config.max_file_size;
    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .route("/api/templates", get(handle_templates))
        .route("/api/detect", post(handle_detect))
        .route("/api/preview", post(handle_preview))
        .route("/api/process-one", post(handle_process_one))
        // Two images per request, plus form fields
        .layer(DefaultBodyLimit::max(max_file_size.saturating_mul(2)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let app = router(config);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Uploaded files and text fields of one multipart request
#[derive(Default)]
struct UploadForm {
    files: HashMap<String, (Option<String>, Bytes)>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart, max_file_size: usize) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            GreenScreenError::InvalidRequest(format!("Failed to parse multipart: {}", e))
        })? {
            let name = field.name().unwrap_or_default().to_string();

            match name.as_str() {
                "base" | "screenshot" => {
                    let file_name = field.file_name().map(|s| s.to_string());
                    let data = field.bytes().await.map_err(|e| {
                        GreenScreenError::InvalidRequest(format!("Failed to read {}: {}", name, e))
                    })?;
                    if data.len() > max_file_size {
                        return Err(GreenScreenError::ImageTooLarge {
                            size: data.len(),
                            max: max_file_size,
                        });
                    }
                    form.files.insert(name, (file_name, data));
                }
                _ => {
                    let value = field.text().await.map_err(|e| {
                        GreenScreenError::InvalidRequest(format!("Invalid field {}: {}", name, e))
                    })?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    fn image(&self, name: &'static str) -> Result<Image> {
        let (_, data) = self
            .files
            .get(name)
            .ok_or(GreenScreenError::MissingFile(name))?;
        imaging::decode(data)
    }

    fn file_name(&self, name: &str) -> Option<&str> {
        self.files.get(name).and_then(|(file_name, _)| file_name.as_deref())
    }

    fn corners(&self) -> Result<Option<Quad>> {
        self.fields
            .get("corners")
            .filter(|text| !text.trim().is_empty())
            .map(|text| imaging::parse_corners(text))
            .transpose()
    }

    fn number(&self, name: &str) -> Result<f32> {
        match self.fields.get(name).map(|s| s.trim()) {
            None | Some("") => Ok(0.0),
            Some(text) => text.parse::<f32>().map_err(|_| {
                GreenScreenError::InvalidRequest(format!("{} must be a number, got {:?}", name, text))
            }),
        }
    }

    fn lighting(&self) -> Result<LightingParams> {
        let blur_radius = match self.fields.get("blur_radius").map(|s| s.trim()) {
            None | Some("") => 0,
            Some(text) => text.parse::<u32>().map_err(|_| {
                GreenScreenError::InvalidRequest(format!(
                    "blur_radius must be a non-negative integer, got {:?}",
                    text
                ))
            })?,
        };

        let params = LightingParams {
            brightness: self.number("brightness")?,
            contrast: self.number("contrast")?,
            temperature: self.number("temperature")?,
            saturation: self.number("saturation")?,
            blur_radius,
        };
        params.validate()?;
        Ok(params)
    }
}

async fn blocking<T, F>(task: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| GreenScreenError::Internal(format!("Worker task failed: {}", e)))?
}

/// Handle corner detection requests
async fn handle_detect(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<DetectResponse>> {
    let form = UploadForm::read(multipart, state.config.max_file_size).await?;
    let base = form.image("base")?;
    let config = state.config.clone();

    let response = blocking(move || {
        let placement = Placement::detect(&base, &config.threshold)?;
        let (preview, scale) = imaging::resize_for_preview(&base, config.preview_width);

        Ok(DetectResponse {
            corners: placement.corners().to_pairs(),
            image: STANDARD.encode(imaging::encode_jpeg(&preview)?),
            width: base.width(),
            height: base.height(),
            preview_scale: scale,
        })
    })
    .await?;

    tracing::info!("Detected corners {:?}", response.corners);
    Ok(Json(response))
}

/// Composite the uploaded pair at full resolution
async fn composite_form(state: &AppState, form: UploadForm) -> Result<CompositeResult> {
    let base = form.image("base")?;
    let screenshot = form.image("screenshot")?;
    let corners = form.corners()?;
    let params = form.lighting()?;
    let threshold = state.config.threshold;

    let result = blocking(move || {
        let placement = Placement::resolve(&base, &threshold, corners.as_ref())?;
        Compositor::new(params).apply(&placement, &base, &screenshot)
    })
    .await?;

    tracing::info!("Composite completed in {}ms", result.total_time_ms);
    Ok(result)
}

/// Handle preview requests
async fn handle_preview(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PreviewResponse>> {
    let start = Instant::now();
    let form = UploadForm::read(multipart, state.config.max_file_size).await?;
    let result = composite_form(&state, form).await?;

    let preview_width = state.config.preview_width;
    let CompositeResult { image, stages, .. } = result;
    let encoded = blocking(move || {
        let (preview, _) = imaging::resize_for_preview(&image, preview_width);
        imaging::encode_jpeg(&preview).map(|bytes| STANDARD.encode(bytes))
    })
    .await?;

    Ok(Json(PreviewResponse {
        image: encoded,
        processing_time_ms: start.elapsed().as_millis() as u64,
        stages,
    }))
}

/// Handle full-resolution single composites, returned as a PNG download
async fn handle_process_one(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response> {
    let form = UploadForm::read(multipart, state.config.max_file_size).await?;
    let stem = imaging::sanitize_file_stem(form.file_name("screenshot").unwrap_or("screenshot"));
    let result = composite_form(&state, form).await?;

    let png = blocking(move || imaging::encode_png(&result.image)).await?;
    let disposition = format!("attachment; filename=\"{}_composite.png\"", stem);

    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        png,
    )
        .into_response())
}

/// Handle template catalog requests
async fn handle_templates(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let path = state.config.templates_path.clone().ok_or_else(|| {
        GreenScreenError::TemplatesUnavailable("no template catalog configured".to_string())
    })?;
    let catalog = blocking(move || templates::load(&path)).await?;
    Ok(Json(catalog))
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    let threshold = state.config.threshold;
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        max_file_size_bytes: state.config.max_file_size,
        preview_width: state.config.preview_width,
        hue_range: [threshold.hue_low, threshold.hue_high],
        sat_min: threshold.sat_min,
        val_min: threshold.val_min,
    })
}
