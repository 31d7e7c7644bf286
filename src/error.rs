use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GreenScreenError {
    #[error("Failed to decode image: {0}")]
    ImageDecodeFailure(String),

    #[error("No green screen region detected")]
    NoRegionFound,

    #[error("Green region too small (area={area:.1}, minimum={minimum})")]
    RegionTooSmall { area: f64, minimum: f64 },

    #[error("Invalid corner input: {0}")]
    InvalidCornerInput(String),

    #[error("Failed to encode image: {0}")]
    EncodeFailure(String),

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Missing file in request: {0}")]
    MissingFile(&'static str),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Template catalog unavailable: {0}")]
    TemplatesUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, GreenScreenError>;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl GreenScreenError {
    /// Stable machine-readable code reported alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            GreenScreenError::ImageDecodeFailure(_) => "IMAGE_DECODE_FAILURE",
            GreenScreenError::NoRegionFound => "NO_REGION_FOUND",
            GreenScreenError::RegionTooSmall { .. } => "REGION_TOO_SMALL",
            GreenScreenError::InvalidCornerInput(_) => "INVALID_CORNER_INPUT",
            GreenScreenError::EncodeFailure(_) => "ENCODE_FAILURE",
            GreenScreenError::ImageTooLarge { .. } => "IMAGE_TOO_LARGE",
            GreenScreenError::MissingFile(_) => "MISSING_FILE",
            GreenScreenError::InvalidRequest(_) => "INVALID_REQUEST",
            GreenScreenError::TemplatesUnavailable(_) => "TEMPLATES_UNAVAILABLE",
            GreenScreenError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            GreenScreenError::ImageDecodeFailure(_)
            | GreenScreenError::InvalidCornerInput(_)
            | GreenScreenError::MissingFile(_)
            | GreenScreenError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GreenScreenError::NoRegionFound | GreenScreenError::RegionTooSmall { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            GreenScreenError::ImageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GreenScreenError::TemplatesUnavailable(_) => StatusCode::NOT_FOUND,
            GreenScreenError::EncodeFailure(_) | GreenScreenError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GreenScreenError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
        });

        (status, body).into_response()
    }
}
