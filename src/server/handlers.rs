//! Axum handlers shared by every transport adapter.

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use tracing::{debug, warn};

use crate::advisor::{Advisor, Reply};

/// Returned when a crop request body exceeds the configured cap
pub const BODY_TOO_LARGE_MESSAGE: &str = "Request body too large";

/// POST crop recommendation
pub async fn crop_recommendation(
    State(advisor): State<Advisor>,
    body: Result<Bytes, BytesRejection>,
) -> Reply {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("Crop request body rejected: {}", rejection);
            let status = rejection.status();
            let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
                BODY_TOO_LARGE_MESSAGE.to_string()
            } else {
                rejection.body_text()
            };
            return Reply::error(status, message);
        }
    };

    match Advisor::parse_conditions(&body) {
        Ok(conditions) => advisor.recommend_crops(conditions).await,
        Err(err) => Reply::error(err.status(), err.to_string()),
    }
}

/// POST disease prediction (multipart, `image` field)
pub async fn disease_prediction(
    State(advisor): State<Advisor>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Reply {
    let image = match multipart {
        Ok(mut multipart) => {
            match crate::upload::read_image(&mut multipart, advisor.config().max_image_bytes).await
            {
                Ok(image) => image,
                Err(err) => {
                    warn!("Upload rejected: {}", err);
                    return Reply::error(err.status(), err.to_string());
                }
            }
        }
        // Not a multipart request, so there is no file
        Err(rejection) => {
            debug!("Disease request without multipart body: {}", rejection);
            None
        }
    };

    advisor.predict_disease(image).await
}

/// Liveness check (non-advisory)
pub async fn health_endpoint(State(advisor): State<Advisor>) -> Json<Value> {
    Json(serde_json::json!({
        "healthy": true,
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "textModel": advisor.model().text_model(),
        "visionModel": advisor.model().vision_model(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
