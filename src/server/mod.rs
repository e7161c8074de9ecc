//! HTTP transport adapters.
//!
//! The same [`Advisor`](crate::advisor::Advisor) is exposed two ways:
//!
//! - [`Standalone`]: one server with every route under `/api/...` plus
//!   `/health`.
//! - [`Function`]: a single advisory function mounted at `/`, the shape a
//!   per-function serverless deployment expects.
//!
//! ```ignore
//! let advisor = Advisor::new(Arc::new(gemini), Arc::new(config));
//! let app = Standalone.router(advisor);
//! ```

mod handlers;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, MethodRouter};
use axum::Router;
use std::fmt;
use std::str::FromStr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

use crate::advisor::Advisor;
use crate::upload::MULTIPART_OVERHEAD_BYTES;

pub use handlers::health_endpoint;

/// Binds the advisory logic to one HTTP layout
pub trait TransportAdapter {
    /// Short name used in logs
    fn name(&self) -> String;

    /// Build the router for this layout
    fn router(&self, advisor: Advisor) -> Router;
}

/// Single server exposing both endpoints
#[derive(Debug, Clone, Copy, Default)]
pub struct Standalone;

impl TransportAdapter for Standalone {
    fn name(&self) -> String {
        "standalone".to_string()
    }

    fn router(&self, advisor: Advisor) -> Router {
        let max_json = advisor.config().max_json_body_bytes;
        let max_image = advisor.config().max_image_bytes;
        Router::new()
            .route("/api/crop-recommendation", crop_route(max_json))
            .route("/api/disease-prediction", disease_route(max_image))
            .route("/health", get(health_endpoint))
            .with_state(advisor)
            .layer(cors_layer())
    }
}

/// Advisory functions deployable on their own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionName {
    CropRecommendation,
    DiseasePrediction,
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionName::CropRecommendation => write!(f, "crop-recommendation"),
            FunctionName::DiseasePrediction => write!(f, "disease-prediction"),
        }
    }
}

impl FromStr for FunctionName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crop-recommendation" | "cropRecommendation" => Ok(FunctionName::CropRecommendation),
            "disease-prediction" | "diseasePrediction" => Ok(FunctionName::DiseasePrediction),
            other => Err(format!(
                "Unknown function '{}', expected crop-recommendation or disease-prediction",
                other
            )),
        }
    }
}

/// One function served at `/`
#[derive(Debug, Clone, Copy)]
pub struct Function(pub FunctionName);

impl TransportAdapter for Function {
    fn name(&self) -> String {
        format!("function:{}", self.0)
    }

    fn router(&self, advisor: Advisor) -> Router {
        let route = match self.0 {
            FunctionName::CropRecommendation => crop_route(advisor.config().max_json_body_bytes),
            FunctionName::DiseasePrediction => disease_route(advisor.config().max_image_bytes),
        };
        Router::new()
            .route("/", route)
            .with_state(advisor)
            .layer(cors_layer())
    }
}

fn crop_route(max_body: usize) -> MethodRouter<Advisor> {
    post(handlers::crop_recommendation).layer(RequestBodyLimitLayer::new(max_body))
}

fn disease_route(max_image: usize) -> MethodRouter<Advisor> {
    post(handlers::disease_prediction)
        .layer(DefaultBodyLimit::max(max_image + MULTIPART_OVERHEAD_BYTES))
}

/// Any origin, method and header
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
