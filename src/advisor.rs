//! Transport-agnostic request handling for both advisory endpoints.
//!
//! Every outcome, success or failure, is turned into a [`Reply`] here so the
//! transport adapters only have to write it out.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AdvisoryError;
use crate::model::{GenerativeModel, InlineImage};
use crate::models::{ErrorBody, FarmingConditions};
use crate::normalizer::{fallback_recommendations, parse_model_output};
use crate::prompts::{build_crop_prompt, DISEASE_PROMPT};

/// Returned when the image field is absent
pub const NO_IMAGE_MESSAGE: &str = "No image file uploaded";

/// Returned for any disease prediction failure after the image was accepted
pub const DISEASE_FAILURE_MESSAGE: &str =
    "Unable to identify the plant at this time. Please try again.";

/// Status code plus JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Self {
        Self {
            status,
            body: serde_json::to_value(body).unwrap_or(Value::Null),
        }
    }

    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::json(status, &ErrorBody::new(message))
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Shared request handler. Cheap to clone.
#[derive(Clone)]
pub struct Advisor {
    model: Arc<dyn GenerativeModel>,
    config: Arc<Config>,
}

impl Advisor {
    pub fn new(model: Arc<dyn GenerativeModel>, config: Arc<Config>) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn model(&self) -> &dyn GenerativeModel {
        self.model.as_ref()
    }

    /// Parse a crop request body. An empty body counts as `{}`.
    pub fn parse_conditions(body: &[u8]) -> Result<FarmingConditions, AdvisoryError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(FarmingConditions::default());
        }
        serde_json::from_slice(body).map_err(|e| {
            warn!("Invalid crop request body: {}", e);
            AdvisoryError::InvalidRequest("Invalid JSON body".to_string())
        })
    }

    /// Crop recommendation: prompt, text-only model call, normalize.
    pub async fn recommend_crops(&self, conditions: FarmingConditions) -> Reply {
        let request_id = Uuid::new_v4();

        if self.config.require_all_fields {
            if let Some(field) = conditions.first_missing_field() {
                warn!("[{}] Crop request missing field {}", request_id, field);
                let err = AdvisoryError::MissingInput(format!("Missing required field: {}", field));
                return Reply::error(err.status(), err.to_string());
            }
        }

        let prompt = build_crop_prompt(&conditions, &self.config.translation);
        info!(
            "[{}] Crop recommendation for state={:?} district={:?} season={:?}",
            request_id, conditions.state, conditions.district, conditions.season
        );

        match self.run_crop_prompt(&prompt).await {
            Ok(value) => {
                info!("[{}] Crop recommendation succeeded", request_id);
                Reply::ok(value)
            }
            Err(err) => {
                error!("[{}] Error in crop recommendation: {}", request_id, err);
                Reply::json(err.status(), &fallback_recommendations(&err))
            }
        }
    }

    async fn run_crop_prompt(&self, prompt: &str) -> Result<Value, AdvisoryError> {
        let raw = self.model.generate(prompt, None).await?;
        parse_model_output(&raw)
    }

    /// Disease prediction: multimodal model call with the uploaded photo.
    pub async fn predict_disease(&self, image: Option<InlineImage>) -> Reply {
        let request_id = Uuid::new_v4();

        let Some(image) = image else {
            warn!("[{}] Disease prediction without image", request_id);
            let err = AdvisoryError::MissingInput(NO_IMAGE_MESSAGE.to_string());
            return Reply::error(err.status(), err.to_string());
        };

        info!(
            "[{}] Disease prediction for {} image of {} bytes",
            request_id,
            image.mime_type,
            image.data.len()
        );

        match self.run_disease_prompt(&image).await {
            Ok(value) => {
                info!("[{}] Disease prediction succeeded", request_id);
                Reply::ok(value)
            }
            Err(err) => {
                error!("[{}] Error in disease prediction: {}", request_id, err);
                Reply::error(err.status(), DISEASE_FAILURE_MESSAGE)
            }
        }
    }

    async fn run_disease_prompt(&self, image: &InlineImage) -> Result<Value, AdvisoryError> {
        let raw = self.model.generate(DISEASE_PROMPT, Some(image)).await?;
        parse_model_output(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FakeModel, ModelError};
    use crate::models::{DiseaseAnalysis, Recommendations};
    use crate::normalizer::{PARSE_FAILURE_CROPS, SERVICE_UNAVAILABLE_CROPS};

    fn advisor_with(model: Arc<FakeModel>, config: Config) -> Advisor {
        Advisor::new(model, Arc::new(config))
    }

    fn punjab() -> FarmingConditions {
        serde_json::from_value(serde_json::json!({
            "state": "Punjab",
            "district": "Ludhiana",
            "season": "kharif",
            "waterAvailability": "canal",
            "soilType": "loamy",
            "rainfall": "medium",
            "temperature": "warm",
            "previousCrop": "Wheat"
        }))
        .unwrap()
    }

    fn jpeg() -> InlineImage {
        InlineImage {
            mime_type: "image/jpeg".to_string(),
            data: vec![0xff, 0xd8, 0xff, 0xe0],
        }
    }

    const FOUR_CROPS: &str = r#"{"recommendations": [{"crop": "Rice (వరి)"}, {"crop": "Maize (మొక్కజొన్న)"}, {"crop": "Cotton (పత్తి)"}, {"crop": "Sugarcane (చెరకు)"}]}"#;

    #[tokio::test]
    async fn test_recommend_crops_success() {
        let model = Arc::new(FakeModel::replying(FOUR_CROPS));
        let advisor = advisor_with(model.clone(), Config::default());

        let reply = advisor.recommend_crops(punjab()).await;

        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, serde_json::from_str::<Value>(FOUR_CROPS).unwrap());
        let call = model.last_call().unwrap();
        assert!(call.image.is_none());
        for expected in ["Punjab", "Ludhiana", "kharif", "canal", "loamy", "medium", "warm", "Wheat"] {
            assert!(call.prompt.contains(expected));
        }
    }

    #[tokio::test]
    async fn test_recommend_crops_parse_failure() {
        let model = Arc::new(FakeModel::replying("not json"));
        let advisor = advisor_with(model, Config::default());

        let reply = advisor.recommend_crops(punjab()).await;

        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: Recommendations = serde_json::from_value(reply.body).unwrap();
        assert_eq!(body, Recommendations::from_crops(&PARSE_FAILURE_CROPS));
    }

    #[tokio::test]
    async fn test_recommend_crops_model_unavailable() {
        let model = Arc::new(FakeModel::failing(ModelError::Network(
            "connection refused".to_string(),
        )));
        let advisor = advisor_with(model, Config::default());

        let reply = advisor.recommend_crops(punjab()).await;

        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: Recommendations = serde_json::from_value(reply.body).unwrap();
        assert_eq!(body, Recommendations::from_crops(&SERVICE_UNAVAILABLE_CROPS));
    }

    #[tokio::test]
    async fn test_recommend_crops_permissive_missing_fields() {
        let model = Arc::new(FakeModel::replying(FOUR_CROPS));
        let advisor = advisor_with(model.clone(), Config::default());

        let reply = advisor.recommend_crops(FarmingConditions::default()).await;

        assert_eq!(reply.status, StatusCode::OK);
        assert!(model.last_call().unwrap().prompt.contains("\"state\": \"undefined\""));
    }

    #[tokio::test]
    async fn test_recommend_crops_strict_missing_field() {
        let model = Arc::new(FakeModel::replying(FOUR_CROPS));
        let config = Config {
            require_all_fields: true,
            ..Config::default()
        };
        let advisor = advisor_with(model.clone(), config);
        let conditions = FarmingConditions {
            soil_type: None,
            ..punjab()
        };

        let reply = advisor.recommend_crops(conditions).await;

        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            reply.body,
            serde_json::json!({"error": "Missing required field: soilType"})
        );
        assert_eq!(model.call_count(), 0);
    }

    #[test]
    fn test_parse_conditions() {
        assert_eq!(
            Advisor::parse_conditions(b"  ").unwrap(),
            FarmingConditions::default()
        );
        let conditions = Advisor::parse_conditions(br#"{"state": "Punjab"}"#).unwrap();
        assert_eq!(conditions.state.as_deref(), Some("Punjab"));
        let err = Advisor::parse_conditions(b"{state").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_predict_disease_missing_image() {
        let model = Arc::new(FakeModel::replying("{}"));
        let advisor = advisor_with(model.clone(), Config::default());

        let reply = advisor.predict_disease(None).await;

        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body, serde_json::json!({"error": "No image file uploaded"}));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_predict_disease_success() {
        let analysis = DiseaseAnalysis {
            crop_name: "Tomato - late blight".to_string(),
        };
        let fenced = format!("```json\n{}\n```", serde_json::to_string(&analysis).unwrap());
        let model = Arc::new(FakeModel::replying(&fenced));
        let advisor = advisor_with(model.clone(), Config::default());

        let reply = advisor.predict_disease(Some(jpeg())).await;

        assert_eq!(reply.status, StatusCode::OK);
        let parsed: DiseaseAnalysis = serde_json::from_value(reply.body).unwrap();
        assert_eq!(parsed, analysis);
        let call = model.last_call().unwrap();
        assert_eq!(call.prompt, DISEASE_PROMPT);
        assert_eq!(call.image, Some(jpeg()));
    }

    #[tokio::test]
    async fn test_predict_disease_failures_are_flat_errors() {
        for model in [
            FakeModel::replying("I think this is a tomato"),
            FakeModel::failing(ModelError::Timeout(30)),
        ] {
            let advisor = advisor_with(Arc::new(model), Config::default());
            let reply = advisor.predict_disease(Some(jpeg())).await;
            assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(reply.body, serde_json::json!({"error": DISEASE_FAILURE_MESSAGE}));
        }
    }
}
