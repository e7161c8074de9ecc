//! Request and response types shared by the advisory endpoints.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Farming conditions submitted from the crop selection form.
///
/// Every field is optional on the wire. Values are free-form strings; the
/// server does not check them against the form's option lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmingConditions {
    #[serde(default, deserialize_with = "lenient_text")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub season: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub water_availability: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub soil_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub rainfall: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub temperature: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub previous_crop: Option<String>,
}

impl FarmingConditions {
    /// Wire names paired with their values, in prompt order.
    pub fn fields(&self) -> [(&'static str, Option<&str>); 8] {
        [
            ("state", self.state.as_deref()),
            ("district", self.district.as_deref()),
            ("season", self.season.as_deref()),
            ("waterAvailability", self.water_availability.as_deref()),
            ("soilType", self.soil_type.as_deref()),
            ("rainfall", self.rainfall.as_deref()),
            ("temperature", self.temperature.as_deref()),
            ("previousCrop", self.previous_crop.as_deref()),
        ]
    }

    /// First field that is absent or blank.
    pub fn first_missing_field(&self) -> Option<&'static str> {
        self.fields()
            .into_iter()
            .find(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
            .map(|(name, _)| name)
    }
}

/// Accept any JSON scalar and keep its text form. `null` counts as missing.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// A single recommended crop, formatted as "EnglishName (Translation)"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecommendation {
    pub crop: String,
}

/// Body of the crop recommendation endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub recommendations: Vec<CropRecommendation>,
}

impl Recommendations {
    pub fn from_crops(crops: &[&str]) -> Self {
        Self {
            recommendations: crops
                .iter()
                .map(|c| CropRecommendation {
                    crop: (*c).to_string(),
                })
                .collect(),
        }
    }
}

/// Canonical body of the disease prediction endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseAnalysis {
    pub crop_name: String,
}

/// Body of every `{ "error": ... }` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
