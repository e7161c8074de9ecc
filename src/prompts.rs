//! Prompt templates sent to the generative model.
//!
//! Field values are interpolated verbatim. Nothing is escaped, so a value that
//! contains quotes or template text ends up in the prompt exactly as submitted.

use serde::{Deserialize, Serialize};

use crate::models::FarmingConditions;

/// Text used for a field the client did not send
pub const MISSING_FIELD_PLACEHOLDER: &str = "undefined";

/// Prompt for plant photo analysis
pub const DISEASE_PROMPT: &str = r#"Analyze this plant image and identify if there are any diseases present.
If a disease is detected, provide the disease name. If the plant appears healthy or if
you cannot identify any disease, please indicate that. Only identify the crop name and
its condition. Format the response as JSON:
{
  "cropName": "Crop name and its condition"
}"#;

/// Language the crop names are translated into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptLanguage {
    /// Language name as it appears in the instructions
    pub name: String,
    /// Example translation of "Sunflower"
    pub sunflower: String,
    /// Placeholder shown inside the parentheses of the output template
    pub placeholder: String,
}

impl Default for PromptLanguage {
    fn default() -> Self {
        Self {
            name: "Telugu".to_string(),
            sunflower: "పొద్దుతిరుగుడు".to_string(),
            placeholder: "తెలుగు అనువాదం".to_string(),
        }
    }
}

fn value(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or(MISSING_FIELD_PLACEHOLDER)
}

/// Build the crop recommendation prompt. Never fails.
pub fn build_crop_prompt(conditions: &FarmingConditions, language: &PromptLanguage) -> String {
    let entry = format!("    {{\"crop\": \"CropName ({})\"}}", language.placeholder);
    let entries = vec![entry; 4].join(",\n");

    format!(
        r#"Based on these farming conditions, analyze and recommend the TOP 4 MOST SUITABLE crops
considering soil compatibility, water requirements, and seasonal conditions. Prioritize crops with:
1. Highest yield potential in given conditions
2. Best match for the specified soil type
3. Optimal water requirement match
4. Historical success in the region

Using these farming conditions:
{{
  "location": {{
    "state": "{state}",
    "district": "{district}",
    "season": "{season}"
  }},
  "conditions": {{
    "water": "{water}",
    "soil": "{soil}",
    "rainfall": "{rainfall}",
    "temperature": "{temperature}",
    "previousCrop": "{previous_crop}"
  }}
}}

Return a JSON response with the TOP 4 MOST SUITABLE crop names in English followed by exact {language} translation in parentheses.
For example: "Sunflower ({sunflower})". Format as:
{{
  "recommendations": [
{entries}
  ]
}}"#,
        state = value(&conditions.state),
        district = value(&conditions.district),
        season = value(&conditions.season),
        water = value(&conditions.water_availability),
        soil = value(&conditions.soil_type),
        rainfall = value(&conditions.rainfall),
        temperature = value(&conditions.temperature),
        previous_crop = value(&conditions.previous_crop),
        language = language.name,
        sunflower = language.sunflower,
        entries = entries,
    )
}
