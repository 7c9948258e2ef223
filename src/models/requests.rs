use serde::Deserialize;

use super::NumericOrString;

/// Body of `POST /api/analyze-food`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeFoodRequest {
    /// Image as a `data:` URL (or any URL the model provider can fetch).
    pub image: Option<String>,
}

/// Body of `POST /api/nutrition`.
#[derive(Debug, Deserialize)]
pub struct NutritionRequest {
    pub food_name: Option<String>,
    pub serving_size: Option<String>,
    pub operation_type: Option<String>,
    pub instructions: Option<String>,
    pub current_data: Option<FoodSnapshot>,
}

/// Body of `POST /api/fix-food`.
#[derive(Debug, Deserialize)]
pub struct FixFoodRequest {
    pub query: Option<String>,
    pub instructions: Option<String>,
    pub operation_type: Option<String>,
    pub food_data: Option<FoodSnapshot>,
}

/// The client's current view of a food, echoed back into modification prompts.
#[derive(Debug, Default, Deserialize)]
pub struct FoodSnapshot {
    pub name: Option<String>,
    pub calories: Option<NumericOrString>,
    pub protein: Option<NumericOrString>,
    pub fat: Option<NumericOrString>,
    pub carbs: Option<NumericOrString>,
    pub cholesterol: Option<NumericOrString>,
    pub omega_3: Option<NumericOrString>,
    pub omega_6: Option<NumericOrString>,
    #[serde(default)]
    pub ingredients: Vec<FoodIngredient>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FoodIngredient {
    pub name: Option<String>,
    pub amount: Option<NumericOrString>,
    pub calories: Option<NumericOrString>,
    pub protein: Option<NumericOrString>,
    pub fat: Option<NumericOrString>,
    pub carbs: Option<NumericOrString>,
    pub cholesterol: Option<NumericOrString>,
    pub omega_3: Option<NumericOrString>,
    pub omega_6: Option<NumericOrString>,
}

/// Body of `POST /api/chat` and `POST /api/chat/stream`.
#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    pub messages: Option<Vec<ClientMessage>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientMessage {
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

fn default_role() -> String {
    "user".to_string()
}
