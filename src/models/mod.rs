use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

pub mod requests;

pub use requests::{
    AnalyzeFoodRequest, ChatRequestBody, FixFoodRequest, FoodIngredient, FoodSnapshot,
    NutritionRequest,
};

/// Thousands separators (`1,250`) are folded, a lone comma is a decimal mark (`0,5`).
static NUMBER_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d{1,3}(?:,\d{3})+|\d+)(?:[.,](\d+))?").ok());

/// Extracts the first number found in a model-supplied string such as `"12.5g"`.
pub fn parse_amount(text: &str) -> Option<f64> {
    let caps = NUMBER_PATTERN.as_ref()?.captures(text)?;
    let whole = caps.get(1)?.as_str().replace(',', "");
    let number = match caps.get(2) {
        Some(fraction) => format!("{}.{}", whole, fraction.as_str()),
        None => whole,
    };
    number.parse().ok()
}

/// Numeric amount of an untyped JSON value: numbers, unit strings, or `{amount, unit}` objects.
pub fn amount_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_amount(s),
        Value::Object(map) => map.get("amount").and_then(amount_of),
        _ => None,
    }
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// A value the model (or client) may send either as a bare number or as a
/// unit-suffixed string like `"45.7g"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericOrString {
    Number(f64),
    Text(String),
    Entry {
        amount: Box<NumericOrString>,
        #[serde(default)]
        unit: Option<String>,
    },
}

impl NumericOrString {
    pub fn amount(&self) -> Option<f64> {
        match self {
            NumericOrString::Number(n) => n.is_finite().then_some(*n),
            NumericOrString::Text(text) => parse_amount(text),
            NumericOrString::Entry { amount, .. } => amount.amount(),
        }
    }
}

impl fmt::Display for NumericOrString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericOrString::Number(n) => write!(f, "{}", n),
            NumericOrString::Text(text) => write!(f, "{}", text),
            NumericOrString::Entry { amount, unit } => {
                write!(f, "{}{}", amount, unit.as_deref().unwrap_or(""))
            }
        }
    }
}

/// Health score on a 1-10 scale, rendered as `"7/10"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HealthScore(u8);

impl HealthScore {
    pub const NEUTRAL: HealthScore = HealthScore(5);

    /// Rounds and clamps into 1..=10. Non-finite input yields the neutral score.
    pub fn from_raw(raw: f64) -> Self {
        if !raw.is_finite() {
            return Self::NEUTRAL;
        }
        Self(raw.round().clamp(1.0, 10.0) as u8)
    }

    /// Accepts `"7/10"`, `"7"`, `7` or `7.6`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(Self::from_raw),
            Value::String(s) => {
                let numerator = s.split('/').next().unwrap_or(s);
                parse_amount(numerator).map(Self::from_raw)
            }
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for HealthScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/10", self.value())
    }
}

impl Serialize for HealthScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Canonical nutrient amount. The unit always comes from the unit table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientEntry {
    pub amount: f64,
    pub unit: String,
}

/// Canonical nutrient key -> entry.
pub type NutrientMap = BTreeMap<String, NutrientEntry>;

/// Per-ingredient macro and micronutrient breakdown.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct IngredientMacro {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub vitamins: NutrientMap,
    pub minerals: NutrientMap,
    pub other_nutrients: NutrientMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl MacroTotals {
    pub fn new(calories: f64, protein: f64, fat: f64, carbs: f64) -> Self {
        Self {
            calories,
            protein,
            fat,
            carbs,
        }
    }

    /// Sum of the per-ingredient values, macros rounded to whole grams.
    pub fn summed(macros: &[IngredientMacro]) -> Self {
        let mut totals = Self::default();
        for item in macros {
            totals.calories += item.calories.unwrap_or(0.0);
            totals.protein += item.protein;
            totals.fat += item.fat;
            totals.carbs += item.carbs;
        }
        Self {
            calories: totals.calories.round(),
            protein: totals.protein.round(),
            fat: totals.fat.round(),
            carbs: totals.carbs.round(),
        }
    }
}

/// One ingredient line together with its breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientLine {
    pub label: String,
    pub breakdown: IngredientMacro,
}

/// The meal record returned to the mobile client.
///
/// `ingredients` and `ingredient_macros` are built from one list of
/// [`IngredientLine`]s and are therefore always the same length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionRecord {
    pub meal_name: String,
    ingredients: Vec<String>,
    ingredient_macros: Vec<IngredientMacro>,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vitamin_c: Option<f64>,
    pub vitamins: NutrientMap,
    pub minerals: NutrientMap,
    pub other_nutrients: NutrientMap,
    pub health_score: HealthScore,
}

impl NutritionRecord {
    pub fn new(
        meal_name: impl Into<String>,
        lines: Vec<IngredientLine>,
        totals: MacroTotals,
        health_score: HealthScore,
    ) -> Self {
        let (ingredients, ingredient_macros) = lines
            .into_iter()
            .map(|line| (line.label, line.breakdown))
            .unzip();

        Self {
            meal_name: meal_name.into(),
            ingredients,
            ingredient_macros,
            calories: totals.calories,
            protein: totals.protein,
            fat: totals.fat,
            carbs: totals.carbs,
            vitamin_c: None,
            vitamins: NutrientMap::new(),
            minerals: NutrientMap::new(),
            other_nutrients: NutrientMap::new(),
            health_score,
        }
    }

    pub fn ingredients(&self) -> &[String] {
        &self.ingredients
    }

    pub fn ingredient_macros(&self) -> &[IngredientMacro] {
        &self.ingredient_macros
    }
}

/// Success envelope: `{ "success": true, "data": ... }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub success: bool,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChunkedChatReply {
    pub success: bool,
    pub chunks: Vec<String>,
    pub full_content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_amount_handles_units_and_separators() {
        assert_eq!(parse_amount("12.5g"), Some(12.5));
        assert_eq!(parse_amount("1,250 kcal"), Some(1250.0));
        assert_eq!(parse_amount("0,5mg"), Some(0.5));
        assert_eq!(parse_amount("about 350"), Some(350.0));
        assert_eq!(parse_amount("none"), None);
    }

    #[test]
    fn test_amount_of_json_shapes() {
        assert_eq!(amount_of(&json!(7)), Some(7.0));
        assert_eq!(amount_of(&json!("300mcg")), Some(300.0));
        assert_eq!(amount_of(&json!({"amount": "2.5", "unit": "g"})), Some(2.5));
        assert_eq!(amount_of(&json!(null)), None);
        assert_eq!(amount_of(&json!(true)), None);
    }

    #[test]
    fn test_numeric_or_string_deserializes_all_shapes() {
        let number: NumericOrString = serde_json::from_value(json!(20)).unwrap();
        let text: NumericOrString = serde_json::from_value(json!("20.8g")).unwrap();
        let entry: NumericOrString =
            serde_json::from_value(json!({"amount": 150, "unit": "mg"})).unwrap();

        assert_eq!(number.amount(), Some(20.0));
        assert_eq!(text.amount(), Some(20.8));
        assert_eq!(entry.amount(), Some(150.0));
        assert_eq!(entry.to_string(), "150mg");
    }

    #[test]
    fn test_health_score_parsing_and_clamping() {
        assert_eq!(HealthScore::from_value(&json!("7/10")).map(HealthScore::value), Some(7));
        assert_eq!(HealthScore::from_value(&json!(12)).map(HealthScore::value), Some(10));
        assert_eq!(HealthScore::from_value(&json!("0/10")).map(HealthScore::value), Some(1));
        assert_eq!(HealthScore::from_value(&json!(6.6)).map(HealthScore::value), Some(7));
        assert_eq!(HealthScore::from_value(&json!("excellent")), None);
        assert_eq!(HealthScore::from_raw(f64::NAN), HealthScore::NEUTRAL);
        assert_eq!(serde_json::to_value(HealthScore::from_raw(8.0)).unwrap(), json!("8/10"));
    }

    #[test]
    fn test_record_keeps_ingredients_aligned() {
        let lines = vec![
            IngredientLine {
                label: "Rice (100g) 130kcal".to_string(),
                breakdown: IngredientMacro::default(),
            },
            IngredientLine {
                label: "Chicken (100g) 165kcal".to_string(),
                breakdown: IngredientMacro::default(),
            },
        ];
        let record = NutritionRecord::new(
            "Chicken Rice",
            lines,
            MacroTotals::new(295.0, 34.0, 4.0, 28.0),
            HealthScore::NEUTRAL,
        );

        assert_eq!(record.ingredients().len(), record.ingredient_macros().len());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["health_score"], "5/10");
        assert!(value.get("vitamin_c").is_none());
        assert!(value["vitamins"].is_object());
    }
}
