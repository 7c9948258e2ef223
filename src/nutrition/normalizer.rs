use serde_json::{Map, Value};

use super::heuristics::{
    keyword_health_score, linear_health_score, parse_label, DefaultRecord, HeuristicProfile,
};
use super::nutrients::NutrientSet;
use super::parser::{parse_text, LineReport, RawCandidate};
use crate::models::{
    amount_of, HealthScore, IngredientLine, IngredientMacro, MacroTotals, NutritionRecord,
};

const LEGACY_MEAL_NAME: &str = "Analyzed Meal";
const UNKNOWN_INGREDIENT: &str = "Unknown Ingredient";

/// Reshapes whatever the parser recovered into a [`NutritionRecord`].
#[derive(Debug, Clone)]
pub struct FormatNormalizer {
    profile: HeuristicProfile,
    defaults: DefaultRecord,
}

impl FormatNormalizer {
    pub fn new(profile: HeuristicProfile, defaults: DefaultRecord) -> Self {
        Self { profile, defaults }
    }

    pub fn normalize(&self, candidate: RawCandidate) -> NutritionRecord {
        match candidate {
            RawCandidate::Json(object) => self.from_json(&object),
            RawCandidate::Lines(report) => self.from_lines(report),
            RawCandidate::Unrecognized(mentions) => {
                log::info!("Falling back to default record");
                self.defaults.build(mentions)
            }
        }
    }

    fn from_json(&self, object: &Map<String, Value>) -> NutritionRecord {
        if let Some(name) = object.get("meal_name") {
            let name = non_empty_str(name).unwrap_or(self.defaults.meal_name);
            return self.from_shaped(object, name);
        }

        if let Some(item) = first_meal_item(object) {
            log::debug!("Transforming legacy meal array response");
            return self.from_legacy(item);
        }

        if let Some(text) = object.get("text").and_then(Value::as_str) {
            return self.normalize(parse_text(text));
        }

        let looks_like_food = ["calories", "name", "dish", "ingredients"]
            .iter()
            .any(|key| object.contains_key(*key));
        if looks_like_food {
            let name = ["name", "dish"]
                .iter()
                .find_map(|key| object.get(*key).and_then(non_empty_str))
                .unwrap_or(self.defaults.meal_name);
            return self.from_shaped(object, name);
        }

        log::warn!("JSON response has no recognizable meal fields, using defaults");
        self.defaults.build(NutrientSet::ingest(object))
    }

    /// A candidate that already carries the client's shape: the ingredient
    /// labels are kept as given and `ingredient_macros` is aligned to them.
    fn from_shaped(&self, object: &Map<String, Value>, meal_name: &str) -> NutritionRecord {
        let top_level = NutrientSet::ingest(object);
        let ingredients = array_field(object, "ingredients");
        let macros = array_field(object, "ingredient_macros");

        let mut lines: Vec<IngredientLine> = ingredients
            .iter()
            .enumerate()
            .map(|(index, ingredient)| {
                let label = ingredient_text(ingredient);
                let supplied = macros
                    .get(index)
                    .and_then(|m| m.as_object())
                    .or_else(|| ingredient.as_object());
                let breakdown = match supplied {
                    Some(m) => with_label_facts(ingest_macro(m), &label),
                    None => self.profile.estimate(&label, &NutrientSet::default()).breakdown,
                };
                IngredientLine { label, breakdown }
            })
            .collect();

        if lines.is_empty() {
            lines.push(self.defaults.placeholder_line(&top_level));
        }

        let breakdowns: Vec<IngredientMacro> = lines.iter().map(|l| l.breakdown.clone()).collect();
        let totals = totals_or_sum(object, &breakdowns);
        let health_score = object
            .get("health_score")
            .and_then(HealthScore::from_value)
            .unwrap_or_else(|| keyword_score(&lines));

        let mut record = NutritionRecord::new(meal_name, lines, totals, health_score);
        record.vitamin_c = object.get("vitamin_c").and_then(amount_of);
        finish_maps(&mut record, top_level, &breakdowns);
        record
    }

    /// `{ "meal": [ { "dish", "ingredients", ... } ] }`: macros are estimated per
    /// ingredient and the meal-level maps are copied into every ingredient.
    fn from_legacy(&self, item: &Map<String, Value>) -> NutritionRecord {
        let broadcast = NutrientSet::ingest(item);

        let mut lines: Vec<IngredientLine> = array_field(item, "ingredients")
            .iter()
            .map(|ingredient| {
                let mut line = self.profile.estimate(&ingredient_text(ingredient), &broadcast);
                if let Value::String(original) = ingredient {
                    line.label = original.trim().to_string();
                }
                line
            })
            .collect();

        if lines.is_empty() {
            lines.push(self.defaults.placeholder_line(&broadcast));
        }

        let meal_name = ["dish", "name"]
            .iter()
            .find_map(|key| item.get(*key).and_then(non_empty_str))
            .unwrap_or(LEGACY_MEAL_NAME);
        let breakdowns: Vec<IngredientMacro> = lines.iter().map(|l| l.breakdown.clone()).collect();
        let totals = totals_or_sum(item, &breakdowns);
        let health_score = item
            .get("health_score")
            .and_then(HealthScore::from_value)
            .unwrap_or_else(|| keyword_score(&lines));

        let mut record = NutritionRecord::new(meal_name, lines, totals, health_score);
        record.vitamin_c = item.get("vitamin_c").and_then(amount_of);
        finish_maps(&mut record, broadcast, &breakdowns);
        record
    }

    fn from_lines(&self, report: LineReport) -> NutritionRecord {
        let mentions = report.mentions;

        let mut lines: Vec<IngredientLine> = report
            .ingredients
            .iter()
            .map(|part| {
                let mut line = self.profile.estimate(part, &NutrientSet::default());
                if line.breakdown.vitamins.is_empty() {
                    line.breakdown.vitamins = mentions.vitamins.clone();
                }
                if line.breakdown.minerals.is_empty() {
                    line.breakdown.minerals = mentions.minerals.clone();
                }
                line
            })
            .collect();

        if lines.is_empty() {
            lines.push(self.defaults.placeholder_line(&mentions));
        }

        let reported = MacroTotals::new(report.calories, report.protein, report.fat, report.carbs);
        let health_score = linear_health_score(&reported, report.vitamin_c);

        let fallback = self.defaults.line_totals;
        let totals = MacroTotals::new(
            non_zero_or(reported.calories, fallback.calories),
            non_zero_or(reported.protein, fallback.protein),
            non_zero_or(reported.fat, fallback.fat),
            non_zero_or(reported.carbs, fallback.carbs),
        );

        let meal_name = report
            .meal_name
            .unwrap_or_else(|| self.defaults.meal_name.to_string());
        let breakdowns: Vec<IngredientMacro> = lines.iter().map(|l| l.breakdown.clone()).collect();

        let mut record = NutritionRecord::new(meal_name, lines, totals, health_score);
        record.vitamin_c = Some(non_zero_or(report.vitamin_c, self.defaults.vitamin_c));
        finish_maps(&mut record, mentions, &breakdowns);
        record
    }
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

fn non_zero_or(value: f64, fallback: f64) -> f64 {
    if value == 0.0 {
        fallback
    } else {
        value
    }
}

fn array_field<'a>(object: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn first_meal_item(object: &Map<String, Value>) -> Option<&Map<String, Value>> {
    array_field(object, "meal").first().and_then(Value::as_object)
}

/// Label for an ingredient given either as a string or as `{name, amount, calories}`.
fn ingredient_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Object(object) => {
            let name = object
                .get("name")
                .and_then(non_empty_str)
                .unwrap_or(UNKNOWN_INGREDIENT);
            let mut text = name.to_string();
            if let Some(amount) = object.get("amount").and_then(display_value) {
                text.push_str(&format!(" ({})", amount));
            }
            if let Some(calories) = object.get("calories").and_then(amount_of) {
                text.push_str(&format!(" {}kcal", calories));
            }
            text
        }
        _ => UNKNOWN_INGREDIENT.to_string(),
    }
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn ingest_macro(object: &Map<String, Value>) -> IngredientMacro {
    let field = |key: &str| object.get(key).and_then(amount_of);
    let mut breakdown = IngredientMacro {
        name: object.get("name").and_then(non_empty_str).map(String::from),
        amount: object.get("amount").and_then(display_value),
        calories: field("calories"),
        protein: field("protein").unwrap_or(0.0),
        fat: field("fat").unwrap_or(0.0),
        carbs: field("carbs").unwrap_or(0.0),
        ..Default::default()
    };
    NutrientSet::ingest(object).apply_to_ingredient(&mut breakdown);
    breakdown
}

/// Name, weight and kcal the label states fill whatever the supplied macro left out.
fn with_label_facts(mut breakdown: IngredientMacro, label: &str) -> IngredientMacro {
    let parsed = parse_label(label);
    if breakdown.calories.is_none() {
        breakdown.calories = parsed.calories;
    }
    if breakdown.amount.is_none() {
        breakdown.amount = parsed.weight;
    }
    if breakdown.name.is_none() && !parsed.name.is_empty() && label != UNKNOWN_INGREDIENT {
        breakdown.name = Some(parsed.name);
    }
    breakdown
}

fn totals_or_sum(object: &Map<String, Value>, breakdowns: &[IngredientMacro]) -> MacroTotals {
    let summed = MacroTotals::summed(breakdowns);
    let field = |key: &str| object.get(key).and_then(amount_of);
    MacroTotals::new(
        field("calories").unwrap_or(summed.calories),
        field("protein").unwrap_or(summed.protein),
        field("fat").unwrap_or(summed.fat),
        field("carbs").unwrap_or(summed.carbs),
    )
}

fn keyword_score(lines: &[IngredientLine]) -> HealthScore {
    let labels: Vec<&str> = lines.iter().map(|l| l.label.as_str()).collect();
    keyword_health_score(&labels)
}

/// Meal-level maps keep what the model gave and gain any key only present per ingredient.
fn finish_maps(record: &mut NutritionRecord, mut top_level: NutrientSet, breakdowns: &[IngredientMacro]) {
    top_level.fill_missing_from(&NutrientSet::summed(breakdowns));
    top_level.apply_to_record(record);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::parser::parse;
    use serde_json::json;

    fn normalizer() -> FormatNormalizer {
        FormatNormalizer::new(HeuristicProfile::standard(), DefaultRecord::detailed())
    }

    fn normalize_raw(raw: &str) -> NutritionRecord {
        normalizer().normalize(parse(raw))
    }

    fn assert_invariants(record: &NutritionRecord) {
        assert_eq!(record.ingredients().len(), record.ingredient_macros().len());
        let score = record.health_score.value();
        assert!((1..=10).contains(&score));
        let rendered = record.health_score.to_string();
        assert!(rendered.ends_with("/10"));
    }

    #[test]
    fn test_well_formed_record_passes_through() {
        let raw = r#"{"meal_name":"Pasta Meal","ingredients":["Pasta (100g) 200kcal"],"calories":200,"protein":7,"fat":1,"carbs":43,"vitamin_c":0,"health_score":"6/10"}"#;
        let record = normalize_raw(raw);

        assert_invariants(&record);
        assert_eq!(record.meal_name, "Pasta Meal");
        assert_eq!(record.ingredients(), ["Pasta (100g) 200kcal"]);
        assert_eq!(record.calories, 200.0);
        assert_eq!(record.protein, 7.0);
        assert_eq!(record.fat, 1.0);
        assert_eq!(record.carbs, 43.0);
        assert_eq!(record.vitamin_c, Some(0.0));
        assert_eq!(record.health_score.to_string(), "6/10");
        assert_eq!(record.vitamins["vitamin_c"].amount, 0.0);
    }

    #[test]
    fn test_normalizing_twice_is_idempotent() {
        let raw = json!({
            "meal_name": "Breakfast Plate",
            "ingredients": ["Egg (50g) 72kcal", "Toast (30g) 80kcal", "Orange juice"],
            "ingredient_macros": [
                {"protein": "6.3g", "fat": "4.8g", "carbs": "0.4g", "vitamin_d": "41"}
            ],
            "calories": "352kcal",
            "health_score": 7,
            "minerals": {"Iron": "2mg"}
        })
        .to_string();

        let first = normalize_raw(&raw);
        let reparsed = serde_json::to_string(&first).unwrap();
        let second = normalize_raw(&reparsed);

        assert_invariants(&first);
        assert_eq!(first.ingredient_macros().len(), 3);
        assert_eq!(first.ingredient_macros()[0].vitamins["vitamin_d"].unit, "IU");
        assert_eq!(first.minerals["iron"].amount, 2.0);
        assert_eq!(first.calories, 352.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_extra_macros_are_dropped() {
        let raw = json!({
            "meal_name": "Snack",
            "ingredients": ["Apple (150g) 78kcal"],
            "ingredient_macros": [
                {"protein": 0.4, "fat": 0.3, "carbs": 21},
                {"protein": 9, "fat": 9, "carbs": 9}
            ]
        })
        .to_string();

        let record = normalize_raw(&raw);

        assert_invariants(&record);
        assert_eq!(record.ingredient_macros().len(), 1);
        assert_eq!(record.carbs, 21.0);
        assert_eq!(record.calories, 78.0);
    }

    #[test]
    fn test_label_kcal_fills_supplied_macros() {
        let raw = json!({
            "meal_name": "Lunch",
            "ingredients": ["Chicken (150g) 250kcal", "Rice (100g) 130kcal"],
            "ingredient_macros": [
                {"protein": 46, "fat": 5.4, "carbs": 0},
                {"protein": 2.7, "fat": 0.3, "carbs": 28, "calories": 128}
            ]
        })
        .to_string();

        let record = normalize_raw(&raw);
        let macros = record.ingredient_macros();

        assert_invariants(&record);
        assert_eq!(macros[0].calories, Some(250.0));
        assert_eq!(macros[0].amount.as_deref(), Some("150g"));
        assert_eq!(macros[0].name.as_deref(), Some("Chicken"));
        assert_eq!(macros[1].calories, Some(128.0));
        assert_eq!(record.calories, 378.0);
    }

    #[test]
    fn test_legacy_meal_array() {
        let raw = json!({
            "meal": [{
                "dish": "Steak Dinner",
                "ingredients": ["Beef (200g) 400kcal", "Potato", {"name": "Olive oil", "amount": "10g", "calories": 90}],
                "vitamins": {"Vitamin C": 12},
                "minerals": {"iron": "3mg"}
            }]
        })
        .to_string();

        let record = normalize_raw(&raw);

        assert_invariants(&record);
        assert_eq!(record.meal_name, "Steak Dinner");
        assert_eq!(
            record.ingredients(),
            ["Beef (200g) 400kcal", "Potato", "Olive oil (10g) 90kcal"]
        );

        let beef = &record.ingredient_macros()[0];
        assert_eq!(beef.protein, 60.0);
        assert_eq!(beef.fat, 17.8);
        assert_eq!(beef.vitamins["vitamin_c"].amount, 12.0);
        assert_eq!(beef.minerals["iron"].amount, 3.0);

        let potato = &record.ingredient_macros()[1];
        assert_eq!(potato.amount.as_deref(), Some("150g"));
        assert_eq!(potato.calories, Some(130.0));

        // 400 + 130 + 90
        assert_eq!(record.calories, 620.0);
        assert_eq!(record.vitamins["vitamin_c"].amount, 12.0);
    }

    #[test]
    fn test_legacy_meal_without_name_or_ingredients() {
        let record = normalize_raw(r#"{"meal": [{"calories": 300}]}"#);
        assert_invariants(&record);
        assert_eq!(record.meal_name, "Analyzed Meal");
        assert_eq!(record.ingredients(), ["Mixed ingredients (100g) 200kcal"]);
        assert_eq!(record.calories, 300.0);
    }

    #[test]
    fn test_food_analysis_text_report() {
        let raw = "FOOD ANALYSIS RESULTS\nFood item 1: Grilled Chicken\nIngredients: chicken, rice\nCalories: 350\nProtein: 40\nFat: 8\nCarbs: 30\nVitamin C: 0";
        let record = normalize_raw(raw);

        assert_invariants(&record);
        assert_eq!(record.meal_name, "Grilled Chicken");
        assert_eq!(
            record.ingredients(),
            ["chicken (100g) 165kcal", "rice (100g) 130kcal"]
        );
        assert_eq!(record.calories, 350.0);
        assert_eq!(record.protein, 40.0);
        assert_eq!(record.health_score.to_string(), "3/10");
        // zero vitamin C falls back to the default
        assert_eq!(record.vitamin_c, Some(2.0));
        assert_eq!(record.ingredient_macros()[1].minerals["selenium"].amount, 15.1);
    }

    #[test]
    fn test_text_report_without_numbers_uses_line_defaults() {
        let record = normalize_raw("Food item 1: Mystery Stew");
        assert_invariants(&record);
        assert_eq!(record.meal_name, "Mystery Stew");
        assert_eq!(record.calories, 500.0);
        assert_eq!(record.protein, 15.0);
        assert_eq!(record.health_score, HealthScore::NEUTRAL);
    }

    #[test]
    fn test_unparseable_text_gives_default_record() {
        let record = normalize_raw("I cannot analyze this image.");

        assert_invariants(&record);
        assert_eq!(record.meal_name, "Mixed Meal");
        assert_eq!(record.ingredients().len(), 1);
        assert_eq!(record.health_score.to_string(), "6/10");

        let compact = FormatNormalizer::new(HeuristicProfile::light(), DefaultRecord::compact())
            .normalize(parse("I cannot analyze this image."));
        assert_eq!(compact.health_score.to_string(), "5/10");
    }

    #[test]
    fn test_text_wrapper_is_reparsed() {
        let raw = json!({"text": "FOOD ANALYSIS RESULTS\nFood item 1: Toast\nCalories: 80"}).to_string();
        let record = normalize_raw(&raw);
        assert_eq!(record.meal_name, "Toast");
        assert_eq!(record.calories, 80.0);
    }

    #[test]
    fn test_flat_calories_without_meal_name() {
        let raw = json!({
            "name": "Greek Yogurt",
            "calories": 150,
            "protein": "15g",
            "ingredients": [{"name": "Yogurt", "amount": "170g", "calories": 150, "protein": 15, "fat": 4, "carbs": 8}]
        })
        .to_string();

        let record = normalize_raw(&raw);

        assert_invariants(&record);
        assert_eq!(record.meal_name, "Greek Yogurt");
        assert_eq!(record.ingredients(), ["Yogurt (170g) 150kcal"]);
        assert_eq!(record.ingredient_macros()[0].fat, 4.0);
        assert_eq!(record.fat, 4.0);
        assert_eq!(record.protein, 15.0);
    }

    #[test]
    fn test_missing_health_score_uses_keywords() {
        let raw = json!({
            "meal_name": "Bowl",
            "ingredients": ["Quinoa (100g) 120kcal", "Spinach (30g) 7kcal", "Salmon (100g) 208kcal"]
        })
        .to_string();

        let record = normalize_raw(&raw);
        assert_eq!(record.health_score.value(), 8);
    }

    #[test]
    fn test_unrecognized_json_keeps_micronutrients() {
        let record = normalize_raw(r#"{"vitamins": {"a": 300}, "status": "ok"}"#);
        assert_invariants(&record);
        assert_eq!(record.meal_name, "Mixed Meal");
        assert_eq!(record.vitamins["vitamin_a"].unit, "mcg");
        assert_eq!(record.ingredient_macros()[0].vitamins["vitamin_a"].amount, 300.0);
    }
}
