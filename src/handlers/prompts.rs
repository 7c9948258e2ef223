use std::fmt::Write;

use crate::models::{FixFoodRequest, FoodIngredient, FoodSnapshot, NumericOrString};

pub const ANALYZE_SYSTEM_PROMPT: &str = "[STRICTLY JSON ONLY] You are a nutrition expert analyzing food images. \
OUTPUT MUST BE VALID JSON AND NOTHING ELSE.\n\n\
FORMAT RULES:\n\
1. Return a single meal name for the entire image (e.g., \"Pasta Meal\", \"Breakfast Plate\")\n\
2. List ingredients with weights and calories (e.g., \"Pasta (100g) 200kcal\")\n\
3. Return total values for calories, protein, fat, carbs, vitamin C\n\
4. Add a health score (1-10)\n\
5. Provide the macronutrient breakdown (protein, fat, carbs) for EACH ingredient, in the same order as the ingredients\n\
6. Provide vitamins, minerals and other_nutrients maps for the meal and for each ingredient\n\
7. Use decimal places and realistic estimates\n\
8. DO NOT respond with markdown code blocks or text explanations\n\
9. ONLY RETURN A RAW JSON OBJECT\n\n\
EXACT FORMAT REQUIRED:\n\
{\n\
  \"meal_name\": \"Meal Name\",\n\
  \"ingredients\": [\"Item1 (weight) calories\", \"Item2 (weight) calories\"],\n\
  \"ingredient_macros\": [\n\
    {\"protein\": 12.5, \"fat\": 5.2, \"carbs\": 45.7, \"vitamins\": {\"vitamin_c\": 15}, \"minerals\": {\"iron\": 1.8}},\n\
    {\"protein\": 8.3, \"fat\": 3.1, \"carbs\": 28.3, \"vitamins\": {\"vitamin_c\": 8}, \"minerals\": {\"iron\": 1.2}}\n\
  ],\n\
  \"calories\": number,\n\
  \"protein\": number,\n\
  \"fat\": number,\n\
  \"carbs\": number,\n\
  \"vitamin_c\": number,\n\
  \"vitamins\": {\"vitamin_a\": number, \"vitamin_c\": number, \"vitamin_d\": number},\n\
  \"minerals\": {\"calcium\": number, \"iron\": number, \"potassium\": number},\n\
  \"other_nutrients\": {\"fiber\": number, \"cholesterol\": number, \"omega_3\": number},\n\
  \"health_score\": \"score/10\"\n\
}";

pub const ANALYZE_USER_PROMPT: &str = "RETURN ONLY RAW JSON - NO TEXT, NO CODE BLOCKS, NO EXPLANATIONS. \
Analyze this food image and return nutrition data in the exact format described. \
Provide accurate protein, fat and carb values for each ingredient.";

pub const MODIFY_SYSTEM_PROMPT: &str = "You are a nutrition expert. Analyze the provided food description \
and make modifications based on instructions. Return a JSON with the updated nutritional values and \
ingredients, including detailed micronutrients and trace elements.";

pub const CALCULATE_SYSTEM_PROMPT: &str = "You are a nutrition expert. Calculate accurate nutritional \
values for the provided food and serving size. Return a JSON with calories, protein, fat, carbs, and \
include detailed micronutrients (vitamins, minerals, and other nutrients like cholesterol, omega-3, \
omega-6, etc).";

pub const FIX_FOOD_SYSTEM_PROMPT: &str = "You are a nutrition expert specialized in analyzing and \
improving food recipes. Always respond with valid JSON. Always include values for cholesterol (in mg), \
omega-3 fatty acids (in mg), and omega-6 fatty acids (in mg) in both the root level and in a nested \
'other_nutrients' object with proper units.";

const DEFAULT_SERVING: &str = "1 serving";
const DEFAULT_INSTRUCTION: &str = "Analyze and improve this food";

const FIX_FOOD_RESPONSE_SHAPE: &str = r#"
{
  "name": "Updated Food Name",
  "calories": 123,
  "protein": 30,
  "fat": 5,
  "carbs": 20,
  "cholesterol": 10,
  "omega_3": 150,
  "omega_6": 2500,
  "ingredients": [
    {"name": "Ingredient 1", "amount": "100g", "calories": 100, "protein": 10, "fat": 2, "carbs": 5}
  ],
  "other_nutrients": {
    "cholesterol": {"amount": 10, "unit": "mg"},
    "omega_3": {"amount": 150, "unit": "mg"},
    "omega_6": {"amount": 2500, "unit": "mg"}
  }
}"#;

/// Modification requested on `/api/nutrition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    General,
    ReduceCalories,
    IncreaseCalories,
    RemoveIngredient,
    AddIngredient,
}

impl OperationType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "GENERAL" => Some(Self::General),
            "REDUCE_CALORIES" => Some(Self::ReduceCalories),
            "INCREASE_CALORIES" => Some(Self::IncreaseCalories),
            "REMOVE_INGREDIENT" => Some(Self::RemoveIngredient),
            "ADD_INGREDIENT" => Some(Self::AddIngredient),
            _ => None,
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            Self::General => "analyze and update",
            Self::ReduceCalories => "reduce calories",
            Self::IncreaseCalories => "increase calories",
            Self::RemoveIngredient => "remove ingredient",
            Self::AddIngredient => "add ingredient",
        }
    }
}

/// Zero and empty values are left out of prompts.
fn shown(value: &Option<NumericOrString>) -> Option<String> {
    value
        .as_ref()
        .filter(|v| v.amount() != Some(0.0))
        .map(ToString::to_string)
        .filter(|s| !s.is_empty())
}

fn describe_ingredient(ingredient: &FoodIngredient) -> String {
    let mut line = format!("- {}", ingredient.name.as_deref().unwrap_or("Unknown"));
    if let Some(amount) = shown(&ingredient.amount) {
        let _ = write!(line, " ({})", amount);
    }
    if let Some(calories) = shown(&ingredient.calories) {
        let _ = write!(line, ": {} calories", calories);
    }
    let extras = [
        (&ingredient.protein, "g protein"),
        (&ingredient.fat, "g fat"),
        (&ingredient.carbs, "g carbs"),
        (&ingredient.cholesterol, "mg cholesterol"),
        (&ingredient.omega_3, "mg omega-3"),
        (&ingredient.omega_6, "mg omega-6"),
    ];
    for (value, suffix) in extras {
        if let Some(value) = shown(value) {
            let _ = write!(line, ", {}{}", value, suffix);
        }
    }
    line
}

/// Totals and ingredient lines of the client's current food; only known values are written.
fn describe_snapshot(prompt: &mut String, snapshot: &FoodSnapshot) {
    let totals = [
        ("calories", &snapshot.calories),
        ("protein", &snapshot.protein),
        ("fat", &snapshot.fat),
        ("carbs", &snapshot.carbs),
        ("cholesterol", &snapshot.cholesterol),
        ("omega-3", &snapshot.omega_3),
        ("omega-6", &snapshot.omega_6),
    ];
    for (label, value) in totals {
        if let Some(value) = shown(value) {
            let _ = writeln!(prompt, "Total {}: {}", label, value);
        }
    }

    if !snapshot.ingredients.is_empty() {
        prompt.push_str("Ingredients:\n");
        for ingredient in &snapshot.ingredients {
            prompt.push_str(&describe_ingredient(ingredient));
            prompt.push('\n');
        }
    }
}

/// System and user prompt for `/api/nutrition`.
pub fn nutrition_prompts(
    food_name: &str,
    serving_size: Option<&str>,
    operation: Option<OperationType>,
    instructions: Option<&str>,
    current_data: Option<&FoodSnapshot>,
) -> (&'static str, String) {
    match operation {
        Some(operation) => {
            let mut prompt = format!("Food: {}\n", food_name);
            if let Some(snapshot) = current_data {
                describe_snapshot(&mut prompt, snapshot);
            }
            if let Some(instructions) = instructions.filter(|i| !i.trim().is_empty()) {
                let _ = write!(
                    prompt,
                    "\nPlease {} the food according to the following instruction: '{}'",
                    operation.verb(),
                    instructions
                );
            }
            (MODIFY_SYSTEM_PROMPT, prompt)
        }
        None => {
            let serving = serving_size
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(DEFAULT_SERVING);
            let prompt = format!(
                "Calculate accurate nutritional values for {}, serving size: {}. Return a detailed JSON with \
                 calories, protein, fat, carbs and the following additional nutrients:\n\n\
                 1. Vitamins: vitamin_a, vitamin_d, vitamin_e, vitamin_k, vitamin_b12, folate\n\
                 2. Minerals: sodium, potassium, calcium, iron, magnesium, zinc, phosphorus, iodine, molybdenum, chloride, chromium, fluoride\n\
                 3. Other nutrients: cholesterol, omega_3, omega_6\n\n\
                 For each of these nutrients, provide the amount and appropriate unit of measurement.",
                food_name, serving
            );
            (CALCULATE_SYSTEM_PROMPT, prompt)
        }
    }
}

/// User prompt for `/api/fix-food`.
pub fn fix_food_prompt(request: &FixFoodRequest) -> String {
    let mut prompt = String::from("Analyze and modify the following food based on instructions:\n\n");

    if let Some(food) = &request.food_data {
        let _ = writeln!(prompt, "Food: {}", food.name.as_deref().unwrap_or("Unknown"));
        describe_snapshot(&mut prompt, food);
    }

    let instruction = [&request.instructions, &request.query]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_INSTRUCTION);
    let _ = writeln!(prompt, "\nInstruction: {}", instruction);

    if let Some(operation) = request.operation_type.as_deref().filter(|o| !o.trim().is_empty()) {
        let _ = writeln!(prompt, "Operation type: {}", operation);
    }

    prompt.push_str("\nPlease respond with a valid JSON object using this structure:");
    prompt.push_str(FIX_FOOD_RESPONSE_SHAPE);
    prompt
}
