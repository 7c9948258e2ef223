use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// The unit word after a leading number, as in `"2.5g"` or `"450 mcg"`.
static UNIT_SUFFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*[+-]?\d[\d.,]*\s*([^\d\s]+)\s*$").ok());

/// Which nutrient map a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NutrientCategory {
    Vitamin,
    Mineral,
    Other,
}

const VITAMIN_IU: &[&str] = &["vitamin_d"];
const VITAMIN_MCG: &[&str] = &[
    "vitamin_a",
    "vitamin_k",
    "vitamin_b12",
    "vitamin_b7",
    "vitamin_b9",
    "folate",
    "biotin",
];

const MINERAL_MG: &[&str] = &["sodium", "potassium", "calcium", "phosphorus", "magnesium"];
const MINERAL_MCG: &[&str] = &["selenium", "chromium", "molybdenum", "iodine", "copper"];

const OTHER_MG: &[&str] = &[
    "cholesterol",
    "caffeine",
    "omega_3",
    "omega3",
    "omega-3",
    "omega_6",
    "omega6",
    "omega-6",
    "chloride",
    "fluoride",
    "sodium",
    "potassium",
];

/// Minerals recognized when a flat (un-nested) key has to be classified.
const KNOWN_MINERALS: &[&str] = &[
    "calcium",
    "chloride",
    "chromium",
    "copper",
    "fluoride",
    "iodine",
    "iron",
    "magnesium",
    "manganese",
    "molybdenum",
    "phosphorus",
    "potassium",
    "selenium",
    "sodium",
    "zinc",
];

const KNOWN_VITAMINS: &[&str] = &["folate", "biotin", "niacin", "riboflavin", "thiamin", "thiamine"];

const KNOWN_OTHER: &[&str] = &[
    "fiber",
    "sugar",
    "starch",
    "cholesterol",
    "caffeine",
    "alcohol",
    "saturated_fat",
    "saturated_fats",
    "trans_fat",
    "omega_3",
    "omega_6",
];

impl NutrientCategory {
    /// Unit used when no table entry matches.
    pub fn default_unit(self) -> &'static str {
        match self {
            NutrientCategory::Vitamin | NutrientCategory::Mineral => "mg",
            NutrientCategory::Other => "g",
        }
    }

    /// Category of a canonical flat key, or `None` for keys that are not
    /// nutrients (`protein`, `meal_name`, ...).
    pub fn classify(key: &str) -> Option<Self> {
        if key.starts_with("vitamin_") || KNOWN_VITAMINS.contains(&key) {
            Some(NutrientCategory::Vitamin)
        } else if KNOWN_MINERALS.contains(&key) {
            Some(NutrientCategory::Mineral)
        } else if KNOWN_OTHER.contains(&key) {
            Some(NutrientCategory::Other)
        } else {
            None
        }
    }
}

fn matches_any(key: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| key.contains(needle))
}

/// Canonical unit for a nutrient. Total over all inputs.
pub fn unit_for(category: NutrientCategory, key: &str) -> &'static str {
    let key = key.to_lowercase();

    match category {
        NutrientCategory::Vitamin => {
            if matches_any(&key, VITAMIN_IU) {
                "IU"
            } else if matches_any(&key, VITAMIN_MCG) {
                "mcg"
            } else {
                category.default_unit()
            }
        }
        NutrientCategory::Mineral => {
            if matches_any(&key, MINERAL_MG) {
                "mg"
            } else if matches_any(&key, MINERAL_MCG) {
                "mcg"
            } else {
                category.default_unit()
            }
        }
        NutrientCategory::Other => {
            if matches_any(&key, OTHER_MG) {
                "mg"
            } else {
                category.default_unit()
            }
        }
    }
}

/// Mass units an amount can be converted between. `IU` is not one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MassUnit {
    Gram,
    Milligram,
    Microgram,
}

impl MassUnit {
    pub fn parse(unit: &str) -> Option<Self> {
        match unit.trim().trim_end_matches('.').to_lowercase().as_str() {
            "g" | "gram" | "grams" => Some(MassUnit::Gram),
            "mg" | "milligram" | "milligrams" => Some(MassUnit::Milligram),
            "mcg" | "µg" | "μg" | "ug" | "microgram" | "micrograms" => Some(MassUnit::Microgram),
            _ => None,
        }
    }

    fn in_micrograms(self) -> f64 {
        match self {
            MassUnit::Gram => 1_000_000.0,
            MassUnit::Milligram => 1_000.0,
            MassUnit::Microgram => 1.0,
        }
    }
}

/// Unit the model wrote next to an amount: the `unit` of an `{amount, unit}`
/// object, or the suffix of a string like `"2.5g"`.
pub fn stated_unit(value: &Value) -> Option<MassUnit> {
    match value {
        Value::String(text) => UNIT_SUFFIX
            .as_ref()?
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| MassUnit::parse(m.as_str())),
        Value::Object(map) => map
            .get("unit")
            .and_then(Value::as_str)
            .and_then(MassUnit::parse)
            .or_else(|| map.get("amount").and_then(stated_unit)),
        _ => None,
    }
}

/// Rescales `amount` into `table_unit`. Amounts without a stated mass unit, or
/// headed for a non-mass unit, are kept as they are.
pub fn to_table_unit(amount: f64, stated: Option<MassUnit>, table_unit: &str) -> f64 {
    match (stated, MassUnit::parse(table_unit)) {
        (Some(from), Some(to)) if from != to => amount * from.in_micrograms() / to.in_micrograms(),
        _ => amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vitamin_units() {
        assert_eq!(unit_for(NutrientCategory::Vitamin, "vitamin_d"), "IU");
        assert_eq!(unit_for(NutrientCategory::Vitamin, "vitamin_d3"), "IU");
        assert_eq!(unit_for(NutrientCategory::Vitamin, "vitamin_b12"), "mcg");
        assert_eq!(unit_for(NutrientCategory::Vitamin, "vitamin_b1"), "mg");
        assert_eq!(unit_for(NutrientCategory::Vitamin, "vitamin_c"), "mg");
    }

    #[test]
    fn test_mineral_units() {
        assert_eq!(unit_for(NutrientCategory::Mineral, "selenium"), "mcg");
        assert_eq!(unit_for(NutrientCategory::Mineral, "potassium"), "mg");
        assert_eq!(unit_for(NutrientCategory::Mineral, "unknown_mineral"), "mg");
    }

    #[test]
    fn test_other_units() {
        assert_eq!(unit_for(NutrientCategory::Other, "cholesterol"), "mg");
        assert_eq!(unit_for(NutrientCategory::Other, "omega_6"), "mg");
        assert_eq!(unit_for(NutrientCategory::Other, "sodium"), "mg");
        assert_eq!(unit_for(NutrientCategory::Other, "fiber"), "g");
        assert_eq!(unit_for(NutrientCategory::Other, "mystery"), "g");
    }

    #[test]
    fn test_stated_units() {
        use serde_json::json;

        assert_eq!(stated_unit(&json!("2.5g")), Some(MassUnit::Gram));
        assert_eq!(stated_unit(&json!("450 mcg")), Some(MassUnit::Microgram));
        assert_eq!(stated_unit(&json!({"amount": 3, "unit": "MG"})), Some(MassUnit::Milligram));
        assert_eq!(stated_unit(&json!({"amount": "12µg"})), Some(MassUnit::Microgram));
        assert_eq!(stated_unit(&json!("400 IU")), None);
        assert_eq!(stated_unit(&json!("1,250 kcal")), None);
        assert_eq!(stated_unit(&json!(7)), None);
    }

    #[test]
    fn test_to_table_unit_rescales_mass_only() {
        assert_eq!(to_table_unit(2.5, Some(MassUnit::Gram), "mg"), 2500.0);
        assert_eq!(to_table_unit(0.05, Some(MassUnit::Milligram), "mcg"), 50.0);
        assert_eq!(to_table_unit(300.0, Some(MassUnit::Milligram), "g"), 0.3);
        assert_eq!(to_table_unit(400.0, Some(MassUnit::Milligram), "IU"), 400.0);
        assert_eq!(to_table_unit(4.0, None, "g"), 4.0);
    }

    #[test]
    fn test_classify_flat_keys() {
        assert_eq!(NutrientCategory::classify("vitamin_b9"), Some(NutrientCategory::Vitamin));
        assert_eq!(NutrientCategory::classify("folate"), Some(NutrientCategory::Vitamin));
        assert_eq!(NutrientCategory::classify("zinc"), Some(NutrientCategory::Mineral));
        assert_eq!(NutrientCategory::classify("saturated_fats"), Some(NutrientCategory::Other));
        assert_eq!(NutrientCategory::classify("protein"), None);
    }
}
