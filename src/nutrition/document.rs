use serde_json::{json, Map, Value};

use super::nutrients::NutrientSet;
use super::units::NutrientCategory;
use crate::models::NutrientMap;

/// Minerals the client always expects to see, zeroed when the model omits them.
const TRACKED_MINERALS: &[&str] = &["iodine", "molybdenum", "chloride", "chromium", "fluoride"];
const TRACKED_OTHER: &[&str] = &["cholesterol", "omega_3", "omega_6"];

fn map_to_value(map: &NutrientMap) -> Value {
    Value::Object(
        map.iter()
            .map(|(key, entry)| {
                (
                    key.clone(),
                    json!({ "amount": entry.amount, "unit": entry.unit }),
                )
            })
            .collect(),
    )
}

/// Canonicalizes the nutrient maps of a food document returned by the
/// nutrition and fix-food routes. Every other field is passed through.
pub fn canonicalize_document(mut document: Map<String, Value>) -> Map<String, Value> {
    let mut set = NutrientSet::default();

    let sections = [
        ("vitamins", NutrientCategory::Vitamin),
        ("minerals", NutrientCategory::Mineral),
        ("other", NutrientCategory::Other),
        ("other_nutrients", NutrientCategory::Other),
    ];
    for (field, category) in sections {
        if let Some(Value::Object(map)) = document.get(field) {
            set.ingest_map(category, map);
        }
    }
    document.remove("other");

    for mineral in TRACKED_MINERALS {
        if !set.minerals.contains_key(*mineral) {
            set.insert(NutrientCategory::Mineral, mineral, 0.0);
        }
    }
    for nutrient in TRACKED_OTHER {
        if !set.other_nutrients.contains_key(*nutrient) {
            set.insert(NutrientCategory::Other, nutrient, 0.0);
        }
    }

    document.insert("vitamins".to_string(), map_to_value(&set.vitamins));
    document.insert("minerals".to_string(), map_to_value(&set.minerals));
    document.insert(
        "other_nutrients".to_string(),
        map_to_value(&set.other_nutrients),
    );
    document
}
