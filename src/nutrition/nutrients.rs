use serde_json::{Map, Value};

use super::keys::{normalize_key, normalize_vitamin_key};
use super::units::{stated_unit, to_table_unit, unit_for, NutrientCategory};
use crate::models::{amount_of, round_to, IngredientMacro, NutrientEntry, NutrientMap, NutritionRecord};

/// The three micronutrient maps carried at meal and ingredient level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NutrientSet {
    pub vitamins: NutrientMap,
    pub minerals: NutrientMap,
    pub other_nutrients: NutrientMap,
}

pub fn canonical_key(category: NutrientCategory, key: &str) -> String {
    match category {
        NutrientCategory::Vitamin => normalize_vitamin_key(key),
        _ => normalize_key(key),
    }
}

pub fn entry(category: NutrientCategory, key: &str, amount: f64) -> NutrientEntry {
    NutrientEntry {
        amount,
        unit: unit_for(category, key).to_string(),
    }
}

/// Amount of a model-supplied value expressed in the table unit for `key`.
fn table_amount(category: NutrientCategory, key: &str, value: &Value) -> Option<f64> {
    let amount = amount_of(value)?;
    let unit = unit_for(category, &canonical_key(category, key));
    Some(round_to(to_table_unit(amount, stated_unit(value), unit), 4))
}

impl NutrientSet {
    pub fn map(&self, category: NutrientCategory) -> &NutrientMap {
        match category {
            NutrientCategory::Vitamin => &self.vitamins,
            NutrientCategory::Mineral => &self.minerals,
            NutrientCategory::Other => &self.other_nutrients,
        }
    }

    pub fn map_mut(&mut self, category: NutrientCategory) -> &mut NutrientMap {
        match category {
            NutrientCategory::Vitamin => &mut self.vitamins,
            NutrientCategory::Mineral => &mut self.minerals,
            NutrientCategory::Other => &mut self.other_nutrients,
        }
    }

    /// Inserts under the canonical key; the unit comes from the unit table.
    pub fn insert(&mut self, category: NutrientCategory, key: &str, amount: f64) {
        let key = canonical_key(category, key);
        if key.is_empty() {
            return;
        }
        let value = entry(category, &key, amount);
        self.map_mut(category).insert(key, value);
    }

    pub fn from_pairs(
        vitamins: &[(&str, f64)],
        minerals: &[(&str, f64)],
        other: &[(&str, f64)],
    ) -> Self {
        let mut set = Self::default();
        for (key, amount) in vitamins {
            set.insert(NutrientCategory::Vitamin, key, *amount);
        }
        for (key, amount) in minerals {
            set.insert(NutrientCategory::Mineral, key, *amount);
        }
        for (key, amount) in other {
            set.insert(NutrientCategory::Other, key, *amount);
        }
        set
    }

    /// Reads nested `vitamins` / `minerals` / `other_nutrients` (or `other`)
    /// objects and any flat nutrient keys sitting next to them.
    pub fn ingest(object: &Map<String, Value>) -> Self {
        let mut set = Self::default();

        let nested = [
            ("vitamins", NutrientCategory::Vitamin),
            ("minerals", NutrientCategory::Mineral),
            ("other", NutrientCategory::Other),
            ("other_nutrients", NutrientCategory::Other),
        ];
        for (field, category) in nested {
            if let Some(Value::Object(map)) = object.get(field) {
                set.ingest_map(category, map);
            }
        }

        for (key, value) in object {
            if nested.iter().any(|(field, _)| *field == key.as_str()) {
                continue;
            }
            let canonical = normalize_key(key);
            if let Some(category) = NutrientCategory::classify(&canonical) {
                if let Some(amount) = table_amount(category, &canonical, value) {
                    // nested maps win over flat duplicates
                    if !set.map(category).contains_key(&canonical) {
                        set.insert(category, &canonical, amount);
                    }
                }
            }
        }

        set
    }

    pub fn ingest_map(&mut self, category: NutrientCategory, map: &Map<String, Value>) {
        for (key, value) in map {
            let amount = table_amount(category, key, value).unwrap_or(0.0);
            self.insert(category, key, amount);
        }
    }

    /// Adds each key of `other` that is missing here, leaving existing keys untouched.
    pub fn fill_missing_from(&mut self, other: &NutrientSet) {
        for category in [
            NutrientCategory::Vitamin,
            NutrientCategory::Mineral,
            NutrientCategory::Other,
        ] {
            let target = self.map_mut(category);
            for (key, value) in other.map(category) {
                target.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
    }

    /// Sum of the ingredient-level maps, rounded to two decimals.
    pub fn summed(macros: &[IngredientMacro]) -> Self {
        let mut set = Self::default();
        for item in macros {
            let parts = [
                (NutrientCategory::Vitamin, &item.vitamins),
                (NutrientCategory::Mineral, &item.minerals),
                (NutrientCategory::Other, &item.other_nutrients),
            ];
            for (category, map) in parts {
                let target = set.map_mut(category);
                for (key, value) in map {
                    target
                        .entry(key.clone())
                        .and_modify(|existing| existing.amount += value.amount)
                        .or_insert_with(|| value.clone());
                }
            }
        }
        for category in [
            NutrientCategory::Vitamin,
            NutrientCategory::Mineral,
            NutrientCategory::Other,
        ] {
            for value in set.map_mut(category).values_mut() {
                value.amount = round_to(value.amount, 2);
            }
        }
        set
    }

    pub fn apply_to_ingredient(&self, item: &mut IngredientMacro) {
        item.vitamins = self.vitamins.clone();
        item.minerals = self.minerals.clone();
        item.other_nutrients = self.other_nutrients.clone();
    }

    pub fn apply_to_record(self, record: &mut NutritionRecord) {
        record.vitamins = self.vitamins;
        record.minerals = self.minerals;
        record.other_nutrients = self.other_nutrients;
    }
}
