//! Hard-coded estimates used when the model does not supply usable numbers.

use regex::Regex;
use std::sync::LazyLock;

use super::nutrients::NutrientSet;
use crate::models::{round_to, HealthScore, IngredientLine, IngredientMacro, MacroTotals, NutritionRecord};

const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;
const KCAL_PER_GRAM_CARBS: f64 = 4.0;
const KCAL_PER_GRAM_FAT: f64 = 9.0;

static WEIGHT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\(([^)]+)\)").ok());
static KCAL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*kcal").ok());

/// Share of an ingredient's calories coming from each macro.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroShare {
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl MacroShare {
    const fn new(protein: f64, fat: f64, carbs: f64) -> Self {
        Self { protein, fat, carbs }
    }

    /// Grams of protein, fat and carbs for `calories`, one decimal place.
    pub fn split(&self, calories: f64) -> (f64, f64, f64) {
        (
            round_to(calories * self.protein / KCAL_PER_GRAM_PROTEIN, 1),
            round_to(calories * self.fat / KCAL_PER_GRAM_FAT, 1),
            round_to(calories * self.carbs / KCAL_PER_GRAM_CARBS, 1),
        )
    }
}

struct ShareRule {
    keywords: &'static [&'static str],
    share: MacroShare,
}

const SHARE_RULES: &[ShareRule] = &[
    ShareRule {
        keywords: &["chicken", "beef", "fish", "meat"],
        share: MacroShare::new(0.6, 0.4, 0.0),
    },
    ShareRule {
        keywords: &["cheese", "avocado", "nut", "oil"],
        share: MacroShare::new(0.1, 0.8, 0.1),
    },
    ShareRule {
        keywords: &["rice", "pasta", "bread", "potato"],
        share: MacroShare::new(0.1, 0.05, 0.85),
    },
    ShareRule {
        keywords: &["vegetable", "broccoli", "spinach"],
        share: MacroShare::new(0.3, 0.0, 0.7),
    },
    ShareRule {
        keywords: &["fruit", "apple", "banana"],
        share: MacroShare::new(0.05, 0.05, 0.9),
    },
];

pub const DEFAULT_SHARE: MacroShare = MacroShare::new(0.2, 0.3, 0.5);

/// First matching share profile by substring of the lowercased name.
pub fn share_for(name: &str) -> MacroShare {
    let lower = name.to_lowercase();
    SHARE_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lower.contains(k)))
        .map(|rule| rule.share)
        .unwrap_or(DEFAULT_SHARE)
}

/// Typical portion of a recognizable ingredient.
#[derive(Debug)]
pub struct IngredientEstimate {
    pub keywords: &'static [&'static str],
    pub weight: &'static str,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub vitamins: &'static [(&'static str, f64)],
    pub minerals: &'static [(&'static str, f64)],
}

impl IngredientEstimate {
    pub fn micronutrients(&self) -> NutrientSet {
        NutrientSet::from_pairs(self.vitamins, self.minerals, &[])
    }
}

/// Order matters: `"rice noodles"` is pasta, `"pineapple"` is not an apple.
const INGREDIENT_TABLE: &[IngredientEstimate] = &[
    IngredientEstimate {
        keywords: &["pasta", "noodle", "spaghetti"],
        weight: "100g",
        calories: 200.0,
        protein: 7.5,
        fat: 1.1,
        carbs: 43.2,
        vitamins: &[("b1", 0.2), ("b2", 0.1), ("b3", 1.7), ("b6", 0.1), ("folate", 18.0)],
        minerals: &[
            ("iron", 1.8),
            ("magnesium", 53.0),
            ("phosphorus", 189.0),
            ("zinc", 1.3),
            ("selenium", 63.2),
            ("potassium", 223.0),
        ],
    },
    IngredientEstimate {
        keywords: &["rice"],
        weight: "100g",
        calories: 130.0,
        protein: 2.7,
        fat: 0.3,
        carbs: 28.2,
        vitamins: &[("b1", 0.1), ("b3", 1.6), ("b6", 0.15), ("folate", 8.0)],
        minerals: &[
            ("iron", 0.4),
            ("magnesium", 25.0),
            ("phosphorus", 115.0),
            ("zinc", 1.2),
            ("selenium", 15.1),
            ("potassium", 115.0),
        ],
    },
    IngredientEstimate {
        keywords: &["watermelon"],
        weight: "100g",
        calories: 30.0,
        protein: 0.6,
        fat: 0.2,
        carbs: 7.6,
        vitamins: &[("a", 569.0), ("c", 8.1), ("b6", 0.045), ("b1", 0.033)],
        minerals: &[("potassium", 112.0), ("magnesium", 10.0), ("phosphorus", 11.0), ("zinc", 0.1)],
    },
    IngredientEstimate {
        keywords: &["pineapple"],
        weight: "100g",
        calories: 50.0,
        protein: 0.5,
        fat: 0.1,
        carbs: 13.1,
        vitamins: &[("c", 47.8), ("b1", 0.079), ("b6", 0.112), ("folate", 18.0)],
        minerals: &[("manganese", 0.927), ("copper", 110.0), ("potassium", 109.0), ("magnesium", 12.0)],
    },
    IngredientEstimate {
        keywords: &["chicken"],
        weight: "100g",
        calories: 165.0,
        protein: 31.0,
        fat: 3.6,
        carbs: 0.0,
        vitamins: &[("b3", 13.7), ("b6", 0.6), ("b12", 0.3)],
        minerals: &[("phosphorus", 228.0), ("potassium", 256.0), ("selenium", 27.6), ("zinc", 1.0)],
    },
    IngredientEstimate {
        keywords: &["salmon"],
        weight: "100g",
        calories: 208.0,
        protein: 20.0,
        fat: 13.0,
        carbs: 0.0,
        vitamins: &[("d", 526.0), ("b12", 3.2), ("b6", 0.6)],
        minerals: &[("selenium", 36.5), ("potassium", 363.0), ("phosphorus", 240.0)],
    },
    IngredientEstimate {
        keywords: &["egg"],
        weight: "50g",
        calories: 72.0,
        protein: 6.3,
        fat: 4.8,
        carbs: 0.4,
        vitamins: &[("a", 80.0), ("d", 41.0), ("b12", 0.45)],
        minerals: &[("selenium", 15.4), ("phosphorus", 99.0), ("iron", 0.9)],
    },
    IngredientEstimate {
        keywords: &["broccoli"],
        weight: "100g",
        calories: 34.0,
        protein: 2.8,
        fat: 0.4,
        carbs: 6.6,
        vitamins: &[("c", 89.2), ("k", 101.6), ("folate", 63.0)],
        minerals: &[("potassium", 316.0), ("calcium", 47.0), ("iron", 0.7)],
    },
    IngredientEstimate {
        keywords: &["bread", "toast"],
        weight: "30g",
        calories: 80.0,
        protein: 2.7,
        fat: 1.0,
        carbs: 15.0,
        vitamins: &[("b1", 0.1), ("folate", 25.0)],
        minerals: &[("sodium", 150.0), ("iron", 0.9)],
    },
    IngredientEstimate {
        keywords: &["potato"],
        weight: "150g",
        calories: 130.0,
        protein: 3.0,
        fat: 0.2,
        carbs: 30.0,
        vitamins: &[("c", 19.7), ("b6", 0.4)],
        minerals: &[("potassium", 535.0), ("magnesium", 33.0)],
    },
];

pub fn lookup_estimate(name: &str) -> Option<&'static IngredientEstimate> {
    let lower = name.to_lowercase();
    INGREDIENT_TABLE
        .iter()
        .find(|entry| entry.keywords.iter().any(|k| lower.contains(k)))
}

/// Pieces of an ingredient label such as `"Pasta (100g) 200kcal"`.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientLabel {
    pub name: String,
    pub weight: Option<String>,
    pub calories: Option<f64>,
}

pub fn parse_label(label: &str) -> IngredientLabel {
    let label = label.trim();
    let weight = WEIGHT_PATTERN
        .as_ref()
        .and_then(|re| re.captures(label))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string());
    let calories = KCAL_PATTERN
        .as_ref()
        .and_then(|re| re.captures(label))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok());

    let name = if weight.is_some() {
        label.split('(').next().unwrap_or(label).trim().to_string()
    } else {
        label.to_string()
    };

    IngredientLabel {
        name,
        weight,
        calories,
    }
}

/// Fallback portion for ingredients the table does not know.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicProfile {
    pub fallback_weight: &'static str,
    pub fallback_calories: f64,
}

impl HeuristicProfile {
    pub fn standard() -> Self {
        Self {
            fallback_weight: "30g",
            fallback_calories: 75.0,
        }
    }

    pub fn light() -> Self {
        Self {
            fallback_weight: "15g",
            fallback_calories: 30.0,
        }
    }

    /// Builds the ingredient line and breakdown for a free-form label.
    ///
    /// Weight and calories embedded in the label are kept. Missing values come
    /// from the ingredient table, then from this profile's fallback portion.
    /// Macros are the table's when the calories are the table's, otherwise the
    /// calories are split by the matching [`MacroShare`]. `broadcast` maps win
    /// over the table's micronutrients when non-empty.
    pub fn estimate(&self, label: &str, broadcast: &NutrientSet) -> IngredientLine {
        let parsed = parse_label(label);
        let known = lookup_estimate(&parsed.name);

        let weight = parsed
            .weight
            .clone()
            .or_else(|| known.map(|k| k.weight.to_string()))
            .unwrap_or_else(|| self.fallback_weight.to_string());

        let (calories, (protein, fat, carbs)) = match (parsed.calories, known) {
            (Some(calories), _) => (calories, share_for(&parsed.name).split(calories)),
            (None, Some(k)) => (k.calories, (k.protein, k.fat, k.carbs)),
            (None, None) => {
                let calories = self.fallback_calories;
                (calories, share_for(&parsed.name).split(calories))
            }
        };

        let mut micros = known.map(IngredientEstimate::micronutrients).unwrap_or_default();
        if !broadcast.vitamins.is_empty() {
            micros.vitamins = broadcast.vitamins.clone();
        }
        if !broadcast.minerals.is_empty() {
            micros.minerals = broadcast.minerals.clone();
        }
        if !broadcast.other_nutrients.is_empty() {
            micros.other_nutrients = broadcast.other_nutrients.clone();
        }

        let label = if parsed.weight.is_some() && parsed.calories.is_some() {
            label.trim().to_string()
        } else {
            format!("{} ({}) {}kcal", parsed.name, weight, calories)
        };

        let mut breakdown = IngredientMacro {
            name: Some(parsed.name),
            amount: Some(weight),
            calories: Some(calories),
            protein,
            fat,
            carbs,
            ..Default::default()
        };
        micros.apply_to_ingredient(&mut breakdown);

        IngredientLine { label, breakdown }
    }
}

/// The record returned when nothing usable could be extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultRecord {
    pub meal_name: &'static str,
    pub placeholder_label: &'static str,
    pub placeholder_macros: (f64, f64, f64),
    pub totals: MacroTotals,
    /// Substituted for zero sums when totals come from free-text lines.
    pub line_totals: MacroTotals,
    pub vitamin_c: f64,
    pub health_score: HealthScore,
}

impl DefaultRecord {
    pub fn detailed() -> Self {
        Self {
            meal_name: "Mixed Meal",
            placeholder_label: "Mixed ingredients (100g) 200kcal",
            placeholder_macros: (10.0, 7.0, 30.0),
            totals: MacroTotals::new(500.0, 20.0, 15.0, 60.0),
            line_totals: MacroTotals::new(500.0, 15.0, 10.0, 20.0),
            vitamin_c: 2.0,
            health_score: HealthScore::from_raw(6.0),
        }
    }

    pub fn compact() -> Self {
        Self {
            totals: MacroTotals::new(500.0, 15.0, 10.0, 20.0),
            health_score: HealthScore::from_raw(5.0),
            ..Self::detailed()
        }
    }

    fn placeholder_micros() -> NutrientSet {
        NutrientSet::from_pairs(
            &[("c", 2.0), ("a", 100.0), ("b1", 0.1), ("b2", 0.2)],
            &[("calcium", 30.0), ("iron", 1.2), ("potassium", 150.0), ("magnesium", 20.0)],
            &[],
        )
    }

    /// Placeholder ingredient; `seed` maps replace the built-in micronutrients when present.
    pub fn placeholder_line(&self, seed: &NutrientSet) -> IngredientLine {
        let parsed = parse_label(self.placeholder_label);
        let (protein, fat, carbs) = self.placeholder_macros;

        let mut micros = Self::placeholder_micros();
        if !seed.vitamins.is_empty() {
            micros.vitamins = seed.vitamins.clone();
        }
        if !seed.minerals.is_empty() {
            micros.minerals = seed.minerals.clone();
        }

        let mut breakdown = IngredientMacro {
            name: Some(parsed.name),
            amount: parsed.weight,
            calories: parsed.calories,
            protein,
            fat,
            carbs,
            ..Default::default()
        };
        micros.apply_to_ingredient(&mut breakdown);

        IngredientLine {
            label: self.placeholder_label.to_string(),
            breakdown,
        }
    }

    pub fn build(&self, seed: NutrientSet) -> NutritionRecord {
        let line = self.placeholder_line(&seed);
        let mut record = NutritionRecord::new(self.meal_name, vec![line], self.totals, self.health_score);
        record.vitamin_c = Some(self.vitamin_c);
        seed.apply_to_record(&mut record);
        record
    }
}

/// `clamp(round((protein*0.5 + vitaminC*0.3) / (fat*0.3 + calories/100)), 1, 10)`.
pub fn linear_health_score(totals: &MacroTotals, vitamin_c: f64) -> HealthScore {
    let denominator = totals.fat * 0.3 + totals.calories / 100.0;
    if denominator <= 0.0 {
        return HealthScore::NEUTRAL;
    }
    HealthScore::from_raw((totals.protein * 0.5 + vitamin_c * 0.3) / denominator)
}

const HEALTHY_GROUPS: &[&[&str]] = &[
    // vegetables
    &[
        "vegetable", "broccoli", "spinach", "kale", "lettuce", "salad", "carrot", "tomato",
        "pepper", "cucumber", "zucchini", "cabbage",
    ],
    // whole grains
    &[
        "whole grain", "whole wheat", "wholemeal", "brown rice", "oat", "oatmeal", "quinoa", "barley",
        "bulgur",
    ],
    // lean protein
    &["chicken", "turkey", "fish", "salmon", "tuna", "lentil", "bean", "tofu", "chickpea"],
    // healthy fats
    &["olive oil", "avocado", "almond", "walnut", "nuts", "seed"],
];

const UNHEALTHY_GROUPS: &[&[&str]] = &[
    // fried
    &["fried", "fries", "deep-fried", "crispy", "tempura"],
    // added sugar
    &["sugar", "syrup", "candy", "soda", "sweetened", "cake", "cookie", "donut"],
    // cream, butter, cheese
    &["cream", "butter", "cheese", "mayonnaise"],
    // processed meat
    &["bacon", "sausage", "salami", "ham", "pepperoni", "hot dog"],
];

/// One whole-word pattern per group, plurals included, so "pepperoni" is not a
/// pepper and "graham" is not ham.
fn group_patterns(groups: &[&[&str]]) -> Vec<Regex> {
    groups
        .iter()
        .filter_map(|group| {
            let alternatives: Vec<String> = group.iter().map(|k| regex::escape(k)).collect();
            Regex::new(&format!(r"\b(?:{})(?:e?s)?\b", alternatives.join("|"))).ok()
        })
        .collect()
}

static HEALTHY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| group_patterns(HEALTHY_GROUPS));
static UNHEALTHY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| group_patterns(UNHEALTHY_GROUPS));

/// Base 5, +1 per healthy group matched, -1 per unhealthy group matched.
pub fn keyword_health_score<S: AsRef<str>>(ingredients: &[S]) -> HealthScore {
    let text = ingredients
        .iter()
        .map(|s| s.as_ref().to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    let matched = |patterns: &[Regex]| patterns.iter().filter(|re| re.is_match(&text)).count() as f64;

    HealthScore::from_raw(5.0 + matched(&HEALTHY_PATTERNS) - matched(&UNHEALTHY_PATTERNS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_for_keywords() {
        assert_eq!(share_for("Grilled Chicken"), MacroShare::new(0.6, 0.4, 0.0));
        assert_eq!(share_for("Olive oil"), MacroShare::new(0.1, 0.8, 0.1));
        assert_eq!(share_for("Brown rice"), MacroShare::new(0.1, 0.05, 0.85));
        assert_eq!(share_for("Banana"), MacroShare::new(0.05, 0.05, 0.9));
        assert_eq!(share_for("Tofu"), DEFAULT_SHARE);
    }

    #[test]
    fn test_split_uses_calorie_densities() {
        // 200 kcal pasta: 10% protein, 5% fat, 85% carbs
        let (protein, fat, carbs) = share_for("pasta").split(200.0);
        assert_eq!(protein, 5.0);
        assert_eq!(fat, 1.1);
        assert_eq!(carbs, 42.5);
    }

    #[test]
    fn test_parse_label() {
        let parsed = parse_label("Pasta (100g) 200kcal");
        assert_eq!(parsed.name, "Pasta");
        assert_eq!(parsed.weight.as_deref(), Some("100g"));
        assert_eq!(parsed.calories, Some(200.0));

        let bare = parse_label(" rice ");
        assert_eq!(bare.name, "rice");
        assert_eq!(bare.weight, None);
        assert_eq!(bare.calories, None);
    }

    #[test]
    fn test_estimate_known_ingredient_without_numbers() {
        let line = HeuristicProfile::standard().estimate("rice", &NutrientSet::default());

        assert_eq!(line.label, "rice (100g) 130kcal");
        assert_eq!(line.breakdown.calories, Some(130.0));
        assert_eq!(line.breakdown.carbs, 28.2);
        assert_eq!(line.breakdown.vitamins["vitamin_b1"].amount, 0.1);
        assert_eq!(line.breakdown.minerals["selenium"].unit, "mcg");
    }

    #[test]
    fn test_estimate_unknown_ingredient_uses_profile_fallback() {
        let standard = HeuristicProfile::standard().estimate("tofu", &NutrientSet::default());
        assert_eq!(standard.label, "tofu (30g) 75kcal");
        assert_eq!(standard.breakdown.protein, 3.8);
        assert_eq!(standard.breakdown.fat, 2.5);
        assert_eq!(standard.breakdown.carbs, 9.4);

        let light = HeuristicProfile::light().estimate("tofu", &NutrientSet::default());
        assert_eq!(light.label, "tofu (15g) 30kcal");
    }

    #[test]
    fn test_estimate_keeps_label_numbers_and_broadcasts_maps() {
        let broadcast = NutrientSet::from_pairs(&[("vitamin_c", 12.0)], &[], &[]);
        let line = HeuristicProfile::standard().estimate("Beef steak (150g) 300kcal", &broadcast);

        assert_eq!(line.label, "Beef steak (150g) 300kcal");
        assert_eq!(line.breakdown.protein, 45.0);
        assert_eq!(line.breakdown.fat, 13.3);
        assert_eq!(line.breakdown.carbs, 0.0);
        assert_eq!(line.breakdown.vitamins["vitamin_c"].amount, 12.0);
    }

    #[test]
    fn test_default_records() {
        let detailed = DefaultRecord::detailed().build(NutrientSet::default());
        assert_eq!(detailed.meal_name, "Mixed Meal");
        assert_eq!(detailed.ingredients(), ["Mixed ingredients (100g) 200kcal"]);
        assert_eq!(detailed.health_score.to_string(), "6/10");
        assert_eq!(detailed.ingredient_macros()[0].vitamins["vitamin_c"].amount, 2.0);

        let compact = DefaultRecord::compact().build(NutrientSet::default());
        assert_eq!(compact.health_score.to_string(), "5/10");
        assert_eq!(compact.protein, 15.0);
    }

    #[test]
    fn test_linear_health_score() {
        let totals = MacroTotals::new(350.0, 40.0, 8.0, 30.0);
        assert_eq!(linear_health_score(&totals, 0.0).value(), 3);
        assert_eq!(linear_health_score(&MacroTotals::default(), 0.0), HealthScore::NEUTRAL);
        let lean = MacroTotals::new(100.0, 60.0, 1.0, 0.0);
        assert_eq!(linear_health_score(&lean, 0.0).value(), 10);
    }

    #[test]
    fn test_keyword_health_score() {
        let healthy = keyword_health_score(&["Grilled chicken", "Broccoli", "Brown rice"]);
        assert_eq!(healthy.value(), 8);

        let unhealthy = keyword_health_score(&["Fried chicken", "Fries", "Cheese sauce", "Soda"]);
        assert_eq!(unhealthy.value(), 3);

        let empty: [&str; 0] = [];
        assert_eq!(keyword_health_score(&empty), HealthScore::NEUTRAL);
    }

    #[test]
    fn test_keywords_match_whole_words() {
        assert_eq!(keyword_health_score(&["Pepperoni pizza"]).value(), 4);
        assert_eq!(keyword_health_score(&["Butternut squash soup"]).value(), 5);
        assert_eq!(keyword_health_score(&["Graham crackers"]).value(), 5);
        assert_eq!(keyword_health_score(&["Roasted peppers", "Cherry tomatoes"]).value(), 6);
        assert_eq!(keyword_health_score(&["Oatmeal", "Almonds"]).value(), 7);
    }
}
