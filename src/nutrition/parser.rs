use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use super::nutrients::NutrientSet;
use super::units::NutrientCategory;
use crate::models::parse_amount;

static FENCED_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").ok());
static BRACE_SPAN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").ok());
static VITAMIN_MENTION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)vitamin ([a-z])\s*:\s*([\d.]+)").ok());
static MINERAL_MENTION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)(iron|calcium|zinc|magnesium|potassium|sodium)\s*:\s*([\d.]+)").ok()
});

const TEXT_SENTINELS: &[&str] = &["Food item", "FOOD ANALYSIS RESULTS"];

/// What the parser managed to recover from raw model output.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCandidate {
    /// A JSON object, found directly or inside fences/braces.
    Json(Map<String, Value>),
    /// Values accumulated from a line-oriented text report.
    Lines(LineReport),
    /// Nothing usable; only micronutrient mentions scanned from the text.
    Unrecognized(NutrientSet),
}

/// Accumulated values from a `FOOD ANALYSIS RESULTS` style report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineReport {
    pub meal_name: Option<String>,
    pub ingredients: Vec<String>,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub vitamin_c: f64,
    pub mentions: NutrientSet,
}

/// Tries, in order: direct JSON, fenced block or brace span, line report,
/// then gives up with an [`RawCandidate::Unrecognized`]. Never fails.
pub fn parse(raw: &str) -> RawCandidate {
    if let Some(object) = parse_object(raw) {
        log::debug!("Parsed model output as JSON directly");
        return RawCandidate::Json(object);
    }

    if let Some(object) = extract_embedded_json(raw) {
        log::debug!("Extracted JSON embedded in model output");
        return RawCandidate::Json(object);
    }

    parse_text(raw)
}

/// Steps 1-2 only: the routes that must return JSON use this and treat `None` as an error.
pub fn parse_json(raw: &str) -> Option<Map<String, Value>> {
    parse_object(raw).or_else(|| extract_embedded_json(raw))
}

/// Steps 3-4 on plain text.
pub fn parse_text(raw: &str) -> RawCandidate {
    let mentions = scan_mentions(raw);

    if TEXT_SENTINELS.iter().any(|s| raw.contains(s)) {
        log::debug!("Model output looks like a line report");
        let mut report = extract_lines(raw);
        report.mentions = mentions;
        return RawCandidate::Lines(report);
    }

    log::warn!(
        "No JSON or known text layout in model output: {}",
        truncate(raw, 100)
    );
    RawCandidate::Unrecognized(mentions)
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

fn extract_embedded_json(raw: &str) -> Option<Map<String, Value>> {
    let fenced = FENCED_BLOCK
        .as_ref()
        .and_then(|re| re.captures(raw))
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_object(m.as_str()));
    if fenced.is_some() {
        return fenced;
    }

    BRACE_SPAN
        .as_ref()
        .and_then(|re| re.find(raw))
        .and_then(|m| parse_object(&m.as_str().replace("```json", "").replace("```", "")))
}

fn labelled_amount(line: &str, label: &str) -> Option<f64> {
    line.strip_prefix(label).and_then(parse_amount)
}

/// Every matching line adds to the running totals, not just the first.
fn extract_lines(raw: &str) -> LineReport {
    let mut report = LineReport {
        meal_name: raw.lines().find_map(|line| {
            line.split_once("Food item 1:")
                .map(|(_, name)| name.trim().to_string())
                .filter(|name| !name.is_empty())
        }),
        ..Default::default()
    };

    for line in raw.lines().map(str::trim) {
        if let Some(list) = line.strip_prefix("Ingredients:") {
            report.ingredients.extend(
                list.split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(String::from),
            );
        } else if let Some(v) = labelled_amount(line, "Calories:") {
            report.calories += v;
        } else if let Some(v) = labelled_amount(line, "Protein:") {
            report.protein += v;
        } else if let Some(v) = labelled_amount(line, "Fat:") {
            report.fat += v;
        } else if let Some(v) = labelled_amount(line, "Carbs:") {
            report.carbs += v;
        } else if let Some(v) = labelled_amount(line, "Vitamin C:") {
            report.vitamin_c += v;
        }
    }

    report
}

/// Picks up `vitamin x: 12` and `iron: 3` style mentions anywhere in the text.
pub fn scan_mentions(raw: &str) -> NutrientSet {
    let mut set = NutrientSet::default();

    let patterns = [
        (VITAMIN_MENTION.as_ref(), NutrientCategory::Vitamin),
        (MINERAL_MENTION.as_ref(), NutrientCategory::Mineral),
    ];
    for (pattern, category) in patterns {
        let Some(re) = pattern else {
            continue;
        };
        for caps in re.captures_iter(raw) {
            let (Some(name), Some(value)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            if let Ok(amount) = value.as_str().parse::<f64>() {
                set.insert(category, name.as_str(), amount);
            }
        }
    }

    set
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_json() {
        let raw = r#"{"meal_name":"Pasta Meal","calories":200}"#;
        match parse(raw) {
            RawCandidate::Json(object) => assert_eq!(object["meal_name"], "Pasta Meal"),
            other => panic!("expected JSON, got {:?}", other),
        }
    }

    #[test]
    fn test_fenced_json() {
        let raw = "Here is the analysis:\n```json\n{\"meal_name\": \"Salad\"}\n```\nEnjoy!";
        match parse(raw) {
            RawCandidate::Json(object) => assert_eq!(object["meal_name"], "Salad"),
            other => panic!("expected JSON, got {:?}", other),
        }
    }

    #[test]
    fn test_brace_span_json() {
        let raw = "Sure! {\"meal\": [{\"dish\": \"Soup\"}]} Let me know.";
        match parse(raw) {
            RawCandidate::Json(object) => assert!(object["meal"].is_array()),
            other => panic!("expected JSON, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_json_falls_through() {
        assert_eq!(parse("42"), RawCandidate::Unrecognized(NutrientSet::default()));
    }

    #[test]
    fn test_line_report_sums_every_line() {
        let raw = "FOOD ANALYSIS RESULTS\n\
                   Food item 1: Grilled Chicken\n\
                   Ingredients: chicken, rice\n\
                   Calories: 350\n\
                   Protein: 40\n\
                   Fat: 8\n\
                   Carbs: 30\n\
                   Vitamin C: 0\n\
                   Food item 2: Salad\n\
                   Ingredients: lettuce\n\
                   Calories: 50 kcal\n\
                   Protein: 2g";

        let RawCandidate::Lines(report) = parse(raw) else {
            panic!("expected line report");
        };

        assert_eq!(report.meal_name.as_deref(), Some("Grilled Chicken"));
        assert_eq!(report.ingredients, vec!["chicken", "rice", "lettuce"]);
        assert_eq!(report.calories, 400.0);
        assert_eq!(report.protein, 42.0);
        assert_eq!(report.fat, 8.0);
        assert_eq!(report.carbs, 30.0);
        assert_eq!(report.mentions.vitamins["vitamin_c"].amount, 0.0);
    }

    #[test]
    fn test_unrecognized_text_keeps_mentions() {
        let raw = "I cannot analyze this image. Iron: 2.5 maybe?";
        let RawCandidate::Unrecognized(mentions) = parse(raw) else {
            panic!("expected unrecognized");
        };
        assert_eq!(mentions.minerals["iron"].amount, 2.5);

        assert_eq!(
            parse("I cannot analyze this image."),
            RawCandidate::Unrecognized(NutrientSet::default())
        );
    }

    #[test]
    fn test_parse_never_panics_on_odd_input() {
        for raw in ["", "{", "}{", "```", "```json\n{bad}\n```", "Food item", "\u{1F355}{\"a\":"] {
            let _ = parse(raw);
        }
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé...");
        assert_eq!(truncate("hi", 10), "hi");
    }
}
