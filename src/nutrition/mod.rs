pub mod chunker;
pub mod document;
pub mod heuristics;
pub mod keys;
pub mod normalizer;
pub mod nutrients;
pub mod parser;
pub mod units;

use std::str::FromStr;

pub use chunker::chunk_words;
pub use document::canonicalize_document;
pub use heuristics::{DefaultRecord, HeuristicProfile};
pub use normalizer::FormatNormalizer;
pub use parser::{parse, parse_json};

use crate::models::NutritionRecord;

/// Which pair of heuristic profile and default record the image route uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackProfile {
    #[default]
    Detailed,
    Compact,
}

impl FallbackProfile {
    pub fn heuristics(self) -> HeuristicProfile {
        match self {
            FallbackProfile::Detailed => HeuristicProfile::standard(),
            FallbackProfile::Compact => HeuristicProfile::light(),
        }
    }

    pub fn defaults(self) -> DefaultRecord {
        match self {
            FallbackProfile::Detailed => DefaultRecord::detailed(),
            FallbackProfile::Compact => DefaultRecord::compact(),
        }
    }
}

impl FromStr for FallbackProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "detailed" => Ok(FallbackProfile::Detailed),
            "compact" => Ok(FallbackProfile::Compact),
            other => Err(format!("unknown fallback profile '{}'", other)),
        }
    }
}

/// Raw model output in, client-shaped meal record out. Never fails.
#[derive(Debug, Clone)]
pub struct Pipeline {
    normalizer: FormatNormalizer,
}

impl Pipeline {
    pub fn new(profile: FallbackProfile) -> Self {
        Self {
            normalizer: FormatNormalizer::new(profile.heuristics(), profile.defaults()),
        }
    }

    pub fn analyze(&self, raw: &str) -> NutritionRecord {
        let record = self.normalizer.normalize(parse(raw));
        log::info!(
            "🍽️ Normalized meal '{}' with {} ingredient(s), {} kcal, health {}",
            record.meal_name,
            record.ingredients().len(),
            record.calories,
            record.health_score
        );
        record
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(FallbackProfile::default())
    }
}
