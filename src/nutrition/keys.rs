use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s+").ok());
static VITAMIN_KEY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^vitamin[\s_]*([a-z0-9]+)$").ok());
static BARE_VITAMIN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-e]\d{0,2}$|^k\d?$").ok());

/// Canonical nutrient key: lowercase, whitespace runs replaced by `_`, and
/// `"Vitamin C"` style names rewritten to `vitamin_c`.
pub fn normalize_key(key: &str) -> String {
    let lowered = key.trim().to_lowercase();

    if let Some(caps) = VITAMIN_KEY.as_ref().and_then(|re| re.captures(&lowered)) {
        if let Some(suffix) = caps.get(1) {
            return format!("vitamin_{}", suffix.as_str());
        }
    }

    match WHITESPACE.as_ref() {
        Some(re) => re.replace_all(&lowered, "_").into_owned(),
        None => lowered.split_whitespace().collect::<Vec<_>>().join("_"),
    }
}

/// Like [`normalize_key`], but also expands bare vitamin letters (`c`, `b12`)
/// that only make sense inside a vitamins map.
pub fn normalize_vitamin_key(key: &str) -> String {
    let normalized = normalize_key(key);
    let is_bare = BARE_VITAMIN
        .as_ref()
        .map(|re| re.is_match(&normalized))
        .unwrap_or(false);

    if is_bare {
        format!("vitamin_{}", normalized)
    } else {
        normalized
    }
}
