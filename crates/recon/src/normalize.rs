//! SKU key canonicalization shared by every join in the pipeline.

use crate::config::KeyConfig;
use crate::model::NormalizedKey;

#[derive(Debug, Clone)]
pub struct KeyNormalizer {
    strip_chars: Vec<char>,
    case_fold: bool,
}

impl KeyNormalizer {
    pub fn new(config: &KeyConfig) -> Self {
        Self {
            strip_chars: config.strip_chars.chars().collect(),
            case_fold: config.case_fold,
        }
    }

    /// Trimmed and stray-stripped, case preserved. Used as the report's SKU text.
    pub fn display(&self, raw: &str) -> String {
        raw.chars()
            .filter(|c| !self.strip_chars.contains(c))
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// Keys that differ only by surrounding whitespace, case, or stray
    /// characters normalize identically. Blank input yields `NormalizedKey::Empty`.
    pub fn normalize(&self, raw: &str) -> NormalizedKey {
        let cleaned = self.display(raw);
        if cleaned.is_empty() {
            return NormalizedKey::Empty;
        }
        if self.case_fold {
            NormalizedKey::Sku(cleaned.to_lowercase())
        } else {
            NormalizedKey::Sku(cleaned)
        }
    }
}

impl Default for KeyNormalizer {
    fn default() -> Self {
        Self::new(&KeyConfig::default())
    }
}
