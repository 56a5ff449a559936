//! Noise catalogue: ordered regex rules for OCR artifacts of app chrome.
//!
//! Menu icons, tab headers and banners come out of OCR as short garbage
//! sequences ("< titres n q 3x", "® ul = @").  Each rule either deletes its
//! match or, for boundary-like chrome, replaces it with the separator.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("separator must not be empty")]
    EmptySeparator,
    #[error("locale has no month names")]
    NoMonths,
}

/// What to do with text matched by a rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    /// Delete the match.
    #[default]
    Remove,
    /// Replace the match with the canonical separator.
    Separate,
}

/// One catalogue entry, matched against lowercased text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRule {
    pub pattern: String,
    #[serde(default)]
    pub action: RuleAction,
}

impl PatternRule {
    pub fn remove(pattern: &str) -> Self {
        PatternRule { pattern: pattern.to_string(), action: RuleAction::Remove }
    }

    pub fn separate(pattern: &str) -> Self {
        PatternRule { pattern: pattern.to_string(), action: RuleAction::Separate }
    }
}

/// Ordered list of rules.  Order matters: `\.` deleting every dot must
/// run after `x\s*\.` has had its chance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoiseCatalogue {
    pub rules: Vec<PatternRule>,
}

impl NoiseCatalogue {
    pub fn new(rules: Vec<PatternRule>) -> Self {
        NoiseCatalogue { rules }
    }

    /// Artifacts seen on French music-app history screens.
    pub fn french_music_app() -> Self {
        let patterns = [
            r"n\s*ol\s*>\s*&",
            r"<\s*titres\s*n\s*q\s*3x",
            r"x\s*\n\s*<",
            r"mai\s+2025",
            r"titres\s*ab\s*©\s*\)\s*re",
            r"x\s*\.",
            r"<\s*titres\s*\(>\)\s*©\s*\)\s*be",
            r"®\s*ul\s*=\s*@",
            r"4\s*titres\s*ab\s*©\s*\)\s*b=",
            r"\.",
            r"r¢\s*titres\s*an\s*\)",
            r"la\s*semaine\s*derniére",
            r"titres\s*n\s*q\s*3=",
        ];
        NoiseCatalogue::new(patterns.iter().map(|p| PatternRule::remove(p)).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Append rules from another catalogue after the existing ones.
    pub fn extend(&mut self, other: &NoiseCatalogue) {
        self.rules.extend(other.rules.iter().cloned());
    }

    /// Compile every rule, failing on the first invalid pattern.
    pub fn compile(&self) -> Result<Vec<CompiledRule>, CatalogueError> {
        self.rules
            .iter()
            .map(|rule| {
                let regex = Regex::new(&rule.pattern).map_err(|source| {
                    CatalogueError::InvalidPattern { pattern: rule.pattern.clone(), source }
                })?;
                Ok(CompiledRule { regex, action: rule.action })
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub regex: Regex,
    pub action: RuleAction,
}
