//! Locale word lists used to recognize section boundaries in OCR text.
//!
//! Music apps group their history by date: "12 janvier 2025 à 14:30",
//! "hier", "lundi", "22:59".  Those tokens are what the normalizer turns
//! into separators, so they must match the language of the screenshots.

use serde::{Deserialize, Serialize};

/// Month, weekday and relative-day vocabulary for one language.
///
/// All words must be lowercase, since the normalizer case-folds its input
/// before matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locale {
    /// Twelve month names, January first.
    pub months: Vec<String>,
    /// Words such as "yesterday" and "today".
    #[serde(default)]
    pub relative_days: Vec<String>,
    /// Seven weekday names.
    #[serde(default)]
    pub weekdays: Vec<String>,
    /// Single glyphs that may sit between a date and its clock time
    /// ("12 janvier à 14:30").
    #[serde(default)]
    pub connectors: Vec<String>,
}

impl Locale {
    /// French, as shown by the screenshots the built-in noise catalogue
    /// was written for.
    pub fn french() -> Self {
        Locale {
            months: words(&[
                "janvier", "février", "mars", "avril", "mai", "juin",
                "juillet", "août", "septembre", "octobre", "novembre", "décembre",
            ]),
            relative_days: words(&["hier", "aujourd'hui", "aujourd’hui"]),
            weekdays: words(&[
                "lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi", "dimanche",
            ]),
            connectors: words(&["a", "&", "à"]),
        }
    }

    /// English month and weekday names.
    pub fn english() -> Self {
        Locale {
            months: words(&[
                "january", "february", "march", "april", "may", "june",
                "july", "august", "september", "october", "november", "december",
            ]),
            relative_days: words(&["yesterday", "today"]),
            weekdays: words(&[
                "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
            ]),
            connectors: words(&["at", "&", ","]),
        }
    }

    /// Look up a built-in locale by its short code ("fr", "en").
    pub fn by_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "fr" | "fra" | "french" => Some(Self::french()),
            "en" | "eng" | "english" => Some(Self::english()),
            _ => None,
        }
    }

    /// Relative days followed by weekdays, in that order.
    pub fn day_words(&self) -> impl Iterator<Item = &str> {
        self.relative_days
            .iter()
            .chain(self.weekdays.iter())
            .map(|s| s.as_str())
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::french()
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_french_has_full_calendar() {
        let fr = Locale::french();
        assert_eq!(fr.months.len(), 12);
        assert_eq!(fr.weekdays.len(), 7);
        assert_eq!(fr.months[7], "août");
    }

    #[test]
    fn test_by_code() {
        assert_eq!(Locale::by_code("FR"), Some(Locale::french()));
        assert_eq!(Locale::by_code("en"), Some(Locale::english()));
        assert_eq!(Locale::by_code("de"), None);
    }

    #[test]
    fn test_day_words_order() {
        let fr = Locale::french();
        let days: Vec<&str> = fr.day_words().collect();
        assert_eq!(days.first(), Some(&"hier"));
        assert_eq!(days.last(), Some(&"dimanche"));
        assert_eq!(days.len(), 10);
    }

    #[test]
    fn test_locale_from_toml() {
        let toml_str = r#"
            months = ["enero", "febrero"]
            weekdays = ["lunes"]
        "#;
        let locale: Locale = toml::from_str(toml_str).unwrap();
        assert_eq!(locale.months, vec!["enero", "febrero"]);
        assert!(locale.relative_days.is_empty());
        assert!(locale.connectors.is_empty());
    }
}
