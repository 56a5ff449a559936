//! Noise normalizer for OCR text of music-app history screens.
//!
//! Turns raw OCR output into lowercase text where every recognized section
//! boundary (a date, a clock time, a weekday) has become one canonical
//! separator and UI chrome has been deleted.  The result feeds
//! [`crate::parser::parse_with_separator`].
//!
//! Stages run in a fixed order, each one relying on the previous:
//!
//! 1. case-fold (existing separators are kept as they are)
//! 2. delete catalogue noise
//! 3. dates, clock times and day words become separators
//! 4. drop numeric remnants of half-matched dates in front of a separator
//! 5. collapse blank lines and separator runs, strip edge separators
//! 6. trim

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

use crate::catalogue::{CatalogueError, CompiledRule, NoiseCatalogue, RuleAction};
use crate::locale::Locale;
use crate::parser::{self, SongRecord};

/// Separator used by the built-in configuration.
pub const DEFAULT_SEPARATOR: &str = "---NEW_SECTION---";

/// Everything the normalizer depends on, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Delete 1-2 digit remnants right before a separator.  Also eats
    /// trailing numbers of titles ("blink 182"), hence the switch.
    #[serde(default = "default_true")]
    pub strip_remnants: bool,

    /// Also treat a month without a day as a date, provided a year or a
    /// clock time follows it on the same line ("janvier 2025 14:30").
    #[serde(default = "default_true")]
    pub dayless_dates: bool,

    #[serde(default)]
    pub locale: Locale,

    /// Replaces the built-in catalogue when present.
    #[serde(default = "NoiseCatalogue::french_music_app")]
    pub noise: NoiseCatalogue,

    /// Appended after `noise`.
    #[serde(default, skip_serializing_if = "NoiseCatalogue::is_empty")]
    pub extra_noise: NoiseCatalogue,
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        NormalizerConfig {
            separator: default_separator(),
            strip_remnants: true,
            dayless_dates: true,
            locale: Locale::french(),
            noise: NoiseCatalogue::french_music_app(),
            extra_noise: NoiseCatalogue::default(),
        }
    }
}

impl NormalizerConfig {
    /// Parse a TOML document holding a bare normalizer configuration.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Compiled normalizer.  Immutable, so one instance can be shared between
/// threads processing different screenshots.
#[derive(Debug, Clone)]
pub struct Normalizer {
    separator: String,
    noise: Vec<CompiledRule>,
    full_date: Regex,
    clock_time: Regex,
    day_words: Option<Regex>,
    remnant: Option<Regex>,
    blank_lines: Regex,
    separator_run: Regex,
    leading_separator: Regex,
    trailing_separator: Regex,
}

static FRENCH: Lazy<Normalizer> = Lazy::new(|| {
    Normalizer::new(&NormalizerConfig::default()).expect("built-in normalizer config is valid")
});

/// Normalize with the built-in French configuration.
pub fn normalize(raw: &str) -> String {
    FRENCH.normalize(raw)
}

impl Normalizer {
    pub fn new(config: &NormalizerConfig) -> Result<Self, CatalogueError> {
        if config.separator.trim().is_empty() {
            return Err(CatalogueError::EmptySeparator);
        }
        if config.locale.months.is_empty() {
            return Err(CatalogueError::NoMonths);
        }

        let sep = regex::escape(&config.separator);
        let months = alternation(config.locale.months.iter().map(|s| s.as_str()));
        let connectors = if config.locale.connectors.is_empty() {
            None
        } else {
            Some(alternation(config.locale.connectors.iter().map(|s| s.as_str())))
        };

        let full_date = full_date_pattern(&months, connectors.as_deref(), config.dayless_dates);

        let day_words: Vec<&str> = config.locale.day_words().collect();
        let day_words = if day_words.is_empty() {
            None
        } else {
            Some(compile(&format!(r"\b(?:{})\b", alternation(day_words.into_iter())))?)
        };

        let remnant = if config.strip_remnants {
            let tail = match &connectors {
                Some(conn) => format!(r"(?:{conn}|\d{{1,2}}|\w)?"),
                None => r"(?:\d{1,2}|\w)?".to_string(),
            };
            Some(compile(&format!(r"\b\d{{1,2}}\s*{tail}\s*{sep}"))?)
        } else {
            None
        };

        let mut catalogue = config.noise.clone();
        catalogue.extend(&config.extra_noise);

        Ok(Normalizer {
            separator: config.separator.clone(),
            noise: catalogue.compile()?,
            full_date: compile(&full_date)?,
            clock_time: compile(r"\b\d{1,2}:\d{2}\b")?,
            day_words,
            remnant,
            blank_lines: compile(r"\n\s*\n+")?,
            separator_run: compile(&format!(r"{sep}(?:\s*{sep})+"))?,
            leading_separator: compile(&format!(r"\A\s*{sep}\s*"))?,
            trailing_separator: compile(&format!(r"\s*{sep}\s*\z"))?,
        })
    }

    /// The built-in French normalizer.
    pub fn french() -> Self {
        (*FRENCH).clone()
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Run every stage over `raw`.  Never fails: text nothing matches
    /// simply passes through lowercased.
    pub fn normalize(&self, raw: &str) -> String {
        let sep = self.separator.as_str();

        let mut text = self.case_fold(raw);

        for rule in self.noise.iter().filter(|r| r.action == RuleAction::Remove) {
            text = rule.regex.replace_all(&text, "").into_owned();
        }

        text = self.full_date.replace_all(&text, NoExpand(sep)).into_owned();
        text = self.clock_time.replace_all(&text, NoExpand(sep)).into_owned();
        if let Some(re) = &self.day_words {
            text = re.replace_all(&text, NoExpand(sep)).into_owned();
        }
        for rule in self.noise.iter().filter(|r| r.action == RuleAction::Separate) {
            text = rule.regex.replace_all(&text, NoExpand(sep)).into_owned();
        }

        if let Some(re) = &self.remnant {
            // Removing one remnant can expose another ("1 2 3 SEP").  Each
            // replacement shortens the text, so this terminates.
            loop {
                let next = re.replace_all(&text, NoExpand(sep)).into_owned();
                if next == text {
                    break;
                }
                text = next;
            }
        }

        text = self.blank_lines.replace_all(&text, "\n").into_owned();
        text = self.separator_run.replace_all(&text, NoExpand(sep)).into_owned();
        text = self.leading_separator.replace(&text, "").into_owned();
        text = self.trailing_separator.replace(&text, "").into_owned();

        text.trim().to_string()
    }

    /// Normalize then parse into song records.
    pub fn extract_records(&self, raw: &str) -> Vec<SongRecord> {
        parser::parse_with_separator(&self.normalize(raw), &self.separator)
    }

    fn case_fold(&self, raw: &str) -> String {
        raw.split(self.separator.as_str())
            .map(|part| part.to_lowercase())
            .collect::<Vec<_>>()
            .join(&self.separator)
    }
}

/// Day, month, optional year, optional connector, optional time.  A month
/// with no day only counts when a year or a time follows it on its line, so
/// artist names like "bruno mars" survive.
fn full_date_pattern(months: &str, connectors: Option<&str>, dayless: bool) -> String {
    // horizontal whitespace: a connector or time never comes from the next line
    const H: &str = r"[^\S\n]";
    let conn = match connectors {
        Some(conn) => format!(r"(?:{H}*(?:{conn}))?"),
        None => String::new(),
    };
    let time = r"\d{1,2}:\d{2}";

    let with_day = format!(r"\d{{1,2}}\s+(?:{months})(?:\s+\d{{4}})?{conn}{H}*(?:{time})?");
    if !dayless {
        return format!(r"\b{with_day}\b");
    }
    let without_day =
        format!(r"(?:{months})(?:{H}+\d{{4}}{conn}(?:{H}*{time})?|{conn}{H}*{time})");
    format!(r"\b(?:{with_day}|{without_day})\b")
}

fn alternation<'a>(words: impl Iterator<Item = &'a str>) -> String {
    words.map(regex::escape).collect::<Vec<_>>().join("|")
}

fn compile(pattern: &str) -> Result<Regex, CatalogueError> {
    Regex::new(pattern).map_err(|source| CatalogueError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::PatternRule;

    const SEP: &str = DEFAULT_SEPARATOR;

    fn separator_count(text: &str) -> usize {
        text.matches(SEP).count()
    }

    #[test]
    fn test_lowercases_plain_text() {
        assert_eq!(normalize("Title Line\nArtist Name"), "title line\nartist name");
    }

    #[test]
    fn test_full_date_becomes_one_separator() {
        let raw = "Song One\nArtist One\n12 janvier 2025 14:30\nSong Two\nArtist Two";
        let out = normalize(raw);
        assert_eq!(separator_count(&out), 1);
        assert_eq!(out, format!("song one\nartist one\n{}\nsong two\nartist two", SEP));
    }

    #[test]
    fn test_full_date_with_adjacent_noise() {
        let raw = "Song One\nArtist One\n. 12 janvier 2025 à 14:30 ®ul=@\nSong Two\nArtist Two";
        let out = normalize(raw);
        assert_eq!(separator_count(&out), 1);
        assert!(out.starts_with("song one\nartist one"));
        assert!(out.ends_with("song two\nartist two"));
    }

    #[test]
    fn test_standalone_time() {
        let out = normalize("Song A\nArtist A\n22:59\nSong B\nArtist B");
        assert_eq!(out, format!("song a\nartist a\n{}\nsong b\nartist b", SEP));
    }

    #[test]
    fn test_weekday_then_time_is_one_separator() {
        let out = normalize("Song A\nArtist A\nLundi 22:59\nSong B\nArtist B");
        assert_eq!(separator_count(&out), 1);
    }

    #[test]
    fn test_relative_days() {
        let out = normalize("Song A\nArtist A\nHier\nSong B\nArtist B\nAujourd'hui\nSong C\nArtist C");
        assert_eq!(separator_count(&out), 2);
    }

    #[test]
    fn test_no_leading_or_trailing_separator() {
        let out = normalize("Hier\nSong A\nArtist A\n10:15");
        assert_eq!(out, "song a\nartist a");
        assert!(!out.starts_with(SEP));
        assert!(!out.ends_with(SEP));
    }

    #[test]
    fn test_separator_runs_collapse() {
        let out = normalize("Song A\nArtist A\nhier\n\nlundi\n12:00\nmardi\nSong B\nArtist B");
        assert_eq!(separator_count(&out), 1);
        assert!(!out.contains(&format!("{}\n{}", SEP, SEP)));
    }

    #[test]
    fn test_noise_patterns_removed() {
        let out = normalize("< Titres N Q 3x\nSong A\nArtist A");
        assert_eq!(out, "song a\nartist a");

        let out = normalize("Song A.\nArtist A");
        assert_eq!(out, "song a\nartist a");
    }

    #[test]
    fn test_month_noise_runs_before_dates() {
        // "mai 2025" is catalogue noise, the leftover day number is a remnant
        let out = normalize("Song A\nArtist A\n3 mai 2025 14:30\nSong B\nArtist B");
        assert_eq!(out, format!("song a\nartist a\n{}\nsong b\nartist b", SEP));
    }

    #[test]
    fn test_remnants_before_separator_removed() {
        let out = normalize("Song A\nArtist A\n19 4 22:10\nSong B\nArtist B");
        assert_eq!(out, format!("song a\nartist a\n{}\nsong b\nartist b", SEP));
    }

    #[test]
    fn test_remnant_stripping_can_be_disabled() {
        let config = NormalizerConfig { strip_remnants: false, ..NormalizerConfig::default() };
        let normalizer = Normalizer::new(&config).unwrap();
        let out = normalizer.normalize("Track 5\nArtist\n22:10\nOther\nBand");
        assert!(out.contains("artist\n"));
        assert_eq!(out, format!("track 5\nartist\n{}\nother\nband", SEP));

        let aggressive = normalize("Song\nBlink 182\n22:10\nOther\nBand");
        assert_eq!(aggressive, format!("song\nblink {}\nother\nband", SEP));
    }

    #[test]
    fn test_long_remnant_chain_is_a_fixed_point() {
        let numbers: Vec<String> = (2..=21).map(|n| n.to_string()).collect();
        let raw = format!("Song A\nArtist A {}\n22:00\nSong B\nArtist B", numbers.join(" "));
        let once = normalize(&raw);
        assert_eq!(once, format!("song a\nartist a {}\nsong b\nartist b", SEP));
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_month_without_day() {
        let raw = "Song One\nArtist One\nJanvier 2025 14:30\nSong Two\nArtist Two";
        let out = normalize(raw);
        assert_eq!(out, format!("song one\nartist one\n{}\nsong two\nartist two", SEP));

        let records = Normalizer::french().extract_records(raw);
        assert_eq!(records[0], SongRecord::new("song one", "artist one"));
    }

    #[test]
    fn test_month_alone_is_not_a_date() {
        let out = normalize("Uptown Funk\nBruno Mars\n22:10\nSong B\nArtist B");
        assert_eq!(out, format!("uptown funk\nbruno mars\n{}\nsong b\nartist b", SEP));
    }

    #[test]
    fn test_dayless_dates_can_be_disabled() {
        let config = NormalizerConfig { dayless_dates: false, ..NormalizerConfig::default() };
        let normalizer = Normalizer::new(&config).unwrap();
        let out = normalizer.normalize("Song One\nArtist One\nJanvier 2025 14:30\nSong Two\nArtist Two");
        assert!(out.contains("janvier"));
    }

    #[test]
    fn test_connector_does_not_reach_next_line() {
        let records = Normalizer::french()
            .extract_records("Song A\nArtist A\n12 janvier\nÀ nos souvenirs\nTrois Cafés Gourmands");
        assert_eq!(
            records,
            vec![
                SongRecord::new("song a", "artist a"),
                SongRecord::new("à nos souvenirs", "trois cafés gourmands"),
            ]
        );
    }

    #[test]
    fn test_blank_lines_collapse() {
        assert_eq!(normalize("Song A\n\n\n  \nArtist A"), "song a\nartist a");
    }

    #[test]
    fn test_idempotent_on_normalized_text() {
        let inputs = [
            "Song One\nArtist One\n12 janvier 2025 14:30\nSong Two\nArtist Two",
            "Hier\nA Long\nTitle\nSomeone\nLundi 10:00\nOther\nBand\n1 2 3 22:00\nLast",
            "nothing to see here",
            "",
        ];
        for raw in inputs {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not a fixed point for {:?}", raw);
        }
    }

    #[test]
    fn test_no_separator_text_stays_single_block() {
        let out = normalize("Just A Title\nAnd An Artist");
        assert_eq!(separator_count(&out), 0);
    }

    #[test]
    fn test_noise_only_input_is_empty() {
        assert_eq!(normalize("®ul=@\n...\n"), "");
    }

    #[test]
    fn test_custom_separator_and_locale() {
        let config = NormalizerConfig {
            separator: "<<BREAK>>".to_string(),
            locale: Locale::english(),
            noise: NoiseCatalogue::new(vec![PatternRule::remove(r"recently\s+played")]),
            ..NormalizerConfig::default()
        };
        let normalizer = Normalizer::new(&config).unwrap();
        let out = normalizer.normalize(
            "Recently Played\nSong A\nArtist A\n3 March 2024 at 9:05\nSong B\nArtist B\nYesterday\nSong C",
        );
        assert_eq!(out, "song a\nartist a\n<<BREAK>>\nsong b\nartist b\n<<BREAK>>\nsong c");
    }

    #[test]
    fn test_separate_action_rules() {
        let config = NormalizerConfig {
            noise: NoiseCatalogue::new(vec![PatternRule::separate(r"la\s+semaine\s+dernière")]),
            ..NormalizerConfig::default()
        };
        let normalizer = Normalizer::new(&config).unwrap();
        let out = normalizer.normalize("Song A\nArtist A\nLa semaine dernière\nSong B\nArtist B");
        assert_eq!(separator_count(&out), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = NormalizerConfig { separator: "  ".to_string(), ..NormalizerConfig::default() };
        assert!(matches!(Normalizer::new(&config), Err(CatalogueError::EmptySeparator)));

        let mut config = NormalizerConfig::default();
        config.locale.months.clear();
        assert!(matches!(Normalizer::new(&config), Err(CatalogueError::NoMonths)));
    }

    #[test]
    fn test_config_from_toml_keeps_defaults() {
        let config = NormalizerConfig::from_toml(
            r#"
            strip_remnants = false

            [[extra_noise]]
            pattern = "écouter"
            "#,
        )
        .unwrap();
        assert_eq!(config.separator, DEFAULT_SEPARATOR);
        assert!(!config.strip_remnants);
        assert_eq!(config.locale, Locale::french());
        assert_eq!(config.noise, NoiseCatalogue::french_music_app());
        assert_eq!(config.extra_noise.rules.len(), 1);
    }

    #[test]
    fn test_extract_records() {
        let records = Normalizer::french()
            .extract_records("Song A\nArtist A\nHier\nLine 1\nLine 2\nArtist B");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].title, "line 1\nline 2");
        assert_eq!(records[1].artist, "artist b");
    }
}
