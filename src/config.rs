use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalogue::CatalogueError;
use crate::fetch::AudioQuality;
use crate::normalizer::{Normalizer, NormalizerConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("HOME environment variable not set")]
    NoHome,
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),
    #[error(transparent)]
    Catalogue(#[from] CatalogueError),
}

/// Configuration defaults that can be saved to a file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_quality: Option<AudioQuality>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_account_name: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub yt_dlp: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tesseract: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_interval: Option<f64>,

    /// Separator, locale and noise catalogue.  Kept last so the TOML
    /// table follows the plain keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalizer: Option<NormalizerConfig>,
}

impl Config {
    /// Create a new empty config
    pub fn new() -> Self {
        Config::default()
    }

    /// Values used when neither the saved file nor the command line set them
    pub fn builtin_defaults() -> Self {
        Config {
            audio_quality: Some(AudioQuality::default()),
            add_account_name: Some(true),
            yt_dlp: Some("yt-dlp".to_string()),
            tesseract: Some("tesseract".to_string()),
            ocr_language: None,
            output_dir: Some(PathBuf::from(".")),
            search_interval: Some(1.0),
            normalizer: None,
        }
    }

    /// Get the config file path (~/.state/songshot/defaults.toml)
    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let home = std::env::var_os("HOME").ok_or(ConfigError::NoHome)?;
        let config_dir = Path::new(&home).join(".state").join("songshot");
        Ok(config_dir.join("defaults.toml"))
    }

    /// Load config from the default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Load config from `path`; a missing file is an empty config
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::new());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::get_config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io { path: path.to_path_buf(), source };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string).map_err(io_err)?;
        Ok(())
    }

    /// Merge this config with another, preferring values from other
    pub fn merge(&mut self, other: &Config) {
        if other.audio_quality.is_some() {
            self.audio_quality = other.audio_quality.clone();
        }
        if other.add_account_name.is_some() {
            self.add_account_name = other.add_account_name;
        }
        if other.yt_dlp.is_some() {
            self.yt_dlp = other.yt_dlp.clone();
        }
        if other.tesseract.is_some() {
            self.tesseract = other.tesseract.clone();
        }
        if other.ocr_language.is_some() {
            self.ocr_language = other.ocr_language.clone();
        }
        if other.output_dir.is_some() {
            self.output_dir = other.output_dir.clone();
        }
        if other.search_interval.is_some() {
            self.search_interval = other.search_interval;
        }
        if other.normalizer.is_some() {
            self.normalizer = other.normalizer.clone();
        }
    }

    /// Compile the configured normalizer (built-in French one when unset)
    pub fn build_normalizer(&self) -> Result<Normalizer, ConfigError> {
        match &self.normalizer {
            Some(cfg) => Ok(Normalizer::new(cfg)?),
            None => Ok(Normalizer::french()),
        }
    }

    /// Print the config in a human-readable format
    pub fn print(&self, title: &str) {
        println!("{}:", title);

        if let Some(quality) = &self.audio_quality {
            println!("  Audio quality:      {}", quality);
        }
        if let Some(add_account_name) = self.add_account_name {
            println!("  Channel in name:    {}", if add_account_name { "enabled" } else { "disabled" });
        }
        if let Some(yt_dlp) = &self.yt_dlp {
            println!("  yt-dlp:             {}", yt_dlp);
        }
        if let Some(tesseract) = &self.tesseract {
            println!("  tesseract:          {}", tesseract);
        }
        if let Some(lang) = &self.ocr_language {
            println!("  OCR language:       {}", lang);
        }
        if let Some(dir) = &self.output_dir {
            println!("  Output directory:   {}", dir.display());
        }
        if let Some(interval) = self.search_interval {
            println!("  Search interval:    {} seconds", interval);
        }
        if let Some(normalizer) = &self.normalizer {
            println!("  Separator:          {}", normalizer.separator);
            println!("  Noise rules:        {}", normalizer.noise.rules.len() + normalizer.extra_noise.rules.len());
            println!("  Month names:        {}", normalizer.locale.months.join(", "));
            println!("  Strip remnants:     {}", if normalizer.strip_remnants { "yes" } else { "no" });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_other() {
        let mut config = Config::builtin_defaults();
        let overrides = Config {
            audio_quality: Some("320K".parse().unwrap()),
            add_account_name: Some(false),
            ..Config::new()
        };
        config.merge(&overrides);

        assert_eq!(config.audio_quality.unwrap().as_str(), "320K");
        assert_eq!(config.add_account_name, Some(false));
        assert_eq!(config.yt_dlp.as_deref(), Some("yt-dlp"));
        assert_eq!(config.search_interval, Some(1.0));
    }

    #[test]
    fn test_missing_file_is_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("defaults.toml");

        let mut config = Config::new();
        config.ocr_language = Some("fra".to_string());
        config.search_interval = Some(2.5);
        config.normalizer = Some(NormalizerConfig::default());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_normalizer_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.toml");
        fs::write(
            &path,
            r#"
audio_quality = "192K"

[normalizer]
separator = "@@"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.audio_quality.as_ref().map(AudioQuality::as_str), Some("192K"));
        let normalizer = config.build_normalizer().unwrap();
        assert_eq!(normalizer.separator(), "@@");
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.toml");
        fs::write(&path, "audio_quality = \"loud\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("defaults.toml"));
    }
}
