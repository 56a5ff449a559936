//! Audio download: video URL → mp3 on disk, through yt-dlp.
//!
//! The file is named after the video, optionally prefixed with the uploading
//! channel and the artist read from the screenshot:
//! `<channel> - <artist> - <video title>.mp3`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tool::{self, ToolError};

pub const DEFAULT_AUDIO_QUALITY: &str = "128K";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("invalid audio quality `{0}` (expected a bitrate like 128K or a VBR level 0-10)")]
    InvalidQuality(String),
}

/// yt-dlp `--audio-quality` value: a bitrate ("128K", "320") or a VBR
/// level from 0 (best) to 10 (worst).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AudioQuality(String);

impl AudioQuality {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AudioQuality {
    fn default() -> Self {
        AudioQuality(DEFAULT_AUDIO_QUALITY.to_string())
    }
}

impl FromStr for AudioQuality {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.strip_suffix(['k', 'K']).unwrap_or(s);
        let valid = !digits.is_empty()
            && digits.chars().all(|c| c.is_ascii_digit())
            && (digits.len() < s.len() || digits.parse::<u32>().map_or(false, |n| n <= 10 || n >= 32));
        if valid {
            Ok(AudioQuality(s.to_string()))
        } else {
            Err(FetchError::InvalidQuality(s.to_string()))
        }
    }
}

impl TryFrom<String> for AudioQuality {
    type Error = FetchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AudioQuality> for String {
    fn from(q: AudioQuality) -> Self {
        q.0
    }
}

impl fmt::Display for AudioQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What to download and how the screenshot described it.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    pub url: String,
    pub title: String,
    pub artist: String,
}

/// Downloads audio for a found video.
pub trait FetchProvider {
    /// Returns the path of the written file.
    fn fetch(&self, request: &DownloadRequest) -> Result<PathBuf, FetchError>;
}

#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    pub program: String,
    pub audio_quality: AudioQuality,
    /// Prefix the file name with the uploading channel.
    pub add_account_name: bool,
    pub output_dir: PathBuf,
}

impl YtDlpFetcher {
    pub fn new(program: &str, audio_quality: AudioQuality, add_account_name: bool, output_dir: &Path) -> Self {
        YtDlpFetcher {
            program: program.to_string(),
            audio_quality,
            add_account_name,
            output_dir: output_dir.to_path_buf(),
        }
    }

    pub fn video_title(&self, url: &str) -> Result<String, ToolError> {
        Ok(tool::run_capture(&self.program, ["--get-title", url])?.trim().to_string())
    }

    pub fn channel_name(&self, url: &str) -> Result<String, ToolError> {
        Ok(tool::run_capture(&self.program, ["--print", "%(channel)s", url])?.trim().to_string())
    }

    /// Extract the audio track of `url` to `output` as mp3.
    pub fn download(&self, url: &str, output: &Path) -> Result<(), ToolError> {
        // yt-dlp expands `%(...)s` in --output
        let template = output.to_string_lossy().replace('%', "%%");
        tool::run_status(
            &self.program,
            [
                "-x",
                "--audio-format",
                "mp3",
                "--audio-quality",
                self.audio_quality.as_str(),
                "--output",
                template.as_str(),
                url,
            ],
        )
    }
}

impl FetchProvider for YtDlpFetcher {
    fn fetch(&self, request: &DownloadRequest) -> Result<PathBuf, FetchError> {
        info!(
            "Attempting to download '{}' by '{}' from {}",
            request.title, request.artist, request.url
        );

        let video_title = self.video_title(&request.url)?;
        let channel = if self.add_account_name {
            match self.channel_name(&request.url) {
                Ok(name) => Some(name),
                Err(e) => {
                    warn!("Could not get channel name for {}: {}", request.url, e);
                    None
                }
            }
        } else {
            None
        };

        let file_name = output_file_name(&request.url, &video_title, channel.as_deref(), &request.artist);
        let output = self.output_dir.join(file_name);
        info!("Processing: {} and storing to {}", request.url, output.display());

        self.download(&request.url, &output)?;
        info!("Audio has been downloaded and converted to {}", output.display());
        Ok(output)
    }
}

/// Remove characters that are invalid in file names on common systems.
pub fn sanitize_filename(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .collect()
}

/// `[channel - ][artist - ]title.mp3`, skipping empty parts.  Falls back to
/// `output_<url>.mp3` when the video title is unusable.
pub fn output_file_name(url: &str, video_title: &str, channel: Option<&str>, artist: &str) -> String {
    let title = sanitize_filename(video_title);
    if title.trim().is_empty() {
        warn!("Could not retrieve a valid title for {}. Using a default filename.", url);
        return format!("output_{}.mp3", sanitize_filename(url));
    }

    let parts: Vec<String> = [channel.unwrap_or(""), artist]
        .iter()
        .map(|p| sanitize_filename(p).trim().to_string())
        .chain(std::iter::once(title.trim().to_string()))
        .filter(|p| !p.is_empty())
        .collect();

    format!("{}.mp3", parts.join(" - "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("AC/DC: Back <In> Black?"), "ACDC Back In Black");
        assert_eq!(sanitize_filename(r#"a"b\c|d*e"#), "abcde");
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn test_output_file_name_all_parts() {
        let name = output_file_name("u", "Song (Official Audio)", Some("Label VEVO"), "artist");
        assert_eq!(name, "Label VEVO - artist - Song (Official Audio).mp3");
    }

    #[test]
    fn test_output_file_name_skips_empty_parts() {
        assert_eq!(output_file_name("u", "Song", None, ""), "Song.mp3");
        assert_eq!(output_file_name("u", "Song", Some("  "), "band"), "band - Song.mp3");
    }

    #[test]
    fn test_output_file_name_fallback() {
        let name = output_file_name("https://www.youtube.com/watch?v=abc", "???", None, "band");
        assert_eq!(name, "output_httpswww.youtube.comwatchv=abc.mp3");
    }

    #[test]
    fn test_audio_quality_parsing() {
        assert_eq!("128K".parse::<AudioQuality>().unwrap().as_str(), "128K");
        assert_eq!("320k".parse::<AudioQuality>().unwrap().as_str(), "320k");
        assert_eq!("192".parse::<AudioQuality>().unwrap().as_str(), "192");
        assert_eq!("0".parse::<AudioQuality>().unwrap().as_str(), "0");
        assert!("best".parse::<AudioQuality>().is_err());
        assert!("".parse::<AudioQuality>().is_err());
        assert!("K".parse::<AudioQuality>().is_err());
        assert!("20".parse::<AudioQuality>().is_err());
    }

    #[test]
    fn test_audio_quality_serde() {
        #[derive(Deserialize)]
        struct Wrapper {
            q: AudioQuality,
        }
        let w: Wrapper = toml::from_str(r#"q = "256K""#).unwrap();
        assert_eq!(w.q.to_string(), "256K");
        assert!(toml::from_str::<Wrapper>(r#"q = "loud""#).is_err());
    }
}
