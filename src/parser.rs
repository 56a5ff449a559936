//! Record parser: normalized text with separators → ordered song records.
//!
//! Each block between separators is one history entry.  The app wraps long
//! titles over several lines and always puts the artist on a single line
//! underneath, so the last non-empty line is the artist and everything
//! above it is the title.

use serde::{Deserialize, Serialize};

use crate::normalizer::DEFAULT_SEPARATOR;

/// One song as read from a screenshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRecord {
    /// May span several lines, joined with `\n`.
    pub title: String,
    /// Empty when the block had a single line.
    pub artist: String,
}

impl SongRecord {
    pub fn new(title: &str, artist: &str) -> Self {
        SongRecord { title: title.to_string(), artist: artist.to_string() }
    }

    /// Title on one line.
    pub fn display_title(&self) -> String {
        single_line(&self.title)
    }

    /// Artist on one line.
    pub fn display_artist(&self) -> String {
        single_line(&self.artist)
    }

    /// Query for the video search, biased towards audio-only uploads.
    pub fn search_query(&self) -> String {
        let title = self.display_title();
        let artist = self.display_artist();
        if artist.is_empty() {
            format!("{} official audio", title)
        } else {
            format!("{} {} official audio", title, artist)
        }
    }
}

/// Parse text produced with the default separator.
pub fn parse(text: &str) -> Vec<SongRecord> {
    parse_with_separator(text, DEFAULT_SEPARATOR)
}

/// Split on `separator` and derive at most one record per block, in block
/// order.  Blocks with no non-empty line produce nothing.
pub fn parse_with_separator(text: &str, separator: &str) -> Vec<SongRecord> {
    text.split(separator).filter_map(parse_block).collect()
}

fn parse_block(block: &str) -> Option<SongRecord> {
    let lines: Vec<&str> = block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    match lines.split_last() {
        None => None,
        Some((only, [])) => Some(SongRecord::new(only, "")),
        Some((artist, title_lines)) => Some(SongRecord::new(&title_lines.join("\n"), artist)),
    }
}

fn single_line(text: &str) -> String {
    text.replace('\n', " ").trim().to_string()
}
