//! Video search: query → URL of the best match, if any.

use log::{debug, info};
use thiserror::Error;

use crate::tool::{self, ToolError};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Finds a video for a search query.  `Ok(None)` means nothing matched,
/// which is an ordinary outcome.
pub trait SearchProvider {
    fn find_url(&self, query: &str) -> Result<Option<String>, SearchError>;
}

/// Searches YouTube through `yt-dlp ytsearch1:<query>`.
#[derive(Debug, Clone)]
pub struct YtDlpSearch {
    pub program: String,
}

impl YtDlpSearch {
    pub fn new(program: &str) -> Self {
        YtDlpSearch { program: program.to_string() }
    }

    fn args(query: &str) -> Vec<String> {
        vec![
            format!("ytsearch1:{}", query),
            "--print".to_string(),
            "webpage_url".to_string(),
            "--no-warnings".to_string(),
        ]
    }
}

impl Default for YtDlpSearch {
    fn default() -> Self {
        YtDlpSearch::new("yt-dlp")
    }
}

impl SearchProvider for YtDlpSearch {
    fn find_url(&self, query: &str) -> Result<Option<String>, SearchError> {
        info!("Searching YouTube for: '{}'", query);
        let stdout = tool::run_capture(&self.program, Self::args(query))?;
        let url = first_url(&stdout);
        match &url {
            Some(u) => info!("Found URL: {}", u),
            None => debug!("no result for '{}'", query),
        }
        Ok(url)
    }
}

/// First non-empty line of the tool output.
fn first_url(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let args = YtDlpSearch::args("song artist official audio");
        assert_eq!(args[0], "ytsearch1:song artist official audio");
        assert_eq!(&args[1..3], &["--print", "webpage_url"]);
    }

    #[test]
    fn test_first_url() {
        assert_eq!(
            first_url("\n  https://www.youtube.com/watch?v=abc \nignored\n"),
            Some("https://www.youtube.com/watch?v=abc".to_string())
        );
        assert_eq!(first_url("   \n\n"), None);
        assert_eq!(first_url(""), None);
    }
}
