//! Screenshot → raw text, via the tesseract command-line tool.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::tool::{self, ToolError};

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("image not found: {0}")]
    MissingImage(PathBuf),
    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Anything that can read the text out of an image.
pub trait OcrProvider {
    fn image_to_text(&self, image: &Path) -> Result<String, OcrError>;
}

/// Runs `tesseract <image> stdout [-l <language>]`.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    pub program: String,
    /// Tesseract language code such as `fra` or `eng+fra`.
    pub language: Option<String>,
}

impl TesseractOcr {
    pub fn new(program: &str, language: Option<&str>) -> Self {
        TesseractOcr {
            program: program.to_string(),
            language: language.map(|l| l.to_string()),
        }
    }

    fn args(&self, image: &Path) -> Vec<String> {
        let mut args = vec![image.to_string_lossy().to_string(), "stdout".to_string()];
        if let Some(lang) = &self.language {
            args.push("-l".to_string());
            args.push(lang.clone());
        }
        args
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        TesseractOcr::new("tesseract", None)
    }
}

impl OcrProvider for TesseractOcr {
    fn image_to_text(&self, image: &Path) -> Result<String, OcrError> {
        if !image.exists() {
            return Err(OcrError::MissingImage(image.to_path_buf()));
        }
        Ok(tool::run_capture(&self.program, self.args(image))?)
    }
}
