pub mod catalogue;
pub mod config;
pub mod fetch;
pub mod locale;
pub mod normalizer;
pub mod ocr;
pub mod parser;
pub mod pipeline;
pub mod rate_limiter;
pub mod search;
pub mod tool;

pub use catalogue::{CatalogueError, NoiseCatalogue, PatternRule, RuleAction};
pub use config::{Config, ConfigError};
pub use fetch::{AudioQuality, DownloadRequest, FetchError, FetchProvider, YtDlpFetcher};
pub use locale::Locale;
pub use normalizer::{normalize, Normalizer, NormalizerConfig, DEFAULT_SEPARATOR};
pub use ocr::{OcrError, OcrProvider, TesseractOcr};
pub use parser::{parse, parse_with_separator, SongRecord};
pub use pipeline::{BatchSummary, ImageReport, Pipeline, TrackOutcome};
pub use rate_limiter::RateLimiter;
pub use search::{SearchError, SearchProvider, YtDlpSearch};
