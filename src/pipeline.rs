//! Batch processing of a folder of screenshots.
//!
//! For every `.png` (sorted by name): OCR → normalize → parse, then for every
//! record: search → download.  Failures are recorded per image and per
//! record; nothing short of an unreadable folder stops the batch.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::fetch::{DownloadRequest, FetchProvider};
use crate::normalizer::Normalizer;
use crate::ocr::{OcrError, OcrProvider};
use crate::parser::SongRecord;
use crate::rate_limiter::RateLimiter;
use crate::search::SearchProvider;

/// What happened to one song record.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    Downloaded(PathBuf),
    /// Dry run: the URL that would have been downloaded.
    Planned(String),
    NotFound,
    SearchFailed(String),
    FetchFailed(String),
}

#[derive(Debug, Clone)]
pub struct TrackReport {
    pub record: SongRecord,
    pub query: String,
    pub outcome: TrackOutcome,
}

#[derive(Debug)]
pub struct ImageReport {
    pub image: PathBuf,
    /// `Err` when the image could not be read at all.
    pub outcome: Result<Vec<TrackReport>, OcrError>,
}

impl ImageReport {
    pub fn tracks(&self) -> &[TrackReport] {
        match &self.outcome {
            Ok(tracks) => tracks,
            Err(_) => &[],
        }
    }
}

/// All image reports of a run, in processing order.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub reports: Vec<ImageReport>,
}

impl BatchSummary {
    pub fn images(&self) -> usize {
        self.reports.len()
    }

    pub fn failed_images(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_err()).count()
    }

    pub fn records(&self) -> usize {
        self.tracks().count()
    }

    pub fn downloaded(&self) -> usize {
        self.count(|o| matches!(o, TrackOutcome::Downloaded(_)))
    }

    pub fn planned(&self) -> usize {
        self.count(|o| matches!(o, TrackOutcome::Planned(_)))
    }

    pub fn not_found(&self) -> usize {
        self.count(|o| matches!(o, TrackOutcome::NotFound))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, TrackOutcome::SearchFailed(_) | TrackOutcome::FetchFailed(_)))
    }

    fn tracks(&self) -> impl Iterator<Item = &TrackReport> {
        self.reports.iter().flat_map(|r| r.tracks().iter())
    }

    fn count(&self, pred: impl Fn(&TrackOutcome) -> bool) -> usize {
        self.tracks().filter(|t| pred(&t.outcome)).count()
    }

    /// Print a short human-readable summary
    pub fn print(&self) {
        println!("Images processed:   {}", self.images());
        if self.failed_images() > 0 {
            println!("Images failed:      {}", self.failed_images());
        }
        println!("Songs extracted:    {}", self.records());
        println!("Downloaded:         {}", self.downloaded());
        if self.planned() > 0 {
            println!("Found (dry run):    {}", self.planned());
        }
        println!("Not found:          {}", self.not_found());
        println!("Failed:             {}", self.failed());
    }
}

/// `.png` files directly inside `folder`, sorted by file name.
pub fn list_images(folder: &Path) -> io::Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = fs::read_dir(folder)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_png(path))
        .collect();
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("png"))
}

/// OCR one image and turn its text into song records.
pub fn extract_records(
    ocr: &dyn OcrProvider,
    normalizer: &Normalizer,
    image: &Path,
) -> Result<Vec<SongRecord>, OcrError> {
    let raw = ocr.image_to_text(image)?;
    let cleaned = normalizer.normalize(&raw);
    debug!("Cleaned OCR text (with separators):\n{}", cleaned);
    Ok(crate::parser::parse_with_separator(&cleaned, normalizer.separator()))
}

pub struct Pipeline<'a> {
    ocr: &'a dyn OcrProvider,
    search: &'a dyn SearchProvider,
    fetch: &'a dyn FetchProvider,
    normalizer: &'a Normalizer,
    rate_limiter: RateLimiter,
    dry_run: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        ocr: &'a dyn OcrProvider,
        search: &'a dyn SearchProvider,
        fetch: &'a dyn FetchProvider,
        normalizer: &'a Normalizer,
        rate_limiter: RateLimiter,
    ) -> Self {
        Pipeline { ocr, search, fetch, normalizer, rate_limiter, dry_run: false }
    }

    /// Search only, never download.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn process_folder(&mut self, folder: &Path) -> io::Result<BatchSummary> {
        let images = list_images(folder)?;
        info!("Found {} image(s) in {}", images.len(), folder.display());

        let mut summary = BatchSummary::default();
        for image in images {
            summary.reports.push(self.process_image(&image));
        }
        Ok(summary)
    }

    pub fn process_image(&mut self, image: &Path) -> ImageReport {
        let name = image.file_name().map_or_else(
            || image.display().to_string(),
            |n| n.to_string_lossy().to_string(),
        );
        info!("==================== Processing {} ====================", name);

        let records = match extract_records(self.ocr, self.normalizer, image) {
            Ok(records) => records,
            Err(e) => {
                warn!("Error processing {}: {}", name, e);
                return ImageReport { image: image.to_path_buf(), outcome: Err(e) };
            }
        };

        if records.is_empty() {
            info!("No song information extracted from {}", name);
        }

        let tracks = records.into_iter().map(|record| self.process_record(record)).collect();
        ImageReport { image: image.to_path_buf(), outcome: Ok(tracks) }
    }

    fn process_record(&mut self, record: SongRecord) -> TrackReport {
        let title = record.display_title();
        let artist = record.display_artist();
        let query = record.search_query();
        info!("Title : {} / Artist : {}", title, artist);

        self.rate_limiter.wait_if_needed();
        let url = match self.search.find_url(&query) {
            Ok(url) => {
                self.rate_limiter.report_success();
                url
            }
            Err(e) => {
                self.rate_limiter.report_failure();
                warn!("Error during search for '{}': {}", query, e);
                return TrackReport { record, query, outcome: TrackOutcome::SearchFailed(e.to_string()) };
            }
        };

        let outcome = match url {
            None => {
                info!("Could not find a URL for '{}' by '{}'. Skipping download.", title, artist);
                TrackOutcome::NotFound
            }
            Some(url) if self.dry_run => TrackOutcome::Planned(url),
            Some(url) => {
                let request = DownloadRequest { url, title, artist };
                match self.fetch.fetch(&request) {
                    Ok(path) => TrackOutcome::Downloaded(path),
                    Err(e) => {
                        warn!("Error downloading audio for '{}': {}", request.title, e);
                        TrackOutcome::FetchFailed(e.to_string())
                    }
                }
            }
        };

        TrackReport { record, query, outcome }
    }
}
