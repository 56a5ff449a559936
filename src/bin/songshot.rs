//! Read music-app history screenshots and download the songs they list.
//!
//! Every `.png` in FOLDER is run through OCR, the text is cleaned into
//! (title, artist) records, each record is searched on YouTube and the best
//! match is downloaded as mp3.
//!
//! Usage:
//!     songshot [FOLDER] [--quality 192K] [--dry-run] [--json] [--save-defaults]

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser};
use log::{error, warn, LevelFilter};

use songshot::pipeline::{self, Pipeline};
use songshot::{
    AudioQuality, Config, Normalizer, NormalizerConfig, RateLimiter, TesseractOcr, YtDlpFetcher,
    YtDlpSearch,
};

#[derive(Debug, Parser)]
#[command(name = "songshot", version, about = "Download the songs listed on music-app screenshots")]
struct Cli {
    /// Folder holding the .png screenshots
    #[arg(default_value = ".")]
    folder: PathBuf,

    /// yt-dlp audio quality: bitrate such as 128K or VBR level 0-10
    #[arg(long)]
    quality: Option<AudioQuality>,

    /// Do not prefix file names with the YouTube channel name
    #[arg(long)]
    no_account_name: bool,

    /// Search but do not download
    #[arg(long)]
    dry_run: bool,

    /// Print the extracted songs as JSON and exit (no search, no download)
    #[arg(long)]
    json: bool,

    /// Tesseract language, e.g. fra or eng+fra
    #[arg(long)]
    lang: Option<String>,

    /// Where to write the mp3 files
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// TOML file with separator, locale and noise catalogue
    #[arg(long, value_name = "FILE")]
    catalogue: Option<PathBuf>,

    /// Minimum seconds between two searches (0 = no wait)
    #[arg(long, value_name = "SECS")]
    search_interval: Option<f64>,

    /// Path to the yt-dlp executable
    #[arg(long, value_name = "PATH")]
    yt_dlp: Option<String>,

    /// Path to the tesseract executable
    #[arg(long, value_name = "PATH")]
    tesseract: Option<String>,

    /// Save the options given on this command line as defaults
    #[arg(long)]
    save_defaults: bool,

    /// Show built-in default settings and exit
    #[arg(long)]
    show_defaults: bool,

    /// Show saved default settings and exit
    #[arg(long)]
    show_saved_defaults: bool,

    /// More logging (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Less logging (-q warnings only, -qq errors only)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "verbose")]
    quiet: u8,
}

impl Cli {
    /// Options explicitly given on the command line
    fn to_config(&self) -> Result<Config, Box<dyn Error>> {
        let mut config = Config::new();
        config.audio_quality = self.quality.clone();
        if self.no_account_name {
            config.add_account_name = Some(false);
        }
        config.ocr_language = self.lang.clone();
        config.output_dir = self.output_dir.clone();
        config.search_interval = self.search_interval;
        config.yt_dlp = self.yt_dlp.clone();
        config.tesseract = self.tesseract.clone();
        if let Some(path) = &self.catalogue {
            let content = fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
            let normalizer = NormalizerConfig::from_toml(&content)
                .map_err(|e| format!("invalid catalogue {}: {}", path.display(), e))?;
            config.normalizer = Some(normalizer);
        }
        Ok(config)
    }
}

fn log_level(verbose: u8, quiet: u8) -> LevelFilter {
    match (verbose, quiet) {
        (0, 0) => LevelFilter::Info,
        (0, 1) => LevelFilter::Warn,
        (0, _) => LevelFilter::Error,
        (1, _) => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn init_logging(level: LevelFilter) {
    let mut clog = colog::default_builder();
    clog.filter(None, level);
    clog.init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(log_level(cli.verbose, cli.quiet));

    if let Err(e) = run(&cli) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let saved_config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring saved defaults: {}", e);
        Config::new()
    });

    if cli.show_defaults {
        Config::builtin_defaults().print("Built-in default settings");
        return Ok(());
    }
    if cli.show_saved_defaults {
        let path = Config::get_config_path()?;
        println!("Config file: {}", path.display());
        saved_config.print("Saved default settings");
        return Ok(());
    }

    let cmdline_config = cli.to_config()?;

    if cli.save_defaults {
        let mut to_save = saved_config.clone();
        to_save.merge(&cmdline_config);
        let path = to_save.save()?;
        println!("Defaults saved to {}", path.display());
    }

    // built-in < saved < command line
    let mut config = Config::builtin_defaults();
    config.merge(&saved_config);
    config.merge(&cmdline_config);

    let normalizer = config.build_normalizer()?;
    let ocr = TesseractOcr::new(
        config.tesseract.as_deref().unwrap_or("tesseract"),
        config.ocr_language.as_deref(),
    );

    if cli.json {
        return print_json(&cli.folder, &ocr, &normalizer);
    }

    let yt_dlp = config.yt_dlp.clone().unwrap_or_else(|| "yt-dlp".to_string());
    let output_dir = config.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    if !cli.dry_run {
        fs::create_dir_all(&output_dir)?;
    }

    let search = YtDlpSearch::new(&yt_dlp);
    let fetch = YtDlpFetcher::new(
        &yt_dlp,
        config.audio_quality.clone().unwrap_or_default(),
        config.add_account_name.unwrap_or(true),
        &output_dir,
    );
    let rate_limiter = RateLimiter::from_secs_f64("yt-dlp", config.search_interval.unwrap_or(1.0));

    let mut pipeline = Pipeline::new(&ocr, &search, &fetch, &normalizer, rate_limiter).dry_run(cli.dry_run);
    let summary = pipeline.process_folder(&cli.folder)?;

    println!();
    println!("=== Summary ===");
    summary.print();
    Ok(())
}

fn print_json(
    folder: &Path,
    ocr: &TesseractOcr,
    normalizer: &Normalizer,
) -> Result<(), Box<dyn Error>> {
    let mut entries = Vec::new();
    for image in pipeline::list_images(folder)? {
        let entry = match pipeline::extract_records(ocr, normalizer, &image) {
            Ok(records) => serde_json::json!({
                "image": image.display().to_string(),
                "records": records,
            }),
            Err(e) => serde_json::json!({
                "image": image.display().to_string(),
                "error": e.to_string(),
            }),
        };
        entries.push(entry);
    }
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}
