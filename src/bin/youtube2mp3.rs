//! Download the audio of one YouTube video as mp3.
//!
//! Usage:
//!     youtube2mp3 -u 'https://www.youtube.com/watch?v=...' -n
//!     youtube2mp3 --video-id VIDEO_ID -q 192K -a 'Artist'

use std::path::PathBuf;
use std::process;

use clap::{ArgGroup, Parser};
use log::error;

use songshot::{AudioQuality, DownloadRequest, FetchProvider, YtDlpFetcher};

#[derive(Debug, Parser)]
#[command(name = "youtube2mp3", version, about = "Download YouTube video audio and convert to MP3")]
#[command(group(ArgGroup::new("source").required(true).args(["url", "video_id"])))]
struct Cli {
    /// The URL of the YouTube video
    #[arg(short, long)]
    url: Option<String>,

    /// The ID of the YouTube video
    #[arg(short = 'v', long)]
    video_id: Option<String>,

    /// The audio quality (bitrate such as 128K, or VBR level 0-10)
    #[arg(short = 'q', long, default_value = "128K")]
    audio_quality: AudioQuality,

    /// Artist name to prepend to the filename
    #[arg(short, long)]
    artist: Option<String>,

    /// Prepend the YouTube channel name to the filename
    #[arg(short = 'n', long)]
    add_account_name: bool,

    /// Where to write the mp3 file
    #[arg(long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Path to the yt-dlp executable
    #[arg(long, value_name = "PATH", default_value = "yt-dlp")]
    yt_dlp: String,
}

fn main() {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Info);
    clog.init();

    let cli = Cli::parse();

    // yt-dlp accepts bare video IDs as well as URLs
    let url = match (cli.url, cli.video_id) {
        (Some(url), _) => url,
        (None, Some(id)) => id,
        (None, None) => unreachable!("clap requires --url or --video-id"),
    };

    let fetcher = YtDlpFetcher::new(&cli.yt_dlp, cli.audio_quality, cli.add_account_name, &cli.output_dir);
    let request = DownloadRequest {
        title: url.clone(),
        url,
        artist: cli.artist.unwrap_or_default(),
    };

    if let Err(e) = fetcher.fetch(&request) {
        error!("Download failed: {}", e);
        process::exit(1);
    }
}
