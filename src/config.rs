use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::converter::Zone;
use crate::models::ImageQuality;

pub const DEFAULT_API: &str = "https://svs.gsfc.nasa.gov/api/dialamoon";
pub const DOWNLOAD_SUBFOLDER: &str = "Moon Phases";

#[derive(Debug, Parser)]
#[command(name = "moon_phases")]
#[command(about = "Download NASA Dial-A-Moon images for a date and range of local hours")]
#[command(version)]
pub struct Cli {
    /// Dial-A-Moon API base URL
    #[arg(long, env = "MOON_API", default_value = DEFAULT_API)]
    pub api: String,

    /// Directory the images are saved in [default: <Downloads>/Moon Phases]
    #[arg(long, env = "MOON_DOWNLOAD_DIR")]
    pub download_dir: Option<PathBuf>,

    /// Image quality: standard (730x730 JPEG) or high (5760x3240 TIFF)
    #[arg(long, env = "MOON_QUALITY", value_enum, default_value_t = ImageQuality::Standard)]
    pub quality: ImageQuality,

    /// IANA timezone the date and hours are entered in, or "local"
    #[arg(long, env = "MOON_TIMEZONE", default_value = "local")]
    pub timezone: Zone,

    /// Per-request timeout in seconds
    #[arg(long, env = "MOON_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,

    /// Skip the confirmation before downloading
    #[arg(short, long)]
    pub yes: bool,

    /// Do not show download progress
    #[arg(long)]
    pub no_progress: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Everything the components need, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub download_dir: PathBuf,
    pub quality: ImageQuality,
    pub zone: Zone,
    pub timeout: Duration,
    pub confirm: bool,
    pub show_progress: bool,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            api_base: cli.api.trim_end_matches('/').to_string(),
            download_dir: cli.download_dir.unwrap_or_else(default_download_dir),
            quality: cli.quality,
            zone: cli.timezone,
            timeout: Duration::from_secs(cli.timeout.max(1)),
            confirm: !cli.yes,
            show_progress: !cli.no_progress,
        }
    }
}

pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DOWNLOAD_SUBFOLDER)
}
