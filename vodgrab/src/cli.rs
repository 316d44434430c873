use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "vodgrab", author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "VODGRAB_CONFIG")]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Acquire a video into a local MP4 file
    Download {
        /// Player page URL, or a vimeo.com/<id> link
        url: String,

        /// Destination file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// File name inside the output directory (".mp4" is appended)
        #[arg(long, conflicts_with = "output")]
        filename: Option<String>,

        /// Expected duration in seconds, used for the percentage
        #[arg(short, long)]
        duration: Option<u64>,

        /// Use the duration published by the page when available
        #[arg(long)]
        auto_duration: bool,

        /// Referer sent with page requests
        #[arg(long)]
        referer: Option<String>,

        /// Print progress events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Extract and print video metadata without downloading
    Info {
        url: String,

        #[arg(long)]
        referer: Option<String>,

        /// Print the descriptor as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify that ffmpeg can be started
    Check,

    /// Configuration helpers
    Config {
        /// Print the effective configuration
        #[arg(long)]
        show: bool,
    },
}
