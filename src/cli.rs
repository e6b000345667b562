use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Kill the external tool if it runs longer than this many seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report whether VA-API hardware acceleration is available
    Hwaccel,

    /// Extract a single frame from a video as an image
    Thumbnail {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output image file
        #[arg(short, long)]
        output: PathBuf,

        /// Seek position (HH:MM:SS); defaults to the configured timestamp
        #[arg(short, long)]
        timestamp: Option<String>,
    },

    /// Extract a 16 kHz mono WAV track from a video
    Audio {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output audio file
        #[arg(short, long)]
        output: PathBuf,

        /// Zero-based audio stream index
        #[arg(long)]
        index: Option<u32>,
    },

    /// Extract a subtitle track from a video
    Subtitle {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output subtitle file; the extension selects the format
        #[arg(short, long)]
        output: PathBuf,

        /// Zero-based subtitle stream index
        #[arg(long)]
        index: Option<u32>,
    },

    /// Print format and stream metadata as JSON
    Probe {
        /// Input media file
        #[arg(short, long)]
        input: PathBuf,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Check that ffmpeg and ffprobe are available
    Check,
}
