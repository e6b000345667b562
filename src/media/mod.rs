// Media tool invocation layer
//
// - Commands: argument-list builders and the process runner seam
// - Hwaccel: VA-API detection from the DRM device listing
// - Metadata: ffprobe JSON payload
// - Processor: the invoker tying them together

pub mod commands;
pub mod hwaccel;
pub mod metadata;
pub mod processor;

use std::path::Path;

pub use commands::*;
pub use metadata::MediaMetadata;
pub use processor::*;

use crate::config::Config;
use crate::error::Result;

/// Operations offered on top of ffmpeg and ffprobe.
///
/// Every operation is synchronous and independent; nothing is cached between
/// calls. Failures surface as `false` / `None` after being logged.
pub trait MediaToolTrait: Send + Sync {
    /// Whether a VA-API render node is present
    fn has_hardware_acceleration(&self) -> bool;

    /// Grab one frame at `timestamp` (HH:MM:SS, default from config) into an image
    fn extract_thumbnail(
        &self,
        video_path: &Path,
        image_path: &Path,
        timestamp: Option<&str>,
    ) -> bool;

    /// Extract 16 kHz mono s16le audio, optionally from the Nth audio stream.
    ///
    /// `Some(0)` selects the first audio stream explicitly (`-map 0:a:0`);
    /// only `None` leaves the choice to ffmpeg.
    fn extract_audio_track(
        &self,
        video_path: &Path,
        audio_path: &Path,
        audio_index: Option<u32>,
    ) -> bool;

    /// Extract a subtitle stream, optionally the Nth one.
    ///
    /// `Some(0)` selects the first subtitle stream explicitly (`-map 0:s:0`);
    /// only `None` leaves the choice to ffmpeg.
    fn extract_subtitle_track(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        subtitle_index: Option<u32>,
    ) -> bool;

    /// Format and stream info, `None` when it could not be obtained
    fn get_media_metadata(&self, video_path: &Path) -> Option<MediaMetadata>;

    /// Check that both ffmpeg and ffprobe can be executed
    fn check_availability(&self) -> Result<()>;

    /// First line of `ffmpeg -version`
    fn get_version_info(&self) -> Result<String>;
}

/// Factory for creating media tool instances
pub struct MediaToolFactory;

impl MediaToolFactory {
    /// Create the default implementation, spawning real processes
    pub fn create_invoker(config: Config) -> Box<dyn MediaToolTrait> {
        Box::new(processor::MediaToolInvoker::new(config))
    }
}
