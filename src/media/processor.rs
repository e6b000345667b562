use std::path::Path;
use tracing::{debug, error, info, warn};

use super::commands::{CommandRunner, MediaCommand, MediaCommandBuilder, SystemCommandRunner};
use super::hwaccel;
use super::metadata::MediaMetadata;
use super::MediaToolTrait;
use crate::config::Config;
use crate::error::{MediaToolError, ProbeError, Result};

/// Concrete implementation of the media tool (ffmpeg/ffprobe based)
pub struct MediaToolInvoker<R: CommandRunner = SystemCommandRunner> {
    config: Config,
    command_builder: MediaCommandBuilder,
    runner: R,
}

impl MediaToolInvoker {
    /// Create an invoker that spawns real processes, bounded by
    /// `media.timeout_secs` when set
    pub fn new(config: Config) -> Self {
        let runner = SystemCommandRunner::with_timeout(config.media.timeout());
        Self::with_runner(config, runner)
    }
}

impl<R: CommandRunner> MediaToolInvoker<R> {
    /// Create an invoker on top of a custom process runner
    pub fn with_runner(config: Config, runner: R) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.media);

        Self {
            config,
            command_builder,
            runner,
        }
    }

    /// Metadata probe that keeps the failure cause
    pub fn probe_metadata(
        &self,
        video_path: &Path,
    ) -> std::result::Result<MediaMetadata, ProbeError> {
        let command = self.command_builder.probe_metadata(video_path);
        debug!("Probing metadata: {}", command);

        let outcome = self.runner.run(&command)?;
        MediaMetadata::from_outcome(&outcome)
    }

    /// Run `command`; true iff it exits with status zero
    fn run_to_success(&self, command: &MediaCommand) -> bool {
        match command.execute(&self.runner) {
            Ok(outcome) if outcome.success() => true,
            Ok(outcome) => {
                warn!(
                    "{} exited with status {:?}: {}",
                    command.description,
                    outcome.code,
                    outcome.stderr_lossy().trim()
                );
                false
            }
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }
}

fn is_empty(path: &Path) -> bool {
    path.as_os_str().is_empty()
}

impl<R: CommandRunner> MediaToolTrait for MediaToolInvoker<R> {
    fn has_hardware_acceleration(&self) -> bool {
        hwaccel::detect_hardware_acceleration(&self.runner, &self.config.hwaccel)
    }

    fn extract_thumbnail(
        &self,
        video_path: &Path,
        image_path: &Path,
        timestamp: Option<&str>,
    ) -> bool {
        if is_empty(video_path) || is_empty(image_path) {
            return false;
        }

        let timestamp = timestamp.unwrap_or(self.config.thumbnail.default_timestamp.as_str());
        let use_vaapi = self.has_hardware_acceleration();
        let render_device = use_vaapi.then_some(self.config.hwaccel.render_device.as_str());

        let command = self
            .command_builder
            .thumbnail(video_path, image_path, timestamp, render_device);

        info!("Thumbnail command: {}", command);
        info!("VA-API hardware acceleration: {}", use_vaapi);

        self.run_to_success(&command)
    }

    fn extract_audio_track(
        &self,
        video_path: &Path,
        audio_path: &Path,
        audio_index: Option<u32>,
    ) -> bool {
        if is_empty(video_path) || is_empty(audio_path) {
            return false;
        }

        info!("Extracting audio from {} to {}", video_path.display(), audio_path.display());

        let command = self
            .command_builder
            .extract_audio(video_path, audio_path, audio_index);
        self.run_to_success(&command)
    }

    fn extract_subtitle_track(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        subtitle_index: Option<u32>,
    ) -> bool {
        if is_empty(video_path) || is_empty(subtitle_path) {
            return false;
        }

        info!(
            "Extracting subtitles from {} to {}",
            video_path.display(),
            subtitle_path.display()
        );

        let command = self
            .command_builder
            .extract_subtitle(video_path, subtitle_path, subtitle_index);
        self.run_to_success(&command)
    }

    fn get_media_metadata(&self, video_path: &Path) -> Option<MediaMetadata> {
        if is_empty(video_path) {
            return None;
        }

        match self.probe_metadata(video_path) {
            Ok(metadata) => Some(metadata),
            Err(ProbeError::ToolFailed { code, .. }) => {
                debug!("Prober exited with status {:?} for {}", code, video_path.display());
                None
            }
            Err(e) => {
                error!("Failed to read metadata of {}: {}", video_path.display(), e);
                None
            }
        }
    }

    fn check_availability(&self) -> Result<()> {
        for command in [
            self.command_builder.version_check(),
            self.command_builder.probe_version_check(),
        ] {
            let outcome = self.runner.run(&command).map_err(|e| {
                MediaToolError::Media(format!("{} not found: {}", command.binary_path, e))
            })?;

            if !outcome.success() {
                return Err(MediaToolError::Media(format!("{} failed", command.description)));
            }
        }

        info!("Media tools are available");
        Ok(())
    }

    fn get_version_info(&self) -> Result<String> {
        debug!("Getting media processor version information");

        let outcome = self.command_builder.version_check().execute(&self.runner)?;

        if outcome.success() {
            let version_info = outcome.stdout_lossy();
            let first_line = version_info.lines().next().unwrap_or("Unknown version");
            Ok(first_line.to_string())
        } else {
            Err(MediaToolError::Media(format!(
                "Media processor version check failed: {}",
                outcome.stderr_lossy()
            )))
        }
    }
}
