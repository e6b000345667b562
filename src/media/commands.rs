use std::fmt;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::MediaConfig;
use crate::error::{MediaToolError, Result};

/// Sample format, channel count and rate of extracted audio tracks.
pub const AUDIO_CODEC: &str = "pcm_s16le";
pub const AUDIO_CHANNELS: u32 = 1;
pub const AUDIO_SAMPLE_RATE: u32 = 16000;

/// Abstract media processing command representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Suppress the banner and anything below warning level
    pub fn quiet(self) -> Self {
        self.arg("-hide_banner").arg("-loglevel").arg("warning")
    }

    /// Select a stream of the first input, e.g. `0:a:2`
    pub fn map_stream(self, stream_type: char, index: u32) -> Self {
        self.arg("-map").arg(format!("0:{}:{}", stream_type, index))
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-acodec").arg(codec)
    }

    /// Set audio sample rate
    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    /// Set audio channels
    pub fn audio_channels(self, channels: u32) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    /// Add video filter
    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Seek to a position in the input
    pub fn seek<S: Into<String>>(self, position: S) -> Self {
        self.arg("-ss").arg(position)
    }

    /// Limit the number of video frames written
    pub fn video_frames(self, count: u32) -> Self {
        self.arg("-vframes").arg(count.to_string())
    }

    /// Force the output container format
    pub fn format<S: Into<String>>(self, format: S) -> Self {
        self.arg("-f").arg(format)
    }

    /// Whether any argument equals `needle`
    pub fn has_arg(&self, needle: &str) -> bool {
        self.args.iter().any(|a| a == needle)
    }

    /// Value following the first occurrence of `flag`
    pub fn arg_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Run the command through `runner`, turning spawn failures into errors
    pub fn execute(&self, runner: &dyn CommandRunner) -> Result<CommandOutcome> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        runner.run(self).map_err(|e| {
            MediaToolError::Media(format!("Failed to execute {}: {}", self.binary_path, e))
        })
    }
}

impl fmt::Display for MediaCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.binary_path)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Exit code and captured output of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutcome {
    pub fn new(code: i32, stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            code: Some(code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// True iff the exit code is exactly zero
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

impl From<Output> for CommandOutcome {
    fn from(output: Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

/// Runs a command to completion and reports how it ended.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &MediaCommand) -> io::Result<CommandOutcome>;
}

/// Spawns real child processes, capturing stdout and stderr.
///
/// With a timeout set, a child still running at the deadline is killed and
/// the run fails with `ErrorKind::TimedOut`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner {
    timeout: Option<Duration>,
}

impl SystemCommandRunner {
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, command: &MediaCommand) -> io::Result<CommandOutcome> {
        let mut cmd = Command::new(&command.binary_path);
        cmd.args(&command.args).stdin(Stdio::null());

        match self.timeout {
            Some(limit) => run_with_deadline(cmd, &command.binary_path, limit),
            None => cmd.output().map(CommandOutcome::from),
        }
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn run_with_deadline(
    mut cmd: Command,
    program: &str,
    limit: Duration,
) -> io::Result<CommandOutcome> {
    let mut child = cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).spawn()?;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);
    let start = Instant::now();

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(CommandOutcome {
                code: status.code(),
                stdout: collect(stdout),
                stderr: collect(stderr),
            });
        }

        if start.elapsed() >= limit {
            let _ = child.kill();
            let _ = child.wait();
            // Readers are detached: grandchildren may still hold the pipes open
            warn!("Killed {} after {}s", program, limit.as_secs_f64());
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("{} timed out after {}s", program, limit.as_secs_f64()),
            ));
        }

        thread::sleep(POLL_INTERVAL);
    }
}

fn drain<P: Read + Send + 'static>(mut pipe: P) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Builder for the ffmpeg/ffprobe invocations this crate issues
#[derive(Debug, Clone)]
pub struct MediaCommandBuilder {
    binary_path: String,
    probe_binary_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            binary_path: config.binary_path.clone(),
            probe_binary_path: config.probe_binary_path.clone(),
        }
    }

    /// Build thumbnail extraction command.
    ///
    /// With `render_device` set the frame is decoded through VA-API on that
    /// node and uploaded back to the hardware surface before encoding.
    pub fn thumbnail<P: AsRef<Path>>(
        &self,
        video_path: P,
        image_path: P,
        timestamp: &str,
        render_device: Option<&str>,
    ) -> MediaCommand {
        let cmd = MediaCommand::new(&self.binary_path, "Thumbnail extraction");

        match render_device {
            Some(device) => cmd
                .arg("-init_hw_device")
                .arg(format!("vaapi={}", device))
                .arg("-hwaccel")
                .arg("vaapi")
                .arg("-hwaccel_output_format")
                .arg("vaapi")
                .input(video_path)
                .seek(timestamp)
                .video_frames(1)
                .video_filter("format=nv12|vaapi,hwupload")
                .format("image2")
                .output(image_path),
            None => cmd
                .input(video_path)
                .seek(timestamp)
                .video_frames(1)
                .format("image2")
                .output(image_path),
        }
    }

    /// Build audio extraction command
    pub fn extract_audio<P: AsRef<Path>>(
        &self,
        video_path: P,
        audio_path: P,
        audio_index: Option<u32>,
    ) -> MediaCommand {
        let mut cmd = MediaCommand::new(&self.binary_path, "Audio extraction")
            .quiet()
            .overwrite()
            .input(video_path);

        if let Some(index) = audio_index {
            cmd = cmd.map_stream('a', index);
        }

        cmd.audio_codec(AUDIO_CODEC)
            .audio_channels(AUDIO_CHANNELS)
            .audio_sample_rate(AUDIO_SAMPLE_RATE)
            .output(audio_path)
    }

    /// Build subtitle extraction command; the output format follows the
    /// destination extension
    pub fn extract_subtitle<P: AsRef<Path>>(
        &self,
        video_path: P,
        subtitle_path: P,
        subtitle_index: Option<u32>,
    ) -> MediaCommand {
        let mut cmd = MediaCommand::new(&self.binary_path, "Subtitle extraction")
            .quiet()
            .overwrite()
            .input(video_path);

        if let Some(index) = subtitle_index {
            cmd = cmd.map_stream('s', index);
        }

        cmd.output(subtitle_path)
    }

    /// Build ffprobe command dumping format and stream info as JSON
    pub fn probe_metadata<P: AsRef<Path>>(&self, video_path: P) -> MediaCommand {
        MediaCommand::new(&self.probe_binary_path, "Metadata probe")
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .output(video_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check").arg("-version")
    }

    /// Build prober version check command
    pub fn probe_version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.probe_binary_path, "Prober version check").arg("-version")
    }
}
