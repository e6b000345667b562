use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use super::commands::CommandOutcome;
use crate::error::ProbeError;

/// Format and stream sections of an ffprobe JSON dump
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    #[serde(default)]
    pub format: Map<String, Value>,
    #[serde(default)]
    pub streams: Vec<Map<String, Value>>,
}

impl MediaMetadata {
    /// Parse the prober's stdout
    pub fn from_json(bytes: &[u8]) -> Result<Self, ProbeError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Interpret a finished prober run
    pub fn from_outcome(outcome: &CommandOutcome) -> Result<Self, ProbeError> {
        if !outcome.success() {
            return Err(ProbeError::ToolFailed {
                code: outcome.code,
                stderr: outcome.stderr_lossy(),
            });
        }
        Self::from_json(&outcome.stdout)
    }

    /// Streams whose `codec_type` matches, in container order
    pub fn streams_of_type<'a>(
        &'a self,
        codec_type: &'a str,
    ) -> impl Iterator<Item = &'a Map<String, Value>> + 'a {
        self.streams
            .iter()
            .filter(move |s| s.get("codec_type").and_then(Value::as_str) == Some(codec_type))
    }

    pub fn audio_streams(&self) -> Vec<&Map<String, Value>> {
        self.streams_of_type("audio").collect()
    }

    pub fn subtitle_streams(&self) -> Vec<&Map<String, Value>> {
        self.streams_of_type("subtitle").collect()
    }

    /// Container duration; ffprobe reports it as a decimal string
    pub fn duration(&self) -> Option<Duration> {
        let secs = match self.format.get("duration")? {
            Value::String(s) => s.parse::<f64>().ok()?,
            Value::Number(n) => n.as_f64()?,
            _ => return None,
        };
        if secs.is_finite() && secs >= 0.0 {
            Some(Duration::from_secs_f64(secs))
        } else {
            None
        }
    }

    pub fn format_name(&self) -> Option<&str> {
        self.format.get("format_name").and_then(Value::as_str)
    }
}
