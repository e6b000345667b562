//! mediatool - ffmpeg/ffprobe invocation helpers
//!
//! Thumbnail, audio and subtitle extraction plus metadata probing, each a
//! single blocking call to an external tool.

pub mod cli;
pub mod config;
pub mod error;
pub mod media;

pub use config::Config;
pub use error::{MediaToolError, ProbeError, Result};
pub use media::{MediaMetadata, MediaToolFactory, MediaToolInvoker, MediaToolTrait};
