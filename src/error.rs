use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaToolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MediaToolError>;

/// Why a metadata probe produced nothing usable.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("prober exited with status {code:?}: {stderr}")]
    ToolFailed { code: Option<i32>, stderr: String },

    #[error("prober output could not be parsed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("failed to execute prober: {0}")]
    Invocation(#[from] std::io::Error),
}
