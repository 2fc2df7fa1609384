//! Crate-wide error type.

use thiserror::Error;

/// Errors surfaced by the network and configuration layers.
///
/// The color mapper and the projector never produce these; they are total
/// over their input.
#[derive(Debug, Error)]
pub enum ToneLensError {
    /// A required configuration value is empty or absent.
    #[error("missing configuration: {field} (set it in the config file or environment)")]
    MissingConfig { field: &'static str },

    /// A TCP-level connection or transport failure.
    #[error("connection failed to {url}: {detail}")]
    Connect { url: String, detail: String },

    /// The remote service replied with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// The response body could not be decoded into the expected shape.
    #[error("JSON parse error: {detail}")]
    Json { detail: String },

    /// The config file exists but could not be read or parsed.
    #[error("invalid config file {path}: {detail}")]
    ConfigFile { path: String, detail: String },

    /// An inbound HTTP request to the web UI could not be parsed.
    #[error("malformed request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ToneLensError>;
