//! Error types for jamloop
//!
//! Only fatal conditions are errors. Transient absence (no device, no bytes)
//! and partial input are represented as empty results and never reach here.

use thiserror::Error;

/// The main error type for dispatch loop operations
#[derive(Debug, Error)]
pub enum Error {
    #[error("Input stream error: {0}")]
    Stream(#[from] std::io::Error),

    #[error("Input stream closed")]
    StreamClosed,

    #[error("{device} device error: {message}")]
    Device { device: &'static str, message: String },

    #[error("Host event loop error: {0}")]
    Host(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to release {resource}: {message}")]
    Release {
        resource: &'static str,
        message: String,
    },
}

/// Result type alias for dispatch loop operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a device error from anything printable
    pub fn device(device: &'static str, err: impl std::fmt::Display) -> Self {
        Error::Device {
            device,
            message: err.to_string(),
        }
    }
}

impl From<nix::errno::Errno> for Error {
    fn from(errno: nix::errno::Errno) -> Self {
        Error::Stream(std::io::Error::from(errno))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
