//! Error types for the SADP engine.

use thiserror::Error;

/// Main error type for all SADP operations.
#[derive(Debug, Error)]
pub enum SadpError {
    /// Send or receive failed on the link-layer channel.
    #[error("transport failure: {0}")]
    Transport(#[source] std::io::Error),

    /// Captured buffer is too short to hold a SADP frame.
    #[error("malformed frame: {len} bytes, need at least {minimum}")]
    MalformedFrame { len: usize, minimum: usize },

    /// Strict decode only: the frame does not start with 0x21.
    #[error("bad prefix byte 0x{0:02x}")]
    BadPrefix(u8),

    /// Strict decode only: recomputed checksum differs from the transmitted one.
    #[error("checksum mismatch: frame carries 0x{actual:04x}, computed 0x{expected:04x}")]
    ChecksumMismatch { expected: u16, actual: u16 },

    /// The word buffer ended before the discriminant was consumed.
    #[error("checksum input too short: discriminant 0x{discriminant:02x} needs {needed} words, got {available}")]
    ChecksumOutOfBounds {
        discriminant: u32,
        needed: usize,
        available: usize,
    },

    /// A packet listener reported a failure during dispatch.
    #[error("listener failure: {0}")]
    Listener(String),

    /// Invalid configuration value.
    #[error("config error: {0}")]
    Config(String),

    /// JSON parse error while loading the configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error outside the transport (config files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using SadpError.
pub type Result<T> = std::result::Result<T, SadpError>;
