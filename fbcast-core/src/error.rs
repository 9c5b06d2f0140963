//! Error types for the capture pipeline and host protocol.
//!
//! Every failure here is terminal by design: fbcast runs as a supervised
//! child process, and its controller restarts it on any nonzero exit.
//! There is no resynchronisation or retry anywhere in the core.

use thiserror::Error;

/// The canonical error type for the fbcast pipeline.
#[derive(Debug, Error)]
pub enum FbError {
    // ── Protocol Errors ──────────────────────────────────────────
    /// The fixed 3-byte zero header of a host command was nonzero.
    #[error("protocol violation: unexpected command bytes {0:02x} {1:02x} {2:02x} {3:02x}")]
    BadCommandHeader(u8, u8, u8, u8),

    /// A single command would exceed the request buffer capacity.
    #[error("command too large: {size} bytes (buffer capacity {capacity})")]
    CommandTooLarge { size: usize, capacity: usize },

    // ── Capture Errors ───────────────────────────────────────────
    /// The capture provider could not be initialised for the
    /// requested display/geometry.
    #[error("capture initialisation failed: {0}")]
    CaptureInit(String),

    /// The capture provider failed to deliver a frame.
    #[error("frame capture failed: {0}")]
    CaptureFrame(String),

    /// Provider geometry cannot be encoded in the requested format
    /// (mono encoders pack 8 pixels per byte).
    #[error("unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    // ── Transport Errors ─────────────────────────────────────────
    /// The stdin/stdout transport reported an error.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}
