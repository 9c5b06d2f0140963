//! # fbcast-core
//!
//! Device-side framebuffer snapshot pipeline and host command protocol.
//!
//! fbcast runs as a supervised child process of a controlling host: it
//! announces the capture geometry once, then answers length-prefixed
//! commands on stdin with framed snapshot payloads on stdout.
//!
//! This crate contains:
//! - **Raster**: packed RGB565 frame storage with stride-aware access
//! - **State**: shared conversion configuration (thresholds, dithering,
//!   pending snapshot format)
//! - **Protocol**: streaming decoder for the host command format
//! - **Dither**: error-diffusion engines producing per-pixel decisions
//! - **Encode**: the four snapshot encoders (rgb24, rgb565, mono
//!   row-major, mono column-major)
//! - **Framer**: reusable 4-byte big-endian length framing
//! - **Capture**: the provider trait real backends implement
//! - **Driver**: the single-threaded event loop tying it all together
//! - **Error**: the typed `thiserror`-based failure taxonomy

pub mod capture;
pub mod dither;
pub mod driver;
pub mod encode;
pub mod error;
pub mod framer;
pub mod protocol;
pub mod raster;
pub mod state;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use capture::{BACKEND_NAME_SIZE, CAPABILITY_PACKET_SIZE, CaptureInfo, CaptureProvider};
pub use dither::{DecisionBuffer, DitherEngine};
pub use driver::Driver;
pub use encode::{encode_snapshot, max_payload_size};
pub use error::FbError;
pub use framer::{FrameBuffer, LENGTH_HEADER_SIZE};
pub use protocol::{REQUEST_BUFFER_CAPACITY, Request, RequestDecoder};
pub use raster::{FrameGeometry, Raster, Rgb565};
pub use state::{
    CaptureState, DEFAULT_THRESHOLD_LEVEL, DitherMode, MonoThreshold, SnapshotFormat,
};
