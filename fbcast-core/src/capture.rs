//! Capture provider seam.
//!
//! The actual display-capture mechanism lives behind
//! [`CaptureProvider`]: a backend is initialised once for a device id
//! and requested geometry, reports the *actual* geometry it can
//! deliver (which is authoritative for all subsequent sizing), and
//! then refills the caller's [`Raster`] on every snapshot request.
//! Backend resources are released on drop.

use async_trait::async_trait;
use bytes::{BufMut, BytesMut};

use crate::error::FbError;
use crate::raster::{FrameGeometry, Raster};

/// Fixed width of the backend name field in the capability packet.
pub const BACKEND_NAME_SIZE: usize = 16;

/// Capability packet payload size: name + five u32 fields.
pub const CAPABILITY_PACKET_SIZE: usize = BACKEND_NAME_SIZE + 5 * 4;

// ── CaptureInfo ──────────────────────────────────────────────────

/// Geometry and identity reported by a capture backend at
/// initialisation. Immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct CaptureInfo {
    /// Backend identifier, NUL-padded to 16 bytes on the wire.
    pub backend_name: [u8; BACKEND_NAME_SIZE],
    /// Display device the backend attached to.
    pub display_id: u32,
    /// Full display width in pixels.
    pub display_width: u32,
    /// Full display height in pixels.
    pub display_height: u32,
    /// Actual capture width (may differ from the requested width).
    pub capture_width: u32,
    /// Actual capture height (may differ from the requested height).
    pub capture_height: u32,
    /// Capture row length in pixels, `>= capture_width` (backends pad
    /// rows to their own alignment).
    pub capture_stride: u32,
}

impl CaptureInfo {
    /// NUL-pad a backend name into its fixed wire field. Longer names
    /// are truncated.
    pub fn encode_backend_name(name: &str) -> [u8; BACKEND_NAME_SIZE] {
        let mut field = [0u8; BACKEND_NAME_SIZE];
        let bytes = name.as_bytes();
        let n = bytes.len().min(BACKEND_NAME_SIZE);
        field[..n].copy_from_slice(&bytes[..n]);
        field
    }

    /// The raster geometry every encoder works against.
    pub fn geometry(&self) -> FrameGeometry {
        FrameGeometry {
            width: self.capture_width,
            height: self.capture_height,
            stride: self.capture_stride,
        }
    }

    /// Append the 36-byte capability payload: the backend name field
    /// followed by display id, display width/height and capture
    /// width/height as host-native u32s. The stride stays internal and
    /// is never put on the wire.
    pub fn encode_capability(&self, out: &mut BytesMut) {
        out.put_slice(&self.backend_name);
        out.put_slice(&self.display_id.to_ne_bytes());
        out.put_slice(&self.display_width.to_ne_bytes());
        out.put_slice(&self.display_height.to_ne_bytes());
        out.put_slice(&self.capture_width.to_ne_bytes());
        out.put_slice(&self.capture_height.to_ne_bytes());
    }
}

// ── CaptureProvider ──────────────────────────────────────────────

/// A display-capture backend.
///
/// Construction is backend-specific (device id + requested geometry in,
/// [`CaptureInfo`] with actual geometry out); a failed initialisation
/// is fatal to the process. After that the driver only ever asks for
/// frames, one per snapshot command.
#[async_trait]
pub trait CaptureProvider: Send {
    /// Geometry and identity fixed at initialisation.
    fn info(&self) -> &CaptureInfo;

    /// Fill `raster` with the current display contents. The raster is
    /// sized for [`CaptureInfo::geometry`] and overwritten whole.
    async fn capture_frame(&mut self, raster: &mut Raster) -> Result<(), FbError>;
}

// ── Tests ────────────────────────────────────────────────────────
