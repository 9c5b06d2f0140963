//! Test-pattern capture backend.
//!
//! Real deployments attach a platform capture backend behind
//! [`CaptureProvider`] (on the Raspberry Pi that is the VideoCore
//! dispmanx snapshot service). This backend stands in on machines
//! without one: it renders deterministic colour bars with a moving
//! scan line, so the whole pipeline from protocol decoding through the
//! encoders can be exercised end to end.

use async_trait::async_trait;

use fbcast_core::{CaptureInfo, CaptureProvider, FbError, Raster};

/// Simulated backing display size reported in the capability packet.
const DISPLAY_WIDTH: u32 = 1920;
const DISPLAY_HEIGHT: u32 = 1080;

/// The eight standard colour bars, brightest to darkest, as RGB565.
const BARS: [u16; 8] = [
    0xffff, // white
    0xffe0, // yellow
    0x07ff, // cyan
    0x07e0, // green
    0xf81f, // magenta
    0xf800, // red
    0x001f, // blue
    0x0000, // black
];

/// Deterministic colour-bar pattern source.
pub struct PatternBackend {
    info: CaptureInfo,
    frame_counter: u32,
}

impl PatternBackend {
    /// "Initialise" the backend for a display device.
    ///
    /// The requested geometry is rounded down to multiples of 8 (the
    /// mono encoders pack 8 pixels per byte) and the stride is padded
    /// to a 16-pixel boundary the way the real GPU backends pad rows;
    /// the rounded geometry is what the capability packet reports.
    pub fn new(display_id: u32, width: u32, height: u32) -> Result<Self, FbError> {
        let capture_width = width & !7;
        let capture_height = height & !7;
        if capture_width == 0 || capture_height == 0 {
            return Err(FbError::CaptureInit(format!(
                "requested geometry {width}x{height} rounds to zero"
            )));
        }
        let capture_stride = (capture_width + 15) & !15;

        Ok(Self {
            info: CaptureInfo {
                backend_name: CaptureInfo::encode_backend_name("pattern"),
                display_id,
                display_width: DISPLAY_WIDTH,
                display_height: DISPLAY_HEIGHT,
                capture_width,
                capture_height,
                capture_stride,
            },
            frame_counter: 0,
        })
    }
}

#[async_trait]
impl CaptureProvider for PatternBackend {
    fn info(&self) -> &CaptureInfo {
        &self.info
    }

    async fn capture_frame(&mut self, raster: &mut Raster) -> Result<(), FbError> {
        let g = raster.geometry();
        let bar_width = (g.width / BARS.len() as u32).max(1);
        let scan_line = self.frame_counter % g.height;
        self.frame_counter = self.frame_counter.wrapping_add(1);

        for y in 0..g.height {
            for x in 0..g.stride {
                let pixel = if y == scan_line {
                    0xffff
                } else {
                    let bar = ((x / bar_width) as usize).min(BARS.len() - 1);
                    BARS[bar]
                };
                raster.data_mut()[(y * g.stride + x) as usize] = pixel;
            }
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────
