//! Captured-frame representation.
//!
//! A [`Raster`] holds one captured framebuffer frame in packed RGB565:
//! `height` rows of `stride` 16-bit pixels each. `stride` may exceed
//! `width` because capture backends pad rows to their own alignment
//! (e.g. the VideoCore GPU pads to 16-pixel boundaries). Encoders must
//! skip the padding; the provider overwrites the whole buffer in place
//! on every snapshot.

/// Bit masks for the three RGB565 channel fields.
pub const RED_MASK: u16 = 0xf800;
pub const GREEN_MASK: u16 = 0x07e0;
pub const BLUE_MASK: u16 = 0x001f;

// ── Rgb565 ───────────────────────────────────────────────────────

/// A single packed 5-6-5 pixel: red in bits 15..11, green in 10..5,
/// blue in 4..0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb565(pub u16);

impl Rgb565 {
    /// Red field value, 0..=31.
    pub const fn r5(self) -> u16 {
        self.0 >> 11
    }

    /// Green field value, 0..=63.
    pub const fn g6(self) -> u16 {
        (self.0 >> 5) & 0x3f
    }

    /// Blue field value, 0..=31.
    pub const fn b5(self) -> u16 {
        self.0 & 0x1f
    }

    /// Expand to 8-bit-per-channel by left-shifting each field into
    /// the top of a byte: `r8 = r5 << 3`, `g8 = g6 << 2`, `b8 = b5 << 3`.
    pub const fn to_rgb888(self) -> [u8; 3] {
        [
            (self.r5() << 3) as u8,
            (self.g6() << 2) as u8,
            (self.b5() << 3) as u8,
        ]
    }
}

// ── FrameGeometry ────────────────────────────────────────────────

/// Geometry of one captured raster, fixed at provider initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    /// Logical frame width in pixels.
    pub width: u32,
    /// Logical frame height in pixels.
    pub height: u32,
    /// Storage row length in **pixels** (not bytes); `stride >= width`.
    pub stride: u32,
}

impl FrameGeometry {
    /// Number of logical (non-padding) pixels.
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of stored `u16` elements, padding included.
    pub const fn storage_len(&self) -> usize {
        self.stride as usize * self.height as usize
    }
}

// ── Raster ───────────────────────────────────────────────────────

/// One captured frame: RGB565 pixel storage plus its geometry.
///
/// Allocated once at startup and refilled in place by the capture
/// provider on every snapshot request. Read-only to encoders.
#[derive(Debug, Clone)]
pub struct Raster {
    geometry: FrameGeometry,
    data: Vec<u16>,
}

impl Raster {
    /// Allocate a zeroed raster for the given geometry.
    pub fn new(geometry: FrameGeometry) -> Self {
        Self {
            geometry,
            data: vec![0; geometry.storage_len()],
        }
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// Full pixel storage, padding included.
    pub fn data(&self) -> &[u16] {
        &self.data
    }

    /// Mutable pixel storage for the capture provider to fill.
    pub fn data_mut(&mut self) -> &mut [u16] {
        &mut self.data
    }

    /// The `width` logical pixels of row `y` (padding stripped).
    pub fn row(&self, y: u32) -> &[u16] {
        let start = y as usize * self.geometry.stride as usize;
        &self.data[start..start + self.geometry.width as usize]
    }

    /// The packed pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Rgb565 {
        Rgb565(self.data[y as usize * self.geometry.stride as usize + x as usize])
    }
}

// ── Tests ────────────────────────────────────────────────────────
