//! Shared conversion configuration.
//!
//! [`CaptureState`] is the single mutable configuration record of the
//! process: the host protocol handler writes it, the encoders and the
//! dithering engine read it. There is exactly one owner (the driver)
//! and a single thread of control, so it is a plain struct passed by
//! borrow, with no locking and no globals.

use crate::raster::{BLUE_MASK, GREEN_MASK, RED_MASK, Rgb565};

// ── MonoThreshold ────────────────────────────────────────────────

/// Per-channel monochrome comparison values, pre-shifted into the
/// channel's bit position so the hot path compares masked packed
/// values directly without unpacking.
///
/// Always derived from a single 8-bit level, never set field-by-field:
/// each channel gets the level quantised to its own bit depth
/// (`level >> 3` for the 5-bit fields, `level >> 2` for green).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonoThreshold {
    /// Red comparand, `(level >> 3) << 11`.
    r: u16,
    /// Green comparand, `(level >> 2) << 5`.
    g: u16,
    /// Blue comparand, `level >> 3`.
    b: u16,
}

/// Startup default. An arbitrary level that renders reasonably for UIs
/// that were never designed for monochrome output.
pub const DEFAULT_THRESHOLD_LEVEL: u8 = 25;

impl MonoThreshold {
    /// Derive the per-channel comparands from an 8-bit level.
    pub const fn from_level(level: u8) -> Self {
        Self {
            r: ((level >> 3) as u16) << 11,
            g: ((level >> 2) as u16) << 5,
            b: (level >> 3) as u16,
        }
    }

    /// Whether a packed pixel renders "on" in monochrome output.
    ///
    /// A pixel is on as soon as any one channel exceeds its threshold.
    /// The comparison is on raw masked bit fields, not normalised
    /// magnitudes, so this is a cheap approximation rather than a true
    /// luminance weighting.
    pub const fn pixel_on(&self, pixel: u16) -> bool {
        (pixel & RED_MASK) > self.r || (pixel & GREEN_MASK) > self.g || (pixel & BLUE_MASK) > self.b
    }

    /// Red threshold in its natural 5-bit scale (0..=31).
    pub const fn r5(&self) -> i16 {
        (self.r >> 11) as i16
    }

    /// Green threshold in its natural 6-bit scale (0..=63).
    pub const fn g6(&self) -> i16 {
        (self.g >> 5) as i16
    }

    /// Blue threshold in its natural 5-bit scale (0..=31).
    pub const fn b5(&self) -> i16 {
        self.b as i16
    }

    /// Signed distance of a pixel from the threshold, used as the
    /// intensity signal for error diffusion.
    ///
    /// The 5-bit channels are weighted ×2 onto green's 6-bit scale so
    /// all three contribute comparably; a value of zero sits exactly on
    /// the threshold surface, keeping dithered and undithered output at
    /// the same average brightness.
    pub const fn headroom(&self, pixel: Rgb565) -> i16 {
        2 * (pixel.r5() as i16 - self.r5())
            + (pixel.g6() as i16 - self.g6())
            + 2 * (pixel.b5() as i16 - self.b5())
    }

    /// Largest headroom any pixel can reach under this threshold
    /// (attained by saturated white). The dithering engine quantises
    /// "on" pixels against this, so a solid white frame diffuses zero
    /// error and stays solid.
    pub const fn max_headroom(&self) -> i16 {
        2 * (31 - self.r5()) + (63 - self.g6()) + 2 * (31 - self.b5())
    }

    /// Smallest reachable headroom (attained by black); the "off"
    /// quantisation target.
    pub const fn min_headroom(&self) -> i16 {
        -(2 * self.r5() + self.g6() + 2 * self.b5())
    }
}

impl Default for MonoThreshold {
    fn default() -> Self {
        Self::from_level(DEFAULT_THRESHOLD_LEVEL)
    }
}

// ── DitherMode ───────────────────────────────────────────────────

/// Error-diffusion algorithm selector, set by host opcode 7.
///
/// Wire mapping: 0 = none, 1 = Floyd–Steinberg, 2 = Atkinson. Any
/// other nonzero value selects Floyd–Steinberg so that "dithering on"
/// from the host's point of view is never silently off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DitherMode {
    #[default]
    None,
    FloydSteinberg,
    Atkinson,
}

impl From<u8> for DitherMode {
    fn from(value: u8) -> Self {
        match value {
            0 => DitherMode::None,
            2 => DitherMode::Atkinson,
            _ => DitherMode::FloydSteinberg,
        }
    }
}

impl DitherMode {
    pub const fn is_enabled(self) -> bool {
        !matches!(self, DitherMode::None)
    }
}

// ── SnapshotFormat ───────────────────────────────────────────────

/// Output format for the next snapshot, selected by opcodes 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// 24-bit direct colour, 3 bytes per pixel. Opcodes 1 and 2 are
    /// synonyms; hosts in the field send both.
    Rgb24,
    /// Native packed 16-bit colour, 2 bytes per pixel (opcode 3).
    Rgb565,
    /// 1-bit monochrome, row-major, 8 pixels per byte (opcode 4).
    Mono,
    /// 1-bit monochrome scanned down the columns: a 90°-rotated,
    /// flipped rendering for portrait-mounted displays (opcode 5).
    MonoColumns,
}

impl SnapshotFormat {
    /// Map a snapshot-request opcode to its format, or `None` for
    /// opcodes that do not request a snapshot.
    pub const fn from_opcode(opcode: u8) -> Option<Self> {
        match opcode {
            1 | 2 => Some(SnapshotFormat::Rgb24),
            3 => Some(SnapshotFormat::Rgb565),
            4 => Some(SnapshotFormat::Mono),
            5 => Some(SnapshotFormat::MonoColumns),
            _ => None,
        }
    }
}

// ── CaptureState ─────────────────────────────────────────────────

/// Mutable conversion configuration shared across one snapshot cycle.
#[derive(Debug, Clone, Default)]
pub struct CaptureState {
    /// Current monochrome conversion threshold.
    pub threshold: MonoThreshold,
    /// Current dithering algorithm.
    pub dither: DitherMode,
    /// Format requested by the host for the next snapshot; cleared as
    /// soon as one snapshot has been emitted.
    pub pending: Option<SnapshotFormat>,
}

impl CaptureState {
    /// Recompute the per-channel thresholds from an 8-bit level
    /// (host opcode 6).
    pub fn set_threshold_level(&mut self, level: u8) {
        self.threshold = MonoThreshold::from_level(level);
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_derivation_ranges() {
        for level in 0u8..=255 {
            let t = MonoThreshold::from_level(level);
            assert_eq!(t.b5(), (level >> 3) as i16);
            assert!((0..=31).contains(&t.b5()));
            // Pre-shifted comparands step in units of their bit position.
            assert_eq!(t.g, ((level >> 2) as u16) << 5);
            assert_eq!(t.g % 32, 0);
            assert_eq!(t.r, ((level >> 3) as u16) << 11);
            assert_eq!(t.r % 2048, 0);
        }
    }

    #[test]
    fn pixel_on_is_per_channel_or() {
        let t = MonoThreshold::from_level(25); // r5/b5 = 3, g6 = 6
        assert!(!t.pixel_on(0x0000));
        // Each channel alone can switch the pixel on.
        assert!(t.pixel_on(0xf800));
        assert!(t.pixel_on(0x07e0));
        assert!(t.pixel_on(0x001f));
        // Exactly at the threshold is still off (strict greater-than).
        let at = ((3u16) << 11) | ((6u16) << 5) | 3;
        assert!(!t.pixel_on(at));
        assert!(t.pixel_on(at + 1));
    }

    #[test]
    fn headroom_zero_on_threshold_surface() {
        let t = MonoThreshold::from_level(25);
        let at = ((3u16) << 11) | ((6u16) << 5) | 3;
        assert_eq!(t.headroom(Rgb565(at)), 0);
        assert!(t.headroom(Rgb565(0xffff)) > 0);
        assert!(t.headroom(Rgb565(0)) < 0);
    }

    #[test]
    fn headroom_extremes_are_attained_by_white_and_black() {
        for level in [0u8, 25, 128, 255] {
            let t = MonoThreshold::from_level(level);
            assert_eq!(t.headroom(Rgb565(0xffff)), t.max_headroom());
            assert_eq!(t.headroom(Rgb565(0x0000)), t.min_headroom());
            assert!(t.max_headroom() >= t.min_headroom());
        }
    }

    #[test]
    fn opcode_to_format() {
        assert_eq!(SnapshotFormat::from_opcode(1), Some(SnapshotFormat::Rgb24));
        assert_eq!(SnapshotFormat::from_opcode(2), Some(SnapshotFormat::Rgb24));
        assert_eq!(SnapshotFormat::from_opcode(3), Some(SnapshotFormat::Rgb565));
        assert_eq!(SnapshotFormat::from_opcode(4), Some(SnapshotFormat::Mono));
        assert_eq!(
            SnapshotFormat::from_opcode(5),
            Some(SnapshotFormat::MonoColumns)
        );
        assert_eq!(SnapshotFormat::from_opcode(6), None);
        assert_eq!(SnapshotFormat::from_opcode(0), None);
    }

    #[test]
    fn dither_mode_wire_mapping() {
        assert_eq!(DitherMode::from(0), DitherMode::None);
        assert_eq!(DitherMode::from(1), DitherMode::FloydSteinberg);
        assert_eq!(DitherMode::from(2), DitherMode::Atkinson);
        // Unknown nonzero values still enable dithering.
        assert_eq!(DitherMode::from(9), DitherMode::FloydSteinberg);
        assert!(!DitherMode::None.is_enabled());
        assert!(DitherMode::Atkinson.is_enabled());
    }
}
