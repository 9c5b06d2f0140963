//! Error-diffusion dithering.
//!
//! Converts a raster into a per-pixel on/off [`DecisionBuffer`] for the
//! monochrome encoders. The quantisation signal is the threshold
//! headroom from [`MonoThreshold::headroom`], the signed distance of a
//! pixel from the same per-channel thresholds the undithered path
//! compares against, so toggling dithering on or off does not shift
//! the overall average brightness of the output.
//!
//! Both algorithms are fully deterministic: the same raster, threshold
//! and mode always produce a byte-identical decision buffer.

use crate::raster::Raster;
use crate::state::{DitherMode, MonoThreshold};

// ── DecisionBuffer ───────────────────────────────────────────────

/// One signed value per logical pixel (no stride padding), row-major.
/// Zero means "pixel off"; any nonzero value means "pixel on".
#[derive(Debug, Clone)]
pub struct DecisionBuffer {
    width: u32,
    values: Vec<i16>,
}

impl DecisionBuffer {
    /// Allocate a buffer for `width × height` logical pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            values: vec![0; width as usize * height as usize],
        }
    }

    /// Logical row length in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// All decisions, row-major.
    pub fn values(&self) -> &[i16] {
        &self.values
    }

    /// Whether the pixel at logical index `idx` renders "on".
    pub fn on(&self, idx: usize) -> bool {
        self.values[idx] != 0
    }
}

// ── DitherEngine ─────────────────────────────────────────────────

/// Error-diffusion engine with a reusable working buffer.
///
/// Stateless across invocations apart from scratch storage; call
/// [`apply`](Self::apply) once per snapshot when the configured mode is
/// anything other than [`DitherMode::None`].
#[derive(Debug, Default)]
pub struct DitherEngine {
    /// Diffused signal values, `width × height`, rebuilt every apply.
    work: Vec<i32>,
}

impl DitherEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill `out` with one on/off decision per logical pixel.
    pub fn apply(
        &mut self,
        raster: &Raster,
        threshold: &MonoThreshold,
        mode: DitherMode,
        out: &mut DecisionBuffer,
    ) {
        debug_assert!(mode.is_enabled(), "apply called with dithering disabled");

        let geometry = raster.geometry();
        let width = geometry.width as usize;
        let height = geometry.height as usize;
        debug_assert_eq!(out.values.len(), width * height);

        // Seed the working grid with the raw headroom signal.
        self.work.clear();
        self.work.reserve(width * height);
        for y in 0..geometry.height {
            for &pixel in raster.row(y) {
                self.work
                    .push(threshold.headroom(crate::raster::Rgb565(pixel)) as i32);
            }
        }

        // Quantisation targets are the extremes the headroom signal can
        // actually attain under the current threshold, so saturated
        // white and pure black carry zero residual error and render
        // solid, exactly like the undithered path.
        let targets = (
            threshold.max_headroom() as i32,
            threshold.min_headroom() as i32,
        );

        match mode {
            DitherMode::FloydSteinberg => self.floyd_steinberg(width, height, targets, out),
            DitherMode::Atkinson => self.atkinson(width, height, targets, out),
            DitherMode::None => unreachable!(),
        }
    }

    /// Classic Floyd–Steinberg with serpentine row traversal. The
    /// 7/16 – 3/16 – 5/16 – 1/16 kernel is mirrored on right-to-left
    /// rows.
    fn floyd_steinberg(
        &mut self,
        width: usize,
        height: usize,
        (on_target, off_target): (i32, i32),
        out: &mut DecisionBuffer,
    ) {
        for y in 0..height {
            let rightward = y % 2 == 0;
            for step in 0..width {
                let x = if rightward { step } else { width - 1 - step };
                let idx = y * width + x;

                let value = self.work[idx];
                let on = value > 0;
                out.values[idx] = on as i16;

                let err = value - if on { on_target } else { off_target };
                let (ahead, behind): (isize, isize) = if rightward { (1, -1) } else { (-1, 1) };

                self.spill(x as isize + ahead, y, width, height, err * 7 / 16);
                self.spill(x as isize + behind, y + 1, width, height, err * 3 / 16);
                self.spill(x as isize, y + 1, width, height, err * 5 / 16);
                self.spill(x as isize + ahead, y + 1, width, height, err / 16);
            }
        }
    }

    /// Atkinson: six neighbours at 1/8 each, a quarter of the error
    /// deliberately discarded (higher contrast, classic Mac look).
    fn atkinson(
        &mut self,
        width: usize,
        height: usize,
        (on_target, off_target): (i32, i32),
        out: &mut DecisionBuffer,
    ) {
        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;

                let value = self.work[idx];
                let on = value > 0;
                out.values[idx] = on as i16;

                let share = (value - if on { on_target } else { off_target }) / 8;
                let x = x as isize;
                self.spill(x + 1, y, width, height, share);
                self.spill(x + 2, y, width, height, share);
                self.spill(x - 1, y + 1, width, height, share);
                self.spill(x, y + 1, width, height, share);
                self.spill(x + 1, y + 1, width, height, share);
                self.spill(x, y + 2, width, height, share);
            }
        }
    }

    /// Add `err` to the working cell at `(x, y)` if it is in bounds.
    fn spill(&mut self, x: isize, y: usize, width: usize, height: usize, err: i32) {
        if x >= 0 && (x as usize) < width && y < height {
            self.work[y * width + x as usize] += err;
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
