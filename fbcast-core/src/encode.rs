//! Snapshot encoders.
//!
//! Four pure conversions from a captured [`Raster`] to a framed wire
//! payload. All of them are stride-aware (padding pixels never reach
//! the output) and none of them can fail at runtime: geometry is fixed
//! when the capture provider initialises and validated once by the
//! driver, so a malformed input here is a programming error.
//!
//! The two monochrome encoders share a single "is this pixel on"
//! predicate and differ only in traversal order: row-major packs 8
//! horizontal neighbours per byte, column-major packs 8 vertical
//! neighbours per byte while walking columns left to right, which
//! yields a 90°-rotated, vertically flipped rendering for displays
//! mounted sideways.

use bytes::{BufMut, BytesMut};

use crate::dither::DecisionBuffer;
use crate::framer::FrameBuffer;
use crate::raster::{Raster, Rgb565};
use crate::state::{MonoThreshold, SnapshotFormat};

/// Encode one snapshot into `scratch`, returning the framed packet
/// (4-byte big-endian length + payload).
///
/// `decisions` carries the dithering output when dithering is enabled;
/// when `None` the mono formats threshold each pixel directly.
pub fn encode_snapshot<'a>(
    format: SnapshotFormat,
    raster: &Raster,
    threshold: &MonoThreshold,
    decisions: Option<&DecisionBuffer>,
    scratch: &'a mut FrameBuffer,
) -> &'a [u8] {
    match format {
        SnapshotFormat::Rgb24 => scratch.frame_with(|buf| encode_rgb24(raster, buf)),
        SnapshotFormat::Rgb565 => scratch.frame_with(|buf| encode_rgb565(raster, buf)),
        SnapshotFormat::Mono => {
            scratch.frame_with(|buf| encode_mono_rows(raster, threshold, decisions, buf))
        }
        SnapshotFormat::MonoColumns => {
            scratch.frame_with(|buf| encode_mono_columns(raster, threshold, decisions, buf))
        }
    }
}

/// Worst-case framed payload size for a given geometry (the 24-bit
/// format); used to size the scratch buffer once at startup.
pub fn max_payload_size(width: u32, height: u32) -> usize {
    3 * width as usize * height as usize
}

// ── Direct colour ────────────────────────────────────────────────

/// 3 bytes per pixel, row-major: each 5-6-5 field left-shifted into
/// the top of its byte.
fn encode_rgb24(raster: &Raster, out: &mut BytesMut) {
    let geometry = raster.geometry();
    out.reserve(3 * geometry.pixel_count());
    for y in 0..geometry.height {
        for &pixel in raster.row(y) {
            out.put_slice(&Rgb565(pixel).to_rgb888());
        }
    }
}

/// 2 bytes per pixel: each row's `width` packed pixels copied verbatim
/// in native (little-endian) byte order, stride padding dropped.
fn encode_rgb565(raster: &Raster, out: &mut BytesMut) {
    let geometry = raster.geometry();
    out.reserve(2 * geometry.pixel_count());
    for y in 0..geometry.height {
        for &pixel in raster.row(y) {
            out.put_slice(&pixel.to_le_bytes());
        }
    }
}

// ── Monochrome ───────────────────────────────────────────────────

/// The shared per-pixel predicate for both mono traversals.
///
/// `idx` is the logical (unpadded) pixel index used to look up the
/// dithering decision; without dithering the packed value is compared
/// against the per-channel thresholds directly.
#[inline]
fn pixel_on(
    threshold: &MonoThreshold,
    decisions: Option<&DecisionBuffer>,
    idx: usize,
    pixel: u16,
) -> bool {
    match decisions {
        Some(d) => d.on(idx),
        None => threshold.pixel_on(pixel),
    }
}

/// 8 horizontal pixels per byte, LSB-first (the leftmost pixel of each
/// group maps to bit 0). Requires `width % 8 == 0`.
fn encode_mono_rows(
    raster: &Raster,
    threshold: &MonoThreshold,
    decisions: Option<&DecisionBuffer>,
    out: &mut BytesMut,
) {
    let geometry = raster.geometry();
    debug_assert_eq!(geometry.width % 8, 0);
    out.reserve(geometry.pixel_count() / 8);

    let width = geometry.width as usize;
    for y in 0..geometry.height {
        let row = raster.row(y);
        let row_base = y as usize * width;
        for x in (0..width).step_by(8) {
            let mut byte = 0u8;
            for bit in 0..8 {
                if pixel_on(threshold, decisions, row_base + x + bit, row[x + bit]) {
                    byte |= 1 << bit;
                }
            }
            out.put_u8(byte);
        }
    }
}

/// 8 vertical pixels per byte (bit `i` is the `i`-th pixel down the
/// column), columns walked left to right. Requires `height % 8 == 0`.
fn encode_mono_columns(
    raster: &Raster,
    threshold: &MonoThreshold,
    decisions: Option<&DecisionBuffer>,
    out: &mut BytesMut,
) {
    let geometry = raster.geometry();
    debug_assert_eq!(geometry.height % 8, 0);
    out.reserve(geometry.pixel_count() / 8);

    let width = geometry.width as usize;
    let stride = geometry.stride as usize;
    let data = raster.data();
    for x in 0..width {
        for y in (0..geometry.height as usize).step_by(8) {
            let mut byte = 0u8;
            for bit in 0..8 {
                let row = y + bit;
                if pixel_on(
                    threshold,
                    decisions,
                    row * width + x,
                    data[row * stride + x],
                ) {
                    byte |= 1 << bit;
                }
            }
            out.put_u8(byte);
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dither::{DecisionBuffer, DitherEngine};
    use crate::raster::FrameGeometry;
    use crate::state::DitherMode;

    fn raster_with(width: u32, height: u32, stride: u32, fill: impl Fn(u32, u32) -> u16) -> Raster {
        let mut raster = Raster::new(FrameGeometry {
            width,
            height,
            stride,
        });
        for y in 0..height {
            for x in 0..width {
                raster.data_mut()[(y * stride + x) as usize] = fill(x, y);
            }
        }
        raster
    }

    fn encode(format: SnapshotFormat, raster: &Raster) -> Vec<u8> {
        let geometry = raster.geometry();
        let mut scratch = FrameBuffer::with_capacity(max_payload_size(geometry.width, geometry.height));
        let threshold = MonoThreshold::from_level(25);
        encode_snapshot(format, raster, &threshold, None, &mut scratch).to_vec()
    }

    #[test]
    fn rgb24_solid_red_frame() {
        // The end-to-end shape from the host's point of view: a 2×2
        // frame of 0xF800 is a 12-byte payload of (248, 0, 0).
        let raster = raster_with(2, 2, 2, |_, _| 0xf800);
        let packet = encode(SnapshotFormat::Rgb24, &raster);
        assert_eq!(&packet[..4], &[0, 0, 0, 12]);
        assert_eq!(packet.len(), 4 + 12);
        for px in packet[4..].chunks(3) {
            assert_eq!(px, &[248, 0, 0]);
        }
    }

    #[test]
    fn rgb24_skips_stride_padding() {
        let raster = raster_with(2, 2, 5, |x, y| if x == 0 && y == 1 { 0x07e0 } else { 0 });
        let packet = encode(SnapshotFormat::Rgb24, &raster);
        assert_eq!(&packet[..4], &[0, 0, 0, 12]);
        // Pixel (0, 1) is the third logical pixel.
        assert_eq!(&packet[4 + 6..4 + 9], &[0, 252, 0]);
    }

    #[test]
    fn rgb565_round_trips_losslessly() {
        let raster = raster_with(4, 3, 7, |x, y| (0x1111u16).wrapping_mul((x + y * 4 + 1) as u16));
        let packet = encode(SnapshotFormat::Rgb565, &raster);
        assert_eq!(&packet[..4], &[0, 0, 0, 24]);

        let decoded: Vec<u16> = packet[4..]
            .chunks(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        let mut logical = Vec::new();
        for y in 0..3 {
            logical.extend_from_slice(raster.row(y));
        }
        assert_eq!(decoded, logical);
    }

    #[test]
    fn mono_rows_pack_lsb_first() {
        // Only the first pixel of the first group is on.
        let raster = raster_with(8, 1, 8, |x, _| if x == 0 { 0xffff } else { 0 });
        let packet = encode(SnapshotFormat::Mono, &raster);
        assert_eq!(packet, &[0, 0, 0, 1, 0b0000_0001]);

        // Only the last pixel of the group is on.
        let raster = raster_with(8, 1, 8, |x, _| if x == 7 { 0xffff } else { 0 });
        let packet = encode(SnapshotFormat::Mono, &raster);
        assert_eq!(packet, &[0, 0, 0, 1, 0b1000_0000]);
    }

    #[test]
    fn mono_columns_pack_down_the_column() {
        // A single lit pixel at (x=1, y=2) in an 8×8 frame: the second
        // emitted byte (column 1) has bit 2 set.
        let raster = raster_with(8, 8, 8, |x, y| if x == 1 && y == 2 { 0xffff } else { 0 });
        let packet = encode(SnapshotFormat::MonoColumns, &raster);
        assert_eq!(&packet[..4], &[0, 0, 0, 8]);
        assert_eq!(packet[4], 0);
        assert_eq!(packet[5], 0b0000_0100);
        assert!(packet[6..].iter().all(|&b| b == 0));
    }

    #[test]
    fn mono_traversals_agree_on_every_pixel() {
        // Row-major and column-major encode the same predicate under
        // different scan orders; transposing one must reproduce the
        // other bit for bit.
        let raster = raster_with(16, 8, 19, |x, y| ((x * 31 + y * 157) as u16).wrapping_mul(811));

        let rows = encode(SnapshotFormat::Mono, &raster);
        let cols = encode(SnapshotFormat::MonoColumns, &raster);

        let on_from_rows = |x: usize, y: usize| -> bool {
            let bit_index = y * 16 + x;
            rows[4 + bit_index / 8] & (1 << (bit_index % 8)) != 0
        };
        let on_from_cols = |x: usize, y: usize| -> bool {
            // Column x contributes height/8 bytes, one per 8-row band.
            let byte = 4 + x * (8 / 8) + y / 8;
            cols[byte] & (1 << (y % 8)) != 0
        };

        for y in 0..8 {
            for x in 0..16 {
                assert_eq!(on_from_rows(x, y), on_from_cols(x, y), "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn mono_uses_decision_buffer_when_dithering() {
        // The raster is solid black; force every decision on and make
        // sure the encoder trusts the decisions, not the raster.
        let raster = raster_with(8, 8, 8, |_, _| 0);
        let threshold = MonoThreshold::from_level(25);

        let mut decisions = DecisionBuffer::new(8, 8);
        let white = raster_with(8, 8, 8, |_, _| 0xffff);
        let mut engine = DitherEngine::new();
        engine.apply(&white, &threshold, DitherMode::FloydSteinberg, &mut decisions);

        let mut scratch = FrameBuffer::with_capacity(64);
        let packet = encode_snapshot(
            SnapshotFormat::Mono,
            &raster,
            &threshold,
            Some(&decisions),
            &mut scratch,
        );
        assert!(packet[4..].iter().all(|&b| b == 0xff));
    }

    #[test]
    fn payload_sizes_match_contract() {
        let raster = raster_with(16, 8, 16, |_, _| 0x1234);
        assert_eq!(encode(SnapshotFormat::Rgb24, &raster).len(), 4 + 3 * 128);
        assert_eq!(encode(SnapshotFormat::Rgb565, &raster).len(), 4 + 2 * 128);
        assert_eq!(encode(SnapshotFormat::Mono, &raster).len(), 4 + 128 / 8);
        assert_eq!(encode(SnapshotFormat::MonoColumns, &raster).len(), 4 + 128 / 8);
    }
}
