//! Device→host packet framing.
//!
//! Every message the device emits is `<len:4, big-endian> <payload>`.
//! [`FrameBuffer`] is a reusable scratch region: the 4-byte header is
//! reserved up front, the payload is written directly behind it, and
//! the header is patched once the payload length is known. This is the same
//! single-buffer framing the host's 4-byte length convention
//! expects, with no separate allocation per packet.

use bytes::{BufMut, BytesMut};

/// Width of the length header in bytes.
pub const LENGTH_HEADER_SIZE: usize = 4;

/// Reusable scratch buffer producing length-framed packets.
#[derive(Debug)]
pub struct FrameBuffer {
    buf: BytesMut,
}

impl FrameBuffer {
    /// Create a scratch buffer that can frame payloads up to
    /// `payload_capacity` bytes without reallocating.
    pub fn with_capacity(payload_capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(LENGTH_HEADER_SIZE + payload_capacity),
        }
    }

    /// Build one framed packet.
    ///
    /// `write_payload` appends the payload bytes; the length header is
    /// filled in afterwards. Returns the complete packet (header +
    /// payload), valid until the next call.
    pub fn frame_with(&mut self, write_payload: impl FnOnce(&mut BytesMut)) -> &[u8] {
        self.buf.clear();
        self.buf.put_u32(0); // placeholder, patched below
        write_payload(&mut self.buf);

        let payload_len = (self.buf.len() - LENGTH_HEADER_SIZE) as u32;
        self.buf[..LENGTH_HEADER_SIZE].copy_from_slice(&payload_len.to_be_bytes());
        &self.buf
    }
}

// ── Tests ────────────────────────────────────────────────────────
