//! Host→device command protocol.
//!
//! The controlling host drives fbcast through length-prefixed commands
//! on stdin:
//!
//! ```text
//! 00 00 00 <len> <opcode> [args…]
//! ```
//!
//! `len` counts the bytes from `<opcode>` to the end of the command, so
//! a complete command occupies `4 + len` bytes. The three leading zero
//! bytes exist because the host side reuses its stock 4-byte big-endian
//! length framing; they must always be exactly zero, and anything else
//! is a fatal protocol violation; there is no attempt to resynchronise
//! a corrupted stream.
//!
//! | Opcode | Args        | Effect                                  |
//! |--------|-------------|-----------------------------------------|
//! | 1, 2   | —           | request a 24-bit snapshot (synonyms)    |
//! | 3      | —           | request a packed 16-bit snapshot        |
//! | 4      | —           | request a mono row-major snapshot       |
//! | 5      | —           | request a mono column-major snapshot    |
//! | 6      | `threshold` | set the monochrome threshold level      |
//! | 7      | `mode`      | select the dithering algorithm          |
//! | other  | —           | ignored, but still consumed             |

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use crate::error::FbError;
use crate::state::{DitherMode, SnapshotFormat};

/// Fixed capacity of the pending-input buffer. A single command whose
/// `4 + len` exceeds this is a fatal condition, not backpressure.
pub const REQUEST_BUFFER_CAPACITY: usize = 256;

/// Bytes preceding the opcode: the 3-byte zero header plus `len`.
const COMMAND_OVERHEAD: usize = 4;

// ── Request ──────────────────────────────────────────────────────

/// One decoded host command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Opcodes 1..=5: emit one snapshot in the given format.
    Snapshot(SnapshotFormat),
    /// Opcode 6: recompute the per-channel mono thresholds.
    SetThreshold(u8),
    /// Opcode 7: select the dithering algorithm.
    SetDither(DitherMode),
    /// Any other opcode, or a known opcode missing its argument.
    /// Consumed so the stream stays aligned, otherwise ignored.
    Unknown(u8),
}

// ── RequestDecoder ───────────────────────────────────────────────

/// Streaming decoder over the accumulating input buffer.
///
/// Yields one [`Request`] per complete command and leaves any trailing
/// partial command in place for the next read. The driver calls
/// [`decode`](Decoder::decode) in a loop after every read so that all
/// queued commands are drained before the next suspension point.
#[derive(Debug, Default)]
pub struct RequestDecoder;

impl Decoder for RequestDecoder {
    type Item = Request;
    type Error = FbError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Request>, FbError> {
        loop {
            // Minimum parseable command is header + len + opcode.
            if src.len() < COMMAND_OVERHEAD + 1 {
                return Ok(None);
            }

            if src[0] != 0 || src[1] != 0 || src[2] != 0 {
                return Err(FbError::BadCommandHeader(src[0], src[1], src[2], src[3]));
            }

            let total = COMMAND_OVERHEAD + src[3] as usize;
            if total > REQUEST_BUFFER_CAPACITY {
                return Err(FbError::CommandTooLarge {
                    size: total,
                    capacity: REQUEST_BUFFER_CAPACITY,
                });
            }

            // A zero-length command carries no opcode; drop it and keep
            // scanning.
            if total == COMMAND_OVERHEAD {
                src.advance(COMMAND_OVERHEAD);
                continue;
            }

            if src.len() < total {
                return Ok(None);
            }

            let frame = src.split_to(total);
            let opcode = frame[4];

            let request = match SnapshotFormat::from_opcode(opcode) {
                Some(format) => Request::Snapshot(format),
                None => match (opcode, frame.get(5)) {
                    (6, Some(&level)) => Request::SetThreshold(level),
                    (7, Some(&mode)) => Request::SetDither(DitherMode::from(mode)),
                    _ => Request::Unknown(opcode),
                },
            };
            return Ok(Some(request));
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
