//! The snapshot event loop.
//!
//! [`Driver`] wires the whole pipeline together over a duplex byte
//! transport (stdin/stdout in production, an in-memory duplex in
//! tests):
//!
//! 1. Emit the one-time capability packet.
//! 2. Block on the transport until bytes arrive (**AwaitingInput**).
//! 3. Drain every complete command out of the pending-input buffer and
//!    apply it to [`CaptureState`].
//! 4. If a snapshot format is now pending (**Emitting**), capture one
//!    frame, run the dithering engine iff a mono format is selected and
//!    dithering is enabled, encode, frame, write, clear the pending
//!    format, and go back to waiting.
//! 5. On end-of-stream (**Shutdown**), drop the provider and return
//!    successfully.
//!
//! Everything runs on one task with a single suspension point (the
//! read); a snapshot cycle never interleaves with command processing,
//! so no locking is needed anywhere. Writes are all-or-nothing: any
//! transport error tears the process down for the supervisor to
//! restart.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Decoder;
use tracing::{debug, info, warn};

use crate::capture::CaptureProvider;
use crate::dither::{DecisionBuffer, DitherEngine};
use crate::encode::{encode_snapshot, max_payload_size};
use crate::error::FbError;
use crate::framer::FrameBuffer;
use crate::protocol::{REQUEST_BUFFER_CAPACITY, Request, RequestDecoder};
use crate::raster::Raster;
use crate::state::{CaptureState, SnapshotFormat};

/// The device-side event loop: owns the capture provider, the shared
/// conversion state, and every reusable buffer of the pipeline.
pub struct Driver<P, R, W> {
    provider: P,
    input: R,
    output: W,
    state: CaptureState,
    decoder: RequestDecoder,
    pending_input: BytesMut,
    raster: Raster,
    decisions: DecisionBuffer,
    engine: DitherEngine,
    scratch: FrameBuffer,
}

impl<P, R, W> Driver<P, R, W>
where
    P: CaptureProvider,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Build a driver with default conversion settings.
    pub fn new(provider: P, input: R, output: W) -> Self {
        Self::with_state(provider, input, output, CaptureState::default())
    }

    /// Build a driver around an initialised capture provider and a
    /// byte transport, starting from explicit conversion settings
    /// (deployments pick their initial threshold and dithering in the
    /// device config; the host can still change both at runtime).
    /// All buffers are sized here, once, from the provider's
    /// authoritative geometry.
    pub fn with_state(provider: P, input: R, output: W, state: CaptureState) -> Self {
        let info = provider.info();
        let geometry = info.geometry();

        if geometry.width % 8 != 0 || geometry.height % 8 != 0 {
            // Mono encoders pack 8 pixels per byte and require aligned
            // geometry; colour formats still work.
            warn!(
                width = geometry.width,
                height = geometry.height,
                "capture geometry not 8-aligned; mono formats unavailable"
            );
        }

        Self {
            raster: Raster::new(geometry),
            decisions: DecisionBuffer::new(geometry.width, geometry.height),
            engine: DitherEngine::new(),
            scratch: FrameBuffer::with_capacity(max_payload_size(geometry.width, geometry.height)),
            state,
            decoder: RequestDecoder,
            pending_input: BytesMut::with_capacity(REQUEST_BUFFER_CAPACITY),
            provider,
            input,
            output,
        }
    }

    /// Run until end-of-stream (clean shutdown) or a fatal error.
    pub async fn run(mut self) -> Result<(), FbError> {
        // Capability packet is the first thing on the wire.
        let provider = &self.provider;
        let packet = self
            .scratch
            .frame_with(|buf| provider.info().encode_capability(buf));
        self.output.write_all(packet).await?;
        self.output.flush().await?;
        info!("capability packet emitted; awaiting host commands");

        let mut read_chunk = [0u8; REQUEST_BUFFER_CAPACITY];
        loop {
            // The pending buffer never exceeds its fixed capacity: a
            // command that cannot fit fails in the decoder before the
            // buffer could fill past it.
            let spare = REQUEST_BUFFER_CAPACITY - self.pending_input.len();
            let n = self.input.read(&mut read_chunk[..spare]).await?;
            if n == 0 {
                info!("end of stream; shutting down");
                return Ok(());
            }
            self.pending_input.extend_from_slice(&read_chunk[..n]);

            // Drain every queued command before the next suspension
            // point; a later snapshot request overrides an earlier one
            // from the same batch.
            while let Some(request) = self.decoder.decode(&mut self.pending_input)? {
                self.apply(request);
            }

            if let Some(format) = self.state.pending.take() {
                self.emit_snapshot(format).await?;
            }
        }
    }

    fn apply(&mut self, request: Request) {
        match request {
            Request::Snapshot(format) => {
                self.state.pending = Some(format);
            }
            Request::SetThreshold(level) => {
                debug!(level, "mono threshold updated");
                self.state.set_threshold_level(level);
            }
            Request::SetDither(mode) => {
                debug!(?mode, "dithering mode updated");
                self.state.dither = mode;
            }
            Request::Unknown(opcode) => {
                debug!(opcode, "ignoring unknown opcode");
            }
        }
    }

    /// One capture → (dither) → encode → frame → write cycle.
    async fn emit_snapshot(&mut self, format: SnapshotFormat) -> Result<(), FbError> {
        self.provider.capture_frame(&mut self.raster).await?;

        let mono = matches!(format, SnapshotFormat::Mono | SnapshotFormat::MonoColumns);
        let decisions = if mono && self.state.dither.is_enabled() {
            self.engine.apply(
                &self.raster,
                &self.state.threshold,
                self.state.dither,
                &mut self.decisions,
            );
            Some(&self.decisions)
        } else {
            None
        };

        let packet = encode_snapshot(
            format,
            &self.raster,
            &self.state.threshold,
            decisions,
            &mut self.scratch,
        );
        self.output.write_all(packet).await?;
        self.output.flush().await?;
        debug!(?format, bytes = packet.len(), "snapshot emitted");
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureInfo;
    use async_trait::async_trait;

    struct SolidProvider {
        info: CaptureInfo,
        pixel: u16,
    }

    #[async_trait]
    impl CaptureProvider for SolidProvider {
        fn info(&self) -> &CaptureInfo {
            &self.info
        }

        async fn capture_frame(&mut self, raster: &mut Raster) -> Result<(), FbError> {
            raster.data_mut().fill(self.pixel);
            Ok(())
        }
    }

    fn provider(pixel: u16) -> SolidProvider {
        SolidProvider {
            info: CaptureInfo {
                backend_name: CaptureInfo::encode_backend_name("test"),
                display_id: 0,
                display_width: 8,
                display_height: 8,
                capture_width: 8,
                capture_height: 8,
                capture_stride: 8,
            },
            pixel,
        }
    }

    #[tokio::test]
    async fn capability_packet_is_first_and_eof_is_clean() {
        let (host_side, device_side) = tokio::io::duplex(1024);
        let (mut host_rx, host_tx) = tokio::io::split(host_side);
        let (device_rx, device_tx) = tokio::io::split(device_side);

        let driver = Driver::new(provider(0), device_rx, device_tx);
        let run = tokio::spawn(driver.run());

        let mut header = [0u8; 4];
        host_rx.read_exact(&mut header).await.unwrap();
        assert_eq!(header, [0, 0, 0, 36]);
        let mut payload = [0u8; 36];
        host_rx.read_exact(&mut payload).await.unwrap();
        assert_eq!(&payload[..4], b"test");

        // Closing the host side is an orderly shutdown, not an error.
        // Dropping a split WriteHalf alone does not close the duplex;
        // shut the write direction down explicitly to deliver EOF.
        let mut host_tx = host_tx;
        host_tx.shutdown().await.unwrap();
        drop(host_tx);
        run.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn transport_read_error_is_fatal() {
        let reader = tokio_test::io::Builder::new()
            .read_error(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset",
            ))
            .build();

        let driver = Driver::new(provider(0), reader, tokio::io::sink());
        let err = driver.run().await.unwrap_err();
        assert!(matches!(err, FbError::Transport(_)));
    }

    #[tokio::test]
    async fn queued_snapshot_requests_collapse_to_one() {
        // Two snapshot commands arriving in one read produce a single
        // snapshot, in the format of the last command.
        let (host_side, device_side) = tokio::io::duplex(4096);
        let (mut host_rx, mut host_tx) = tokio::io::split(host_side);
        let (device_rx, device_tx) = tokio::io::split(device_side);

        let driver = Driver::new(provider(0xffff), device_rx, device_tx);
        let run = tokio::spawn(driver.run());

        let mut skip = [0u8; 40];
        host_rx.read_exact(&mut skip).await.unwrap(); // capability

        host_tx
            .write_all(&[0, 0, 0, 1, 1, 0, 0, 0, 1, 4])
            .await
            .unwrap();

        // One mono snapshot: 8×8 / 8 = 8 payload bytes, all ones.
        let mut packet = [0u8; 12];
        host_rx.read_exact(&mut packet).await.unwrap();
        assert_eq!(&packet[..4], &[0, 0, 0, 8]);
        assert!(packet[4..].iter().all(|&b| b == 0xff));

        // As above: an explicit shutdown is required for the device
        // side to observe end-of-stream.
        host_tx.shutdown().await.unwrap();
        drop(host_tx);
        run.await.unwrap().unwrap();
    }
}
