//! Receive worker: frames packets out of the byte stream and classifies them.

use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, ReadHalf};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::store::InboundBuffer;
use super::transport::Transport;
use crate::keypad::KeyEvent;
use crate::packet::Packet;

enum ReadOutcome {
    Done,
    TimedOut,
    Failed,
}

/// Continuously reassemble frames from the transport.
///
/// Two states: awaiting a 2-byte header, then awaiting `length + 2` body
/// bytes. The first header byte is awaited indefinitely; once any part of a
/// frame is held, reads are bounded by `receive_timeout` and a timeout
/// discards the partial frame. A frame failing decode is dropped and the
/// next two bytes are read as a fresh header (best-effort resync).
pub(crate) async fn receive_loop(
    mut reader: ReadHalf<Box<dyn Transport>>,
    inbound: Arc<InboundBuffer>,
    key_events: UnboundedSender<KeyEvent>,
    cancel: CancellationToken,
    receive_timeout: Duration,
) {
    debug!("receive worker started");
    loop {
        let mut header = [0u8; 2];

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = reader.read_exact(&mut header[..1]) => result,
        };
        match result {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                info!("transport closed");
                break;
            }
            Err(e) => {
                error!("transport read failed: {e}");
                break;
            }
        }

        match bounded_read(&mut reader, &mut header[1..], receive_timeout).await {
            ReadOutcome::Done => {}
            ReadOutcome::TimedOut => {
                debug!("timed out mid-header, discarding partial frame");
                continue;
            }
            ReadOutcome::Failed => break,
        }

        let mut body = vec![0u8; usize::from(header[1]) + 2];
        match bounded_read(&mut reader, &mut body, receive_timeout).await {
            ReadOutcome::Done => {}
            ReadOutcome::TimedOut => {
                debug!(
                    "timed out mid-body of command {:#04X}, discarding partial frame",
                    header[0]
                );
                continue;
            }
            ReadOutcome::Failed => break,
        }

        let mut frame = Vec::with_capacity(header.len() + body.len());
        frame.extend_from_slice(&header);
        frame.extend_from_slice(&body);
        trace!("RX frame ({} bytes): {:02X?}", frame.len(), frame);

        match Packet::decode(&frame) {
            Ok(packet) => classify(packet, &inbound, &key_events),
            Err(e) => warn!("dropping corrupt frame: {e}"),
        }
    }

    // Wake blocked callers rather than leaving them to their deadlines
    inbound.close();
    debug!("receive worker stopped");
}

/// Read exactly `buf.len()` bytes within `window`.
async fn bounded_read(
    reader: &mut ReadHalf<Box<dyn Transport>>,
    buf: &mut [u8],
    window: Duration,
) -> ReadOutcome {
    match timeout(window, reader.read_exact(buf)).await {
        Err(_) => ReadOutcome::TimedOut,
        Ok(Ok(_)) => ReadOutcome::Done,
        Ok(Err(e)) if e.kind() == ErrorKind::UnexpectedEof => {
            info!("transport closed");
            ReadOutcome::Failed
        }
        Ok(Err(e)) => {
            error!("transport read failed: {e}");
            ReadOutcome::Failed
        }
    }
}

/// Route a validated packet: keypad reports to the dispatcher, everything
/// else into the correlation buffer.
fn classify(packet: Packet, inbound: &InboundBuffer, key_events: &UnboundedSender<KeyEvent>) {
    if packet.is_key_activity() {
        match KeyEvent::from_code(packet.data()[0]) {
            Some(event) => {
                trace!("key activity: {event}");
                let _ = key_events.send(event);
            }
            None => warn!("unknown key event code {}", packet.data()[0]),
        }
    } else {
        trace!(
            "RX reply {:#04X} ({} byte payload)",
            packet.command(),
            packet.data().len()
        );
        inbound.push(packet);
    }
}
