//! Send worker: drains the outbound queue to the transport.

use std::time::Duration;

use tokio::io::{AsyncWriteExt, WriteHalf};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use super::transport::Transport;
use crate::packet::Packet;

/// Block until woken by an enqueue, then write everything queued in FIFO
/// order and flush. A write timeout drops that packet; a transport write
/// error ends the worker.
pub(crate) async fn send_loop(
    mut writer: WriteHalf<Box<dyn Transport>>,
    mut outbound: UnboundedReceiver<Packet>,
    cancel: CancellationToken,
    write_timeout: Duration,
) {
    debug!("send worker started");
    'running: loop {
        let first = tokio::select! {
            _ = cancel.cancelled() => break,
            packet = outbound.recv() => match packet {
                Some(packet) => packet,
                None => break,
            },
        };

        // Drain everything queued behind the wake before flushing
        let mut batch = vec![first];
        while let Ok(packet) = outbound.try_recv() {
            batch.push(packet);
        }

        for packet in batch {
            let frame = packet.to_bytes();
            trace!("TX frame ({} bytes): {:02X?}", frame.len(), frame);
            match timeout(write_timeout, writer.write_all(&frame)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!("transport write failed: {e}");
                    break 'running;
                }
                Err(_) => {
                    warn!("write timed out, dropping command {:#04X}", packet.command());
                }
            }
        }

        if let Ok(Err(e)) = timeout(write_timeout, writer.flush()).await {
            error!("transport flush failed: {e}");
            break;
        }
    }
    debug!("send worker stopped");
}
