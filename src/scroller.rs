//! Periodic text scrolling on one display row.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::{Cfa635Client, LCD_COLUMNS, LCD_ROWS};
use crate::error::{DriverError, Result};

/// Gap inserted between the tail and head of a rotating text.
const SEPARATOR: &str = "   ";

/// Background task rotating a line of ASCII text across one display row.
///
/// Only the facade's write-text command is used; the task shares the client
/// with any other caller.
pub struct Marquee {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Marquee {
    /// Start scrolling `text` on `row`, advancing one column per `period`.
    pub fn start(
        client: Arc<Cfa635Client>,
        row: u8,
        text: impl Into<String>,
        period: Duration,
    ) -> Result<Self> {
        if row >= LCD_ROWS {
            return Err(DriverError::invalid_argument(format!(
                "Row must be 0-{}, got {row}",
                LCD_ROWS - 1
            )));
        }
        if period.is_zero() {
            return Err(DriverError::invalid_argument("Scroll period cannot be zero"));
        }
        let cancel = CancellationToken::new();
        let task = tokio::spawn(scroll_loop(client, row, text.into(), period, cancel.clone()));
        Ok(Self { cancel, task })
    }

    /// Stop scrolling and wait for the task to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

async fn scroll_loop(
    client: Arc<Cfa635Client>,
    row: u8,
    text: String,
    period: Duration,
    cancel: CancellationToken,
) {
    debug!("marquee started on row {row}");
    let width = usize::from(LCD_COLUMNS);

    // A text that already fits is written once, padded to cover the row
    if text.len() <= width {
        let line = format!("{text:<width$}");
        if let Err(e) = client.write_text(0, row, &line).await {
            warn!("marquee write failed: {e}");
        }
        cancel.cancelled().await;
        debug!("marquee stopped");
        return;
    }

    let mut ring = text.into_bytes();
    ring.extend_from_slice(SEPARATOR.as_bytes());

    let mut offset = 0;
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let line = window(&ring, offset, width);
        match client.write_text(0, row, &line).await {
            Ok(()) => {}
            Err(DriverError::Closed) => break,
            Err(e) => warn!("marquee write failed: {e}"),
        }
        offset = (offset + 1) % ring.len();
    }
    debug!("marquee stopped");
}

/// The `width` visible characters starting at `offset`, wrapping around.
fn window(ring: &[u8], offset: usize, width: usize) -> String {
    let mut line = Vec::with_capacity(width);
    for i in 0..width {
        line.push(ring[(offset + i) % ring.len()]);
    }
    String::from_utf8_lossy(&line).into_owned()
}
