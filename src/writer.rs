//! Line-oriented text output with upward scrollback.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::client::{Cfa635Client, LCD_COLUMNS, LCD_ROWS};
use crate::error::Result;

/// Terminal-style adapter: appended lines wrap to the display width and
/// push earlier content upward, like a tiny four-row console.
pub struct LineWriter {
    client: Arc<Cfa635Client>,
    lines: VecDeque<String>,
}

impl LineWriter {
    pub fn new(client: Arc<Cfa635Client>) -> Self {
        Self {
            client,
            lines: VecDeque::with_capacity(usize::from(LCD_ROWS)),
        }
    }

    /// Append a line (wrapped to the display width) and repaint.
    pub async fn write_line(&mut self, text: &str) -> Result<()> {
        for row in wrap(text, usize::from(LCD_COLUMNS)) {
            if self.lines.len() == usize::from(LCD_ROWS) {
                self.lines.pop_front();
            }
            self.lines.push_back(row);
        }
        self.repaint().await
    }

    /// Drop the scrollback and clear the display.
    pub async fn clear(&mut self) -> Result<()> {
        self.lines.clear();
        self.client.clear_screen().await
    }

    /// Rewrite every row, padded with spaces to overwrite stale text.
    async fn repaint(&self) -> Result<()> {
        let width = usize::from(LCD_COLUMNS);
        for (row, line) in self.lines.iter().enumerate() {
            let padded = format!("{line:<width$}");
            self.client.write_text(0, row as u8, &padded).await?;
        }
        Ok(())
    }
}

/// Wrap text to `width` columns, breaking at word boundaries where possible.
///
/// The module's character generator is not UTF-8; non-ASCII characters are
/// replaced before wrapping so column arithmetic stays byte arithmetic.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let text: String = text
        .chars()
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect();

    let mut rows = Vec::new();
    for raw_line in text.split('\n') {
        let mut current = String::new();
        for word in raw_line.split_whitespace() {
            let mut word = word;
            // Hard-split words wider than the display
            while word.len() > width {
                if !current.is_empty() {
                    rows.push(std::mem::take(&mut current));
                }
                let (head, tail) = word.split_at(width);
                rows.push(head.to_string());
                word = tail;
            }
            if current.is_empty() {
                current.push_str(word);
            } else if current.len() + 1 + word.len() <= width {
                current.push(' ');
                current.push_str(word);
            } else {
                rows.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        rows.push(current);
    }
    rows
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

    use super::*;
    use crate::config::DriverConfig;
    use crate::packet::Packet;

    #[test]
    fn test_wrap_short_line() {
        assert_eq!(wrap("hello", 20), vec!["hello"]);
    }

    #[test]
    fn test_wrap_at_word_boundary() {
        assert_eq!(
            wrap("the quick brown fox jumps", 20),
            vec!["the quick brown fox", "jumps"]
        );
    }

    #[test]
    fn test_wrap_hard_splits_long_word() {
        assert_eq!(
            wrap("abcdefghijklmnopqrstuvwxyz", 20),
            vec!["abcdefghijklmnopqrst", "uvwxyz"]
        );
    }

    #[test]
    fn test_wrap_exact_width() {
        assert_eq!(wrap("12345678901234567890", 20), vec!["12345678901234567890"]);
    }

    #[test]
    fn test_wrap_empty_and_multiline() {
        assert_eq!(wrap("", 20), vec![""]);
        assert_eq!(wrap("one\ntwo", 20), vec!["one", "two"]);
    }

    #[test]
    fn test_wrap_replaces_non_ascii() {
        assert_eq!(wrap("caf\u{e9}", 20), vec!["caf?"]);
    }

    /// Ack every write-text request and record its payload.
    async fn ack_writes(mut device: DuplexStream, count: usize) -> Vec<Vec<u8>> {
        let mut payloads = Vec::new();
        for _ in 0..count {
            let mut header = [0u8; 2];
            device.read_exact(&mut header).await.unwrap();
            let mut rest = vec![0u8; usize::from(header[1]) + 2];
            device.read_exact(&mut rest).await.unwrap();
            let mut frame = header.to_vec();
            frame.extend_from_slice(&rest);
            let request = Packet::decode(&frame).unwrap();
            assert_eq!(request.command(), 0x1F);
            payloads.push(request.data().to_vec());
            device
                .write_all(&Packet::new(0x5F, &[]).unwrap().to_bytes())
                .await
                .unwrap();
        }
        payloads
    }

    #[tokio::test]
    async fn test_write_line_repaints_scrollback() {
        let (driver_side, device_side) = tokio::io::duplex(1024);
        let config = DriverConfig {
            receive_timeout_ms: 200,
            write_timeout_ms: 500,
            inbound_capacity: 8,
        };
        let client = Arc::new(Cfa635Client::attach(Box::new(driver_side), config).unwrap());

        // First line paints one row; the second repaints both
        let harness = tokio::spawn(ack_writes(device_side, 3));

        let mut writer = LineWriter::new(Arc::clone(&client));
        writer.write_line("hello").await.unwrap();
        writer.write_line("world").await.unwrap();

        let payloads = harness.await.unwrap();
        let expected = |column: u8, row: u8, text: &str| {
            let mut payload = vec![column, row];
            payload.extend_from_slice(format!("{text:<20}").as_bytes());
            payload
        };
        assert_eq!(payloads[0], expected(0, 0, "hello"));
        assert_eq!(payloads[1], expected(0, 0, "hello"));
        assert_eq!(payloads[2], expected(0, 1, "world"));

        tokio::time::timeout(Duration::from_secs(1), client.shutdown())
            .await
            .unwrap();
    }
}
