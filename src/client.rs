//! CFA635 command facade.
//!
//! Typed commands over the packet protocol engine: each call validates its
//! arguments, encodes the request, and blocks until the module acknowledges
//! (request opcode with bit 6 set) or the receive window elapses.

use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::config::DriverConfig;
use crate::engine::{Engine, KeyObserverHandle, Transport};
use crate::error::{DriverError, Result};
use crate::keypad::{KeyEvent, KeyMask};
use crate::packet::Packet;
use crate::packet::opcodes::{self, reply_opcode};

/// Display width in characters.
pub const LCD_COLUMNS: u8 = 20;
/// Display height in rows.
pub const LCD_ROWS: u8 = 4;
/// Longest ping payload the firmware echoes back.
pub const PING_MAX_DATA: usize = 8;
/// Size of the module's user flash area in bytes.
pub const USER_FLASH_LEN: usize = 16;

/// Cursor rendering styles accepted by the set-cursor-style command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStyle {
    Hidden = 0,
    BlinkingBlock = 1,
    Underscore = 2,
    BlinkingUnderscore = 3,
    InvertingBlinkingBlock = 4,
}

/// CFA635 client over an already-open transport.
pub struct Cfa635Client {
    engine: Engine,
    config: DriverConfig,
}

impl Cfa635Client {
    /// Attach to an open transport and start the protocol workers.
    pub fn attach(transport: Box<dyn Transport>, config: DriverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine: Engine::spawn(transport, &config),
            config,
        })
    }

    /// Connect to a module behind a TCP serial bridge (ser2net or similar).
    pub async fn connect(addr: &str, config: DriverConfig) -> Result<Self> {
        info!("Connecting to {addr}");
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| DriverError::transport(format!("Failed to connect to {addr}: {e}")))?;
        stream
            .set_nodelay(true)
            .map_err(|e| DriverError::transport(format!("Failed to configure socket: {e}")))?;
        Self::attach(Box::new(stream), config)
    }

    /// Raw access to the protocol engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Ping the module; the payload (up to 8 bytes) is echoed back.
    pub async fn ping(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.len() > PING_MAX_DATA {
            return Err(DriverError::invalid_argument(format!(
                "Ping payload must be at most {PING_MAX_DATA} bytes, got {}",
                data.len()
            )));
        }
        let reply = self.command(opcodes::CMD_PING, data).await?;
        if reply.data() != data {
            return Err(DriverError::protocol(format!(
                "Ping echo mismatch: sent {:02X?}, got {:02X?}",
                data,
                reply.data()
            )));
        }
        Ok(reply.data().to_vec())
    }

    /// Read the hardware and firmware version string.
    pub async fn version(&self) -> Result<String> {
        let reply = self.command(opcodes::CMD_GET_VERSION, &[]).await?;
        if reply.data().len() < 16 {
            return Err(DriverError::protocol(format!(
                "Version reply too short: {} bytes",
                reply.data().len()
            )));
        }
        Ok(String::from_utf8_lossy(reply.data()).trim_end().to_string())
    }

    /// Store 16 bytes in the module's user flash area.
    pub async fn write_user_flash(&self, data: &[u8; USER_FLASH_LEN]) -> Result<()> {
        self.command(opcodes::CMD_WRITE_USER_FLASH, data).await?;
        Ok(())
    }

    /// Read the 16-byte user flash area.
    pub async fn read_user_flash(&self) -> Result<[u8; USER_FLASH_LEN]> {
        let reply = self.command(opcodes::CMD_READ_USER_FLASH, &[]).await?;
        reply.data().try_into().map_err(|_| {
            DriverError::protocol(format!(
                "User flash reply must be {USER_FLASH_LEN} bytes, got {}",
                reply.data().len()
            ))
        })
    }

    /// Persist the current display state as the power-on default.
    pub async fn save_boot_state(&self) -> Result<()> {
        self.command(opcodes::CMD_SAVE_BOOT_STATE, &[]).await?;
        Ok(())
    }

    /// Clear the display.
    pub async fn clear_screen(&self) -> Result<()> {
        self.command(opcodes::CMD_CLEAR_SCREEN, &[]).await?;
        Ok(())
    }

    /// Define one of the eight CGRAM glyphs, one byte per pixel row.
    pub async fn set_cgram_glyph(&self, index: u8, bitmap: &[u8; 8]) -> Result<()> {
        if index > 7 {
            return Err(DriverError::invalid_argument(format!(
                "Glyph index must be 0-7, got {index}"
            )));
        }
        let mut payload = [0u8; 9];
        payload[0] = index;
        payload[1..].copy_from_slice(bitmap);
        self.command(opcodes::CMD_SET_CGRAM_GLYPH, &payload).await?;
        Ok(())
    }

    /// Move the cursor to (column, row).
    pub async fn set_cursor_position(&self, column: u8, row: u8) -> Result<()> {
        Self::check_position(column, row)?;
        self.command(opcodes::CMD_SET_CURSOR_POSITION, &[column, row])
            .await?;
        Ok(())
    }

    /// Select the cursor rendering style.
    pub async fn set_cursor_style(&self, style: CursorStyle) -> Result<()> {
        self.command(opcodes::CMD_SET_CURSOR_STYLE, &[style as u8])
            .await?;
        Ok(())
    }

    /// Set LCD contrast as a percentage.
    pub async fn set_contrast(&self, percent: u8) -> Result<()> {
        Self::check_percent("Contrast", percent)?;
        self.command(opcodes::CMD_SET_CONTRAST, &[percent]).await?;
        Ok(())
    }

    /// Set the backlight brightness as a percentage (keypad follows the LCD).
    pub async fn set_backlight(&self, lcd: u8) -> Result<()> {
        Self::check_percent("Backlight", lcd)?;
        self.command(opcodes::CMD_SET_BACKLIGHT, &[lcd]).await?;
        Ok(())
    }

    /// Set LCD and keypad backlight brightness independently.
    pub async fn set_backlights(&self, lcd: u8, keypad: u8) -> Result<()> {
        Self::check_percent("LCD backlight", lcd)?;
        Self::check_percent("Keypad backlight", keypad)?;
        self.command(opcodes::CMD_SET_BACKLIGHT, &[lcd, keypad]).await?;
        Ok(())
    }

    /// Poll which keys are currently held down.
    pub async fn poll_keys(&self) -> Result<KeyMask> {
        let reply = self.command(opcodes::CMD_POLL_KEYS, &[]).await?;
        match reply.data() {
            [mask] => Ok(KeyMask::from_bits(*mask)),
            other => Err(DriverError::protocol(format!(
                "Key state reply must be 1 byte, got {}",
                other.len()
            ))),
        }
    }

    /// Write text at (column, row). The text must fit on the row.
    pub async fn write_text(&self, column: u8, row: u8, text: &str) -> Result<()> {
        Self::check_position(column, row)?;
        let bytes = text.as_bytes();
        if bytes.is_empty() {
            return Err(DriverError::invalid_argument("Text cannot be empty"));
        }
        if usize::from(column) + bytes.len() > usize::from(LCD_COLUMNS) {
            return Err(DriverError::invalid_argument(format!(
                "Text of {} bytes does not fit at column {column}",
                bytes.len()
            )));
        }
        let mut payload = Vec::with_capacity(bytes.len() + 2);
        payload.push(column);
        payload.push(row);
        payload.extend_from_slice(bytes);
        self.command(opcodes::CMD_WRITE_TEXT, &payload).await?;
        Ok(())
    }

    /// Drive a GPIO/LED pin with a duty-cycle percentage.
    pub async fn set_gpio(&self, pin: u8, duty: u8) -> Result<()> {
        if pin > 12 {
            return Err(DriverError::invalid_argument(format!(
                "GPIO pin must be 0-12, got {pin}"
            )));
        }
        Self::check_percent("GPIO duty", duty)?;
        self.command(opcodes::CMD_SET_GPIO, &[pin, duty]).await?;
        Ok(())
    }

    /// Register a keypad observer; events are delivered off the receive path.
    pub fn on_key_event<F>(&self, callback: F) -> KeyObserverHandle
    where
        F: Fn(KeyEvent) + Send + Sync + 'static,
    {
        self.engine.observe_keys(callback)
    }

    /// Remove a previously registered keypad observer.
    pub fn remove_key_observer(&self, handle: KeyObserverHandle) -> bool {
        self.engine.remove_key_observer(handle)
    }

    /// Stop the protocol workers; subsequent commands fail with `Closed`.
    pub async fn shutdown(&self) {
        self.engine.shutdown().await;
    }

    /// Encode, send, and block for the matching acknowledgement.
    async fn command(&self, command: u8, data: &[u8]) -> Result<Packet> {
        let request = Packet::new(command, data)?;
        let expected = reply_opcode(command);
        debug!("Command {command:#04X} ({} byte payload)", data.len());
        self.engine
            .send_and_expect(
                request,
                move |reply| reply.command() == expected,
                self.config.receive_timeout(),
            )
            .await
    }

    fn check_percent(what: &str, value: u8) -> Result<()> {
        if value > 100 {
            return Err(DriverError::invalid_argument(format!(
                "{what} must be 0-100, got {value}"
            )));
        }
        Ok(())
    }

    fn check_position(column: u8, row: u8) -> Result<()> {
        if row >= LCD_ROWS {
            return Err(DriverError::invalid_argument(format!(
                "Row must be 0-{}, got {row}",
                LCD_ROWS - 1
            )));
        }
        if column >= LCD_COLUMNS {
            return Err(DriverError::invalid_argument(format!(
                "Column must be 0-{}, got {column}",
                LCD_COLUMNS - 1
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
    use tokio::time::timeout;

    use super::*;

    fn test_config() -> DriverConfig {
        DriverConfig {
            receive_timeout_ms: 200,
            write_timeout_ms: 500,
            inbound_capacity: 8,
        }
    }

    fn attach_client() -> (Cfa635Client, DuplexStream) {
        let (driver_side, device_side) = tokio::io::duplex(1024);
        let client = Cfa635Client::attach(Box::new(driver_side), test_config()).unwrap();
        (client, device_side)
    }

    /// Read one complete frame from the device side.
    async fn read_frame(device: &mut DuplexStream) -> Packet {
        let mut header = [0u8; 2];
        device.read_exact(&mut header).await.unwrap();
        let mut rest = vec![0u8; usize::from(header[1]) + 2];
        device.read_exact(&mut rest).await.unwrap();
        let mut frame = header.to_vec();
        frame.extend_from_slice(&rest);
        Packet::decode(&frame).unwrap()
    }

    async fn reply(device: &mut DuplexStream, command: u8, data: &[u8]) {
        device
            .write_all(&Packet::new(command, data).unwrap().to_bytes())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_clear_screen_ack() {
        let (client, mut device) = attach_client();

        let harness = tokio::spawn(async move {
            let request = read_frame(&mut device).await;
            assert_eq!(request.command(), 0x06);
            assert!(request.data().is_empty());
            reply(&mut device, 0x46, &[]).await;
            device
        });

        client.clear_screen().await.unwrap();
        harness.await.unwrap();
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_backlight_out_of_range_writes_nothing() {
        let (client, mut device) = attach_client();

        let result = client.set_backlight(150).await;
        assert!(matches!(result, Err(DriverError::InvalidArgument(_))));

        // Nothing reached the transport
        let mut buf = [0u8; 1];
        let read = timeout(Duration::from_millis(100), device.read_exact(&mut buf)).await;
        assert!(read.is_err());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_write_text_payload_layout() {
        let (client, mut device) = attach_client();

        let harness = tokio::spawn(async move {
            let request = read_frame(&mut device).await;
            assert_eq!(request.command(), 0x1F);
            assert_eq!(request.data(), b"\x02\x01Hi");
            reply(&mut device, 0x5F, &[]).await;
            device
        });

        client.write_text(2, 1, "Hi").await.unwrap();
        harness.await.unwrap();
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_write_text_validation() {
        let (client, _device) = attach_client();

        assert!(matches!(
            client.write_text(0, 4, "x").await,
            Err(DriverError::InvalidArgument(_))
        ));
        assert!(matches!(
            client.write_text(20, 0, "x").await,
            Err(DriverError::InvalidArgument(_))
        ));
        assert!(matches!(
            client.write_text(0, 0, "").await,
            Err(DriverError::InvalidArgument(_))
        ));
        assert!(matches!(
            client.write_text(15, 1, "does not fit here").await,
            Err(DriverError::InvalidArgument(_))
        ));

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_argument_range_checks() {
        let (client, _device) = attach_client();

        assert!(matches!(
            client.set_cgram_glyph(8, &[0; 8]).await,
            Err(DriverError::InvalidArgument(_))
        ));
        assert!(matches!(
            client.set_contrast(101).await,
            Err(DriverError::InvalidArgument(_))
        ));
        assert!(matches!(
            client.set_gpio(13, 50).await,
            Err(DriverError::InvalidArgument(_))
        ));
        assert!(matches!(
            client.set_gpio(3, 101).await,
            Err(DriverError::InvalidArgument(_))
        ));
        assert!(matches!(
            client.ping(b"far too long for an echo").await,
            Err(DriverError::InvalidArgument(_))
        ));

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_ping_echo_mismatch_is_protocol_error() {
        let (client, mut device) = attach_client();

        let harness = tokio::spawn(async move {
            let request = read_frame(&mut device).await;
            assert_eq!(request.command(), 0x00);
            reply(&mut device, 0x40, b"junk").await;
            device
        });

        let result = client.ping(b"ping").await;
        assert!(matches!(result, Err(DriverError::Protocol(_))));

        harness.await.unwrap();
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_version_reply_too_short() {
        let (client, mut device) = attach_client();

        let harness = tokio::spawn(async move {
            let request = read_frame(&mut device).await;
            assert_eq!(request.command(), 0x01);
            reply(&mut device, 0x41, b"short").await;
            device
        });

        let result = client.version().await;
        assert!(matches!(result, Err(DriverError::Protocol(_))));

        harness.await.unwrap();
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_poll_keys_mask() {
        let (client, mut device) = attach_client();

        let harness = tokio::spawn(async move {
            let request = read_frame(&mut device).await;
            assert_eq!(request.command(), 0x18);
            reply(&mut device, 0x58, &[KeyMask::UP | KeyMask::ENTER]).await;
            device
        });

        let mask = client.poll_keys().await.unwrap();
        assert!(mask.up());
        assert!(mask.enter());
        assert!(!mask.down());
        assert!(!mask.is_empty());

        harness.await.unwrap();
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_read_user_flash() {
        let (client, mut device) = attach_client();

        let stored: [u8; USER_FLASH_LEN] = core::array::from_fn(|i| i as u8);
        let harness = tokio::spawn(async move {
            let request = read_frame(&mut device).await;
            assert_eq!(request.command(), 0x03);
            reply(&mut device, 0x43, &stored).await;
            device
        });

        let data = client.read_user_flash().await.unwrap();
        assert_eq!(data, stored);

        harness.await.unwrap();
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_command_after_shutdown_fails_closed() {
        let (client, _device) = attach_client();

        client.shutdown().await;
        assert!(matches!(client.clear_screen().await, Err(DriverError::Closed)));
    }
}
