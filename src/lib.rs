//! Async driver for CrystalFontz CFA635 serial LCD modules.

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod keypad;
pub mod packet;
pub mod scroller;
pub mod writer;

pub use client::{Cfa635Client, CursorStyle, LCD_COLUMNS, LCD_ROWS};
pub use config::DriverConfig;
pub use engine::{Engine, KeyObserverHandle, Transport};
pub use error::{DriverError, Result};
pub use keypad::{Key, KeyEvent, KeyMask};
pub use packet::Packet;
pub use scroller::Marquee;
pub use writer::LineWriter;
