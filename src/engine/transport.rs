//! Transport abstraction.

use tokio::io::{AsyncRead, AsyncWrite};

/// A duplex byte stream the engine runs over.
///
/// The caller opens and configures the underlying device (serial port,
/// TCP serial bridge, in-memory pipe for tests) and hands it in already
/// open; the engine only reads and writes bytes.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> Transport for T where T: AsyncRead + AsyncWrite + Unpin + Send {}
