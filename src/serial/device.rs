//! Serial device access.

use super::errors::SerialError;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};

#[cfg(feature = "tracing")]
use tracing::debug;

/// Opens serial devices by path.
///
/// The modem provider only talks to devices through this trait, so tests can
/// swap real hardware for an in-memory modem.
pub trait SerialOpener: Send + Sync {
    /// Byte stream of an open device.
    type Port: AsyncRead + AsyncWrite + Unpin + Send;

    /// Returns true if a device exists at `path`.
    fn exists(&self, path: &str) -> bool;

    /// Open the device at `path` with 8N1 framing at `baud_rate`.
    fn open(&self, path: &str, baud_rate: u32) -> Result<Self::Port, SerialError>;
}

/// [`SerialOpener`] backed by the operating system's serial ports.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSerialOpener;

impl SerialOpener for TokioSerialOpener {
    type Port = SerialStream;

    fn exists(&self, path: &str) -> bool {
        #[cfg(unix)]
        {
            std::path::Path::new(path).exists()
        }

        #[cfg(not(unix))]
        {
            tokio_serial::available_ports()
                .map(|ports| {
                    ports
                        .iter()
                        .any(|port| port.port_name.eq_ignore_ascii_case(path))
                })
                .unwrap_or(false)
        }
    }

    fn open(&self, path: &str, baud_rate: u32) -> Result<Self::Port, SerialError> {
        tokio_serial::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .open_native_async()
            .map_err(|source| SerialError::Open {
                path: path.to_string(),
                source,
            })
    }
}

/// An open serial device, exclusively owned by one send attempt.
///
/// The port is released exactly once: by [`close`](Self::close) or, on any
/// early exit, when the handle is dropped.
pub struct SerialDeviceHandle<P> {
    path: String,
    port: Option<P>,
}

impl<P> std::fmt::Debug for SerialDeviceHandle<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialDeviceHandle")
            .field("path", &self.path)
            .field("is_open", &self.port.is_some())
            .finish()
    }
}

impl<P: AsyncRead + AsyncWrite + Unpin + Send> SerialDeviceHandle<P> {
    /// Open the device at `path` through `opener`.
    pub fn open<O>(opener: &O, path: &str, baud_rate: u32) -> Result<Self, SerialError>
    where
        O: SerialOpener<Port = P>,
    {
        let port = opener.open(path, baud_rate)?;

        #[cfg(feature = "tracing")]
        debug!(path = %path, baud_rate, "Serial port opened");

        Ok(Self {
            path: path.to_string(),
            port: Some(port),
        })
    }

    /// Device path this handle was opened from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns true until the handle is closed.
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    pub(crate) fn port_mut(&mut self) -> Result<&mut P, SerialError> {
        let path = &self.path;
        self.port
            .as_mut()
            .ok_or_else(|| SerialError::Closed { path: path.clone() })
    }

    /// Flush and release the device. Closing twice is a no-op.
    pub async fn close(&mut self) {
        if let Some(mut port) = self.port.take() {
            let _ = port.shutdown().await;

            #[cfg(feature = "tracing")]
            debug!(path = %self.path, "Serial port closed");
        }
    }
}

impl<P> Drop for SerialDeviceHandle<P> {
    fn drop(&mut self) {
        if self.port.take().is_some() {
            #[cfg(feature = "tracing")]
            debug!(path = %self.path, "Serial port released on drop");
        }
    }
}
