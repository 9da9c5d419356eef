//! Byte-stream transport between the host and the display controller.

use crate::{Error, Result};
use std::io::{self, Read, Write};
use std::time::Duration;
use tokio_serial::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};
use tracing::{debug, info};

/// Minimal byte-stream interface the protocol driver needs.
pub trait Transport {
    /// Writes all bytes and flushes them to the wire.
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()>;

    /// Reads a single byte, returning `None` if the read timeout expired.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Drops any bytes already received but not yet read.
    fn discard_input(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Serial port transport, 8N1 with a fixed read timeout.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    path: String,
}

impl SerialTransport {
    /// Opens the serial port at `path`.
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(timeout)
            .open()
            .map_err(|e| {
                if let tokio_serial::ErrorKind::Io(kind) = &e.kind {
                    if (*kind == io::ErrorKind::NotFound
                        || *kind == io::ErrorKind::PermissionDenied)
                        && !std::path::Path::new(path).exists()
                    {
                        return Error::PortNotFound(path.to_string());
                    }
                }
                Error::Serial(e)
            })?;

        info!("Serial port opened: {} @ {} baud", path, baud_rate);

        Ok(Self {
            port,
            path: path.to_string(),
        })
    }

    /// Returns the port path.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Transport for SerialTransport {
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)?;
        self.port.flush()
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn discard_input(&mut self) -> io::Result<()> {
        debug!("Discarding pending input on {}", self.path);
        self.port
            .clear(ClearBuffer::Input)
            .map_err(io::Error::other)
    }
}
