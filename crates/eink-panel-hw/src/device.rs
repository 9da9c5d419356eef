//! Display controller driver.

use crate::protocol::{
    chunk_count, AckStep, Command, ACK, ACK_TIMEOUT, CHUNK_DELAY, CHUNK_SIZE, PROGRESS_INTERVAL,
};
use crate::transport::{SerialTransport, Transport};
use crate::{Error, Result, FRAMEBUFFER_SIZE};
use std::time::Duration;
use tracing::{debug, info};

/// Default serial port of the controller's USB CDC interface.
pub const DEFAULT_PORT: &str = "/dev/ttyACM1";

/// Default baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 921_600;

/// Delay after opening the port, lets the CDC device enumerate.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(500);

/// Serial link and pacing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSettings {
    pub port: String,
    pub baud_rate: u32,
    /// Read timeout applied to every ACK.
    pub ack_timeout: Duration,
    pub chunk_size: usize,
    pub chunk_delay: Duration,
    pub settle: Duration,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            ack_timeout: ACK_TIMEOUT,
            chunk_size: CHUNK_SIZE,
            chunk_delay: CHUNK_DELAY,
            settle: DEFAULT_SETTLE,
        }
    }
}

/// E-paper display controller.
///
/// Owns the transport for its whole lifetime; dropping the device closes
/// the port.
pub struct EpdDevice<T: Transport = SerialTransport> {
    transport: T,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl EpdDevice<SerialTransport> {
    /// Opens the serial port and prepares it for the first command.
    pub fn open(settings: &LinkSettings) -> Result<Self> {
        let transport =
            SerialTransport::open(&settings.port, settings.baud_rate, settings.ack_timeout)?;

        debug!("Waiting {:?} for the port to settle", settings.settle);
        std::thread::sleep(settings.settle);

        let mut device = Self::with_transport(transport, settings);
        device.transport.discard_input()?;
        Ok(device)
    }
}

impl<T: Transport> EpdDevice<T> {
    /// Wraps an already open transport.
    pub fn with_transport(transport: T, settings: &LinkSettings) -> Self {
        Self {
            transport,
            // A zero chunk size would never make progress.
            chunk_size: settings.chunk_size.max(1),
            chunk_delay: settings.chunk_delay,
        }
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Consumes the device, returning the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Clears the panel to white.
    pub fn clear(&mut self) -> Result<()> {
        info!("Clearing display");
        self.command(Command::Clear)?;
        info!("Display cleared");
        Ok(())
    }

    /// Uploads a framebuffer into controller RAM without refreshing the panel.
    pub fn send(&mut self, framebuffer: &[u8]) -> Result<()> {
        if framebuffer.len() != FRAMEBUFFER_SIZE {
            return Err(Error::InvalidInput {
                expected: FRAMEBUFFER_SIZE,
                actual: framebuffer.len(),
            });
        }

        info!("Uploading {} bytes to controller RAM", FRAMEBUFFER_SIZE);
        let [ready, stored] = Command::Send.ack_steps();

        self.transport.write_bytes(&[Command::Send as u8])?;
        self.wait_ack(ready)?;

        debug!(
            "Streaming payload in {} chunks of {} bytes",
            chunk_count(framebuffer.len(), self.chunk_size),
            self.chunk_size
        );
        let mut sent = 0;
        for chunk in framebuffer.chunks(self.chunk_size) {
            self.transport.write_bytes(chunk)?;
            sent += chunk.len();
            if !self.chunk_delay.is_zero() {
                std::thread::sleep(self.chunk_delay);
            }
            if sent % PROGRESS_INTERVAL == 0 || sent == FRAMEBUFFER_SIZE {
                debug!("{}/{} bytes", sent, FRAMEBUFFER_SIZE);
            }
        }

        self.wait_ack(stored)?;
        info!("Framebuffer stored");
        Ok(())
    }

    /// Pushes the stored framebuffer to the panel.
    pub fn write(&mut self) -> Result<()> {
        info!("Refreshing display from controller RAM");
        self.command(Command::Write)?;
        info!("Display updated");
        Ok(())
    }

    /// Uploads a framebuffer and refreshes the panel.
    pub fn show(&mut self, framebuffer: &[u8]) -> Result<()> {
        self.send(framebuffer)?;
        self.write()
    }

    /// Sends a payload-less command and waits for both of its ACKs.
    fn command(&mut self, command: Command) -> Result<()> {
        self.transport.write_bytes(&[command as u8])?;
        for step in command.ack_steps() {
            self.wait_ack(step)?;
        }
        Ok(())
    }

    fn wait_ack(&mut self, step: AckStep) -> Result<()> {
        match self.transport.read_byte()? {
            None => Err(Error::Timeout { step }),
            Some(ACK) => {
                debug!("ACK [{}]", step);
                Ok(())
            }
            Some(received) => Err(Error::UnexpectedAck { step, received }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    const NAK: u8 = 0x15;

    fn settings() -> LinkSettings {
        LinkSettings {
            chunk_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    fn device(replies: &[Option<u8>]) -> EpdDevice<MockTransport> {
        EpdDevice::with_transport(MockTransport::with_replies(replies), &settings())
    }

    fn pattern() -> Vec<u8> {
        (0..FRAMEBUFFER_SIZE).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_send_rejects_wrong_length() {
        for len in [0, 1, 64, FRAMEBUFFER_SIZE - 1, FRAMEBUFFER_SIZE + 1, 4096] {
            let mut dev = device(&[Some(ACK), Some(ACK)]);
            let err = dev.send(&vec![0xFF; len]).unwrap_err();
            assert!(matches!(
                err,
                Error::InvalidInput { expected: FRAMEBUFFER_SIZE, actual } if actual == len
            ));
            assert!(dev.transport().writes.is_empty());
        }
    }

    #[test]
    fn test_send_chunks_payload() {
        let fb = pattern();
        let mut dev = device(&[Some(ACK), Some(ACK)]);
        dev.send(&fb).unwrap();

        let t = dev.into_transport();
        assert_eq!(t.writes[0], vec![0x69]);
        assert_eq!(t.writes.len(), 1 + 44);
        assert!(t.writes[1..44].iter().all(|w| w.len() == 64));
        assert_eq!(t.writes[44].len(), 4);

        let written = t.written();
        assert_eq!(written.len(), 1 + FRAMEBUFFER_SIZE);
        assert_eq!(&written[1..], fb.as_slice());
    }

    #[test]
    fn test_custom_chunk_size() {
        let s = LinkSettings {
            chunk_size: 1000,
            ..settings()
        };
        let mut dev = EpdDevice::with_transport(MockTransport::with_replies(&[Some(ACK); 2]), &s);
        dev.send(&pattern()).unwrap();
        let lens: Vec<_> = dev.transport().writes.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![1, 1000, 1000, 756]);
    }

    #[test]
    fn test_write_and_clear_succeed() {
        let mut dev = device(&[Some(ACK), Some(ACK)]);
        dev.write().unwrap();
        assert_eq!(dev.transport().written(), vec![0x57]);

        let mut dev = device(&[Some(ACK), Some(ACK)]);
        dev.clear().unwrap();
        assert_eq!(dev.transport().written(), vec![0x43]);
    }

    #[test]
    fn test_send_stops_on_first_ack_timeout() {
        let mut dev = device(&[None]);
        let err = dev.send(&pattern()).unwrap_err();
        assert!(matches!(
            err,
            Error::Timeout {
                step: AckStep::ReadyForData
            }
        ));
        // Payload must not follow a missing ACK.
        assert_eq!(dev.transport().written(), vec![0x69]);
    }

    #[test]
    fn test_send_unexpected_first_ack() {
        let mut dev = device(&[Some(NAK)]);
        let err = dev.send(&pattern()).unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedAck {
                step: AckStep::ReadyForData,
                received: NAK
            }
        ));
        assert_eq!(dev.transport().writes.len(), 1);
    }

    #[test]
    fn test_send_second_ack_failures() {
        let mut dev = device(&[Some(ACK), None]);
        let err = dev.send(&pattern()).unwrap_err();
        assert!(matches!(
            err,
            Error::Timeout {
                step: AckStep::BufferStored
            }
        ));

        let mut dev = device(&[Some(ACK), Some(0x00)]);
        let err = dev.send(&pattern()).unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedAck {
                step: AckStep::BufferStored,
                received: 0x00
            }
        ));
        assert_eq!(dev.transport().written().len(), 1 + FRAMEBUFFER_SIZE);
    }

    #[test]
    fn test_write_ack_failures() {
        let mut dev = device(&[None]);
        assert!(matches!(
            dev.write().unwrap_err(),
            Error::Timeout {
                step: AckStep::CommandReceived
            }
        ));

        let mut dev = device(&[Some(ACK), Some(NAK)]);
        assert!(matches!(
            dev.write().unwrap_err(),
            Error::UnexpectedAck {
                step: AckStep::RefreshComplete,
                received: NAK
            }
        ));
        assert_eq!(dev.transport().written(), vec![0x57]);
    }

    #[test]
    fn test_clear_ack_failures() {
        let mut dev = device(&[Some(ACK), None]);
        assert!(matches!(
            dev.clear().unwrap_err(),
            Error::Timeout {
                step: AckStep::ClearComplete
            }
        ));

        let mut dev = device(&[Some(0x43)]);
        assert!(matches!(
            dev.clear().unwrap_err(),
            Error::UnexpectedAck {
                step: AckStep::CommandReceived,
                received: 0x43
            }
        ));
        assert_eq!(dev.transport().written(), vec![0x43]);
    }

    #[test]
    fn test_show_is_send_then_write() {
        let fb = pattern();

        let mut send_only = device(&[Some(ACK), Some(ACK)]);
        send_only.send(&fb).unwrap();
        let mut write_only = device(&[Some(ACK), Some(ACK)]);
        write_only.write().unwrap();
        let mut expected = send_only.transport().written();
        expected.extend(write_only.transport().written());

        let mut dev = device(&[Some(ACK); 4]);
        dev.show(&fb).unwrap();
        assert_eq!(dev.transport().written(), expected);
    }

    #[test]
    fn test_show_skips_write_after_failed_send() {
        let mut dev = device(&[Some(ACK), Some(NAK), Some(ACK), Some(ACK)]);
        assert!(dev.show(&pattern()).is_err());
        // Command byte plus 44 payload chunks, no WRITE.
        assert_eq!(dev.transport().writes.len(), 45);
        assert_eq!(dev.transport().replies.len(), 2);
    }

    #[test]
    fn test_show_rejects_wrong_length() {
        let mut dev = device(&[Some(ACK); 4]);
        assert!(matches!(
            dev.show(&[0u8; 10]).unwrap_err(),
            Error::InvalidInput { .. }
        ));
        assert!(dev.transport().writes.is_empty());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::UnexpectedAck {
            step: AckStep::BufferStored,
            received: 0x15,
        };
        assert_eq!(
            err.to_string(),
            "Expected ACK 0x06 for buffer stored, got 0x15"
        );
        let err = Error::Timeout {
            step: AckStep::RefreshComplete,
        };
        assert_eq!(err.to_string(), "No ACK received for refresh complete (timed out)");
    }

    // Hardware tests are skipped by default
    #[test]
    #[ignore]
    fn test_device_clear() {
        let mut dev = EpdDevice::open(&LinkSettings::default()).unwrap();
        assert!(dev.clear().is_ok());
    }
}
