//! Command/acknowledge protocol definitions.
//!
//! Protocol structure:
//! - Every exchange starts with a single command byte from the host.
//! - The controller answers each step with a single ACK byte (0x06).
//! - SEND is followed by the framebuffer, streamed in paced chunks after the
//!   first ACK. There is no per-chunk ACK.

use std::fmt;
use std::time::Duration;

/// Acknowledgement byte.
pub const ACK: u8 = 0x06;

/// Bytes per payload write during upload.
pub const CHUNK_SIZE: usize = 64;

/// Pause between payload chunks. The controller reads the UART by polling
/// and drops bytes if they arrive faster than this.
pub const CHUNK_DELAY: Duration = Duration::from_millis(2);

/// Read timeout for a single ACK. A full panel refresh takes a few seconds.
pub const ACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Progress is logged every time this many payload bytes have gone out.
pub const PROGRESS_INTERVAL: usize = 512;

/// Controller command bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Upload a framebuffer into controller RAM.
    Send = 0x69,
    /// Push the stored framebuffer to the panel.
    Write = 0x57,
    /// Clear the panel to white.
    Clear = 0x43,
}

impl Command {
    /// The ACKs the controller sends for this command, in order.
    pub fn ack_steps(&self) -> [AckStep; 2] {
        match self {
            Command::Send => [AckStep::ReadyForData, AckStep::BufferStored],
            Command::Write => [AckStep::CommandReceived, AckStep::RefreshComplete],
            Command::Clear => [AckStep::CommandReceived, AckStep::ClearComplete],
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Send => write!(f, "send"),
            Command::Write => write!(f, "write"),
            Command::Clear => write!(f, "clear"),
        }
    }
}

/// A point in an exchange where the controller must answer with an ACK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStep {
    /// SEND accepted, controller is waiting for the payload.
    ReadyForData,
    /// Full payload received and stored.
    BufferStored,
    /// WRITE or CLEAR accepted.
    CommandReceived,
    /// Panel refresh finished.
    RefreshComplete,
    /// Panel clear finished.
    ClearComplete,
}

impl fmt::Display for AckStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AckStep::ReadyForData => write!(f, "ready for data"),
            AckStep::BufferStored => write!(f, "buffer stored"),
            AckStep::CommandReceived => write!(f, "command received"),
            AckStep::RefreshComplete => write!(f, "refresh complete"),
            AckStep::ClearComplete => write!(f, "clear complete"),
        }
    }
}

/// Number of payload chunks needed for `len` bytes.
pub fn chunk_count(len: usize, chunk_size: usize) -> usize {
    len.div_ceil(chunk_size)
}
