//! Crate-wide error type.
//!
//! Nothing in this crate retries on error. Every failure propagates to the
//! immediate caller, which decides whether to resend a register, pick a
//! different configuration or tear the stream down.

/// Errors reported by the control link, the register cache, the PLL
/// calculator and the PCM streaming engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Register address outside the codec's register file.
    #[error("register address {0:#04x} out of range")]
    OutOfRange(u8),
    /// The control link delivered fewer bytes than requested. The cache
    /// still holds the last known-good value; the chip's state for that
    /// register is unknown.
    #[error("control link sent {sent} of {expected} bytes")]
    LinkError { sent: usize, expected: usize },
    /// Zero input or output frequency handed to the PLL calculator.
    #[error("invalid PLL frequency (target {target} Hz, reference {reference} Hz)")]
    InvalidFrequency { target: u32, reference: u32 },
    /// Unrecognised raw trigger command.
    #[error("invalid trigger command {0}")]
    InvalidCommand(u32),
    /// Buffer/period geometry rejected at `hw_params` time.
    #[error("buffer of {buffer_bytes} bytes does not fit periods of {period_bytes} bytes")]
    ConfigMismatch {
        buffer_bytes: usize,
        period_bytes: usize,
    },
    /// Channel count the DMA path cannot carry.
    #[error("unsupported channel count {0}")]
    InvalidChannels(u8),
    /// Sample rate outside the supported set.
    #[error("unsupported sample rate {0} Hz")]
    InvalidRate(u32),
    /// The DMA completion interrupt could not be claimed.
    #[error("DMA completion interrupt unavailable")]
    IrqUnavailable,
    /// Operation requires the stream to be opened first.
    #[error("stream not open")]
    NotOpen,
    /// Operation not allowed while the DMA channel is running.
    #[error("stream is running")]
    StreamRunning,
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
