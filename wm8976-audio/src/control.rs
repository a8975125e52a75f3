//! Digital audio interface configuration and the codec control contract.
//!
//! These types describe a stream the way the upper audio layer asks for it.
//! Codec drivers turn them into register writes; the machine glue uses them
//! to pick clocks for the CPU side of the link.

use crate::error::Error;

// ── Stream parameters ──────────────────────────────────────────────────────

/// Sample rates the codec has filter coefficients for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SampleRate {
    Hz8000,
    Hz11025,
    Hz16000,
    Hz22050,
    Hz32000,
    Hz44100,
    Hz48000,
}

impl SampleRate {
    /// Every supported rate, ascending.
    pub const ALL: [SampleRate; 7] = [
        SampleRate::Hz8000,
        SampleRate::Hz11025,
        SampleRate::Hz16000,
        SampleRate::Hz22050,
        SampleRate::Hz32000,
        SampleRate::Hz44100,
        SampleRate::Hz48000,
    ];

    /// Rate in Hz.
    pub const fn hz(self) -> u32 {
        match self {
            SampleRate::Hz8000 => 8_000,
            SampleRate::Hz11025 => 11_025,
            SampleRate::Hz16000 => 16_000,
            SampleRate::Hz22050 => 22_050,
            SampleRate::Hz32000 => 32_000,
            SampleRate::Hz44100 => 44_100,
            SampleRate::Hz48000 => 48_000,
        }
    }
}

impl TryFrom<u32> for SampleRate {
    type Error = Error;

    fn try_from(hz: u32) -> Result<Self, Self::Error> {
        SampleRate::ALL
            .into_iter()
            .find(|r| r.hz() == hz)
            .ok_or(Error::InvalidRate(hz))
    }
}

/// PCM sample formats (all little-endian).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// 16-bit in 2 bytes.
    S16Le,
    /// 20-bit packed in 3 bytes.
    S20_3Le,
    /// 24-bit packed in 3 bytes.
    S24_3Le,
    /// 24-bit in 4 bytes.
    S24Le,
}

impl SampleFormat {
    /// Significant bits per sample.
    pub const fn bits(self) -> u32 {
        match self {
            SampleFormat::S16Le => 16,
            SampleFormat::S20_3Le => 20,
            SampleFormat::S24_3Le | SampleFormat::S24Le => 24,
        }
    }

    /// Storage bytes per sample in the DMA buffer.
    pub const fn bytes(self) -> usize {
        match self {
            SampleFormat::S16Le => 2,
            SampleFormat::S20_3Le | SampleFormat::S24_3Le => 3,
            SampleFormat::S24Le => 4,
        }
    }
}

// ── Interface format ───────────────────────────────────────────────────────

/// Which end of the link drives the bit and frame clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clocking {
    /// Codec drives BCLK and LRCLK.
    Master,
    /// Codec follows the CPU's clocks.
    #[default]
    Slave,
}

/// Serial data framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterfaceFormat {
    #[default]
    I2s,
    RightJustified,
    LeftJustified,
    DspA,
}

/// Bit clock / frame clock polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockInversion {
    #[default]
    NormalBitNormalFrame,
    InvertedBitInvertedFrame,
    InvertedBitNormalFrame,
    NormalBitInvertedFrame,
}

/// Complete digital audio interface format.
///
/// The default is what the S3C2440 board uses: I2S, no inversion, codec as
/// clock slave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DaiFormat {
    pub clocking: Clocking,
    pub format: InterfaceFormat,
    pub inversion: ClockInversion,
}

// ── Codec power and clocks ─────────────────────────────────────────────────

/// Analog power state requested by the upper layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiasLevel {
    /// Fully powered, streaming.
    On,
    /// About to stream.
    Prepare,
    /// Idle with references up.
    Standby,
    /// Everything powered down.
    Off,
}

/// Clock dividers and selectors that can be set independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockDivider {
    /// MCLK divider ahead of the sample-rate clock.
    Mclk,
    /// Bit clock divider (master mode).
    Bclk,
    /// GPIO clock output divider.
    Opclk,
    /// DAC oversampling rate.
    DacOsr,
    /// ADC oversampling rate.
    AdcOsr,
    /// MCLK vs. PLL output as the system clock.
    MclkSelect,
}

// ── Control contract ───────────────────────────────────────────────────────

/// Requests the upper audio layer makes of a codec.
pub trait CodecControl {
    /// Error type for control operations.
    type Error;

    /// Program the serial interface format.
    fn set_format(&mut self, format: DaiFormat) -> Result<(), Self::Error>;

    /// Program word length and rate-dependent filters for a stream.
    fn hw_params(&mut self, format: SampleFormat, rate: SampleRate) -> Result<(), Self::Error>;

    /// Set one clock divider to a pre-positioned field value.
    fn set_clkdiv(&mut self, divider: ClockDivider, value: u16) -> Result<(), Self::Error>;

    /// Run the PLL from `freq_in` to `freq_out`; either being 0 disables it.
    fn set_pll(&mut self, freq_in: u32, freq_out: u32) -> Result<(), Self::Error>;

    /// Soft-mute the DAC.
    fn mute(&mut self, mute: bool) -> Result<(), Self::Error>;

    /// Move to a new analog power state.
    fn set_bias_level(&mut self, level: BiasLevel) -> Result<(), Self::Error>;
}
