//! S3C2440 + WM8976 board glue.
//!
//! Picks the CPU-side I2S clocking for a requested rate and applies the
//! matching interface format and stream parameters to the codec. The CPU's
//! I2S block runs as clock master from PCLK; the codec is always the slave.

use crate::control::{CodecControl, DaiFormat, SampleFormat, SampleRate};
use crate::error::{Error, Result};

/// Rates the board's clock table knows about, ascending.
pub const BOARD_RATES: [u32; 10] = [
    8_000, 11_025, 16_000, 22_050, 32_000, 44_100, 48_000, 64_000, 88_200, 96_000,
];

/// Bit clock per frame on the I2S link.
pub const BCLK_PER_FRAME: u32 = 32;

/// Largest value of one 5-bit IISPSR prescaler.
const PRESCALER_MAX: u32 = 32;

/// Codec system clock per frame (384fs).
pub const SYSCLK_PER_FRAME: u32 = 384;

/// Where the CPU's I2S master clock comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSource {
    Pclk,
    /// MPLL input; the board has no support for it.
    Mpll,
}

/// CPU-side I2S clock setup for one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2sClocking {
    pub source: ClockSource,
    /// Codec system clock in Hz.
    pub sysclk: u32,
    /// PCLK divider feeding the I2S block.
    pub divider: u32,
    /// Serial bit clock in Hz.
    pub bclk: u32,
}

impl I2sClocking {
    /// IISPSR value: the same divider on both prescalers.
    pub const fn prescaler(&self) -> u32 {
        let p = self.divider.saturating_sub(1) & 0x1f;
        (p << 5) | p
    }
}

/// Entry in [`BOARD_RATES`] closest to `rate`.
pub fn nearest_rate(rate: u32) -> u32 {
    let mut best = BOARD_RATES[0];
    for candidate in BOARD_RATES {
        if candidate.abs_diff(rate) < best.abs_diff(rate) {
            best = candidate;
        }
    }
    best
}

/// Clocking for `rate` with the I2S block running from `pclk`.
///
/// Rates that land on the 8 kHz table entry would need the MPLL source and
/// are rejected.
pub fn i2s_clocking(rate: u32, pclk: u32) -> Result<I2sClocking> {
    let nearest = nearest_rate(rate);
    let source = if nearest == BOARD_RATES[0] {
        ClockSource::Mpll
    } else {
        ClockSource::Pclk
    };
    if source == ClockSource::Mpll {
        log::error!("{} Hz needs the MPLL clock source, not supported", rate);
        return Err(Error::InvalidRate(rate));
    }

    let sysclk = SYSCLK_PER_FRAME.saturating_mul(rate);
    let divider = pclk / sysclk;
    if divider == 0 || divider > PRESCALER_MAX {
        log::error!("{} Hz not reachable from PCLK {} Hz", rate, pclk);
        return Err(Error::InvalidRate(rate));
    }

    log::debug!(
        "{} Hz: 384fs from {:?}, sysclk {} Hz, divider {}",
        rate,
        source,
        sysclk,
        divider
    );
    Ok(I2sClocking {
        source,
        sysclk,
        divider,
        bclk: BCLK_PER_FRAME * rate,
    })
}

/// Set up the codec for a playback stream and return the CPU-side clocking.
///
/// Nothing is written unless both the board and the codec support `rate`.
pub fn configure_codec<C>(
    codec: &mut C,
    format: SampleFormat,
    rate: u32,
    pclk: u32,
) -> Result<I2sClocking>
where
    C: CodecControl<Error = Error>,
{
    let clocking = i2s_clocking(rate, pclk)?;
    let rate = SampleRate::try_from(rate)?;

    codec.set_format(DaiFormat::default())?;
    codec.hw_params(format, rate)?;
    Ok(clocking)
}
