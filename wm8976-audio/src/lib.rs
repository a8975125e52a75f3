//! # wm8976-audio
//!
//! A `no_std`, allocation-free control and streaming core for a WM8976 audio
//! codec on an S3C2440 (JZ2440-class) board. It programs the codec over its
//! write-only three-wire control port, computes the codec's PLL coefficients
//! and drives period-by-period DMA playback from a ring buffer to the I2S
//! FIFO, paced by the DMA completion interrupt.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Transport | [`l3`] | Bit-banged clock/data/mode bus, byte frames only |
//! | Registers | [`codec`] | Register map, write-through shadow cache, PLL math |
//! | Driver | [`codec::Wm8976`] | Power, format, rate, clocks, mute, suspend/resume |
//! | Contract | [`control`] | DAI configuration types and the `CodecControl` trait |
//! | Streaming | [`pcm`] | DMA period engine, trigger state machine, period events |
//! | Board | [`machine`] | CPU-side I2S clocking and codec setup per stream |
//!
//! ## Quick start
//!
//! ```ignore
//! use wm8976_audio::codec::Wm8976;
//! use wm8976_audio::l3::L3Bus;
//! use wm8976_audio::machine::configure_codec;
//! use wm8976_audio::control::SampleFormat;
//!
//! let mut codec = Wm8976::new(L3Bus::new(clk, dat, mode, delay));
//! codec.probe()?;
//! let clocks = configure_codec(&mut codec, SampleFormat::S16Le, 44_100, PCLK)?;
//! codec.digital_mute(false)?;
//!
//! STREAM.open()?;
//! STREAM.hw_params(HwParams::s16_stereo(8192, 2048))?;
//! STREAM.prepare()?;
//! STREAM.trigger(Trigger::Start)?;
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `codec` | yes | Register cache, PLL calculator, WM8976 driver |
//! | `pcm` | yes | DMA streaming engine (requires `critical-section`) |
//!
//! ## Logging
//!
//! Everything logs through the [`log`] facade: control frames at `trace`,
//! stream lifecycle at `debug`, PLL range and queue overruns at `warn`,
//! link and interrupt failures at `error`. The application installs the
//! logger.

#![cfg_attr(not(test), no_std)]

pub mod control;
pub mod error;
pub mod l3;
pub mod machine;

#[cfg(feature = "codec")]
pub mod codec;

#[cfg(feature = "pcm")]
pub mod pcm;

pub use error::{Error, Result};
