//! Periodic DMA playback of PCM data to the I2S FIFO.
//!
//! ## Components
//!
//! | Item | Description |
//! |------|-------------|
//! | [`DmaStream`] | Stream state machine driven by the DMA completion interrupt |
//! | [`Descriptor`] | Source/destination/control words for one period |
//! | [`PeriodQueue`] | Lock-free queue of period notifications for the audio task |
//!
//! ## Usage
//!
//! ```ignore
//! static STREAM: DmaStream<Dma2, Irq, PeriodQueue<8>> =
//!     DmaStream::new(Dma2, Irq, DmaBuffer { base: 0x3300_0000, capacity: 128 * 1024 }, PeriodQueue::new());
//!
//! STREAM.open()?;
//! STREAM.hw_params(HwParams::s16_stereo(8192, 2048))?;
//! STREAM.prepare()?;
//! STREAM.trigger(Trigger::Start)?;
//!
//! // DMA2 interrupt:
//! STREAM.on_complete();
//!
//! // Audio task:
//! while let Some(period) = STREAM.sink().pop() { /* refill the played period */ }
//! ```
//!
//! # Feature gate
//!
//! This module is available when the `pcm` feature is enabled (on by default).

pub mod descriptor;
pub mod engine;
pub mod events;

pub use descriptor::{Descriptor, DmaChannel, IIS_FIFO_ADDR};
pub use engine::{
    DmaBuffer, DmaPeriodState, DmaStream, HwParams, IrqLine, PcmHardware, StreamState, Trigger,
};
pub use events::{Flow, PeriodElapsed, PeriodQueue, PeriodSink};

#[cfg(all(test, feature = "codec"))]
mod integration_tests;
