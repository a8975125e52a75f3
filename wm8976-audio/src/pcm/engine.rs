//! Periodic DMA playback engine.
//!
//! ## Architecture
//!
//! ```text
//!  ring buffer (SDRAM)                      DMA channel            I2S
//! ┌────────┬────────┬────────┬────────┐   ┌─────────────┐       ┌──────┐
//! │ period │ period │ period │ period │──►│ one period  │──────►│ FIFO │
//! └────────┴────────┴────────┴────────┘   │ per trigger │       └──────┘
//!     ▲ offset                            └──────┬──────┘
//!     └──────── completion IRQ: advance, notify, reload ◄┘
//! ```
//!
//! The channel moves exactly one period per start. Its completion interrupt
//! calls [`DmaStream::on_complete`], which advances the offset, notifies the
//! [`PeriodSink`] and, while the stream is running, loads the next period and
//! restarts the channel.
//!
//! ## Concurrency
//!
//! All mutable state, including the channel registers, lives in a
//! `critical_section::Mutex`. Every method takes `&self`, so a stream can sit
//! in a `static` shared between the audio task and the DMA interrupt. The sink
//! is called with the state unlocked, so it may call [`DmaStream::trigger`].
//!
//! ## States
//!
//! ```text
//!  open ─► Idle ─prepare─► Prepared ─Start─► Running ─Pause─► Paused
//!           ▲                                  │  ▲             │
//!           └──────────── Stop/Suspend ◄───────┘  └── Release ──┘
//! ```

use core::cell::RefCell;
use core::fmt::Debug;

use critical_section::Mutex;

use super::descriptor::{Descriptor, DmaChannel, MAX_TRANSFER_COUNT};
use super::events::{Flow, PeriodElapsed, PeriodSink};
use crate::control::SampleFormat;
use crate::error::{Error, Result};

// ── Configuration ──────────────────────────────────────────────────────────

/// Limits of the DMA path to the I2S FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmHardware {
    pub buffer_bytes_max: usize,
    pub periods_min: usize,
    pub periods_max: usize,
    pub channels_min: u8,
    pub channels_max: u8,
}

impl PcmHardware {
    /// S3C2440 I2S playback on DMA channel 2.
    pub const S3C2440: Self = Self {
        buffer_bytes_max: 128 * 1024,
        periods_min: 2,
        periods_max: 128,
        channels_min: 1,
        channels_max: 2,
    };

    /// S3C2440 I2S capture: mono only.
    pub const S3C2440_CAPTURE: Self = Self {
        channels_max: 1,
        ..Self::S3C2440
    };
}

impl Default for PcmHardware {
    fn default() -> Self {
        Self::S3C2440
    }
}

/// Preallocated, DMA-coherent ring buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaBuffer {
    /// Physical address the DMA engine reads from.
    pub base: u32,
    /// Bytes available at `base`.
    pub capacity: usize,
}

/// Sample layout and geometry of a stream, fixed at `hw_params` time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwParams {
    pub format: SampleFormat,
    pub channels: u8,
    pub buffer_bytes: usize,
    pub period_bytes: usize,
}

impl HwParams {
    pub const fn new(
        format: SampleFormat,
        channels: u8,
        buffer_bytes: usize,
        period_bytes: usize,
    ) -> Self {
        Self {
            format,
            channels,
            buffer_bytes,
            period_bytes,
        }
    }

    /// 16-bit stereo.
    pub const fn s16_stereo(buffer_bytes: usize, period_bytes: usize) -> Self {
        Self::new(SampleFormat::S16Le, 2, buffer_bytes, period_bytes)
    }

    /// Bytes per frame: one sample for every channel.
    pub const fn frame_bytes(&self) -> usize {
        self.format.bytes() * self.channels as usize
    }

    /// Number of periods in the ring.
    pub const fn periods(&self) -> usize {
        self.buffer_bytes / self.period_bytes
    }
}

// ── Trigger commands ───────────────────────────────────────────────────────

/// Stream trigger commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Start,
    Stop,
    Pause,
    Release,
    Suspend,
    Resume,
}

impl TryFrom<u32> for Trigger {
    type Error = Error;

    /// Decode the audio layer's raw command numbers.
    fn try_from(raw: u32) -> Result<Self> {
        match raw {
            0 => Ok(Trigger::Stop),
            1 => Ok(Trigger::Start),
            3 => Ok(Trigger::Pause),
            4 => Ok(Trigger::Release),
            5 => Ok(Trigger::Suspend),
            6 => Ok(Trigger::Resume),
            other => Err(Error::InvalidCommand(other)),
        }
    }
}

// ── Interrupt line ─────────────────────────────────────────────────────────

/// The DMA completion interrupt, as seen by the stream.
pub trait IrqLine {
    type Error: Debug;

    /// Route the completion interrupt to [`DmaStream::on_complete`].
    fn request(&mut self) -> core::result::Result<(), Self::Error>;

    /// Stop routing the interrupt.
    fn free(&mut self);
}

// ── State ──────────────────────────────────────────────────────────────────

/// Lifecycle of an open stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Prepared,
    Running,
    Paused,
}

/// Position bookkeeping shared with the completion interrupt.
///
/// `offset` is always a multiple of `period_bytes` and below `buffer_bytes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DmaPeriodState {
    pub base: u32,
    pub buffer_bytes: usize,
    pub period_bytes: usize,
    pub offset: usize,
    pub running: bool,
}

impl DmaPeriodState {
    fn descriptor(&self) -> Descriptor {
        Descriptor::period(self.base, self.offset, self.period_bytes)
    }

    /// Move to the next period, wrapping at the end of the buffer.
    fn advance(&mut self) {
        self.offset += self.period_bytes;
        if self.offset >= self.buffer_bytes {
            self.offset = 0;
        }
    }
}

struct Inner<C, I> {
    channel: C,
    irq: I,
    buffer: DmaBuffer,
    dma: DmaPeriodState,
    state: StreamState,
    open: bool,
    frame_bytes: usize,
    periods: u32,
}

impl<C: DmaChannel, I> Inner<C, I> {
    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(Error::NotOpen)
        }
    }

    fn ensure_not_running(&self) -> Result<()> {
        if self.state == StreamState::Running {
            Err(Error::StreamRunning)
        } else {
            Ok(())
        }
    }

    fn halt(&mut self, next: StreamState) {
        self.dma.running = false;
        self.channel.stop();
        self.state = next;
    }
}

// ── Stream ─────────────────────────────────────────────────────────────────

/// Playback stream over one DMA channel.
pub struct DmaStream<C, I, S> {
    inner: Mutex<RefCell<Inner<C, I>>>,
    sink: S,
    hw: PcmHardware,
}

impl<C, I, S> DmaStream<C, I, S>
where
    C: DmaChannel,
    I: IrqLine,
    S: PeriodSink,
{
    /// Closed stream over `channel`, streaming out of `buffer`.
    pub const fn new(channel: C, irq: I, buffer: DmaBuffer, sink: S) -> Self {
        Self::with_hardware(channel, irq, buffer, sink, PcmHardware::S3C2440)
    }

    /// Closed stream with explicit hardware limits.
    pub const fn with_hardware(
        channel: C,
        irq: I,
        buffer: DmaBuffer,
        sink: S,
        hw: PcmHardware,
    ) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                channel,
                irq,
                buffer,
                dma: DmaPeriodState {
                    base: buffer.base,
                    buffer_bytes: 0,
                    period_bytes: 0,
                    offset: 0,
                    running: false,
                },
                state: StreamState::Idle,
                open: false,
                frame_bytes: 0,
                periods: 0,
            })),
            sink,
            hw,
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Inner<C, I>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Claim the completion interrupt.
    pub fn open(&self) -> Result<()> {
        self.with(|inner| {
            if inner.open {
                return Ok(());
            }
            inner.irq.request().map_err(|e| {
                log::error!("DMA interrupt request failed: {:?}", e);
                Error::IrqUnavailable
            })?;
            inner.open = true;
            inner.state = StreamState::Idle;
            log::debug!("pcm open");
            Ok(())
        })
    }

    /// Release the completion interrupt. Not allowed while running.
    pub fn close(&self) -> Result<()> {
        self.with(|inner| {
            inner.ensure_open()?;
            inner.ensure_not_running()?;
            inner.dma.running = false;
            inner.irq.free();
            inner.open = false;
            inner.state = StreamState::Idle;
            log::debug!("pcm close");
            Ok(())
        })
    }

    /// Fix buffer and period geometry.
    pub fn hw_params(&self, params: HwParams) -> Result<()> {
        self.with(|inner| {
            inner.ensure_open()?;
            inner.ensure_not_running()?;
            self.check(&params, &inner.buffer)?;

            inner.dma.buffer_bytes = params.buffer_bytes;
            inner.dma.period_bytes = params.period_bytes;
            inner.dma.offset = 0;
            inner.dma.running = false;
            inner.frame_bytes = params.frame_bytes();
            inner.state = StreamState::Idle;
            log::debug!(
                "pcm hw_params: {} ch {}-bit, {} bytes in {} periods of {}",
                params.channels,
                params.format.bits(),
                params.buffer_bytes,
                params.periods(),
                params.period_bytes
            );
            Ok(())
        })
    }

    fn check(&self, params: &HwParams, buffer: &DmaBuffer) -> Result<()> {
        let HwParams {
            channels,
            buffer_bytes,
            period_bytes,
            ..
        } = *params;
        if !(self.hw.channels_min..=self.hw.channels_max).contains(&channels) {
            return Err(Error::InvalidChannels(channels));
        }

        let frame_bytes = params.frame_bytes();
        let mismatch = Error::ConfigMismatch {
            buffer_bytes,
            period_bytes,
        };

        if period_bytes == 0 || buffer_bytes % period_bytes != 0 {
            return Err(mismatch);
        }
        // DMA moves half-words; frames must not straddle periods.
        if period_bytes % 2 != 0 || period_bytes % frame_bytes != 0 {
            return Err(mismatch);
        }
        if buffer_bytes > self.hw.buffer_bytes_max || buffer_bytes > buffer.capacity {
            return Err(mismatch);
        }
        if !(self.hw.periods_min..=self.hw.periods_max).contains(&params.periods()) {
            return Err(mismatch);
        }
        if period_bytes as u32 / 2 > MAX_TRANSFER_COUNT {
            return Err(mismatch);
        }
        Ok(())
    }

    /// Rewind to the start of the buffer and load the first period.
    pub fn prepare(&self) -> Result<()> {
        self.with(|inner| {
            inner.ensure_open()?;
            inner.ensure_not_running()?;
            if inner.dma.period_bytes == 0 {
                return Err(Error::ConfigMismatch {
                    buffer_bytes: 0,
                    period_bytes: 0,
                });
            }

            inner.dma.offset = 0;
            inner.dma.running = false;
            inner.periods = 0;
            let descriptor = inner.dma.descriptor();
            descriptor.load(&mut inner.channel);
            inner.state = StreamState::Prepared;
            log::debug!("pcm prepare: {:?}", descriptor);
            Ok(())
        })
    }

    /// Start, stop, pause or resume the channel.
    pub fn trigger(&self, cmd: Trigger) -> Result<()> {
        self.with(|inner| {
            inner.ensure_open()?;
            match cmd {
                Trigger::Start | Trigger::Resume | Trigger::Release => {
                    inner.dma.running = true;
                    inner.channel.start();
                    inner.state = StreamState::Running;
                }
                Trigger::Stop | Trigger::Suspend => inner.halt(StreamState::Idle),
                Trigger::Pause => inner.halt(StreamState::Paused),
            }
            log::debug!("pcm trigger {:?} -> {:?}", cmd, inner.state);
            Ok(())
        })
    }

    /// [`trigger`](Self::trigger) with a raw command number.
    pub fn trigger_raw(&self, cmd: u32) -> Result<()> {
        self.trigger(Trigger::try_from(cmd)?)
    }

    /// DMA completion interrupt handler.
    pub fn on_complete(&self) {
        critical_section::with(|cs| {
            let event = {
                let mut inner = self.inner.borrow_ref_mut(cs);
                if !inner.open || inner.dma.period_bytes == 0 {
                    log::error!("spurious DMA completion");
                    return;
                }
                let left = inner.channel.remaining();
                if left != 0 {
                    log::warn!("DMA completion with {} transfers left", left);
                }
                inner.dma.advance();
                inner.periods = inner.periods.wrapping_add(1);
                PeriodElapsed {
                    offset: inner.dma.offset,
                    count: inner.periods,
                }
            };

            let flow = self.sink.period_elapsed(event);

            let mut inner = self.inner.borrow_ref_mut(cs);
            if flow == Flow::Stop && inner.dma.running {
                log::warn!("pcm stopped by sink at period {}", event.count);
                inner.halt(StreamState::Idle);
            }
            if inner.dma.running {
                let descriptor = inner.dma.descriptor();
                descriptor.load(&mut inner.channel);
                inner.channel.start();
            }
        })
    }

    /// Playback position in frames.
    pub fn pointer(&self) -> usize {
        self.with(|inner| {
            let mut offset = inner.dma.offset;
            if offset >= inner.dma.buffer_bytes {
                offset = 0;
            }
            let frames = offset.checked_div(inner.frame_bytes).unwrap_or(0);
            log::trace!("pcm pointer: {} bytes, {} frames", offset, frames);
            frames
        })
    }

    pub fn state(&self) -> StreamState {
        self.with(|inner| inner.state)
    }

    pub fn is_open(&self) -> bool {
        self.with(|inner| inner.open)
    }

    /// Copy of the position bookkeeping.
    pub fn snapshot(&self) -> DmaPeriodState {
        self.with(|inner| inner.dma)
    }

    /// Hardware limits this stream validates against.
    pub fn hardware(&self) -> &PcmHardware {
        &self.hw
    }

    /// The notification sink, e.g. to drain a [`PeriodQueue`](super::PeriodQueue).
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Tear down and return the channel, interrupt line and sink.
    pub fn release(self) -> (C, I, S) {
        let inner = self.inner.into_inner().into_inner();
        (inner.channel, inner.irq, self.sink)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
