//! Bit-banged three-wire (L3-style) control bus.
//!
//! The WM8976 on the JZ2440 board has its control port wired to three GPIO
//! lines: clock, data and mode (strobe). The chip only ever receives, so the
//! bus is a pure byte transport: it knows nothing about registers, it clocks
//! bytes out and reports how many made it.
//!
//! ```text
//!         ┌──────────── byte 0 ────────────┐┌─── byte 1 ───┐
//! MODE ───┘                                                 └─settle─┌───
//! CLK  ────┐_┌─┐_┌─┐_┌─┐_┌─┐_┌─┐_┌─┐_┌─┐_┌─┐_┌ ...  ─┐_┌──────────────────
//! DATA ────<b7 ><b6 ><b5 ><b4 ><b3 ><b2 ><b1 ><b0 > ...       ────────────
//! ```
//!
//! Data is driven while the clock is low and sampled by the codec on the
//! rising edge, so every bit is: clock low, drive data, wait the data setup
//! time, clock high, wait the clock-high time. Lowering the mode line after
//! the last byte latches the frame.
//!
//! Timing waits go through an injected [`DelayNs`] so tests can run the bus
//! with a no-op delay.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

// ── Transport trait ────────────────────────────────────────────────────────

/// A write-only byte transport towards the codec.
///
/// Implementations must not retry: a short count is reported as-is and the
/// caller decides what to do with it. Callers serialize access; the link has
/// no internal lock.
pub trait ControlLink {
    /// Send `data` as one strobe-bracketed frame.
    ///
    /// `address` selects the target on a shared bus. The WM8976 control port
    /// has no address phase, so [`L3Bus`] only logs it.
    ///
    /// Returns the number of bytes delivered.
    fn transmit(&mut self, address: u8, data: &[u8]) -> usize;
}

impl<T: ControlLink + ?Sized> ControlLink for &mut T {
    fn transmit(&mut self, address: u8, data: &[u8]) -> usize {
        (**self).transmit(address, data)
    }
}

// ── Timing ─────────────────────────────────────────────────────────────────

/// Bus timing in nanoseconds.
///
/// Defaults match the JZ2440 wiring of the WM8976 control port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L3Timing {
    /// Data valid before the rising clock edge.
    pub data_setup: u32,
    /// Data held after the rising clock edge.
    pub data_hold: u32,
    /// Clock high time per bit.
    pub clock_high: u32,
    /// Mode line hold time after the last bit (8 clock cycles).
    pub mode_hold: u32,
    /// Mode line setup time.
    pub mode_setup: u32,
}

impl L3Timing {
    /// Time the mode line stays low to latch a frame.
    ///
    /// The data hold time has already elapsed inside the last bit, so it is
    /// subtracted from the hold + setup window.
    pub const fn settle(&self) -> u32 {
        (self.mode_hold + self.mode_setup).saturating_sub(self.data_hold)
    }
}

impl Default for L3Timing {
    fn default() -> Self {
        Self {
            data_setup: 100,
            data_hold: 100,
            clock_high: 100,
            mode_hold: 1600,
            mode_setup: 40,
        }
    }
}

// ── Bus driver ─────────────────────────────────────────────────────────────

/// A pin refused a level change. The transfer stops at that point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PinFault;

/// Three-wire bus over any [`OutputPin`] triple and [`DelayNs`] provider.
pub struct L3Bus<CLK, DAT, MODE, D> {
    clk: CLK,
    dat: DAT,
    mode: MODE,
    delay: D,
    timing: L3Timing,
}

impl<CLK, DAT, MODE, D> L3Bus<CLK, DAT, MODE, D>
where
    CLK: OutputPin,
    DAT: OutputPin,
    MODE: OutputPin,
    D: DelayNs,
{
    /// Create a bus with the default board timing.
    pub fn new(clk: CLK, dat: DAT, mode: MODE, delay: D) -> Self {
        Self::with_timing(clk, dat, mode, delay, L3Timing::default())
    }

    /// Create a bus with explicit timing.
    pub fn with_timing(clk: CLK, dat: DAT, mode: MODE, delay: D, timing: L3Timing) -> Self {
        Self {
            clk,
            dat,
            mode,
            delay,
            timing,
        }
    }

    /// Current timing.
    pub fn timing(&self) -> L3Timing {
        self.timing
    }

    /// Consume the bus and hand back the pins and delay.
    pub fn release(self) -> (CLK, DAT, MODE, D) {
        (self.clk, self.dat, self.mode, self.delay)
    }

    fn set_clk(&mut self, high: bool) -> Result<(), PinFault> {
        drive(&mut self.clk, high)
    }

    fn set_dat(&mut self, high: bool) -> Result<(), PinFault> {
        drive(&mut self.dat, high)
    }

    fn set_mode(&mut self, high: bool) -> Result<(), PinFault> {
        drive(&mut self.mode, high)
    }

    /// Clock, data and mode all high.
    fn open_frame(&mut self) -> Result<(), PinFault> {
        self.set_clk(true)?;
        self.set_dat(true)?;
        self.set_mode(true)
    }

    fn send_byte(&mut self, byte: u8) -> Result<(), PinFault> {
        for bit in (0..8).rev() {
            self.set_clk(false)?;
            self.set_dat((byte >> bit) & 1 != 0)?;
            self.delay.delay_ns(self.timing.data_setup);
            self.set_clk(true)?;
            self.delay.delay_ns(self.timing.clock_high);
        }
        Ok(())
    }

    /// Pulse the mode line low to latch, then return every line to idle.
    fn latch(&mut self) -> Result<(), PinFault> {
        self.set_mode(false)?;
        self.delay.delay_ns(self.timing.settle());
        self.set_mode(true)?;
        self.set_dat(true)?;
        self.set_clk(true)
    }
}

impl<CLK, DAT, MODE, D> ControlLink for L3Bus<CLK, DAT, MODE, D>
where
    CLK: OutputPin,
    DAT: OutputPin,
    MODE: OutputPin,
    D: DelayNs,
{
    /// Clock out `data` and latch it.
    ///
    /// A pin failure while clocking stops the transfer and reports the bytes
    /// completed so far. If the latch strobe itself fails nothing was
    /// latched and 0 is reported.
    fn transmit(&mut self, address: u8, data: &[u8]) -> usize {
        log::trace!("l3: {} byte(s) to device {:#04x}", data.len(), address);

        if self.open_frame().is_err() {
            log::error!("l3: failed to raise idle lines");
            return 0;
        }

        for (sent, &byte) in data.iter().enumerate() {
            if self.send_byte(byte).is_err() {
                log::error!("l3: pin fault in byte {} of {}", sent, data.len());
                // Best effort back to idle; the frame is already short.
                let _ = self.open_frame();
                return sent;
            }
        }

        if self.latch().is_err() {
            log::error!("l3: latch strobe failed");
            return 0;
        }
        data.len()
    }
}

fn drive<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), PinFault> {
    let res = if high { pin.set_high() } else { pin.set_low() };
    res.map_err(|_| PinFault)
}

// ── Tests ──────────────────────────────────────────────────────────────────
