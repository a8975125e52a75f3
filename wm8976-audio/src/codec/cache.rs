//! Write-through register shadow cache.
//!
//! The WM8976 control port cannot be read, so the driver keeps a mirror of
//! every register. The mirror is only ever updated after the control link
//! reports that the whole frame went out; on a short transfer the cache keeps
//! its last known-good value and the caller gets [`Error::LinkError`].

use super::registers::{Register, DEFAULTS, REGISTER_COUNT};
use crate::error::{Error, Result};
use crate::l3::ControlLink;

/// Bus address handed to the control link. The WM8976 three-wire port has
/// a single device.
pub const DEVICE_ADDRESS: u8 = 0x00;

// ── Wire frame ─────────────────────────────────────────────────────────────

/// The two bytes sent for one register write.
///
/// - byte 0 — bits 7:1 register address, bit 0 value bit 8
/// - byte 1 — value bits 7:0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlFrame([u8; 2]);

impl ControlFrame {
    /// Encode a write to a named register.
    pub fn new(register: Register, value: u16) -> Self {
        let mut frame = Self::from_address(register.address(), value);
        if register.forces_update_bit() {
            frame.0[0] |= 1;
        }
        frame
    }

    /// Encode a write to a raw address.
    ///
    /// Headphone volume addresses still get the forced update bit.
    pub fn from_address(address: u8, value: u16) -> Self {
        let mut byte0 = (address << 1) | ((value >> 8) & 1) as u8;
        if Register::from_address(address).is_some_and(Register::forces_update_bit) {
            byte0 |= 1;
        }
        Self([byte0, value as u8])
    }

    /// Bytes in transmission order.
    pub fn bytes(&self) -> [u8; 2] {
        self.0
    }

    /// Register address carried by the frame.
    pub fn address(&self) -> u8 {
        self.0[0] >> 1
    }
}

// ── Register file ──────────────────────────────────────────────────────────

/// In-memory copy of every codec register, seeded with power-on defaults.
///
/// Each entry changes only through its own write, with one exception: a
/// write to RESET returns every entry to its default, as the chip does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFile {
    values: [u16; REGISTER_COUNT],
}

impl RegisterFile {
    /// Register file holding the power-on defaults.
    pub const fn new() -> Self {
        Self { values: DEFAULTS }
    }

    /// Cached value of a named register. The reset register reads 0.
    pub fn get(&self, register: Register) -> u16 {
        match register {
            Register::Reset => 0,
            r => self.values[r.address() as usize],
        }
    }

    /// Cached value at a raw address.
    pub fn read(&self, address: u8) -> Result<u16> {
        if address == Register::Reset.address() {
            return Ok(0);
        }
        self.values
            .get(address as usize)
            .copied()
            .ok_or(Error::OutOfRange(address))
    }

    fn commit(&mut self, address: u8, value: u16) {
        // Any write to reset puts the chip back to power-on values.
        if address == Register::Reset.address() {
            self.values = DEFAULTS;
        } else {
            self.values[address as usize] = value;
        }
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

// ── Cache + link ───────────────────────────────────────────────────────────

/// A register file bound to the link that writes it through.
///
/// Owning the link by value keeps transmits single-writer: every write goes
/// through `&mut self`.
pub struct RegisterCache<L> {
    link: L,
    file: RegisterFile,
}

impl<L: ControlLink> RegisterCache<L> {
    /// New cache holding power-on defaults.
    pub fn new(link: L) -> Self {
        Self {
            link,
            file: RegisterFile::new(),
        }
    }

    /// Cached value at a raw address.
    pub fn read(&self, address: u8) -> Result<u16> {
        self.file.read(address)
    }

    /// Cached value of a named register.
    pub fn get(&self, register: Register) -> u16 {
        self.file.get(register)
    }

    /// Snapshot of the whole register file.
    pub fn file(&self) -> &RegisterFile {
        &self.file
    }

    /// Send `value` to a named register and commit it on full delivery.
    pub fn write_through(&mut self, register: Register, value: u16) -> Result<()> {
        let frame = ControlFrame::new(register, value);
        self.send(frame)?;
        self.file.commit(register.address(), value);
        Ok(())
    }

    /// Send `value` to a raw address and commit it on full delivery.
    pub fn write_address(&mut self, address: u8, value: u16) -> Result<()> {
        if address as usize >= REGISTER_COUNT {
            return Err(Error::OutOfRange(address));
        }
        self.send(ControlFrame::from_address(address, value))?;
        self.file.commit(address, value);
        Ok(())
    }

    /// Read-modify-write: `new = (cached & keep) | set`.
    pub fn update(&mut self, register: Register, keep: u16, set: u16) -> Result<u16> {
        let value = (self.get(register) & keep) | set;
        self.write_through(register, value)?;
        Ok(value)
    }

    /// Push every cached register (except reset) back to the chip, e.g. after
    /// the codec lost power.
    pub fn sync(&mut self) -> Result<()> {
        for register in Register::ALL {
            if register == Register::Reset {
                continue;
            }
            self.write_through(register, self.get(register))?;
        }
        Ok(())
    }

    /// Consume the cache and return the link.
    pub fn release(self) -> L {
        self.link
    }

    fn send(&mut self, frame: ControlFrame) -> Result<()> {
        let bytes = frame.bytes();
        log::trace!(
            "reg {:#04x} <- {:#05x}",
            frame.address(),
            ((bytes[0] as u16 & 1) << 8) | bytes[1] as u16
        );
        let sent = self.link.transmit(DEVICE_ADDRESS, &bytes);
        if sent != bytes.len() {
            log::error!(
                "write to reg {:#04x} failed: {} of {} bytes",
                frame.address(),
                sent,
                bytes.len()
            );
            return Err(Error::LinkError {
                sent,
                expected: bytes.len(),
            });
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
