//! S3C2440 DMA channel programming for one playback period.
//!
//! ## Control word (DCON)
//!
//! ```text
//!  31   30   29   28   27   26:24  23    22     21:20  19:0
//! DMD  SYNC  INT  TSZ  SERV  HWSRC SWHW  RELOAD  DSZ    TC
//!  1    0     1    0    0     000   1     1      01    period/2
//! ```
//!
//! Handshake mode, interrupt on terminal count, single-unit single-service
//! transfers, hardware request from the I2S TX FIFO, no auto-reload and
//! half-word data size. The terminal count is therefore in half-words.

/// Physical address of the I2S transmit FIFO.
pub const IIS_FIFO_ADDR: u32 = 0x5500_0010;

const DCON_HANDSHAKE: u32 = 1 << 31;
const DCON_INT_ENABLE: u32 = 1 << 29;
const DCON_HW_REQUEST: u32 = 1 << 23;
const DCON_NO_RELOAD: u32 = 1 << 22;
const DCON_HALF_WORD: u32 = 1 << 20;

/// Largest terminal count the 20-bit TC field holds.
pub const MAX_TRANSFER_COUNT: u32 = (1 << 20) - 1;

/// Bus an endpoint sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bus {
    /// System bus (SDRAM).
    Ahb,
    /// Peripheral bus (I2S FIFO).
    Apb,
}

/// Address behaviour after each transfer unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    Increment,
    Fixed,
}

/// One side of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub address: u32,
    pub bus: Bus,
    pub mode: AddressMode,
}

impl Endpoint {
    /// Value for DISRCC / DIDSTC.
    ///
    /// Bit 2 of DIDSTC (interrupt on reload) stays clear, so the interrupt
    /// fires when the terminal count reaches 0.
    pub const fn control(&self) -> u32 {
        let bus = match self.bus {
            Bus::Ahb => 0,
            Bus::Apb => 1,
        };
        let mode = match self.mode {
            AddressMode::Increment => 0,
            AddressMode::Fixed => 1,
        };
        (bus << 1) | mode
    }
}

/// Everything loaded into the channel for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub source: Endpoint,
    pub destination: Endpoint,
    pub control: u32,
}

impl Descriptor {
    /// Descriptor moving `period_bytes` from `base + offset` to the I2S FIFO.
    pub const fn period(base: u32, offset: usize, period_bytes: usize) -> Self {
        Self {
            source: Endpoint {
                address: base.wrapping_add(offset as u32),
                bus: Bus::Ahb,
                mode: AddressMode::Increment,
            },
            destination: Endpoint {
                address: IIS_FIFO_ADDR,
                bus: Bus::Apb,
                mode: AddressMode::Fixed,
            },
            control: DCON_HANDSHAKE
                | DCON_INT_ENABLE
                | DCON_HW_REQUEST
                | DCON_NO_RELOAD
                | DCON_HALF_WORD
                | ((period_bytes as u32 / 2) & MAX_TRANSFER_COUNT),
        }
    }

    /// Half-word transfers in this period.
    pub const fn transfer_count(&self) -> u32 {
        self.control & MAX_TRANSFER_COUNT
    }

    /// Program source, destination and control into `channel`.
    pub fn load<C: DmaChannel + ?Sized>(&self, channel: &mut C) {
        channel.set_source(self.source.address, self.source.control());
        channel.set_destination(self.destination.address, self.destination.control());
        channel.set_control(self.control);
    }
}

/// Register-level access to one DMA channel.
///
/// Implemented by the board support layer over the DISRC/DISRCC/DIDST/
/// DIDSTC/DCON/DSTAT/DMASKTRIG block of the channel wired to the I2S
/// transmit request.
pub trait DmaChannel {
    /// Write DISRC and DISRCC.
    fn set_source(&mut self, address: u32, control: u32);
    /// Write DIDST and DIDSTC.
    fn set_destination(&mut self, address: u32, control: u32);
    /// Write DCON.
    fn set_control(&mut self, control: u32);
    /// Set the channel-on bit in DMASKTRIG.
    fn start(&mut self);
    /// Clear the channel-on bit in DMASKTRIG.
    fn stop(&mut self);
    /// Remaining terminal count from DSTAT.
    fn remaining(&self) -> u32;
}
