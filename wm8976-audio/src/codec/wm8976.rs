//! WM8976 audio codec driver.
//!
//! Programs the Wolfson WM8976 mono codec / stereo DAC over its write-only
//! three-wire control port. Every register access goes through a
//! [`RegisterCache`], so read-modify-write sequences operate on the shadow
//! copy and only the final value is transmitted.
//!
//! The driver is generic over any [`ControlLink`]; on the S3C2440 board this
//! is an [`L3Bus`](crate::l3::L3Bus) on three GPIO lines.
//!
//! # Example
//!
//! ```ignore
//! let mut codec = Wm8976::new(L3Bus::new(clk, dat, mode, delay));
//! codec.probe()?;                      // reset, power up, jack detect
//! codec.set_dai_fmt(DaiFormat::default())?;
//! codec.hw_params(SampleFormat::S16Le, SampleRate::Hz44100)?;
//! codec.digital_mute(false)?;
//! ```

use super::cache::RegisterCache;
use super::pll::pll_factors;
use super::registers::Register;
use crate::control::{
    BiasLevel, ClockDivider, ClockInversion, Clocking, CodecControl, DaiFormat, InterfaceFormat,
    SampleFormat, SampleRate,
};
use crate::error::Result;
use crate::l3::ControlLink;

// ── Register field values ──────────────────────────────────────────────────

const POWER1_ON: u16 = 0x0DF;
const POWER2_ON: u16 = 0x185;
const POWER3_ON: u16 = 0x0FF;
const POWER1_PLLEN: u16 = 0x020;

const JACK1_ENABLE_GPIO2: u16 = 0x050;
const JACK2_OUTPUTS: u16 = 0x021;
const ADD_SLOWCLKEN: u16 = 0x001;

const DAC_SOFTMUTE: u16 = 0x040;

const CLOCK_MS: u16 = 0x001;

/// PLL output runs at eight times the requested system clock.
const PLL_OUTPUT_RATIO: u32 = 8;

// ── Driver struct ──────────────────────────────────────────────────────────

/// WM8976 audio codec driver.
pub struct Wm8976<L> {
    regs: RegisterCache<L>,
    bias: BiasLevel,
}

impl<L: ControlLink> Wm8976<L> {
    /// Wrap a control link. Nothing is transmitted until [`probe`](Self::probe).
    pub fn new(link: L) -> Self {
        Self {
            regs: RegisterCache::new(link),
            bias: BiasLevel::Off,
        }
    }

    /// Release the control link.
    pub fn release(self) -> L {
        self.regs.release()
    }

    // ── Register access ────────────────────────────────────────────────

    /// Cached value of a register.
    pub fn register(&self, register: Register) -> u16 {
        self.regs.get(register)
    }

    /// Cached value at a raw address.
    pub fn read(&self, address: u8) -> Result<u16> {
        self.regs.read(address)
    }

    /// Write a register through the cache.
    pub fn write(&mut self, register: Register, value: u16) -> Result<()> {
        self.regs.write_through(register, value)
    }

    /// Write a raw register address through the cache.
    pub fn write_address(&mut self, address: u8, value: u16) -> Result<()> {
        self.regs.write_address(address, value)
    }

    // ── Lifecycle ──────────────────────────────────────────────────────

    /// Bring the codec up: software reset, full power, jack detection.
    pub fn probe(&mut self) -> Result<()> {
        self.reset()?;
        self.set_bias_level(BiasLevel::On)?;
        self.set_jack_detect(true)?;
        log::debug!("wm8976 probed");
        Ok(())
    }

    /// Software reset. The cache returns to power-on defaults.
    pub fn reset(&mut self) -> Result<()> {
        self.regs.write_through(Register::Reset, 0)?;
        self.bias = BiasLevel::Off;
        Ok(())
    }

    /// Power everything down ahead of a system sleep.
    pub fn suspend(&mut self) -> Result<()> {
        self.set_bias_level(BiasLevel::Off)
    }

    /// Restore the chip from the cache after it lost power, then power up.
    pub fn resume(&mut self) -> Result<()> {
        self.regs.sync()?;
        self.set_bias_level(BiasLevel::Standby)?;
        self.set_bias_level(BiasLevel::On)
    }

    // ── Power ──────────────────────────────────────────────────────────

    /// Current analog power state.
    pub fn bias_level(&self) -> BiasLevel {
        self.bias
    }

    /// Switch analog power. `Standby` and `Prepare` leave the registers alone.
    pub fn set_bias_level(&mut self, level: BiasLevel) -> Result<()> {
        match level {
            BiasLevel::On => {
                self.regs.write_through(Register::Power1, POWER1_ON)?;
                self.regs.write_through(Register::Power2, POWER2_ON)?;
                self.regs.write_through(Register::Power3, POWER3_ON)?;
            }
            BiasLevel::Standby | BiasLevel::Prepare => {}
            BiasLevel::Off => {
                self.regs.write_through(Register::Power1, 0)?;
                self.regs.write_through(Register::Power2, 0)?;
                self.regs.write_through(Register::Power3, 0)?;
            }
        }
        self.bias = level;
        Ok(())
    }

    /// Enable or disable headphone jack detection on GPIO2.
    pub fn set_jack_detect(&mut self, enable: bool) -> Result<()> {
        if enable {
            self.regs.write_through(Register::Jack1, JACK1_ENABLE_GPIO2)?;
            self.regs.write_through(Register::Jack2, JACK2_OUTPUTS)?;
            // Slow clock drives the debounce circuit.
            self.regs.write_through(Register::Add, ADD_SLOWCLKEN)?;
        } else {
            self.regs.update(Register::Jack1, !JACK1_ENABLE_GPIO2, 0)?;
            self.regs.update(Register::Jack2, !JACK2_OUTPUTS, 0)?;
            self.regs.update(Register::Add, !ADD_SLOWCLKEN, 0)?;
        }
        Ok(())
    }

    // ── Digital audio interface ────────────────────────────────────────

    /// Program master/slave, framing and clock polarity.
    pub fn set_dai_fmt(&mut self, fmt: DaiFormat) -> Result<()> {
        let mut iface = self.regs.get(Register::Iface) & 0x003;
        let mut clock = self.regs.get(Register::Clock) & !CLOCK_MS;

        if fmt.clocking == Clocking::Master {
            clock |= CLOCK_MS;
        }

        iface |= match fmt.format {
            InterfaceFormat::I2s => 0x010,
            InterfaceFormat::RightJustified => 0x000,
            InterfaceFormat::LeftJustified => 0x008,
            InterfaceFormat::DspA => 0x018,
        };

        iface |= match fmt.inversion {
            ClockInversion::NormalBitNormalFrame => 0x000,
            ClockInversion::InvertedBitInvertedFrame => 0x180,
            ClockInversion::InvertedBitNormalFrame => 0x100,
            ClockInversion::NormalBitInvertedFrame => 0x080,
        };

        self.regs.write_through(Register::Iface, iface)?;
        self.regs.write_through(Register::Clock, clock)
    }

    /// Program word length and the sample-rate filter coefficients.
    pub fn hw_params(&mut self, format: SampleFormat, rate: SampleRate) -> Result<()> {
        let word_length = match format {
            SampleFormat::S16Le => 0x000,
            SampleFormat::S20_3Le => 0x020,
            SampleFormat::S24_3Le | SampleFormat::S24Le => 0x040,
        };
        let rate_code: u16 = match rate {
            SampleRate::Hz8000 => 5,
            SampleRate::Hz11025 => 4,
            SampleRate::Hz16000 => 3,
            SampleRate::Hz22050 => 2,
            SampleRate::Hz32000 => 1,
            SampleRate::Hz44100 | SampleRate::Hz48000 => 0,
        };

        let iface = (self.regs.get(Register::Iface) & 0xff9f) | word_length;
        let add = (self.regs.get(Register::Add) & 0x1f1) | (rate_code << 1);
        self.regs.write_through(Register::Iface, iface)?;
        self.regs.write_through(Register::Add, add)
    }

    /// Set a clock divider. `value` is already shifted into its field.
    pub fn set_clkdiv(&mut self, divider: ClockDivider, value: u16) -> Result<()> {
        let (register, keep) = match divider {
            ClockDivider::Mclk => (Register::Clock, 0x11f),
            ClockDivider::Bclk => (Register::Clock, 0x1e3),
            ClockDivider::Opclk => (Register::Gpio, 0x1cf),
            ClockDivider::DacOsr => (Register::Dac, 0x1f7),
            ClockDivider::AdcOsr => (Register::Adc, 0x1f7),
            ClockDivider::MclkSelect => (Register::Clock, 0x0ff),
        };
        self.regs.update(register, keep, value & !keep)?;
        Ok(())
    }

    /// Lock the PLL so it produces `freq_out` from an MCLK of `freq_in`.
    ///
    /// Either frequency being 0 powers the PLL down instead.
    pub fn set_pll(&mut self, freq_in: u32, freq_out: u32) -> Result<()> {
        if freq_in == 0 || freq_out == 0 {
            self.regs.update(Register::Power1, !POWER1_PLLEN & 0x1ff, 0)?;
            log::debug!("pll disabled");
            return Ok(());
        }

        let pll = pll_factors(freq_out.saturating_mul(PLL_OUTPUT_RATIO), freq_in)?;
        let [k1, k2, k3] = pll.pllk();
        self.regs.write_through(Register::PllN, pll.plln())?;
        self.regs.write_through(Register::PllK1, k1)?;
        self.regs.write_through(Register::PllK2, k2)?;
        self.regs.write_through(Register::PllK3, k3)?;
        self.regs.update(Register::Power1, 0x1ff, POWER1_PLLEN)?;
        log::debug!("pll {} Hz -> {} Hz: {:?}", freq_in, freq_out, pll);
        Ok(())
    }

    /// Soft-mute or unmute the DAC.
    pub fn digital_mute(&mut self, mute: bool) -> Result<()> {
        let set = if mute { DAC_SOFTMUTE } else { 0 };
        self.regs.update(Register::Dac, !DAC_SOFTMUTE, set)?;
        Ok(())
    }
}

// ── Trait implementation ───────────────────────────────────────────────────

impl<L: ControlLink> CodecControl for Wm8976<L> {
    type Error = crate::error::Error;

    fn set_format(&mut self, format: DaiFormat) -> Result<()> {
        self.set_dai_fmt(format)
    }

    fn hw_params(&mut self, format: SampleFormat, rate: SampleRate) -> Result<()> {
        Wm8976::hw_params(self, format, rate)
    }

    fn set_clkdiv(&mut self, divider: ClockDivider, value: u16) -> Result<()> {
        Wm8976::set_clkdiv(self, divider, value)
    }

    fn set_pll(&mut self, freq_in: u32, freq_out: u32) -> Result<()> {
        Wm8976::set_pll(self, freq_in, freq_out)
    }

    fn mute(&mut self, mute: bool) -> Result<()> {
        self.digital_mute(mute)
    }

    fn set_bias_level(&mut self, level: BiasLevel) -> Result<()> {
        Wm8976::set_bias_level(self, level)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::cache::tests::MockLink;
    use crate::error::Error;

    fn make_codec() -> Wm8976<MockLink> {
        Wm8976::new(MockLink::default())
    }

    /// Probed codec with the probe traffic discarded.
    fn probed() -> Wm8976<MockLink> {
        let mut codec = make_codec();
        codec.probe().unwrap();
        codec.regs.clear_frames();
        codec
    }

    impl<L> Wm8976<L> {
        fn link(&self) -> &L {
            self.regs.link()
        }
    }

    // ── Probe / power ─────────────────────────────────────────────────

    #[test]
    fn probe_sequence() {
        let mut codec = make_codec();
        codec.probe().unwrap();

        let writes = codec.link().writes();
        assert_eq!(
            writes,
            [
                (0x00, 0x000),
                (0x01, 0x0DF),
                (0x02, 0x185),
                (0x03, 0x0FF),
                (0x09, 0x050),
                (0x0D, 0x021),
                (0x07, 0x001),
            ]
        );
        assert_eq!(codec.bias_level(), BiasLevel::On);
    }

    #[test]
    fn bias_off_clears_power_registers() {
        let mut codec = probed();
        codec.set_bias_level(BiasLevel::Off).unwrap();
        assert_eq!(codec.register(Register::Power1), 0);
        assert_eq!(codec.register(Register::Power2), 0);
        assert_eq!(codec.register(Register::Power3), 0);
        assert_eq!(codec.bias_level(), BiasLevel::Off);
    }

    #[test]
    fn standby_and_prepare_write_nothing() {
        let mut codec = probed();
        codec.set_bias_level(BiasLevel::Standby).unwrap();
        codec.set_bias_level(BiasLevel::Prepare).unwrap();
        assert!(codec.link().frames.is_empty());
        assert_eq!(codec.bias_level(), BiasLevel::Prepare);
    }

    #[test]
    fn jack_detect_off_clears_only_its_bits() {
        let mut codec = probed();
        codec.hw_params(SampleFormat::S16Le, SampleRate::Hz16000).unwrap();
        codec.set_jack_detect(false).unwrap();

        assert_eq!(codec.register(Register::Jack1), 0);
        assert_eq!(codec.register(Register::Jack2), 0);
        // Rate code survives, slow clock bit gone.
        assert_eq!(codec.register(Register::Add), 3 << 1);
    }

    #[test]
    fn suspend_then_resume_restores_registers() {
        let mut codec = probed();
        codec.set_dai_fmt(DaiFormat::default()).unwrap();
        codec.suspend().unwrap();
        assert_eq!(codec.register(Register::Power2), 0);
        codec.regs.clear_frames();

        codec.resume().unwrap();
        let writes = codec.link().writes();
        // Full sync (no reset), then bias On.
        assert_eq!(writes.len(), Register::ALL.len() - 1 + 3);
        assert!(writes.iter().all(|(a, _)| *a != 0));
        assert!(writes.contains(&(Register::Iface.address(), 0x010)));
        assert_eq!(codec.register(Register::Power2), 0x185);
        assert_eq!(codec.bias_level(), BiasLevel::On);
    }

    // ── Interface format ──────────────────────────────────────────────

    #[test]
    fn dai_fmt_i2s_slave() {
        let mut codec = probed();
        codec.set_dai_fmt(DaiFormat::default()).unwrap();
        assert_eq!(codec.register(Register::Iface), 0x010);
        assert_eq!(codec.register(Register::Clock) & 1, 0);
    }

    #[test]
    fn dai_fmt_master_dsp_inverted() {
        let mut codec = probed();
        codec
            .set_dai_fmt(DaiFormat {
                clocking: Clocking::Master,
                format: InterfaceFormat::DspA,
                inversion: ClockInversion::InvertedBitInvertedFrame,
            })
            .unwrap();
        assert_eq!(codec.register(Register::Iface), 0x198);
        assert_eq!(codec.register(Register::Clock) & 1, 1);
    }

    #[test]
    fn dai_fmt_keeps_channel_swap_bits() {
        let mut codec = probed();
        codec.write(Register::Iface, 0x1FF).unwrap();
        codec
            .set_dai_fmt(DaiFormat {
                format: InterfaceFormat::LeftJustified,
                inversion: ClockInversion::NormalBitInvertedFrame,
                ..DaiFormat::default()
            })
            .unwrap();
        assert_eq!(codec.register(Register::Iface), 0x003 | 0x008 | 0x080);
    }

    #[test]
    fn hw_params_word_length_and_rate() {
        let mut codec = probed();
        codec.set_dai_fmt(DaiFormat::default()).unwrap();

        codec.hw_params(SampleFormat::S24Le, SampleRate::Hz8000).unwrap();
        assert_eq!(codec.register(Register::Iface), 0x050);
        assert_eq!(codec.register(Register::Add), 0x001 | (5 << 1));

        codec.hw_params(SampleFormat::S20_3Le, SampleRate::Hz22050).unwrap();
        assert_eq!(codec.register(Register::Iface), 0x030);
        assert_eq!(codec.register(Register::Add), 0x001 | (2 << 1));

        codec.hw_params(SampleFormat::S16Le, SampleRate::Hz48000).unwrap();
        assert_eq!(codec.register(Register::Iface), 0x010);
        assert_eq!(codec.register(Register::Add), 0x001);
    }

    // ── Clocks ────────────────────────────────────────────────────────

    #[test]
    fn clkdiv_replaces_field_only() {
        let mut codec = probed();
        codec.write(Register::Clock, 0x1FF).unwrap();
        codec.set_clkdiv(ClockDivider::Mclk, 0x040).unwrap();
        assert_eq!(codec.register(Register::Clock), 0x11f | 0x040);

        codec.set_clkdiv(ClockDivider::Bclk, 0x008).unwrap();
        assert_eq!(codec.register(Register::Clock), (0x15f & 0x1e3) | 0x008);

        codec.set_clkdiv(ClockDivider::MclkSelect, 0x100).unwrap();
        assert_eq!(codec.register(Register::Clock) & 0x100, 0x100);

        codec.set_clkdiv(ClockDivider::DacOsr, 0x008).unwrap();
        assert_eq!(codec.register(Register::Dac) & 0x008, 0x008);

        // Bits outside the field are ignored.
        codec.set_clkdiv(ClockDivider::Opclk, 0x1FF).unwrap();
        assert_eq!(codec.register(Register::Gpio), 0x030);
    }

    #[test]
    fn pll_programs_three_k_registers() {
        let mut codec = probed();
        codec.set_pll(12_000_000, 12_288_000).unwrap();

        assert_eq!(codec.register(Register::PllN), 0x008);
        assert_eq!(codec.register(Register::PllK1), 0x00c);
        assert_eq!(codec.register(Register::PllK2), 0x093);
        assert_eq!(codec.register(Register::PllK3), 0x0e9);
        assert_eq!(codec.register(Register::Power1), 0x0DF | 0x020);

        let order: Vec<u8> = codec.link().writes().iter().map(|w| w.0).collect();
        assert_eq!(order, [0x24, 0x25, 0x26, 0x27, 0x01]);
    }

    #[test]
    fn pll_zero_frequency_disables() {
        let mut codec = probed();
        codec.set_pll(12_000_000, 11_289_600).unwrap();
        codec.set_pll(0, 11_289_600).unwrap();
        assert_eq!(codec.register(Register::Power1) & 0x020, 0);
        assert_eq!(codec.register(Register::Power1), 0x0DF);
    }

    // ── Mute / errors ─────────────────────────────────────────────────

    #[test]
    fn digital_mute_toggles_softmute() {
        let mut codec = probed();
        codec.digital_mute(true).unwrap();
        assert_eq!(codec.register(Register::Dac), 0x040);
        codec.digital_mute(false).unwrap();
        assert_eq!(codec.register(Register::Dac), 0x000);
    }

    #[test]
    fn link_failure_propagates() {
        let mut codec = Wm8976::new(MockLink {
            accept: Some(1),
            ..MockLink::default()
        });
        assert_eq!(
            codec.probe(),
            Err(Error::LinkError { sent: 1, expected: 2 })
        );
        assert_eq!(codec.bias_level(), BiasLevel::Off);
    }

    #[test]
    fn usable_through_trait() {
        fn configure<C: CodecControl>(c: &mut C) -> core::result::Result<(), C::Error> {
            c.set_format(DaiFormat::default())?;
            c.hw_params(SampleFormat::S16Le, SampleRate::Hz44100)?;
            c.mute(false)
        }
        let mut codec = probed();
        configure(&mut codec).unwrap();
        assert_eq!(codec.register(Register::Iface), 0x010);
    }
}
