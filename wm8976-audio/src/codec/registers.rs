//! WM8976 register map and power-on defaults.
//!
//! Register addresses are 7 bits on the wire (0x00–0x39); every register
//! holds 9 data bits. The chip's control port is write-only, so the power-on
//! values below seed the shadow cache instead of being read back.

/// Number of addressable registers, including reserved holes.
pub const REGISTER_COUNT: usize = 58;

/// A named WM8976 register.
///
/// The numeric address only matters at the wire boundary (see
/// [`ControlFrame`](super::cache::ControlFrame)); everything above it works
/// with these names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    /// Software reset. Any write resets the chip; nothing is stored.
    Reset = 0x00,
    /// Power management 1.
    /// - Bit 5 — PLLEN
    /// - Bit 4 — MICBEN
    /// - Bit 3 — BIASEN
    /// - Bit 2 — BUFIOEN
    /// - Bits 1:0 — VMIDSEL
    Power1 = 0x01,
    /// Power management 2 (ADC, input PGA, boost, headphone drivers).
    Power2 = 0x02,
    /// Power management 3 (DAC, mixers, speaker drivers).
    Power3 = 0x03,
    /// Audio interface.
    /// - Bit 8 — BCP (BCLK polarity)
    /// - Bit 7 — LRP (frame clock polarity)
    /// - Bits 6:5 — WL (0=16, 1=20, 2=24, 3=32 bit)
    /// - Bits 4:3 — FMT (0=right, 1=left, 2=I2S, 3=DSP)
    /// - Bit 2 — DACLRSWAP
    /// - Bit 1 — ADCLRSWAP
    /// - Bit 0 — MONO
    Iface = 0x04,
    /// Companding control.
    Comp = 0x05,
    /// Clock generation.
    /// - Bit 8 — CLKSEL (0=MCLK, 1=PLL)
    /// - Bits 7:5 — MCLKDIV
    /// - Bits 4:2 — BCLKDIV
    /// - Bit 0 — MS (1 = codec is clock master)
    Clock = 0x06,
    /// Additional control.
    /// - Bits 3:1 — SR (filter coefficients for the sample rate)
    /// - Bit 0 — SLOWCLKEN
    Add = 0x07,
    /// GPIO control.
    /// - Bits 5:4 — OPCLKDIV
    Gpio = 0x08,
    /// Jack detect control 1.
    Jack1 = 0x09,
    /// DAC control.
    /// - Bit 6 — SOFTMUTE
    /// - Bit 3 — DACOSR128
    Dac = 0x0A,
    /// Left DAC digital volume.
    DacVolL = 0x0B,
    /// Right DAC digital volume.
    DacVolR = 0x0C,
    /// Jack detect control 2.
    Jack2 = 0x0D,
    /// ADC control.
    /// - Bit 8 — HPFEN
    /// - Bit 3 — ADCOSR128
    Adc = 0x0E,
    /// ADC digital volume.
    AdcVol = 0x0F,
    /// Equaliser bands 1–5.
    Eq1 = 0x12,
    Eq2 = 0x13,
    Eq3 = 0x14,
    Eq4 = 0x15,
    Eq5 = 0x16,
    /// DAC limiter.
    DacLim1 = 0x18,
    DacLim2 = 0x19,
    /// Notch filter coefficients.
    Notch1 = 0x1B,
    Notch2 = 0x1C,
    Notch3 = 0x1D,
    Notch4 = 0x1E,
    /// Automatic level control.
    Alc1 = 0x20,
    Alc2 = 0x21,
    Alc3 = 0x22,
    /// Noise gate.
    NGate = 0x23,
    /// PLL N value.
    /// - Bit 4 — PLLPRESCALE (divide MCLK by 2)
    /// - Bits 3:0 — PLLN
    PllN = 0x24,
    /// PLL K value, bits 23:18.
    PllK1 = 0x25,
    /// PLL K value, bits 17:9.
    PllK2 = 0x26,
    /// PLL K value, bits 8:0.
    PllK3 = 0x27,
    /// 3D enhance.
    ThreeD = 0x29,
    /// Beep control.
    Beep = 0x2B,
    /// Input control.
    Input = 0x2C,
    /// Input PGA gain.
    InpPga = 0x2D,
    /// ADC boost.
    AdcBoost = 0x2F,
    /// Output control.
    Output = 0x31,
    /// Left mixer.
    MixL = 0x32,
    /// Right mixer.
    MixR = 0x33,
    /// LOUT1 (headphone) volume. Writes always carry the update bit.
    HpVolL = 0x34,
    /// ROUT1 (headphone) volume. Writes always carry the update bit.
    HpVolR = 0x35,
    /// LOUT2 (speaker) volume.
    SpkVolL = 0x36,
    /// ROUT2 (speaker) volume.
    SpkVolR = 0x37,
    /// OUT3 mixer.
    Out3Mix = 0x38,
    /// OUT4 (mono) mixer.
    MonoMix = 0x39,
}

impl Register {
    /// Every named register in address order.
    pub const ALL: [Register; 49] = [
        Register::Reset,
        Register::Power1,
        Register::Power2,
        Register::Power3,
        Register::Iface,
        Register::Comp,
        Register::Clock,
        Register::Add,
        Register::Gpio,
        Register::Jack1,
        Register::Dac,
        Register::DacVolL,
        Register::DacVolR,
        Register::Jack2,
        Register::Adc,
        Register::AdcVol,
        Register::Eq1,
        Register::Eq2,
        Register::Eq3,
        Register::Eq4,
        Register::Eq5,
        Register::DacLim1,
        Register::DacLim2,
        Register::Notch1,
        Register::Notch2,
        Register::Notch3,
        Register::Notch4,
        Register::Alc1,
        Register::Alc2,
        Register::Alc3,
        Register::NGate,
        Register::PllN,
        Register::PllK1,
        Register::PllK2,
        Register::PllK3,
        Register::ThreeD,
        Register::Beep,
        Register::Input,
        Register::InpPga,
        Register::AdcBoost,
        Register::Output,
        Register::MixL,
        Register::MixR,
        Register::HpVolL,
        Register::HpVolR,
        Register::SpkVolL,
        Register::SpkVolR,
        Register::Out3Mix,
        Register::MonoMix,
    ];

    /// Wire address.
    pub const fn address(self) -> u8 {
        self as u8
    }

    /// Registers whose frames must always carry the volume-update bit.
    ///
    /// Without it the new headphone level is held back until the other
    /// channel is written, which breaks zero-cross updates.
    pub const fn forces_update_bit(self) -> bool {
        matches!(self, Register::HpVolL | Register::HpVolR)
    }

    /// Look up a register by wire address.
    pub fn from_address(address: u8) -> Option<Register> {
        Register::ALL.iter().copied().find(|r| r.address() == address)
    }
}

/// Power-on register values, indexed by address.
pub const DEFAULTS: [u16; REGISTER_COUNT] = [
    0x0000, 0x0000, 0x0000, 0x0000, // RESET, POWER1-3
    0x0050, 0x0000, 0x0000, 0x0000, // IFACE, COMP, CLOCK, ADD
    0x0000, 0x0000, 0x0000, 0x00ff, // GPIO, JACK1, DAC, DACVOLL
    0x00ff, 0x0000, 0x0100, 0x00ff, // DACVOLR, JACK2, ADC, ADCVOL
    0x00ff, 0x0000, 0x012c, 0x002c, // -, -, EQ1, EQ2
    0x002c, 0x002c, 0x002c, 0x0000, // EQ3-5, -
    0x0032, 0x0000, 0x0000, 0x0000, // DACLIM1-2, -, NOTCH1
    0x0000, 0x0000, 0x0000, 0x0000, // NOTCH2-4, -
    0x0038, 0x000b, 0x0032, 0x0000, // ALC1-3, NGATE
    0x0008, 0x000c, 0x0093, 0x00e9, // PLLN, PLLK1-3
    0x0000, 0x0000, 0x0000, 0x0000, // -, 3D, -, BEEP
    0x0033, 0x0010, 0x0010, 0x0100, // INPUT, INPPGA, -, ADCBOOST
    0x0100, 0x0002, 0x0001, 0x0001, // -, OUTPUT, MIXL, MIXR
    0x0039, 0x0039, 0x0039, 0x0039, // HPVOLL/R, SPKVOLL/R
    0x0001, 0x0001, // OUT3MIX, MONOMIX
];
