//! Fractional-N PLL coefficient calculator.
//!
//! The WM8976 PLL multiplies its reference by `N.K`, where `N` is a 4-bit
//! integer and `K` a 24-bit fraction. An optional prescaler halves the
//! reference first. The chip is only specified for `5 < N < 13`.

use crate::error::{Error, Result};

/// Lowest integer ratio the PLL is specified for.
pub const N_MIN: u32 = 6;
/// Highest integer ratio the PLL is specified for.
pub const N_MAX: u32 = 12;

/// Fixed-point scale of the fractional part.
const K_SCALE: u64 = 1 << 24;

/// Prescale/integer/fraction triple for the PLLN and PLLK1–3 registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PllCoefficients {
    /// Reference divided by two before the PLL.
    pub prescale: bool,
    /// Integer part of the ratio.
    pub n: u8,
    /// Fractional part, scaled by 2^24.
    pub k: u32,
}

impl PllCoefficients {
    /// PLLN register value: `(prescale << 4) | n`.
    pub fn plln(&self) -> u16 {
        ((self.prescale as u16) << 4) | (self.n as u16 & 0x0f)
    }

    /// PLLK1, PLLK2 and PLLK3 register values (K bits 23:18, 17:9, 8:0).
    pub fn pllk(&self) -> [u16; 3] {
        [
            (self.k >> 18) as u16 & 0x3f,
            (self.k >> 9) as u16 & 0x1ff,
            self.k as u16 & 0x1ff,
        ]
    }
}

/// Compute the coefficients that bring `source` Hz up to `target` Hz.
///
/// Ratios outside the datasheet `N` range are logged and returned anyway,
/// with `n` cut to the four bits PLLN can hold.
pub fn pll_factors(target: u32, source: u32) -> Result<PllCoefficients> {
    if target == 0 || source == 0 {
        return Err(Error::InvalidFrequency {
            target,
            reference: source,
        });
    }

    let mut source = source;
    let mut prescale = false;
    let mut ndiv = target / source;
    if ndiv < N_MIN {
        if source < 2 {
            return Err(Error::InvalidFrequency {
                target,
                reference: source,
            });
        }
        source /= 2;
        prescale = true;
        ndiv = target / source;
    }

    let nmod = (target % source) as u64;
    // One extra decimal digit so the last step can round to nearest.
    let mut k = nmod * K_SCALE * 10 / source as u64;
    if k % 10 >= 5 {
        k += 5;
    }
    k /= 10;
    // Rounding up from just below 1.0 carries into N.
    if k >= K_SCALE {
        k -= K_SCALE;
        ndiv += 1;
    }

    if !(N_MIN..=N_MAX).contains(&ndiv) {
        log::warn!(
            "PLL N {} out of range for {} Hz from {} Hz",
            ndiv,
            target,
            source
        );
    }

    Ok(PllCoefficients {
        prescale,
        // PLLN holds four bits of N.
        n: (ndiv & 0x0f) as u8,
        k: k as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_defaults_match_12mhz_to_98_304mhz() {
        let c = pll_factors(98_304_000, 12_000_000).unwrap();
        assert_eq!(
            c,
            PllCoefficients {
                prescale: false,
                n: 8,
                k: 0x3126E9
            }
        );
        // Same words as the chip's reset values for PLLN and PLLK1-3.
        assert_eq!(c.plln(), 0x008);
        assert_eq!(c.pllk(), [0x00c, 0x093, 0x0e9]);
    }

    #[test]
    fn rate_44k1_family() {
        let c = pll_factors(90_316_800, 12_000_000).unwrap();
        assert!(!c.prescale);
        assert_eq!(c.n, 7);
        assert_eq!(c.k, 0x86C227);
    }

    #[test]
    fn low_ratio_engages_prescaler() {
        let c = pll_factors(98_304_000, 24_000_000).unwrap();
        assert!(c.prescale);
        assert_eq!(c.n, 8);
        assert_eq!(c.k, 0x3126E9);
        assert_eq!(c.plln(), 0x018);
    }

    #[test]
    fn eight_times_48k_from_12mhz_is_reproducible() {
        let a = pll_factors(48_000 * 8, 12_000_000).unwrap();
        let b = pll_factors(48_000 * 8, 12_000_000).unwrap();
        assert_eq!(a, b);
        // Far below the datasheet range, but still computed.
        assert!(a.prescale);
        assert_eq!(a.n, 0);
        assert_eq!(a.k, 1_073_742);
        assert!(a.k < 1 << 24);
    }

    #[test]
    fn k_rounds_to_nearest() {
        // 2_304_000 / 12 MHz * 2^24 = 3221225.472 -> truncated
        assert_eq!(pll_factors(98_304_000, 12_000_000).unwrap().k, 3_221_225);
        // 6_316_800 / 12 MHz * 2^24 = 8831527.4 -> truncated
        assert_eq!(pll_factors(90_316_800, 12_000_000).unwrap().k, 8_831_527);
        // 864_000 / 12 MHz * 2^24 = 1207959.552 -> rounded up
        assert_eq!(pll_factors(72_864_000, 12_000_000).unwrap().k, 1_207_960);
    }

    #[test]
    fn rounding_carries_into_n() {
        // 0.99999997 of the way to N = 7.
        let source = 40_000_000;
        let c = pll_factors(7 * source - 1, source).unwrap();
        assert_eq!((c.n, c.k), (7, 0));
    }

    #[test]
    fn carry_can_leave_datasheet_range() {
        let source = 40_000_000;
        let c = pll_factors(13 * source - 1, source).unwrap();
        assert_eq!((c.n, c.k), (13, 0));
        assert!(!(N_MIN..=N_MAX).contains(&(c.n as u32)));
    }

    #[test]
    fn huge_ratio_keeps_four_bits_of_n() {
        let c = pll_factors(u32::MAX, 1).unwrap();
        assert!(!c.prescale);
        assert_eq!((c.n, c.k), (0x0f, 0));
        assert_eq!(c.plln(), 0x00f);
    }

    #[test]
    fn exact_ratio_has_no_fraction() {
        let c = pll_factors(96_000_000, 12_000_000).unwrap();
        assert_eq!((c.prescale, c.n, c.k), (false, 8, 0));
    }

    #[test]
    fn zero_frequencies_rejected() {
        assert_eq!(
            pll_factors(0, 12_000_000),
            Err(Error::InvalidFrequency {
                target: 0,
                reference: 12_000_000
            })
        );
        assert_eq!(
            pll_factors(98_304_000, 0),
            Err(Error::InvalidFrequency {
                target: 98_304_000,
                reference: 0
            })
        );
    }
}
