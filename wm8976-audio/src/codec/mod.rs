//! WM8976 codec control.
//!
//! Register map, write-through shadow cache, PLL coefficient calculator and
//! the codec driver built on them.
//!
//! # Feature gate
//!
//! This module is available when the `codec` feature is enabled (on by default).

pub mod cache;
pub mod pll;
pub mod registers;
mod wm8976;

pub use cache::{ControlFrame, RegisterCache, RegisterFile};
pub use pll::{pll_factors, PllCoefficients};
pub use registers::Register;
pub use wm8976::Wm8976;
