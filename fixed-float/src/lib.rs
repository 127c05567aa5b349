#![cfg_attr(not(test), no_std)]

mod divide;
mod operations;

pub use divide::{divide, divide_to_fixed, divide_u64, divide_u64_to_fixed, divide_unsigned_q};
pub use operations::{DivideOperations, PortableDivide};

/// Software floating point value, `mantissa * 2^exponent`.
///
/// The mantissa is not kept normalised; normalisation happens inside the
/// divider. A zero mantissa means the value is not available yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FixedFloat {
    pub mantissa: u32,
    pub exponent: i32,
}

impl FixedFloat {
    pub const ZERO: Self = Self {
        mantissa: 0,
        exponent: 0,
    };

    pub const fn new(mantissa: u32, exponent: i32) -> Self {
        Self { mantissa, exponent }
    }

    pub const fn from_int(value: u32) -> Self {
        Self::new(value, 0)
    }

    pub const fn is_zero(&self) -> bool {
        self.mantissa == 0
    }
}

/// Wide sibling of [`FixedFloat`], produced by [`divide_u64`] when a ratio
/// needs more precision than a 32-bit mantissa carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FixedFloatU64 {
    pub mantissa: u64,
    pub exponent: i32,
}

impl FixedFloatU64 {
    pub const ZERO: Self = Self {
        mantissa: 0,
        exponent: 0,
    };

    pub const fn new(mantissa: u64, exponent: i32) -> Self {
        Self { mantissa, exponent }
    }

    pub const fn is_zero(&self) -> bool {
        self.mantissa == 0
    }
}
