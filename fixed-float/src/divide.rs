use crate::{DivideOperations, FixedFloat, FixedFloatU64};

// Exponents are carried as i64 inside the divider so operands anywhere in the
// i32 range can be normalised and subtracted without overflow.
struct Normalised {
    mantissa: u32,
    exponent: i64,
}

struct Quotient<M> {
    mantissa: M,
    exponent: i64,
}

fn normalise<T: DivideOperations>(value: FixedFloat) -> Normalised {
    let headroom = T::count_leading_zeros(value.mantissa);

    // A zero mantissa has 32 bits of headroom and stays zero.
    let mantissa = value.mantissa.checked_shl(headroom).unwrap_or(0);

    Normalised {
        mantissa,
        exponent: value.exponent as i64 - headroom as i64,
    }
}

fn divide_wide<T: DivideOperations>(dividend: FixedFloat, divisor: FixedFloat) -> Quotient<u32> {
    debug_assert!(!divisor.is_zero(), "FixedFloat division by zero");

    let dividend = normalise::<T>(dividend);
    let divisor = normalise::<T>(divisor);

    // Shift by 31 when the dividend mantissa is the larger one so the quotient
    // still fits in 32 bits. Equal mantissas take the 31 shift too, otherwise
    // the quotient would be exactly 2^32.
    let shift: u32 = if dividend.mantissa >= divisor.mantissa {
        31
    } else {
        32
    };

    let widened = (dividend.mantissa as u64) << shift;

    Quotient {
        mantissa: T::wide_divide(widened, divisor.mantissa),
        exponent: dividend.exponent - divisor.exponent - shift as i64,
    }
}

fn divide_u64_wide<T: DivideOperations>(
    dividend: FixedFloat,
    divisor: FixedFloat,
) -> Quotient<u64> {
    debug_assert!(!divisor.is_zero(), "FixedFloat division by zero");

    const SHIFT: u32 = 32;

    let dividend = normalise::<T>(dividend);
    let divisor = normalise::<T>(divisor);

    Quotient {
        mantissa: ((dividend.mantissa as u64) << SHIFT) / divisor.mantissa as u64,
        exponent: dividend.exponent - divisor.exponent - SHIFT as i64,
    }
}

/// Divides two [`FixedFloat`] values.
///
/// The divisor must be non-zero; callers check for unavailable rates before
/// dividing. A quotient exponent outside the `i32` range is clamped to it.
pub fn divide<T: DivideOperations>(dividend: FixedFloat, divisor: FixedFloat) -> FixedFloat {
    let quotient = divide_wide::<T>(dividend, divisor);

    FixedFloat {
        mantissa: quotient.mantissa,
        exponent: clamp_exponent(quotient.exponent),
    }
}

/// Divides two [`FixedFloat`] values and returns the quotient as an unsigned
/// fixed point integer with `output_q_format` fractional bits.
///
/// Quotients too small for the format round to 0, quotients too large for it
/// saturate to `u32::MAX`.
pub fn divide_to_fixed<T: DivideOperations>(
    dividend: FixedFloat,
    divisor: FixedFloat,
    output_q_format: u32,
) -> u32 {
    let result = divide_wide::<T>(dividend, divisor);
    let mantissa = result.mantissa;
    if mantissa == 0 {
        return 0;
    }

    let target_exponent = -(output_q_format as i64);

    if result.exponent < target_exponent {
        let rsh = shift_amount(target_exponent - result.exponent);
        shr(mantissa, rsh).wrapping_add(shr(mantissa, rsh - 1) & 0x1)
    } else {
        let lsh = shift_amount(result.exponent - target_exponent);
        if lsh > mantissa.leading_zeros() {
            u32::MAX
        } else {
            mantissa << lsh
        }
    }
}

/// Same algorithm as [`divide`] with a fixed 32-bit shift and a 64-bit
/// quotient, for ratios that need sub-ppm precision.
pub fn divide_u64<T: DivideOperations>(dividend: FixedFloat, divisor: FixedFloat) -> FixedFloatU64 {
    let quotient = divide_u64_wide::<T>(dividend, divisor);

    FixedFloatU64 {
        mantissa: quotient.mantissa,
        exponent: clamp_exponent(quotient.exponent),
    }
}

pub fn divide_u64_to_fixed<T: DivideOperations>(
    dividend: FixedFloat,
    divisor: FixedFloat,
    output_q_format: u32,
) -> u64 {
    let result = divide_u64_wide::<T>(dividend, divisor);
    let mantissa = result.mantissa;
    if mantissa == 0 {
        return 0;
    }

    let target_exponent = -(output_q_format as i64);

    if result.exponent < target_exponent {
        let rsh = shift_amount(target_exponent - result.exponent);
        shr_u64(mantissa, rsh).wrapping_add(shr_u64(mantissa, rsh - 1) & 0x1)
    } else {
        let lsh = shift_amount(result.exponent - target_exponent);
        if lsh > mantissa.leading_zeros() {
            u64::MAX
        } else {
            mantissa << lsh
        }
    }
}

/// `(dividend << q) / divisor`, truncated to 32 bits.
pub fn divide_unsigned_q<T: DivideOperations>(dividend: u32, divisor: u32, q: u32) -> u32 {
    debug_assert!(divisor != 0, "division by zero");
    debug_assert!(q <= 32);

    T::wide_divide((dividend as u64) << q, divisor)
}

#[inline]
fn clamp_exponent(exponent: i64) -> i32 {
    exponent.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

#[inline]
fn shift_amount(distance: i64) -> u32 {
    u32::try_from(distance).unwrap_or(u32::MAX)
}

#[inline]
fn shr(value: u32, amount: u32) -> u32 {
    value.checked_shr(amount).unwrap_or(0)
}

#[inline]
fn shr_u64(value: u64, amount: u32) -> u64 {
    value.checked_shr(amount).unwrap_or(0)
}
