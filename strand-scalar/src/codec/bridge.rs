//! Numeric bridges between the numeric and date representations.

use bigdecimal::BigDecimal;
use jiff::Timestamp;
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use strand_error::{StrandResult, strand_bail, strand_err};

const MAX_I64_DIGITS: i64 = 19;

/// The exact value of a finite double as a decimal, expanded from its binary representation.
pub fn f64_to_decimal(value: f64) -> StrandResult<BigDecimal> {
    if !value.is_finite() {
        strand_bail!(Conversion: "{} has no decimal representation", value);
    }
    if value == 0.0 {
        return Ok(BigDecimal::from(0));
    }

    let bits = value.to_bits();
    let negative = bits >> 63 == 1;
    let biased = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & 0x000f_ffff_ffff_ffff;
    let (mut mantissa, mut exponent) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1 << 52), biased - 1075)
    };
    while mantissa & 1 == 0 && exponent < 0 {
        mantissa >>= 1;
        exponent += 1;
    }

    let mantissa = BigInt::from(mantissa);
    let unscaled = if exponent >= 0 {
        mantissa << exponent as usize
    } else {
        // m / 2^k == m * 5^k / 10^k
        // |exponent| <= 1074
        mantissa * BigInt::from(5u8).pow(exponent.unsigned_abs() as u32)
    };
    let decimal = BigDecimal::new(unscaled, (-exponent).max(0));
    Ok(if negative { -decimal } else { decimal })
}

/// The double nearest to `value`.
pub fn decimal_to_f64(value: &BigDecimal) -> f64 {
    // std's float parsing is correctly rounded
    value
        .to_string()
        .parse()
        .ok()
        .or_else(|| value.to_f64())
        .unwrap_or(f64::NAN)
}

/// `value` truncated toward zero. Fails when the integral part does not fit an `i64`.
pub fn decimal_to_i64(value: &BigDecimal) -> StrandResult<i64> {
    let out_of_range = || strand_err!(Conversion: "{} is outside the 64-bit integer range", value);
    let (unscaled, scale) = value.as_bigint_and_exponent();
    if unscaled.is_zero() {
        return Ok(0);
    }
    let digits = i64::try_from(unscaled.magnitude().to_string().len()).map_err(|_| out_of_range())?;
    let integral = if scale >= digits {
        // every digit is fractional
        return Ok(0);
    } else if scale > 0 {
        let exp = u32::try_from(scale).map_err(|_| out_of_range())?;
        // BigInt division truncates toward zero
        unscaled / BigInt::from(10u8).pow(exp)
    } else {
        // a non-zero value times 10^19 is already past i64::MAX
        if scale <= -MAX_I64_DIGITS {
            return Err(out_of_range());
        }
        let exp = u32::try_from(scale.unsigned_abs()).map_err(|_| out_of_range())?;
        unscaled * BigInt::from(10u8).pow(exp)
    };
    i64::try_from(&integral).map_err(|_| out_of_range())
}

/// `value` rounded half away from zero. Fails for non-finite or out of range doubles.
pub fn f64_to_i64(value: f64) -> StrandResult<i64> {
    let rounded = value.round();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
        strand_bail!(Conversion: "{} is outside the 64-bit integer range", value);
    }
    Ok(rounded as i64)
}

/// The instant `millis` milliseconds after the Unix epoch.
pub fn millis_to_timestamp(millis: i64) -> StrandResult<Timestamp> {
    Timestamp::from_millisecond(millis)
        .map_err(|e| strand_err!(Conversion: "{} ms is not a representable date: {}", millis, e))
}
