//! Decimal digit strings split at the decimal point, with half-even rounding.

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};

/// The sign and ASCII digits of a finite number.
///
/// `int` never has leading zeros and `frac` never has trailing zeros, so zero is two empty
/// vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Digits {
    pub negative: bool,
    pub int: Vec<u8>,
    pub frac: Vec<u8>,
}

impl Digits {
    pub fn from_decimal(value: &BigDecimal) -> Self {
        let (unscaled, scale) = value.as_bigint_and_exponent();
        let negative = unscaled.sign() == Sign::Minus;
        let magnitude = unscaled.magnitude().to_string().into_bytes();

        let (int, frac) = if scale <= 0 {
            let zeros = usize::try_from(scale.unsigned_abs()).unwrap_or(0);
            let mut int = magnitude;
            int.extend(std::iter::repeat_n(b'0', zeros));
            (int, Vec::new())
        } else {
            let scale = usize::try_from(scale).unwrap_or(usize::MAX);
            if magnitude.len() > scale {
                let split = magnitude.len() - scale;
                (magnitude[..split].to_vec(), magnitude[split..].to_vec())
            } else {
                let mut frac = vec![b'0'; scale - magnitude.len()];
                frac.extend_from_slice(&magnitude);
                (Vec::new(), frac)
            }
        };

        let mut digits = Self {
            negative,
            int,
            frac,
        };
        digits.normalize();
        digits
    }

    /// Shortest digits that round trip to the same double. Non-finite input yields zero.
    pub fn from_f64(value: f64) -> Self {
        let text = value.to_string();
        let negative = text.starts_with('-');
        let unsigned = text.trim_start_matches('-');
        let (int, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let mut digits = Self {
            negative,
            int: int.bytes().filter(u8::is_ascii_digit).collect(),
            frac: frac.bytes().filter(u8::is_ascii_digit).collect(),
        };
        digits.normalize();
        digits
    }

    fn normalize(&mut self) {
        let leading = self.int.iter().take_while(|&&d| d == b'0').count();
        self.int.drain(..leading);
        while self.frac.last() == Some(&b'0') {
            self.frac.pop();
        }
    }

    pub fn is_zero(&self) -> bool {
        self.int.is_empty() && self.frac.is_empty()
    }

    /// Round to at most `places` fractional digits, ties to even.
    pub fn round_half_even(&mut self, places: usize) {
        if self.frac.len() <= places {
            return;
        }
        let first_dropped = self.frac[places];
        let rest_nonzero = self.frac[places + 1..].iter().any(|&d| d != b'0');
        let last_kept = if places > 0 {
            self.frac[places - 1]
        } else {
            self.int.last().copied().unwrap_or(b'0')
        };
        let round_up = first_dropped > b'5'
            || (first_dropped == b'5' && (rest_nonzero || (last_kept - b'0') % 2 == 1));
        self.frac.truncate(places);
        if round_up {
            self.increment();
        }
        self.normalize();
    }

    /// Add one unit in the last fractional place kept.
    fn increment(&mut self) {
        for d in self.frac.iter_mut().rev() {
            if *d == b'9' {
                *d = b'0';
            } else {
                *d += 1;
                return;
            }
        }
        for d in self.int.iter_mut().rev() {
            if *d == b'9' {
                *d = b'0';
            } else {
                *d += 1;
                return;
            }
        }
        self.int.insert(0, b'1');
    }

    /// All significant digits and the position of the decimal point relative to their start.
    pub fn significand(&self) -> (Vec<u8>, i64) {
        let mut all = self.int.clone();
        all.extend_from_slice(&self.frac);
        let leading = all.iter().take_while(|&&d| d == b'0').count();
        all.drain(..leading);
        while all.last() == Some(&b'0') {
            all.pop();
        }
        let point = i64::try_from(self.int.len()).unwrap_or(i64::MAX)
            - i64::try_from(leading).unwrap_or(0);
        (all, point)
    }

    pub fn to_decimal(&self) -> BigDecimal {
        let mut all = self.int.clone();
        all.extend_from_slice(&self.frac);
        let all: &[u8] = if all.is_empty() { b"0" } else { &all };
        let unscaled = BigInt::parse_bytes(all, 10).unwrap_or_default();
        let unscaled = if self.negative { -unscaled } else { unscaled };
        BigDecimal::new(unscaled, i64::try_from(self.frac.len()).unwrap_or(i64::MAX))
    }
}

/// Multiply by a power of ten without rounding.
pub(crate) fn shift_decimal(value: &BigDecimal, exponent: i64) -> BigDecimal {
    let (unscaled, scale) = value.as_bigint_and_exponent();
    BigDecimal::new(unscaled, scale - exponent)
}
