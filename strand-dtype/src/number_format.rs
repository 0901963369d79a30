use std::fmt::{Display, Formatter};
use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use strand_error::{StrandResult, strand_bail, strand_err};

use crate::Locale;
use crate::digits::{Digits, shift_decimal};

/// The symbols substituted into a number mask when it is compiled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NumberSymbols {
    /// Separates the integer and fractional digits.
    pub decimal: char,
    /// Separates groups of integer digits.
    pub grouping: char,
    /// Replaces `¤` in a mask.
    pub currency: String,
}

impl NumberSymbols {
    /// The default symbols of a locale.
    pub fn for_locale(locale: &Locale) -> Self {
        Self {
            decimal: locale.decimal_symbol(),
            grouping: locale.grouping_symbol(),
            currency: locale.currency_symbol().to_string(),
        }
    }
}

impl Default for NumberSymbols {
    fn default() -> Self {
        Self::for_locale(&Locale::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
struct Affixes {
    prefix: String,
    suffix: String,
}

impl Affixes {
    fn strip<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())
    }

    fn len(&self) -> usize {
        self.prefix.len() + self.suffix.len()
    }
}

/// A compiled decimal-format mask such as `#,##0.00`, `0.###E0` or `¤#,##0.00;(¤#,##0.00)`.
///
/// Supported pattern characters: `0` (required digit), `#` (optional digit), `,` (grouping),
/// `.` (decimal point), `E0…` (scientific exponent), `%` (percent, ×100), `‰` (per mille, ×1000),
/// `¤` (currency symbol), `'…'` (quoted literal, `''` for a quote) and `;` to start an explicit
/// negative sub-pattern. Formatting rounds half to even. Parsing consumes the whole text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NumberFormat {
    mask: String,
    symbols: NumberSymbols,
    positive: Affixes,
    negative: Affixes,
    min_int: usize,
    min_frac: usize,
    max_frac: usize,
    grouping_size: usize,
    exponent_digits: Option<usize>,
    multiplier_exp: i64,
    decimal_always_shown: bool,
}

enum Section {
    Prefix,
    Number,
    Suffix,
}

struct Subpattern {
    affixes: Affixes,
    number: String,
    multiplier_exp: i64,
}

fn split_subpatterns(mask: &str) -> (&str, Option<&str>) {
    let mut quoted = false;
    for (idx, c) in mask.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            ';' if !quoted => return (&mask[..idx], Some(&mask[idx + 1..])),
            _ => {}
        }
    }
    (mask, None)
}

fn parse_subpattern(pattern: &str, symbols: &NumberSymbols) -> StrandResult<Subpattern> {
    let mut affixes = Affixes::default();
    let mut number = String::new();
    let mut multiplier_exp = 0;
    let mut section = Section::Prefix;
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if matches!(section, Section::Prefix) && matches!(c, '#' | '0' | ',' | '.') {
            section = Section::Number;
        }
        if matches!(section, Section::Number) {
            match c {
                '#' | '0' | ',' | '.' => {
                    number.push(c);
                    continue;
                }
                'E' if chars.peek() == Some(&'0') => {
                    number.push(c);
                    continue;
                }
                _ => section = Section::Suffix,
            }
        }

        let target = match section {
            Section::Prefix => &mut affixes.prefix,
            _ => &mut affixes.suffix,
        };
        match c {
            '\'' => {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    target.push('\'');
                    continue;
                }
                let mut closed = false;
                while let Some(q) = chars.next() {
                    if q == '\'' {
                        if chars.peek() == Some(&'\'') {
                            chars.next();
                            target.push('\'');
                        } else {
                            closed = true;
                            break;
                        }
                    } else {
                        target.push(q);
                    }
                }
                if !closed {
                    strand_bail!(Conversion: "unterminated quote in number mask {:?}", pattern);
                }
            }
            '%' => {
                multiplier_exp = 2;
                target.push('%');
            }
            '\u{2030}' => {
                multiplier_exp = 3;
                target.push('\u{2030}');
            }
            '\u{a4}' => {
                if chars.peek() == Some(&'\u{a4}') {
                    chars.next();
                }
                target.push_str(&symbols.currency);
            }
            '#' | '0' if matches!(section, Section::Suffix) => {
                strand_bail!(Conversion: "digit after suffix in number mask {:?}", pattern);
            }
            other => target.push(other),
        }
    }

    Ok(Subpattern {
        affixes,
        number,
        multiplier_exp,
    })
}

impl NumberFormat {
    /// Compile a mask with the given symbols.
    pub fn compile(mask: &str, symbols: NumberSymbols) -> StrandResult<Self> {
        let (positive_src, negative_src) = split_subpatterns(mask);
        let positive = parse_subpattern(positive_src, &symbols)?;
        let negative = match negative_src {
            Some(src) => parse_subpattern(src, &symbols)?.affixes,
            None => Affixes {
                prefix: format!("-{}", positive.affixes.prefix),
                suffix: positive.affixes.suffix.clone(),
            },
        };

        let (mantissa, exponent) = match positive.number.split_once('E') {
            Some((m, e)) => {
                if e.is_empty() || e.chars().any(|c| c != '0') {
                    strand_bail!(Conversion: "malformed exponent in number mask {:?}", mask);
                }
                (m, Some(e.len()))
            }
            None => (positive.number.as_str(), None),
        };
        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (mantissa, None),
        };
        if frac_part.is_some_and(|f| f.contains(['.', ','])) {
            strand_bail!(Conversion: "misplaced separator in number mask {:?}", mask);
        }
        if !mantissa.contains(['#', '0']) {
            strand_bail!(Conversion: "number mask {:?} has no digits", mask);
        }
        if int_part.trim_start_matches(['#', ',']).contains('#') {
            strand_bail!(Conversion: "optional digit after required digit in number mask {:?}", mask);
        }
        let frac = frac_part.unwrap_or_default();
        if frac.trim_start_matches('0').contains('0') {
            strand_bail!(Conversion: "required digit after optional digit in number mask {:?}", mask);
        }

        let grouping_size = match int_part.rfind(',') {
            Some(pos) => {
                let size = int_part.len() - pos - 1;
                if size == 0 {
                    strand_bail!(Conversion: "empty digit group in number mask {:?}", mask);
                }
                size
            }
            None => 0,
        };

        let min_frac = frac.chars().filter(|&c| c == '0').count();
        Ok(Self {
            mask: mask.to_string(),
            min_int: int_part.chars().filter(|&c| c == '0').count(),
            min_frac,
            max_frac: frac.len(),
            grouping_size,
            exponent_digits: exponent,
            multiplier_exp: positive.multiplier_exp,
            decimal_always_shown: frac_part.is_some() && frac.is_empty(),
            positive: positive.affixes,
            negative,
            symbols,
        })
    }

    /// The mask this format was compiled from.
    pub fn mask(&self) -> &str {
        &self.mask
    }

    /// The symbols this format was compiled with.
    pub fn symbols(&self) -> &NumberSymbols {
        &self.symbols
    }

    /// Render a decimal.
    pub fn format(&self, value: &BigDecimal) -> String {
        let scaled = if self.multiplier_exp == 0 {
            Digits::from_decimal(value)
        } else {
            Digits::from_decimal(&shift_decimal(value, self.multiplier_exp))
        };
        self.format_digits(scaled)
    }

    /// Render an integer.
    pub fn format_i64(&self, value: i64) -> String {
        self.format(&BigDecimal::from(value))
    }

    /// Render a double using its shortest round-tripping digits.
    pub fn format_f64(&self, value: f64) -> String {
        if value.is_nan() {
            return "NaN".to_string();
        }
        if value.is_infinite() {
            let affixes = if value < 0.0 {
                &self.negative
            } else {
                &self.positive
            };
            return format!("{}\u{221e}{}", affixes.prefix, affixes.suffix);
        }
        if self.multiplier_exp == 0 {
            self.format_digits(Digits::from_f64(value))
        } else {
            let digits = Digits::from_f64(value).to_decimal();
            self.format_digits(Digits::from_decimal(&shift_decimal(
                &digits,
                self.multiplier_exp,
            )))
        }
    }

    fn format_digits(&self, mut digits: Digits) -> String {
        let (int, frac, exponent) = match self.exponent_digits {
            None => {
                digits.round_half_even(self.max_frac);
                (digits.int.clone(), digits.frac.clone(), None)
            }
            Some(_) => {
                let (int, frac, exp) = self.to_scientific(&digits);
                digits.negative &= !(int.iter().all(|&d| d == b'0') && frac.is_empty());
                (int, frac, Some(exp))
            }
        };
        let negative = digits.negative && !(int.is_empty() && frac.is_empty());
        let affixes = if negative {
            &self.negative
        } else {
            &self.positive
        };

        let mut out = String::with_capacity(affixes.len() + int.len() + frac.len() + 8);
        out.push_str(&affixes.prefix);

        let mut int = int;
        if int.len() < self.min_int {
            let mut padded = vec![b'0'; self.min_int - int.len()];
            padded.extend_from_slice(&int);
            int = padded;
        }
        if int.is_empty() && frac.is_empty() && self.min_frac == 0 {
            int.push(b'0');
        }
        for (idx, d) in int.iter().enumerate() {
            if self.grouping_size > 0 && idx > 0 && (int.len() - idx) % self.grouping_size == 0 {
                out.push(self.symbols.grouping);
            }
            out.push(char::from(*d));
        }

        let mut frac = frac;
        if frac.len() < self.min_frac {
            frac.resize(self.min_frac, b'0');
        }
        if !frac.is_empty() || self.decimal_always_shown {
            out.push(self.symbols.decimal);
            out.extend(frac.iter().map(|&d| char::from(d)));
        }

        if let (Some(exp), Some(width)) = (exponent, self.exponent_digits) {
            out.push('E');
            if exp < 0 {
                out.push('-');
            }
            out.push_str(&format!("{:0width$}", exp.unsigned_abs(), width = width));
        }

        out.push_str(&affixes.suffix);
        out
    }

    /// Shift the significant digits so that `max(min_int, 1)` of them precede the point.
    fn to_scientific(&self, digits: &Digits) -> (Vec<u8>, Vec<u8>, i64) {
        let int_count = self.min_int.max(1);
        let (significand, point) = digits.significand();
        if significand.is_empty() {
            return (vec![b'0'; int_count], Vec::new(), 0);
        }

        let mut shifted = Digits {
            negative: false,
            int: significand.iter().take(int_count).copied().collect(),
            frac: significand.iter().skip(int_count).copied().collect(),
        };
        if shifted.int.len() < int_count {
            shifted.int.resize(int_count, b'0');
        }
        let mut exponent = point - i64::try_from(int_count).unwrap_or(i64::MAX);
        shifted.round_half_even(self.max_frac);
        if shifted.int.len() > int_count {
            // 9.99 rounded to 10.0: keep the digit count and bump the exponent.
            shifted.int.truncate(int_count);
            exponent += 1;
        }
        (shifted.int, shifted.frac, exponent)
    }

    /// The double [`NumberFormat::format_f64`] rendered as `text` when it is `NaN` or an infinity.
    pub fn parse_non_finite(&self, text: &str) -> Option<f64> {
        if text == "NaN" {
            return Some(f64::NAN);
        }
        let positive = self.positive.strip(text) == Some("\u{221e}");
        let negative = self.negative.strip(text) == Some("\u{221e}");
        match (positive, negative) {
            (true, true) if self.negative.len() > self.positive.len() => Some(f64::NEG_INFINITY),
            (true, _) => Some(f64::INFINITY),
            (false, true) => Some(f64::NEG_INFINITY),
            (false, false) => None,
        }
    }

    /// Parse text produced by this mask. The whole text must match.
    pub fn parse(&self, text: &str) -> StrandResult<BigDecimal> {
        let positive = self.positive.strip(text);
        let negative = self.negative.strip(text);
        let (body, is_negative) = match (positive, negative) {
            (Some(_), Some(n)) if self.negative.len() > self.positive.len() => (n, true),
            (Some(p), _) => (p, false),
            (None, Some(n)) => (n, true),
            (None, None) => {
                strand_bail!(Conversion: "text {:?} does not match number mask {:?}", text, self.mask)
            }
        };

        let value = parse_plain(body, self.symbols.decimal, Some(self.symbols.grouping))
            .map_err(|e| e.with_context(format!("parsing with number mask {:?}", self.mask)))?;
        let value = if is_negative { -value } else { value };
        Ok(if self.multiplier_exp == 0 {
            value
        } else {
            shift_decimal(&value, -self.multiplier_exp)
        })
    }
}

impl Display for NumberFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.mask)
    }
}

/// Parse an unsigned-or-signed plain number: digits, optional grouping symbols in the integer
/// part, one decimal symbol and an optional `E` exponent.
pub(crate) fn parse_plain(
    body: &str,
    decimal: char,
    grouping: Option<char>,
) -> StrandResult<BigDecimal> {
    let mut int_digits = String::new();
    let mut frac_digits = String::new();
    let mut seen_point = false;
    let mut exponent: i64 = 0;
    let mut negative = false;
    let mut chars = body.chars().peekable();

    match chars.peek() {
        Some('-') => {
            negative = true;
            chars.next();
        }
        Some('+') => {
            chars.next();
        }
        _ => {}
    }

    while let Some(c) = chars.next() {
        match c {
            '0'..='9' if seen_point => frac_digits.push(c),
            '0'..='9' => int_digits.push(c),
            c if c == decimal && !seen_point => seen_point = true,
            c if Some(c) == grouping && !seen_point && c != decimal => {}
            'E' | 'e' => {
                let rest: String = chars.by_ref().collect();
                let rest = rest.strip_prefix('+').unwrap_or(&rest);
                exponent = rest
                    .parse::<i64>()
                    .map_err(|_| strand_err!(Conversion: "malformed exponent in {:?}", body))?;
            }
            other => {
                strand_bail!(Conversion: "unexpected character {:?} in number {:?}", other, body)
            }
        }
    }

    if int_digits.is_empty() && frac_digits.is_empty() {
        strand_bail!(Conversion: "no digits in number {:?}", body);
    }

    let mut all = int_digits;
    all.push_str(&frac_digits);
    let unscaled = BigInt::from_str(&all)
        .map_err(|e| strand_err!(Conversion: "malformed number {:?}: {}", body, e))?;
    let scale = i64::try_from(frac_digits.len())
        .map_err(|_| strand_err!(Conversion: "number {:?} is too long", body))?;
    let scale = scale
        .checked_sub(exponent)
        .ok_or_else(|| strand_err!(Conversion: "exponent out of range in {:?}", body))?;
    let value = BigDecimal::new(unscaled, scale);
    Ok(if negative { -value } else { value })
}

/// How numbers are rendered when their descriptor has no mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NumberLayout {
    /// A fixed leading sign slot (`' '` or `'-'`), two decimals for non-integers unless a
    /// precision is set, right-justified to the display length.
    #[default]
    SignSlot,
    /// The shortest plain form, as older releases rendered numbers.
    Plain,
}

/// The mask-less number format derived from a descriptor's length and precision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DefaultNumberFormat {
    layout: NumberLayout,
    length: Option<usize>,
    precision: Option<usize>,
    decimal: char,
    grouping: char,
}

impl DefaultNumberFormat {
    /// Create a mask-less format.
    pub fn new(
        layout: NumberLayout,
        length: Option<u32>,
        precision: Option<u32>,
        symbols: &NumberSymbols,
    ) -> Self {
        Self {
            layout,
            length: length.map(|l| l as usize),
            precision: precision.map(|p| p as usize),
            decimal: symbols.decimal,
            grouping: symbols.grouping,
        }
    }

    /// The layout in use.
    pub fn layout(&self) -> NumberLayout {
        self.layout
    }

    /// Render an integer.
    pub fn format_i64(&self, value: i64) -> String {
        match self.layout {
            NumberLayout::Plain => value.to_string(),
            NumberLayout::SignSlot => {
                let sign = if value < 0 { '-' } else { ' ' };
                let text = format!("{}{}", sign, value.unsigned_abs());
                match self.length {
                    Some(width) => crate::pad_start(&text, width).into_owned(),
                    None => text,
                }
            }
        }
    }

    /// Render a double.
    pub fn format_f64(&self, value: f64) -> String {
        if !value.is_finite() {
            return value.to_string();
        }
        match self.layout {
            NumberLayout::Plain => {
                let text = value.to_string();
                let text = if text.contains('.') {
                    text
                } else {
                    format!("{}.0", text)
                };
                text.replace('.', &self.decimal.to_string())
            }
            NumberLayout::SignSlot => self.sign_slot(Digits::from_f64(value)),
        }
    }

    /// Render a decimal.
    pub fn format_decimal(&self, value: &BigDecimal) -> String {
        match self.layout {
            NumberLayout::Plain => value.to_string().replace('.', &self.decimal.to_string()),
            NumberLayout::SignSlot => self.sign_slot(Digits::from_decimal(value)),
        }
    }

    fn sign_slot(&self, mut digits: Digits) -> String {
        let places = self.precision.unwrap_or(2);
        digits.round_half_even(places);
        let sign = if digits.negative && !digits.is_zero() {
            '-'
        } else {
            ' '
        };

        let mut head = String::with_capacity(digits.int.len() + 1);
        head.push(sign);
        if digits.int.is_empty() {
            head.push('0');
        } else {
            head.extend(digits.int.iter().map(|&d| char::from(d)));
        }

        let mut frac = digits.frac;
        frac.resize(places, b'0');

        match (self.length, self.precision) {
            (Some(length), Some(precision)) => {
                let head = crate::pad_start(&head, length.saturating_sub(precision));
                let mut out = head.into_owned();
                if precision > 0 {
                    out.push(self.decimal);
                    out.extend(frac.iter().map(|&d| char::from(d)));
                }
                out
            }
            (length, _) => {
                let mut out = head;
                if places > 0 {
                    out.push(self.decimal);
                    out.extend(frac.iter().map(|&d| char::from(d)));
                }
                match length {
                    Some(width) => crate::pad_start(&out, width).into_owned(),
                    None => out,
                }
            }
        }
    }

    /// The double [`DefaultNumberFormat::format_f64`] rendered as `text` when it is `NaN` or an
    /// infinity.
    pub fn parse_non_finite(&self, text: &str) -> Option<f64> {
        match text.trim() {
            "NaN" => Some(f64::NAN),
            "inf" => Some(f64::INFINITY),
            "-inf" => Some(f64::NEG_INFINITY),
            _ => None,
        }
    }

    /// Parse text rendered by either layout. Surrounding whitespace is ignored.
    pub fn parse(&self, text: &str) -> StrandResult<BigDecimal> {
        let trimmed = text.trim();
        let grouping = (self.grouping != self.decimal).then_some(self.grouping);
        parse_plain(trimmed, self.decimal, grouping)
            .or_else(|e| {
                if self.decimal != '.' {
                    parse_plain(trimmed, '.', None)
                } else {
                    Err(e)
                }
            })
    }
}
