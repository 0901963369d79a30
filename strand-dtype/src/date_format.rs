use std::fmt::{Display, Formatter};

use jiff::civil::{Date, DateTime, Time};
use jiff::tz::{Offset, TimeZone};
use jiff::{Span, Timestamp, Zoned};
use strand_error::{StrandResult, strand_bail, strand_err};

/// The mask used for dates when a descriptor has none.
pub const DEFAULT_DATE_MASK: &str = "yyyy/MM/dd HH:mm:ss.SSS";

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Field { letter: char, count: usize },
}

impl Token {
    fn is_numeric(&self) -> bool {
        match self {
            Token::Literal(_) => false,
            Token::Field { letter, count } => match *letter {
                'M' => *count <= 2,
                'y' | 'd' | 'H' | 'h' | 'm' | 's' | 'S' => true,
                _ => false,
            },
        }
    }
}

fn tokenize(mask: &str) -> StrandResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = mask.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    literal.push('\'');
                    continue;
                }
                let mut closed = false;
                while let Some(q) = chars.next() {
                    if q == '\'' {
                        if chars.peek() == Some(&'\'') {
                            chars.next();
                            literal.push('\'');
                        } else {
                            closed = true;
                            break;
                        }
                    } else {
                        literal.push(q);
                    }
                }
                if !closed {
                    strand_bail!(Conversion: "unterminated quote in date mask {:?}", mask);
                }
            }
            'y' | 'M' | 'd' | 'H' | 'h' | 'a' | 'm' | 's' | 'S' | 'E' | 'Z' | 'X' => {
                let mut count = 1;
                while chars.peek() == Some(&c) {
                    chars.next();
                    count += 1;
                }
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(Token::Field { letter: c, count });
            }
            c if c.is_ascii_alphabetic() => {
                strand_bail!(Conversion: "unsupported letter {:?} in date mask {:?}", c, mask);
            }
            other => literal.push(other),
        }
    }
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

/// Resolve a time zone name: empty, `UTC`, `GMT` and `Z` are UTC, `±hh:mm` is a fixed offset,
/// anything else is looked up in the time zone database.
pub fn resolve_time_zone(name: Option<&str>) -> StrandResult<TimeZone> {
    match name.map(str::trim) {
        None | Some("" | "UTC" | "GMT" | "Z") => Ok(TimeZone::UTC),
        Some(fixed) if fixed.starts_with(['+', '-']) => {
            let seconds = parse_offset(fixed)
                .filter(|(_, used)| *used == fixed.len())
                .map(|(seconds, _)| seconds)
                .ok_or_else(|| strand_err!(Conversion: "malformed time zone offset {:?}", fixed))?;
            let offset = Offset::from_seconds(seconds)
                .map_err(|e| strand_err!(Conversion: "time zone offset {:?}: {}", fixed, e))?;
            Ok(TimeZone::fixed(offset))
        }
        Some(named) => TimeZone::get(named)
            .map_err(|e| strand_err!(Conversion: "unknown time zone {:?}: {}", named, e)),
    }
}

/// Parse `Z`, `±hh`, `±hhmm` or `±hh:mm` at the start of `text`, returning the offset in seconds
/// and the number of bytes consumed.
fn parse_offset(text: &str) -> Option<(i32, usize)> {
    if text.starts_with('Z') {
        return Some((0, 1));
    }
    let bytes = text.as_bytes();
    let sign = match bytes.first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let two = |at: usize| -> Option<i32> {
        let d = bytes.get(at..at + 2)?;
        d.iter()
            .all(u8::is_ascii_digit)
            .then(|| i32::from(d[0] - b'0') * 10 + i32::from(d[1] - b'0'))
    };
    let hours = two(1)?;
    let (minutes, used) = if bytes.get(3) == Some(&b':') {
        (two(4)?, 6)
    } else {
        two(3).map_or((0, 3), |m| (m, 5))
    };
    Some((sign * (hours * 3600 + minutes * 60), used))
}

#[derive(Debug, Default)]
struct Fields {
    year: Option<i64>,
    month: Option<i64>,
    day: Option<i64>,
    hour: Option<i64>,
    hour12: Option<i64>,
    pm: Option<bool>,
    minute: Option<i64>,
    second: Option<i64>,
    millis: Option<i64>,
    offset: Option<i32>,
}

/// A compiled date-pattern mask such as `yyyy/MM/dd HH:mm:ss.SSS` bound to a time zone.
///
/// Supported letters: `y` (year, `yy` for two digits), `M` (month, `MMM`/`MMMM` for names),
/// `d`, `H` (0-23), `h` (1-12) with `a` (AM/PM), `m`, `s`, `S` (milliseconds), `E` (day name),
/// `Z` (`+hhmm`) and `X` (ISO offset). Text in single quotes is literal.
#[derive(Debug, Clone)]
pub struct DateFormat {
    mask: String,
    tokens: Vec<Token>,
    zone_name: String,
    zone: TimeZone,
}

impl PartialEq for DateFormat {
    fn eq(&self, other: &Self) -> bool {
        self.mask == other.mask && self.zone_name == other.zone_name
    }
}

impl Eq for DateFormat {}

impl DateFormat {
    /// Compile a mask. `time_zone` defaults to UTC.
    pub fn compile(mask: &str, time_zone: Option<&str>) -> StrandResult<Self> {
        Ok(Self {
            mask: mask.to_string(),
            tokens: tokenize(mask)?,
            zone_name: time_zone.unwrap_or("UTC").to_string(),
            zone: resolve_time_zone(time_zone)?,
        })
    }

    /// The mask this format was compiled from.
    pub fn mask(&self) -> &str {
        &self.mask
    }

    /// The zone dates are rendered in and parsed from when the text carries no offset.
    pub fn time_zone(&self) -> &TimeZone {
        &self.zone
    }

    /// Render an instant.
    pub fn format(&self, ts: Timestamp) -> String {
        let zoned = ts.to_zoned(self.zone.clone());
        let mut out = String::with_capacity(self.mask.len() + 8);
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Field { letter, count } => format_field(&mut out, &zoned, *letter, *count),
            }
        }
        out
    }

    /// Parse text rendered by this mask. The whole text must match.
    ///
    /// When `lenient` is set, out of range fields roll over into the next larger unit (month 13
    /// is January of the following year); otherwise they are rejected.
    pub fn parse(&self, text: &str, lenient: bool) -> StrandResult<Timestamp> {
        let fields = self.parse_fields(text)?;
        let datetime = if lenient {
            lenient_datetime(&fields)
        } else {
            strict_datetime(&fields)
        }
        .map_err(|e| e.with_context(format!("text {:?} with date mask {:?}", text, self.mask)))?;

        let zone = match fields.offset {
            Some(seconds) => TimeZone::fixed(
                Offset::from_seconds(seconds)
                    .map_err(|e| strand_err!(Conversion: "offset in {:?}: {}", text, e))?,
            ),
            None => self.zone.clone(),
        };
        datetime
            .to_zoned(zone)
            .map(|z| z.timestamp())
            .map_err(|e| strand_err!(Conversion: "date {:?} out of range: {}", text, e))
    }

    fn parse_fields(&self, text: &str) -> StrandResult<Fields> {
        let mismatch = || strand_err!(Conversion: "text {:?} does not match date mask {:?}", text, self.mask);
        let mut fields = Fields::default();
        let mut rest = text;

        for (idx, token) in self.tokens.iter().enumerate() {
            match token {
                Token::Literal(literal) => {
                    rest = rest.strip_prefix(literal.as_str()).ok_or_else(mismatch)?;
                }
                Token::Field { letter, count } if token.is_numeric() => {
                    let adjacent = self.tokens.get(idx + 1).is_some_and(Token::is_numeric);
                    let available = rest.bytes().take_while(u8::is_ascii_digit).count();
                    let take = if adjacent { *count } else { available };
                    if take == 0 || available < take {
                        return Err(mismatch());
                    }
                    let (digits, tail) = rest.split_at(take);
                    rest = tail;
                    let value = digits.parse::<i64>().map_err(|_| mismatch())?;
                    match *letter {
                        'y' if *count == 2 && take == 2 => {
                            fields.year = Some(if value < 70 { 2000 + value } else { 1900 + value })
                        }
                        'y' => fields.year = Some(value),
                        'M' => fields.month = Some(value),
                        'd' => fields.day = Some(value),
                        'H' => fields.hour = Some(value),
                        'h' => fields.hour12 = Some(value),
                        'm' => fields.minute = Some(value),
                        's' => fields.second = Some(value),
                        _ => fields.millis = Some(value),
                    }
                }
                Token::Field { letter: 'M', .. } => {
                    let (month, used) = match_name(rest, &MONTHS).ok_or_else(mismatch)?;
                    fields.month = Some(i64::try_from(month).unwrap_or(0) + 1);
                    rest = &rest[used..];
                }
                Token::Field { letter: 'E', .. } => {
                    let (_, used) = match_name(rest, &WEEKDAYS).ok_or_else(mismatch)?;
                    rest = &rest[used..];
                }
                Token::Field { letter: 'a', .. } => {
                    let marker = rest.get(..2).ok_or_else(mismatch)?;
                    fields.pm = Some(if marker.eq_ignore_ascii_case("PM") {
                        true
                    } else if marker.eq_ignore_ascii_case("AM") {
                        false
                    } else {
                        return Err(mismatch());
                    });
                    rest = &rest[2..];
                }
                Token::Field { .. } => {
                    let (seconds, used) = parse_offset(rest).ok_or_else(mismatch)?;
                    fields.offset = Some(seconds);
                    rest = &rest[used..];
                }
            }
        }

        if !rest.is_empty() {
            return Err(mismatch());
        }
        Ok(fields)
    }
}

impl Display for DateFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.mask)
    }
}

/// Match a full name or its three letter abbreviation, case-insensitively.
fn match_name(text: &str, names: &[&str]) -> Option<(usize, usize)> {
    names.iter().enumerate().find_map(|(idx, name)| {
        if text.get(..name.len()).is_some_and(|p| p.eq_ignore_ascii_case(name)) {
            Some((idx, name.len()))
        } else if text.get(..3).is_some_and(|p| p.eq_ignore_ascii_case(&name[..3])) {
            Some((idx, 3))
        } else {
            None
        }
    })
}

fn format_field(out: &mut String, zoned: &Zoned, letter: char, count: usize) {
    let padded = |out: &mut String, value: i64| {
        out.push_str(&format!("{:0width$}", value, width = count));
    };
    match letter {
        'y' if count == 2 => padded(out, i64::from(zoned.year()).rem_euclid(100)),
        'y' => padded(out, i64::from(zoned.year())),
        'M' if count >= 4 => out.push_str(month_name(zoned)),
        'M' if count == 3 => out.push_str(&month_name(zoned)[..3]),
        'M' => padded(out, i64::from(zoned.month())),
        'd' => padded(out, i64::from(zoned.day())),
        'H' => padded(out, i64::from(zoned.hour())),
        'h' => {
            let hour = i64::from(zoned.hour()) % 12;
            padded(out, if hour == 0 { 12 } else { hour })
        }
        'a' => out.push_str(if zoned.hour() < 12 { "AM" } else { "PM" }),
        'm' => padded(out, i64::from(zoned.minute())),
        's' => padded(out, i64::from(zoned.second())),
        'S' => padded(out, i64::from(zoned.millisecond())),
        'E' => {
            let day = WEEKDAYS[usize::try_from(zoned.weekday().to_monday_zero_offset()).unwrap_or(0)];
            out.push_str(if count >= 4 { day } else { &day[..3] });
        }
        _ => {
            let seconds = zoned.offset().seconds();
            if letter == 'X' && seconds == 0 {
                out.push('Z');
                return;
            }
            out.push(if seconds < 0 { '-' } else { '+' });
            let abs = seconds.unsigned_abs();
            out.push_str(&format!("{:02}", abs / 3600));
            match (letter, count) {
                ('X', 1) => {}
                ('X', c) if c >= 3 => out.push_str(&format!(":{:02}", (abs % 3600) / 60)),
                _ => out.push_str(&format!("{:02}", (abs % 3600) / 60)),
            }
        }
    }
}

fn month_name(zoned: &Zoned) -> &'static str {
    MONTHS[usize::try_from(zoned.month() - 1).unwrap_or(0)]
}

fn hour_of(fields: &Fields) -> i64 {
    match (fields.hour12, fields.pm) {
        (Some(h), pm) => h % 12 + if pm == Some(true) { 12 } else { 0 },
        (None, _) => fields.hour.unwrap_or(0),
    }
}

fn narrow<T: TryFrom<i64>>(value: i64, what: &str) -> StrandResult<T> {
    T::try_from(value).map_err(|_| strand_err!(Conversion: "{} {} out of range", what, value))
}

fn strict_datetime(fields: &Fields) -> StrandResult<DateTime> {
    let millis = fields.millis.unwrap_or(0);
    if !(0..1000).contains(&millis) {
        strand_bail!(Conversion: "millisecond {} out of range", millis);
    }
    if fields.hour12.is_some_and(|h| !(1..=12).contains(&h)) {
        strand_bail!(Conversion: "hour {} out of range for a 12 hour clock", fields.hour12.unwrap_or(0));
    }
    DateTime::new(
        narrow(fields.year.unwrap_or(1970), "year")?,
        narrow(fields.month.unwrap_or(1), "month")?,
        narrow(fields.day.unwrap_or(1), "day")?,
        narrow(hour_of(fields), "hour")?,
        narrow(fields.minute.unwrap_or(0), "minute")?,
        narrow(fields.second.unwrap_or(0), "second")?,
        narrow::<i32>(millis * 1_000_000, "millisecond")?,
    )
    .map_err(|e| strand_err!(Conversion: "invalid date: {}", e))
}

fn lenient_datetime(fields: &Fields) -> StrandResult<DateTime> {
    let start = Date::new(narrow(fields.year.unwrap_or(1970), "year")?, 1, 1)
        .map_err(|e| strand_err!(Conversion: "invalid year: {}", e))?
        .to_datetime(Time::midnight());

    let steps: [(i64, fn(Span, i64) -> Result<Span, jiff::Error>); 6] = [
        (fields.month.unwrap_or(1) - 1, Span::try_months),
        (fields.day.unwrap_or(1) - 1, Span::try_days),
        (hour_of(fields), Span::try_hours),
        (fields.minute.unwrap_or(0), Span::try_minutes),
        (fields.second.unwrap_or(0), Span::try_seconds),
        (fields.millis.unwrap_or(0), Span::try_milliseconds),
    ];
    steps.iter().try_fold(start, |datetime, (amount, unit)| {
        if *amount == 0 {
            return Ok(datetime);
        }
        let span = unit(Span::new(), *amount)
            .map_err(|e| strand_err!(Conversion: "date field {} out of range: {}", amount, e))?;
        datetime
            .checked_add(span)
            .map_err(|e| strand_err!(Conversion: "date out of range: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn ts(text: &str) -> Timestamp {
        text.parse().unwrap()
    }

    #[rstest]
    #[case(DEFAULT_DATE_MASK, "2024-03-05T07:08:09.012Z", "2024/03/05 07:08:09.012")]
    #[case("dd-MMM-yy", "1999-12-31T00:00:00Z", "31-Dec-99")]
    #[case("EEEE, MMMM d yyyy", "2024-02-29T00:00:00Z", "Thursday, February 29 2024")]
    #[case("h:mm a", "2024-01-01T00:05:00Z", "12:05 AM")]
    #[case("h:mm a", "2024-01-01T13:05:00Z", "1:05 PM")]
    #[case("yyyyMMdd'T'HHmmss", "2024-03-05T07:08:09Z", "20240305T070809")]
    #[case("yyyy-MM-dd'T'HH:mm:ssXXX", "2024-03-05T07:08:09Z", "2024-03-05T07:08:09Z")]
    fn formats(#[case] mask: &str, #[case] instant: &str, #[case] expected: &str) {
        let fmt = DateFormat::compile(mask, None).unwrap();
        assert_eq!(fmt.format(ts(instant)), expected);
        assert_eq!(fmt.parse(expected, false).unwrap(), ts(instant));
    }

    #[test]
    fn fixed_zone_renders_local_time() {
        let fmt = DateFormat::compile("yyyy-MM-dd HH:mm Z", Some("+02:00")).unwrap();
        let instant = ts("2024-03-05T22:30:00Z");
        assert_eq!(fmt.format(instant), "2024-03-06 00:30 +0200");
        assert_eq!(fmt.parse("2024-03-06 00:30 +0200", false).unwrap(), instant);
        assert_eq!(fmt.parse("2024-03-05 22:30 +0000", false).unwrap(), instant);
    }

    #[test]
    fn variable_width_fields() {
        let fmt = DateFormat::compile("yyyy/MM/dd", None).unwrap();
        assert_eq!(fmt.parse("2024/3/5", false).unwrap(), ts("2024-03-05T00:00:00Z"));
    }

    #[test]
    fn lenient_rolls_over() {
        let fmt = DateFormat::compile("yyyy-MM-dd", None).unwrap();
        assert!(fmt.parse("2023-13-01", false).unwrap_err().is_conversion());
        assert_eq!(fmt.parse("2023-13-01", true).unwrap(), ts("2024-01-01T00:00:00Z"));
        assert_eq!(fmt.parse("2023-02-30", true).unwrap(), ts("2023-03-02T00:00:00Z"));
    }

    #[rstest]
    #[case("2024/03/05")]
    #[case("2024/03/05 07:08:09.012 extra")]
    #[case("2024-03-05 07:08:09.012")]
    fn rejects_text_outside_mask(#[case] text: &str) {
        let fmt = DateFormat::compile(DEFAULT_DATE_MASK, None).unwrap();
        assert!(fmt.parse(text, true).unwrap_err().is_conversion());
    }

    #[rstest]
    #[case("yyyy-QQ")]
    #[case("'unterminated")]
    fn rejects_malformed_masks(#[case] mask: &str) {
        assert!(DateFormat::compile(mask, None).is_err());
    }

    #[test]
    fn resolves_zones() {
        let gmt = resolve_time_zone(Some("GMT")).unwrap();
        assert_eq!(Timestamp::UNIX_EPOCH.to_zoned(gmt).offset().seconds(), 0);
        assert!(resolve_time_zone(Some("+05:30")).is_ok());
        assert!(resolve_time_zone(Some("+5")).is_err());
    }
}
