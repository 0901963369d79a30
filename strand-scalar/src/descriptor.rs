use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use bigdecimal::BigDecimal;
use once_cell::race::OnceBox;
use strand_dtype::{
    DEFAULT_DATE_MASK, DateFormat, DefaultNumberFormat, Locale, LogicalType, NumberFormat,
    NumberSymbols, StorageMode, TextEncoding, TrimPolicy,
};
use strand_error::{StrandResult, strand_err};

use crate::{Dictionary, EngineConfig, Value, decimal_to_f64};

/// How a descriptor renders and parses numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumberRenderer {
    /// A compiled mask.
    Masked(NumberFormat),
    /// The mask-less layout derived from length and precision.
    Default(DefaultNumberFormat),
}

impl NumberRenderer {
    /// Render an integer.
    pub fn format_i64(&self, value: i64) -> String {
        match self {
            Self::Masked(f) => f.format_i64(value),
            Self::Default(f) => f.format_i64(value),
        }
    }

    /// Render a double.
    pub fn format_f64(&self, value: f64) -> String {
        match self {
            Self::Masked(f) => f.format_f64(value),
            Self::Default(f) => f.format_f64(value),
        }
    }

    /// Render a decimal.
    pub fn format_decimal(&self, value: &BigDecimal) -> String {
        match self {
            Self::Masked(f) => f.format(value),
            Self::Default(f) => f.format_decimal(value),
        }
    }

    /// Parse a double rendered by this renderer, `NaN` and the infinities included.
    pub fn parse_f64(&self, text: &str) -> StrandResult<f64> {
        let non_finite = match self {
            Self::Masked(f) => f.parse_non_finite(text),
            Self::Default(f) => f.parse_non_finite(text),
        };
        match non_finite {
            Some(value) => Ok(value),
            None => self.parse(text).map(|d| decimal_to_f64(&d)),
        }
    }

    /// Parse text rendered by this renderer.
    pub fn parse(&self, text: &str) -> StrandResult<BigDecimal> {
        match self {
            Self::Masked(f) => f.parse(text),
            Self::Default(f) => f.parse(text),
        }
    }
}

/// Formatters derived from a descriptor's attributes, built on first use.
///
/// Compilation is deterministic, so two threads racing to fill a cell build equal values and
/// either may win. Failures are cached as messages so a bad mask is reported on every use.
#[derive(Default)]
struct FormatCache {
    number: OnceBox<Result<NumberRenderer, Arc<str>>>,
    date: OnceBox<Result<DateFormat, Arc<str>>>,
}

impl Clone for FormatCache {
    fn clone(&self) -> Self {
        Self::default()
    }
}

/// Describes one column: its logical type, storage mode and every attribute that shapes how its
/// values are converted, compared and rendered.
#[derive(Clone)]
pub struct ValueDescriptor {
    name: Arc<str>,
    logical_type: LogicalType,
    storage_mode: StorageMode,
    length: Option<u32>,
    precision: Option<u32>,
    mask: Option<String>,
    decimal_symbol: Option<char>,
    grouping_symbol: Option<char>,
    currency_symbol: Option<String>,
    locale: Locale,
    time_zone: Option<String>,
    encoding: TextEncoding,
    trim: TrimPolicy,
    case_insensitive: bool,
    descending: bool,
    output_padding: bool,
    lenient_dates: bool,
    origin: Option<String>,
    comments: Option<String>,
    storage_descriptor: Option<Box<ValueDescriptor>>,
    conversion_descriptor: Option<Box<ValueDescriptor>>,
    dictionary: Dictionary,
    identical_format: bool,
    formats: FormatCache,
}

impl ValueDescriptor {
    /// A NATIVE descriptor with default formatting.
    pub fn new(name: impl Into<Arc<str>>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
            storage_mode: StorageMode::Native,
            length: None,
            precision: None,
            mask: None,
            decimal_symbol: None,
            grouping_symbol: None,
            currency_symbol: None,
            locale: Locale::default(),
            time_zone: None,
            encoding: TextEncoding::default(),
            trim: TrimPolicy::default(),
            case_insensitive: false,
            descending: false,
            output_padding: false,
            lenient_dates: false,
            origin: None,
            comments: None,
            storage_descriptor: None,
            conversion_descriptor: None,
            dictionary: Dictionary::new(),
            identical_format: false,
            formats: FormatCache::default(),
        }
    }

    /// The column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The logical type.
    pub fn logical_type(&self) -> LogicalType {
        self.logical_type
    }

    /// The storage mode of this column's slots.
    pub fn storage_mode(&self) -> StorageMode {
        self.storage_mode
    }

    /// The display length, if any.
    pub fn length(&self) -> Option<u32> {
        self.length
    }

    /// The precision (decimal places), if any.
    pub fn precision(&self) -> Option<u32> {
        self.precision
    }

    /// The conversion mask, if any.
    pub fn mask(&self) -> Option<&str> {
        self.mask.as_deref()
    }

    /// The decimal symbol, falling back to the locale's.
    pub fn decimal_symbol(&self) -> char {
        self.decimal_symbol
            .unwrap_or_else(|| self.locale.decimal_symbol())
    }

    /// The grouping symbol, falling back to the locale's.
    pub fn grouping_symbol(&self) -> char {
        self.grouping_symbol
            .unwrap_or_else(|| self.locale.grouping_symbol())
    }

    /// The currency symbol, falling back to the locale's.
    pub fn currency_symbol(&self) -> &str {
        self.currency_symbol
            .as_deref()
            .unwrap_or_else(|| self.locale.currency_symbol())
    }

    /// The explicitly configured decimal symbol.
    pub fn explicit_decimal_symbol(&self) -> Option<char> {
        self.decimal_symbol
    }

    /// The explicitly configured grouping symbol.
    pub fn explicit_grouping_symbol(&self) -> Option<char> {
        self.grouping_symbol
    }

    /// The explicitly configured currency symbol.
    pub fn explicit_currency_symbol(&self) -> Option<&str> {
        self.currency_symbol.as_deref()
    }

    /// The locale.
    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// The time zone name dates are rendered in. `None` is UTC.
    pub fn time_zone(&self) -> Option<&str> {
        self.time_zone.as_deref()
    }

    /// The encoding of raw text bytes.
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// The trim policy applied before text is parsed.
    pub fn trim(&self) -> TrimPolicy {
        self.trim
    }

    /// Whether TEXT comparison ignores case.
    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Whether comparison is reversed for non-null values.
    pub fn is_descending(&self) -> bool {
        self.descending
    }

    /// Whether rendered text is padded to the display length.
    pub fn is_output_padding(&self) -> bool {
        self.output_padding
    }

    /// Whether out of range date fields roll over instead of failing.
    pub fn is_lenient_dates(&self) -> bool {
        self.lenient_dates
    }

    /// The name of the stage that produced this column.
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Free-form comments.
    pub fn comments(&self) -> Option<&str> {
        self.comments.as_deref()
    }

    /// The format raw DEFERRED bytes were written in.
    pub fn storage_descriptor(&self) -> Option<&ValueDescriptor> {
        self.storage_descriptor.as_deref()
    }

    /// The descriptor of the value this text was rendered from.
    pub fn conversion_descriptor(&self) -> Option<&ValueDescriptor> {
        self.conversion_descriptor.as_deref()
    }

    /// The dictionary DICTIONARY slots index into.
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Whether raw DEFERRED bytes are already in this descriptor's text form.
    pub fn is_identical_format(&self) -> bool {
        self.identical_format
    }

    /// Rename the column.
    pub fn set_name(&mut self, name: impl Into<Arc<str>>) {
        self.name = name.into();
    }

    /// Change the logical type.
    pub fn set_logical_type(&mut self, logical_type: LogicalType) {
        self.logical_type = logical_type;
        self.formats_changed();
    }

    /// Change the storage mode.
    pub fn set_storage_mode(&mut self, storage_mode: StorageMode) {
        self.storage_mode = storage_mode;
    }

    /// Set the display length.
    pub fn set_length(&mut self, length: Option<u32>) {
        self.length = length;
        self.formats_changed();
    }

    /// Set the precision.
    pub fn set_precision(&mut self, precision: Option<u32>) {
        self.precision = precision;
        self.formats_changed();
    }

    /// Set the conversion mask. An empty mask is the same as none.
    pub fn set_mask(&mut self, mask: Option<String>) {
        self.mask = mask.filter(|m| !m.is_empty());
        self.formats_changed();
    }

    /// Override the locale's decimal symbol.
    pub fn set_decimal_symbol(&mut self, symbol: Option<char>) {
        self.decimal_symbol = symbol;
        self.formats_changed();
    }

    /// Override the locale's grouping symbol.
    pub fn set_grouping_symbol(&mut self, symbol: Option<char>) {
        self.grouping_symbol = symbol;
        self.formats_changed();
    }

    /// Override the locale's currency symbol.
    pub fn set_currency_symbol(&mut self, symbol: Option<String>) {
        self.currency_symbol = symbol;
        self.formats_changed();
    }

    /// Set the locale.
    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
        self.formats_changed();
    }

    /// Set the time zone dates are rendered in.
    pub fn set_time_zone(&mut self, time_zone: Option<String>) {
        self.time_zone = time_zone.filter(|z| !z.is_empty());
        self.formats_changed();
    }

    /// Set the encoding of raw text bytes.
    pub fn set_encoding(&mut self, encoding: TextEncoding) {
        self.encoding = encoding;
        self.formats_changed();
    }

    /// Set the trim policy.
    pub fn set_trim(&mut self, trim: TrimPolicy) {
        self.trim = trim;
        self.refresh_identical_format();
    }

    /// Set case-insensitive comparison.
    pub fn set_case_insensitive(&mut self, value: bool) {
        self.case_insensitive = value;
    }

    /// Set descending comparison.
    pub fn set_descending(&mut self, value: bool) {
        self.descending = value;
    }

    /// Set output padding.
    pub fn set_output_padding(&mut self, value: bool) {
        self.output_padding = value;
    }

    /// Set lenient date parsing.
    pub fn set_lenient_dates(&mut self, value: bool) {
        self.lenient_dates = value;
    }

    /// Set the producing stage name.
    pub fn set_origin(&mut self, origin: Option<String>) {
        self.origin = origin;
    }

    /// Set the comments.
    pub fn set_comments(&mut self, comments: Option<String>) {
        self.comments = comments;
    }

    /// Set the storage descriptor. Its own nested descriptors are dropped.
    pub fn set_storage_descriptor(&mut self, descriptor: Option<ValueDescriptor>) {
        self.storage_descriptor = descriptor.map(|d| Box::new(d.flattened()));
        self.refresh_identical_format();
    }

    /// Set the conversion descriptor. Its own nested descriptors are dropped.
    pub fn set_conversion_descriptor(&mut self, descriptor: Option<ValueDescriptor>) {
        self.conversion_descriptor = descriptor.map(|d| Box::new(d.flattened()));
    }

    /// Replace the dictionary.
    pub fn set_dictionary(&mut self, dictionary: Dictionary) {
        self.dictionary = dictionary;
    }

    /// Builder form of [`ValueDescriptor::set_storage_mode`].
    pub fn with_storage_mode(mut self, storage_mode: StorageMode) -> Self {
        self.set_storage_mode(storage_mode);
        self
    }

    /// Builder form of [`ValueDescriptor::set_length`].
    pub fn with_length(mut self, length: u32) -> Self {
        self.set_length(Some(length));
        self
    }

    /// Builder form of [`ValueDescriptor::set_precision`].
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.set_precision(Some(precision));
        self
    }

    /// Builder form of [`ValueDescriptor::set_mask`].
    pub fn with_mask(mut self, mask: impl Into<String>) -> Self {
        self.set_mask(Some(mask.into()));
        self
    }

    /// Builder form of [`ValueDescriptor::set_decimal_symbol`].
    pub fn with_decimal_symbol(mut self, symbol: char) -> Self {
        self.set_decimal_symbol(Some(symbol));
        self
    }

    /// Builder form of [`ValueDescriptor::set_grouping_symbol`].
    pub fn with_grouping_symbol(mut self, symbol: char) -> Self {
        self.set_grouping_symbol(Some(symbol));
        self
    }

    /// Builder form of [`ValueDescriptor::set_currency_symbol`].
    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.set_currency_symbol(Some(symbol.into()));
        self
    }

    /// Builder form of [`ValueDescriptor::set_locale`].
    pub fn with_locale(mut self, locale: impl Into<Locale>) -> Self {
        self.set_locale(locale.into());
        self
    }

    /// Builder form of [`ValueDescriptor::set_time_zone`].
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.set_time_zone(Some(time_zone.into()));
        self
    }

    /// Builder form of [`ValueDescriptor::set_encoding`].
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.set_encoding(encoding);
        self
    }

    /// Builder form of [`ValueDescriptor::set_trim`].
    pub fn with_trim(mut self, trim: TrimPolicy) -> Self {
        self.set_trim(trim);
        self
    }

    /// Builder form of [`ValueDescriptor::set_case_insensitive`].
    pub fn with_case_insensitive(mut self, value: bool) -> Self {
        self.set_case_insensitive(value);
        self
    }

    /// Builder form of [`ValueDescriptor::set_descending`].
    pub fn with_descending(mut self, value: bool) -> Self {
        self.set_descending(value);
        self
    }

    /// Builder form of [`ValueDescriptor::set_output_padding`].
    pub fn with_output_padding(mut self, value: bool) -> Self {
        self.set_output_padding(value);
        self
    }

    /// Builder form of [`ValueDescriptor::set_lenient_dates`].
    pub fn with_lenient_dates(mut self, value: bool) -> Self {
        self.set_lenient_dates(value);
        self
    }

    /// Builder form of [`ValueDescriptor::set_origin`].
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.set_origin(Some(origin.into()));
        self
    }

    /// Builder form of [`ValueDescriptor::set_comments`].
    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.set_comments(Some(comments.into()));
        self
    }

    /// Builder form of [`ValueDescriptor::set_storage_descriptor`].
    pub fn with_storage_descriptor(mut self, descriptor: ValueDescriptor) -> Self {
        self.set_storage_descriptor(Some(descriptor));
        self
    }

    /// Make this a DEFERRED column whose raw bytes are text in this descriptor's own format.
    pub fn with_deferred_storage(mut self) -> Self {
        let storage = self.derive_storage_descriptor();
        self.set_storage_mode(StorageMode::Deferred);
        self.set_storage_descriptor(Some(storage));
        self
    }

    /// Make this a DICTIONARY column over `values`.
    pub fn with_dictionary(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.set_storage_mode(StorageMode::Dictionary);
        self.set_dictionary(Dictionary::from_values(values));
        self
    }

    /// A TEXT, NATIVE descriptor carrying this descriptor's formatting attributes: the format raw
    /// DEFERRED bytes are written in.
    pub fn derive_storage_descriptor(&self) -> ValueDescriptor {
        let mut storage = self.formatting_copy();
        storage.logical_type = LogicalType::Text;
        storage
    }

    /// A TEXT descriptor, rendered with this descriptor's format, whose conversion descriptor is
    /// this descriptor. Parsing its text back to this logical type reproduces the value exactly.
    pub fn derive_conversion_descriptor(&self) -> ValueDescriptor {
        let mut text = self.formatting_copy();
        text.logical_type = LogicalType::Text;
        text.conversion_descriptor = Some(Box::new(self.flattened()));
        text
    }

    /// A NATIVE copy with the same name and formatting, without nested descriptors or dictionary.
    fn formatting_copy(&self) -> ValueDescriptor {
        let mut copy = self.flattened();
        copy.storage_mode = StorageMode::Native;
        copy.dictionary = Dictionary::new();
        copy.identical_format = false;
        copy.formats = FormatCache::default();
        copy
    }

    /// A copy without nested descriptors, keeping nesting one level deep.
    fn flattened(&self) -> ValueDescriptor {
        let mut copy = self.clone();
        copy.storage_descriptor = None;
        copy.conversion_descriptor = None;
        copy.identical_format = false;
        copy
    }

    fn formats_changed(&mut self) {
        self.formats = FormatCache::default();
        self.refresh_identical_format();
    }

    fn refresh_identical_format(&mut self) {
        let identical = self.evaluate_identical_format();
        if identical != self.identical_format {
            log::debug!("identical format of {} is now {}", self.name, identical);
        }
        self.identical_format = identical;
    }

    fn evaluate_identical_format(&self) -> bool {
        let Some(storage) = self.storage_descriptor.as_deref() else {
            return false;
        };
        // the fast path hands out raw bytes untouched, so nothing may be trimmed on the way in
        if storage.logical_type != LogicalType::Text
            || storage.encoding != self.encoding
            || storage.trim != TrimPolicy::None
            || self.trim != TrimPolicy::None
        {
            return false;
        }
        match self.logical_type {
            LogicalType::Text => true,
            LogicalType::Integer | LogicalType::Float | LogicalType::Decimal | LogicalType::Date => {
                storage.mask == self.mask
                    && storage.decimal_symbol() == self.decimal_symbol()
                    && storage.grouping_symbol() == self.grouping_symbol()
                    && storage.currency_symbol() == self.currency_symbol()
                    && storage.length == self.length
                    && storage.precision == self.precision
                    && storage.time_zone == self.time_zone
            }
            LogicalType::Boolean
            | LogicalType::Bytes
            | LogicalType::Opaque
            | LogicalType::None => false,
        }
    }

    /// The symbols number masks are compiled with.
    pub fn number_symbols(&self) -> NumberSymbols {
        NumberSymbols {
            decimal: self.decimal_symbol(),
            grouping: self.grouping_symbol(),
            currency: self.currency_symbol().to_string(),
        }
    }

    /// The number renderer for this descriptor, compiled on first use.
    pub fn number_renderer(&self) -> StrandResult<&NumberRenderer> {
        self.formats
            .number
            .get_or_init(|| {
                Box::new(match self.mask.as_deref() {
                    Some(mask) => NumberFormat::compile(mask, self.number_symbols())
                        .map(NumberRenderer::Masked)
                        .map_err(|e| Arc::from(e.to_string())),
                    None => Ok(NumberRenderer::Default(DefaultNumberFormat::new(
                        EngineConfig::global().number_layout(),
                        self.length,
                        self.precision,
                        &self.number_symbols(),
                    ))),
                })
            })
            .as_ref()
            .map_err(|msg| strand_err!(Conversion: "column {}: {}", self.name, msg))
    }

    /// The date format for this descriptor, compiled on first use.
    pub fn date_format(&self) -> StrandResult<&DateFormat> {
        self.formats
            .date
            .get_or_init(|| {
                Box::new(
                    DateFormat::compile(
                        self.mask.as_deref().unwrap_or(DEFAULT_DATE_MASK),
                        self.time_zone.as_deref(),
                    )
                    .map_err(|e| Arc::from(e.to_string())),
                )
            })
            .as_ref()
            .map_err(|msg| strand_err!(Conversion: "column {}: {}", self.name, msg))
    }
}

impl Debug for ValueDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueDescriptor")
            .field("name", &self.name)
            .field("logical_type", &self.logical_type)
            .field("storage_mode", &self.storage_mode)
            .field("length", &self.length)
            .field("precision", &self.precision)
            .field("mask", &self.mask)
            .field("locale", &self.locale)
            .field("encoding", &self.encoding)
            .field("trim", &self.trim)
            .field("storage_descriptor", &self.storage_descriptor)
            .field("conversion_descriptor", &self.conversion_descriptor)
            .field("identical_format", &self.identical_format)
            .finish_non_exhaustive()
    }
}

/// Descriptors are equal when every attribute is equal; derived caches are ignored.
impl PartialEq for ValueDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.logical_type == other.logical_type
            && self.storage_mode == other.storage_mode
            && self.length == other.length
            && self.precision == other.precision
            && self.mask == other.mask
            && self.decimal_symbol == other.decimal_symbol
            && self.grouping_symbol == other.grouping_symbol
            && self.currency_symbol == other.currency_symbol
            && self.locale == other.locale
            && self.time_zone == other.time_zone
            && self.encoding == other.encoding
            && self.trim == other.trim
            && self.case_insensitive == other.case_insensitive
            && self.descending == other.descending
            && self.output_padding == other.output_padding
            && self.lenient_dates == other.lenient_dates
            && self.origin == other.origin
            && self.comments == other.comments
            && self.storage_descriptor == other.storage_descriptor
            && self.conversion_descriptor == other.conversion_descriptor
            && self.dictionary == other.dictionary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount() -> ValueDescriptor {
        ValueDescriptor::new("amount", LogicalType::Float)
            .with_mask("#,##0.00")
            .with_length(12)
            .with_precision(2)
    }

    #[test]
    fn derived_storage_is_identical_format() {
        let d = amount().with_deferred_storage();
        assert_eq!(d.storage_mode(), StorageMode::Deferred);
        assert_eq!(d.storage_descriptor().unwrap().logical_type(), LogicalType::Text);
        assert!(d.is_identical_format());
    }

    #[test]
    fn attribute_change_reevaluates_identical_format() {
        let mut d = amount().with_deferred_storage();
        d.set_mask(Some("0.000".to_string()));
        assert!(!d.is_identical_format());
        d.set_mask(Some("#,##0.00".to_string()));
        assert!(d.is_identical_format());
        d.set_trim(TrimPolicy::Both);
        assert!(!d.is_identical_format());
        d.set_trim(TrimPolicy::None);
        assert!(d.is_identical_format());
        d.set_storage_descriptor(Some(ValueDescriptor::new("raw", LogicalType::Integer)));
        assert!(!d.is_identical_format());
    }

    #[test]
    fn booleans_are_never_identical_format() {
        let d = ValueDescriptor::new("flag", LogicalType::Boolean).with_deferred_storage();
        assert!(!d.is_identical_format());
    }

    #[test]
    fn nested_descriptors_stay_one_level_deep() {
        let inner = amount().with_deferred_storage();
        let mut outer = ValueDescriptor::new("amount", LogicalType::Float);
        outer.set_storage_descriptor(Some(inner));
        assert!(outer.storage_descriptor().unwrap().storage_descriptor().is_none());

        let text = amount().derive_conversion_descriptor();
        assert_eq!(text.logical_type(), LogicalType::Text);
        assert_eq!(text.conversion_descriptor(), Some(&amount()));
        assert_eq!(text.mask(), Some("#,##0.00"));
    }

    #[test]
    fn mask_change_rebuilds_formatter() {
        let mut d = amount();
        assert_eq!(d.number_renderer().unwrap().format_f64(1234.5), "1,234.50");
        d.set_mask(Some("0.0".to_string()));
        assert_eq!(d.number_renderer().unwrap().format_f64(1234.5), "1234.5");
        d.set_decimal_symbol(Some(','));
        assert_eq!(d.number_renderer().unwrap().format_f64(1234.5), "1234,5");
    }

    #[test]
    fn bad_mask_reports_on_use() {
        let d = ValueDescriptor::new("n", LogicalType::Integer).with_mask("0#");
        assert!(d.number_renderer().unwrap_err().is_conversion());
        assert!(d.number_renderer().is_err());
    }

    #[test]
    fn clones_share_dictionary_but_not_caches() {
        let d = ValueDescriptor::new("flag", LogicalType::Boolean)
            .with_dictionary([Value::from(false), Value::from(true)]);
        let clone = d.clone();
        assert!(clone.dictionary().ptr_eq(d.dictionary()));
        assert_eq!(clone, d);
    }

    #[test]
    fn symbols_fall_back_to_locale() {
        let d = ValueDescriptor::new("n", LogicalType::Decimal).with_locale("de_DE");
        assert_eq!(d.decimal_symbol(), ',');
        assert_eq!(d.with_decimal_symbol('.').decimal_symbol(), '.');
    }
}
