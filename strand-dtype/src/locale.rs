use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// A locale tag such as `en_US` or `de-DE`, resolving the default number symbols for masks.
///
/// Only the symbols are locale sensitive; month and day names are always English.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Locale {
    tag: Arc<str>,
}

impl Default for Locale {
    fn default() -> Self {
        Self::new("en_US")
    }
}

impl Locale {
    /// Create a locale from its tag. Unknown tags fall back to English symbols.
    pub fn new(tag: impl Into<Arc<str>>) -> Self {
        Self { tag: tag.into() }
    }

    /// The tag this locale was created from.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    fn language(&self) -> String {
        self.tag
            .split(['_', '-'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    fn country(&self) -> String {
        self.tag
            .split(['_', '-'])
            .nth(1)
            .unwrap_or_default()
            .to_ascii_uppercase()
    }

    /// The default decimal separator.
    pub fn decimal_symbol(&self) -> char {
        if self.country() == "CH" {
            return '.';
        }
        match self.language().as_str() {
            "de" | "fr" | "it" | "es" | "nl" | "pt" | "da" | "sv" | "nb" | "fi" | "pl" | "cs"
            | "ru" | "tr" => ',',
            _ => '.',
        }
    }

    /// The default grouping separator.
    pub fn grouping_symbol(&self) -> char {
        if self.country() == "CH" {
            return '\'';
        }
        match self.language().as_str() {
            "de" | "it" | "es" | "nl" | "pt" | "da" | "tr" => '.',
            "fr" | "sv" | "nb" | "fi" | "pl" | "cs" | "ru" => ' ',
            _ => ',',
        }
    }

    /// The default currency symbol.
    pub fn currency_symbol(&self) -> &'static str {
        match self.country().as_str() {
            "US" | "CA" | "AU" | "NZ" => "$",
            "GB" => "\u{a3}",
            "JP" | "CN" => "\u{a5}",
            "CH" => "CHF",
            "IN" => "\u{20b9}",
            "" => match self.language().as_str() {
                "en" => "$",
                _ => "\u{a4}",
            },
            _ => "\u{20ac}",
        }
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.tag)
    }
}

impl From<&str> for Locale {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("en_US", '.', ',', "$")]
    #[case("de_DE", ',', '.', "\u{20ac}")]
    #[case("fr-FR", ',', ' ', "\u{20ac}")]
    #[case("de_CH", '.', '\'', "CHF")]
    #[case("xx", '.', ',', "\u{a4}")]
    fn symbols(
        #[case] tag: &str,
        #[case] decimal: char,
        #[case] grouping: char,
        #[case] currency: &str,
    ) {
        let locale = Locale::new(tag);
        assert_eq!(locale.decimal_symbol(), decimal);
        assert_eq!(locale.grouping_symbol(), grouping);
        assert_eq!(locale.currency_symbol(), currency);
    }
}
