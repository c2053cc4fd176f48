//! Locale-aware currency masking for money input fields.
//!
//! The codec only lives at the input boundary: the entity model and the
//! summary engine see [`Money`] values, never display strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use flatmoney_domain::{Decimal, Money, MoneyRangeError};

/// Formats currency amounts for presentation.
pub trait CurrencyFormatter: Send + Sync {
    fn format_amount(&self, amount: Money) -> String;

    /// Formats an exact share after rounding it to the cent.
    fn format_share(&self, share: Decimal) -> String {
        self.format_amount(Money::rounded_from(share))
    }
}

/// Separators and symbol used when rendering amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleConfig {
    pub language_tag: String,
    pub decimal_separator: char,
    pub grouping_separator: char,
    pub currency_symbol: String,
}

impl LocaleConfig {
    pub fn pt_br() -> Self {
        Self {
            language_tag: "pt-BR".into(),
            decimal_separator: ',',
            grouping_separator: '.',
            currency_symbol: "R$".into(),
        }
    }

    pub fn en_us() -> Self {
        Self {
            language_tag: "en-US".into(),
            decimal_separator: '.',
            grouping_separator: ',',
            currency_symbol: "$".into(),
        }
    }

    /// Resolves a language tag such as `pt-BR` or `en_us`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().replace('_', "-").to_ascii_lowercase().as_str() {
            "pt-br" | "pt" => Some(Self::pt_br()),
            "en-us" | "en" => Some(Self::en_us()),
            _ => None,
        }
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self::pt_br()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MaskError {
    #[error("amount has more digits than can be represented exactly")]
    TooLarge,
}

impl From<MoneyRangeError> for MaskError {
    fn from(_: MoneyRangeError) -> Self {
        MaskError::TooLarge
    }
}

/// Renders `amount` with two fractional digits and locale grouping (`1.500,75`).
pub fn format(amount: Money, locale: &LocaleConfig) -> String {
    let whole = amount.whole_units().unsigned_abs().to_string();
    let mut body = group_digits(&whole, locale.grouping_separator);
    body.push(locale.decimal_separator);
    body.push_str(&format!("{:02}", amount.cents_part()));
    if amount.is_negative() {
        body.insert(0, '-');
    }
    body
}

/// [`format`] with the locale's currency symbol (`R$ 1.500,75`, `-R$ 83,33`).
pub fn format_currency(amount: Money, locale: &LocaleConfig) -> String {
    let sign = if amount.is_negative() { "-" } else { "" };
    format!(
        "{}{} {}",
        sign,
        locale.currency_symbol,
        format(amount.abs(), locale)
    )
}

/// Keeps only ASCII digits and reads them as a count of cents. No digits reads as zero.
///
/// Input whose value exceeds the representable range is rejected rather than clamped.
pub fn parse_digits(raw: &str) -> Result<Money, MaskError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Ok(Money::ZERO);
    }
    // MAX_CENTS has 14 digits; anything longer cannot fit.
    if significant.len() > 14 {
        return Err(MaskError::TooLarge);
    }
    let cents: i64 = significant.parse().map_err(|_| MaskError::TooLarge)?;
    Ok(Money::checked_from_cents(cents)?)
}

/// Re-masks a field after a keystroke: `parse_digits` followed by `format`.
pub fn reformat_on_keystroke(raw: &str, locale: &LocaleConfig) -> Result<String, MaskError> {
    parse_digits(raw).map(|amount| format(amount, locale))
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    let lead = digits.len() % 3;
    for (index, ch) in digits.chars().enumerate() {
        if index != 0 && (index + 3 - lead) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

/// [`CurrencyFormatter`] bound to a locale.
#[derive(Debug, Clone, Default)]
pub struct CurrencyMask {
    locale: LocaleConfig,
}

impl CurrencyMask {
    pub fn new(locale: LocaleConfig) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> &LocaleConfig {
        &self.locale
    }

    pub fn format(&self, amount: Money) -> String {
        format(amount, &self.locale)
    }

    pub fn reformat(&self, raw: &str) -> Result<String, MaskError> {
        reformat_on_keystroke(raw, &self.locale)
    }

    /// Opens an input field showing `initial`.
    pub fn field(&self, initial: Money) -> MoneyField {
        MoneyField::new(initial, self.locale.clone())
    }
}

impl CurrencyFormatter for CurrencyMask {
    fn format_amount(&self, amount: Money) -> String {
        format_currency(amount, &self.locale)
    }
}

/// State of one masked money input.
///
/// The display string is always either empty (focused, nothing typed) or a
/// formatted amount, and `value` is always the amount the display represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoneyField {
    display: String,
    value: Money,
    locale: LocaleConfig,
}

impl MoneyField {
    pub fn new(initial: Money, locale: LocaleConfig) -> Self {
        Self {
            display: format(initial, &locale),
            value: initial,
            locale,
        }
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn value(&self) -> Money {
        self.value
    }

    /// Applies the raw field contents after a keystroke or paste.
    ///
    /// On overflow the previous display and value are kept.
    pub fn input(&mut self, raw: &str) -> Result<&str, MaskError> {
        let amount = parse_digits(raw)?;
        self.value = amount;
        self.display = format(amount, &self.locale);
        Ok(&self.display)
    }

    /// Clears a zero field so fresh digits can be typed.
    pub fn focus(&mut self) {
        if self.value.is_zero() {
            self.display.clear();
        }
    }

    /// Restores `0,00` when the field is left empty.
    pub fn blur(&mut self) {
        if self.display.is_empty() {
            self.value = Money::ZERO;
            self.display = format(Money::ZERO, &self.locale);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn br() -> LocaleConfig {
        LocaleConfig::pt_br()
    }

    #[test]
    fn keystroke_digits_become_grouped_amount() {
        let amount = parse_digits("150075").unwrap();
        assert_eq!(amount.cents(), 150_075);
        assert_eq!(format(amount, &br()), "1.500,75");
        assert_eq!(reformat_on_keystroke("150075", &br()).unwrap(), "1.500,75");
    }

    #[test]
    fn groups_by_thousands() {
        let cases = [
            (0, "0,00"),
            (5, "0,05"),
            (99_999, "999,99"),
            (100_000, "1.000,00"),
            (123_456_789, "1.234.567,89"),
            (-8_333, "-83,33"),
        ];
        for (cents, expected) in cases {
            assert_eq!(format(Money::from_cents(cents), &br()), expected);
        }
        assert_eq!(
            format(Money::from_cents(123_456_789), &LocaleConfig::en_us()),
            "1,234,567.89"
        );
    }

    #[test]
    fn strips_everything_but_digits() {
        assert_eq!(parse_digits("R$ 1a2b3").unwrap().cents(), 123);
        assert_eq!(parse_digits("abc").unwrap(), Money::ZERO);
        assert_eq!(parse_digits("").unwrap(), Money::ZERO);
        assert_eq!(parse_digits("000042").unwrap().cents(), 42);
    }

    #[test]
    fn rejects_oversized_input() {
        assert_eq!(parse_digits("99999999999999").unwrap().cents(), 99_999_999_999_999);
        assert_eq!(parse_digits("100000000000000"), Err(MaskError::TooLarge));
        assert_eq!(
            parse_digits("9999999999999999999999999"),
            Err(MaskError::TooLarge)
        );
    }

    #[test]
    fn currency_display_carries_symbol() {
        assert_eq!(format_currency(Money::from_cents(150_075), &br()), "R$ 1.500,75");
        assert_eq!(format_currency(Money::from_cents(-8_333), &br()), "-R$ 83,33");
        assert_eq!(
            CurrencyMask::new(LocaleConfig::en_us()).format_amount(Money::from_cents(10)),
            "$ 0.10"
        );
    }

    #[test]
    fn field_clears_on_focus_only_when_zero() {
        let mut field = CurrencyMask::default().field(Money::ZERO);
        assert_eq!(field.display(), "0,00");
        field.focus();
        assert_eq!(field.display(), "");
        field.blur();
        assert_eq!(field.display(), "0,00");

        field.input("1").unwrap();
        field.input("0,012").unwrap();
        assert_eq!(field.display(), "0,12");
        field.focus();
        assert_eq!(field.display(), "0,12");
        field.blur();
        assert_eq!(field.value().cents(), 12);
    }

    #[test]
    fn field_keeps_previous_value_on_overflow() {
        let mut field = CurrencyMask::default().field(Money::from_cents(150_075));
        let err = field.input("1234567890123456").unwrap_err();
        assert_eq!(err, MaskError::TooLarge);
        assert_eq!(field.display(), "1.500,75");
        assert_eq!(field.value().cents(), 150_075);
    }

    #[test]
    fn locale_tags_resolve() {
        assert_eq!(LocaleConfig::from_tag("pt_BR"), Some(LocaleConfig::pt_br()));
        assert_eq!(LocaleConfig::from_tag("EN-us"), Some(LocaleConfig::en_us()));
        assert_eq!(LocaleConfig::from_tag("fr-FR"), None);
    }
}
