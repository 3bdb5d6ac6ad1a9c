//! Display-only currency conversion and locale formatting.
//!
//! Totals are always computed in the project currency. A converted amount is
//! derived from an `FxSnapshot` taken when the project was loaded and is only
//! ever shown, never charged.

use crate::error::PledgeError;
use crate::money::{div_round_half_up, Currency, Money};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Scale used to turn the decimal rate into an integer.
const RATE_SCALE: i128 = 1_000_000;

/// A fixed exchange rate captured at project load time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FxSnapshot {
    /// Project currency.
    pub from: Currency,
    /// Backer's display currency.
    pub to: Currency,
    /// Units of `to` per unit of `from`.
    pub rate: f64,
    /// When the rate was captured.
    pub taken_at: DateTime<Utc>,
}

impl FxSnapshot {
    /// Create a snapshot taken now.
    pub fn new(from: Currency, to: Currency, rate: f64) -> Self {
        Self {
            from,
            to,
            rate,
            taken_at: Utc::now(),
        }
    }

    /// Check the rate is usable.
    pub fn validate(&self) -> Result<(), PledgeError> {
        self.scaled_rate().map(|_| ())
    }

    /// Rate as an integer in millionths. Rates that round to zero or do not
    /// fit in an `i64` are malformed.
    fn scaled_rate(&self) -> Result<i128, PledgeError> {
        let scaled = (self.rate * RATE_SCALE as f64).round();
        if !scaled.is_finite() || scaled < 1.0 || scaled > i64::MAX as f64 {
            return Err(PledgeError::FormatError(format!(
                "malformed exchange rate {} for {}->{}",
                self.rate, self.from, self.to
            )));
        }
        Ok(scaled as i128)
    }

    /// Convert a project-currency amount, rounding half-up to the target minor unit.
    pub fn convert(&self, money: &Money) -> Result<Money, PledgeError> {
        let rate_scaled = self.scaled_rate()?;
        if money.currency != self.from {
            return Err(PledgeError::CurrencyMismatch {
                expected: self.from.code().to_string(),
                got: money.currency.code().to_string(),
            });
        }

        let numerator = i128::from(money.amount_minor)
            .checked_mul(rate_scaled)
            .and_then(|n| n.checked_mul(i128::from(self.to.minor_units_per_major())))
            .ok_or(PledgeError::Overflow)?;
        let denominator = RATE_SCALE * i128::from(self.from.minor_units_per_major());
        let converted = div_round_half_up(numerator, denominator);

        let amount = i64::try_from(converted).map_err(|_| PledgeError::Overflow)?;
        Ok(Money::new(amount, self.to))
    }
}

/// Formats money for a locale.
pub trait MoneyFormatter {
    /// Format `money` for `locale` (e.g. "en-US").
    fn format(&self, money: &Money, locale: &str) -> Result<String, PledgeError>;

    /// Format a raw minor-unit amount given a currency code.
    fn format_code(&self, amount_minor: i64, code: &str, locale: &str) -> Result<String, PledgeError> {
        let currency = Currency::from_code(code)
            .ok_or_else(|| PledgeError::FormatError(format!("unknown currency code '{}'", code)))?;
        self.format(&Money::new(amount_minor, currency), locale)
    }

    /// Format the converted display amount, e.g. "About €9.25".
    fn format_converted(&self, money: &Money, fx: &FxSnapshot, locale: &str) -> Result<String, PledgeError> {
        let converted = fx.convert(money)?;
        Ok(format!("About {}", self.format(&converted, locale)?))
    }
}

/// Separator conventions for a language.
struct LocaleStyle {
    group: &'static str,
    decimal: char,
    symbol_after: bool,
}

fn locale_style(locale: &str) -> Option<LocaleStyle> {
    let language = locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match language.as_str() {
        "en" | "ja" | "zh" | "ko" => Some(LocaleStyle {
            group: ",",
            decimal: '.',
            symbol_after: false,
        }),
        "de" | "es" | "it" | "nl" | "pt" | "da" | "pl" => Some(LocaleStyle {
            group: ".",
            decimal: ',',
            symbol_after: true,
        }),
        "fr" | "sv" | "nb" | "no" | "fi" => Some(LocaleStyle {
            group: "\u{a0}",
            decimal: ',',
            symbol_after: true,
        }),
        _ => None,
    }
}

fn group_digits(value: u64, separator: &str) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

/// Formatter covering the locales the app ships translations for.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFormatter;

impl MoneyFormatter for StandardFormatter {
    fn format(&self, money: &Money, locale: &str) -> Result<String, PledgeError> {
        let style = locale_style(locale)
            .ok_or_else(|| PledgeError::FormatError(format!("unsupported locale '{}'", locale)))?;

        let (whole, frac) = money.major_minor_parts();
        let places = money.currency.minor_unit_places() as usize;
        let mut number = group_digits(whole, style.group);
        if places > 0 {
            number.push(style.decimal);
            number.push_str(&format!("{:0places$}", frac));
        }

        let sign = if money.is_negative() { "-" } else { "" };
        let symbol = money.currency.symbol();
        Ok(if style.symbol_after {
            format!("{}{}\u{a0}{}", sign, number, symbol)
        } else {
            format!("{}{}{}", sign, symbol, number)
        })
    }
}

/// Format `money`, falling back to the bare numeric amount on failure.
pub fn format_or_raw(formatter: &dyn MoneyFormatter, money: &Money, locale: &str) -> String {
    formatter.format(money, locale).unwrap_or_else(|e| {
        warn!(error = %e, "money formatting failed, showing raw amount");
        money.display_amount()
    })
}

/// Format the converted amount, falling back to the unconverted bare amount.
pub fn format_converted_or_raw(
    formatter: &dyn MoneyFormatter,
    money: &Money,
    fx: &FxSnapshot,
    locale: &str,
) -> String {
    formatter
        .format_converted(money, fx, locale)
        .unwrap_or_else(|e| {
            warn!(error = %e, "converted amount unavailable, showing raw amount");
            money.display_amount()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_exact() {
        let fx = FxSnapshot::new(Currency::USD, Currency::EUR, 0.925);
        let converted = fx.convert(&Money::new(1000, Currency::USD)).unwrap();
        assert_eq!(converted, Money::new(925, Currency::EUR));
    }

    #[test]
    fn test_convert_rounds_half_up() {
        let fx = FxSnapshot::new(Currency::USD, Currency::EUR, 0.5);
        // 0.005 EUR rounds up to one cent
        assert_eq!(fx.convert(&Money::new(1, Currency::USD)).unwrap().amount_minor, 1);
        // 0.015 EUR rounds up to two cents
        assert_eq!(fx.convert(&Money::new(3, Currency::USD)).unwrap().amount_minor, 2);
    }

    #[test]
    fn test_convert_to_zero_decimal_currency() {
        let fx = FxSnapshot::new(Currency::USD, Currency::JPY, 150.5);
        // 12.34 * 150.5 = 1857.17
        let yen = fx.convert(&Money::new(1234, Currency::USD)).unwrap();
        assert_eq!(yen, Money::new(1857, Currency::JPY));
    }

    #[test]
    fn test_convert_rejects_bad_input() {
        let fx = FxSnapshot::new(Currency::USD, Currency::EUR, 0.0);
        assert!(fx.convert(&Money::new(100, Currency::USD)).is_err());

        let fx = FxSnapshot::new(Currency::USD, Currency::EUR, 0.9);
        assert!(matches!(
            fx.convert(&Money::new(100, Currency::GBP)),
            Err(PledgeError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn test_format_locales() {
        let f = StandardFormatter;
        let money = Money::new(123_456_789, Currency::USD);
        assert_eq!(f.format(&money, "en-US").unwrap(), "$1,234,567.89");

        let euros = Money::new(123_456, Currency::EUR);
        assert_eq!(f.format(&euros, "de-DE").unwrap(), "1.234,56\u{a0}\u{20ac}");
        assert_eq!(f.format(&euros, "fr_FR").unwrap(), "1\u{a0}234,56\u{a0}\u{20ac}");

        let yen = Money::new(5000, Currency::JPY);
        assert_eq!(f.format(&yen, "ja-JP").unwrap(), "\u{a5}5,000");
    }

    #[test]
    fn test_format_code() {
        let f = StandardFormatter;
        assert_eq!(f.format_code(1500, "usd", "en").unwrap(), "$15.00");
        assert!(matches!(
            f.format_code(1500, "", "en"),
            Err(PledgeError::FormatError(_))
        ));
    }

    #[test]
    fn test_format_converted() {
        let f = StandardFormatter;
        let fx = FxSnapshot::new(Currency::USD, Currency::GBP, 0.8);
        let text = f
            .format_converted(&Money::new(4000, Currency::USD), &fx, "en-GB")
            .unwrap();
        assert_eq!(text, "About \u{a3}32.00");
    }

    #[test]
    fn test_failures_degrade_to_raw_amount() {
        let f = StandardFormatter;
        let money = Money::new(4000, Currency::USD);
        assert_eq!(format_or_raw(&f, &money, "xx-YY"), "40.00");

        let bad_fx = FxSnapshot::new(Currency::USD, Currency::EUR, f64::NAN);
        assert_eq!(format_converted_or_raw(&f, &money, &bad_fx, "en-US"), "40.00");
    }

    #[test]
    fn test_out_of_range_rates_are_malformed() {
        let f = StandardFormatter;
        let money = Money::new(4000, Currency::USD);

        let huge = FxSnapshot::new(Currency::USD, Currency::EUR, 1e30);
        assert!(huge.validate().is_err());
        assert_eq!(format_converted_or_raw(&f, &money, &huge, "en-US"), "40.00");

        // rounds to zero millionths
        let tiny = FxSnapshot::new(Currency::USD, Currency::EUR, 1e-9);
        assert!(matches!(tiny.validate(), Err(PledgeError::FormatError(_))));
        assert_eq!(format_converted_or_raw(&f, &money, &tiny, "en-US"), "40.00");
    }

    #[test]
    fn test_convert_overflow_is_an_error() {
        let fx = FxSnapshot::new(Currency::USD, Currency::JPY, 1e12);
        assert!(fx.validate().is_ok());
        assert!(matches!(
            fx.convert(&Money::new(i64::MAX, Currency::USD)),
            Err(PledgeError::Overflow)
        ));
    }
}
