//! Money type for representing monetary values.
//!
//! Amounts are integers in the currency's minor unit, so pledge totals are
//! exact. Every arithmetic helper is checked and reports overflow or a
//! currency mismatch instead of panicking.

use crate::error::PledgeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currencies a project can be funded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
    JPY,
    CAD,
    AUD,
    NZD,
    CHF,
    MXN,
    SEK,
    NOK,
    DKK,
    HKD,
    SGD,
    PLN,
}

impl Currency {
    /// Get the currency code (e.g., "USD").
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::NZD => "NZD",
            Currency::CHF => "CHF",
            Currency::MXN => "MXN",
            Currency::SEK => "SEK",
            Currency::NOK => "NOK",
            Currency::DKK => "DKK",
            Currency::HKD => "HKD",
            Currency::SGD => "SGD",
            Currency::PLN => "PLN",
        }
    }

    /// Get the currency symbol (e.g., "$").
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::EUR => "\u{20ac}",
            Currency::GBP => "\u{00a3}",
            Currency::JPY => "\u{00a5}",
            Currency::CAD => "CA$",
            Currency::AUD => "AU$",
            Currency::NZD => "NZ$",
            Currency::CHF => "CHF",
            Currency::MXN => "MX$",
            Currency::SEK => "kr",
            Currency::NOK => "kr",
            Currency::DKK => "kr",
            Currency::HKD => "HK$",
            Currency::SGD => "S$",
            Currency::PLN => "z\u{0142}",
        }
    }

    /// Number of decimal places in the minor unit.
    pub fn minor_unit_places(&self) -> u32 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    /// Number of minor units in one major unit (100 for USD, 1 for JPY).
    pub fn minor_units_per_major(&self) -> i64 {
        10_i64.pow(self.minor_unit_places())
    }

    /// Parse a currency code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            "JPY" => Some(Currency::JPY),
            "CAD" => Some(Currency::CAD),
            "AUD" => Some(Currency::AUD),
            "NZD" => Some(Currency::NZD),
            "CHF" => Some(Currency::CHF),
            "MXN" => Some(Currency::MXN),
            "SEK" => Some(Currency::SEK),
            "NOK" => Some(Currency::NOK),
            "DKK" => Some(Currency::DKK),
            "HKD" => Some(Currency::HKD),
            "SGD" => Some(Currency::SGD),
            "PLN" => Some(Currency::PLN),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A monetary value with currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    /// Amount in the smallest currency unit (cents for USD, yen for JPY).
    pub amount_minor: i64,
    /// The currency.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money value from minor units.
    pub fn new(amount_minor: i64, currency: Currency) -> Self {
        Self {
            amount_minor,
            currency,
        }
    }

    /// Create a Money value from whole major units (e.g. dollars).
    pub fn from_major(amount: i64, currency: Currency) -> Self {
        Self::new(amount * currency.minor_units_per_major(), currency)
    }

    /// Parse a decimal string such as `"12.50"` in the given currency.
    ///
    /// More fractional digits than the currency's minor unit allows are
    /// rejected rather than rounded.
    ///
    /// ```
    /// use pledge_commerce::money::{Currency, Money};
    /// let price = Money::parse("49.9", Currency::USD).unwrap();
    /// assert_eq!(price.amount_minor, 4990);
    /// ```
    pub fn parse(input: &str, currency: Currency) -> Result<Self, PledgeError> {
        let invalid = || PledgeError::InvalidAmount(input.to_string());
        let trimmed = input.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));

        let places = currency.minor_unit_places() as usize;
        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty())
            || frac.len() > places
            || !all_digits(whole)
            || !all_digits(frac)
        {
            return Err(invalid());
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac: i64 = if frac.is_empty() {
            0
        } else {
            let scale = 10_i64.pow((places - frac.len()) as u32);
            frac.parse::<i64>().map_err(|_| invalid())? * scale
        };

        let amount = whole
            .checked_mul(currency.minor_units_per_major())
            .and_then(|w| w.checked_add(frac))
            .ok_or(PledgeError::Overflow)?;

        Ok(Self::new(if negative { -amount } else { amount }, currency))
    }

    /// Create a zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Check if this is zero.
    pub fn is_zero(&self) -> bool {
        self.amount_minor == 0
    }

    /// Check if this is positive.
    pub fn is_positive(&self) -> bool {
        self.amount_minor > 0
    }

    /// Check if this is negative.
    pub fn is_negative(&self) -> bool {
        self.amount_minor < 0
    }

    /// Format with the currency symbol and no grouping (e.g., "$49.99").
    pub fn display(&self) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        format!("{}{}{}", sign, self.currency.symbol(), self.unsigned_amount())
    }

    /// Format the bare numeric amount (e.g., "49.99" or "-3.00").
    ///
    /// This is the fallback shown whenever locale formatting fails.
    pub fn display_amount(&self) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        format!("{}{}", sign, self.unsigned_amount())
    }

    fn unsigned_amount(&self) -> String {
        let (whole, frac) = self.major_minor_parts();
        let places = self.currency.minor_unit_places() as usize;
        if places == 0 {
            whole.to_string()
        } else {
            format!("{}.{:0places$}", whole, frac)
        }
    }

    /// Split the absolute amount into whole major units and leftover minor units.
    pub(crate) fn major_minor_parts(&self) -> (u64, u64) {
        let per_major = self.currency.minor_units_per_major() as u64;
        let abs = self.amount_minor.unsigned_abs();
        (abs / per_major, abs % per_major)
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), PledgeError> {
        if self.currency != other.currency {
            return Err(PledgeError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                got: other.currency.code().to_string(),
            });
        }
        Ok(())
    }

    /// Add another Money value.
    pub fn try_add(&self, other: &Money) -> Result<Money, PledgeError> {
        self.ensure_same_currency(other)?;
        self.amount_minor
            .checked_add(other.amount_minor)
            .map(|amount| Money::new(amount, self.currency))
            .ok_or(PledgeError::Overflow)
    }

    /// Subtract another Money value.
    pub fn try_subtract(&self, other: &Money) -> Result<Money, PledgeError> {
        self.ensure_same_currency(other)?;
        self.amount_minor
            .checked_sub(other.amount_minor)
            .map(|amount| Money::new(amount, self.currency))
            .ok_or(PledgeError::Overflow)
    }

    /// Multiply by a quantity.
    pub fn try_multiply(&self, factor: i64) -> Result<Money, PledgeError> {
        self.amount_minor
            .checked_mul(factor)
            .map(|amount| Money::new(amount, self.currency))
            .ok_or(PledgeError::Overflow)
    }

    /// Sum an iterator of Money values, all of which must be in `currency`.
    pub fn try_sum<'a>(
        iter: impl IntoIterator<Item = &'a Money>,
        currency: Currency,
    ) -> Result<Money, PledgeError> {
        iter.into_iter()
            .try_fold(Money::zero(currency), |acc, m| acc.try_add(m))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Integer division rounding halves away from zero.
///
/// `denominator` must be positive.
pub(crate) fn div_round_half_up(numerator: i128, denominator: i128) -> i128 {
    debug_assert!(denominator > 0);
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder.abs() * 2 >= denominator {
        quotient + numerator.signum()
    } else {
        quotient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_major() {
        assert_eq!(Money::from_major(20, Currency::USD).amount_minor, 2000);
        assert_eq!(Money::from_major(500, Currency::JPY).amount_minor, 500);
    }

    #[test]
    fn test_money_parse() {
        assert_eq!(Money::parse("49.99", Currency::USD).unwrap().amount_minor, 4999);
        assert_eq!(Money::parse("15", Currency::USD).unwrap().amount_minor, 1500);
        assert_eq!(Money::parse("0.5", Currency::EUR).unwrap().amount_minor, 50);
        assert_eq!(Money::parse("-3.10", Currency::USD).unwrap().amount_minor, -310);
        assert_eq!(Money::parse("1200", Currency::JPY).unwrap().amount_minor, 1200);
    }

    #[test]
    fn test_money_parse_rejects_garbage() {
        assert!(Money::parse("", Currency::USD).is_err());
        assert!(Money::parse(".", Currency::USD).is_err());
        assert!(Money::parse("1.234", Currency::USD).is_err());
        assert!(Money::parse("12.5", Currency::JPY).is_err());
        assert!(Money::parse("1,000", Currency::USD).is_err());
        assert!(Money::parse("abc", Currency::USD).is_err());
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::new(4999, Currency::USD).display(), "$49.99");
        assert_eq!(Money::new(100, Currency::JPY).display(), "\u{00a5}100");
        assert_eq!(Money::new(-250, Currency::USD).display(), "-$2.50");
        assert_eq!(Money::new(5, Currency::EUR).display_amount(), "0.05");
    }

    #[test]
    fn test_money_addition() {
        let a = Money::new(1000, Currency::USD);
        let b = Money::new(500, Currency::USD);
        assert_eq!(a.try_add(&b).unwrap().amount_minor, 1500);
    }

    #[test]
    fn test_money_currency_mismatch() {
        let usd = Money::new(1000, Currency::USD);
        let eur = Money::new(1000, Currency::EUR);
        assert!(matches!(
            usd.try_add(&eur),
            Err(PledgeError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn test_money_overflow() {
        let big = Money::new(i64::MAX, Currency::USD);
        assert!(matches!(big.try_multiply(2), Err(PledgeError::Overflow)));
        assert!(matches!(
            big.try_add(&Money::new(1, Currency::USD)),
            Err(PledgeError::Overflow)
        ));
    }

    #[test]
    fn test_money_sum() {
        let values = [
            Money::new(100, Currency::USD),
            Money::new(250, Currency::USD),
        ];
        let total = Money::try_sum(values.iter(), Currency::USD).unwrap();
        assert_eq!(total.amount_minor, 350);

        let empty: [Money; 0] = [];
        assert!(Money::try_sum(empty.iter(), Currency::GBP).unwrap().is_zero());
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(div_round_half_up(5, 10), 1);
        assert_eq!(div_round_half_up(4, 10), 0);
        assert_eq!(div_round_half_up(15, 10), 2);
        assert_eq!(div_round_half_up(-15, 10), -2);
        assert_eq!(div_round_half_up(-14, 10), -1);
    }

    #[test]
    fn test_currency_from_code() {
        assert_eq!(Currency::from_code("USD"), Some(Currency::USD));
        assert_eq!(Currency::from_code("eur"), Some(Currency::EUR));
        assert_eq!(Currency::from_code("XYZ"), None);
    }
}
