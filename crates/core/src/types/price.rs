//! Type-safe price representation using decimal arithmetic.
//!
//! The catalog reports amounts as integers in the currency's minor unit
//! (centavos for BRL). [`Price::from_minor_units`] converts them to a
//! [`Decimal`] in major units, and [`CurrencyFormat`] renders them the way
//! the storefront displays them.
//!
//! ```rust
//! use vitrine_core::{CurrencyCode, CurrencyFormat, Price};
//!
//! let price = Price::from_minor_units(10_000, CurrencyCode::BRL);
//! assert_eq!(CurrencyFormat::pt_br_brl().format(&price), "R$ 100,00");
//! ```

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of fraction digits shown for every supported currency.
const FRACTION_DIGITS: u32 = 2;

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., reais, not centavos).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price from an amount in minor units (divides by 100).
    #[must_use]
    pub fn from_minor_units(minor_units: i64, currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::new(minor_units, FRACTION_DIGITS), currency_code)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    BRL,
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// The ISO code in upper case.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::BRL => "BRL",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }

    /// Display symbol as used by the given locale.
    #[must_use]
    pub const fn symbol(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Self::BRL, _) => "R$",
            (Self::USD, Locale::PtBr) => "US$",
            (Self::USD, Locale::EnUs) => "$",
            (Self::EUR, _) => "\u{20ac}",
            (Self::GBP, _) => "\u{00a3}",
            (Self::CAD, _) => "CA$",
            (Self::AUD, _) => "A$",
        }
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A currency code the storefront does not know how to display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown currency code: {0}")]
pub struct UnknownCurrency(pub String);

impl FromStr for CurrencyCode {
    type Err = UnknownCurrency;

    /// Parse a currency code, ignoring case (the provider reports `"brl"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BRL" => Ok(Self::BRL),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            _ => Err(UnknownCurrency(s.to_string())),
        }
    }
}

/// Display locale for number formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    /// Brazilian Portuguese: `R$ 1.234,56`
    #[default]
    PtBr,
    /// US English: `$1,234.56`
    EnUs,
}

impl Locale {
    const fn group_separator(self) -> char {
        match self {
            Self::PtBr => '.',
            Self::EnUs => ',',
        }
    }

    const fn decimal_separator(self) -> char {
        match self {
            Self::PtBr => ',',
            Self::EnUs => '.',
        }
    }

    /// Text placed between the symbol and the digits.
    const fn symbol_gap(self) -> &'static str {
        match self {
            Self::PtBr => " ",
            Self::EnUs => "",
        }
    }
}

/// Currency formatter for a fixed locale and currency.
///
/// The currency of the formatter wins over the currency carried by the
/// price: the storefront displays every price in its configured currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyFormat {
    locale: Locale,
    currency: CurrencyCode,
}

impl CurrencyFormat {
    /// Create a formatter.
    #[must_use]
    pub const fn new(locale: Locale, currency: CurrencyCode) -> Self {
        Self { locale, currency }
    }

    /// The storefront's formatter: Brazilian Portuguese, Brazilian Real.
    #[must_use]
    pub const fn pt_br_brl() -> Self {
        Self::new(Locale::PtBr, CurrencyCode::BRL)
    }

    /// Format a price.
    #[must_use]
    pub fn format(&self, price: &Price) -> String {
        self.format_amount(price.amount)
    }

    /// Format an amount given in minor units.
    #[must_use]
    pub fn format_minor_units(&self, minor_units: i64) -> String {
        self.format(&Price::from_minor_units(minor_units, self.currency))
    }

    fn format_amount(&self, amount: Decimal) -> String {
        let rounded =
            amount.round_dp_with_strategy(FRACTION_DIGITS, RoundingStrategy::MidpointAwayFromZero);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();

        let digits = format!("{:.2}", rounded.abs());
        let (integer, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

        format!(
            "{sign}{symbol}{gap}{integer}{decimal}{fraction}",
            sign = if negative { "-" } else { "" },
            symbol = self.currency.symbol(self.locale),
            gap = self.locale.symbol_gap(),
            integer = group_thousands(integer, self.locale.group_separator()),
            decimal = self.locale.decimal_separator(),
        )
    }
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::pt_br_brl()
    }
}

/// Insert a separator every three digits, counting from the right.
fn group_thousands(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}
