//! Exact token amounts.
//!
//! Explorers report transfer values as integer strings in the token's smallest unit, together with (or implied by) a
//! decimal exponent. Orders are matched on exact amount equality, so the conversion must never pass through floating
//! point. [`Amount`] wraps an arbitrary-precision decimal and [`normalize`] performs the conversion.
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use bigdecimal::{BigDecimal, Zero};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    sqlite::{Sqlite, SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef},
    Decode,
    Encode,
    Type,
};
use thiserror::Error;

pub const USDT_CURRENCY_CODE: &str = "USDT";
/// The currency merchants price their orders in
pub const FIAT_CURRENCY_CODE: &str = "CNY";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Not a valid decimal amount: '{0}'")]
pub struct MalformedAmountError(pub String);

//--------------------------------------        Amount         ---------------------------------------------------------
/// An exact decimal amount, e.g. `12.345` USDT or a fiat order total.
///
/// Equality and ordering are numeric, so `12.345000 == 12.345`. Values are kept in canonical form (no trailing
/// fractional zeros), which is also the form written to the database.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(BigDecimal);

impl Amount {
    pub fn new(value: BigDecimal) -> Self {
        Self(canonical(value))
    }

    pub fn zero() -> Self {
        Self(BigDecimal::zero())
    }

    pub fn value(&self) -> &BigDecimal {
        &self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > BigDecimal::zero()
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::zero()
    }
}

fn canonical(value: BigDecimal) -> BigDecimal {
    let normalized = value.normalized();
    let (_, scale) = normalized.as_bigint_and_exponent();
    if scale < 0 {
        normalized.with_scale(0)
    } else {
        normalized
    }
}

// Always plain notation. BigDecimal's own Display switches to exponent form for very small and very large values.
impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.to_plain_string())
    }
}

impl FromStr for Amount {
    type Err = MalformedAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !is_decimal_numeral(s) {
            return Err(MalformedAmountError(s.to_string()));
        }
        BigDecimal::from_str(s).map(Self::new).map_err(|_| MalformedAmountError(s.to_string()))
    }
}

/// `[+-]?digits[.digits]`, with at least one digit. Exponent notation is deliberately rejected for raw input.
fn is_decimal_numeral(s: &str) -> bool {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let mut parts = unsigned.splitn(2, '.');
    let int_part = parts.next().unwrap_or_default();
    let frac_part = parts.next().unwrap_or_default();
    let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
    (!int_part.is_empty() || !frac_part.is_empty()) && all_digits(int_part) && all_digits(frac_part)
}

/// Converts a chain-native amount into a [`Amount`] by dividing by `10^exponent`.
///
/// The division is exact: the decimal point is moved, no rounding takes place.
pub fn normalize(raw: &str, exponent: u32) -> Result<Amount, MalformedAmountError> {
    let units = Amount::from_str(raw)?;
    let divisor_inverse = BigDecimal::new(1.into(), i64::from(exponent));
    Ok(Amount::new(units.0 * divisor_inverse))
}

//--------------------------------------   Serialization     ---------------------------------------------------------
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        BigDecimal::from_str(s.trim()).map(Self::new).map_err(de::Error::custom)
    }
}

// Amounts are stored as TEXT. SQLite has no exact decimal type and REAL would reintroduce rounding.
impl Type<Sqlite> for Amount {
    fn type_info() -> SqliteTypeInfo {
        <str as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <str as Type<Sqlite>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Sqlite> for Amount {
    fn encode_by_ref(&self, buf: &mut Vec<SqliteArgumentValue<'q>>) -> IsNull {
        <String as Encode<'q, Sqlite>>::encode(self.to_string(), buf)
    }
}

impl<'r> Decode<'r, Sqlite> for Amount {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let s = <&str as Decode<Sqlite>>::decode(value)?;
        let amount = BigDecimal::from_str(s.trim())?;
        Ok(Self::new(amount))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn amount(s: &str) -> Amount {
        Amount::from_str(s).expect("valid amount")
    }

    #[test]
    fn normalize_six_decimals() {
        assert_eq!(normalize("1000000", 6).unwrap(), amount("1"));
        assert_eq!(normalize("12345000", 6).unwrap(), amount("12.345"));
        assert_eq!(normalize("12345000", 6).unwrap().to_string(), "12.345");
    }

    #[test]
    fn normalize_eighteen_decimals() {
        assert_eq!(normalize("1500000000000000000", 18).unwrap(), amount("1.5"));
        assert_eq!(normalize("1", 18).unwrap(), amount("0.000000000000000001"));
    }

    #[test]
    fn normalize_is_exact_beyond_float_precision() {
        let big = normalize("123456789012345678901234567890123", 18).unwrap();
        assert_eq!(big, amount("123456789012345.678901234567890123"));
        assert_ne!(big, amount("123456789012345.678901234567890124"));
    }

    #[test]
    fn tiny_amounts_print_in_plain_notation() {
        assert_eq!(normalize("1", 18).unwrap().to_string(), "0.000000000000000001");
        assert_eq!(normalize("123", 12).unwrap().to_string(), "0.000000000123");
        assert_eq!(normalize("1500000000000000000", 18).unwrap().to_string(), "1.5");
        assert_eq!(normalize("12345000", 6).unwrap().to_string(), "12.345");
        let json = serde_json::to_string(&normalize("5", 18).unwrap()).unwrap();
        assert_eq!(json, "\"0.000000000000000005\"");
    }

    #[test]
    fn large_amounts_print_in_plain_notation() {
        assert_eq!(amount("1000000000000000000000000").to_string(), "1000000000000000000000000");
        assert_eq!(normalize("120000000000000000000000000", 0).unwrap().to_string(), "120000000000000000000000000");
    }

    #[test]
    fn normalize_zero_exponent() {
        assert_eq!(normalize("42", 0).unwrap(), amount("42"));
        assert_eq!(normalize("4200", 2).unwrap().to_string(), "42");
    }

    #[test]
    fn equality_ignores_trailing_zeros() {
        assert_eq!(amount("12.345000"), amount("12.345"));
        assert_eq!(amount("10"), amount("10.00"));
        assert_eq!(amount("10.00").to_string(), "10");
    }

    #[test]
    fn malformed_amounts() {
        for bad in ["", "abc", "12,5", "1e6", "0x10", "1.2.3", ".", "-", "NaN"] {
            assert_eq!(normalize(bad, 6), Err(MalformedAmountError(bad.to_string())), "{bad} should be rejected");
        }
        assert!(normalize(" 1000000 ", 6).is_ok());
    }

    #[test]
    fn serde_uses_strings() {
        let a = amount("12.345000");
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"12.345\"");
        let back: Amount = serde_json::from_str("\"12.3450\"").unwrap();
        assert_eq!(back, a);
    }
}
