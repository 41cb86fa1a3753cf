//! Exact conversion between `rust_decimal::Decimal` and BSON `Decimal128`.
//!
//! Both directions go through the decimal string form. Stored values that
//! `Decimal` cannot hold exactly (NaN, infinities, scale above 28, magnitude
//! above 2^96) are rejected.

use mongodb::bson::Decimal128;
use rust_decimal::Decimal;

use crate::error::{CatalogError, CatalogResult};

pub fn to_decimal128(value: Decimal) -> CatalogResult<Decimal128> {
    value.to_string().parse::<Decimal128>().map_err(|err| {
        CatalogError::Serialization(format!("cannot encode {} as Decimal128: {}", value, err))
    })
}

pub fn from_decimal128(value: Decimal128) -> CatalogResult<Decimal> {
    let text = value.to_string();
    Decimal::from_str_exact(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|err| {
            CatalogError::Serialization(format!("unsupported Decimal128 value {}: {}", text, err))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn round_trip(text: &str) -> Decimal {
        let value = Decimal::from_str(text).unwrap();
        from_decimal128(to_decimal128(value).unwrap()).unwrap()
    }

    fn stored(text: &str) -> Decimal128 {
        Decimal128::from_str(text).unwrap()
    }

    #[test]
    fn test_values_survive_conversion_with_scale() {
        for text in ["0", "19.99", "-0.5", "1000000", "12.50", "0.0000000000000000000000000001"] {
            let back = round_trip(text);
            assert_eq!(back, Decimal::from_str(text).unwrap());
            assert_eq!(back.to_string(), text);
        }
        assert_eq!(round_trip("79228162514264337593543950335"), Decimal::MAX);
        assert_eq!(round_trip("-79228162514264337593543950335"), Decimal::MIN);
    }

    #[test]
    fn test_one_uses_canonical_encoding() {
        let expected: u128 = 0x3040_0000_0000_0000_0000_0000_0000_0001;
        assert_eq!(
            to_decimal128(Decimal::ONE).unwrap().bytes(),
            expected.to_le_bytes()
        );
    }

    #[test]
    fn test_positive_exponent_is_expanded() {
        assert_eq!(from_decimal128(stored("1.2E+4")).unwrap(), Decimal::from(12_000));
        assert_eq!(from_decimal128(stored("5E+3")).unwrap(), Decimal::from(5_000));
    }

    #[test]
    fn test_small_exponent_keeps_scale() {
        let value = from_decimal128(stored("5E-10")).unwrap();
        assert_eq!(value, Decimal::new(5, 10));
        assert_eq!(value.scale(), 10);
    }

    #[test]
    fn test_unrepresentable_values_are_rejected() {
        for text in ["NaN", "Infinity", "-Infinity", "7E-40", "1E+40"] {
            assert!(
                matches!(from_decimal128(stored(text)), Err(CatalogError::Serialization(_))),
                "{} should be rejected",
                text
            );
        }
    }
}
