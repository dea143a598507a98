//! Serialize token amounts as decimal strings.
//!
//! TOML and JSON consumers lose precision on integers above 2^53, so every
//! `BigUint` crossing a serialization boundary travels as a string.

use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer, Serializer};
use std::str::FromStr;

pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_str_radix(10))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(text) => BigUint::from_str(text.trim().replace('_', "").as_str())
            .map_err(|e| de::Error::custom(format!("invalid amount '{}': {}", text, e))),
        Raw::Number(n) => Ok(BigUint::from(n)),
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Wrapper {
        #[serde(with = "super")]
        amount: BigUint,
    }

    #[test]
    fn test_large_amount_as_string() {
        let amount: BigUint = "123456789012345678901234567890".parse().unwrap();
        let json = serde_json::to_string(&Wrapper { amount }).unwrap();
        assert_eq!(json, r#"{"amount":"123456789012345678901234567890"}"#);
    }

    #[test]
    fn test_accepts_number_and_underscores() {
        let from_number: Wrapper = serde_json::from_str(r#"{"amount":42}"#).unwrap();
        assert_eq!(from_number.amount, BigUint::from(42u32));

        let from_text: Wrapper = toml::from_str(r#"amount = "1_000_000""#).unwrap();
        assert_eq!(from_text.amount, BigUint::from(1_000_000u32));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"amount":"12ab"}"#).is_err());
    }
}
