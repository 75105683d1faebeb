//! Serde helpers for `f64` fields that may hold non-finite values.
//!
//! JSON has no literal for infinity or NaN, and `serde_json` writes them as `null`,
//! which it then refuses to read back as a number. These helpers write finite
//! values as plain JSON numbers and non-finite ones as the strings `"Infinity"`,
//! `"-Infinity"` and `"NaN"`.
use std::collections::HashMap;

use serde::de::Error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const INFINITY: &str = "Infinity";
const NEG_INFINITY: &str = "-Infinity";
const NAN: &str = "NaN";

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum Number {
    Finite(f64),
    Named(String),
}

impl Number {
    fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Number::Finite(value)
        } else if value.is_nan() {
            Number::Named(NAN.into())
        } else if value > 0.0 {
            Number::Named(INFINITY.into())
        } else {
            Number::Named(NEG_INFINITY.into())
        }
    }

    fn into_f64<E: Error>(self) -> Result<f64, E> {
        match self {
            Number::Finite(value) => Ok(value),
            Number::Named(name) => match name.as_str() {
                INFINITY => Ok(f64::INFINITY),
                NEG_INFINITY => Ok(f64::NEG_INFINITY),
                NAN => Ok(f64::NAN),
                other => Err(E::custom(format!("invalid number name {other:?}"))),
            },
        }
    }
}

/// Function that serializes a possibly non-finite `f64`
///
/// This is intended for use with serde derive's
/// `#[serde(serialize_with = "path")]` field attribute.
pub fn serialize_f64<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    Number::from_f64(*value).serialize(serializer)
}

/// Function that deserializes what [`serialize_f64`] writes
///
/// This is intended for use with serde derive's
/// `#[serde(deserialize_with = "path")]` field attribute.
pub fn deserialize_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Number::deserialize(deserializer)?.into_f64()
}

/// Function that serializes a name to `f64` map whose values may be non-finite
pub fn serialize_f64_map<S>(map: &HashMap<String, f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(map.iter().map(|(name, value)| (name, Number::from_f64(*value))))
}

/// Function that deserializes what [`serialize_f64_map`] writes
pub fn deserialize_f64_map<'de, D>(deserializer: D) -> Result<HashMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    HashMap::<String, Number>::deserialize(deserializer)?
        .into_iter()
        .map(|(name, value)| value.into_f64().map(|value| (name, value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(serialize_with = "serialize_f64", deserialize_with = "deserialize_f64")]
        value: f64,
    }

    fn round_trip(value: f64) -> (String, f64) {
        let json = serde_json::to_string(&Wrapper { value }).unwrap();
        let back: Wrapper = serde_json::from_str(&json).unwrap();
        (json, back.value)
    }

    #[test]
    fn test_finite_values_stay_numbers() {
        assert_eq!(round_trip(2.5), (r#"{"value":2.5}"#.to_string(), 2.5));
        let back: Wrapper = serde_json::from_str(r#"{"value":3}"#).unwrap();
        assert_eq!(back.value, 3.0);
    }

    #[test]
    fn test_non_finite_values_are_named() {
        assert_eq!(
            round_trip(f64::INFINITY),
            (r#"{"value":"Infinity"}"#.to_string(), f64::INFINITY)
        );
        assert_eq!(round_trip(f64::NEG_INFINITY).1, f64::NEG_INFINITY);
        assert!(round_trip(f64::NAN).1.is_nan());
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"value":"big"}"#).is_err());
        assert!(serde_json::from_str::<Wrapper>(r#"{"value":null}"#).is_err());
    }
}
