//! Deserialization helpers for loosely typed backend fields.
//!
//! The backend serializes coin amounts either as JSON numbers or as decimal
//! strings (`"5000.00"`), and identifiers either as numbers or strings.
//! Coins are whole units: a fractional amount is rejected rather than rounded.

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Largest magnitude an `f64` carries without losing integer precision (2^53).
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

fn whole_coins(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT_FLOAT)
        .then_some(value as i64)
}

fn coins_from_raw<E: de::Error>(raw: RawNumber) -> Result<i64, E> {
    match raw {
        RawNumber::Int(value) => Ok(value),
        RawNumber::Float(value) => whole_coins(value)
            .ok_or_else(|| E::custom(format!("invalid coin amount {value}"))),
        RawNumber::Text(text) => {
            let trimmed = text.trim();
            if let Ok(value) = trimmed.parse::<i64>() {
                return Ok(value);
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(whole_coins)
                .ok_or_else(|| E::custom(format!("invalid coin amount {text:?}")))
        }
    }
}

fn id_from_raw(raw: RawNumber) -> String {
    match raw {
        RawNumber::Int(value) => value.to_string(),
        RawNumber::Float(value) => value.to_string(),
        RawNumber::Text(text) => text,
    }
}

pub(crate) mod coins {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        coins_from_raw(RawNumber::deserialize(deserializer)?)
    }

    pub mod option {
        use super::super::*;

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<RawNumber>::deserialize(deserializer)?
                .map(coins_from_raw)
                .transpose()
        }
    }
}

/// Missing and `null` strings both decode as empty.
pub(crate) mod text {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
    }
}

pub(crate) mod id {
    pub mod option {
        use super::super::*;

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Ok(Option::<RawNumber>::deserialize(deserializer)?.map(id_from_raw))
        }
    }
}
