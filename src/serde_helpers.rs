// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Serde helpers for the loosely typed game payloads.
//!
//! The same field may arrive as `"12"` in one response and `12` in the next,
//! so record attributes are normalized to their string form.

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;

struct StringOrNumber;

impl<'de> Visitor<'de> for StringOrNumber {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or an integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }
}

pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(StringOrNumber)
}

#[derive(Deserialize)]
#[serde(transparent)]
struct Loose(#[serde(deserialize_with = "string_or_number")] String);

/// Sequence form of [`string_or_number`]. TOML users tend to write `rule = [12]`.
pub fn string_or_number_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Vec::<Loose>::deserialize(deserializer)?;
    Ok(items.into_iter().map(|Loose(s)| s).collect())
}

pub fn zero() -> String {
    "0".to_string()
}
