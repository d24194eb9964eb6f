// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Record extraction from captured response bodies.

use crate::error::DecodeError;
use crate::rules::Classified;
use crate::serde_helpers::{string_or_number, zero};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sentinel value for an unset attribute.
pub const UNSET: &str = "0";

/// JSON wrapper holding the chip inventory of one account.
#[derive(Deserialize, Debug)]
pub struct Envelope {
    pub chip_with_user_info: HashMap<String, Record>,
}

/// One chip as sent by the game server.
///
/// Values are kept in their wire form; turning them into numbers is the
/// decoder's job.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Record {
    #[serde(default = "zero", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default = "zero", deserialize_with = "string_or_number")]
    pub chip_id: String,
    #[serde(default = "zero", deserialize_with = "string_or_number")]
    pub grid_id: String,
    #[serde(default = "zero", deserialize_with = "string_or_number")]
    pub color_id: String,
    #[serde(default = "zero", deserialize_with = "string_or_number")]
    pub chip_level: String,
    #[serde(default = "zero", deserialize_with = "string_or_number")]
    pub shape_info: String,
    #[serde(default = "zero", deserialize_with = "string_or_number")]
    pub assist_damage: String,
    #[serde(default = "zero", deserialize_with = "string_or_number")]
    pub assist_reload: String,
    #[serde(default = "zero", deserialize_with = "string_or_number")]
    pub assist_hit: String,
    #[serde(default = "zero", deserialize_with = "string_or_number")]
    pub assist_def_break: String,
    /// Lock attribute.
    #[serde(alias = "is_locked", deserialize_with = "string_or_number")]
    pub locked: String,
    /// Ownership attribute: the squad the chip is equipped on.
    #[serde(deserialize_with = "string_or_number")]
    pub squad_with_user_id: String,
}

impl Classified for Record {
    fn is_locked(&self) -> bool {
        self.locked != UNSET
    }

    fn is_owned(&self) -> bool {
        self.squad_with_user_id != UNSET
    }
}

/// Parse a response body into its records. Key order is not preserved.
pub fn extract(body: &[u8]) -> Result<Vec<Record>, DecodeError> {
    let envelope: Envelope = serde_json::from_slice(body)?;
    Ok(envelope.chip_with_user_info.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn extracts_minimal_record() {
        let body = br#"{"chip_with_user_info":{"a":{"locked":"0","squad_with_user_id":"0"}}}"#;
        let records = extract(body).expect("extract");
        assert_eq!(records.len(), 1);
        assert!(!records[0].is_locked());
        assert!(!records[0].is_owned());
        assert_eq!(records[0].grid_id, "0");
    }

    #[test]
    fn extracts_full_records_with_mixed_types() {
        let body = br#"{
            "chip_with_user_info": {
                "101": {"id":"101","chip_id":5051,"grid_id":"11","color_id":1,"chip_level":"20",
                        "shape_info":"0,0","assist_damage":"3","assist_reload":0,"assist_hit":"1",
                        "assist_def_break":"2","locked":1,"squad_with_user_id":"0"},
                "102": {"id":102,"grid_id":"12","is_locked":"0","squad_with_user_id":"7"}
            },
            "other_field": [1, 2, 3]
        }"#;
        let mut records = extract(body).expect("extract");
        records.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].chip_id, "5051");
        assert!(records[0].is_locked());
        assert!(!records[0].is_owned());
        assert!(!records[1].is_locked());
        assert!(records[1].is_owned());
    }

    #[test]
    fn empty_map_yields_no_records() {
        let records = extract(br#"{"chip_with_user_info":{}}"#).expect("extract");
        assert!(records.is_empty());
    }

    #[rstest]
    #[case(b"not json".as_slice())]
    #[case(b"".as_slice())]
    #[case(br#"{"chip_with_user_info":"#.as_slice())]
    #[case(br#"{"gun_with_user_info":{}}"#.as_slice())]
    #[case(br#"{"chip_with_user_info":[]}"#.as_slice())]
    #[case(br#"{"chip_with_user_info":{"a":{"locked":"0"}}}"#.as_slice())]
    #[case(br#"{"chip_with_user_info":{"a":{"locked":[],"squad_with_user_id":"0"}}}"#.as_slice())]
    fn malformed_bodies_fail_whole_batch(#[case] body: &[u8]) {
        assert!(extract(body).is_err());
    }
}
