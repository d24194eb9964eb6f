// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Two-digit rule codes.
//!
//! The first digit constrains the lock attribute of a record, the second its
//! ownership attribute. Each digit is one of:
//!
//! - `0`: don't care
//! - `1`: attribute must be set
//! - `2`: attribute must be unset

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Constraint placed on a single record attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    Any,
    Set,
    Unset,
}

impl Constraint {
    fn from_digit(c: char) -> Option<Self> {
        match c {
            '0' => Some(Constraint::Any),
            '1' => Some(Constraint::Set),
            '2' => Some(Constraint::Unset),
            _ => None,
        }
    }

    fn digit(self) -> char {
        match self {
            Constraint::Any => '0',
            Constraint::Set => '1',
            Constraint::Unset => '2',
        }
    }

    /// Whether an attribute in state `set` satisfies this constraint.
    pub fn admits(self, set: bool) -> bool {
        match self {
            Constraint::Any => true,
            Constraint::Set => set,
            Constraint::Unset => !set,
        }
    }
}

/// A validated rule code such as `"02"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleCode {
    pub lock: Constraint,
    pub ownership: Constraint,
}

impl RuleCode {
    pub const fn new(lock: Constraint, ownership: Constraint) -> Self {
        Self { lock, ownership }
    }

    /// Accept only records nobody has equipped. This is the default policy.
    pub const UNOWNED: RuleCode = RuleCode::new(Constraint::Any, Constraint::Unset);

    /// Decision for a record with the given attribute states.
    pub fn decide(&self, locked: bool, owned: bool) -> bool {
        self.lock.admits(locked) && self.ownership.admits(owned)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRuleCode(pub String);

impl fmt::Display for InvalidRuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid rule code {:?}", self.0)
    }
}

impl std::error::Error for InvalidRuleCode {}

impl FromStr for RuleCode {
    type Err = InvalidRuleCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let parsed = match (chars.next(), chars.next(), chars.next()) {
            (Some(a), Some(b), None) => {
                Constraint::from_digit(a).zip(Constraint::from_digit(b))
            }
            _ => None,
        };
        parsed
            .map(|(lock, ownership)| RuleCode { lock, ownership })
            .ok_or_else(|| InvalidRuleCode(s.to_string()))
    }
}

impl fmt::Display for RuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.lock.digit(), self.ownership.digit())
    }
}

impl Serialize for RuleCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RuleCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
