// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Inclusion rules deciding which records make it into a chip code.

pub mod code;

pub use code::{Constraint, InvalidRuleCode, RuleCode};

use crate::error::ConfigError;

/// Anything exposing the two attributes the rules look at.
pub trait Classified {
    fn is_locked(&self) -> bool;
    fn is_owned(&self) -> bool;
}

/// Decide whether `record` is accepted by `rules`.
///
/// Rules are evaluated in order and the first one decides. Every code in a
/// `RuleSet` is validated up front, so in practice only the first entry is
/// ever consulted. An empty list accepts nothing.
pub fn is_accepted<R: Classified + ?Sized>(record: &R, rules: &[RuleCode]) -> bool {
    match rules.first() {
        Some(rule) => rule.decide(record.is_locked(), record.is_owned()),
        None => false,
    }
}

/// Ordered sequence of validated rule codes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleSet(Vec<RuleCode>);

impl RuleSet {
    pub fn new(codes: Vec<RuleCode>) -> Self {
        Self(codes)
    }

    /// Parse raw configuration strings, failing on the first invalid one.
    pub fn parse<S: AsRef<str>>(raw: &[S]) -> Result<Self, ConfigError> {
        raw.iter()
            .enumerate()
            .map(|(index, s)| {
                s.as_ref()
                    .parse::<RuleCode>()
                    .map_err(|e| ConfigError::InvalidRule { index, code: e.0 })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn codes(&self) -> &[RuleCode] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The rule that actually decides, if any.
    pub fn effective(&self) -> Option<&RuleCode> {
        self.0.first()
    }

    pub fn accepts<R: Classified + ?Sized>(&self, record: &R) -> bool {
        is_accepted(record, &self.0)
    }

    /// Keep the records this rule set accepts.
    pub fn filter<R: Classified>(&self, records: Vec<R>) -> Vec<R> {
        records.into_iter().filter(|r| self.accepts(r)).collect()
    }
}
