// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Record decoding and chip code encoding.
//!
//! The worker only sees the two traits; the chip implementations below are
//! what the binary ships with.

use crate::error::{EncodeError, RecordError};
use crate::extract::Record;
use crate::rules::Classified;
use std::fmt::Write as _;
use std::str::FromStr;

/// Turns a raw record into the encoder's item type.
pub trait RecordDecoder: Send + Sync {
    type Item: Send;

    fn decode(&self, record: &Record) -> Result<Self::Item, RecordError>;
}

/// Synthesizes the artifact from a non-empty batch of decoded items.
pub trait ArtifactEncoder<T>: Send + Sync {
    fn encode(&self, items: &[T]) -> Result<String, EncodeError>;
}

/// Highest chip shape the decoder knows about.
pub const MAX_GRID_ID: u32 = 134;

/// Strongly typed chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip {
    pub id: u64,
    pub chip_id: u32,
    pub grid_id: u32,
    pub color: u8,
    pub level: u8,
    pub damage: u16,
    pub def_break: u16,
    pub hit: u16,
    pub reload: u16,
    pub squad: u32,
    pub locked: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChipDecoder;

fn field<T: FromStr>(name: &str, value: &str) -> Result<T, RecordError> {
    value
        .trim()
        .parse()
        .map_err(|_| RecordError::Invalid(format!("{name} is not a number: {value:?}")))
}

impl RecordDecoder for ChipDecoder {
    type Item = Chip;

    fn decode(&self, record: &Record) -> Result<Chip, RecordError> {
        // Zero means the payload carried no shape data for the field.
        let grid_id: u32 = field("grid_id", &record.grid_id)?;
        if grid_id > MAX_GRID_ID {
            return Err(RecordError::Unknown(format!("grid {grid_id}")));
        }
        let color: u8 = field("color_id", &record.color_id)?;
        if color > 2 {
            return Err(RecordError::Unknown(format!("color {color}")));
        }

        Ok(Chip {
            id: field("id", &record.id)?,
            chip_id: field("chip_id", &record.chip_id)?,
            grid_id,
            color,
            level: field("chip_level", &record.chip_level)?,
            damage: field("assist_damage", &record.assist_damage)?,
            def_break: field("assist_def_break", &record.assist_def_break)?,
            hit: field("assist_hit", &record.assist_hit)?,
            reload: field("assist_reload", &record.assist_reload)?,
            squad: field("squad_with_user_id", &record.squad_with_user_id)?,
            locked: record.is_locked(),
        })
    }
}

/// Compact text code: `v1!<count>!` followed by `;`-separated chips, sorted by id.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChipCodeEncoder;

pub const CODE_VERSION: &str = "v1";

impl ArtifactEncoder<Chip> for ChipCodeEncoder {
    fn encode(&self, items: &[Chip]) -> Result<String, EncodeError> {
        if items.is_empty() {
            return Err(EncodeError("no chips to encode".into()));
        }

        let mut chips: Vec<&Chip> = items.iter().collect();
        chips.sort_by_key(|c| c.id);

        let mut out = format!("{CODE_VERSION}!{}!", chips.len());
        for (i, c) in chips.iter().enumerate() {
            if i > 0 {
                out.push(';');
            }
            write!(
                out,
                "{},{},{},{},{},{},{},{},{},{}",
                c.id,
                c.chip_id,
                c.grid_id,
                c.color,
                c.level,
                c.damage,
                c.def_break,
                c.hit,
                c.reload,
                c.squad
            )
            .map_err(|e| EncodeError(e.to_string()))?;
        }
        Ok(out)
    }
}
