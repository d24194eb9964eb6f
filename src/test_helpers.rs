// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Shared test utilities to reduce duplication across test modules.

use crate::capture::CapturedBody;
use crate::codec::{ArtifactEncoder, RecordDecoder};
use crate::error::{ClipboardError, EncodeError, RecordError};
use crate::extract::Record;
use crate::publish::Clipboard;
use bytes::Bytes;
use std::sync::{Arc, Mutex};

/// Create a capture with standard test host and path
pub fn make_capture(body: &[u8]) -> CapturedBody {
    CapturedBody::new(
        "x.ppgame.com",
        "/Index/index",
        Bytes::copy_from_slice(body),
    )
}

/// Create a record with every numeric field at zero
pub fn make_record(locked: &str, squad: &str) -> Record {
    Record {
        id: "0".into(),
        chip_id: "0".into(),
        grid_id: "0".into(),
        color_id: "0".into(),
        chip_level: "0".into(),
        shape_info: "0".into(),
        assist_damage: "0".into(),
        assist_reload: "0".into(),
        assist_hit: "0".into(),
        assist_def_break: "0".into(),
        locked: locked.into(),
        squad_with_user_id: squad.into(),
    }
}

/// Decoder keyed on `grid_id`: `"unknown"` and `"invalid"` produce the
/// matching errors, anything else passes the record through.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeDecoder;

impl RecordDecoder for FakeDecoder {
    type Item = Record;

    fn decode(&self, record: &Record) -> Result<Record, RecordError> {
        match record.grid_id.as_str() {
            "unknown" => Err(RecordError::Unknown("fake".into())),
            "invalid" => Err(RecordError::Invalid("fake".into())),
            _ => Ok(record.clone()),
        }
    }
}

/// Encoder remembering the size of every batch it was called with.
#[derive(Debug, Clone, Default)]
pub struct FakeEncoder {
    calls: Arc<Mutex<Vec<usize>>>,
    fail: bool,
}

impl FakeEncoder {
    pub fn failing() -> Self {
        Self {
            calls: Arc::default(),
            fail: true,
        }
    }

    pub fn batches(&self) -> Vec<usize> {
        self.calls.lock().expect("lock").clone()
    }
}

impl ArtifactEncoder<Record> for FakeEncoder {
    fn encode(&self, items: &[Record]) -> Result<String, EncodeError> {
        self.calls.lock().expect("lock").push(items.len());
        if self.fail {
            return Err(EncodeError("fake".into()));
        }
        Ok(format!("code:{}", items.len()))
    }
}

#[derive(Debug, Default)]
pub struct MemoryClipboard {
    texts: Mutex<Vec<String>>,
}

impl MemoryClipboard {
    pub fn contents(&self) -> Vec<String> {
        self.texts.lock().expect("lock").clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        self.texts.lock().expect("lock").push(text.to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct BrokenClipboard;

impl Clipboard for BrokenClipboard {
    fn set_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable("no display".into()))
    }
}
