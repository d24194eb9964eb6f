// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Log sink: every line goes to stdout and to a per-session log file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Writes each formatted event to stdout and, optionally, a shared file.
#[derive(Clone, Debug)]
pub struct TeeWriter {
    file: Option<Arc<Mutex<File>>>,
}

impl TeeWriter {
    pub fn stdout_only() -> Self {
        Self { file: None }
    }

    /// Open `chipcode.<unix-seconds>.log` in `dir` for appending.
    pub fn session_file(dir: &Path) -> io::Result<(Self, PathBuf)> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("chipcode.{}.log", chrono::Utc::now().timestamp()));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok((
            Self {
                file: Some(Arc::new(Mutex::new(file))),
            },
            path,
        ))
    }
}

/// Buffers one event and flushes it in a single write on drop.
pub struct EventWriter {
    buf: Vec<u8>,
    file: Option<Arc<Mutex<File>>>,
}

impl Write for EventWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        if let Some(file) = &self.file {
            let mut f = file
                .lock()
                .map_err(|_| io::Error::other("log file lock poisoned"))?;
            f.write_all(&self.buf)?;
            f.flush()?;
        }
        let mut out = io::stdout().lock();
        out.write_all(&self.buf)?;
        out.flush()?;
        self.buf.clear();
        Ok(())
    }
}

impl Drop for EventWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for TeeWriter {
    type Writer = EventWriter;

    fn make_writer(&'a self) -> Self::Writer {
        EventWriter {
            buf: Vec::with_capacity(256),
            file: self.file.clone(),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init(writer: TeeWriter) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .init();
}
