// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Raw body dumps for offline inspection, enabled by `verbose`.

use crate::capture::CapturedBody;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DumpWriter {
    dir: PathBuf,
}

impl DumpWriter {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Write the captured bytes untouched and return the file path.
    pub async fn write(&self, capture: &CapturedBody) -> anyhow::Result<PathBuf> {
        let name = format!(
            "response.{}.{}.json",
            capture.captured_at.timestamp(),
            capture.id.simple()
        );
        let path = self.dir.join(name);
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, &capture.body).await?;
        Ok(path)
    }
}
