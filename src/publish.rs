// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Publishing finished chip codes to the log and the system clipboard.

use crate::error::ClipboardError;
use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use tracing::{info, warn};

pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError>;
}

type Request = (String, mpsc::SyncSender<Result<(), ClipboardError>>);

/// OS clipboard, owned by a dedicated thread.
///
/// On X11 and Wayland the selection is only served while a handle is alive,
/// so the thread keeps one open between writes and reopens it after a failure.
#[derive(Debug)]
pub struct SystemClipboard {
    requests: mpsc::Sender<Request>,
}

impl SystemClipboard {
    pub fn new() -> io::Result<Self> {
        Self::spawn(
            || arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string())),
            |board: &mut arboard::Clipboard, text| {
                board
                    .set_text(text)
                    .map_err(|e| ClipboardError::Write(e.to_string()))
            },
        )
    }

    /// Start the owning thread. `open` creates the handle on that thread,
    /// `write` puts one text on it.
    fn spawn<H, O, W>(mut open: O, mut write: W) -> io::Result<Self>
    where
        O: FnMut() -> Result<H, ClipboardError> + Send + 'static,
        W: FnMut(&mut H, String) -> Result<(), ClipboardError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Request>();
        thread::Builder::new()
            .name("clipboard".into())
            .spawn(move || {
                let mut handle: Option<H> = None;
                for (text, reply) in rx {
                    let mut board = match handle.take() {
                        Some(h) => h,
                        None => match open() {
                            Ok(h) => h,
                            Err(e) => {
                                let _ = reply.send(Err(e));
                                continue;
                            }
                        },
                    };
                    let res = write(&mut board, text);
                    if res.is_ok() {
                        handle = Some(board);
                    }
                    let _ = reply.send(res);
                }
            })?;
        Ok(Self { requests: tx })
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        let stopped = || ClipboardError::Unavailable("clipboard thread stopped".into());
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        self.requests
            .send((text.to_owned(), reply_tx))
            .map_err(|_| stopped())?;
        reply_rx.recv().map_err(|_| stopped())?
    }
}

/// Result of a publish call, mostly useful to tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardStatus {
    Copied,
    Failed,
    Absent,
}

#[derive(Clone)]
pub struct Publisher {
    clipboard: Option<Arc<dyn Clipboard>>,
}

impl Publisher {
    pub fn new(clipboard: Arc<dyn Clipboard>) -> Self {
        Self {
            clipboard: Some(clipboard),
        }
    }

    pub fn without_clipboard() -> Self {
        Self { clipboard: None }
    }

    /// Log `artifact`, then try to put it on the clipboard.
    pub fn publish(&self, artifact: &str) -> ClipboardStatus {
        info!(artifact, "chip code ready");

        let Some(clipboard) = &self.clipboard else {
            warn!("no clipboard available, chip code only logged");
            return ClipboardStatus::Absent;
        };

        match clipboard.set_text(artifact) {
            Ok(()) => {
                info!("chip code copied to clipboard");
                ClipboardStatus::Copied
            }
            Err(e) => {
                warn!(error = %e, "failed to copy chip code to clipboard");
                ClipboardStatus::Failed
            }
        }
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("clipboard", &self.clipboard.is_some())
            .finish()
    }
}
