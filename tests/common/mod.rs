// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

use chipcode_proxy::codec::{ChipCodeEncoder, ChipDecoder};
use chipcode_proxy::config::Config;
use chipcode_proxy::dispatch::WorkerReport;
use chipcode_proxy::error::ClipboardError;
use chipcode_proxy::pipeline::{chip_worker, Pipeline};
use chipcode_proxy::proxy::run_proxy;
use chipcode_proxy::publish::{Clipboard, Publisher};
use chipcode_proxy::worker::Worker;

/// Clipboard that keeps every write in memory.
#[derive(Default, Clone)]
pub struct RecordingClipboard {
    writes: Arc<Mutex<Vec<String>>>,
}

impl RecordingClipboard {
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

impl Clipboard for RecordingClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        self.writes
            .lock()
            .map_err(|e| ClipboardError::Write(e.to_string()))?
            .push(text.to_string());
        Ok(())
    }
}

/// Config that intercepts `/Index/index` on the loopback address.
pub fn loopback_config() -> Config {
    let mut cfg = Config::default();
    cfg.intercept.domain_suffix = "127.0.0.1".into();
    cfg.general.log_dir = std::env::temp_dir().to_string_lossy().to_string();
    cfg
}

pub struct Harness {
    pub addr: SocketAddr,
    pub handle: tokio::task::JoinHandle<()>,
    pub pipeline: Pipeline,
    pub reports: mpsc::UnboundedReceiver<WorkerReport>,
    pub clipboard: RecordingClipboard,
}

fn worker(
    cfg: &Config,
    clipboard: &RecordingClipboard,
) -> anyhow::Result<Worker<ChipDecoder, ChipCodeEncoder>> {
    Ok(chip_worker(cfg, Publisher::new(Arc::new(clipboard.clone())))?)
}

/// Start the pipeline and `run_proxy`, then wait until it accepts connections.
pub async fn start_run_proxy_and_wait(cfg: Config) -> anyhow::Result<Harness> {
    let clipboard = RecordingClipboard::default();
    let (pipeline, reports) = Pipeline::start_observed(&cfg, worker(&cfg, &clipboard)?);

    // Choose a free port by binding then dropping
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);

    let cfg = Arc::new(cfg);
    let stage = pipeline.capture_stage();
    let handle = tokio::spawn(async move {
        if let Err(e) = run_proxy(addr, cfg, stage).await {
            eprintln!("proxy on {addr} stopped: {e:#}");
        }
    });

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if Instant::now() > deadline {
            return Err(anyhow::anyhow!("timeout waiting for proxy to start"));
        }
        if handle.is_finished() {
            return Err(anyhow::anyhow!("proxy on {addr} exited before accepting"));
        }
        if let Ok(mut s) = tokio::net::TcpStream::connect(addr).await {
            let _ = s.shutdown().await;
            break;
        }
        sleep(Duration::from_millis(50)).await;
    }

    Ok(Harness {
        addr,
        handle,
        pipeline,
        reports,
        clipboard,
    })
}

/// Read from `stream` until the end of the response head.
pub async fn read_head(stream: &mut tokio::net::TcpStream) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 1024];
    loop {
        let n = timeout(Duration::from_secs(2), stream.read(&mut tmp)).await??;
        if n == 0 {
            anyhow::bail!("unexpected EOF reading response head");
        }
        buf.extend_from_slice(&tmp[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            return Ok(buf);
        }
    }
}

/// Send a plain proxied GET and return the whole response as text.
pub async fn proxied_get(proxy: SocketAddr, url: &str, host: &str) -> anyhow::Result<String> {
    let mut stream = tokio::net::TcpStream::connect(proxy).await?;
    let req = format!("GET {url} HTTP/1.1\r\nHost: {host}\r\nConnection: close\r\n\r\n");
    stream.write_all(req.as_bytes()).await?;

    let mut buf = Vec::new();
    timeout(Duration::from_secs(5), stream.read_to_end(&mut buf)).await??;
    Ok(String::from_utf8_lossy(&buf).to_string())
}
