// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;

use chipcode_proxy::pipeline::{chip_worker, Pipeline};
use chipcode_proxy::publish::{Publisher, SystemClipboard};
use chipcode_proxy::{config, logging, proxy};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "chipcode-proxy")]
struct Args {
    /// Optional config path (.yaml, .yml or .toml)
    #[arg(long)]
    config: Option<String>,

    /// Listen address, overrides `general.listen`
    #[arg(long)]
    listen: Option<String>,

    /// Log to stdout only, without the session log file
    #[arg(long)]
    quiet_file: bool,
}

/// Load the config file if one was given.
///
/// A file that cannot be read falls back to defaults; that error is handed
/// back so it can be logged once logging is up. A file that reads but does
/// not parse is fatal.
async fn load_config(
    path: Option<&str>,
) -> anyhow::Result<(config::Config, Option<anyhow::Error>)> {
    let Some(p) = path else {
        return Ok((config::Config::default(), None));
    };
    match config::Config::load_from_path(p).await {
        Ok(cfg) => Ok((cfg, None)),
        Err(e) if e.downcast_ref::<std::io::Error>().is_some() => {
            Ok((config::Config::default(), Some(e)))
        }
        Err(e) => Err(e.context(format!("failed to parse config {p}"))),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let loaded = load_config(args.config.as_deref()).await;

    let log_dir = match &loaded {
        Ok((cfg, _)) => cfg.general.log_dir.clone(),
        Err(_) => config::Config::default().general.log_dir,
    };
    let writer = if args.quiet_file {
        logging::TeeWriter::stdout_only()
    } else {
        let (writer, path) = logging::TeeWriter::session_file(Path::new(&log_dir))?;
        eprintln!("logging to {}", path.display());
        writer
    };
    logging::init(writer);

    let (mut cfg, load_error) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            error!(error = %format!("{e:#}"), "invalid configuration");
            return Err(e);
        }
    };
    if let (Some(p), Some(e)) = (&args.config, load_error) {
        warn!(%p, %e, "failed to read config, using defaults");
    }
    if let Some(listen) = args.listen {
        cfg.general.listen = listen;
    }
    if let Err(e) = cfg.validate() {
        error!(%e, "invalid configuration");
        return Err(e.into());
    }

    let addr: SocketAddr = cfg.general.listen.parse()?;
    match proxy::local_address().await {
        Ok(ip) => info!("proxy address -> {}:{}", ip, addr.port()),
        Err(e) => warn!(%e, "failed to determine local address"),
    }

    let publisher = match SystemClipboard::new() {
        Ok(board) => Publisher::new(Arc::new(board)),
        Err(e) => {
            warn!(%e, "failed to start clipboard thread, chip codes will only be logged");
            Publisher::without_clipboard()
        }
    };
    let worker = chip_worker(&cfg, publisher)?;
    let pipeline = Pipeline::start(&cfg, worker);

    let cfg = Arc::new(cfg);
    let server = proxy::run_proxy(addr, cfg.clone(), pipeline.capture_stage());

    let result = tokio::select! {
        res = server => res,
        _ = signal::ctrl_c() => {
            info!("shutting down");
            Ok(())
        }
    };

    match pipeline.shutdown().await {
        Ok(summary) => info!(dispatched = summary.dispatched, "pipeline stopped"),
        Err(e) => warn!(%e, "pipeline did not stop cleanly"),
    }

    if let Err(e) = &result {
        error!(%e, "server error");
    }
    result
}
