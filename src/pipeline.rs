// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Wiring of queue, dispatcher and workers into one running pipeline.

use crate::capture::CaptureStage;
use crate::codec::{ArtifactEncoder, ChipCodeEncoder, ChipDecoder, RecordDecoder};
use crate::config::Config;
use crate::dispatch::{
    dispatch_queue, log_reports, DispatchSender, DispatchSummary, Dispatcher, WorkerReport,
};
use crate::dump::DumpWriter;
use crate::error::ConfigError;
use crate::publish::Publisher;
use crate::worker::Worker;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Build the worker the binary runs: chip decoder, chip code encoder, and a
/// dump writer when `verbose` is set.
pub fn chip_worker(
    cfg: &Config,
    publisher: Publisher,
) -> Result<Worker<ChipDecoder, ChipCodeEncoder>, ConfigError> {
    let rules = cfg.rule_set()?;
    if let Some(rule) = rules.effective() {
        info!(%rule, configured = rules.codes().len(), "inclusion rule active");
    } else {
        warn!("no inclusion rule configured, no chip will ever be accepted");
    }

    let worker = Worker::new(rules, ChipDecoder, ChipCodeEncoder, publisher);
    Ok(if cfg.verbose {
        worker.with_dump(DumpWriter::new(&cfg.general.dump_dir))
    } else {
        worker
    })
}

/// A running capture pipeline.
pub struct Pipeline {
    sender: DispatchSender,
    cancel: CancellationToken,
    dispatcher: JoinHandle<DispatchSummary>,
}

impl Pipeline {
    /// Start the consumption loop; worker outcomes are logged.
    pub fn start<D, E>(cfg: &Config, worker: Worker<D, E>) -> Self
    where
        D: RecordDecoder + 'static,
        E: ArtifactEncoder<D::Item> + 'static,
    {
        let (pipeline, reports) = Self::start_observed(cfg, worker);
        tokio::spawn(log_reports(reports));
        pipeline
    }

    /// Start the consumption loop and hand worker outcomes to the caller.
    pub fn start_observed<D, E>(
        cfg: &Config,
        worker: Worker<D, E>,
    ) -> (Self, mpsc::UnboundedReceiver<WorkerReport>)
    where
        D: RecordDecoder + 'static,
        E: ArtifactEncoder<D::Item> + 'static,
    {
        let (sender, receiver) = dispatch_queue(cfg.general.queue_capacity);
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let dispatcher = Dispatcher::new(Arc::new(worker), cancel.clone()).with_reports(reports_tx);
        let dispatcher = tokio::spawn(dispatcher.run(receiver));

        (
            Self {
                sender,
                cancel,
                dispatcher,
            },
            reports_rx,
        )
    }

    /// Capture hook feeding this pipeline.
    pub fn capture_stage(&self) -> CaptureStage {
        CaptureStage::new(self.sender.clone())
    }

    /// Token that stops the consumption loop immediately when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Queue a shutdown message behind pending captures and wait for the loop
    /// to stop. Workers already spawned keep running to completion.
    pub async fn shutdown(self) -> anyhow::Result<DispatchSummary> {
        if self.sender.shutdown().await.is_err() {
            self.cancel.cancel();
        }
        let summary = self.dispatcher.await?;
        self.cancel.cancel();
        Ok(summary)
    }

    /// Stop without draining queued captures.
    pub async fn abort(self) -> anyhow::Result<DispatchSummary> {
        self.cancel.cancel();
        Ok(self.dispatcher.await?)
    }
}
