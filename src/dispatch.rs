// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Bounded FIFO between the capture stage and the workers.
//!
//! Producers await free capacity instead of dropping captures. A single
//! consumption loop drains the queue in order and hands every capture to its
//! own worker task; workers run concurrently, so artifacts may be published
//! in a different order than captures arrived.

use crate::capture::CapturedBody;
use crate::error::DispatchError;
use crate::worker::{Processor, WorkerOutcome};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Item carried by the dispatch queue.
#[derive(Debug)]
pub enum Message {
    Capture(CapturedBody),
    Shutdown,
}

/// Producer half of the dispatch queue. Cheap to clone.
#[derive(Clone, Debug)]
pub struct DispatchSender {
    tx: mpsc::Sender<Message>,
}

/// Consumer half of the dispatch queue.
#[derive(Debug)]
pub struct DispatchReceiver {
    rx: mpsc::Receiver<Message>,
}

/// Create a dispatch queue holding at most `capacity` pending messages.
///
/// # Panics
///
/// Panics if `capacity` is zero; `Config::validate` rejects that value.
pub fn dispatch_queue(capacity: usize) -> (DispatchSender, DispatchReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (DispatchSender { tx }, DispatchReceiver { rx })
}

impl DispatchSender {
    /// Enqueue a capture, waiting while the queue is full.
    pub async fn dispatch(&self, body: CapturedBody) -> Result<(), DispatchError> {
        self.tx
            .send(Message::Capture(body))
            .await
            .map_err(|_| DispatchError::Closed)
    }

    /// Ask the consumption loop to stop once it reaches this message.
    pub async fn shutdown(&self) -> Result<(), DispatchError> {
        self.tx
            .send(Message::Shutdown)
            .await
            .map_err(|_| DispatchError::Closed)
    }
}

impl DispatchReceiver {
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    /// Stop accepting new messages. Already queued ones stay readable.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// Outcome of one worker task, reported back to whoever is listening.
#[derive(Debug)]
pub struct WorkerReport {
    pub capture_id: Uuid,
    pub outcome: WorkerOutcome,
}

/// Why the consumption loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
    Cancelled,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub dispatched: usize,
    pub reason: StopReason,
}

/// The consumption loop.
pub struct Dispatcher<P> {
    processor: Arc<P>,
    reports: Option<mpsc::UnboundedSender<WorkerReport>>,
    cancel: CancellationToken,
}

impl<P> Dispatcher<P>
where
    P: Processor + 'static,
{
    pub fn new(processor: Arc<P>, cancel: CancellationToken) -> Self {
        Self {
            processor,
            reports: None,
            cancel,
        }
    }

    /// Send each worker's outcome to `reports`.
    pub fn with_reports(mut self, reports: mpsc::UnboundedSender<WorkerReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Drain `receiver` until a shutdown message, cancellation, or until every
    /// sender is gone. Nothing is dequeued after that.
    pub async fn run(self, mut receiver: DispatchReceiver) -> DispatchSummary {
        info!("dispatcher started");
        let mut dispatched = 0usize;

        let reason = loop {
            let msg = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break StopReason::Cancelled,
                msg = receiver.recv() => msg,
            };

            match msg {
                Some(Message::Capture(body)) => {
                    dispatched += 1;
                    debug!(
                        capture = %body.id,
                        host = %body.host,
                        path = %body.path,
                        bytes = body.body.len(),
                        "dispatching capture"
                    );
                    self.spawn_worker(body);
                }
                Some(Message::Shutdown) => break StopReason::Shutdown,
                None => break StopReason::Disconnected,
            }
        };

        receiver.close();
        info!(dispatched, ?reason, "dispatcher stopped");
        DispatchSummary { dispatched, reason }
    }

    fn spawn_worker(&self, body: CapturedBody) {
        let processor = self.processor.clone();
        let reports = self.reports.clone();
        tokio::spawn(async move {
            let capture_id = body.id;
            let outcome = processor.process(body).await;
            debug!(capture = %capture_id, ?outcome, "worker finished");
            if let Some(tx) = reports {
                let _ = tx.send(WorkerReport {
                    capture_id,
                    outcome,
                });
            }
        });
    }
}

/// Log every worker report until all report senders are gone.
pub async fn log_reports(mut rx: mpsc::UnboundedReceiver<WorkerReport>) {
    while let Some(report) = rx.recv().await {
        match &report.outcome {
            WorkerOutcome::Published { accepted, .. } => {
                info!(capture = %report.capture_id, accepted, "capture processed")
            }
            WorkerOutcome::Empty => {
                debug!(capture = %report.capture_id, "capture had no accepted records")
            }
            other => warn!(capture = %report.capture_id, outcome = ?other, "capture discarded"),
        }
    }
}
