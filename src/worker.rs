// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Per-capture processing: extract, filter, decode, encode, publish.

use crate::capture::CapturedBody;
use crate::codec::{ArtifactEncoder, RecordDecoder};
use crate::dump::DumpWriter;
use crate::extract::extract;
use crate::publish::Publisher;
use crate::rules::RuleSet;
use std::future::Future;
use tracing::{debug, error, warn};

/// What happened to one capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// A chip code was produced and published.
    Published { accepted: usize, artifact: String },
    /// Nothing survived filtering and decoding.
    Empty,
    /// The body was not a valid envelope.
    DecodeFailed(String),
    /// A record was invalid; the batch was aborted.
    RecordFailed(String),
    /// The encoder rejected the batch.
    EncodeFailed(String),
}

/// Something the dispatcher can hand captures to.
pub trait Processor: Send + Sync {
    fn process(&self, capture: CapturedBody) -> impl Future<Output = WorkerOutcome> + Send;
}

pub struct Worker<D, E> {
    rules: RuleSet,
    decoder: D,
    encoder: E,
    publisher: Publisher,
    dump: Option<DumpWriter>,
}

impl<D, E> Worker<D, E>
where
    D: RecordDecoder,
    E: ArtifactEncoder<D::Item>,
{
    pub fn new(rules: RuleSet, decoder: D, encoder: E, publisher: Publisher) -> Self {
        Self {
            rules,
            decoder,
            encoder,
            publisher,
            dump: None,
        }
    }

    /// Dump every raw body before processing it.
    pub fn with_dump(mut self, dump: DumpWriter) -> Self {
        self.dump = Some(dump);
        self
    }

    /// Run the whole pipeline for one capture. Failures stay inside this call.
    pub async fn handle(&self, capture: CapturedBody) -> WorkerOutcome {
        if let Some(dump) = &self.dump {
            match dump.write(&capture).await {
                Ok(path) => debug!(capture = %capture.id, path = %path.display(), "response dumped"),
                Err(e) => warn!(capture = %capture.id, error = %e, "failed to dump response"),
            }
        }

        let records = match extract(&capture.body) {
            Ok(r) => r,
            Err(e) => {
                error!(capture = %capture.id, error = %e, "failed to parse response body");
                return WorkerOutcome::DecodeFailed(e.to_string());
            }
        };
        let total = records.len();
        let accepted = self.rules.filter(records);
        debug!(capture = %capture.id, total, accepted = accepted.len(), "records filtered");

        let mut items = Vec::with_capacity(accepted.len());
        for record in &accepted {
            match self.decoder.decode(record) {
                Ok(item) => items.push(item),
                Err(e) if e.is_unknown() => {
                    debug!(capture = %capture.id, record = %record.id, error = %e, "skipping record");
                }
                Err(e) => {
                    error!(capture = %capture.id, record = %record.id, error = %e, "failed to decode chip");
                    return WorkerOutcome::RecordFailed(e.to_string());
                }
            }
        }

        if items.is_empty() {
            return WorkerOutcome::Empty;
        }

        let artifact = match self.encoder.encode(&items) {
            Ok(a) => a,
            Err(e) => {
                error!(capture = %capture.id, error = %e, "failed to build chip code");
                return WorkerOutcome::EncodeFailed(e.to_string());
            }
        };

        // The clipboard write blocks on the display connection.
        let publisher = self.publisher.clone();
        let published = artifact.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || publisher.publish(&published)).await {
            warn!(capture = %capture.id, error = %e, "publish task failed");
        }
        WorkerOutcome::Published {
            accepted: items.len(),
            artifact,
        }
    }
}

impl<D, E> Processor for Worker<D, E>
where
    D: RecordDecoder,
    E: ArtifactEncoder<D::Item>,
{
    fn process(&self, capture: CapturedBody) -> impl Future<Output = WorkerOutcome> + Send {
        self.handle(capture)
    }
}
