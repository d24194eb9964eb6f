// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Response capture: copy a selected response body onto the dispatch queue.

use crate::dispatch::DispatchSender;
use crate::error::CaptureError;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http_body_util::{BodyExt, Full};
use hyper::Response;
use tracing::{info, warn};
use uuid::Uuid;

/// Raw body of one selected response, tagged with where it came from.
#[derive(Debug, Clone)]
pub struct CapturedBody {
    pub id: Uuid,
    pub host: String,
    pub path: String,
    pub captured_at: DateTime<Utc>,
    pub body: Bytes,
}

impl CapturedBody {
    pub fn new(host: impl Into<String>, path: impl Into<String>, body: Bytes) -> Self {
        Self {
            id: Uuid::new_v4(),
            host: host.into(),
            path: path.into(),
            captured_at: Utc::now(),
            body,
        }
    }
}

/// Hook run on every response the intercept filter selected.
#[derive(Clone, Debug)]
pub struct CaptureStage {
    queue: DispatchSender,
}

impl CaptureStage {
    pub fn new(queue: DispatchSender) -> Self {
        Self { queue }
    }

    /// Read `resp` in full, queue a copy of its body and hand back an
    /// equivalent response whose body is still readable.
    ///
    /// Queueing problems never affect the returned response.
    pub async fn on_response<B>(
        &self,
        host: &str,
        path: &str,
        resp: Response<B>,
    ) -> Result<Response<Full<Bytes>>, CaptureError>
    where
        B: hyper::body::Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = resp.into_parts();
        let bytes = body
            .collect()
            .await
            .map_err(|e| CaptureError::BodyRead(e.into()))?
            .to_bytes();

        self.capture(host, path, bytes.clone()).await;

        Ok(Response::from_parts(parts, Full::new(bytes)))
    }

    /// Queue an already buffered body.
    pub async fn capture(&self, host: &str, path: &str, body: Bytes) {
        let captured = CapturedBody::new(host, path, body);
        let id = captured.id;
        let len = captured.body.len();
        match self.queue.dispatch(captured).await {
            Ok(()) => info!(capture = %id, %host, %path, bytes = len, "response captured"),
            Err(e) => warn!(capture = %id, %host, %path, error = %e, "capture skipped"),
        }
    }
}
