// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! HTTP proxy server implementation with request forwarding and capture.

use crate::capture::CaptureStage;
use crate::config::Config;
use crate::filter::InterceptFilter;

use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Incoming;
use hyper::upgrade::Upgraded;
use hyper::{service::service_fn, Method, Request, Response, StatusCode, Uri};
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client as LegacyClient;
use hyper_util::rt::TokioExecutor;
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto::Builder as AutoConnBuilder;
use std::convert::Infallible;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Response body handed to clients. Uncaptured upstream bodies stream through it.
type ProxyBody = BoxBody<Bytes, hyper::Error>;

type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response<ProxyBody>, Infallible>> + Send>>;

type UpstreamClient = LegacyClient<
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
    Full<Bytes>,
>;

// RFC 7230 Section 6.1: Hop-by-hop headers must not be forwarded by proxies.
static HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

struct Shared {
    client: UpstreamClient,
    cfg: Arc<Config>,
    filter: InterceptFilter,
    capture: CaptureStage,
}

fn build_client() -> anyhow::Result<UpstreamClient> {
    let https = HttpsConnectorBuilder::new()
        .with_native_roots()?
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .build();
    Ok(LegacyClient::builder(TokioExecutor::new()).build(https))
}

pub async fn run_proxy(
    listen: SocketAddr,
    cfg: Arc<Config>,
    capture: CaptureStage,
) -> anyhow::Result<()> {
    // Default behavior: no accept limit (runs forever)
    run_proxy_with_limit(listen, cfg, capture, None).await
}

/// Testable variant of `run_proxy` that accepts an optional `accept_limit`.
/// When `accept_limit` is `Some(n)`, the accept loop returns after accepting
/// the Nth connection. Connection handlers are spawned and may still be
/// running when this function returns.
pub async fn run_proxy_with_limit(
    listen: SocketAddr,
    cfg: Arc<Config>,
    capture: CaptureStage,
    accept_limit: Option<usize>,
) -> anyhow::Result<()> {
    let shared = Arc::new(Shared {
        client: build_client()?,
        filter: InterceptFilter::from_config(&cfg.intercept),
        cfg,
        capture,
    });

    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!(%listen, "listening");

    let executor = TokioExecutor::new();
    let server_builder = AutoConnBuilder::new(executor);

    let mut remaining = accept_limit;
    loop {
        if let Some(0) = remaining {
            break;
        }

        let (stream, remote_addr) = listener.accept().await?;

        if let Some(ref mut n) = remaining {
            *n -= 1;
        }

        let shared = shared.clone();
        let builder_clone = server_builder.clone();
        tokio::spawn(async move {
            trace!(%remote_addr, "accepted connection");
            let service = service_fn(move |req: Request<Incoming>| {
                let shared = shared.clone();
                let fut: ServiceFuture = Box::pin(async move {
                    handle_request(req, shared, hyper::http::uri::Scheme::HTTP).await
                });
                fut
            });

            let io = TokioIo::new(stream);
            if let Err(e) = builder_clone
                .serve_connection_with_upgrades(io, service)
                .await
            {
                debug!(%remote_addr, %e, "connection error");
            }
        });
    }

    Ok(())
}

fn full(bytes: Bytes) -> ProxyBody {
    buffered(Full::new(bytes))
}

fn buffered(body: Full<Bytes>) -> ProxyBody {
    body.map_err(|never| match never {}).boxed()
}

fn text_response(status: StatusCode, msg: &'static str) -> Response<ProxyBody> {
    let mut resp = Response::new(full(Bytes::from_static(msg.as_bytes())));
    *resp.status_mut() = status;
    resp
}

async fn handle_request<B>(
    req: Request<B>,
    shared: Arc<Shared>,
    scheme: hyper::http::uri::Scheme,
) -> Result<Response<ProxyBody>, Infallible>
where
    B: hyper::body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if req.method() == Method::CONNECT {
        if !shared.cfg.tls.passthrough {
            return Ok(text_response(
                StatusCode::METHOD_NOT_ALLOWED,
                "CONNECT not supported (passthrough disabled)",
            ));
        }

        let uri = req.uri().clone();
        tokio::task::spawn(async move {
            match hyper::upgrade::on(req).await {
                Ok(upgraded) => {
                    let host = uri.host().unwrap_or("unknown");
                    let port = uri.port_u16().unwrap_or(443);
                    debug!(%host, port, "tunneling connection");
                    if let Err(e) = tunnel(upgraded, host, port).await {
                        warn!(%host, "tunnel error: {}", e);
                    }
                }
                Err(e) => error!("upgrade error for {}: {}", uri, e),
            }
        });
        return Ok(Response::new(full(Bytes::new())));
    }

    handle_http_logic(req, shared, scheme).await
}

async fn handle_http_logic<B>(
    req: Request<B>,
    shared: Arc<Shared>,
    scheme: hyper::http::uri::Scheme,
) -> Result<Response<ProxyBody>, Infallible>
where
    B: hyper::body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let uri = if req.uri().scheme().is_some() {
        req.uri().clone()
    } else {
        let host = req
            .headers()
            .get(hyper::header::HOST)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("localhost");
        let path = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let s = format!("{}://{}{}", scheme, host, path);
        s.parse::<Uri>()
            .unwrap_or_else(|_| Uri::from_static("http://localhost/"))
    };

    let request_hop_headers =
        parse_connection_tokens(req.headers().get(hyper::header::CONNECTION));
    let mut builder = Request::builder().method(req.method()).uri(uri.clone());
    for (name, value) in req.headers().iter() {
        if !is_hop_by_hop_header(name.as_str(), &request_hop_headers) {
            builder = builder.header(name, value);
        }
    }

    let body_bytes = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            let boxed: Box<dyn std::error::Error + Send + Sync> = e.into();
            error!("failed to collect request body: {}", boxed);
            return Ok(text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "request body collect error",
            ));
        }
    };

    let upstream_req = match builder.body(Full::new(body_bytes)) {
        Ok(r) => r,
        Err(e) => {
            error!("failed to build upstream request: {}", e);
            return Ok(text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "request build error",
            ));
        }
    };

    let resp = match shared.client.request(upstream_req).await {
        Ok(r) => r,
        Err(e) => {
            warn!(%uri, "upstream error: {}", e);
            return Ok(text_response(StatusCode::BAD_GATEWAY, "upstream error"));
        }
    };

    let host = uri.host().unwrap_or_default();
    let path = uri.path();

    let (mut parts, body) = if shared.filter.should_capture(host, path) {
        match shared.capture.on_response(host, path, resp).await {
            Ok(r) => {
                let (parts, body) = r.into_parts();
                (parts, buffered(body))
            }
            Err(e) => {
                warn!(%uri, error = %e, "failed to read captured response");
                return Ok(text_response(StatusCode::BAD_GATEWAY, "upstream body error"));
            }
        }
    } else {
        let (parts, body) = resp.into_parts();
        (parts, body.boxed())
    };

    let connection_hop_headers =
        parse_connection_tokens(parts.headers.get(hyper::header::CONNECTION));
    let hop_names: Vec<_> = parts
        .headers
        .keys()
        .filter(|name| is_hop_by_hop_header(name.as_str(), &connection_hop_headers))
        .cloned()
        .collect();
    for name in hop_names {
        parts.headers.remove(name);
    }

    Ok(Response::from_parts(parts, body))
}

// Parse a Connection header value into a lowercased set of tokens
fn parse_connection_tokens(
    val: Option<&hyper::header::HeaderValue>,
) -> std::collections::HashSet<String> {
    let mut set = std::collections::HashSet::new();
    if let Some(conn_val) = val {
        if let Ok(conn_str) = conn_val.to_str() {
            for token in conn_str.split(',') {
                let trimmed = token.trim().to_ascii_lowercase();
                if !trimmed.is_empty() {
                    set.insert(trimmed);
                }
            }
        }
    }
    set
}

fn is_hop_by_hop_header(
    name: &str,
    connection_hop_headers: &std::collections::HashSet<String>,
) -> bool {
    let name = name.to_ascii_lowercase();
    connection_hop_headers.contains(&name) || HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

async fn tunnel(upgraded: Upgraded, host: &str, port: u16) -> std::io::Result<()> {
    trace!("tunnel: connecting to {}:{}", host, port);
    let mut server = tokio::net::TcpStream::connect((host, port)).await?;
    let mut upgraded_io = TokioIo::new(upgraded);
    let (n1, n2) = tokio::io::copy_bidirectional(&mut upgraded_io, &mut server).await?;
    trace!("tunnel: copy finished: {} bytes -> {} bytes", n1, n2);
    Ok(())
}

/// Address other devices on the LAN should use to reach this proxy.
///
/// Connecting a UDP socket only selects a route; nothing is sent.
pub async fn local_address() -> anyhow::Result<IpAddr> {
    let socket = tokio::net::UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect("8.8.8.8:80").await?;
    Ok(socket.local_addr()?.ip())
}
