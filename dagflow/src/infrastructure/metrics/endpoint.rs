// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics Endpoint HTTP Server
//!
//! Minimal hand-rolled HTTP server exposing `/metrics` (Prometheus text
//! format) and `/health`. No web framework: a run only ever needs two
//! fixed routes, so a raw `TcpListener` loop is simpler than pulling in
//! one.

use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::infrastructure::metrics::service::MetricsService;
use dagflow_domain::error::EngineError;

pub struct MetricsEndpoint {
    metrics_service: Arc<MetricsService>,
}

impl MetricsEndpoint {
    pub fn new(metrics_service: Arc<MetricsService>) -> Self {
        Self { metrics_service }
    }

    /// Binds to `127.0.0.1:{port}` and serves requests until the process
    /// exits. Runs forever; callers should spawn this as a background
    /// task rather than awaiting it on the main run path.
    pub async fn start(&self, port: u16) -> Result<(), EngineError> {
        let addr = format!("127.0.0.1:{port}");
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| EngineError::internal(format!("failed to bind metrics endpoint: {e}")))?;

        info!("metrics endpoint listening on http://{}/metrics", addr);

        loop {
            match listener.accept().await {
                Ok((mut stream, _)) => {
                    let metrics_service = self.metrics_service.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_request(&mut stream, metrics_service).await {
                            error!("error handling metrics request: {}", e);
                        }
                    });
                }
                Err(e) => error!("error accepting connection: {}", e),
            }
        }
    }
}

async fn handle_request(
    stream: &mut tokio::net::TcpStream,
    metrics_service: Arc<MetricsService>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut buffer = [0; 1024];
    let n = stream.read(&mut buffer).await?;
    let request = String::from_utf8_lossy(&buffer[..n]);

    debug!("received request: {}", request.lines().next().unwrap_or(""));

    if request.starts_with("GET /metrics") {
        match metrics_service.get_metrics() {
            Ok(metrics_text) => {
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4; charset=utf-8\r\nContent-Length: \
                     {}\r\n\r\n{}",
                    metrics_text.len(),
                    metrics_text
                );
                stream.write_all(response.as_bytes()).await?;
            }
            Err(e) => {
                let body = format!("error generating metrics: {e}");
                let response = format!(
                    "HTTP/1.1 500 Internal Server Error\r\nContent-Type: text/plain\r\nContent-Length: \
                     {}\r\n\r\n{}",
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).await?;
            }
        }
    } else if request.starts_with("GET /health") {
        stream
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\n\r\nOK")
            .await?;
    } else {
        stream
            .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\nContent-Length: 9\r\n\r\nNot Found")
            .await?;
    }

    stream.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn endpoint_constructs_without_error() {
        let metrics_service = Arc::new(MetricsService::new().unwrap());
        let _endpoint = MetricsEndpoint::new(metrics_service);
    }
}
