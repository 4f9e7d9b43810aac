//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `HttpTransport` port. It sends exactly what
//! the pipeline decorated and reports failures below the HTTP layer as
//! `TransportError`; error statuses come back as ordinary responses.

use std::collections::HashMap;
use std::error::Error as _;
use std::io;
use std::time::{Duration, Instant};

use gatekeep_application::ports::{HttpTransport, OutboundRequest, TransportError, TransportFuture};
use gatekeep_domain::{ApiResponse, HttpMethod};
use reqwest::{Client, Method};
use tracing::trace;

/// Default user agent sent with every request.
pub const USER_AGENT: &str = concat!("gatekeep/", env!("CARGO_PKG_VERSION"));

/// HTTP transport backed by `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with default settings.
    ///
    /// Default configuration:
    /// - User-Agent: `gatekeep/<version>`
    /// - Follow redirects: up to 10
    /// - Connect timeout: 10 seconds (the per-request timeout still applies)
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { client })
    }

    /// Creates a transport over a preconfigured reqwest client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }

    /// Maps reqwest errors to `TransportError`.
    fn map_error(error: &reqwest::Error, timeout: Duration) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            };
        }

        let host = error
            .url()
            .and_then(|u| u.host_str())
            .unwrap_or("unknown")
            .to_string();
        let message = error_chain_message(error);

        match io_error_kind(error) {
            Some(io::ErrorKind::ConnectionRefused) => {
                return TransportError::ConnectionRefused {
                    host,
                    port: error
                        .url()
                        .and_then(reqwest::Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            Some(
                io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof,
            ) => return TransportError::ConnectionAborted(message),
            _ => {}
        }

        if error.is_connect() {
            let lower = message.to_lowercase();
            if lower.contains("dns") || lower.contains("resolve") {
                return TransportError::DnsError { host, message };
            }
            if lower.contains("refused") {
                return TransportError::ConnectionRefused {
                    host,
                    port: error
                        .url()
                        .and_then(reqwest::Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return TransportError::ConnectionFailed(message);
        }

        if error.is_builder() {
            return TransportError::InvalidUrl(message);
        }

        if error.is_body() || error.is_request() {
            return TransportError::ConnectionAborted(message);
        }

        TransportError::Other(message)
    }
}

/// The innermost I/O error kind behind a reqwest error, if any.
fn io_error_kind(error: &reqwest::Error) -> Option<io::ErrorKind> {
    let mut source = error.source();
    while let Some(err) = source {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        source = err.source();
    }
    None
}

/// Joins the error and its sources; reqwest's own message hides the cause.
fn error_chain_message(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(err) = source {
        message.push_str(": ");
        message.push_str(&err.to_string());
        source = err.source();
    }
    message
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: &OutboundRequest) -> TransportFuture<'_> {
        let method = Self::to_reqwest_method(request.method);
        let url = request.url.clone();
        let headers = request.headers.clone();
        let body = request.body.clone();
        let timeout = request.timeout;
        let request_id = request.request_id;

        Box::pin(async move {
            let start = Instant::now();

            let mut builder = self.client.request(method, url).timeout(timeout);
            for (name, value) in &headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = body {
                builder = builder.body(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| Self::map_error(&e, timeout))?;

            let status = response.status().as_u16();
            let response_headers: HashMap<String, String> = response
                .headers()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
                .collect();

            let body_bytes = response
                .bytes()
                .await
                .map_err(|e| Self::map_error(&e, timeout))?
                .to_vec();

            let duration = start.elapsed();
            trace!(%request_id, status, elapsed_ms = duration.as_millis(), "exchange complete");

            Ok(ApiResponse::new(status, response_headers, body_bytes, duration))
        })
    }
}
