//! Bounded HTTP retrieval of source documents (made by FontLab https://www.fontlab.com/)

use std::collections::HashMap;
use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::IgnoredAny;
use ureq::tls::{RootCerts, TlsConfig, TlsProvider};
use ureq::Agent;

use crate::error::FetchError;

const READ_CHUNK: usize = 64 * 1024;

/// Shared flag that aborts in-flight fetches.
///
/// The flag is polled, not pushed: [`HttpFetcher`] checks it before the
/// request, once the response head arrives, and between body chunks. A
/// cancel that lands while the connection is opening or the server has not
/// answered yet takes effect only when that wait ends, which is at most the
/// fetch timeout.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Retrieves one source's raw catalog document.
///
/// Implementations never retry. The returned bytes are exactly what the
/// server sent and are guaranteed to hold a JSON object.
pub trait SourceFetcher {
    fn fetch(
        &self,
        url: &str,
        timeout: Duration,
        max_bytes: u64,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>, FetchError>;
}

impl<T: SourceFetcher + ?Sized> SourceFetcher for Arc<T> {
    fn fetch(
        &self,
        url: &str,
        timeout: Duration,
        max_bytes: u64,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(url, timeout, max_bytes, cancel)
    }
}

/// `SourceFetcher` backed by a native-tls ureq agent.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher;

impl HttpFetcher {
    pub fn new() -> Self {
        Self
    }

    fn agent(timeout: Duration) -> Agent {
        let tls_config = TlsConfig::builder()
            .provider(TlsProvider::NativeTls)
            .root_certs(RootCerts::PlatformVerifier)
            .build();

        Agent::config_builder()
            .tls_config(tls_config)
            .timeout_global(Some(timeout))
            .build()
            .into()
    }
}

impl SourceFetcher for HttpFetcher {
    fn fetch(
        &self,
        url: &str,
        timeout: Duration,
        max_bytes: u64,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>, FetchError> {
        if cancel.is_cancelled() {
            return Err(cancelled(url));
        }

        log::debug!("fetching {url} (timeout {timeout:?}, limit {max_bytes} bytes)");
        let outcome = Self::agent(timeout).get(url).call();
        // ureq cannot be interrupted mid-call; drop whatever came back if cancelled meanwhile
        if cancel.is_cancelled() {
            log::debug!("fetch of {url} cancelled while waiting for the response");
            return Err(cancelled(url));
        }
        let mut response = outcome.map_err(|err| classify_ureq(url, max_bytes, err))?;

        let declared = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        if declared.is_some_and(|len| len > max_bytes) {
            return Err(FetchError::TooLarge {
                url: url.to_string(),
                limit: max_bytes,
            });
        }

        let mut reader = response.body_mut().as_reader();
        let body = read_bounded(url, &mut reader, max_bytes, cancel)?;
        validate_document(url, &body)?;

        log::debug!("fetched {} bytes from {url}", body.len());
        Ok(body)
    }
}

/// Read at most `max_bytes`, failing instead of truncating when the body is longer.
fn read_bounded(
    url: &str,
    reader: &mut impl Read,
    max_bytes: u64,
    cancel: &CancelToken,
) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        if cancel.is_cancelled() {
            return Err(cancelled(url));
        }
        let read = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(classify_io(url, max_bytes, err)),
        };
        if body.len() as u64 + read as u64 > max_bytes {
            return Err(FetchError::TooLarge {
                url: url.to_string(),
                limit: max_bytes,
            });
        }
        body.extend_from_slice(&chunk[..read]);
    }

    Ok(body)
}

fn cancelled(url: &str) -> FetchError {
    FetchError::Cancelled {
        url: url.to_string(),
    }
}

fn validate_document(url: &str, body: &[u8]) -> Result<(), FetchError> {
    serde_json::from_slice::<HashMap<String, IgnoredAny>>(body)
        .map(|_| ())
        .map_err(|err| FetchError::InvalidContent {
            url: url.to_string(),
            reason: err.to_string(),
        })
}

fn classify_ureq(url: &str, max_bytes: u64, err: ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(status) => FetchError::BadStatus {
            url: url.to_string(),
            status,
        },
        ureq::Error::Timeout(_) => FetchError::Timeout {
            url: url.to_string(),
        },
        ureq::Error::BodyExceedsLimit(_) => FetchError::TooLarge {
            url: url.to_string(),
            limit: max_bytes,
        },
        ureq::Error::Io(io) => classify_io(url, max_bytes, io),
        other => FetchError::Unreachable {
            url: url.to_string(),
            reason: other.to_string(),
        },
    }
}

fn classify_io(url: &str, max_bytes: u64, err: std::io::Error) -> FetchError {
    if err.kind() == ErrorKind::TimedOut || err.kind() == ErrorKind::WouldBlock {
        return FetchError::Timeout {
            url: url.to_string(),
        };
    }
    let wrapped = err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<ureq::Error>());
    match wrapped {
        Some(ureq::Error::Timeout(_)) => FetchError::Timeout {
            url: url.to_string(),
        },
        Some(ureq::Error::BodyExceedsLimit(_)) => FetchError::TooLarge {
            url: url.to_string(),
            limit: max_bytes,
        },
        _ => FetchError::Unreachable {
            url: url.to_string(),
            reason: err.to_string(),
        },
    }
}
