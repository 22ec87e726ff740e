//! HTTP client for the collector endpoint

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tokio::task::JoinHandle;

use crate::debug::DebugSink;
use crate::error::{Error, Result};
use crate::payload::ServerPayload;

/// Debug sink tag for swallowed transport failures
pub const ERR_COLLECT: &str = "err-collect";

/// Posts beacons to one resolved endpoint
#[derive(Clone, Debug)]
pub struct CollectorClient {
    http_client: reqwest::Client,
    endpoint: String,
    sink: DebugSink,
}

impl CollectorClient {
    /// Create a client for `endpoint`
    ///
    /// The endpoint is not validated here; preflight decides whether it is
    /// usable before anything is sent.
    pub fn new(endpoint: impl Into<String>, sink: DebugSink) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            sink,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST `payload` and wait for the status
    ///
    /// Only the status is inspected; the response body is ignored.
    pub async fn send(&self, payload: &ServerPayload) -> Result<()> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(endpoint = %self.endpoint, %status, "Beacon delivered");
            Ok(())
        } else {
            Err(Error::Status(status))
        }
    }

    /// Fire-and-forget send
    ///
    /// Returns the background task handle, which never yields an error.
    /// Callers may drop it. Outside a Tokio runtime nothing is sent and the
    /// failure is reported to the sink.
    pub fn collect(&self, payload: ServerPayload) -> Option<JoinHandle<()>> {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                self.sink.emit(ERR_COLLECT, &Error::Runtime(e.to_string()));
                return None;
            }
        };

        let client = self.clone();
        Some(handle.spawn(async move {
            if let Err(e) = client.send(&payload).await {
                tracing::debug!(endpoint = %client.endpoint, error = %e, "Beacon not delivered");
                client.sink.emit(ERR_COLLECT, &e);
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Payload;
    use crate::settings::CollectorVersion;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_sink() -> (DebugSink, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let sink = DebugSink::from_fn(move |tag, _| {
            assert_eq!(tag, ERR_COLLECT);
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (sink, count)
    }

    fn pageview() -> ServerPayload {
        ServerPayload::pageview(CollectorVersion::V2, "site", Payload::default())
    }

    #[test]
    fn test_collect_outside_runtime_reports_once() {
        let (sink, count) = counting_sink();
        let client = CollectorClient::new("http://127.0.0.1:9/api/send", sink).unwrap();

        assert!(client.collect(pageview()).is_none());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_collect_to_malformed_endpoint_is_swallowed() {
        let (sink, count) = counting_sink();
        let client = CollectorClient::new("//api/collect", sink).unwrap();

        let handle = client.collect(pageview()).expect("runtime is available");
        handle.await.expect("task should not panic");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
