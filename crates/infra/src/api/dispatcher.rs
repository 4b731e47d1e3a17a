//! Request dispatch and response classification
//!
//! One transport call per request, no retries. A response whose status
//! does not start with `2` becomes `FeedError::Api`.

use std::sync::Arc;

use feedstream_core::events::{ClientEventPayload, EventBus};
use feedstream_core::request::HttpTransport;
use feedstream_domain::{EnrichedRequest, FeedError, HttpMethod, RawResponse, Result};
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Sends enriched requests and classifies their outcome
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
    events: EventBus,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn HttpTransport>, events: EventBus) -> Self {
        Self { transport, events }
    }

    /// Send `request` and return the decoded body of a 2xx response.
    ///
    /// # Errors
    /// - `FeedError::Transport` if no response arrived
    /// - `FeedError::Api` carrying status and body for any other status
    pub async fn send(&self, request: EnrichedRequest) -> Result<Value> {
        self.dispatch(request).await.0
    }

    pub async fn get(&self, request: EnrichedRequest) -> Result<Value> {
        self.send(with_method(request, HttpMethod::Get)).await
    }

    pub async fn post(&self, request: EnrichedRequest) -> Result<Value> {
        self.send(with_method(request, HttpMethod::Post)).await
    }

    pub async fn put(&self, request: EnrichedRequest) -> Result<Value> {
        self.send(with_method(request, HttpMethod::Put)).await
    }

    pub async fn delete(&self, request: EnrichedRequest) -> Result<Value> {
        self.send(with_method(request, HttpMethod::Delete)).await
    }

    /// Like [`send`](Self::send), also reporting the outcome to `callback`.
    ///
    /// The callback runs exactly once, before the returned future resolves,
    /// with the same result and the raw response when one arrived.
    pub async fn send_with_callback<F>(
        &self,
        request: EnrichedRequest,
        callback: F,
    ) -> Result<Value>
    where
        F: FnOnce(std::result::Result<&Value, &FeedError>, Option<&RawResponse>) + Send,
    {
        let (result, raw) = self.dispatch(request).await;
        callback(result.as_ref(), raw.as_ref());
        result
    }

    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn dispatch(&self, request: EnrichedRequest) -> (Result<Value>, Option<RawResponse>) {
        let method = request.method;
        let url = request.url.clone();

        self.events.emit(&ClientEventPayload::request(method, url.as_str()));

        let (result, raw) = match self.transport.execute(request).await {
            Ok(raw) => (classify(&raw), Some(raw)),
            Err(err) => (Err(err), None),
        };

        match &result {
            Ok(_) => debug!(status = ?raw.as_ref().map(|r| r.status), "request succeeded"),
            Err(err) => {
                warn!(
                    kind = %err.kind(),
                    status = ?err.status_code(),
                    error = %err,
                    "request failed"
                );
            }
        }

        self.events.emit(&ClientEventPayload::response(
            method,
            url,
            raw.as_ref().map(|r| r.status),
            result.as_ref().err().map(FeedError::kind),
        ));

        (result, raw)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").field("events", &self.events).finish_non_exhaustive()
    }
}

/// Map a raw response to the decoded body or an API failure.
pub fn classify(response: &RawResponse) -> Result<Value> {
    if response.is_success() {
        Ok(response.body.clone())
    } else {
        Err(FeedError::api_failure(response.status, response.body.clone()))
    }
}

fn with_method(mut request: EnrichedRequest, method: HttpMethod) -> EnrichedRequest {
    request.method = method;
    request
}
