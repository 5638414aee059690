//! Signed store calls with bounded retries and in-flight deduplication.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};
use url::Url;

use crate::app::{BrowseError, Result};
use crate::dynamo::{encode_expression, PendingRequestKey, QueryExpression};
use crate::fetcher::{HttpRequest, HttpTransport};
use crate::signer::RequestSigner;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const CONTENT_TYPE: &str = "application/x-amz-json-1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before retry `n` is `n * backoff`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }
}

type SharedBody = Shared<BoxFuture<'static, Result<Vec<u8>>>>;
type PendingMap = Arc<Mutex<HashMap<PendingRequestKey, SharedBody>>>;

pub struct RetryingTransport {
    transport: Arc<dyn HttpTransport + Send + Sync>,
    signer: Arc<RequestSigner>,
    endpoint: Url,
    target_prefix: String,
    policy: RetryPolicy,
    pending: PendingMap,
}

impl RetryingTransport {
    pub fn new(
        transport: Arc<dyn HttpTransport + Send + Sync>,
        signer: Arc<RequestSigner>,
        endpoint: Url,
        target_prefix: impl Into<String>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            signer,
            endpoint,
            target_prefix: target_prefix.into(),
            policy,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of distinct requests currently on the wire.
    pub fn in_flight(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Execute `expression`, joining an identical request if one is in flight.
    pub async fn execute(&self, expression: &QueryExpression) -> Result<Vec<u8>> {
        let key = expression.pending_key();

        let shared = {
            let mut pending = lock(&self.pending);
            match pending.get(&key) {
                Some(existing) => {
                    debug!("Joining in-flight request {}", key);
                    existing.clone()
                }
                None => {
                    let request = self.prepare(expression)?;
                    let shared = self.spawn_request(key.clone(), request);
                    pending.insert(key, shared.clone());
                    shared
                }
            }
        };

        shared.await
    }

    /// Build the signed HTTP request for `expression`. Signing failures are
    /// returned here and never retried.
    pub fn prepare(&self, expression: &QueryExpression) -> Result<HttpRequest> {
        let body = encode_expression(expression)?;
        let target = format!("{}.{}", self.target_prefix, expression.operation().as_str());
        let headers = vec![
            ("content-type".to_string(), CONTENT_TYPE.to_string()),
            ("x-amz-target".to_string(), target),
        ];
        let headers = self
            .signer
            .authorize("POST", &self.endpoint, headers, &body, Utc::now())?;

        Ok(HttpRequest {
            url: self.endpoint.to_string(),
            headers,
            body,
        })
    }

    fn spawn_request(&self, key: PendingRequestKey, request: HttpRequest) -> SharedBody {
        let transport = self.transport.clone();
        let pending = self.pending.clone();
        let policy = self.policy;

        // The entry is released by the request itself, so it goes away even
        // if every waiter has been dropped.
        let handle = tokio::spawn(async move {
            let result = send_with_retries(transport.as_ref(), &request, policy).await;
            lock(&pending).remove(&key);
            result
        });

        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => Err(BrowseError::Network(format!("Request task failed: {}", e))),
            }
        }
        .boxed()
        .shared()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Send `request`, retrying 5xx responses and connection failures.
pub async fn send_with_retries(
    transport: &(dyn HttpTransport + Send + Sync),
    request: &HttpRequest,
    policy: RetryPolicy,
) -> Result<Vec<u8>> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let error = match transport.post(request).await {
            Ok(response) if response.status == 200 => return Ok(response.body),
            Ok(response) => BrowseError::Aws {
                status: response.status,
                body: response.body_text(),
            },
            Err(e) => e,
        };

        if !error.is_retryable() || attempt >= max_attempts {
            return Err(error);
        }

        let delay = policy.delay_for(attempt);
        warn!(
            "Store request failed (attempt {}/{}): {}; retrying in {:?}",
            attempt, max_attempts, error, delay
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
