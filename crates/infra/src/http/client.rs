//! Retrying HTTP client shared by the source adapters
//!
//! Every upstream call goes through [`HttpClient::send`]. Transient failures
//! (5xx, 429, connect and timeout errors) are retried under a
//! [`RetryPolicy`]; when a transient response names a `Retry-After` delay in
//! seconds, that delay replaces the backoff, capped at [`MAX_RETRY_AFTER`].

use std::time::Duration;

use almanac_domain::AlmanacError;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::errors::InfraError;

/// Longest `Retry-After` the client will honour before retrying.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// How many times a request is tried and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total tries, including the first one.
    pub attempts: u32,
    /// Wait before the first retry; doubles on every further retry.
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { attempts: 3, base_backoff: Duration::from_millis(200) }
    }
}

impl RetryPolicy {
    /// Wait before retry number `retry` (0-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base_backoff.saturating_mul(1 << retry.min(8))
    }
}

#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn request<U: reqwest::IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Send `request`, retrying transient failures.
    ///
    /// Once retries are exhausted the last response is returned whatever its
    /// status; only transport errors become `Err`.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, AlmanacError> {
        let attempts = self.retry.attempts.max(1);
        let mut retry = 0;

        loop {
            let attempt = request
                .try_clone()
                .ok_or_else(|| {
                    AlmanacError::Internal("streaming request body cannot be retried".into())
                })?
                .build()
                .map_err(into_domain)?;
            let target = format!("{} {}", attempt.method(), attempt.url());
            let last = retry + 1 >= attempts;
            debug!(%target, retry, "sending upstream request");

            let wait = match self.client.execute(attempt).await {
                Ok(response) if !last && is_transient_status(response.status()) => {
                    warn!(%target, status = %response.status(), retry, "transient upstream status");
                    retry_after(&response).unwrap_or_else(|| self.retry.backoff(retry))
                }
                Ok(response) => return Ok(response),
                Err(err) if !last && is_transient_error(&err) => {
                    warn!(%target, error = %err, retry, "upstream request failed");
                    self.retry.backoff(retry)
                }
                Err(err) => return Err(into_domain(err)),
            };

            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
            retry += 1;
        }
    }

    /// Send and decode a JSON body; non-success statuses become domain errors.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, AlmanacError> {
        self.send_ok(request).await?.json::<T>().await.map_err(into_domain)
    }

    /// Send and return the body as text; non-success statuses become domain
    /// errors.
    pub async fn send_text(&self, request: RequestBuilder) -> Result<String, AlmanacError> {
        self.send_ok(request).await?.text().await.map_err(into_domain)
    }

    async fn send_ok(&self, request: RequestBuilder) -> Result<Response, AlmanacError> {
        self.send(request).await?.error_for_status().map_err(into_domain)
    }
}

#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    timeout: Option<Duration>,
    user_agent: Option<String>,
    retry: RetryPolicy,
}

impl HttpClientBuilder {
    /// Per-attempt timeout; 30 seconds when unset.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.retry.attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.retry.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, AlmanacError> {
        let mut builder = ReqwestClient::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(30)))
            .no_proxy();
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        Ok(HttpClient { client: builder.build().map_err(into_domain)?, retry: self.retry })
    }
}

fn into_domain(err: reqwest::Error) -> AlmanacError {
    InfraError::from(err).into()
}

fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn is_transient_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

fn retry_after(response: &Response) -> Option<Duration> {
    let seconds = response.headers().get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
    Some(Duration::from_secs(seconds).min(MAX_RETRY_AFTER))
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use serde::Deserialize;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Feed {
        title: String,
    }

    fn quick_client(attempts: u32) -> HttpClient {
        HttpClient::builder()
            .max_attempts(attempts)
            .base_backoff(Duration::from_millis(5))
            .build()
            .expect("http client")
    }

    /// Responds with the given statuses in order, repeating the last one.
    fn statuses(codes: &'static [u16]) -> impl Fn(&wiremock::Request) -> ResponseTemplate {
        let calls = std::sync::atomic::AtomicUsize::new(0);
        move |_| {
            let call = calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let code = codes[call.min(codes.len() - 1)];
            ResponseTemplate::new(code).set_body_json(serde_json::json!({ "title": "Weekly" }))
        }
    }

    async fn request_count(server: &MockServer) -> usize {
        server.received_requests().await.unwrap().len()
    }

    #[test]
    fn backoff_doubles_per_retry() {
        let policy = RetryPolicy { attempts: 5, base_backoff: Duration::from_millis(100) };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
        assert_eq!(policy.backoff(20), policy.backoff(8));
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(statuses(&[502, 500, 200])).mount(&server).await;

        let client = quick_client(3);
        let feed: Feed = client.send_json(client.request(Method::GET, server.uri())).await.unwrap();

        assert_eq!(feed.title, "Weekly");
        assert_eq!(request_count(&server).await, 3);
    }

    #[tokio::test]
    async fn last_transient_response_is_returned_once_attempts_run_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(statuses(&[503])).mount(&server).await;

        let client = quick_client(2);
        let response = client.send(client.request(Method::GET, server.uri())).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(request_count(&server).await, 2);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/private"))
            .respond_with(statuses(&[401]))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(statuses(&[404]))
            .mount(&server)
            .await;

        let client = quick_client(3);
        let private = client
            .send_json::<Feed>(client.request(Method::GET, format!("{}/private", server.uri())))
            .await;
        let missing = client
            .send_text(client.request(Method::GET, format!("{}/missing", server.uri())))
            .await;

        assert!(matches!(private, Err(AlmanacError::Auth(_))));
        assert!(matches!(missing, Err(AlmanacError::NotFound(_))));
        assert_eq!(request_count(&server).await, 2);
    }

    #[tokio::test]
    async fn retry_after_replaces_backoff() {
        let server = MockServer::start().await;
        let calls = std::sync::atomic::AtomicUsize::new(0);
        Mock::given(method("GET"))
            .respond_with(move |_: &wiremock::Request| {
                if calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
                    ResponseTemplate::new(429).insert_header("retry-after", "0")
                } else {
                    ResponseTemplate::new(200).set_body_string("fine")
                }
            })
            .mount(&server)
            .await;

        let client = HttpClient::builder()
            .max_attempts(2)
            .base_backoff(Duration::from_secs(60))
            .build()
            .unwrap();
        let body = tokio::time::timeout(
            Duration::from_secs(5),
            client.send_text(client.request(Method::GET, server.uri())),
        )
        .await
        .expect("retry should not wait for the backoff")
        .unwrap();

        assert_eq!(body, "fine");
    }

    #[tokio::test]
    async fn refused_connection_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = quick_client(2);
        let result = client.send(client.request(Method::GET, &url)).await;

        assert!(matches!(result, Err(AlmanacError::Network(_))), "got {result:?}");
    }

    #[tokio::test]
    async fn malformed_json_is_a_source_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = quick_client(1);
        let result = client.send_json::<Feed>(client.request(Method::GET, server.uri())).await;
        assert!(matches!(result, Err(AlmanacError::Source(_))));
    }
}
