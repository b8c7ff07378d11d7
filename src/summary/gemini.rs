use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{Error, summary::Summarizer};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// How many times to try a request and how long to wait between attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// The number of attempts including the first, at least one is always made.
    pub max_attempts: u32,
    /// The wait after the first failed attempt.
    pub initial_backoff: Duration,
    /// The longest wait between attempts.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    /// The wait before the attempt after `attempt`, doubling each time.
    fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));

        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateContentResponse {
    /// The text of the first candidate, or `None` if it has no text.
    fn into_text(self) -> Option<String> {
        let text = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .map(|part| part.text)
            .collect::<String>();

        let text = text.trim();
        (!text.is_empty()).then(|| text.to_owned())
    }
}

/// A [Summarizer] backed by the Gemini `generateContent` API.
///
/// Transport errors, 429 and 5xx responses are retried with exponential
/// backoff. Other responses fail immediately.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    retry_policy: RetryPolicy,
}

impl GeminiClient {
    /// Create a client for `model` that gives up on a request after `timeout`.
    ///
    /// # Errors
    /// Returns [Error::SummaryFailed] if the HTTP client cannot be created.
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| Error::SummaryFailed(error.to_string()))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_owned(),
            model,
            api_key,
            retry_policy: RetryPolicy::default(),
        })
    }

    /// Send requests to `base_url` instead of the public API.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    /// Replace the default retry policy of three attempts.
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    async fn send_with_retry(&self, prompt: &str) -> Result<reqwest::Response, Error> {
        let body = GenerateContentRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };
        let attempts = self.retry_policy.max_attempts.max(1);

        for attempt in 1..=attempts {
            let result = self
                .client
                .post(self.endpoint())
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .await;

            let reason = match result {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) if is_retryable(response.status()) => {
                    format!("the AI service responded with {}", response.status())
                }
                Ok(response) => {
                    return Err(Error::SummaryFailed(format!(
                        "the AI service responded with {}",
                        response.status()
                    )));
                }
                Err(error) => error.to_string(),
            };

            if attempt == attempts {
                return Err(Error::SummaryFailed(reason));
            }

            let delay = self.retry_policy.delay(attempt);
            tracing::warn!(
                "Summary attempt {attempt}/{attempts} failed: {reason} (retrying in {delay:?})"
            );
            tokio::time::sleep(delay).await;
        }

        Err(Error::SummaryFailed("request exhausted retries".to_owned()))
    }
}

#[async_trait]
impl Summarizer for GeminiClient {
    async fn summarize(&self, prompt: &str) -> Result<String, Error> {
        let response = self.send_with_retry(prompt).await?;

        let response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|error| Error::SummaryFailed(error.to_string()))?;

        response
            .into_text()
            .ok_or_else(|| Error::SummaryFailed("the AI service returned no text".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use axum::{Json, Router, extract::State, http::HeaderMap, http::StatusCode, routing::post};
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use crate::{Error, summary::Summarizer};

    use super::{GeminiClient, RetryPolicy};

    /// Serve `router` on a random local port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        format!("http://{address}")
    }

    fn client(base_url: &str) -> GeminiClient {
        GeminiClient::new(
            "test-key".to_owned(),
            "gemini-test".to_owned(),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_base_url(base_url)
        .with_retry_policy(RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        })
    }

    fn reply(text: &str) -> Value {
        json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })
    }

    #[tokio::test]
    async fn sends_prompt_and_returns_text() {
        let router = Router::new().route(
            "/v1beta/models/gemini-test:generateContent",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers.get("x-goog-api-key").unwrap(), "test-key");
                let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
                Json(reply(&format!("summary of: {prompt}")))
            }),
        );
        let base_url = serve(router).await;

        let summary = client(&base_url).summarize("the table").await;

        assert_eq!(summary, Ok("summary of: the table".to_owned()));
    }

    #[tokio::test]
    async fn retries_server_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/v1beta/models/gemini-test:generateContent",
                post(|State(calls): State<Arc<AtomicUsize>>| async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(StatusCode::SERVICE_UNAVAILABLE)
                    } else {
                        Ok(Json(reply("ok")))
                    }
                }),
            )
            .with_state(calls.clone());
        let base_url = serve(router).await;

        let summary = client(&base_url).summarize("prompt").await;

        assert_eq!(summary, Ok("ok".to_owned()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_three_attempts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/v1beta/models/gemini-test:generateContent",
                post(|State(calls): State<Arc<AtomicUsize>>| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    StatusCode::TOO_MANY_REQUESTS
                }),
            )
            .with_state(calls.clone());
        let base_url = serve(router).await;

        let summary = client(&base_url).summarize("prompt").await;

        assert!(matches!(summary, Err(Error::SummaryFailed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/v1beta/models/gemini-test:generateContent",
                post(|State(calls): State<Arc<AtomicUsize>>| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    StatusCode::FORBIDDEN
                }),
            )
            .with_state(calls.clone());
        let base_url = serve(router).await;

        let summary = client(&base_url).summarize("prompt").await;

        assert!(matches!(summary, Err(Error::SummaryFailed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_reply_is_an_error() {
        let router = Router::new().route(
            "/v1beta/models/gemini-test:generateContent",
            post(|| async { Json(json!({ "candidates": [] })) }),
        );
        let base_url = serve(router).await;

        let summary = client(&base_url).summarize("prompt").await;

        assert_eq!(
            summary,
            Err(Error::SummaryFailed(
                "the AI service returned no text".to_owned()
            ))
        );
    }

    #[test]
    fn backoff_doubles_up_to_the_limit() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(300),
        };

        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(200));
        assert_eq!(policy.delay(3), Duration::from_millis(300));
    }
}
