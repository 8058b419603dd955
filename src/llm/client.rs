//! Typed wrapper over the external completion oracle.
//!
//! The pipeline never talks to a concrete LLM provider: it depends on the
//! [`CompletionProvider`] trait and lets the embedding application plug in
//! an implementation. [`LlmClient`] wraps a shared provider handle with
//! per-call deadlines and bounded retry, the only places the core spends
//! wall-clock time waiting on the outside world.
//!
//! Providers must distinguish transient failures (rate limits, 5xx,
//! upstream timeouts) from fatal ones (auth, malformed request): only the
//! former are retried.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, warn};

/// One completion request. `timeout` overrides the client default for
/// this call only.
#[derive(Clone, Debug, Default)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout: Option<Duration>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Provider-side failure, split by retryability.
#[derive(Debug, Error, Diagnostic)]
pub enum ProviderError {
    /// Worth retrying: rate limits, 5xx, upstream timeouts, back-pressure.
    #[error("transient provider error: {message}")]
    #[diagnostic(code(deckweaver::llm::transient))]
    Transient { message: String },

    /// Not worth retrying: auth failures, malformed requests.
    #[error("fatal provider error: {message}")]
    #[diagnostic(code(deckweaver::llm::fatal))]
    Fatal { message: String },
}

impl ProviderError {
    pub fn transient(message: impl Into<String>) -> Self {
        ProviderError::Transient {
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        ProviderError::Fatal {
            message: message.into(),
        }
    }
}

/// The completion oracle boundary: `complete(prompt, options) →
/// text`. Implementations must honor the request timeout hint where they
/// can and surface transient vs. fatal errors distinctly.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;

    /// Human-friendly provider name for logs.
    fn name(&self) -> &str {
        "completion-provider"
    }
}

/// Client-side failure after deadlines and retries are applied.
#[derive(Debug, Error, Diagnostic)]
pub enum LlmError {
    /// Every attempt exceeded the per-call deadline.
    #[error("LLM call timed out after {attempts} attempt(s) of {per_call:?}")]
    #[diagnostic(code(deckweaver::llm::timeout))]
    Timeout { per_call: Duration, attempts: u32 },

    /// The provider reported a non-retryable failure.
    #[error("LLM call failed: {message}")]
    #[diagnostic(code(deckweaver::llm::failed))]
    Fatal { message: String },

    /// Transient failures persisted through the whole retry budget.
    #[error("LLM call gave up after {attempts} attempt(s): {last}")]
    #[diagnostic(code(deckweaver::llm::exhausted))]
    Exhausted { attempts: u32, last: String },
}

impl LlmError {
    /// Whether the failure was a deadline expiry (as opposed to a
    /// provider-reported error).
    pub fn is_timeout(&self) -> bool {
        matches!(self, LlmError::Timeout { .. })
    }
}

/// Retrying, deadline-enforcing wrapper around a shared provider.
///
/// Shared across jobs; cloning is cheap (one `Arc`). Callers must
/// tolerate back-pressure: a provider may reject with a transient error
/// when upstream rate limits trigger, which consumes retry budget here.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use deckweaver::llm::{CompletionProvider, LlmClient};
///
/// # fn provider() -> Arc<dyn CompletionProvider> { unimplemented!() }
/// let client = LlmClient::new(provider())
///     .with_timeout(Duration::from_secs(30))
///     .with_max_attempts(2);
/// ```
#[derive(Clone)]
pub struct LlmClient {
    provider: Arc<dyn CompletionProvider>,
    timeout: Duration,
    max_attempts: u32,
    backoff_base: Duration,
}

impl LlmClient {
    /// Default per-call deadline.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
    /// Default attempt budget per call (1 initial + 2 retries).
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    /// First backoff delay; doubles per retry, plus jitter.
    pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(500);

    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            timeout: Self::DEFAULT_TIMEOUT,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            backoff_base: Self::DEFAULT_BACKOFF_BASE,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    /// Convenience wrapper for a bare-prompt call.
    pub async fn generate(&self, prompt: impl Into<String>) -> Result<String, LlmError> {
        self.generate_with(CompletionRequest::new(prompt)).await
    }

    /// Run one completion with deadline + retry semantics. The reply is
    /// returned verbatim; JSON extraction is the caller's concern
    /// ([`crate::llm::extraction`]).
    pub async fn generate_with(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let per_call = request.timeout.unwrap_or(self.timeout);
        let mut last_transient = String::new();
        let mut timed_out = false;

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                let delay = self.backoff_delay(attempt);
                debug!(attempt, ?delay, "backing off before LLM retry");
                tokio::time::sleep(delay).await;
            }
            match tokio::time::timeout(per_call, self.provider.complete(request.clone())).await {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(ProviderError::Fatal { message })) => {
                    return Err(LlmError::Fatal { message });
                }
                Ok(Err(ProviderError::Transient { message })) => {
                    warn!(
                        attempt,
                        provider = self.provider.name(),
                        %message,
                        "transient LLM failure"
                    );
                    timed_out = false;
                    last_transient = message;
                }
                Err(_) => {
                    warn!(
                        attempt,
                        provider = self.provider.name(),
                        ?per_call,
                        "LLM call exceeded per-call deadline"
                    );
                    timed_out = true;
                }
            }
        }

        if timed_out {
            Err(LlmError::Timeout {
                per_call,
                attempts: self.max_attempts,
            })
        } else {
            Err(LlmError::Exhausted {
                attempts: self.max_attempts,
                last: last_transient,
            })
        }
    }

    /// Exponential backoff with jitter: `base * 2^(attempt-2)` plus up to
    /// half the base again.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        use rand::Rng;
        let exp = attempt.saturating_sub(2).min(8);
        let base_ms = self.backoff_base.as_millis() as u64;
        let jitter = rand::rng().random_range(0..=base_ms / 2);
        Duration::from_millis(base_ms.saturating_mul(1 << exp) + jitter)
    }
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("provider", &self.provider.name())
            .field("timeout", &self.timeout)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyProvider {
        calls: AtomicU32,
        fail_first: u32,
    }

    #[async_trait]
    impl CompletionProvider for FlakyProvider {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                Err(ProviderError::transient("rate limited"))
            } else {
                Ok("ok".to_string())
            }
        }
    }

    struct AuthFailProvider;

    #[async_trait]
    impl CompletionProvider for AuthFailProvider {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, ProviderError> {
            Err(ProviderError::fatal("invalid api key"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried() {
        let provider = Arc::new(FlakyProvider {
            calls: AtomicU32::new(0),
            fail_first: 2,
        });
        let client = LlmClient::new(provider.clone());
        let reply = client.generate("hello").await.unwrap();
        assert_eq!(reply, "ok");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_budget_is_bounded() {
        let provider = Arc::new(FlakyProvider {
            calls: AtomicU32::new(0),
            fail_first: 10,
        });
        let client = LlmClient::new(provider.clone());
        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, LlmError::Exhausted { attempts: 3, .. }));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_errors_are_not_retried() {
        let client = LlmClient::new(Arc::new(AuthFailProvider));
        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, LlmError::Fatal { .. }));
    }

    struct HangingProvider;

    #[async_trait]
    impl CompletionProvider for HangingProvider {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expiry_becomes_timeout() {
        let client = LlmClient::new(Arc::new(HangingProvider))
            .with_timeout(Duration::from_millis(100))
            .with_max_attempts(2);
        let err = client.generate("hello").await.unwrap_err();
        assert!(err.is_timeout());
    }
}
