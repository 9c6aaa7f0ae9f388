//! The text-completion boundary consumed by the summarization pipeline.
//!
//! Everything behind [`CompletionService`] (chat formatting, backends, retry,
//! fallback) is invisible to callers: they see a prompt go in and either text
//! or a [`CompletionFailure`] come out.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::provider::LlmError;

/// Single-prompt text completion.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionFailure>;
}

/// Coarse failure classes surfaced at the completion boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    RateLimited,
    Network,
    Api,
    MalformedResponse,
    NotConfigured,
}

impl FailureKind {
    /// Whether another attempt against the same backend may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FailureKind::Timeout
                | FailureKind::RateLimited
                | FailureKind::Network
                | FailureKind::MalformedResponse
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Timeout => "timeout",
            FailureKind::RateLimited => "rate limited",
            FailureKind::Network => "network error",
            FailureKind::Api => "api error",
            FailureKind::MalformedResponse => "malformed response",
            FailureKind::NotConfigured => "not configured",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct CompletionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl CompletionFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<LlmError> for CompletionFailure {
    fn from(err: LlmError) -> Self {
        let kind = match &err {
            LlmError::Timeout => FailureKind::Timeout,
            LlmError::RateLimited { .. } => FailureKind::RateLimited,
            LlmError::HttpError(e) if e.is_timeout() => FailureKind::Timeout,
            LlmError::HttpError(_) => FailureKind::Network,
            // 5xx is the provider having a bad moment; 4xx is our request.
            LlmError::ApiError { status, .. } if *status >= 500 => FailureKind::Network,
            LlmError::ApiError { .. } => FailureKind::Api,
            LlmError::ParseError(_) => FailureKind::MalformedResponse,
            LlmError::NotConfigured(_) => FailureKind::NotConfigured,
        };
        Self::new(kind, err.to_string())
    }
}

/// Scripted completion service for exercising the pipeline without a backend.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    type Responder = dyn Fn(usize, &str) -> Result<String, CompletionFailure> + Send + Sync;

    /// Answers each call through a responder closure and records every prompt.
    ///
    /// The responder receives the 0-based call number and the prompt text.
    pub struct ScriptedCompletion {
        responder: Box<Responder>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedCompletion {
        pub fn new<F>(responder: F) -> Self
        where
            F: Fn(usize, &str) -> Result<String, CompletionFailure> + Send + Sync + 'static,
        {
            Self {
                responder: Box::new(responder),
                prompts: Mutex::new(Vec::new()),
            }
        }

        /// Always answer with the same text.
        pub fn constant(text: &str) -> Self {
            let text = text.to_string();
            Self::new(move |_, _| Ok(text.clone()))
        }

        /// Answer with `text` except on call `n`, which fails with `kind`.
        pub fn failing_on_call(n: usize, kind: FailureKind, text: &str) -> Self {
            let text = text.to_string();
            Self::new(move |call, _| {
                if call == n {
                    Err(CompletionFailure::new(kind, format!("scripted failure on call {n}")))
                } else {
                    Ok(text.clone())
                }
            })
        }

        /// Every prompt received so far, in call order.
        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionService for ScriptedCompletion {
        async fn complete(&self, prompt: &str) -> Result<String, CompletionFailure> {
            let call = {
                let mut prompts = self.prompts.lock().unwrap();
                prompts.push(prompt.to_string());
                prompts.len() - 1
            };
            (self.responder)(call, prompt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::ScriptedCompletion;
    use super::*;

    #[test]
    fn llm_errors_map_to_kinds() {
        let cases = [
            (LlmError::Timeout, FailureKind::Timeout),
            (LlmError::RateLimited { status: 429 }, FailureKind::RateLimited),
            (
                LlmError::ApiError { status: 503, body: "overloaded".into() },
                FailureKind::Network,
            ),
            (
                LlmError::ApiError { status: 400, body: "bad request".into() },
                FailureKind::Api,
            ),
            (LlmError::ParseError("missing".into()), FailureKind::MalformedResponse),
            (LlmError::NotConfigured("no key".into()), FailureKind::NotConfigured),
        ];
        for (err, expected) in cases {
            assert_eq!(CompletionFailure::from(err).kind, expected);
        }
    }

    #[test]
    fn retryable_kinds() {
        assert!(FailureKind::Timeout.is_retryable());
        assert!(FailureKind::RateLimited.is_retryable());
        assert!(!FailureKind::Api.is_retryable());
        assert!(!FailureKind::NotConfigured.is_retryable());
    }

    #[test]
    fn failure_display_includes_kind_and_message() {
        let f = CompletionFailure::new(FailureKind::RateLimited, "slow down");
        assert_eq!(f.to_string(), "rate limited: slow down");
    }

    #[tokio::test]
    async fn scripted_records_prompts_and_fails_on_schedule() {
        let svc = ScriptedCompletion::failing_on_call(1, FailureKind::Timeout, "ok");
        assert_eq!(svc.complete("first").await.unwrap(), "ok");
        let err = svc.complete("second").await.unwrap_err();
        assert_eq!(err.kind, FailureKind::Timeout);
        assert_eq!(svc.prompts(), vec!["first".to_string(), "second".to_string()]);
    }
}
