//! Retry-with-backoff and backend fallback behind [`CompletionService`].

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use labforge_core::config::{Config, RetryConfig};

use crate::completion::{CompletionFailure, CompletionService, FailureKind};
use crate::provider::{LlmError, LlmProvider, Message};
use crate::providers::create_provider;

const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert educational content analyst. \
You read source material carefully and answer exactly in the format requested.";

/// Exponential backoff schedule applied per backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            initial_delay: Duration::from_millis(cfg.initial_delay_ms),
            max_delay: Duration::from_millis(cfg.max_delay_ms),
            backoff_factor: cfg.backoff_factor,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0 = first retry).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.backoff_factor.max(1.0).powi(retry as i32);
        let millis = (self.initial_delay.as_millis() as f64 * factor) as u64;
        Duration::from_millis(millis).min(self.max_delay)
    }
}

/// Completion service over an ordered list of chat backends.
///
/// Backends are tried in order. Each gets up to `max_attempts` tries while its
/// failures are retryable; the last failure is returned once all are spent.
pub struct ResilientCompletion {
    backends: Vec<Box<dyn LlmProvider>>,
    policy: RetryPolicy,
    system_prompt: String,
    temperature: f32,
    max_tokens: u32,
}

impl ResilientCompletion {
    pub fn new(primary: Box<dyn LlmProvider>) -> Self {
        Self {
            backends: vec![primary],
            policy: RetryPolicy::default(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: 0.3,
            max_tokens: 2048,
        }
    }

    pub fn with_fallback(mut self, fallback: Box<dyn LlmProvider>) -> Self {
        self.backends.push(fallback);
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Build primary (and optional fallback) backends from config.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let primary = create_provider(&config.llm.provider, &config.llm, &config.ollama)?;
        let mut service = Self::new(primary)
            .with_policy(RetryPolicy::from(&config.retry))
            .with_sampling(config.llm.temperature, config.llm.max_tokens);

        if let Some(name) = config
            .llm
            .fallback_provider
            .as_deref()
            .filter(|name| *name != config.llm.provider)
        {
            match create_provider(name, &config.llm, &config.ollama) {
                Ok(fallback) => service = service.with_fallback(fallback),
                Err(e) => warn!(provider = %name, error = %e, "fallback provider unavailable"),
            }
        }
        Ok(service)
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    async fn attempt(&self, backend: &dyn LlmProvider, prompt: &str) -> Result<String, CompletionFailure> {
        let messages = vec![
            Message::system(self.system_prompt.clone()),
            Message::user(prompt),
        ];
        let text = backend
            .complete(messages, self.temperature, self.max_tokens)
            .await?;
        if text.trim().is_empty() {
            return Err(CompletionFailure::new(
                FailureKind::MalformedResponse,
                format!("{} returned an empty completion", backend.name()),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl CompletionService for ResilientCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionFailure> {
        let mut last_failure = None;

        for (index, backend) in self.backends.iter().enumerate() {
            if index > 0 {
                warn!(backend = backend.name(), "falling back to next completion backend");
            }

            for attempt in 0..self.policy.max_attempts {
                debug!(
                    backend = backend.name(),
                    attempt = attempt + 1,
                    prompt_chars = prompt.len(),
                    "completion request"
                );
                let failure = match self.attempt(backend.as_ref(), prompt).await {
                    Ok(text) => return Ok(text),
                    Err(failure) => failure,
                };

                let retry = failure.is_retryable() && attempt + 1 < self.policy.max_attempts;
                if retry {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        backend = backend.name(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %failure,
                        "completion failed, retrying"
                    );
                    last_failure = Some(failure);
                    tokio::time::sleep(delay).await;
                } else {
                    warn!(backend = backend.name(), error = %failure, "completion backend gave up");
                    last_failure = Some(failure);
                    break;
                }
            }
        }

        let failure = last_failure.unwrap_or_else(|| {
            CompletionFailure::new(FailureKind::NotConfigured, "no completion backends")
        });
        error!(error = %failure, "all completion backends failed");
        Err(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
            backoff_factor: 2.0,
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(350));
        assert_eq!(policy.delay_for(7), Duration::from_millis(350));
    }

    #[test]
    fn policy_from_config_never_zero_attempts() {
        let cfg = RetryConfig {
            max_attempts: 0,
            ..RetryConfig::default()
        };
        assert_eq!(RetryPolicy::from(&cfg).max_attempts, 1);
    }
}
