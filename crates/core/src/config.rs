use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

/// Parse a profiled env var, keeping `default` when unset or malformed.
fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub llm: LlmConfig,
    pub ollama: OllamaConfig,
    pub retry: RetryConfig,
    pub summarizer: SummarizerConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `LABFORGE_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("LABFORGE_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            llm: LlmConfig::from_env_profiled(p),
            ollama: OllamaConfig::from_env_profiled(p),
            retry: RetryConfig::from_env_profiled(p),
            summarizer: SummarizerConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  llm:         provider={}, fallback={}",
            self.llm.provider,
            self.llm.fallback_provider.as_deref().unwrap_or("(none)")
        );
        tracing::info!("  ollama:      url={}, model={}", self.ollama.url, self.ollama.model);
        tracing::info!(
            "  retry:       attempts={}, initial={}ms, max={}ms",
            self.retry.max_attempts,
            self.retry.initial_delay_ms,
            self.retry.max_delay_ms
        );
        tracing::info!(
            "  summarizer:  section_max={}, semantic_max={}, max_chunks={}",
            self.summarizer.section_max_chars,
            self.summarizer.semantic_max_chars,
            self.summarizer
                .max_chunks
                .map(|n| n.to_string())
                .unwrap_or_else(|| "(unbounded)".into())
        );
    }

    /// Return a redacted view safe for printing (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "llm": {
                "provider": self.llm.provider,
                "fallback_provider": self.llm.fallback_provider,
                "configured": self.llm.is_configured(),
                "request_timeout_secs": self.llm.request_timeout_secs,
            },
            "ollama": { "url": self.ollama.url, "model": self.ollama.model },
            "retry": self.retry,
            "summarizer": self.summarizer,
        })
    }
}

// ── LLM (OpenAI / Anthropic / Ollama) ────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai", "anthropic" (or "claude"), "ollama"
    pub provider: String,
    /// Backend tried after the primary gives up.
    pub fallback_provider: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            provider: profiled_env_or(p, "LLM_PROVIDER", "ollama"),
            fallback_provider: profiled_env_opt(p, "LLM_FALLBACK_PROVIDER"),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_model: profiled_env_or(p, "OPENAI_MODEL", "gpt-4o"),
            openai_base_url: profiled_env_opt(p, "OPENAI_BASE_URL"),
            anthropic_api_key: profiled_env_opt(p, "ANTHROPIC_API_KEY"),
            anthropic_model: profiled_env_or(p, "ANTHROPIC_MODEL", "claude-sonnet-4-5-20250929"),
            temperature: profiled_env_parse(p, "LLM_TEMPERATURE", 0.3),
            max_tokens: profiled_env_parse(p, "LLM_MAX_TOKENS", 2048),
            request_timeout_secs: profiled_env_parse(p, "LLM_REQUEST_TIMEOUT_SECS", 120),
        }
    }

    /// Whether the named backend has the credentials it needs.
    pub fn provider_configured(&self, provider: &str) -> bool {
        match provider {
            "openai" => self.openai_api_key.is_some(),
            "anthropic" | "claude" => self.anthropic_api_key.is_some(),
            "ollama" => true,
            _ => false,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider_configured(&self.provider)
    }
}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
}

impl OllamaConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(p, "OLLAMA_URL", "http://localhost:11434"),
            model: profiled_env_or(p, "OLLAMA_MODEL", "llama3.2"),
        }
    }
}

// ── Retry / backoff ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per backend, including the first one.
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            max_delay_ms: 8_000,
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            max_attempts: profiled_env_parse(p, "LLM_MAX_ATTEMPTS", d.max_attempts).max(1),
            initial_delay_ms: profiled_env_parse(p, "LLM_RETRY_INITIAL_MS", d.initial_delay_ms),
            max_delay_ms: profiled_env_parse(p, "LLM_RETRY_MAX_MS", d.max_delay_ms),
            backoff_factor: profiled_env_parse(p, "LLM_RETRY_BACKOFF", d.backoff_factor),
        }
    }
}

// ── Summarizer ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// A heading only closes the open section once it holds more than this.
    pub section_min_chars: usize,
    /// Sections above this size are force-split at a sentence boundary.
    pub section_max_chars: usize,
    /// Trailing characters carried into a continued section.
    pub section_overlap_chars: usize,
    /// Fraction of `section_max_chars` at which a force-split is placed.
    pub section_split_ratio: f64,
    pub semantic_max_chars: usize,
    pub semantic_overlap_sentences: usize,
    /// Preceding chunks folded into each context digest.
    pub context_window: usize,
    pub context_excerpt_chars: usize,
    pub continuation_threshold: f64,
    pub reading_chars_per_minute: usize,
    /// Refuse documents that segment into more chunks than this.
    pub max_chunks: Option<usize>,
    /// Caller-level abort for a whole document run.
    pub processing_timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            section_min_chars: 100,
            section_max_chars: 3_000,
            section_overlap_chars: 500,
            section_split_ratio: 0.8,
            semantic_max_chars: 4_000,
            semantic_overlap_sentences: 2,
            context_window: 2,
            context_excerpt_chars: 200,
            continuation_threshold: 0.7,
            reading_chars_per_minute: 1_000,
            max_chunks: None,
            processing_timeout_secs: 300,
        }
    }
}

impl SummarizerConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            section_min_chars: profiled_env_parse(p, "SECTION_MIN_CHARS", d.section_min_chars),
            section_max_chars: profiled_env_parse(p, "SECTION_MAX_CHARS", d.section_max_chars),
            section_overlap_chars: profiled_env_parse(
                p,
                "SECTION_OVERLAP_CHARS",
                d.section_overlap_chars,
            ),
            section_split_ratio: profiled_env_parse(
                p,
                "SECTION_SPLIT_RATIO",
                d.section_split_ratio,
            ),
            semantic_max_chars: profiled_env_parse(p, "SEMANTIC_MAX_CHARS", d.semantic_max_chars),
            semantic_overlap_sentences: profiled_env_parse(
                p,
                "SEMANTIC_OVERLAP_SENTENCES",
                d.semantic_overlap_sentences,
            ),
            context_window: profiled_env_parse(p, "CONTEXT_WINDOW", d.context_window),
            context_excerpt_chars: profiled_env_parse(
                p,
                "CONTEXT_EXCERPT_CHARS",
                d.context_excerpt_chars,
            ),
            continuation_threshold: profiled_env_parse(
                p,
                "CONTINUATION_THRESHOLD",
                d.continuation_threshold,
            ),
            reading_chars_per_minute: profiled_env_parse(
                p,
                "READING_CHARS_PER_MINUTE",
                d.reading_chars_per_minute,
            )
            .max(1),
            max_chunks: profiled_env_opt(p, "MAX_CHUNKS").and_then(|v| v.parse().ok()),
            processing_timeout_secs: profiled_env_parse(
                p,
                "PROCESSING_TIMEOUT_SECS",
                d.processing_timeout_secs,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizer_defaults_match_pipeline_constants() {
        let cfg = SummarizerConfig::default();
        assert_eq!(cfg.section_min_chars, 100);
        assert_eq!(cfg.section_max_chars, 3_000);
        assert_eq!(cfg.section_overlap_chars, 500);
        assert_eq!(cfg.semantic_max_chars, 4_000);
        assert_eq!(cfg.semantic_overlap_sentences, 2);
        assert!((cfg.continuation_threshold - 0.7).abs() < f64::EPSILON);
        assert!(cfg.max_chunks.is_none());
    }

    #[test]
    fn unknown_provider_is_not_configured() {
        let cfg = LlmConfig {
            provider: "mystery".into(),
            fallback_provider: None,
            openai_api_key: None,
            openai_model: "gpt-4o".into(),
            openai_base_url: None,
            anthropic_api_key: None,
            anthropic_model: "claude".into(),
            temperature: 0.3,
            max_tokens: 2048,
            request_timeout_secs: 120,
        };
        assert!(!cfg.is_configured());
        assert!(cfg.provider_configured("ollama"));
        assert!(!cfg.provider_configured("openai"));
    }

    #[test]
    fn profile_label_defaults() {
        let cfg = Config::for_profile("");
        assert_eq!(cfg.profile_label(), "default");
        let redacted = cfg.redacted_summary();
        assert_eq!(redacted["profile"], "default");
        assert!(redacted["llm"].get("openai_api_key").is_none());
    }
}
