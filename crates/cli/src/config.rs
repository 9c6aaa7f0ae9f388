use labforge_core::Config;

use crate::cli::CliArgs;

/// Apply command-line overrides on top of the environment-loaded config.
pub fn apply_overrides(mut config: Config, args: &CliArgs) -> Config {
    if let Some(provider) = &args.provider {
        config.llm.provider = provider.clone();
    }
    if let Some(fallback) = &args.fallback_provider {
        config.llm.fallback_provider = Some(fallback.clone());
    }
    if let Some(secs) = args.timeout_secs {
        config.summarizer.processing_timeout_secs = secs;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn flags_override_environment_values() {
        let args = CliArgs::try_parse_from([
            "labforge",
            "a.md",
            "--provider",
            "claude",
            "--fallback-provider",
            "ollama",
            "--timeout-secs",
            "42",
        ])
        .unwrap();
        let config = apply_overrides(Config::for_profile("cli-test-unset"), &args);
        assert_eq!(config.llm.provider, "claude");
        assert_eq!(config.llm.fallback_provider.as_deref(), Some("ollama"));
        assert_eq!(config.summarizer.processing_timeout_secs, 42);
    }

    #[test]
    fn absent_flags_keep_loaded_values() {
        let args = CliArgs::try_parse_from(["labforge", "a.md"]).unwrap();
        let loaded = Config::for_profile("cli-test-unset");
        let expected_timeout = loaded.summarizer.processing_timeout_secs;
        let expected_provider = loaded.llm.provider.clone();
        let config = apply_overrides(loaded, &args);
        assert_eq!(config.llm.provider, expected_provider);
        assert_eq!(config.summarizer.processing_timeout_secs, expected_timeout);
    }
}
