mod cli;
mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};

use labforge_core::config::load_dotenv;
use labforge_core::Config;
use labforge_ingest::{extract_text, DocumentSummarizer, PipelineConfig};
use labforge_llm::ResilientCompletion;

use crate::cli::CliArgs;
use crate::config::apply_overrides;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let args = CliArgs::parse();
    let config = apply_overrides(Config::from_env(), &args);
    config.log_summary();

    let completion = ResilientCompletion::from_config(&config)
        .context("failed to create completion provider")?;
    info!(backends = ?completion.backend_names(), "completion service ready");

    let filename = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("failed to read '{}'", args.file.display()))?;
    let document = extract_text(&bytes, &filename)
        .with_context(|| format!("failed to decode '{}'", args.file.display()))?;

    let mode = args.mode.resolve(&document);
    info!(
        file = %filename,
        chars = document.char_count(),
        headings = document.headings.len(),
        %mode,
        "document loaded"
    );

    let summarizer = DocumentSummarizer::new(
        Arc::new(completion),
        PipelineConfig::from(&config.summarizer),
    );
    let limit = Duration::from_secs(config.summarizer.processing_timeout_secs);

    let summary = match tokio::time::timeout(limit, summarizer.summarize(&document.text, mode)).await {
        Ok(Ok(summary)) => summary,
        Ok(Err(e)) => {
            error!(
                phase = ?e.phase(),
                chunk = ?e.chunk_index(),
                retryable = e.is_retryable(),
                "document processing failed"
            );
            return Err(anyhow::Error::new(e).context("document processing failed"));
        }
        Err(_) => bail!(
            "document processing failed: timed out after {}s",
            limit.as_secs()
        ),
    };

    if summary.is_empty() {
        info!("document has no text; writing empty result");
    }

    let json = if args.compact {
        serde_json::to_string(&summary)?
    } else {
        serde_json::to_string_pretty(&summary)?
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            info!(path = %path.display(), "summary written");
        }
        None => println!("{json}"),
    }

    Ok(())
}
