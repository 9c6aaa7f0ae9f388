use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use labforge_ingest::{ExtractedDocument, Mode};

/// Summarize a lab document into section summaries and a final synthesis.
///
/// Reads a `.txt` or `.md` file, runs it through the summarization pipeline
/// and prints the JSON result.
#[derive(Parser, Debug)]
#[command(name = "labforge", about = "Hierarchical document summarization")]
pub struct CliArgs {
    /// Document to summarize (.txt, .text, .md, .markdown)
    pub file: PathBuf,

    /// Segmentation mode; `auto` picks hierarchical when the file has headings
    #[arg(long, value_enum, default_value_t = ModeArg::Auto)]
    pub mode: ModeArg,

    /// Primary completion provider: openai, claude, or ollama
    #[arg(long, env = "LLM_PROVIDER")]
    pub provider: Option<String>,

    /// Provider tried when the primary one fails
    #[arg(long, env = "LLM_FALLBACK_PROVIDER")]
    pub fallback_provider: Option<String>,

    /// Abort the whole run after this many seconds
    #[arg(long, env = "PROCESSING_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Write the JSON result here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Single-line JSON output
    #[arg(long)]
    pub compact: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Auto,
    Hierarchical,
    Semantic,
}

impl ModeArg {
    pub fn resolve(self, document: &ExtractedDocument) -> Mode {
        match self {
            ModeArg::Auto => document.suggested_mode(),
            ModeArg::Hierarchical => Mode::Hierarchical,
            ModeArg::Semantic => Mode::Semantic,
        }
    }
}
