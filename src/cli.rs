use clap::Parser;
use std::path::PathBuf;

use crate::client::TextService;

#[derive(Parser, Debug)]
#[command(name = "tone-lens")]
#[command(version)]
#[command(about = "Highlight the emotional tone of each sentence in a piece of text")]
pub struct Args {
    /// Text to analyze. Reads stdin when neither TEXT nor --file is given.
    pub text: Option<String>,

    /// Read the text from a file instead
    #[arg(long, short, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Path to a TOML config file (defaults to ./tone-lens.toml if present)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Summarize the text before analyzing it
    #[arg(long, conflicts_with = "generate")]
    pub summarize: bool,

    /// Extend the text with generated content before analyzing it
    #[arg(long)]
    pub generate: bool,

    /// Print the projection as JSON instead of colored text
    #[arg(long)]
    pub json: bool,

    /// Read lines from stdin and re-analyze after each one
    #[arg(long, short, conflicts_with_all = ["web", "file", "text"])]
    pub interactive: bool,

    /// Launch the web UI on localhost instead of terminal output
    #[arg(long)]
    pub web: bool,

    /// Port for the web UI server
    #[arg(long, default_value = "8080")]
    pub port: u16,

    /// Do not open a browser when starting the web UI
    #[arg(long)]
    pub no_browser: bool,

    /// Hide the color legend
    #[arg(long)]
    pub no_legend: bool,

    /// Show tone name and confidence after each sentence
    #[arg(long, short)]
    pub scores: bool,
}

impl Args {
    /// Text service to run before analysis, if any.
    pub fn rewrite_service(&self) -> Option<TextService> {
        if self.summarize {
            Some(TextService::Summarization)
        } else if self.generate {
            Some(TextService::TextGenerator)
        } else {
            None
        }
    }
}
