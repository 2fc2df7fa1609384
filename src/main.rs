use clap::Parser;
use colored::*;
use std::io::Read;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use tone_lens::analysis::project;
use tone_lens::cli::Args;
use tone_lens::client::{rewrite_text, TextServiceClient, ToneAnalyzerClient};
use tone_lens::config::Config;
use tone_lens::render::render_document;
use tone_lens::session::{should_analyze, AnalysisSession};
use tone_lens::{web, Projection, Result};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tone_lens=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_input(args: &Args) -> Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if let Some(path) = &args.file {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn print_projection(projection: &Projection, args: &Args) -> Result<()> {
    if args.json {
        let json = serde_json::to_string_pretty(projection)
            .map_err(|e| tone_lens::ToneLensError::Json { detail: e.to_string() })?;
        println!("{json}");
    } else {
        print!("{}", render_document(projection, !args.no_legend, args.scores));
    }
    Ok(())
}

async fn run_once(args: &Args, config: &Config) -> Result<()> {
    let mut text = read_input(args)?;

    if let Some(service) = args.rewrite_service() {
        let text_client = TextServiceClient::new(config);
        text = rewrite_text(text_client.as_ref(), service, &text).await;
        if !args.json {
            eprintln!("{}", format!("[{service}] {text}").bright_magenta());
        }
    }

    if !should_analyze(&text, config.min_text_len) {
        warn!(
            min_len = config.min_text_len,
            "text too short to analyze; nothing to render"
        );
        return print_projection(&project(None), args);
    }

    let client = ToneAnalyzerClient::new(config)?;
    let result = client.analyze(&text).await?;
    print_projection(&project(Some(&result)), args)
}

/// Each line read from stdin is appended to the working text. Once the text
/// is long enough, every new line triggers an analysis of the whole text.
/// Requests run concurrently; only the newest completed one is printed.
async fn run_interactive(args: &Args, config: &Config) -> Result<()> {
    let client = ToneAnalyzerClient::new(config)?;
    let session = Arc::new(AnalysisSession::new());
    let mut tasks = JoinSet::new();
    let mut text = String::new();

    eprintln!(
        "{}",
        "  Type text, one line at a time. ':clear' resets, Ctrl+D exits.".bright_blue()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == ":clear" {
            text.clear();
            eprintln!("{}", "  cleared".bright_blue());
            continue;
        }
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&line);

        if !should_analyze(&text, config.min_text_len) {
            continue;
        }

        let ticket = session.begin();
        let client = client.clone();
        let session = Arc::clone(&session);
        let snapshot = text.clone();
        let json = args.json;
        let show_legend = !args.no_legend;
        let show_scores = args.scores;
        tasks.spawn(async move {
            match client.analyze(&snapshot).await {
                Ok(result) => {
                    session.complete_then(ticket, result, |p| {
                        if json {
                            if let Ok(s) = serde_json::to_string(p) {
                                println!("{s}");
                            }
                        } else {
                            print!("{}", render_document(p, show_legend, show_scores));
                        }
                    });
                }
                Err(e) => warn!(ticket = ticket.generation(), error = %e, "analysis failed"),
            }
        });

        // reap finished tasks so the set does not grow unbounded
        while tasks.try_join_next().is_some() {}
    }

    while tasks.join_next().await.is_some() {}
    debug!(generation = session.current_generation(), "interactive session ended");
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let config = Arc::new(Config::load(args.config.as_deref())?);
    info!(
        tone_analyzer = %config.tone_analyzer.url,
        text_services = config.text_services_enabled(),
        "configuration loaded"
    );

    if args.web {
        return web::serve(args.port, config, !args.no_browser).await;
    }
    if args.interactive {
        return run_interactive(&args, &config).await;
    }
    run_once(&args, &config).await
}

#[tokio::main]
async fn main() {
    init_tracing();
    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("{} {}", "error:".bright_red().bold(), e);
        std::process::exit(1);
    }
}
