//! Minimal command-line front end: streams one chat turn to stdout.
//!
//! ```text
//! docent [--filter <name>]... <question>
//! ```
//!
//! The backend URL comes from `DOCENT_BACKEND_URL` (default
//! `http://localhost:8000`); log verbosity from `RUST_LOG`.

use std::env;
use std::io::{self, Write};

use color_eyre::eyre::eyre;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use docent::config::Config;
use docent::curator::CuratorClient;
use docent::models::ChatRequest;
use docent::sse::ChatCallbacks;
use docent::stream::StreamOutcome;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docent=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let (query, filters) = parse_args(env::args().skip(1))?;
    if query.trim().is_empty() {
        eprintln!("usage: docent [--filter <name>]... <question>");
        std::process::exit(2);
    }

    let config = Config::from_env();
    let client = CuratorClient::with_base_url(config.base_url.clone());

    if !client.health_check().await {
        tracing::warn!(base_url = %config.base_url, "backend health check failed, sending anyway");
    }

    let request = ChatRequest::new(query).with_filters(filters);
    let mut callbacks = ChatCallbacks::new()
        .on_search_results(|results| {
            let count = results.as_array().map(|list| list.len()).unwrap_or(0);
            tracing::info!(count, "search results received");
        })
        .on_status_update(|status| tracing::debug!(%status, "status update"))
        .on_response_chunk(|text| {
            print!("{text}");
            let _ = io::stdout().flush();
        })
        .on_error(|message| eprintln!("\nerror: {message}"));

    let stream = client.stream_chat(&request).await?;
    let outcome = stream.process(&mut callbacks).await;
    println!();

    if outcome == StreamOutcome::Errored {
        std::process::exit(1);
    }
    Ok(())
}

/// Split argv into the question text and `--filter` values.
fn parse_args(args: impl Iterator<Item = String>) -> Result<(String, Vec<String>)> {
    let mut args = args;
    let mut filters = Vec::new();
    let mut query_parts = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--filter" | "-f" => {
                let value = args
                    .next()
                    .ok_or_else(|| eyre!("--filter requires a value"))?;
                filters.push(value);
            }
            _ => query_parts.push(arg),
        }
    }
    Ok((query_parts.join(" "), filters))
}
