//! `demoapp-dash` — terminal dashboard for the demoapp API.
//!
//! Calls every configured endpoint in order (the initial "all" pass) and
//! prints one block per endpoint, or, with `--only`, replaces the view with
//! a single endpoint's result per flag.
//!
//! # Usage
//!
//! ```text
//! demoapp-dash [--config <path>] [--base-url <url>] [--only <path>]...
//!
//! Flags:
//!   --config, -f <path>   configuration file (default: config/default.toml)
//!   --base-url <url>      override dashboard.base_url
//!   --only <path>         call just this path (repeatable, run in order)
//!   --help, -h            print this help
//! ```

use std::process;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use demoapp::dashboard::{EndpointAggregator, HttpTransport, TerminalRenderer, drive};
use demoapp::error::AppError;
use demoapp::{config, logger};

// ── CLI arg parsing ────────────────────────────────────────────────────────

struct Args {
    config_path: Option<String>,
    base_url: Option<String>,
    only: Vec<String>,
}

fn parse_args() -> Args {
    let mut config_path = None;
    let mut base_url = None;
    let mut only = Vec::new();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-f" => config_path = Some(required_value(&arg, iter.next())),
            "--base-url" => base_url = Some(required_value(&arg, iter.next())),
            "--only" => only.push(required_value(&arg, iter.next())),
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                print_help();
                process::exit(2);
            }
        }
    }

    Args { config_path, base_url, only }
}

fn required_value(flag: &str, value: Option<String>) -> String {
    value.unwrap_or_else(|| {
        eprintln!("error: {flag} requires a value");
        process::exit(2);
    })
}

fn print_help() {
    eprintln!("usage: demoapp-dash [--config <path>] [--base-url <url>] [--only <path>]...");
    eprintln!();
    eprintln!("flags:");
    eprintln!("  --config, -f <path>   configuration file (default: config/default.toml)");
    eprintln!("  --base-url <url>      override dashboard.base_url");
    eprintln!("  --only <path>         call just this path (repeatable)");
    eprintln!("  --help, -h            print this help");
}

// ── main ───────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let _ = dotenvy::dotenv();
    let args = parse_args();

    let config = config::load(args.config_path.as_deref())?;
    logger::init(&config.log_level, false)?;

    let base_url = args.base_url.unwrap_or(config.dashboard.base_url);
    let transport = HttpTransport::new(
        base_url.clone(),
        Duration::from_secs(config.dashboard.timeout_seconds),
    )?;
    info!(%base_url, endpoints = config.dashboard.endpoints.len(), "dashboard starting");

    let aggregator = EndpointAggregator::new(Arc::new(transport), config.dashboard.endpoints);
    let renderer = TerminalRenderer::new(std::io::stdout());
    let render_task = tokio::spawn(drive(aggregator.subscribe(), renderer));

    if args.only.is_empty() {
        aggregator.activate_all().await;
    } else {
        for path in &args.only {
            aggregator.activate_one(path).await;
        }
    }

    // Dropping the aggregator closes the state channel and ends the render loop.
    drop(aggregator);
    render_task
        .await
        .map_err(|e| AppError::Dashboard(format!("render task failed: {e}")))?;
    Ok(())
}
