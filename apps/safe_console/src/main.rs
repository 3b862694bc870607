use std::{io::Write, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use console::{load_settings, Console, LineOutcome};
use safe::PredecessorPolicy;
use shared::domain::Network;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "safe-console", about = "Interactive console for Safe multisig wallets")]
struct Args {
    /// Settings file; defaults to ./safe-console.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    network: Option<Network>,
    /// Transaction relay base URL, overriding the network default.
    #[arg(long)]
    service_url: Option<String>,
    /// How removeOwner/swapOwner pick the previous owner: sorted, on_chain or strict.
    #[arg(long)]
    predecessor: Option<PredecessorPolicy>,
    #[arg(long, conflicts_with = "quiet")]
    debug: bool,
    #[arg(long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let mut settings = load_settings(args.config.as_deref()).context("loading settings")?;
    if let Some(network) = args.network {
        settings.network = network;
    }
    if let Some(url) = args.service_url {
        settings.service_url = Some(url);
    }
    if let Some(policy) = args.predecessor {
        settings.predecessor = policy;
    }

    let mut console = Console::from_settings(settings).context("starting console")?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{}", console.prompt());
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                continue;
            }
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        // Ctrl-C abandons the line being dispatched, not the console.
        let outcome = tokio::select! {
            outcome = console.handle_line(&line) => outcome,
            _ = tokio::signal::ctrl_c() => {
                println!("interrupted");
                continue;
            }
        };
        if render(&outcome) {
            break;
        }
    }

    info!("console: closed");
    Ok(())
}

fn init_tracing(args: &Args) {
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else if args.debug {
        EnvFilter::new("debug")
    } else if args.quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints an outcome; returns true when the console should terminate.
fn render(outcome: &LineOutcome) -> bool {
    for line in &outcome.lines {
        println!("{line}");
    }
    if let Some(report) = &outcome.error {
        eprintln!("error[{:?}]: {}", report.code, report.message);
    }
    outcome.exit
}
