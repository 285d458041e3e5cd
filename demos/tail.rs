//! Live log tail.
//!
//! Demonstrates:
//! - Building and enabling a session
//! - Requesting the task list once the stream is open
//! - Following LOGGER events, optionally for a single task
//! - Disabling cleanly on Ctrl+C
//!
//! Usage:
//!   cargo run --example tail
//!   cargo run --example tail -- --endpoint ws://10.0.0.5:2269/stream
//!   cargo run --example tail -- --task 7 --debug

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cbot_stream::{Session, StreamType, TaskId};

// ============================================================================
// Constants
// ============================================================================

const OPEN_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
struct Args {
    debug: bool,
    endpoint: Option<String>,
    task: Option<TaskId>,
}

impl Args {
    fn parse() -> anyhow::Result<Self> {
        let mut parsed = Self::default();
        let mut args = std::env::args().skip(1);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--debug" => parsed.debug = true,
                "--endpoint" => {
                    parsed.endpoint = Some(args.next().context("--endpoint needs a URL")?);
                }
                "--task" => {
                    let id: u64 = args
                        .next()
                        .context("--task needs an id")?
                        .parse()
                        .context("--task id must be a non-negative integer")?;
                    parsed.task = Some(TaskId::new(id));
                }
                other => anyhow::bail!("unknown argument: {other}"),
            }
        }

        Ok(parsed)
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse()?;
    init_logging(args.debug);

    let mut builder = Session::builder();
    if let Some(endpoint) = &args.endpoint {
        builder = builder.endpoint(endpoint.as_str());
    }
    let session = builder.build()?;

    let mut events = session.subscribe();
    session.enable(|| tracing::info!("Stream open"))?;

    println!("[Setup] Connecting to {}...", session.endpoint());
    session.wait_open(OPEN_TIMEOUT).await?;
    session.tasks().list()?;

    loop {
        tokio::select! {
            event = events.recv_type(&StreamType::Logger) => {
                let Some(event) = event else { break };
                if args.task.is_some_and(|task| task != event.task_id) {
                    continue;
                }
                println!("{}", event.text().unwrap_or_default());
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\n[Exit] Closing stream");
                break;
            }
        }
    }

    session.disable();
    Ok(())
}

// ============================================================================
// Functions
// ============================================================================

fn init_logging(debug: bool) {
    let filter = if debug {
        "cbot_stream=debug"
    } else {
        "cbot_stream=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}
