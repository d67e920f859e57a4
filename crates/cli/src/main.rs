//! StorageOS CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: flags with `STORAGEOS_*` environment fallbacks
//!    (see [`config::GlobalArgs`]).
//! 2. **Wire observability**: `tracing-subscriber` writing to stderr, text or
//!    JSON, filtered by `RUST_LOG` (default `warn`).
//! 3. **Construct infrastructure**: the shared credential, the
//!    [`openapi::OpenApiTransport`] and the [`apiclient::Client`] over it.
//! 4. **Authenticate and dispatch** the selected command, then map the
//!    outcome to an exit code (see [`exit`]).

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use apiclient::{Client, SharedCredentials};
use clap::Parser;
use openapi::{OpenApiTransport, TransportConfig};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod exit;

use commands::{Command, Context};
use config::{GlobalArgs, LogOutput};

#[derive(Debug, Parser)]
#[command(name = "storageos", version, about = "Manage a StorageOS cluster", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_observability(cli.global.log_format);

    let result = run(cli).await;
    if let Err(err) = &result {
        eprintln!("error: {err:#}");
    }
    exit::exit_code(&result)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli { global, command } = cli;

    let transport = OpenApiTransport::new(
        &TransportConfig::new(global.endpoint()?),
        SharedCredentials::new(),
    )?;
    let client = Client::new(Arc::new(transport), global.client_config());

    let cancel = client.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling in-flight requests");
            cancel.cancel();
        }
    });

    client
        .authenticate(&global.username, &global.password)
        .await
        .with_context(|| format!("authenticating as {}", global.username))?;

    command.run(&Context { client, global }).await
}

fn init_observability(format: LogOutput) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogOutput::Text => builder.init(),
        LogOutput::Json => builder.json().init(),
    }
}
