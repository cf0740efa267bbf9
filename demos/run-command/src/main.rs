//! Run one command on a remote session and print its output.
//!
//! Run with:
//!
//! ```text
//! REMOTE_CONTROL_URL=https://control.example.com \
//! REMOTE_CONTROL_USER=svc REMOTE_CONTROL_PASSWORD=... \
//! cargo run -p run-command-demo -- --session <GUID> ipconfig
//! ```

use std::{process::ExitCode, time::Duration};

use anyhow::Context;
use clap::Parser;
use remote_control_core::SessionGroup;
use remote_control_executor::{
    CommandBuilder, CommandOutcome, CommandRequest, Dispatcher, ShellMode,
};
use remote_control_transport::{ClientConfig, ControlClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(about = "Run a command on a remote session")]
struct Args {
    /// Session group the session lives in.
    #[arg(long, default_value = SessionGroup::ALL_MACHINES)]
    group: String,

    /// Session GUID.
    #[arg(long)]
    session: Uuid,

    /// Remote timeout and local polling budget.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Run through PowerShell instead of the default interpreter.
    #[arg(long)]
    powershell: bool,

    /// Cap on captured output characters.
    #[arg(long)]
    max_length: Option<usize>,

    /// Command text.
    #[arg(required = true, trailing_var_arg = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    match run(Args::parse()).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let config = ClientConfig::from_env().context("loading client configuration")?;
    tracing::info!(server = %config.base_url, user = config.credentials.username(), "connecting");
    let client = ControlClient::new(config)?;

    let shell = if args.powershell {
        ShellMode::PowerShell
    } else {
        ShellMode::Cmd
    };
    let mut command = CommandBuilder::new(args.command.join(" "))
        .shell(shell)
        .timeout(Duration::from_secs(args.timeout_secs));
    if let Some(max) = args.max_length {
        command = command.max_length(max);
    }

    let request = CommandRequest::new(SessionGroup::new(args.group), args.session, command);
    match Dispatcher::new(client).run_command(&request).await? {
        CommandOutcome::Output(lines) => {
            for line in lines {
                println!("{line}");
            }
            Ok(ExitCode::SUCCESS)
        }
        CommandOutcome::TimedOut { waited, .. } => {
            tracing::warn!("no output after {waited:?}; the command may still complete");
            Ok(ExitCode::from(2))
        }
    }
}
