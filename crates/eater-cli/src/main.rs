//! `eater`: command-line client for the entropy eater.
//!
//! ```bash
//! eater hello
//! eater feed --food "some random bytes"
//! eater feed --file meal.bin
//! eater rps --sign paper
//! eater status entropy_balance
//! ```
//!
//! Exits with status 0 on success. Any failure (unreachable server,
//! invalid input, a refused command) prints one line to stderr and exits
//! with status 1.

mod cli;
mod client;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use eater_types::{CommandKind, CommandRequest};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::client::EaterClient;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("eater: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let client = EaterClient::new(&cli.server);
    tracing::debug!(server = cli.server, "Connecting");

    let request = match cli.command {
        Command::Hello => CommandRequest::bare(CommandKind::Hello),
        Command::Feed { food, file } => CommandRequest::feed(read_food(food, file.as_deref())?),
        Command::Sweep => CommandRequest::bare(CommandKind::Sweep),
        Command::Disinfect => CommandRequest::bare(CommandKind::Disinfect),
        Command::Cure => CommandRequest::bare(CommandKind::Cure),
        Command::Rps { sign } => CommandRequest::play_rps(sign.as_u8()),
        Command::Status { name: Some(name) } => {
            print!("{}", client.status(&name).await?);
            return Ok(());
        }
        Command::Status { name: None } => {
            for (name, value) in client.status_all().await? {
                print!("{name}: {value}");
            }
            return Ok(());
        }
    };

    let reply = client.send(&request).await?;
    if let Some(hello) = &reply.hello {
        println!(
            "{} {} (up since {})",
            hello.server,
            hello.version,
            hello.started_at.to_rfc3339()
        );
    }
    if let Some(rps) = &reply.rps {
        println!("your choice: {}", rps.user_sign);
        println!("my choice:   {}", rps.eater_sign);
    }
    println!("{}", reply.message);
    Ok(())
}

fn read_food(food: Option<String>, file: Option<&Path>) -> Result<Vec<u8>> {
    let bytes = match (food, file) {
        (Some(food), _) => food.into_bytes(),
        (None, Some(path)) => std::fs::read(path)
            .with_context(|| format!("cannot read food from {}", path.display()))?,
        (None, None) => Vec::new(),
    };
    anyhow::ensure!(!bytes.is_empty(), "food must not be empty");
    Ok(bytes)
}
