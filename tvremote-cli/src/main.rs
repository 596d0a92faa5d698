//! tvremote — entry point.
//!
//! ```text
//! tvremote <ip>                     Connect (and pair if asked) with defaults
//! tvremote <ip> --config <path>     Use custom config TOML
//! tvremote <ip> --engine <program>  Override the engine executable
//! tvremote --gen-config             Dump default config and exit
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tvremote_core::{
    ConnectionState, ProcessEngine, RemoteError, RemoteResultExt, StateStream, TvRemote,
};

use tvremote_cli::config::CliConfig;
use tvremote_cli::repl::{Action, HELP, parse_line};

/// Pairing codes the user may try before giving up.
const PAIRING_ATTEMPTS: usize = 3;

type Input = Lines<BufReader<Stdin>>;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tvremote", about = "Pair with and control a networked TV")]
struct Cli {
    /// Device address. Example: 192.168.1.50
    #[arg(required_unless_present = "gen_config")]
    ip: Option<String>,

    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "tvremote.toml")]
    config: PathBuf,

    /// Name shown on the device (overrides config).
    #[arg(long)]
    client_name: Option<String>,

    /// Protocol engine executable (overrides config).
    #[arg(short, long)]
    engine: Option<String>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        println!("{}", CliConfig::default_toml()?);
        return Ok(());
    }

    let mut config = CliConfig::load(&cli.config);
    if let Some(name) = cli.client_name {
        config.remote.client_name = name;
    }
    if let Some(program) = cli.engine {
        config.engine.program = program;
    }

    if config.logging.enabled {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    info!("tvremote v{}", env!("CARGO_PKG_VERSION"));
    let Some(ip) = cli.ip else {
        return Err("no device address given".into());
    };

    // ── 1. Engine and session ───────────────────────────────────

    let engine = ProcessEngine::new(&config.engine.program, &config.engine.args);
    let remote = Arc::new(TvRemote::new(engine, &config.remote));
    let watcher = tokio::spawn(watch(remote.observe_connection_state()));

    remote.initialize().await?;

    // ── 2. Connect, pairing if the device asks ─────────────────

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    match remote.connect(&ip, &config.remote.client_name).await {
        Ok(device) => println!("connected to {device}"),
        Err(RemoteError::PairingRequired) => {
            if let Err(e) = pair(&remote, &mut input).await {
                remote.close().await;
                return Err(e);
            }
        }
        Err(e) => {
            remote.close().await;
            return Err(e.into());
        }
    }

    // ── 3. Command loop ─────────────────────────────────────────

    println!("{HELP}");
    loop {
        prompt("> ");
        let line = tokio::select! {
            line = input.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        let action = match parse_line(&line) {
            Ok(Some(action)) => action,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        if action == Action::Quit {
            break;
        }
        match action.run(&remote).await {
            Some(result) => {
                let _ = result
                    .on_success(|sent| println!("sent {sent}"))
                    .on_error(|e| eprintln!("error: {e}"));
            }
            None => println!("{HELP}"),
        }
    }

    info!("shutting down");
    remote.close().await;
    watcher.abort();
    Ok(())
}

/// Prompt for pairing codes until one is accepted.
async fn pair(remote: &TvRemote, input: &mut Input) -> Result<(), Box<dyn std::error::Error>> {
    println!("the TV is showing a pairing code");
    for _ in 0..PAIRING_ATTEMPTS {
        prompt("pairing code: ");
        let Some(code) = input.next_line().await? else {
            return Err("stdin closed before pairing finished".into());
        };

        match remote
            .submit_pairing_code(code.trim())
            .await
            .on_pairing_failed(|detail| eprintln!("rejected: {detail}"))
        {
            Ok(device) => {
                println!("paired with {device}");
                return Ok(());
            }
            Err(e) if e.is_retryable() || matches!(e, RemoteError::PairingFailed(_)) => {
                warn!("pairing attempt failed: {e}");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err("too many failed pairing attempts".into())
}

/// Print every connection transition after the first.
async fn watch(mut states: StateStream<ConnectionState>) {
    states.next().await;
    while let Some(state) = states.next().await {
        eprintln!("[{state}]");
    }
}

fn prompt(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}
