use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use chrono::Timelike;
use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use office_lamp::*;
use tracing::{debug, instrument};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File holding the last applied time block
    #[arg(long, env = "OFFICE_LAMP_STATE_FILE", default_value = config::DEFAULT_STATE_FILE, global = true)]
    state_file: PathBuf,

    /// MAC address of the bulb
    #[arg(long, env = "OFFICE_LAMP_MAC", default_value_t = config::DEFAULT_MAC, global = true)]
    mac: MacAddress,

    /// Fade duration in milliseconds
    #[arg(long, env = "OFFICE_LAMP_TRANSITION_MS", default_value_t = 50_000, global = true)]
    transition_ms: u64,

    /// Seconds to wait for the bulb to answer discovery
    #[arg(long, env = "OFFICE_LAMP_DISCOVERY_TIMEOUT_SECS", default_value_t = 10, global = true)]
    discovery_timeout_secs: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Switch the lamp if the time block changed (default)
    Run,
    /// Show the recorded block and the block for the current hour
    Status,
    /// Push a block's preset to the lamp and record it
    Apply {
        /// Block name (MID_MORNING, MORNING, DAY, NIGHT, MIDNIGHT)
        block: TimeBlock,
    },
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            state_file: self.state_file.clone(),
            mac: self.mac,
            transition: Duration::from_millis(self.transition_ms),
            discovery_timeout: Duration::from_secs(self.discovery_timeout_secs),
            ..Config::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| EnvFilter::new("office_lamp=info")),
        )
        .compact()
        .init();

    color_eyre::install()?;

    let cli = Cli::parse();
    let config = cli.config();
    debug!("Using {:?}", config);

    let store = FileBlockStore::new(&config.state_file);
    let discovery = LifxDiscovery::new(config.discovery_timeout, config.command_timeout);
    let mut routine = Routine::new(store, discovery, &config);

    let outcome = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => routine.run_now().await,
        Commands::Apply { block } => routine.apply(block).await,
        Commands::Status => return status(routine.store()).await,
    };

    match outcome {
        Ok(transition) => {
            println!("{transition}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            // Aborted runs are reported on stdout
            println!("{e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Prints what the next run would compare, without touching the lamp
#[instrument(skip(store))]
async fn status(store: &FileBlockStore) -> Result<ExitCode> {
    let hour = chrono::Local::now().hour();

    let recorded = match store.load().await {
        Ok(state) => state.block,
        Err(e) => {
            println!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };
    let (current, color) = resolve(hour)?;

    println!("State file:     {}", store.path().display());
    match recorded {
        Some(block) => println!("Recorded block: {block}"),
        None => println!("Recorded block: none"),
    }
    println!("Current block:  {current} (hour {hour}, {color})");
    if recorded == Some(current) {
        println!("Lamp is up to date");
    } else {
        println!("Next run will switch the lamp to {current}");
    }

    Ok(ExitCode::SUCCESS)
}
