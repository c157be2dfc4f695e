//! Command-line entry point: scenario simulation and live detection.

use std::path::PathBuf;

use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use eyre::{Error, Result};
use log::{info, warn};
use oracle_arb::arb::engine::Invocation;
use oracle_arb::config::LiveConfig;
use oracle_arb::live::LiveDetection;
use oracle_arb::notify::SlackNotifier;
use oracle_arb::scenario::Scenario;
use oracle_arb::utils::app_context::AppContext;
use oracle_arb::utils::logger::{setup_logger, verbosity};

/// Command-line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Command to run
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Run one invocation against a scenario file
    Simulate {
        /// Scenario JSON file
        #[arg(short, long)]
        scenario: PathBuf,
        /// Call as this identity instead of the configured controller
        #[arg(long)]
        caller: Option<Address>,
        /// Post resulting notifications to Slack
        #[arg(long)]
        notify: bool,
    },
    /// Compare live pool and oracle prices (read-only)
    Detect {
        /// Post the comparison to Slack when there is an opportunity
        #[arg(long)]
        notify: bool,
    },
}

/// Runs one invocation against a scenario world and prints the outcome
async fn simulate(scenario: PathBuf, caller: Option<Address>, notify: bool) -> Result<(), Error> {
    let scenario = Scenario::load(&scenario)?;
    let mut world = scenario.build()?;
    let caller = caller.unwrap_or(scenario.config.controller);
    let seen = world.ledger.notifications().len();

    let result = world.engine.execute(&mut world.ledger, caller);
    let notifications = world.ledger.notifications_since(seen).to_vec();

    match &result {
        Ok(Invocation::Executed { report, .. }) => {
            println!("Executed: {report}");
            println!("Trace: {:?}", report.trace);
        }
        Ok(Invocation::NoOpportunity(comparison)) => println!("No opportunity: {comparison}"),
        Err(e) => println!("Reverted: {e}"),
    }
    for notification in &notifications {
        println!("  {notification}");
    }

    if notify {
        let notifier = SlackNotifier::new()?;
        match &result {
            Ok(_) => notifier.publish(&notifications).await?,
            Err(e) => notifier.send_error(&e.to_string()).await?,
        }
    }

    result?;
    Ok(())
}

/// Reads live reserves and feeds and prints the comparison
async fn detect(notify: bool) -> Result<(), Error> {
    let config = LiveConfig::from_env()?;
    let ctx = AppContext::from_config(&config)?;
    info!("Connected at block {}", ctx.block_number().await?);

    let comparison = LiveDetection::new(&ctx, &config).run().await?;
    println!("{} {comparison}", config.pair);

    if notify && comparison.direction.is_some() {
        let notifier = SlackNotifier::new()?;
        notifier
            .send(&format!("{} {comparison}", config.pair))
            .await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    setup_logger(verbosity(cli.verbose))?;

    let outcome = match cli.command {
        Commands::Simulate {
            scenario,
            caller,
            notify,
        } => simulate(scenario, caller, notify).await,
        Commands::Detect { notify } => detect(notify).await,
    };

    if let Err(e) = &outcome {
        warn!("{e:#}");
    }
    outcome
}
