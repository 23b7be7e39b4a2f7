use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use rendezvous::Phase;
use rendezvous::session::{
    CoordinatorConfig, MemoryStore, SessionCoordinator, SessionId, WebrtcTransportFactory,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cargo-rendezvous")]
#[command(bin_name = "cargo-rendezvous")]
enum Cli {
    Rendezvous(RendezvousArgs),
}

#[derive(clap::Args)]
struct RendezvousArgs {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Negotiate a loopback call between two local participants.
    Demo {
        #[arg(long, default_value = "demo-session")]
        session: String,

        /// JSON coordinator settings; defaults apply to missing fields.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seconds to wait for both sides to connect.
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let Cli::Rendezvous(args) = Cli::parse();

    match args.command {
        Commands::Demo {
            session,
            config,
            timeout,
        } => {
            let config = load_config(config.as_ref())?;
            run_demo(SessionId::new(session), config, Duration::from_secs(timeout)).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<CoordinatorConfig> {
    let Some(path) = path else {
        return Ok(CoordinatorConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    CoordinatorConfig::from_json(&text)
        .with_context(|| format!("Invalid config {}", path.display()))
}

async fn run_demo(session: SessionId, config: CoordinatorConfig, timeout: Duration) -> Result<()> {
    println!(
        "{}",
        format!("Starting loopback call in session {session}...").green().bold()
    );

    let store = MemoryStore::new();
    let transport = Arc::new(WebrtcTransportFactory::new());
    let alice = SessionCoordinator::new(
        Arc::new(store.connect()),
        transport.clone(),
        config.clone(),
    );
    let bob = SessionCoordinator::new(Arc::new(store.connect()), transport, config);

    let printers = [
        spawn_phase_printer("alice", alice.watch_phase()),
        spawn_phase_printer("bob", bob.watch_phase()),
    ];

    alice
        .start(session.clone())
        .await
        .context("alice could not open media")?;
    bob.start(session.clone())
        .await
        .context("bob could not open media")?;

    let settled = tokio::time::timeout(timeout, async {
        tokio::join!(settle(alice.watch_phase()), settle(bob.watch_phase()))
    })
    .await;

    match settled {
        Ok((Phase::Connected, Phase::Connected)) => {
            println!(
                "{} alice is {:?}, bob is {:?}",
                "Call established:".green().bold(),
                alice.role(),
                bob.role()
            );
        }
        Ok((a, b)) => println!("{} alice {}, bob {}", "Call did not connect:".red().bold(), a, b),
        Err(_) => println!("{}", "Timed out waiting for the call to settle".red().bold()),
    }

    alice.leave().await;
    bob.leave().await;
    for printer in printers {
        let _ = printer.await;
    }

    info!("Store cleaned up: {}", !store.contains_subtree(session.paths().root()));
    println!("{}", "Both participants left.".cyan());
    Ok(())
}

/// Resolves once `phase` leaves `Idle`/`Negotiating`.
async fn settle(mut phase: watch::Receiver<Phase>) -> Phase {
    match phase
        .wait_for(|p| !matches!(p, Phase::Idle | Phase::Negotiating))
        .await
    {
        Ok(p) => *p,
        Err(_) => Phase::Closed,
    }
}

fn spawn_phase_printer(name: &'static str, mut phase: watch::Receiver<Phase>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let current = *phase.borrow_and_update();
            println!("  {:<6} {}", name.bold(), paint(current));
            if current.is_terminal() || phase.changed().await.is_err() {
                break;
            }
        }
    })
}

fn paint(phase: Phase) -> ColoredString {
    let label = phase.to_string();
    match phase {
        Phase::Idle => label.dimmed(),
        Phase::Negotiating => label.yellow(),
        Phase::Connected => label.green(),
        Phase::Failed => label.red(),
        Phase::Closed => label.cyan(),
    }
}
