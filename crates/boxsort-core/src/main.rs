//! boxsort CLI
//!
//! Print color schedules, run the session simulator, or drive a live session
//! from stdin.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use boxsort_core::config::ExperimentConfig;
use boxsort_core::datalog::CsvFileLog;
use boxsort_core::event::{Command, Event};
use boxsort_core::schedule::ColorSchedule;
use boxsort_core::session::ExperimentSession;
use boxsort_core::test_harness::{run_simulator, SimulatorConfig};
use boxsort_core::types::Condition;

#[derive(Parser)]
#[command(name = "boxsort")]
#[command(version, about = "Experiment flow core for the box-sorting HRI study")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit diagnostics as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a box color schedule.
    Schedule {
        /// Number of boxes (multiple of 4)
        #[arg(short, long, default_value = "16")]
        total: usize,
        /// Random seed
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Run simulated participants and check session invariants.
    Simulate {
        /// Sessions to simulate
        #[arg(short, long, default_value = "20")]
        runs: u64,
        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Probability of sorting a plain box into its own bin
        #[arg(long, default_value = "0.85")]
        accuracy: f64,
        /// Session config template (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Stop at the first violating session
        #[arg(long)]
        stop_on_violation: bool,
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Drive a session from stdin (`next`, `pickup 3`, `enter 3 red`, `exit 3 red`, `compressor`, `yes`, `no`, `quit`).
    Live {
        /// Session config (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Participant id, overrides the config
        #[arg(short, long)]
        participant: Option<String>,
        /// Cooperation or Coexistence, overrides the config
        #[arg(long)]
        condition: Option<Condition>,
        /// Experiment log path, overrides the config
        #[arg(short, long)]
        log: Option<PathBuf>,
        /// Tick interval in milliseconds
        #[arg(long, default_value = "50")]
        tick_ms: u64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Schedule { total, seed } => {
            let schedule = match seed {
                Some(seed) => ColorSchedule::seeded(total, seed)?,
                None => ColorSchedule::generate(total, &mut rand::rng())?,
            };
            for (group, colors) in schedule.groups().enumerate() {
                let names: Vec<&str> = colors.iter().map(|c| c.as_str()).collect();
                println!("group {group}: {}", names.join(", "));
            }
        }
        Commands::Simulate {
            runs,
            seed,
            accuracy,
            config,
            stop_on_violation,
            json,
        } => {
            let experiment = match config {
                Some(path) => ExperimentConfig::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => SimulatorConfig::default().experiment,
            };
            let config = SimulatorConfig {
                stop_on_first_violation: stop_on_violation,
                ..SimulatorConfig::default()
                    .with_seed(seed)
                    .with_sessions(runs)
                    .with_accuracy(accuracy)
                    .with_experiment(experiment)
            };

            info!(runs, seed, "running simulator");
            let report = run_simulator(config);
            if json {
                println!("{}", report.to_json()?);
            } else {
                println!("{}", report.generate_text());
            }
            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        Commands::Live {
            config,
            participant,
            condition,
            log,
            tick_ms,
        } => {
            let mut experiment = match config {
                Some(path) => ExperimentConfig::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => ExperimentConfig::default(),
            };
            if let Some(participant) = participant {
                experiment = experiment.with_participant(participant);
            }
            if let Some(condition) = condition {
                experiment = experiment.with_condition(condition);
            }
            if let Some(log) = log {
                experiment = experiment.with_log_path(log);
            }
            run_live(experiment, tick_ms).await?;
        }
    }

    Ok(())
}

async fn run_live(config: ExperimentConfig, tick_ms: u64) -> Result<()> {
    let sink = CsvFileLog::create(&config.log_path)
        .with_context(|| format!("opening log {}", config.log_path.display()))?;
    info!(path = %config.log_path.display(), "logging to file");
    let mut session = ExperimentSession::new(config, Box::new(sink))?;

    let started = Instant::now();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(tick_ms.max(1)));

    while !session.is_ended() {
        tokio::select! {
            _ = ticker.tick() => {
                print_commands(&session.tick(started.elapsed().as_secs_f64()));
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    print_commands(&session.shutdown());
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "quit" {
                    print_commands(&session.shutdown());
                    break;
                }
                match line.parse::<Event>() {
                    Ok(event) => {
                        let now = started.elapsed().as_secs_f64();
                        print_commands(&session.handle(event, now));
                    }
                    Err(err) => warn!(%err, "unrecognized input"),
                }
            }
        }
    }
    Ok(())
}

fn print_commands(commands: &[Command]) {
    for command in commands {
        println!("{command}");
    }
}
