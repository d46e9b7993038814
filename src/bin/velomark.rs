//! Nexmark conformance harness CLI
//!
//! Usage:
//!   velomark run
//!   velomark run --scenario query7 --mode streaming --events 5000 --generators 4
//!   velomark run --config harness.yaml --output junit > report.xml
//!   velomark list

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use velomark::velomark::config::HarnessConfig;
use velomark::velomark::engine::types::ExecutionMode;
use velomark::velomark::harness::report::{write_report, OutputFormat};
use velomark::velomark::harness::{ScenarioFilter, ScenarioRegistry, SuiteRunner};

#[derive(Parser)]
#[command(name = "velomark")]
#[command(about = "Differential conformance harness for Nexmark queries")]
#[command(version = "0.1.0")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scenario suite
    Run {
        /// Harness configuration YAML file
        #[arg(short, long, env = "VELOMARK_CONFIG")]
        config: Option<PathBuf>,

        /// Run only scenarios whose name contains this string
        #[arg(short, long)]
        scenario: Option<String>,

        /// Run only one execution mode: batch, streaming
        #[arg(short, long)]
        mode: Option<String>,

        /// Number of events to generate
        #[arg(long)]
        events: Option<u64>,

        /// Number of parallel event generators
        #[arg(long)]
        generators: Option<usize>,

        /// Generator seed
        #[arg(long)]
        seed: Option<u64>,

        /// Timeout per scenario in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Scenarios run concurrently
        #[arg(long)]
        parallel: Option<usize>,

        /// Also run scenarios marked known broken
        #[arg(long)]
        include_known_broken: bool,

        /// Output format: text, json, junit
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// List registered scenarios
    List,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let registry = match ScenarioRegistry::nexmark() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("❌ Failed to build scenario registry: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::List => {
            println!("📋 Registered scenarios");
            println!("════════════════════════════════════════");
            for scenario in registry.scenarios() {
                let status = match &scenario.known_broken {
                    Some(marker) => format!("⏭️  {}", marker),
                    None => "enabled".to_string(),
                };
                println!(
                    "{:<32} {:<20} {}",
                    scenario.qualified_name(),
                    scenario.case.query_name(),
                    status
                );
            }
        }
        Commands::Run {
            config,
            scenario,
            mode,
            events,
            generators,
            seed,
            timeout_ms,
            parallel,
            include_known_broken,
            output,
        } => {
            let format: OutputFormat = match output.parse() {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("❌ {}", e);
                    std::process::exit(1);
                }
            };
            let mode = match mode.map(|m| m.parse::<ExecutionMode>()).transpose() {
                Ok(m) => m,
                Err(e) => {
                    eprintln!("❌ {}", e);
                    std::process::exit(1);
                }
            };

            let mut harness_config = match config {
                Some(path) => match HarnessConfig::from_file(&path) {
                    Ok(c) => c,
                    Err(e) => {
                        eprintln!("❌ Failed to load config: {}", e);
                        std::process::exit(1);
                    }
                },
                None => HarnessConfig::default(),
            };

            // CLI flags override file values
            if let Some(events) = events {
                harness_config.nexmark.num_events = events;
            }
            if let Some(generators) = generators {
                harness_config.nexmark.num_event_generators = generators;
            }
            if let Some(seed) = seed {
                harness_config.nexmark.seed = seed;
            }
            if let Some(timeout_ms) = timeout_ms {
                harness_config.timeout_ms = timeout_ms;
            }
            if let Some(parallel) = parallel {
                harness_config.max_parallel_scenarios = parallel;
            }
            if include_known_broken {
                harness_config.include_known_broken = true;
            }

            let runner = SuiteRunner::new(harness_config).with_filter(ScenarioFilter {
                name: scenario,
                mode,
            });

            let report = match runner.run(&registry).await {
                Ok(report) => report,
                Err(e) => {
                    eprintln!("❌ {}", e);
                    std::process::exit(1);
                }
            };

            let mut stdout = std::io::stdout();
            write_report(&report, format, &mut stdout)?;

            let code = report.exit_code();
            if code != 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}
