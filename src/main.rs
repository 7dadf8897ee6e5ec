use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use crime_etl::logging::{self, LoggingGuard};
use crime_etl::{LoggingConfig, PipelineConfig, PipelineExecutionResult, PipelineOrchestrator, StepKind};

#[derive(Parser)]
#[command(name = "crime_etl")]
#[command(about = "Stage, process and report street-level crime outcomes")]
#[command(version = "0.1.0")]
struct Cli {
    /// TOML file overriding the default paths, logging and outcome categories
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run staging, processing and reporting once (the default)
    Run {
        /// Print the run summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Run a single step against the files already on disk
    Step {
        #[arg(value_enum)]
        step: StepArg,
    },
    /// Print the broad category for an outcome value
    Categorize {
        outcome: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StepArg {
    Staging,
    Processing,
    Reporting,
}

impl From<StepArg> for StepKind {
    fn from(arg: StepArg) -> Self {
        match arg {
            StepArg::Staging => StepKind::Staging,
            StepArg::Processing => StepKind::Processing,
            StepArg::Reporting => StepKind::Reporting,
        }
    }
}

fn print_summary(result: &PipelineExecutionResult) {
    println!("\n📊 Pipeline Results:");
    for step in &result.step_results {
        let mark = if step.success { "✅" } else { "❌" };
        println!("   {} {}: {}", mark, step.step, step.message);
    }
    if let Some(duration) = result.duration() {
        println!("   Duration: {} ms", duration.num_milliseconds());
    }
}

/// Record a failure that prevented the configured log from being used in the default log.
fn record_in_default_log(err: &anyhow::Error) {
    if let Err(e) = logging::record_startup_failure(&LoggingConfig::default(), &format!("{:#}", err)) {
        eprintln!("Could not write to the default log: {}", e);
    }
}

fn start_logging(config: &PipelineConfig) -> anyhow::Result<LoggingGuard> {
    let logging = config.resolved_logging();
    logging::init_logging(&logging).map_err(|e| {
        let err = anyhow::Error::new(e).context(format!("opening log file {}", logging.file.display()));
        record_in_default_log(&err);
        err
    })
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match PipelineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                let err = anyhow::Error::new(e)
                    .context(format!("loading configuration from {}", path.display()));
                record_in_default_log(&err);
                return Err(err);
            }
        },
        None => PipelineConfig::default(),
    };

    match cli.command.unwrap_or(Commands::Run { json: false }) {
        Commands::Categorize { outcome } => {
            let categories = config.category_map()?;
            println!("{}", categories.categorize(Some(outcome.as_str())));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Step { step } => {
            let _guard = start_logging(&config)?;
            let orchestrator = PipelineOrchestrator::new(config);

            match orchestrator.run_step(step.into()) {
                Ok(result) => {
                    println!("✅ {}: {}", result.step, result.message);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    println!("❌ {} failed: {}", StepKind::from(step), e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Run { json } => {
            if json {
                // keep stdout parseable
                config.logging.console = false;
            }
            let _guard = start_logging(&config)?;
            let orchestrator = PipelineOrchestrator::new(config);

            let result = match orchestrator.run() {
                Ok(result) => result,
                Err(_) => return Ok(ExitCode::FAILURE),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_summary(&result);
            }

            Ok(if result.success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}
