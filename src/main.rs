use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use contact_cleaner::config::Config;
use contact_cleaner::logging;
use contact_cleaner::metrics::init_metrics;
use contact_cleaner::pipeline::{run_contact_workflow, run_survey_workflow, WorkflowOptions, WorkflowResult};

#[derive(Parser)]
#[command(name = "contact_cleaner")]
#[command(about = "Clean contact spreadsheets and resolve person names")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Broadly Survey export: one cleaned workbook per store location
    Survey {
        #[command(flatten)]
        run: RunArgs,
        /// Only write this location (Dublin or Milpitas)
        #[arg(long, short = 'l')]
        location: Option<String>,
    },
    /// Email Contact Export: cleaned contacts plus a "Removed" audit sheet
    Contact {
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Input workbook (.xlsx, .xlsm, .xls, .ods)
    input_file: PathBuf,
    /// Directory for output workbooks (defaults to the configured output directory)
    #[arg(long, short = 'o')]
    output_dir: Option<PathBuf>,
    /// JSON or TOML configuration file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
    /// Sheet to read (defaults to the first sheet)
    #[arg(long)]
    sheet: Option<String>,
    /// Print per-batch progress
    #[arg(long, overrides_with = "no_progress")]
    progress: bool,
    /// Suppress per-batch progress
    #[arg(long)]
    no_progress: bool,
    /// Debug-level logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Commands {
    fn run_args(&self) -> &RunArgs {
        match self {
            Commands::Survey { run, .. } | Commands::Contact { run } => run,
        }
    }
}

fn load_config(args: &RunArgs) -> anyhow::Result<Config> {
    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if args.no_progress {
        config.processing.show_progress = false;
    } else if args.progress {
        config.processing.show_progress = true;
    }
    Ok(config)
}

fn print_result(result: &WorkflowResult) {
    println!("\n📋 Summary");
    for line in result.report().lines() {
        println!("   {}", line);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let args = cli.command.run_args();
    let config = load_config(args)?;
    let options = WorkflowOptions {
        input: args.input_file.clone(),
        output_dir: args
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.output.output_directory)),
        sheet: args.sheet.clone(),
        location: match &cli.command {
            Commands::Survey { location, .. } => location.clone(),
            Commands::Contact { .. } => None,
        },
    };

    let result = match cli.command {
        Commands::Survey { .. } => run_survey_workflow(&config, &options)
            .await
            .context("Survey workflow failed")?,
        Commands::Contact { .. } => run_contact_workflow(&config, &options)
            .await
            .context("Contact workflow failed")?,
    };

    info!(
        workflow = %result.workflow,
        exported = result.exported_rows,
        removed = result.removed_rows,
        "Workflow complete"
    );
    print_result(&result);
    println!("\n✅ Done");
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    logging::init_logging(cli.command.run_args().verbose);
    init_metrics();

    if let Err(e) = run(cli).await {
        error!("Run failed: {:#}", e);
        eprintln!("ERROR: {:#}", e);
        std::process::exit(1);
    }
}
