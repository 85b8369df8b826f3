use anyhow::{Context, Result};
use burndown::capacity::CapacityMode;
use burndown::config::Config;
use burndown::project::StartPolicy;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod cmd;

#[derive(Parser)]
#[command(name = "burndown")]
#[command(version, about = "Delivery date forecasts for scope burndown projects")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Reference date used as "today" (YYYY-MM-DD). Defaults to the local date.
    #[arg(long, global = true)]
    pub today: Option<NaiveDate>,

    /// FTE assumed for roles without capacity. Overrides burndown.toml.
    #[arg(long, global = true)]
    pub default_fte: Option<f64>,

    /// Capacity mode: static or allocation. Overrides burndown.toml.
    #[arg(long, global = true)]
    pub capacity_mode: Option<CapacityMode>,

    /// Projection start: start, created, today or a YYYY-MM-DD date
    #[arg(long, global = true)]
    pub start: Option<StartPolicy>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a burndown workspace
    Init {
        /// Also write a sample project
        #[arg(long)]
        sample: bool,
    },
    /// List project files in the workspace
    List {
        #[arg(long)]
        json: bool,
    },
    /// Forecast delivery dates
    Forecast {
        /// Project file stem, name or path (all projects if omitted)
        project: Option<String>,

        #[arg(long)]
        json: bool,
    },
    /// Show the burndown chart series of a project
    Chart {
        /// Project file stem, name or path
        project: String,

        #[arg(long)]
        json: bool,
    },
    /// Workday arithmetic with the workspace calendar
    Calendar {
        #[command(subcommand)]
        command: CalendarCommands,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum CalendarCommands {
    /// Date that is a number of working days after a date
    Add { date: NaiveDate, days: u32 },
    /// Signed number of working days from one date to another
    Between { from: NaiveDate, to: NaiveDate },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default burndown.toml file
    Init,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "burndown=debug"
    } else {
        "burndown=warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let load_config = || {
        Config::new(
            project_dir.clone(),
            cli.verbose,
            cli.today,
            cli.default_fte,
            cli.capacity_mode,
            cli.start,
        )
    };

    match &cli.command {
        Commands::Init { sample } => cmd::cmd_init(&project_dir, *sample)?,
        Commands::List { json } => cmd::cmd_list(&load_config()?, *json)?,
        Commands::Forecast { project, json } => {
            cmd::cmd_forecast(&load_config()?, project.as_deref(), *json)?
        }
        Commands::Chart { project, json } => cmd::cmd_chart(&load_config()?, project, *json)?,
        Commands::Calendar { command } => cmd::cmd_calendar(&load_config()?, command.clone())?,
        Commands::Config { command } => cmd::cmd_config(&load_config()?, command.clone())?,
    }

    Ok(())
}
