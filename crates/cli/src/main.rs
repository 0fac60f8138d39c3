//! Cost optimization dashboard CLI
//!
//! A command-line tool for browsing rightsizing recommendations: domain
//! status, summary metrics, standard breakdowns, record search and
//! filtered CSV export.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{breakdown, records, status, summary, Context};
use dashboard_lib::models::FilterSpec;
use dashboard_lib::schema::{
    Domain, CURRENT_MACHINE_TYPE, PROJECT_ID, REGION, SERVICE, TARGET_MACHINE_TYPE,
};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Cost optimization dashboard CLI
#[derive(Parser)]
#[command(name = "costdash")]
#[command(author, version, about = "CLI for the cost optimization rightsizing dashboard", long_about = None)]
pub struct Cli {
    /// Directory holding the recommendation tables (can also be set via COSTDASH_DATA_DIR)
    #[arg(long, env = "COSTDASH_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Equality filters; `All` (or omitting the flag) leaves a column unfiltered
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Filter by region
    #[arg(long)]
    pub region: Option<String>,

    /// Filter by project id
    #[arg(long)]
    pub project: Option<String>,

    /// Filter by current machine type
    #[arg(long)]
    pub current_machine: Option<String>,

    /// Filter by target machine type
    #[arg(long)]
    pub target_machine: Option<String>,

    /// Filter by service (overview only)
    #[arg(long)]
    pub service: Option<String>,
}

impl FilterArgs {
    /// Selections for `domain`, rejecting flags its data has no column for
    pub fn to_spec(&self, domain: Domain) -> Result<FilterSpec> {
        let flags = [
            ("--region", REGION, &self.region),
            ("--project", PROJECT_ID, &self.project),
            ("--current-machine", CURRENT_MACHINE_TYPE, &self.current_machine),
            ("--target-machine", TARGET_MACHINE_TYPE, &self.target_machine),
            ("--service", SERVICE, &self.service),
        ];

        let mut spec = FilterSpec::new();
        for (flag, column, value) in flags {
            let Some(value) = value else { continue };
            if !domain.schema().filter_columns.contains(&column) {
                anyhow::bail!("{} does not apply to the {} domain", flag, domain);
            }
            spec.set(column, value.as_str());
        }
        Ok(spec)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show which domain datasets are available
    Status,

    /// List filter options of a domain
    Filters {
        /// Domain (overview, cloudsql, dataflow, kubernetes)
        domain: Domain,
    },

    /// Show summary metrics and key insights
    Summary {
        /// Domain (overview, cloudsql, dataflow, kubernetes)
        domain: Domain,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show one of the domain's standard breakdowns
    Breakdown {
        /// Domain (overview, cloudsql, dataflow, kubernetes)
        domain: Domain,

        /// Breakdown id (see the error message for the domain's list)
        #[arg(long)]
        by: String,

        /// Show only the first N groups
        #[arg(long)]
        top: Option<usize>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show matching records
    Records {
        /// Domain (overview, cloudsql, dataflow, kubernetes)
        domain: Domain,

        /// Case-insensitive search over the domain's name columns
        #[arg(long, short)]
        search: Option<String>,

        /// Columns to show (comma separated, defaults per domain)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Maximum rows to print in table format
        #[arg(long, default_value = "50")]
        limit: usize,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Export matching records as CSV
    Export {
        /// Domain (overview, cloudsql, dataflow, kubernetes)
        domain: Domain,

        /// Output file path (defaults to <domain>_filtered_data.csv)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Case-insensitive search over the domain's name columns
        #[arg(long, short)]
        search: Option<String>,

        /// Columns to export (comma separated, defaults per domain)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        #[command(flatten)]
        filters: FilterArgs,
    },
}

/// Initialize logging on stderr so it never mixes with command output
fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();

    // A subscriber is only ever installed once per process.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load()?;
    let ctx = Context::new(config.data_dir(cli.data_dir), config.format(cli.format)?);

    match cli.command {
        Commands::Status => status::show_status(&ctx)?,
        Commands::Filters { domain } => status::show_filters(&ctx, domain)?,
        Commands::Summary { domain, filters } => {
            summary::show_summary(&ctx, domain, &filters.to_spec(domain)?)?;
        }
        Commands::Breakdown {
            domain,
            by,
            top,
            filters,
        } => {
            breakdown::show_breakdown(&ctx, domain, &by, top, &filters.to_spec(domain)?)?;
        }
        Commands::Records {
            domain,
            search,
            columns,
            limit,
            filters,
        } => {
            let query = records::build_query(filters.to_spec(domain)?, search, columns);
            records::show_records(&ctx, domain, &query, limit)?;
        }
        Commands::Export {
            domain,
            output,
            search,
            columns,
            filters,
        } => {
            let query = records::build_query(filters.to_spec(domain)?, search, columns);
            records::export_records(&ctx, domain, &query, output)?;
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
