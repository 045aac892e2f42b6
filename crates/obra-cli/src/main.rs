#![forbid(unsafe_code)]

mod cmd;
mod ids;
mod lock;
mod output;
mod store;

use clap::{Parser, Subcommand};
use obra_core::config::resolve_config;
use output::OutputMode;
use std::env;
use std::path::Path;
use store::Store;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "obra: WBS budgets and progress measurements for construction contracts",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Project",
        about = "Create a project",
        long_about = "Create an empty project in .obra/ under the current directory.",
        after_help = "EXAMPLES:\n    # Start a contract with a 25% overhead index\n    obra init \"Clinic extension\" --overhead 25"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Project",
        about = "Change the overhead index",
        long_about = "Change the project overhead index. Every overhead-adjusted price and total follows it.",
        after_help = "EXAMPLES:\n    # Apply a 22.5% overhead index\n    obra overhead 22.5"
    )]
    Overhead(cmd::overhead::OverheadArgs),

    #[command(
        next_help_heading = "Project",
        about = "Show or change deductions and total overrides",
        after_help = "EXAMPLES:\n    # 3% discount and 5% ISS\n    obra billing --discount 3 --iss 5\n\n    # Drop the fixed totals\n    obra billing --clear-overrides"
    )]
    Billing(cmd::billing::BillingArgs),

    #[command(
        next_help_heading = "Budget",
        about = "Add a category or item",
        after_help = "EXAMPLES:\n    # A top-level category\n    obra add category \"Structure\"\n\n    # An item priced before overhead\n    obra add item \"Concrete slab\" --parent wi-3f2a1c --qty 10 --unit m3 --price 50"
    )]
    Add {
        #[command(subcommand)]
        kind: cmd::add::AddCommand,
    },

    #[command(
        next_help_heading = "Budget",
        about = "Edit an item's price or quantity",
        long_about = "Edit one pricing field of an item. The base price, overhead-adjusted price, and total are reconciled.",
        after_help = "EXAMPLES:\n    # Set the price with overhead included\n    obra price wi-3f2a1c --with-overhead 72\n\n    # Set the contract total\n    obra price wi-3f2a1c --total 1500"
    )]
    Price(cmd::price::PriceArgs),

    #[command(
        next_help_heading = "Budget",
        about = "Move an item and its subtree",
        after_help = "EXAMPLES:\n    # Move under another category\n    obra move wi-3f2a1c --parent wi-91be04\n\n    # Move to the top level\n    obra move wi-3f2a1c --root"
    )]
    Move(cmd::move_cmd::MoveArgs),

    #[command(
        next_help_heading = "Budget",
        about = "Delete an item and its subtree",
        after_help = "EXAMPLES:\n    # Delete a category with everything under it\n    obra delete wi-91be04"
    )]
    Delete(cmd::delete::DeleteArgs),

    #[command(
        next_help_heading = "Budget",
        about = "Assign a responsible person to an item",
        after_help = "EXAMPLES:\n    obra assign wi-3f2a1c \"Ana Souza\" --role foreman"
    )]
    Assign(cmd::assign::AssignArgs),

    #[command(
        next_help_heading = "Measurement",
        about = "Record progress for the open period",
        after_help = "EXAMPLES:\n    # Half of the contract quantity\n    obra measure wi-3f2a1c --percent 50\n\n    # Correct an over-measurement\n    obra measure wi-3f2a1c --qty=-2"
    )]
    Measure(cmd::measure::MeasureArgs),

    #[command(
        next_help_heading = "Measurement",
        about = "Show the WBS with totals",
        after_help = "EXAMPLES:\n    # Open period\n    obra show\n\n    # A closed measurement\n    obra show --measurement 2\n\n    # One item with its ancestors\n    obra show --item wi-3f2a1c --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Measurement",
        about = "Close the open measurement",
        long_about = "Freeze the open measurement into a snapshot and start the next one.",
        after_help = "EXAMPLES:\n    obra close\n    obra close --date 2026-05-31"
    )]
    Close(cmd::close::CloseArgs),

    #[command(
        next_help_heading = "Measurement",
        about = "Reopen the latest closed measurement",
        long_about = "Discard the open measurement and restore the latest closed one exactly as it was.",
        after_help = "EXAMPLES:\n    # Preview what would be discarded\n    obra reopen 2\n\n    # Confirm\n    obra reopen 2 --yes"
    )]
    Reopen(cmd::reopen::ReopenArgs),

    #[command(
        next_help_heading = "Measurement",
        about = "List closed measurements",
        after_help = "EXAMPLES:\n    obra history -n 5"
    )]
    History(cmd::history::HistoryArgs),

    #[command(
        next_help_heading = "Supply",
        about = "Record a supply forecast and post it to the ledger",
        after_help = "EXAMPLES:\n    obra forecast \"Cement CP-II\" --qty 40 --price 32.90\n    obra forecast \"Crane rental\" --qty 2 --price 1800 --category Equipment --state paid"
    )]
    Forecast(cmd::forecast::ForecastArgs),

    #[command(
        next_help_heading = "Supply",
        about = "List ledger entries",
        after_help = "EXAMPLES:\n    obra ledger --state pending"
    )]
    Ledger(cmd::ledger::LedgerArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("OBRA_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "obra=debug,obra_core=debug,info"
        } else {
            "obra=info,obra_core=info,warn"
        })
    });

    let format = env::var("OBRA_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Project root for config lookup: the discovered project, or `cwd`.
fn config_root(cwd: &Path) -> std::path::PathBuf {
    Store::discover(cwd).map_or_else(|_| cwd.to_path_buf(), |s| s.root().to_path_buf())
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let config = resolve_config(&config_root(&project_root), cli.json)?;
    let output = OutputMode::from_resolved(&config.resolved_output);
    let project_config = &config.project;

    match cli.command {
        Commands::Init(ref args) => {
            cmd::init::run_init(args, output, &project_root, project_config)
        }
        Commands::Overhead(ref args) => cmd::overhead::run_overhead(args, output, &project_root),
        Commands::Billing(ref args) => cmd::billing::run_billing(args, output, &project_root),
        Commands::Add { ref kind } => {
            cmd::add::run_add(kind, output, &project_root, project_config)
        }
        Commands::Price(ref args) => cmd::price::run_price(args, output, &project_root),
        Commands::Move(ref args) => cmd::move_cmd::run_move(args, output, &project_root),
        Commands::Delete(ref args) => cmd::delete::run_delete(args, output, &project_root),
        Commands::Assign(ref args) => cmd::assign::run_assign(args, output, &project_root),
        Commands::Measure(ref args) => cmd::measure::run_measure(args, output, &project_root),
        Commands::Show(ref args) => cmd::show::run_show(args, output, &project_root),
        Commands::Close(ref args) => cmd::close::run_close(args, output, &project_root),
        Commands::Reopen(ref args) => {
            cmd::reopen::run_reopen(args, output, &project_root, &project_config.reopen)
        }
        Commands::History(ref args) => cmd::history::run_history(args, output, &project_root),
        Commands::Forecast(ref args) => {
            cmd::forecast::run_forecast(args, output, &project_root, &project_config.ledger)
        }
        Commands::Ledger(ref args) => cmd::ledger::run_ledger(args, output, &project_root),
    }
}
