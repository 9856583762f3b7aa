mod config;
mod error;
mod logging;
mod show;

pub use config::Config;
pub use error::RunError;
pub use logging::ABORT_TARGET;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{CommandFactory as _, Parser};
use config::{ConfigSplitwise, ConfigYnab};
use splitwise_ynab::reconcile::ReconcileConfig;
use splitwise_ynab::{ExpenseSource, LedgerSink};
use splitwise_ynab_http::{AuthError, Splitwise, Ynab};

#[derive(Parser)]
#[command(
    name = "splitwise-ynab",
    about = "Mirror Splitwise expenses into a YNAB account"
)]
struct Args {
    /// Configuration file. Defaults to splitwise-ynab.toml next to the executable.
    config: Option<PathBuf>,

    /// Fetch and classify expenses, print what would change and exit.
    /// Neither YNAB nor the configuration file are touched.
    #[arg(long)]
    dry_run: bool,

    /// Log file. Defaults to splitwise-ynab.log next to the configuration file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

pub fn run(args: impl IntoIterator<Item = String>) -> Result<(), RunError> {
    clap_complete::CompleteEnv::with_factory(Args::command).complete();

    let args = Args::parse_from(args);

    let config_path = match args.config {
        Some(path) => {
            println!("Configuration specified via command line: {}", path.display());
            path
        }
        None => {
            let path = Config::default_path().map_err(RunError::Config)?;
            println!("Configuration not specified, using {}", path.display());
            path
        }
    };

    let log_file = args
        .log_file
        .unwrap_or_else(|| logging::default_log_file(&config_path));
    logging::init(&log_file).map_err(RunError::Config)?;

    sync(
        &config_path,
        args.dry_run,
        |splitwise| Splitwise::authenticate(&splitwise.api_key),
        |ynab| Ynab::authenticate(&ynab.access_token, &ynab.budget, &ynab.account),
    )
}

/// One reconciliation pass driven by the config at `config_path`.
///
/// The watermark is only written back after the plan was applied, so any
/// failure before that leaves the config file untouched.
fn sync<Source, Sink>(
    config_path: &Path,
    dry_run: bool,
    connect_source: impl FnOnce(&ConfigSplitwise) -> anyhow::Result<Source>,
    connect_sink: impl FnOnce(&ConfigYnab) -> Result<Sink, AuthError>,
) -> Result<(), RunError>
where
    Source: ExpenseSource,
    Sink: LedgerSink,
{
    println!("Reading configuration...");
    let mut config = Config::load_from_file(config_path).map_err(RunError::Config)?;

    println!("Authenticating with Splitwise...");
    let source = connect_source(&config.splitwise).map_err(RunError::Source)?;

    let reconcile_config = ReconcileConfig::new(
        config.splitwise.group(),
        config.sync.last_update,
        config.sync.watermark,
    );
    println!("Fetching Splitwise expenses since {}...", config.sync.last_update);
    let state = reconcile_config.read(&source).map_err(RunError::Source)?;

    let plan = state.plan();
    if dry_run {
        show::show_plan(&plan);
        tracing::info!("Dry run, nothing applied");
        return Ok(());
    }

    println!("Authenticating with YNAB...");
    let sink = connect_sink(&config.ynab)?;

    println!("Applying {} change(s) to YNAB...", plan.actions.len());
    let report = plan.apply(&sink);

    let next = state.next_watermark();
    tracing::info!("Advancing watermark from {} to {next}", config.sync.last_update);
    config.sync.last_update = next;

    println!("Writing configuration...");
    config
        .save_to_file(config_path)
        .with_context(|| format!("Watermark {next} was not persisted"))
        .map_err(RunError::Config)?;

    show::show_report(&report);
    Ok(())
}
