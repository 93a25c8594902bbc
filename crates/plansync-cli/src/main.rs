//! plansync CLI - move data between a planning platform and a database.

use clap::{Parser, Subcommand, ValueEnum};
use plansync::db::{ConnectionManager, PostgresBackend};
use plansync::remote::http::{ApiClient, HttpChunkSource, HttpListApi};
use plansync::remote::ItemAction;
use plansync::{Config, SyncError, TransferResult};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "plansync")]
#[command(about = "Transfer data between a planning platform and a relational database")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download an export file and load it into the database
    ExportToDb {
        /// Identifier of the export file to download
        #[arg(long)]
        file_id: String,

        /// Comma-separated header columns to bind, in statement-parameter
        /// order [default: every column in header order]
        #[arg(long)]
        columns: Option<String>,
    },

    /// Read the database page by page and apply each page to a list
    DbToList {
        /// Identifier of the target list
        #[arg(long)]
        list_id: String,

        /// Bulk operation to apply to each page
        #[arg(long, value_enum, default_value_t = Action::Add)]
        action: Action,
    },

    /// Load and validate the configuration file
    ValidateConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum Action {
    Add,
    Update,
    Delete,
}

impl From<Action> for ItemAction {
    fn from(action: Action) -> Self {
        match action {
            Action::Add => ItemAction::Add,
            Action::Update => ItemAction::Update,
            Action::Delete => ItemAction::Delete,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), SyncError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| SyncError::Config(e.to_string()))?;

    let config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    if let Commands::ValidateConfig = cli.command {
        println!("Configuration is valid");
        return Ok(());
    }

    let cancel_token = setup_signal_handler();
    let policy = config.transfer.retry_policy();
    let backend = PostgresBackend::new(config.database.clone());
    let mut manager = ConnectionManager::new(backend, &config.database, policy)?;
    let client = ApiClient::new(&config.remote)?;

    let result = match cli.command {
        Commands::ValidateConfig => unreachable!(), // Handled above
        Commands::ExportToDb { file_id, columns } => {
            let columns: Vec<String> = columns
                .map(|c| c.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default();
            let source = HttpChunkSource::new(client, file_id);
            plansync::export_to_database(
                &source,
                &mut manager,
                &config.transfer,
                &columns,
                &cancel_token,
            )
            .await?
        }
        Commands::DbToList { list_id, action } => {
            let api = HttpListApi::new(client, list_id);
            plansync::database_to_list(
                &api,
                &mut manager,
                &config.database,
                &config.transfer,
                action.into(),
                &cancel_token,
            )
            .await?
        }
    };

    report(&result, cli.output_json)?;
    Ok(())
}

fn report(result: &TransferResult, output_json: bool) -> Result<(), SyncError> {
    if output_json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        println!("\nTransfer completed!");
        println!("  Rows: {}", result.rows_transferred);
        println!("  Batches: {}", result.batches_committed);
        if result.pages_read > 0 {
            println!("  Pages: {}", result.pages_read);
            println!(
                "  Items: +{} ~{} -{}",
                result.added, result.updated, result.deleted
            );
        }
        println!("  Ignored: {}", result.ignored);
        for failure in &result.failures {
            println!("    row {}: {}", failure.row_index, failure.reason);
        }
    }
    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}

/// Returns a token cancelled on SIGINT or SIGTERM; the pipeline finishes its
/// current step and stops at the next decision point.
#[cfg(unix)]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();

    let token_int = cancel_token.clone();
    tokio::spawn(async move {
        if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
            sigint.recv().await;
            eprintln!("\nReceived SIGINT. Shutting down gracefully...");
            token_int.cancel();
        }
    });

    let token_term = cancel_token.clone();
    tokio::spawn(async move {
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            sigterm.recv().await;
            eprintln!("\nReceived SIGTERM. Shutting down gracefully...");
            token_term.cancel();
        }
    });

    cancel_token
}

#[cfg(not(unix))]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl-C. Shutting down gracefully...");
            token.cancel();
        }
    });

    cancel_token
}
