use std::fs;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use flock_roster_manager::app::App;
use flock_roster_manager::batch::BatchOperation;
use flock_roster_manager::config::{ConfigLoader, ResolvedConfig};
use flock_roster_manager::domain::{BranchFilter, BranchId, Channel, RecordId, Tab};
use flock_roster_manager::error::RosterError;
use flock_roster_manager::local::LocalStore;
use flock_roster_manager::messaging::{HttpMessagingClient, MessagingClient};
use flock_roster_manager::normalize::RawRow;
use flock_roster_manager::output::JsonOutput;
use flock_roster_manager::store::{DirectoryStore, HttpDirectoryStore};
use flock_roster_manager::view::DirectoryView;

#[derive(Parser)]
#[command(name = "flock-rm")]
#[command(about = "Membership and visitor roster directory manager")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    /// Root of the local store (defaults to ./.flock-rm, then the user data dir)
    #[arg(long, global = true)]
    root: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Browse and mutate the membership directory")]
    Directory(DirectoryArgs),
}

#[derive(Args)]
struct DirectoryArgs {
    #[command(subcommand)]
    command: DirectoryCommand,
}

#[derive(Subcommand)]
enum DirectoryCommand {
    #[command(about = "List one page of the filtered directory")]
    List(ListArgs),
    #[command(about = "Bulk-import rows from a JSON file")]
    Import(ImportArgs),
    #[command(about = "Request branch transfers for selected records")]
    Transfer(TransferArgs),
    #[command(about = "Send a bulk message to selected records")]
    Notify(NotifyArgs),
    #[command(about = "Archive selected records")]
    Archive(ArchiveArgs),
}

#[derive(Args)]
struct ListArgs {
    #[arg(long, value_enum, default_value_t = Tab::Workers)]
    tab: Tab,

    #[arg(long)]
    branch: Option<String>,

    #[arg(long)]
    level: Option<String>,

    #[arg(long)]
    search: Option<String>,

    #[arg(long, default_value_t = 1)]
    page: usize,
}

#[derive(Args)]
struct ImportArgs {
    /// JSON file holding an array of raw rows
    rows: String,

    #[arg(long, value_enum, default_value_t = Tab::Visitors)]
    tab: Tab,

    #[arg(long)]
    branch: Option<String>,

    #[arg(long)]
    chunk_size: Option<usize>,
}

#[derive(Args)]
struct TransferArgs {
    #[arg(long = "id", required = true)]
    ids: Vec<String>,

    #[arg(long, value_enum, default_value_t = Tab::Workers)]
    tab: Tab,

    #[arg(long)]
    to_branch: String,

    #[arg(long)]
    reason: String,
}

#[derive(Args)]
struct NotifyArgs {
    #[arg(long = "id", required = true)]
    ids: Vec<String>,

    #[arg(long, value_enum, default_value_t = Tab::Workers)]
    tab: Tab,

    #[arg(long, value_enum)]
    channel: Channel,

    #[arg(long)]
    subject: Option<String>,

    #[arg(long)]
    body: String,
}

#[derive(Args)]
struct ArchiveArgs {
    #[arg(long = "id", required = true)]
    ids: Vec<String>,

    #[arg(long, value_enum, default_value_t = Tab::Workers)]
    tab: Tab,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(roster) = report.downcast_ref::<RosterError>() {
            return ExitCode::from(map_exit_code(roster));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &RosterError) -> u8 {
    match error {
        RosterError::RecordNotFound(_) | RosterError::MissingConfig => 2,
        RosterError::StoreHttp(_)
        | RosterError::StoreStatus { .. }
        | RosterError::MessagingHttp(_)
        | RosterError::MessagingStatus { .. }
        | RosterError::AuthExpired(_)
        | RosterError::StoreUnavailable(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => ConfigLoader::resolve(Some(path)).into_diagnostic()?,
        None => ConfigLoader::resolve_optional(None).into_diagnostic()?,
    };

    let Commands::Directory(args) = cli.command;

    match config.api_base_url.clone() {
        Some(url) => {
            let store = HttpDirectoryStore::new(url).into_diagnostic()?;
            dispatch(store, &config, args.command)
        }
        None => {
            let store = match cli.root.as_deref() {
                Some(root) => LocalStore::new(Utf8PathBuf::from(root)),
                None => LocalStore::resolve_default().into_diagnostic()?,
            };
            dispatch(store, &config, args.command)
        }
    }
}

fn dispatch<S: DirectoryStore + 'static>(
    store: S,
    config: &ResolvedConfig,
    command: DirectoryCommand,
) -> miette::Result<()> {
    match config.messaging_base_url.clone() {
        Some(url) => {
            let messaging = HttpMessagingClient::new(url).into_diagnostic()?;
            run_command(store, messaging, config, command)
        }
        None => run_command(store, NopMessaging, config, command),
    }
}

struct NopMessaging;

impl MessagingClient for NopMessaging {
    fn send_bulk_message(
        &self,
        _recipients: &[RecordId],
        _channel: Channel,
        _subject: Option<&str>,
        _body: &str,
    ) -> Result<(), RosterError> {
        Err(RosterError::MessagingHttp(
            "messaging service not configured".to_string(),
        ))
    }
}

fn run_command<S: DirectoryStore + 'static, M: MessagingClient + 'static>(
    store: S,
    messaging: M,
    config: &ResolvedConfig,
    command: DirectoryCommand,
) -> miette::Result<()> {
    match command {
        DirectoryCommand::List(args) => {
            let app =
                App::new(store, messaging, config.page_size, config.chunk_size).into_diagnostic()?;
            let branch = parse_branch_filter(args.branch.as_deref())?;
            let mut view = app.load(args.tab, &branch, &JsonOutput).into_diagnostic()?;
            if let Some(level) = args.level.as_deref() {
                view.set_level_filter(level.parse().into_diagnostic()?);
            }
            if let Some(search) = args.search {
                view.set_search_term(search);
            }
            view.goto_page(args.page);
            JsonOutput::print_page(&view.current_page()).into_diagnostic()?;
            Ok(())
        }
        DirectoryCommand::Import(args) => {
            let chunk_size = args.chunk_size.unwrap_or(config.chunk_size);
            let app = App::new(store, messaging, config.page_size, chunk_size).into_diagnostic()?;
            let content = fs::read_to_string(&args.rows)
                .map_err(|err| RosterError::Filesystem(format!("read {}: {err}", args.rows)))
                .into_diagnostic()?;
            let rows: Vec<RawRow> = serde_json::from_str(&content)
                .map_err(|err| miette::Report::msg(format!("failed to parse rows file: {err}")))?;
            let branch = match args.branch.as_deref() {
                Some(value) => Some(value.parse::<BranchId>().into_diagnostic()?),
                None => config.default_branch.clone(),
            };
            let report = app
                .import(&rows, args.tab, branch.as_ref(), &JsonOutput)
                .into_diagnostic()?;
            JsonOutput::print_import(&report).into_diagnostic()?;
            Ok(())
        }
        DirectoryCommand::Transfer(args) => {
            let operation = BatchOperation::Transfer {
                to_branch: args.to_branch.parse().into_diagnostic()?,
                reason: args.reason,
            };
            run_selection_op(store, messaging, config, args.tab, &args.ids, operation)
        }
        DirectoryCommand::Notify(args) => {
            let operation = BatchOperation::Notify {
                channel: args.channel,
                subject: args.subject,
                body: args.body,
            };
            run_selection_op(store, messaging, config, args.tab, &args.ids, operation)
        }
        DirectoryCommand::Archive(args) => {
            run_selection_op(store, messaging, config, args.tab, &args.ids, BatchOperation::Archive)
        }
    }
}

fn run_selection_op<S: DirectoryStore + 'static, M: MessagingClient + 'static>(
    store: S,
    messaging: M,
    config: &ResolvedConfig,
    tab: Tab,
    ids: &[String],
    operation: BatchOperation,
) -> miette::Result<()> {
    let app = App::new(store, messaging, config.page_size, config.chunk_size).into_diagnostic()?;
    let mut view = app
        .load(tab, &BranchFilter::All, &JsonOutput)
        .into_diagnostic()?;
    select_ids(&mut view, ids).into_diagnostic()?;
    let outcome = app
        .run_batch(&mut view, &operation, &JsonOutput)
        .into_diagnostic()?;
    JsonOutput::print_batch(&outcome).into_diagnostic()?;
    Ok(())
}

fn select_ids(view: &mut DirectoryView, ids: &[String]) -> Result<(), RosterError> {
    for raw in ids {
        let id: RecordId = raw.parse()?;
        if !view.records().iter().any(|record| record.id == id) {
            return Err(RosterError::RecordNotFound(id.to_string()));
        }
        if !view.selection().contains(&id) {
            view.toggle(id);
        }
    }
    Ok(())
}

fn parse_branch_filter(value: Option<&str>) -> miette::Result<BranchFilter> {
    match value {
        Some(value) => value.parse::<BranchFilter>().into_diagnostic(),
        None => Ok(BranchFilter::All),
    }
}
