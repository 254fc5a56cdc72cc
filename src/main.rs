use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use chiongster_admin::access::{AccessDecision, check_access};
use chiongster_admin::backend::rest::RestClient;
use chiongster_admin::backend::{BackendError, Blob, ErrorCode, SortDirection};
use chiongster_admin::config::{AdminConfig, ConfigError};
use chiongster_admin::ledger::{self, LedgerAction, LedgerAdjustment, LedgerError};
use chiongster_admin::record::RecordId;
use chiongster_admin::resource::{self, Resource};
use chiongster_admin::routes::AdminRoute;
use chiongster_admin::state::AppState;
use chiongster_admin::views::detail::{DetailError, DetailView};
use chiongster_admin::views::form::form_fields;
use chiongster_admin::views::list::{ListError, ListView};
use chiongster_admin::views::sequence::{SequenceEditor, SequenceError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("admin access required; redirected to {0}")]
    Forbidden(AdminRoute),
    #[error("unknown resource `{0}`; run `chiongster-admin resources`")]
    UnknownResource(String),
    #[error("invalid assignment `{0}`; expected field=value")]
    InvalidAssignment(String),
    #[error("refusing to delete without --yes")]
    Unconfirmed,
    #[error("could not read {path}: {source}")]
    ReadFile { path: String, source: std::io::Error },
    #[error(transparent)]
    List(#[from] ListError),
    #[error(transparent)]
    Detail(#[from] DetailError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

#[derive(Parser, Debug)]
#[command(name = "chiongster-admin", about = "Chiongster admin console CLI")]
struct Cli {
    /// Rows per list page; overrides ADMIN_PAGE_SIZE.
    #[arg(long, global = true)]
    page_size: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List admin-managed resources.
    Resources,
    List(ListArgs),
    Show {
        resource: String,
        id: String,
    },
    Create {
        resource: String,
        #[command(flatten)]
        write: WriteArgs,
    },
    Edit {
        resource: String,
        id: String,
        #[command(flatten)]
        write: WriteArgs,
    },
    Delete {
        resource: String,
        id: String,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    Ledger(LedgerCommand),
    /// Show or replace a category's question sequence.
    Sequence {
        category_id: String,
        /// Question ids in order; replaces the stored sequence.
        #[arg(long, value_delimiter = ',')]
        items: Option<Vec<String>>,
    },
}

#[derive(Args, Debug)]
struct ListArgs {
    resource: String,
    #[arg(long, default_value_t = 1)]
    page: u64,
    #[arg(long)]
    sort: Option<String>,
    #[arg(long, default_value_t = false)]
    desc: bool,
    #[arg(long)]
    search: Option<String>,
}

#[derive(Args, Debug)]
struct WriteArgs {
    /// `field=value`, repeatable.
    #[arg(long = "set")]
    assignments: Vec<String>,
    /// `field=path` for image fields, repeatable.
    #[arg(long = "file")]
    files: Vec<String>,
}

#[derive(Args, Debug)]
struct LedgerCommand {
    #[command(subcommand)]
    command: LedgerSubcommand,
}

#[derive(Subcommand, Debug)]
enum LedgerSubcommand {
    Credit(LedgerArgs),
    Debit(LedgerArgs),
}

#[derive(Args, Debug)]
struct LedgerArgs {
    user_id: String,
    amount: i64,
    #[arg(long)]
    note: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = match &e {
                CliError::Backend(b) => b.error_code(),
                CliError::Ledger(l) => l.error_code(),
                _ => "E_CLI",
            };
            eprintln!("error [{code}]: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if matches!(cli.command, Command::Resources) {
        print_resources();
        return Ok(());
    }

    let config = AdminConfig::from_env()?;
    let client = RestClient::new(&config.backend)?;
    let mut state = AppState::new(Arc::new(client), &config);
    if let Some(page_size) = cli.page_size {
        state = state.page_size(page_size);
    }

    match check_access(&state).await {
        AccessDecision::Allow(session) => info!(user_id = %session.user_id, "admin session"),
        AccessDecision::Redirect(route) => return Err(CliError::Forbidden(route)),
    }

    let result = dispatch(&state, cli.command).await;
    if let Some(toast) = state.toasts.current() {
        eprintln!("{:?}: {}", toast.severity, toast.message);
    }
    result
}

async fn dispatch(state: &AppState, command: Command) -> Result<(), CliError> {
    match command {
        Command::Resources => {
            print_resources();
            Ok(())
        }
        Command::List(args) => run_list(state, args).await,
        Command::Show { resource, id } => {
            let mut view = DetailView::view(state.clone(), find_resource(&resource)?, RecordId(id));
            view.load().await?;
            print_detail(&view);
            Ok(())
        }
        Command::Create { resource, write } => {
            let view = DetailView::create(state.clone(), find_resource(&resource)?);
            run_write(view, &write).await
        }
        Command::Edit { resource, id, write } => {
            let mut view = DetailView::edit(state.clone(), find_resource(&resource)?, RecordId(id));
            view.load().await?;
            run_write(view, &write).await
        }
        Command::Delete { resource, id, yes } => run_delete(state, find_resource(&resource)?, RecordId(id), yes).await,
        Command::Ledger(cmd) => {
            let (action, args) = match cmd.command {
                LedgerSubcommand::Credit(args) => (LedgerAction::Credit, args),
                LedgerSubcommand::Debit(args) => (LedgerAction::Debit, args),
            };
            let adjustment = LedgerAdjustment { user_id: args.user_id, action, amount: args.amount, note: args.note };
            let receipt = ledger::adjust(state, &adjustment).await?;
            println!(
                "transaction {}: {} -> {}",
                receipt.transaction_id, receipt.balance_before, receipt.balance_after
            );
            Ok(())
        }
        Command::Sequence { category_id, items } => run_sequence(state, category_id, items).await,
    }
}

fn find_resource(slug: &str) -> Result<&'static Resource, CliError> {
    resource::find(slug).ok_or_else(|| CliError::UnknownResource(slug.to_string()))
}

fn print_resources() {
    for r in resource::catalog() {
        println!("{:<28}{:<30}{}", r.slug, r.table, r.title);
    }
}

fn print_detail(view: &DetailView) {
    for field in form_fields(view.resource(), view.draft(), view.mode()) {
        println!("{:<20}{}", field.label, field.value);
    }
    for spec in view.resource().fields {
        if let Some(url) = view.image_url(spec.name) {
            println!("{:<20}{url}", format!("{} URL", spec.label));
        }
    }
}

async fn run_list(state: &AppState, args: ListArgs) -> Result<(), CliError> {
    let mut view = ListView::new(state.clone(), find_resource(&args.resource)?);
    view.fetch().await?;
    if let Some(column) = &args.sort {
        let direction = if args.desc { SortDirection::Descending } else { SortDirection::Ascending };
        view.sort_by(column, direction).await?;
    }
    if args.page != 1 && !view.handle_page_change(args.page).await? {
        eprintln!("page {} is out of range (1..={})", args.page, view.total_pages());
    }
    if let Some(term) = args.search {
        view.set_search(term);
    }

    let display = view.resource().display_field;
    for record in view.visible_rows() {
        println!("{:<12}{}", record.id, record.text(display));
    }
    println!("page {} of {} ({} total)", view.page(), view.total_pages(), view.total_count());
    Ok(())
}

async fn run_write(mut view: DetailView, write: &WriteArgs) -> Result<(), CliError> {
    for assignment in &write.assignments {
        let (field, value) = split_assignment(assignment)?;
        view.set_field(field, value)?;
    }
    for file in &write.files {
        let (field, path) = split_assignment(file)?;
        view.attach_file(field, read_blob(path).await?)?;
    }
    let route = view.submit().await?;
    println!("{route}");
    Ok(())
}

async fn run_delete(state: &AppState, resource: &'static Resource, id: RecordId, yes: bool) -> Result<(), CliError> {
    let mut view = ListView::new(state.clone(), resource);
    view.fetch().await?;
    while !view.rows().iter().any(|r| r.id == id) {
        if !view.next_page().await? {
            return Err(ListError::RowNotFound(id).into());
        }
    }

    view.request_delete(&id)?;
    if !yes {
        view.cancel_delete();
        return Err(CliError::Unconfirmed);
    }
    view.confirm_delete().await?;
    println!("deleted {} {id}", resource.slug);
    Ok(())
}

async fn run_sequence(state: &AppState, category_id: String, items: Option<Vec<String>>) -> Result<(), CliError> {
    let mut editor = SequenceEditor::new(state.clone(), category_id);
    editor.load().await?;

    if let Some(items) = items {
        let current: Vec<RecordId> = editor
            .selected()
            .iter()
            .map(|s| s.item_id.clone())
            .collect();
        for id in &current {
            editor.remove(id)?;
        }
        for id in items {
            editor.add(&RecordId(id))?;
        }
        editor.save().await?;
    }

    for item in editor.selected() {
        println!("{:>3}. [{}] {}", item.position, item.item_id, item.label);
    }
    Ok(())
}

fn split_assignment(raw: &str) -> Result<(&str, &str), CliError> {
    raw.split_once('=')
        .filter(|(field, _)| !field.is_empty())
        .ok_or_else(|| CliError::InvalidAssignment(raw.to_string()))
}

async fn read_blob(path: &str) -> Result<Blob, CliError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| CliError::ReadFile { path: path.to_string(), source })?;
    let file = Path::new(path);
    let file_name = file
        .file_name()
        .map_or_else(|| path.to_string(), |n| n.to_string_lossy().into_owned());
    let content_type = match file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    };
    Ok(Blob { file_name, content_type: content_type.to_string(), bytes })
}
