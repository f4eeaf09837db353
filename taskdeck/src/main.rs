//! `taskdeck`: command-line client for a remote task service.
//!
//! Every invocation opens a fresh task store, performs one operation and
//! prints the result. Configuration via CLI flags, environment variables,
//! or config file (`~/.config/taskdeck/config.toml`).
//!
//! ```bash
//! # First page of open tasks
//! taskdeck --api-url http://127.0.0.1:8000/api --token "$TOKEN" list --status todo
//!
//! # Create, complete and remove a task
//! taskdeck add "Write the report" --description "Q3 numbers"
//! taskdeck toggle 42
//! taskdeck rm 42
//! ```

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use taskdeck::api::TaskApi;
use taskdeck::api::http::HttpTaskApi;
use taskdeck::auth::{AuthFlag, AuthOracle};
use taskdeck::config::{CliArgs, ClientConfig, Command};
use taskdeck::store::TaskStore;
use taskdeck_proto::task::{
    CreateTaskRequest, Task, TaskFilters, TaskId, TaskStatus, UpdateTaskRequest,
};
use tracing_appender::non_blocking::WorkerGuard;

/// Pages `toggle` will walk through looking for a task before giving up.
const MAX_TOGGLE_SEARCH_PAGES: u32 = 20;

const NOT_SIGNED_IN: &str = "Not signed in: pass --token or set TASKDECK_TOKEN.";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());
    tracing::debug!(?config, "configuration resolved");

    let api =
        match HttpTaskApi::new(&config.api_url, config.token.clone(), config.request_timeout) {
            Ok(api) => api,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        };
    let auth = AuthFlag::new(config.token.is_some());
    let store = TaskStore::new(api, auth).with_page_size(config.per_page);

    run(&store, cli.command.clone().unwrap_or_default(), config.per_page).await
}

/// Initialize logging to stderr, or to a file when `file_path` is given.
///
/// Returns a [`WorkerGuard`] when logging to a file; it must be held until
/// shutdown so buffered entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let Some(log_path) = file_path else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter)
            .init();
        return None;
    };

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

async fn run<A: TaskApi, U: AuthOracle>(
    store: &TaskStore<A, U>,
    command: Command,
    default_per_page: u32,
) -> ExitCode {
    if let Err(message) = check_signed_in(store, &command) {
        eprintln!("{message}");
        return ExitCode::FAILURE;
    }

    match command {
        Command::List {
            page,
            per_page,
            status,
            filters,
        } => {
            let mut partial: TaskFilters = filters.into_iter().collect();
            if let Some(status) = status {
                partial.insert("status", status);
            }
            store.apply_filters(&partial);
            store
                .load_page(page, per_page.unwrap_or(default_per_page))
                .await;
            if let Some(error) = store.error() {
                eprintln!("{error}");
                return ExitCode::FAILURE;
            }
            print_page(store);
            ExitCode::SUCCESS
        }
        Command::Add {
            title,
            description,
            fields,
        } => {
            let mut request = CreateTaskRequest::new(title);
            request.description = description;
            for (key, value) in fields {
                request = request.with_field(key, value);
            }
            if let Err(e) = request.validate() {
                eprintln!("{}: {e}", e.field());
                return ExitCode::from(2);
            }
            match store.create(&request).await {
                Ok(task) => {
                    println!("created {}", format_task(&task));
                    ExitCode::SUCCESS
                }
                Err(_) => report_failure(store),
            }
        }
        Command::Edit {
            id,
            title,
            description,
            status,
        } => {
            let request = UpdateTaskRequest {
                title,
                description,
                status: status.map(TaskStatus::from),
                ..UpdateTaskRequest::default()
            };
            if request.is_empty() {
                eprintln!("nothing to change: pass --title, --description or --status");
                return ExitCode::from(2);
            }
            if let Err(e) = request.validate() {
                eprintln!("{}: {e}", e.field());
                return ExitCode::from(2);
            }
            match store.update(&TaskId::new(id), &request).await {
                Ok(task) => {
                    println!("updated {}", format_task(&task));
                    ExitCode::SUCCESS
                }
                Err(_) => report_failure(store),
            }
        }
        Command::Toggle { id, done, todo } => {
            let id = TaskId::new(id);
            let completed = match (done, todo) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            if !find_cached(store, &id, default_per_page).await {
                if let Some(error) = store.error() {
                    eprintln!("{error}");
                } else {
                    eprintln!("task {id} not found");
                }
                return ExitCode::FAILURE;
            }
            if store.toggle_completion(&id, completed).await {
                if let Some(task) = store.task(&id) {
                    println!("{}", format_task(&task));
                }
                ExitCode::SUCCESS
            } else {
                report_failure(store)
            }
        }
        Command::Rm { id } => {
            let id = TaskId::new(id);
            if store.delete(&id).await {
                println!("deleted {id}");
                ExitCode::SUCCESS
            } else {
                report_failure(store)
            }
        }
    }
}

/// Refuses commands that start by reading the task list while signed out,
/// since list fetches are skipped without authentication.
fn check_signed_in<A: TaskApi, U: AuthOracle>(
    store: &TaskStore<A, U>,
    command: &Command,
) -> Result<(), &'static str> {
    let reads_list = matches!(command, Command::List { .. } | Command::Toggle { .. });
    if reads_list && !store.is_authenticated() {
        return Err(NOT_SIGNED_IN);
    }
    Ok(())
}

/// Walks list pages until `id` is cached, since toggling works from the
/// cached status.
async fn find_cached<A: TaskApi, U: AuthOracle>(
    store: &TaskStore<A, U>,
    id: &TaskId,
    per_page: u32,
) -> bool {
    for page in 1..=MAX_TOGGLE_SEARCH_PAGES {
        store.load_page(page, per_page).await;
        if store.task(id).is_some() {
            return true;
        }
        match store.pagination() {
            Some(p) if store.error().is_none() && p.has_next() => {}
            _ => return false,
        }
    }
    false
}

fn report_failure<A: TaskApi, U: AuthOracle>(store: &TaskStore<A, U>) -> ExitCode {
    eprintln!(
        "{}",
        store
            .error()
            .unwrap_or_else(|| "Operation failed.".to_string())
    );
    ExitCode::FAILURE
}

fn print_page<A: TaskApi, U: AuthOracle>(store: &TaskStore<A, U>) {
    let tasks = store.tasks();
    if tasks.is_empty() {
        println!("no tasks");
    }
    for task in &tasks {
        println!("{}", format_task(task));
    }
    if let Some(p) = store.pagination() {
        println!("page {}/{} ({} tasks)", p.page, p.pages.max(1), p.total);
    }
}

fn format_task(task: &Task) -> String {
    let mark = if task.status.is_done() { 'x' } else { ' ' };
    let mut line = format!("[{mark}] {}  {}", task.id, task.title);
    if let TaskStatus::Other(status) = &task.status {
        line.push_str(&format!("  ({status})"));
    }
    line
}
