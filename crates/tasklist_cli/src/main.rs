//! Terminal front end for the task list.
//!
//! # Responsibility
//! - Map one subcommand to one user intent.
//! - Print the re-projected list and any notice after every action.
//!
//! Failures inside an action are notices (stderr, exit 0); only startup and
//! configuration failures end the process with an error.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;
use tasklist_core::db::open_db;
use tasklist_core::{
    format_rows, init_logging, AppConfig, Backend, Frame, Intent, Notice, NoticeKind, Priority,
    SortKey, SystemClock, TaskBoard, TaskFilter, TaskId, TaskPersistence, TaskStore, Theme,
    ThemeSettings, ViewState,
};

#[derive(Debug, Parser)]
#[command(name = "tasklist", version, about = "A small to-do list, local or remote")]
struct Cli {
    /// Storage backend (`local` or `remote`).
    #[arg(long, global = true, value_parser = parse_label::<Backend>)]
    backend: Option<Backend>,
    /// Local database file [default: <user data dir>/tasklist/tasklist.sqlite3].
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Remote API base URL, e.g. `http://localhost:5000/api`.
    #[arg(long, global = true)]
    api: Option<String>,
    /// Per-request timeout for the remote backend.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Directory for rolling log files; logging is off when unset.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    /// all|active|completed|overdue|high|medium|low
    #[arg(long, global = true, default_value = "all", value_parser = parse_label::<TaskFilter>)]
    filter: TaskFilter,
    /// Case-insensitive text search.
    #[arg(long, global = true, default_value = "")]
    search: String,
    /// created_desc|created_asc|due_asc|priority
    #[arg(long, global = true, default_value = "created_desc", value_parser = parse_label::<SortKey>)]
    sort: SortKey,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(flatten)]
    Task(TaskCommand),
    /// Show or change the color theme.
    Theme { action: Option<ThemeAction> },
    Version,
}

#[derive(Debug, Subcommand)]
enum TaskCommand {
    /// Show tasks.
    List,
    /// Add a task at the top of the list.
    Add {
        text: String,
        /// Due date as YYYY-MM-DD.
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_parser = parse_label::<Priority>)]
        priority: Option<Priority>,
    },
    /// Flip a task between open and done.
    Toggle { id: String },
    /// Replace a task's text; blank text is ignored.
    Edit { id: String, text: String },
    /// Cycle priority high -> medium -> low -> high.
    CyclePriority { id: String },
    /// Set or clear (no date) a task's due date.
    Due { id: String, date: Option<String> },
    Delete { id: String },
    /// Move a task so it sits right before another one.
    Move {
        id: String,
        #[arg(long)]
        before: String,
    },
    /// Delete every task.
    Clear,
    /// Write all tasks as a JSON array.
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Add tasks from a JSON array file; existing ids are skipped.
    Import { file: PathBuf },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ThemeAction {
    Toggle,
    Light,
    Dark,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).context("failed to initialize logging")?;
    }

    let view = ViewState::new(cli.filter, cli.search, cli.sort);
    match cli.command {
        Command::Version => {
            println!("tasklist {}", tasklist_core::core_version());
            Ok(())
        }
        Command::Theme { action } => {
            let conn = open_local_db(&config)?;
            run_theme(&ThemeSettings::new(&conn), action)
        }
        Command::Task(command) => {
            let conn = open_local_db(&config)?;
            run_task_command(&config, &conn, view, command)
        }
    }
}

fn open_local_db(config: &AppConfig) -> Result<Connection> {
    open_db(&config.db_path)
        .with_context(|| format!("failed to open {}", config.db_path.display()))
}

fn run_task_command(
    config: &AppConfig,
    conn: &Connection,
    view: ViewState,
    command: TaskCommand,
) -> Result<()> {
    let persistence = config
        .task_persistence(conn)
        .context("failed to set up task backend")?;
    let mut board = TaskBoard::new(TaskStore::new(persistence, SystemClock));
    let loaded = board.refresh();
    print_notice(loaded.notice.as_ref());
    board.set_view(view);

    let frame = match command {
        TaskCommand::List => board.frame(),
        TaskCommand::Add {
            text,
            due,
            priority,
        } => board.dispatch(Intent::Add {
            text,
            due_date: due,
            priority,
        }),
        TaskCommand::Toggle { id } => board.dispatch(Intent::ToggleComplete(TaskId::from(id))),
        TaskCommand::Edit { id, text } => board.dispatch(Intent::CommitEdit {
            id: TaskId::from(id),
            text,
        }),
        TaskCommand::CyclePriority { id } => {
            board.dispatch(Intent::CyclePriority(TaskId::from(id)))
        }
        TaskCommand::Due { id, date } => board.dispatch(Intent::SetDueDate {
            id: TaskId::from(id),
            due_date: date,
        }),
        TaskCommand::Delete { id } => board.dispatch(Intent::Delete(TaskId::from(id))),
        TaskCommand::Move { id, before } => board.dispatch(Intent::Drop {
            moved: TaskId::from(id),
            target: TaskId::from(before),
        }),
        TaskCommand::Clear => board.dispatch(Intent::ClearAll),
        TaskCommand::Export { out } => return run_export(&board, out),
        TaskCommand::Import { file } => {
            let payload = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let (frame, report) = board.import_json(&payload);
            if let Some(report) = report {
                println!(
                    "imported {} task(s), skipped {}",
                    report.imported, report.skipped
                );
            }
            frame
        }
    };

    print_frame(&frame);
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::from_env().context("invalid environment configuration")?;
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(api) = &cli.api {
        config.api_base = api.clone();
    }
    if let Some(secs) = cli.timeout_secs {
        if secs == 0 {
            bail!("--timeout-secs must be at least 1");
        }
        config.request_timeout = Some(Duration::from_secs(secs));
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    Ok(config)
}

fn run_theme(settings: &ThemeSettings<'_>, action: Option<ThemeAction>) -> Result<()> {
    let theme = match action {
        None => settings.load(),
        Some(ThemeAction::Toggle) => settings.toggle(),
        Some(ThemeAction::Light) => settings.set(Theme::Light).map(|()| Theme::Light),
        Some(ThemeAction::Dark) => settings.set(Theme::Dark).map(|()| Theme::Dark),
    };
    match theme {
        Ok(theme) => println!("theme: {theme}"),
        Err(err) => eprintln!("storage: {err}"),
    }
    Ok(())
}

fn run_export<P: TaskPersistence>(board: &TaskBoard<P>, out: Option<PathBuf>) -> Result<()> {
    let json = match board.export_json() {
        Ok(json) => json,
        Err(notice) => {
            print_notice(Some(&notice));
            return Ok(());
        }
    };
    match out {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "exported {} task(s) to {}",
                board.store().len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn print_frame(frame: &Frame) {
    print_notice(frame.notice.as_ref());
    if frame.rows.is_empty() {
        println!("(no tasks)");
        return;
    }
    for line in format_rows(&frame.rows) {
        println!("{line}");
    }
}

fn print_notice(notice: Option<&Notice>) {
    if let Some(notice) = notice {
        let label = match notice.kind {
            NoticeKind::Validation => "invalid input",
            NoticeKind::NotFound => "not found",
            NoticeKind::Storage => "storage",
            NoticeKind::Transport => "network",
        };
        eprintln!("{label}: {}", notice.message);
    }
}

fn parse_label<T>(value: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|err| err.to_string())
}
