//! Command-line renderer for TaskDeck.
//!
//! # Responsibility
//! - Map subcommands onto `TaskStore` operations.
//! - Render list views, stats and reminder notifications as plain text.
//!
//! All task rules live in `taskdeck_core`; this binary only parses input
//! and prints results.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use taskdeck_core::{
    due_indicator, format_due_date, init_logging, parse_due_date, relative_created_label,
    DueIndicator, FilterMode, Priority, ReminderRunner, ReminderScheduler, SqliteKvRepository,
    SystemClock, TaskDeckConfig, TaskId, TaskPatch, TaskStore,
};
use tokio::sync::{mpsc, Mutex};

type CliStore = TaskStore<SqliteKvRepository, SystemClock>;

/// TaskDeck: a local task list with due-date reminders.
#[derive(Parser)]
#[command(name = "taskdeck", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database file; overrides `storage.db_path`.
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Add a task.
    Add {
        text: String,
        /// high | medium | low
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
        /// Local due time, e.g. 2026-05-04T17:30.
        #[arg(short, long, value_parser = parse_due_date)]
        due: Option<chrono::NaiveDateTime>,
    },

    /// Show tasks (default command).
    List {
        /// all | pending | completed | priority
        #[arg(short, long, default_value = "all")]
        filter: FilterMode,
    },

    /// Flip a task between pending and completed.
    Toggle { id: TaskId },

    /// Change text, priority or due date of a task.
    Edit {
        id: TaskId,
        #[arg(short, long)]
        text: Option<String>,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(short, long, value_parser = parse_due_date)]
        due: Option<chrono::NaiveDateTime>,
    },

    /// Remove a task.
    Delete { id: TaskId },

    /// Show completion statistics.
    Stats,

    /// Stay in the foreground and print reminders until Ctrl+C.
    Watch,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = TaskDeckConfig::load(cli.config.as_deref())?;

    if let Err(err) = init_logging(&config.logging.level, &config.logging.dir) {
        eprintln!("warning: file logging disabled: {err}");
    }

    let db_path = cli.db.unwrap_or_else(|| config.storage.db_path.clone());
    let repo = SqliteKvRepository::open(&db_path)
        .with_context(|| format!("cannot open task database `{}`", db_path.display()))?;
    let mut store = TaskStore::open(repo, SystemClock);
    if config.storage.seed_sample_task {
        store.seed_sample_if_empty()?;
    }

    match cli.command.unwrap_or(Command::List {
        filter: FilterMode::All,
    }) {
        Command::Add {
            text,
            priority,
            due,
        } => {
            let task = store.add(&text, priority, due)?;
            println!("Added #{}: {}", task.id, task.text);
        }
        Command::List { filter } => print_list(&store, filter, &config),
        Command::Toggle { id } => match store.toggle_completed(id)? {
            Some(task) if task.completed => println!("Completed #{}: {}", task.id, task.text),
            Some(task) => println!("Reopened #{}: {}", task.id, task.text),
            None => println!("No task with id {id}"),
        },
        Command::Edit {
            id,
            text,
            priority,
            due,
        } => {
            let patch = TaskPatch {
                text,
                priority,
                due_date: due,
            };
            if patch.is_empty() {
                bail!("nothing to change; pass --text, --priority or --due");
            }
            match store.update(id, patch)? {
                Some(task) => println!("Updated #{}: {}", task.id, task.text),
                None => println!("No task with id {id}"),
            }
        }
        Command::Delete { id } => match store.delete(id)? {
            Some(task) => println!("Deleted #{}: {}", task.id, task.text),
            None => println!("No task with id {id}"),
        },
        Command::Stats => {
            let stats = store.stats();
            println!("Total:     {}", stats.total);
            println!("Pending:   {}", stats.pending);
            println!("Completed: {}", stats.completed);
            println!("Progress:  {}%", stats.progress_percent);
        }
        Command::Watch => watch(store, &config).await?,
    }

    Ok(())
}

fn print_list(store: &CliStore, filter: FilterMode, config: &TaskDeckConfig) {
    let view = store.filtered_view(filter);
    if view.is_empty() {
        println!("No tasks to show (filter: {filter}).");
        return;
    }
    let now = store.now();
    let window = config.reminders.due_soon_window();
    for task in &view {
        let marker = match due_indicator(task, now, window) {
            Some(DueIndicator::Overdue) => "  [overdue]",
            Some(DueIndicator::DueSoon) => "  [due soon]",
            None => "",
        };
        println!(
            "{} #{:<4} {:<6} {}  (due {}, added {}){}",
            if task.completed { "[x]" } else { "[ ]" },
            task.id,
            task.priority.as_str(),
            task.text,
            format_due_date(task.due_date),
            relative_created_label(task.created_at, now),
            marker
        );
    }
}

async fn watch(store: CliStore, config: &TaskDeckConfig) -> anyhow::Result<()> {
    if !config.reminders.enabled {
        println!("Reminders are disabled in the configuration.");
        return Ok(());
    }

    println!(
        "Watching {} pending task(s). Press Ctrl+C to stop.",
        store.stats().pending
    );

    let store = Arc::new(Mutex::new(store));
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let handle = ReminderRunner::new(
        store,
        ReminderScheduler::new(&config.reminders),
        events_tx,
    )
    .with_interval(config.reminders.interval())
    .spawn();

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    warn!("event=watch module=cli status=error error_code=signal_failed error={err}");
                }
                info!("event=watch module=cli status=stopped reason=ctrl_c");
                break;
            }
            event = events_rx.recv() => {
                let Some(event) = event else {
                    break;
                };
                println!("{}  {}", event.title(), event.message());
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}
