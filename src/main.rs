//! # tasker
//!
//! A personal task manager for the terminal. Tasks come in four categories
//! (events, daily routines, projects and personal reminders) and are kept in
//! a small JSON key-value store.
//!
//! ## Features
//!
//! *   **Category aware**: each category has its own set of fields (events get
//!     a date, time, location and image, projects a due date, ...).
//! *   **Self-cleaning list**: tasks whose date has passed are dropped, the rest
//!     is sorted by date and priority every time the list is shown.
//! *   **Daily rollover**: at local midnight daily tasks are discarded and
//!     recreated from your daily templates.
//! *   **Backups**: export to `tasker-backup-<date>.json` and import it back.
//! *   **Dual Interface**: a CLI for scripting and a TUI for browsing.
//!
//! ## Usage
//!
//! ```bash
//! # Interactive mode
//! tasker
//!
//! # Add tasks
//! tasker add "Dentist" --category event --date 2025-03-04 --time "9:00 AM" --location "MainStreet 4"
//! tasker add "Ship v2" --category project --due 2025-04-01 --priority high
//!
//! # Daily routines
//! tasker template add "Stretch" --time "7:00 AM"
//!
//! # List, complete, remove
//! tasker list
//! tasker complete 3f2a
//! tasker remove 3f2a
//!
//! # Backups
//! tasker export --dir ~/backups
//! tasker import ~/backups/tasker-backup-2025-03-01.json
//! ```
//!
//! ## Data Storage
//!
//! The store lives in your local data directory:
//! *   Linux: `~/.local/share/tasker/`
//! *   macOS: `~/Library/Application Support/tasker/`
//! *   Windows: `%APPDATA%\tasker\`
//!
//! Override it with `data_dir` in `config.toml` or the `TASKER_DATA_DIR`
//! environment variable.

mod tui;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use env_logger::{Env, Target};

use tasker::commands::*;
use tasker::config::Config;
use tasker::models::{Category, DailyTemplate, Priority, Status};
use tasker::storage::TaskStore;
use tasker::tasks::{NewTask, TaskUpdate};
use tui::run_tui;

#[derive(Parser)]
#[command(name = "tasker")]
#[command(about = "Personal task manager for events, daily routines, projects and reminders", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task title (quoted if it has spaces)
        title: String,
        /// Category: event, daily, project, personal
        #[arg(short, long, default_value = "personal")]
        category: Category,
        /// Free text details
        #[arg(short, long)]
        details: Option<String>,
        /// Date in YYYY-MM-DD (events, personal)
        #[arg(long)]
        date: Option<String>,
        /// Due date in YYYY-MM-DD (projects)
        #[arg(long)]
        due: Option<String>,
        /// Time of day, e.g. "9:00 AM" (events, daily)
        #[arg(short, long)]
        time: Option<String>,
        /// Location (events)
        #[arg(short, long)]
        location: Option<String>,
        /// Priority: high, medium, low
        #[arg(short, long)]
        priority: Option<Priority>,
        /// Image file to embed (events)
        #[arg(short, long)]
        image: Option<PathBuf>,
    },
    /// List current tasks sorted by date and priority
    List {
        /// Show completed tasks
        #[arg(short, long)]
        all: bool,
        /// Only show one category
        #[arg(short, long)]
        category: Option<Category>,
    },
    /// Show all fields of a task
    Show {
        id: String,
    },
    /// Edit a task
    Edit {
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New category
        #[arg(short, long)]
        category: Option<Category>,
        /// New details
        #[arg(short, long)]
        details: Option<String>,
        /// New date
        #[arg(long)]
        date: Option<String>,
        /// New due date
        #[arg(long)]
        due: Option<String>,
        /// New time of day
        #[arg(short, long)]
        time: Option<String>,
        /// New location
        #[arg(short, long)]
        location: Option<String>,
        /// New priority
        #[arg(short, long)]
        priority: Option<Priority>,
    },
    /// Mark a task as complete
    Complete {
        id: String,
    },
    /// Set the status of a task (not_started, in_progress, completed)
    Status {
        id: String,
        status: Status,
    },
    /// Remove a task
    Remove {
        id: String,
    },
    /// Attach an image to an event
    Image {
        id: String,
        path: PathBuf,
    },
    /// Export all tasks to tasker-backup-<date>.json
    Export {
        /// Directory to write the backup into
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Import tasks from a backup file
    Import {
        file: PathBuf,
        /// Merge into the current tasks instead of replacing them
        #[arg(short, long)]
        merge: bool,
    },
    /// Manage daily templates
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Run the daily rollover now
    Rollover {
        /// Run even if it already ran today
        #[arg(short, long)]
        force: bool,
    },
    /// Reset the store (delete all tasks and templates)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// Add a daily template
    Add {
        /// Template title
        title: String,
        /// Time of day
        #[arg(short, long)]
        time: Option<String>,
        /// Priority of the generated tasks
        #[arg(short, long)]
        priority: Option<Priority>,
        /// Details of the generated tasks
        #[arg(short, long)]
        details: Option<String>,
    },
    /// List daily templates
    List,
    /// Remove a daily template
    Remove {
        /// Template title
        title: String,
    },
}

/// Sets up `env_logger`. `RUST_LOG` wins over the configured level.
///
/// The TUI owns the terminal, so it logs to a file instead of stderr.
fn init_logger(config: &Config, to_file: bool) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(config.log_level.as_str()));
    if to_file {
        match config.open_log_file() {
            Ok(f) => {
                builder.target(Target::Pipe(Box::new(f)));
            }
            Err(e) => {
                eprintln!(
                    "Cannot open log file {}: {}. Logging is disabled.",
                    config.log_file().display(),
                    e
                );
                builder.filter_level(log::LevelFilter::Off);
            }
        }
    }
    if let Err(e) = builder.try_init() {
        eprintln!("Cannot initialise logging: {}", e);
    }
}

fn run(command: Option<Commands>, config: &Config) -> tasker::Result<()> {
    let store = TaskStore::open(config)?;
    match command {
        Some(Commands::Add { title, category, details, date, due, time, location, priority, image }) => {
            let new = NewTask { title, category, details, date, due_date: due, time, location, priority };
            cmd_add(&store, new, image)
        }
        Some(Commands::List { all, category }) => cmd_list(&store, config, all, category),
        Some(Commands::Show { id }) => cmd_show(&store, &id),
        Some(Commands::Edit { id, title, category, details, date, due, time, location, priority }) => {
            let update = TaskUpdate {
                title,
                category,
                details,
                date,
                due_date: due,
                time,
                location,
                priority,
                status: None,
            };
            cmd_edit(&store, &id, update)
        }
        Some(Commands::Complete { id }) => cmd_complete(&store, &id),
        Some(Commands::Status { id, status }) => cmd_status(&store, &id, status),
        Some(Commands::Remove { id }) => cmd_remove(&store, &id),
        Some(Commands::Image { id, path }) => cmd_image(&store, &id, &path),
        Some(Commands::Export { dir }) => cmd_export(&store, dir),
        Some(Commands::Import { file, merge }) => cmd_import(&store, config, &file, merge),
        Some(Commands::Template { command }) => match command {
            TemplateCommands::Add { title, time, priority, details } => {
                cmd_template_add(&store, DailyTemplate { title, details, time, priority })
            }
            TemplateCommands::List => cmd_template_list(&store),
            TemplateCommands::Remove { title } => cmd_template_remove(&store, &title),
        },
        Some(Commands::Rollover { force }) => cmd_rollover(&store, force),
        Some(Commands::Reset { force }) => cmd_reset(&store, force),
        Some(Commands::Completions { shell }) => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => {
                    eprintln!("Unsupported shell: {}", shell);
                    return Ok(());
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "tasker", &mut io::stdout());
            Ok(())
        }
        Some(Commands::Ui) | None => run_tui(store, config.clone()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let interactive = matches!(cli.command, None | Some(Commands::Ui));
    init_logger(&config, interactive);

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
