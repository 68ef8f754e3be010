use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, TimeZone};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::lock::{DEFAULT_LOCK_TIMEOUT, DataLock};
use crate::io::recovery;
use crate::io::storage::{self, FileStore};
use crate::model::config::{ActivityWindow, Config};
use crate::model::filter::{CategoryFilter, StatusFilter};
use crate::ops::stats;
use crate::store::{Confirm, Notifier, Outcome, TodoStore};

type CliResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CliResult {
    let json = cli.json;
    let data_dir = cli.data_dir.unwrap_or_else(storage::default_data_dir);
    tracing::debug!(data_dir = %data_dir.display(), "resolved data directory");

    match cli.command {
        Commands::Init(args) => cmd_init(&data_dir, args),
        Commands::Add(args) => cmd_add(&data_dir, args),
        Commands::List(args) => cmd_list(&data_dir, args, json),
        Commands::Toggle(args) => cmd_toggle(&data_dir, args),
        Commands::Edit(args) => cmd_edit(&data_dir, args),
        Commands::Rm(args) => cmd_rm(&data_dir, args),
        Commands::Clear(args) => cmd_clear(&data_dir, args),
        Commands::Stats(args) => cmd_stats(&data_dir, args, json),
        Commands::Categories(args) => cmd_categories(&data_dir, args, json),
        Commands::Recovery(args) => cmd_recovery(&data_dir, args, json),
    }
}

// ---------------------------------------------------------------------------
// Terminal seams for the store
// ---------------------------------------------------------------------------

/// Reports storage failures on stderr.
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn error(&self, title: &str, message: &str) {
        eprintln!("error: {}: {}", title, message);
    }
}

/// Asks on stderr and reads the answer from stdin; `--yes` skips the prompt.
pub struct PromptConfirm {
    pub assume_yes: bool,
}

impl Confirm for PromptConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{} [y/N] ", prompt);
        let _ = std::io::stderr().flush();
        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

type CliStore = TodoStore<FileStore, StderrNotifier, PromptConfirm>;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_config(data_dir: &Path) -> Result<Config, config_io::ConfigError> {
    config_io::read_config(data_dir).map(|(config, _)| config)
}

fn build_store(data_dir: &Path, config: &Config, assume_yes: bool) -> CliStore {
    TodoStore::new(
        FileStore::new(data_dir),
        StderrNotifier,
        PromptConfirm {
            assume_yes: assume_yes || !config.ui.confirm,
        },
    )
    .with_default_category(&config.categories.default)
}

/// Store for read-only commands. An unreadable blob has already been
/// reported; the view continues with an empty list.
fn open_for_read(data_dir: &Path, config: &Config) -> CliStore {
    let mut store = build_store(data_dir, config, false);
    let _ = store.load();
    store
}

/// Run a mutation with the data lock held from load to save. Refuses to
/// touch a blob that could not be read, so it is never overwritten.
fn with_store<T>(
    data_dir: &Path,
    assume_yes: bool,
    f: impl FnOnce(&mut CliStore) -> T,
) -> Result<T, Box<dyn std::error::Error>> {
    let config = load_config(data_dir)?;
    let _lock = DataLock::acquire(data_dir, DEFAULT_LOCK_TIMEOUT)?;
    let mut store = build_store(data_dir, &config, assume_yes);
    store.load().map_err(|_| {
        format!(
            "not changing unreadable todos in {} (see `tick recovery`)",
            data_dir.display()
        )
    })?;
    Ok(f(&mut store))
}

fn report_missing(id: &str) {
    println!("no todo with id {}", id);
}

fn parse_status(s: &str) -> Result<StatusFilter, String> {
    StatusFilter::parse_filter(s).ok_or_else(|| {
        format!(
            "invalid status '{}' (expected all, active or completed)",
            s
        )
    })
}

fn parse_reference(date: Option<&str>) -> Result<DateTime<Local>, String> {
    let Some(date) = date else {
        return Ok(Local::now());
    };
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{}': {}", date, e))?;
    let noon = day
        .and_hms_opt(12, 0, 0)
        .ok_or_else(|| format!("invalid date '{}'", date))?;
    Local
        .from_local_datetime(&noon)
        .earliest()
        .ok_or_else(|| format!("date '{}' does not exist in the local time zone", date))
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

fn cmd_init(data_dir: &Path, args: InitArgs) -> CliResult {
    let path: PathBuf = config_io::init_config(data_dir, args.force)?;
    println!("wrote {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Todo commands
// ---------------------------------------------------------------------------

fn cmd_add(data_dir: &Path, args: AddArgs) -> CliResult {
    if args.text.trim().is_empty() {
        println!("nothing added: text is empty");
        return Ok(());
    }
    let added = with_store(data_dir, false, |store| {
        store.add(&args.text, args.category.as_deref())
    })?;
    match added {
        Some(id) => println!("{}", id),
        None => println!("nothing added: text is empty"),
    }
    Ok(())
}

fn cmd_list(data_dir: &Path, args: ListArgs, json: bool) -> CliResult {
    let config = load_config(data_dir)?;
    let status = parse_status(&args.status)?;
    let category = CategoryFilter::from_label(&args.category);
    let store = open_for_read(data_dir, &config);
    let filtered = stats::filter_todos(store.todos(), status, &category);

    if json {
        let items: Vec<TodoJson> = filtered.iter().map(todo_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for line in format_todo_list(&filtered, config.ui.text_width) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_toggle(data_dir: &Path, args: ToggleArgs) -> CliResult {
    let state = with_store(data_dir, false, |store| {
        store.toggle(&args.id);
        store.todos().get(&args.id).map(|t| t.completed)
    })?;
    match state {
        Some(true) => println!("{} completed", args.id),
        Some(false) => println!("{} active", args.id),
        None => report_missing(&args.id),
    }
    Ok(())
}

fn cmd_edit(data_dir: &Path, args: EditArgs) -> CliResult {
    if args.text.trim().is_empty() {
        println!("{} unchanged: text is empty", args.id);
        return Ok(());
    }
    let outcome = with_store(data_dir, false, |store| {
        store.edit(&args.id, &args.text, args.category.as_deref())
    })?;
    if outcome.changed() {
        println!("{} updated", args.id);
    } else {
        report_missing(&args.id);
    }
    Ok(())
}

fn cmd_rm(data_dir: &Path, args: RmArgs) -> CliResult {
    let outcome = with_store(data_dir, args.yes, |store| store.delete(&args.id))?;
    match outcome {
        Outcome::Changed => println!("deleted {}", args.id),
        Outcome::Declined => println!("kept {}", args.id),
        Outcome::Unchanged => report_missing(&args.id),
    }
    Ok(())
}

fn cmd_clear(data_dir: &Path, args: ClearArgs) -> CliResult {
    let (outcome, removed) = with_store(data_dir, args.yes, |store| {
        let before = store.todos().len();
        let outcome = store.clear_completed();
        (outcome, before - store.todos().len())
    })?;
    match outcome {
        Outcome::Changed => println!("removed {} completed", removed),
        Outcome::Declined => println!("nothing removed"),
        Outcome::Unchanged => println!("no completed todos"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

fn cmd_stats(data_dir: &Path, args: StatsArgs, json: bool) -> CliResult {
    let config = load_config(data_dir)?;
    let reference = parse_reference(args.date.as_deref())?;
    let window = if args.rolling {
        ActivityWindow::Rolling
    } else {
        config.stats.window
    };
    let store = open_for_read(data_dir, &config);
    let report = stats::progress_report(
        store.todos(),
        &config.categories.labels,
        &reference,
        window,
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in format_progress(&report) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_categories(data_dir: &Path, args: CategoriesCmd, json: bool) -> CliResult {
    match args.action {
        None => {
            let config = load_config(data_dir)?;
            let store = open_for_read(data_dir, &config);
            let default = config.categories.default.as_str();
            if json {
                let out: Vec<CategoryJson> = config
                    .categories
                    .labels
                    .iter()
                    .map(|label| CategoryJson {
                        label: label.to_string(),
                        default: label == default,
                        todos: store.todos().iter().filter(|t| t.category == label).count(),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                for line in format_categories(&config.categories.labels, default, store.todos()) {
                    println!("{}", line);
                }
            }
        }
        Some(CategoryAction::Add { label }) => {
            let label = label.trim();
            if label.is_empty() {
                return Err("category label cannot be empty".into());
            }
            let _lock = DataLock::acquire(data_dir, DEFAULT_LOCK_TIMEOUT)?;
            let (config, mut doc) = config_io::read_config(data_dir)?;
            if config.categories.labels.contains(label) {
                println!("{} already exists", label);
                return Ok(());
            }
            config_io::add_category(&mut doc, label);
            config_io::write_config(data_dir, &doc)?;
            println!("added {}", label);
        }
        Some(CategoryAction::Default { label }) => {
            let label = label.trim();
            let _lock = DataLock::acquire(data_dir, DEFAULT_LOCK_TIMEOUT)?;
            let (config, mut doc) = config_io::read_config(data_dir)?;
            if !config.categories.labels.contains(label) {
                return Err(format!(
                    "unknown category '{}' (add it with `tick categories add`)",
                    label
                )
                .into());
            }
            config_io::set_default_category(&mut doc, label);
            config_io::write_config(data_dir, &doc)?;
            println!("default category is now {}", label);
        }
    }
    Ok(())
}

fn cmd_recovery(data_dir: &Path, args: RecoveryArgs, json: bool) -> CliResult {
    let entries = recovery::read_recovery_entries(data_dir, Some(args.limit));
    if json {
        let out: Vec<RecoveryEntryJson> = entries.iter().map(recovery_entry_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("recovery log is empty");
        return Ok(());
    }
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            println!();
        }
        for line in format_recovery_entry(entry) {
            println!("{}", line);
        }
    }
    Ok(())
}
