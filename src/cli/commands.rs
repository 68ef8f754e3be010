use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tick", about = concat!("[x] ticklist v", env!("CARGO_PKG_VERSION"), " - todos that stay on your machine"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config.toml into the data directory
    Init(InitArgs),
    /// Add a todo at the top of the list
    Add(AddArgs),
    /// List todos
    List(ListArgs),
    /// Flip a todo between active and completed
    Toggle(ToggleArgs),
    /// Change a todo's text and optionally its category
    Edit(EditArgs),
    /// Delete a todo
    Rm(RmArgs),
    /// Remove all completed todos
    Clear(ClearArgs),
    /// Show progress: last 7 days, completion by category, this month
    Stats(StatsArgs),
    /// List categories, or add one / change the default
    Categories(CategoriesCmd),
    /// Show data that could not be loaded or saved
    Recovery(RecoveryArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config.toml
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Todo commands
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Todo text
    pub text: String,
    /// Category label (default: categories.default from config)
    #[arg(short, long)]
    pub category: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Filter by status (all, active, completed)
    #[arg(long, default_value = "all")]
    pub status: String,
    /// Filter by category ("All" for every category)
    #[arg(short, long, default_value = "All")]
    pub category: String,
}

#[derive(Args)]
pub struct ToggleArgs {
    /// Todo ID
    pub id: String,
}

#[derive(Args)]
pub struct EditArgs {
    /// Todo ID
    pub id: String,
    /// New text
    pub text: String,
    /// New category label
    #[arg(short, long)]
    pub category: Option<String>,
}

#[derive(Args)]
pub struct RmArgs {
    /// Todo ID
    pub id: String,
    /// Skip confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

#[derive(Args)]
pub struct ClearArgs {
    /// Skip confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct StatsArgs {
    /// Reference date as YYYY-MM-DD (default: today)
    #[arg(long)]
    pub date: Option<String>,
    /// Use the last 7 calendar days even across a month boundary
    #[arg(long)]
    pub rolling: bool,
}

#[derive(Args)]
pub struct CategoriesCmd {
    #[command(subcommand)]
    pub action: Option<CategoryAction>,
}

#[derive(Subcommand)]
pub enum CategoryAction {
    /// Add a category label
    Add {
        /// Label to add
        label: String,
    },
    /// Set the category used when none is given
    Default {
        /// Label to use
        label: String,
    },
}

#[derive(Args)]
pub struct RecoveryArgs {
    /// Maximum number of entries to show
    #[arg(long, default_value = "10")]
    pub limit: usize,
}
