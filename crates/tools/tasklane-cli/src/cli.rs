use clap::{Parser, Subcommand, value_parser};
use std::path::PathBuf;
use tasklane_types::{SortBy, TaskId, TaskStatus};

/// Manage your tasklane tasks from the terminal
#[derive(Parser, Debug)]
#[command(name = "tasklane")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Server URL (overrides the config file)
    #[arg(short, long, env = "TASKLANE_SERVER", global = true)]
    pub server: Option<String>,

    /// Path to the config file
    #[arg(short, long, value_name = "FILE", env = "TASKLANE_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

/// Editable task fields; anything left out is prompted for or kept.
#[derive(clap::Args, Debug, Default, Clone, PartialEq)]
pub struct TaskFields {
    #[arg(short, long)]
    pub title: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    /// waiting, in-progress or completed
    #[arg(long)]
    pub status: Option<TaskStatus>,

    /// 0 to 10
    #[arg(short, long, value_parser = value_parser!(u8).range(0..=10))]
    pub priority: Option<u8>,
}

impl TaskFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new account
    Register {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Sign in and remember the session
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List tasks
    List {
        /// title, status, created_at or priority
        #[arg(long)]
        sort: Option<SortBy>,

        #[arg(short = 'q', long)]
        search: Option<String>,

        /// Show at most this many tasks (0 shows all)
        #[arg(long, value_parser = value_parser!(u32).range(0..=20))]
        top: Option<u32>,
    },
    /// Create a task
    Create {
        #[command(flatten)]
        fields: TaskFields,
    },
    /// Edit a task
    Edit {
        id: TaskId,

        #[command(flatten)]
        fields: TaskFields,
    },
    /// Delete a task
    Delete {
        id: TaskId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}
