use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "groupwork")]
#[command(about = "Track group project tasks and notifications from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// CLI profile name
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Work with a group's tasks
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Read and manage your notifications
    #[command(alias = "inbox")]
    Notifications {
        #[command(subcommand)]
        command: NotificationCommands,
    },
    /// Inspect your groups
    Groups {
        #[command(subcommand)]
        command: GroupCommands,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Sign in to the backend
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// List a group's tasks
    List {
        /// Group ID
        group: String,
        /// Only show tasks with this status (todo, in-progress, done)
        #[arg(long, value_name = "STATUS")]
        status: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one task
    Show {
        /// Task ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a task
    #[command(alias = "add")]
    Create {
        /// Group ID
        group: String,
        /// Task title
        title: Vec<String>,
        /// Task description
        #[arg(short, long)]
        description: Option<String>,
        /// Initial status
        #[arg(long, value_name = "STATUS")]
        status: Option<String>,
        /// Assignee user ID
        #[arg(long, value_name = "USER")]
        assignee: Option<String>,
        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_name = "DATE")]
        due: Option<String>,
    },
    /// Move a task to another column
    Move {
        /// Group ID
        group: String,
        /// Task ID
        id: String,
        /// Target status (todo, in-progress, done)
        status: String,
    },
    /// Print the group's board
    Board {
        /// Group ID
        group: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum NotificationCommands {
    /// List notifications, unread first
    List {
        /// Only show unread notifications
        #[arg(long)]
        unread: bool,
        /// Number of notifications to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark one notification as read
    Read {
        /// Notification ID
        id: String,
    },
    /// Mark every notification as read
    ReadAll,
    /// Delete a notification
    Delete {
        /// Notification ID
        id: String,
    },
    /// Keep polling and print new notifications until interrupted
    Watch {
        /// Poll interval in seconds (profile setting when omitted)
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
    },
}

#[derive(Subcommand)]
pub enum GroupCommands {
    /// List your groups
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show contribution analytics for a group
    Contributions {
        /// Group ID
        group: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Backend base URL
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Notification poll interval in seconds
        #[arg(long, value_name = "SECS")]
        poll_interval: Option<u64>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Show the effective configuration
    Show {
        /// Profile name to show
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in with email and password and store the session in the keychain
    Login {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Show auth status for profile
    Status {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
    /// Sign out and clear the stored session
    Logout {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}
