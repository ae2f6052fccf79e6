//! Campus Console - command-line front end
//!
//! Every invocation recovers the persisted session first, so `login` in one
//! run is visible to `dashboard` in the next.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use campus_core::{Config, Console, Navigator};

#[derive(Parser)]
#[command(name = "campus")]
#[command(about = "Command-line client for the Campus administration API")]
#[command(version)]
struct Cli {
    /// Base URL of the platform API, including `/api`
    #[arg(long, env = "CAMPUS_API_URL")]
    api_url: Option<String>,

    /// Directory holding the persisted session
    #[arg(long, env = "CAMPUS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and persist the session
    Login {
        #[arg(long, short)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// End the session
    Logout,
    /// Show who is signed in and until when
    Status,
    /// Renew the token now
    Refresh,
    /// Reload the signed-in user's profile
    Profile,
    /// Show where a page would take the current user
    Route {
        /// Page path, e.g. `/dashboard`
        path: String,
    },
    /// Dashboard statistics
    Dashboard {
        /// One of overview, schools, users, academic, activities, system-health
        #[arg(long)]
        section: Option<String>,
        /// Status of one database table
        #[arg(long, conflicts_with = "section")]
        table: Option<String>,
    },
    /// School management
    Schools {
        #[command(subcommand)]
        command: commands::SchoolCommand,
    },
}

/// Terminal stand-in for a page navigation
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, path: &str) {
        tracing::info!(path = %path, "Navigation requested");
        eprintln!("Session ended. Sign in again with `campus login`.");
    }
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = match &self.data_dir {
            Some(dir) => Config::new(dir.clone()),
            None => Config::default(),
        };
        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    campus_core::init_logging();

    let cli = Cli::parse();
    let config = cli.config();
    tracing::debug!(api_url = %config.api_url, database = %config.database_path.display(), "Starting");

    let console = Console::new(config, Arc::new(TerminalNavigator))?;
    console.initialize().await?;

    match cli.command {
        Commands::Login { email, password } => commands::login(&console, &email, password).await,
        Commands::Logout => commands::logout(&console).await,
        Commands::Status => commands::status(&console),
        Commands::Refresh => commands::refresh(&console).await,
        Commands::Profile => commands::profile(&console).await,
        Commands::Route { path } => commands::route(&console, &path),
        Commands::Dashboard { section, table } => {
            commands::dashboard(&console, section.as_deref(), table.as_deref()).await
        }
        Commands::Schools { command } => commands::schools(&console, command).await,
    }
}
