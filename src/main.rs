use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use taskboard::config::{CliOverrides, ClientConfig};
use taskboard::logging::init_logging;

mod cmd;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(version, about = "Task board client: projects, kanban boards and team roster")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Base URL of the task board API. Overrides taskboard.toml and TASKBOARD_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Where the session token is stored
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session token
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account and log in
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session token
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List the team roster
    Users {
        /// Include suspended users
        #[arg(long)]
        all: bool,
    },
    /// List projects
    Projects,
    /// Create a project
    CreateProject {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        /// User id to add as a member (repeatable)
        #[arg(short, long = "member")]
        members: Vec<String>,
        /// Image file to upload with the project
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Show a project's kanban board
    Board { project_id: String },
    /// Show task statistics for one project or across all projects
    Stats { project_id: Option<String> },
    /// Show configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print the path of the config file
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let config = ClientConfig::load(
        &project_dir,
        CliOverrides {
            api_url: cli.api_url.clone(),
            session_file: cli.session_file.clone(),
            verbose: cli.verbose,
            json_logs: cli.json_logs,
        },
    )
    .context("Failed to load configuration")?;
    let _log_guard = init_logging(&config);

    match &cli.command {
        Commands::Login { email, password } => {
            cmd::cmd_login(&config, email, password.as_deref()).await?
        }
        Commands::Signup {
            name,
            email,
            password,
        } => cmd::cmd_signup(&config, name, email, password.as_deref()).await?,
        Commands::Logout => cmd::cmd_logout(&config)?,
        Commands::Whoami => cmd::cmd_whoami(&config).await?,
        Commands::Users { all } => cmd::cmd_users(&config, *all).await?,
        Commands::Projects => cmd::cmd_projects(&config).await?,
        Commands::CreateProject {
            name,
            description,
            members,
            image,
        } => {
            cmd::cmd_create_project(
                &config,
                name,
                description.as_deref(),
                members,
                image.as_deref(),
            )
            .await?
        }
        Commands::Board { project_id } => cmd::cmd_board(&config, project_id).await?,
        Commands::Stats { project_id } => cmd::cmd_stats(&config, project_id.as_deref()).await?,
        Commands::Config { command } => cmd::cmd_config(&project_dir, &config, command.clone())?,
    }

    Ok(())
}
