pub mod auth;
pub mod nodes;
pub mod scenarios;
pub mod schema;
pub mod services;
pub mod tui;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::api::HttpApi;
use crate::config::Config;
use crate::forms::FieldErrors;
use crate::session::Session;

#[derive(Parser)]
#[command(name = "planctl")]
#[command(
    author,
    version,
    about = "Admin client for plan scenarios, services and the plan-node tree"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Connection options shared by every command
#[derive(Args, Clone, Debug)]
pub struct GlobalArgs {
    /// Path to config file
    #[arg(short, long, global = true, default_value = "planctl.yaml")]
    pub config: PathBuf,

    /// Override the API base URL
    #[arg(long, global = true, env = "PLANCTL_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token to use instead of the saved session
    #[arg(long, global = true, env = "PLANCTL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and save the session
    Login(LoginArgs),

    /// Forget the saved session
    Logout,

    /// Show the signed-in user
    Me,

    /// Browse and change plan nodes
    Nodes {
        #[command(subcommand)]
        command: NodesCommand,
    },

    /// Manage planning scenarios
    Scenarios {
        #[command(subcommand)]
        command: ScenariosCommand,
    },

    /// Manage services
    Services {
        #[command(subcommand)]
        command: ServicesCommand,
    },

    /// Launch the interactive terminal UI
    Tui(TuiArgs),

    /// Print JSON Schema for config validation
    Schema,
}

#[derive(Parser, Clone)]
pub struct LoginArgs {
    /// Account email (prompted when omitted)
    #[arg(long)]
    pub email: Option<String>,

    /// Account password (read from stdin when omitted)
    #[arg(long, env = "PLANCTL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Subcommand, Clone)]
pub enum NodesCommand {
    /// Print the plan-node tree of a scenario
    Tree {
        /// Scenario to show (default: current scenario)
        #[arg(long)]
        scenario: Option<String>,

        /// Print the nested tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a plan node in the current scenario
    Create(NodeFormArgs),

    /// Edit a plan node
    Edit {
        /// Node id
        id: String,

        /// Scenario the node belongs to (default: current scenario)
        #[arg(long)]
        scenario: Option<String>,

        #[command(flatten)]
        form: NodeFormArgs,
    },

    /// Delete a plan node
    Delete {
        /// Node id
        id: String,

        /// Scenario the node belongs to (default: current scenario)
        #[arg(long)]
        scenario: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args, Clone, Default)]
pub struct NodeFormArgs {
    /// Node title
    #[arg(long)]
    pub title: Option<String>,

    /// Node type (initiative, project, sub-project, job, adjustment-buffer)
    #[arg(long = "type")]
    pub node_type: Option<String>,

    /// Parent node id (create only)
    #[arg(long)]
    pub parent: Option<String>,

    /// Free-text description
    #[arg(long)]
    pub description: Option<String>,

    /// Position among siblings
    #[arg(long)]
    pub order: Option<String>,
}

#[derive(Subcommand, Clone)]
pub enum ScenariosCommand {
    /// List all scenarios
    List,

    /// Show the current scenario
    Current,

    /// Create a scenario
    Create(ScenarioFormArgs),

    /// Change a scenario's name, description or dates
    Update {
        /// Scenario id
        id: String,

        #[command(flatten)]
        form: ScenarioFormArgs,
    },

    /// Make a scenario the current one
    Activate {
        /// Scenario id
        id: String,
    },

    /// Delete a scenario
    Delete {
        /// Scenario id
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Copy a scenario into next year's plan
    Rollover {
        /// Source scenario id
        id: String,

        #[command(flatten)]
        form: ScenarioFormArgs,
    },
}

#[derive(Args, Clone, Default)]
pub struct ScenarioFormArgs {
    /// Scenario name
    #[arg(long)]
    pub name: Option<String>,

    /// Free-text description
    #[arg(long)]
    pub description: Option<String>,

    /// First day (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,

    /// Last day (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,
}

#[derive(Subcommand, Clone)]
pub enum ServicesCommand {
    /// List all services
    List,

    /// Create a service
    Create {
        /// Service name
        #[arg(long)]
        name: String,

        /// URL-safe identifier (lower-case, digits, hyphens)
        #[arg(long)]
        slug: String,

        /// Position in lists
        #[arg(long, default_value = "0")]
        order: String,
    },
}

#[derive(Parser, Clone)]
pub struct TuiArgs {
    /// Start in the explorer instead of the dashboard
    #[arg(long)]
    pub explorer: bool,
}

/// Load config and apply command-line overrides
pub fn load_config(global: &GlobalArgs) -> anyhow::Result<Config> {
    let mut config = Config::load_or_default(&global.config)?;
    if let Some(url) = &global.api_url {
        config.api.base_url = url.clone();
    }
    config.validate()?;
    Ok(config)
}

/// API client authenticated from `--token` or the saved session
pub fn connect(config: &Config, global: &GlobalArgs) -> anyhow::Result<HttpApi> {
    let token = match &global.token {
        Some(token) => Some(token.clone()),
        None => Session::load(&config.session_file)
            .with_context(|| {
                format!("Failed to read session {}", config.session_file.display())
            })?
            .map(|session| session.access_token),
    };
    Ok(HttpApi::new(&config.api, token)?)
}

/// Turn field errors into a command failure listing each field
pub fn invalid_input(errors: FieldErrors) -> anyhow::Error {
    anyhow::anyhow!("Invalid input: {}", errors)
}

/// Ask a yes/no question on stdin; anything but y/yes is no
pub fn confirm(question: &str) -> anyhow::Result<bool> {
    let answer = prompt(&format!("{} [y/N]", question))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

pub fn prompt(label: &str) -> anyhow::Result<String> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{}: ", label)?;
    stdout.flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
