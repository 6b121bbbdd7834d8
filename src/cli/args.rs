//! Clap argument types.

use clap::Parser;
use std::path::PathBuf;

use revu::models::ProviderName;

/// Streaming AI code review: serve the review endpoint or chat with it.
#[derive(Parser, Debug)]
#[command(name = "revu", version = revu::constants::VERSION)]
pub struct Cli {
    /// Log level filter (overridden by RUST_LOG).
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Run the review HTTP service.
    Serve(ServeArgs),

    /// Review files and/or a pull request through a running service.
    Review(Box<ReviewArgs>),

    /// Manage the locally stored provider key and GitHub token.
    Credentials {
        #[command(subcommand)]
        action: CredentialsAction,
    },

    /// List the models the provider offers.
    Models(ModelsArgs),

    /// Print version and build information.
    Version,
}

/// Arguments for the `serve` subcommand.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to listen on (e.g. 127.0.0.1:3000).
    #[arg(long)]
    pub listen: Option<String>,

    /// LLM provider: gemini, openai, openai-compatible, anthropic.
    #[arg(long)]
    pub provider: Option<ProviderName>,

    /// Default model when requests don't name one.
    #[arg(long)]
    pub model: Option<String>,

    /// Custom provider base URL.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Per-request deadline in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Arguments for the `review` subcommand.
#[derive(Parser, Debug)]
pub struct ReviewArgs {
    /// File or directory to review (repeatable).
    #[arg(short, long = "file")]
    pub files: Vec<PathBuf>,

    /// GitHub pull request URL.
    #[arg(long)]
    pub pr: Option<String>,

    /// Message to send with the files or PR.
    #[arg(short, long)]
    pub message: Option<String>,

    /// Model to request.
    #[arg(long)]
    pub model: Option<String>,

    /// Review service URL.
    #[arg(long, env = revu::constants::ENV_SERVER, default_value = revu::constants::DEFAULT_SERVER_URL)]
    pub server: String,

    /// Keep the conversation open for follow-up questions.
    #[arg(short, long, default_value_t = false)]
    pub interactive: bool,
}

/// Credential management subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum CredentialsAction {
    /// Store the provider API key and/or GitHub token. An empty value removes it.
    Set {
        /// LLM provider API key.
        #[arg(long)]
        provider_key: Option<String>,

        /// GitHub personal access token.
        #[arg(long)]
        github_token: Option<String>,
    },
    /// Show which credentials are stored (masked).
    Show,
    /// Remove all stored credentials.
    Clear,
    /// Print the credentials file path.
    Path,
}

/// Arguments for the `models` subcommand.
#[derive(Parser, Debug)]
pub struct ModelsArgs {
    /// Ask a running service instead of the local config.
    #[arg(long)]
    pub server: Option<String>,
}
