//! revu: streaming AI code review service and terminal client.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use revu::client;
use revu::config;
use revu::constants;
use revu::credentials;
use revu::env;
use revu::github;
use revu::intake;
use revu::providers;
use revu::server;
use revu::session;

use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::ChatCommand;
use cli::args::{Cli, Command, CredentialsAction, ModelsArgs, ReviewArgs, ServeArgs};
use client::{ClientEvent, ReviewClient, ReviewDraft};
use config::Config;
use credentials::CredentialStore;
use env::Env;
use github::{GitHubClient, PrFetcher};
use intake::FileIntake;
use providers::HttpChatProvider;
use session::ChatSession;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{} {err:#}", "Error:".red().bold());
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level, cli.json_logs);

    match cli.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Review(args) => run_review(*args).await,
        Command::Credentials { action } => run_credentials(action),
        Command::Models(args) => run_models(args).await,
        Command::Version => run_version(),
    }
}

/// `RUST_LOG` wins over `--log-level`.
fn setup_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config() -> Result<Config> {
    let cwd = std::env::current_dir().context("failed to determine working directory")?;
    Config::load(Some(&cwd), &Env::real()).context("failed to load configuration")
}

/// Print detailed version and build information.
fn run_version() -> Result<()> {
    println!(
        "{} {}",
        constants::APP_NAME.bold(),
        constants::VERSION.green().bold()
    );
    println!("{}     {}", "target:".dimmed(), constants::TARGET);
    Ok(())
}

/// Run the HTTP service until Ctrl+C / SIGTERM.
async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut config = load_config()?;
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }
    if let Some(name) = args.provider {
        if name != config.provider.name {
            config.provider.model = None;
        }
        config.provider.name = name;
    }
    if let Some(model) = args.model {
        config.provider.model = Some(model);
    }
    if let Some(base_url) = args.base_url {
        config.provider.base_url = Some(base_url);
    }
    if let Some(secs) = args.timeout {
        if secs == 0 {
            bail!("--timeout must be at least 1 second");
        }
        config.server.request_timeout_secs = secs;
    }

    let provider = HttpChatProvider::from_config(&config.provider)
        .context("failed to configure LLM provider")?;

    eprintln!(
        "{} {} on {} ({} / {})",
        constants::APP_NAME.bold(),
        constants::VERSION.dimmed(),
        config.server.listen.cyan(),
        config.provider.name,
        config.provider.model(),
    );
    if config.provider.api_key.is_none() {
        eprintln!(
            "  {} no server API key ({} or {}); requests must carry their own.",
            "note:".yellow(),
            constants::ENV_API_KEY,
            config.provider.name.api_key_env_var(),
        );
    }

    server::serve(&config, Arc::new(provider), server::shutdown_signal())
        .await
        .with_context(|| format!("server on {} failed", config.server.listen))
}

/// Everything one terminal review conversation holds.
struct ReviewChat {
    client: ReviewClient,
    session: ChatSession,
    intake: FileIntake,
    fetcher: PrFetcher,
    model: Option<String>,
    api_key: Option<String>,
    repo_token: Option<String>,
}

impl ReviewChat {
    /// Send one turn and stream the answer to stdout.
    async fn turn(&mut self, text: &str) -> Result<()> {
        let pr = match self.fetcher.fetch(self.repo_token.as_deref()).await {
            Ok(pr) => pr,
            Err(e) => {
                eprintln!("{} {e}", "✗".red().bold());
                return Ok(());
            }
        };

        let draft = ReviewDraft {
            text,
            files: self.intake.submitted(),
            pr: pr.as_ref(),
            model: self.model.clone(),
            api_key: self.api_key.clone(),
        };
        let request = match client::build_request(&mut self.session, draft) {
            Ok(Some(request)) => request,
            Ok(None) => return Ok(()),
            Err(e) => {
                eprintln!("{} {e}", "✗".yellow().bold());
                return Ok(());
            }
        };

        eprintln!("{}", "reviewing…".dimmed());
        match self.client.stream_review(&request).await {
            Err(e) => self.session.fail(e.to_string()),
            Ok(mut events) => {
                self.session.begin_stream();
                let mut stdout = std::io::stdout();
                while let Some(event) = events.next().await {
                    match event {
                        ClientEvent::Delta(text) => {
                            self.session.push_chunk(&text);
                            print!("{text}");
                            let _ = stdout.flush();
                        }
                        ClientEvent::Failed(message) => self.session.fail(message),
                        ClientEvent::Done => self.session.complete(),
                    }
                }
                println!();
            }
        }

        if let Some(error) = self.session.take_error() {
            eprintln!("{} {error}", "✗".red().bold());
        }
        Ok(())
    }

    async fn add_paths(&mut self, paths: &[PathBuf]) {
        let report = self.intake.add_paths(paths).await;
        cli::print_intake_report(&report);
    }

    fn list_files(&self) {
        if self.intake.is_empty() {
            eprintln!("  {}", "no files".dimmed());
        }
        for file in self.intake.files() {
            eprintln!(
                "  {}  {}  {}",
                file.name.bold(),
                file.language.cyan(),
                intake::human_size(file.size()).dimmed()
            );
        }
    }
}

/// Review files and/or a PR through the service.
async fn run_review(args: ReviewArgs) -> Result<()> {
    let config = load_config()?;
    let stored = match CredentialStore::open_default() {
        Ok(store) => store.get(),
        Err(e) => {
            tracing::warn!(error = %e, "credential store unavailable");
            credentials::Credentials::default()
        }
    };

    let mut chat = ReviewChat {
        client: ReviewClient::new(&args.server),
        session: ChatSession::new(),
        intake: FileIntake::new(config.upload),
        fetcher: PrFetcher::new(GitHubClient::new(&config.github.api_url)),
        model: args.model,
        api_key: stored.provider_key,
        repo_token: stored.repo_token.or(config.github.token),
    };

    if !args.files.is_empty() {
        chat.add_paths(&args.files).await;
    }
    if let Some(ref url) = args.pr {
        chat.fetcher.set_url(url);
    }

    chat.turn(args.message.as_deref().unwrap_or_default()).await?;
    if !args.interactive {
        return Ok(());
    }

    eprintln!("{}", "Ask a follow-up, or /help for commands.".dimmed());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("{} ", ">".cyan().bold());
        let _ = std::io::stderr().flush();
        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        match ChatCommand::parse(&line) {
            ChatCommand::Quit => break,
            ChatCommand::Help => eprintln!("{}", cli::INTERACTIVE_HELP),
            ChatCommand::Files => chat.list_files(),
            ChatCommand::Pr(url) => {
                chat.fetcher.set_url(&url);
                match chat.fetcher.url() {
                    Some(url) => eprintln!("  {} {url}", "pr:".cyan()),
                    None => eprintln!("  {}", "pull request cleared".dimmed()),
                }
            }
            ChatCommand::File(path) if path.is_empty() => eprintln!("usage: /file <path>"),
            ChatCommand::File(path) => chat.add_paths(&[PathBuf::from(path)]).await,
            ChatCommand::Drop(name) => match chat.intake.remove(&name) {
                Some(_) => eprintln!("  {} {name}", "-".yellow().bold()),
                None => eprintln!("  {} no file named {name}", "✗".red().bold()),
            },
            ChatCommand::Say(text) if text.is_empty() => {}
            ChatCommand::Say(text) => chat.turn(&text).await?,
        }
    }
    Ok(())
}

fn run_credentials(action: CredentialsAction) -> Result<()> {
    let store = CredentialStore::open_default().context("failed to open credential store")?;

    match action {
        CredentialsAction::Set {
            provider_key,
            github_token,
        } => {
            if provider_key.is_none() && github_token.is_none() {
                bail!("nothing to set: pass --provider-key and/or --github-token");
            }
            if let Some(key) = provider_key {
                store.set_provider_key(Some(&key))?;
            }
            if let Some(token) = github_token {
                store.set_repo_token(Some(&token))?;
            }
            eprintln!("{} {}", "saved".green().bold(), store.path().display());
        }
        CredentialsAction::Show => {
            let creds = store.get();
            let show = |value: Option<&String>| match value {
                Some(v) => cli::mask_secret(v),
                None => "not set".dimmed().to_string(),
            };
            println!("{}  {}", "provider key:".cyan(), show(creds.provider_key.as_ref()));
            println!("{}  {}", "github token:".cyan(), show(creds.repo_token.as_ref()));
        }
        CredentialsAction::Clear => {
            store.clear()?;
            eprintln!("{}", "credentials cleared".green());
        }
        CredentialsAction::Path => println!("{}", store.path().display()),
    }
    Ok(())
}

async fn run_models(args: ModelsArgs) -> Result<()> {
    if let Some(server) = args.server {
        let listing = ReviewClient::new(server)
            .models()
            .await
            .context("failed to list models")?;
        println!("{} {}", "provider:".dimmed(), listing.provider.bold());
        for model in listing.models {
            let marker = if model.id == listing.default_model { "*" } else { " " };
            println!("  {marker} {}  {}", model.id.bold(), model.name.dimmed());
        }
        return Ok(());
    }

    let config = load_config()?;
    let provider = &config.provider;
    println!("{} {}", "provider:".dimmed(), provider.name.to_string().bold());
    for model in provider.name.catalog() {
        let marker = if model.id == provider.model() { "*" } else { " " };
        println!("  {marker} {}  {}", model.id.bold(), model.name.dimmed());
    }
    Ok(())
}
