use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use taskdash_core::{AppError, Config, ConfigError};
use taskdash_services::{TaskClient, TaskId};
use taskdash_ui::{
    ChannelNotifier, LogNotifier, Notification, Notifier, Outcome, SyncOptions,
    TaskListSynchronizer,
};

#[derive(Parser)]
#[command(name = "taskdash")]
#[command(about = "Manage your dashboard to-do list from the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Dashboard base URL, overriding the config file
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Cookie header carrying the session and CSRF cookies
    #[arg(long, global = true, value_name = "COOKIE")]
    cookie: Option<String>,

    /// Send notifications to the log instead of stderr
    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the to-do list
    List,
    /// Add a task
    Add {
        /// Task text
        text: Vec<String>,
    },
    /// Mark a task done or not done
    Toggle {
        id: String,
    },
    /// Delete a task
    #[command(alias = "rm")]
    Delete {
        id: String,
    },
}

/// Load the config file and apply command line overrides. Validation happens
/// once logging is up.
fn load_config(cli: &Cli) -> Result<Config, AppError> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .map_err(|e| ConfigError::ParseError(format!("{:#}", e)))?;

    if let Some(base_url) = &cli.base_url {
        config.service.base_url.clone_from(base_url);
    }
    if let Some(cookie) = &cli.cookie {
        config.service.override_cookie(cookie.as_str());
    }

    Ok(config)
}

fn print_notifications(rx: Option<&Receiver<Notification>>) {
    for notification in rx.into_iter().flat_map(Receiver::try_iter) {
        eprintln!("{}", notification);
    }
}

async fn run(command: Commands, config: Config, quiet: bool) -> Result<Outcome, AppError> {
    let client = TaskClient::from_config(&config.service).context("Failed to build task client")?;
    let (notifier, rx): (Arc<dyn Notifier>, _) = if quiet {
        (Arc::new(LogNotifier), None)
    } else {
        let (notifier, rx) = ChannelNotifier::new();
        (Arc::new(notifier), Some(rx))
    };
    let sync = TaskListSynchronizer::new(Arc::new(client), notifier, SyncOptions::from(&config.ui));
    let rx = rx.as_ref();

    let mut outcome = sync.load().await;
    print_notifications(rx);

    if outcome == Outcome::Applied {
        outcome = match command {
            Commands::List => Outcome::Applied,
            Commands::Add { text } => sync.add(&text.join(" ")).await,
            Commands::Toggle { id } => sync.toggle(&TaskId::new(id)).await,
            Commands::Delete { id } => sync.delete(&TaskId::new(id)).await,
        };
        print_notifications(rx);
    }

    for line in sync.lines() {
        println!("{}", line);
    }

    Ok(outcome)
}

fn report(err: &AppError) -> ExitCode {
    tracing::error!("{}", err);
    eprintln!("{}", err.user_message());
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let loaded = load_config(&cli);

    let log_filter = loaded
        .as_ref()
        .map_or("info", |config| config.logging.filter.as_str());
    if let Err(e) = taskdash_core::init(log_filter) {
        eprintln!("{:#}", e);
    }

    let config = match loaded.and_then(|config| config.validated().map_err(AppError::from)) {
        Ok(config) => config,
        Err(e) => return report(&e),
    };

    match run(cli.command.unwrap_or(Commands::List), config, cli.quiet).await {
        Ok(Outcome::Applied) => ExitCode::SUCCESS,
        Ok(Outcome::Rejected) => {
            eprintln!("Task text cannot be empty.");
            ExitCode::from(2)
        }
        Ok(Outcome::Missing) => {
            eprintln!("No task with that id.");
            ExitCode::from(2)
        }
        Ok(Outcome::Busy | Outcome::Failed) => ExitCode::FAILURE,
        Err(e) => report(&e),
    }
}
