//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod ask;
pub mod health;
pub mod key;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::api::HttpBackend;
use crate::cli::ask::run_ask;
use crate::cli::health::run_health;
use crate::cli::key::{run_key, KeyCommand};
use crate::core::config::{Config, SETTING_KEYS};
use crate::core::credentials::SettingsStore;
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::{init_file_logging, init_stderr_logging};
use crate::utils::url::normalize_base_url;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_DESCRIBE"),
    ", built ",
    env!("VERGEN_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "medassist", version, long_version = LONG_VERSION)]
#[command(about = "Ask the HemaV MedAssist service medical questions from your terminal")]
#[command(
    long_about = "MedAssist is a full-screen terminal client for the HemaV MedAssist \
question-answering service. Answers are grounded in retrieved documents, and each \
answer lists the passages it drew on.\n\n\
API key:\n\
  Use 'medassist key set' or Ctrl+S in the chat to store an optional API key in your \
system keyring. Without one the server falls back to its own key.\n\n\
Controls:\n\
  Enter             Send the question\n\
  Shift+Enter       Insert a newline\n\
  Ctrl+N            Start a new chat\n\
  Ctrl+S            Open settings\n\
  Ctrl+B            Toggle the sidebar\n\
  F1/F2             Chat / About\n\
  Alt+1..3          Ask a suggested question\n\
  Ctrl+O            Show or hide sources of the focused answer\n\
  Ctrl+Up/Down      Move the sources focus\n\
  PgUp/PgDn/Mouse   Scroll the transcript\n\
  Ctrl+C            Quit\n\n\
Logging:\n\
  MEDASSIST_LOG     tracing filter directives (e.g. medassist=debug)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Backend base URL for this run (overrides server-url from the config file)
    #[arg(short = 's', long, global = true, value_name = "URL")]
    pub server: Option<String>,

    /// Write diagnostic logs to this file
    #[arg(short = 'l', long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Keep the API key in memory only instead of the system keyring
    #[arg(long, global = true)]
    pub no_keyring: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Ask one question and print the answer with its sources
    Ask {
        #[arg(required = true, trailing_var_arg = true)]
        question: Vec<String>,
        /// Print the transcript as HTML instead of plain text
        #[arg(long)]
        html: bool,
    },
    /// Check whether the server and its vector index are reachable
    Health,
    /// Manage the stored API key
    Key {
        #[command(subcommand)]
        command: KeyCommand,
    },
    /// Set a configuration value, or show all values when none is given
    Set {
        /// One of: server-url, request-timeout
        key: Option<String>,
        value: Option<String>,
    },
    /// Reset a configuration value to its default
    Unset { key: String },
}

impl Args {
    fn settings_store(&self) -> SettingsStore {
        if self.no_keyring {
            SettingsStore::in_memory()
        } else {
            SettingsStore::keyring()
        }
    }

    fn server_url(&self, config: &Config) -> String {
        let url = self
            .server
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| config.effective_server_url());
        normalize_base_url(url)
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let command = args.command.clone().unwrap_or(Commands::Chat);

    match args.log_file.as_deref() {
        Some(path) => init_file_logging(path)?,
        None if command != Commands::Chat => init_stderr_logging()?,
        None => {}
    }

    match command {
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            match (key, value) {
                (Some(key), Some(value)) => {
                    config.set_value(&key, &value)?;
                    config.save()?;
                    println!("✅ Set {key} to: {}", value.trim());
                }
                (Some(key), None) => {
                    eprintln!("⚠️  Missing value for {key}");
                    eprintln!("Example: medassist set server-url http://localhost:5000");
                    std::process::exit(1);
                }
                (None, _) => {
                    config.print_all();
                    println!("Settable keys: {}", SETTING_KEYS.join(", "));
                }
            }
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            config.unset_value(&key)?;
            config.save()?;
            println!("✅ Unset {key}");
            Ok(())
        }
        Commands::Key { command } => run_key(command, &args.settings_store()),
        Commands::Health => {
            let config = Config::load()?;
            let server_url = args.server_url(&config);
            let backend = HttpBackend::new(&server_url, config.request_timeout())?;
            run_health(&backend, &server_url).await
        }
        Commands::Ask { question, html } => {
            let config = Config::load()?;
            let backend = HttpBackend::new(&args.server_url(&config), config.request_timeout())?;
            run_ask(question, html, &backend, &args.settings_store()).await
        }
        Commands::Chat => {
            let config = Config::load()?;
            let server_url = args.server_url(&config);
            let backend = HttpBackend::new(&server_url, config.request_timeout())?;
            run_chat(Arc::new(backend), args.settings_store(), server_url).await
        }
    }
}
