//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod say;
pub mod settings;

use std::error::Error;
use std::io::IsTerminal;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::cli::say::run_say;
use crate::cli::settings::{run_set, run_unset, show_settings};
use crate::core::completion::GeminiClient;
use crate::core::config::{Config, ConfigStore};
use crate::core::constants::API_KEY_SECRET;
use crate::core::secrets::{KeyringSecretStore, MemorySecretStore, SecretStore};
use crate::core::session::{ConversationSession, SendPolicy};
use crate::logging::init_tracing;
use crate::ui::chat::{run_chat, ChatContext};
use crate::ui::home::print_home;
use crate::ui::palette::Palette;

/// Read by `--no-keyring` to seed the in-memory credential store.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Parser)]
#[command(name = "mindchat")]
#[command(about = "A terminal chat front-end for Google's Gemini API")]
#[command(
    long_about = "mindchat lets you chat with Google's Gemini models from the terminal. \
Your API key is kept in the system keyring and your theme preference in a small \
config file.\n\n\
Getting started:\n\
  mindchat set api-key <key>   Store your Gemini API key\n\
  mindchat chat                Start chatting\n\n\
Environment Variables:\n\
  GEMINI_API_KEY    API key used with --no-keyring\n\
  MINDCHAT_CONFIG   Path of the config file (optional)\n\
  RUST_LOG          Diagnostic log filter, e.g. mindchat=debug"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Keep the API key in memory only (seeded from GEMINI_API_KEY)
    #[arg(long, global = true)]
    pub no_keyring: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat screen (default)
    Chat,
    /// Show the welcome screen
    Home,
    /// Send one message and print the reply
    Say {
        /// Prompt text; multiple words are joined with spaces
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Set a value: api-key, theme, model, base-url
    Set {
        /// Setting to change
        key: String,
        /// New value
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Clear a value: api-key, theme, model, base-url
    Unset {
        /// Setting to clear
        key: String,
    },
    /// Print the current settings
    Settings,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let secrets = open_secret_store(args.no_keyring)?;
    let config_store = ConfigStore::open_default()?;

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let config = config_store.load()?;
            let session = build_session(Arc::clone(&secrets), &config, SendPolicy::RejectWhileLoading);
            run_chat(ChatContext {
                session,
                secrets,
                config: config_store,
                styled: std::io::stdout().is_terminal(),
            })
            .await
        }
        Commands::Home => {
            let scheme = config_store.color_scheme()?;
            let palette = if std::io::stdout().is_terminal() {
                Palette::for_scheme(scheme)
            } else {
                Palette::plain(scheme)
            };
            print_home(&palette);
            Ok(())
        }
        Commands::Say { prompt } => {
            let config = config_store.load()?;
            let session = build_session(secrets, &config, SendPolicy::RejectWhileLoading);
            run_say(prompt, &session).await
        }
        Commands::Set { key, value } => run_set(&key, &value.join(" "), secrets.as_ref(), &config_store),
        Commands::Unset { key } => run_unset(&key, secrets.as_ref(), &config_store),
        Commands::Settings => show_settings(secrets.as_ref(), &config_store),
    }
}

fn open_secret_store(no_keyring: bool) -> Result<Arc<dyn SecretStore>, Box<dyn Error>> {
    if !no_keyring {
        return Ok(Arc::new(KeyringSecretStore::new()));
    }
    let store = MemorySecretStore::new();
    if let Some(key) = std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()) {
        store.set(API_KEY_SECRET, key.trim())?;
    }
    Ok(Arc::new(store))
}

pub fn build_session(
    secrets: Arc<dyn SecretStore>,
    config: &Config,
    policy: SendPolicy,
) -> ConversationSession {
    let client = GeminiClient::new(config.endpoint());
    ConversationSession::with_policy(secrets, Arc::new(client), policy)
}
