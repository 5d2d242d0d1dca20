//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod auth;
pub mod say;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::core::config::data::{Config, ConfigKey, SettingError};
use crate::logging::init_file_logging;
use crate::ui::chat_loop::run_chat;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_DESCRIBE"),
    ")"
);

#[derive(Parser)]
#[command(name = "gemini-chat")]
#[command(version = VERSION)]
#[command(about = "A terminal chat interface for Google Gemini")]
#[command(
    long_about = "Gemini Chat is a full-screen terminal chat interface for Google's Gemini \
models. Replies stream in as they are generated and are formatted with light markdown.\n\n\
Authentication:\n\
  Use 'gemini-chat auth' to store your API key in the system keyring.\n\n\
Environment Variables (checked before the keyring):\n\
  GEMINI_API_KEY    Your Gemini API key\n\
  API_KEY           Fallback name for the same key\n\
  RUST_LOG          Log filter used with --log (default: gemini_chat=info)\n\n\
Controls:\n\
  Enter             Send the message\n\
  Alt+Enter         Insert a new line\n\
  Up/Down           Pick a suggested prompt on the welcome screen\n\
  PgUp/PgDn/Mouse   Scroll through the conversation\n\
  Ctrl+End          Jump back to the newest message\n\
  Ctrl+N            Start a new chat\n\
  Ctrl+T            Toggle markdown formatting\n\
  Ctrl+B            Select a code block (Up/Down choose, Enter copies, Esc cancels)\n\
  Esc               Dismiss the status line\n\
  Ctrl+C            Quit the application"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Gemini model to use (overrides the configured model)
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Write diagnostic logs to the given file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Only read the API key from environment variables, never the keyring
    #[arg(long, global = true)]
    pub env_only: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send one prompt and print the reply without starting the interface
    Say {
        /// Prompt text; multiple words are joined with spaces
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Store a Gemini API key in the system keyring
    Auth,
    /// Remove the stored Gemini API key from the system keyring
    Deauth,
    /// Set a configuration value, or show the configuration when no value is given
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key (can be multiple words)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset a configuration value
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            if let Some(path) = args.log.as_deref() {
                init_file_logging(path)?;
            }
            run_chat(args.model, args.env_only).await
        }
        Commands::Say { prompt } => {
            match args.log.as_deref() {
                Some(path) => init_file_logging(path)?,
                None => crate::logging::init_stderr_logging()?,
            }
            say::run_say(prompt, args.model, args.env_only).await
        }
        Commands::Auth => {
            if let Err(e) = auth::run_auth() {
                eprintln!("❌ Authentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Deauth => {
            if let Err(e) = auth::run_deauth() {
                eprintln!("❌ Deauthentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            let Some(key) = key else {
                config.print_all();
                return Ok(());
            };
            if value.is_empty() {
                config.print_all();
                return Ok(());
            }
            let value = value.join(" ");
            match apply_setting(&mut config, &key, Some(&value)) {
                Ok(key) => {
                    config.save()?;
                    println!("✅ Set {key} to: {value}");
                }
                Err(e) => {
                    eprintln!("❌ {e}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            match apply_setting(&mut config, &key, None) {
                Ok(key) => {
                    config.save()?;
                    println!("✅ Unset {key}");
                }
                Err(e) => {
                    eprintln!("❌ {e}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
    }
}

/// Sets `key` to `value`, or unsets it when `value` is `None`.
fn apply_setting(
    config: &mut Config,
    key: &str,
    value: Option<&str>,
) -> Result<ConfigKey, SettingError> {
    let parsed = ConfigKey::parse(key).ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;
    match value {
        Some(value) => config.set_value(parsed, value)?,
        None => config.unset_value(parsed),
    }
    Ok(parsed)
}
