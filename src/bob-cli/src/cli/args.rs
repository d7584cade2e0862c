//! CLI argument structures and parsing.

use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};

/// Levels accepted by `--log-level`.
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Bob - chat with a remote language model
#[derive(Parser, Debug)]
#[command(name = "bob")]
#[command(author, version)]
#[command(about = "Chat with the Bob backend from the terminal", long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides config file and BOB_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Path to a TOML client configuration file
    #[arg(long, short, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(
        long,
        global = true,
        default_value = "warn",
        value_parser = PossibleValuesParser::new(LOG_LEVELS)
    )]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List conversations
    List,

    /// Create a conversation
    New {
        /// Pre-prompt for the new conversation
        #[arg(long, short, default_value = "")]
        pre_prompt: String,
    },

    /// Show a conversation's pre-prompt and turns
    Show {
        /// Conversation identifier
        id: String,
    },

    /// Send one message and print the reply
    Send {
        /// Conversation identifier
        id: String,
        /// Message text
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Chat interactively in a conversation
    Chat {
        /// Conversation identifier
        id: String,
    },

    /// Delete a conversation
    Delete {
        /// Conversation identifier
        id: String,
    },

    /// Read or change a conversation's pre-prompt
    #[command(subcommand)]
    PrePrompt(PrePromptCommand),
}

#[derive(Subcommand, Debug)]
pub enum PrePromptCommand {
    /// Print the pre-prompt
    Get {
        /// Conversation identifier
        id: String,
    },
    /// Replace the pre-prompt
    Set {
        /// Conversation identifier
        id: String,
        /// New pre-prompt text
        text: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_send_joins_words() {
        let cli = Cli::try_parse_from(["bob", "send", "abc", "hello", "there"]).unwrap();
        match cli.command {
            Commands::Send { id, message } => {
                assert_eq!(id, "abc");
                assert_eq!(message.join(" "), "hello there");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "bob",
            "list",
            "--base-url",
            "http://10.0.0.2:5000",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://10.0.0.2:5000"));
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn test_log_level_defaults_and_validates() {
        let cli = Cli::try_parse_from(["bob", "list"]).unwrap();
        assert_eq!(cli.log_level, "warn");
        assert!(Cli::try_parse_from(["bob", "list", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn test_parse_pre_prompt_set() {
        let cli = Cli::try_parse_from(["bob", "pre-prompt", "set", "abc", "Be terse."]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::PrePrompt(PrePromptCommand::Set { .. })
        ));
    }

    #[test]
    fn test_new_defaults_to_empty_pre_prompt() {
        let cli = Cli::try_parse_from(["bob", "new"]).unwrap();
        match cli.command {
            Commands::New { pre_prompt } => assert!(pre_prompt.is_empty()),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_send_requires_message() {
        assert!(Cli::try_parse_from(["bob", "send", "abc"]).is_err());
    }
}
