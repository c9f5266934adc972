//! Command-line interface for compbridge
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading, validation and CLI overrides
//! - Subcommands (`complete`, `version`, `completion`, `config`)
//! - Building the completion dispatcher for the selected configuration

pub mod completion;

use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::codec::{self, Value};
use crate::completion::{
    CompletionMatch, CompletionOutcome, DispatchResult, Dispatcher, Host, LineState, Notifier,
    PopupBuffer,
};
use crate::config::{Config, LogLevel};
use crate::error::Result;

/// Completion-provider bridge for interactive shells
#[derive(Parser, Debug)]
#[command(
    name = "compbridge",
    version,
    about = "Completion-provider bridge for interactive shells",
    long_about = "Runs an external completion provider for the command line being typed and
turns its JSON output into typed completion matches. Without a subcommand, starts
a demonstration shell that uses the bridge as its completer."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Enable provider completion regardless of the configuration file
    #[arg(long)]
    pub enable: bool,

    /// Provider executable
    #[arg(long, value_name = "NAME")]
    pub provider: Option<String>,

    /// Retry timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<f64>,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands for compbridge
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Complete a command line once and print the result as JSON
    Complete {
        /// Command line to complete
        #[arg(value_name = "LINE")]
        line: String,

        /// Cursor byte offset (defaults to the end of the line)
        #[arg(long, value_name = "N")]
        cursor: Option<usize>,
    },

    /// Show version information
    Version,

    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        #[arg(value_name = "SHELL")]
        shell: String,
    },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,
    },
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface from the process arguments
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Create a CLI interface from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Self::load_config(&args)?;
        Ok(Self { args, config })
    }

    /// Load configuration from file and merge with arguments
    ///
    /// # Arguments
    /// * `args` - Command-line arguments
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load(args.config_file.as_deref())?;

        // Logging is not initialized yet.
        if let Err(e) = config.validate() {
            eprintln!("Warning: Configuration validation failed: {}", e);
            eprintln!("Using default configuration instead.");
            config = Config::default();
        }

        Self::apply_args_to_config(&mut config, args);
        Ok(config)
    }

    /// Apply CLI arguments to configuration
    ///
    /// Overrides configuration values with CLI arguments where provided
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        if args.enable {
            config.completion.enable = true;
        }
        if let Some(provider) = &args.provider {
            config.completion.provider = provider.clone();
        }
        if let Some(timeout) = args.timeout.filter(|t| t.is_finite() && *t > 0.0) {
            config.completion.timeout = timeout;
        }

        if args.very_verbose {
            config.logging.level = LogLevel::Trace;
        } else if args.verbose {
            config.logging.level = LogLevel::Debug;
        } else if args.quiet {
            config.logging.level = LogLevel::Error;
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Build a dispatcher for the effective configuration
    ///
    /// # Arguments
    /// * `notifier` - Destination for popup messages
    pub fn dispatcher(&self, notifier: Arc<dyn Notifier>) -> Dispatcher {
        let host = Host::system(
            Arc::new(self.config.aliases.clone()),
            Arc::new(self.config.completion.clone()),
            notifier,
        );
        Dispatcher::new(self.config.completion.provider.clone(), host)
    }

    /// Handle subcommands
    ///
    /// # Returns
    /// * `Result<bool>` - True if a subcommand ran and the program should exit
    pub async fn handle_subcommand(&self) -> Result<bool> {
        match &self.args.command {
            Some(Commands::Complete { line, cursor }) => {
                self.complete_once(line, cursor.unwrap_or(line.len())).await?;
                Ok(true)
            }
            Some(Commands::Version) => {
                self.show_version();
                Ok(true)
            }
            Some(Commands::Completion { shell }) => {
                completion::generate_completion(shell)?;
                Ok(true)
            }
            Some(Commands::Config { show, validate }) => {
                self.handle_config_command(*show, *validate)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run one completion request and print it as JSON
    async fn complete_once(&self, line: &str, cursor: usize) -> Result<()> {
        let popups = PopupBuffer::new();
        let dispatcher = self.dispatcher(Arc::new(popups.clone()));

        let state = LineState::parse(line, cursor);
        let result = dispatcher.complete(&state).await;

        println!("{}", render_result(&result, popups.take(), !self.args.no_color)?);
        Ok(())
    }

    /// Show version information
    fn show_version(&self) {
        println!("compbridge version {}", env!("CARGO_PKG_VERSION"));
        println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
    }

    /// Handle config subcommand
    ///
    /// # Arguments
    /// * `show` - Whether to show configuration
    /// * `validate` - Whether to validate configuration
    fn handle_config_command(&self, show: bool, validate: bool) -> Result<()> {
        if validate {
            self.validate_config_file();
        }

        if show {
            self.show_config()?;
        }

        Ok(())
    }

    /// Validate configuration file
    fn validate_config_file(&self) {
        let path = self.get_config_path();
        println!("Validating configuration file: {}", path.display());

        if !path.exists() {
            println!("Configuration file does not exist, defaults apply");
            return;
        }

        match Config::from_file(&path) {
            Ok(config) => match config.validate() {
                Ok(()) => println!("Configuration is valid"),
                Err(e) => println!("Configuration validation failed: {}", e),
            },
            Err(e) => println!("Failed to load configuration: {}", e),
        }
    }

    /// Show effective configuration
    fn show_config(&self) -> Result<()> {
        let path = self.get_config_path();
        println!("Configuration file: {}", path.display());
        println!();
        println!("{}", self.config.to_toml()?);
        Ok(())
    }

    /// Get configuration file path (from args or default)
    fn get_config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_path)
    }
}

/// Render a dispatch result as a JSON document.
///
/// Matches render as `{"matches": [..]}`; a handled request renders the
/// messages shown to the user as `{"diagnostic": ".."}`.
///
/// # Arguments
/// * `result` - Dispatch result
/// * `popups` - Messages collected by the notifier
/// * `color` - Keep style escapes in display text
pub fn render_result(result: &DispatchResult, popups: Vec<String>, color: bool) -> Result<String> {
    let mut document = BTreeMap::new();

    match &result.outcome {
        CompletionOutcome::Handled => {
            document.insert("diagnostic".to_string(), Value::from(popups.join("\n")));
        }
        CompletionOutcome::NoMatches => {
            document.insert("matches".to_string(), Value::Array(Vec::new()));
        }
        CompletionOutcome::Matches(matches) => {
            let items = matches.iter().map(|m| match_value(m, color)).collect();
            document.insert("matches".to_string(), Value::Array(items));
        }
    }

    Ok(codec::encode(&Value::Object(document))?)
}

fn match_value(m: &CompletionMatch, color: bool) -> Value {
    let display = if color { m.display.as_str() } else { m.plain_display() };

    let mut object = BTreeMap::new();
    object.insert("text".to_string(), Value::from(m.text.as_str()));
    object.insert("display".to_string(), Value::from(display));
    object.insert("description".to_string(), Value::from(m.description.as_str()));
    object.insert("kind".to_string(), Value::from(m.kind.as_str()));
    object.insert("suppress_append".to_string(), Value::from(m.suppress_append));
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CompletionKind, DispatchState};
    use nu_ansi_term::{Color, Style};

    #[test]
    fn test_cli_args_parsing() {
        let args = CliArgs::try_parse_from(vec!["compbridge"]).unwrap();
        assert!(args.command.is_none());
        assert!(args.config_file.is_none());
        assert!(!args.enable);
    }

    #[test]
    fn test_complete_subcommand() {
        let args =
            CliArgs::try_parse_from(vec!["compbridge", "complete", "git che", "--cursor", "5"])
                .unwrap();
        match args.command {
            Some(Commands::Complete { line, cursor }) => {
                assert_eq!(line, "git che");
                assert_eq!(cursor, Some(5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_args_override_config() {
        let args = CliArgs::try_parse_from(vec![
            "compbridge",
            "--enable",
            "--provider",
            "my-provider",
            "--timeout",
            "2.5",
            "-v",
        ])
        .unwrap();

        let mut config = Config::default();
        CliInterface::apply_args_to_config(&mut config, &args);
        assert!(config.completion.enable);
        assert_eq!(config.completion.provider, "my-provider");
        assert_eq!(config.completion.timeout, 2.5);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_invalid_timeout_is_ignored() {
        let args = CliArgs::try_parse_from(vec!["compbridge", "--timeout", "0"]).unwrap();
        let mut config = Config::default();
        CliInterface::apply_args_to_config(&mut config, &args);
        assert_eq!(config.completion.timeout, 5.0);
    }

    #[test]
    fn test_from_args_with_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[aliases]\ng = \"git $*\"\n").unwrap();

        let args = CliArgs::try_parse_from(vec![
            "compbridge".to_string(),
            "--config".to_string(),
            path.display().to_string(),
        ])
        .unwrap();
        let cli = CliInterface::from_args(args).unwrap();
        assert_eq!(cli.config().aliases.len(), 1);
        assert_eq!(cli.dispatcher(Arc::new(PopupBuffer::new())).provider(), "carapace");
    }

    fn sample_match() -> CompletionMatch {
        let style = Style::new().fg(Color::Yellow);
        CompletionMatch {
            text: "--help".to_string(),
            display: format!("{}--help", style.prefix()),
            description: "show help".to_string(),
            kind: CompletionKind::Arg,
            suppress_append: true,
            style: Some(style),
        }
    }

    #[test]
    fn test_render_matches() {
        let result = DispatchResult {
            state: DispatchState::Done,
            outcome: CompletionOutcome::Matches(vec![sample_match()]),
        };

        let json = render_result(&result, Vec::new(), false).unwrap();
        assert_eq!(
            json,
            r#"{"matches":[{"description":"show help","display":"--help","kind":"arg","suppress_append":true,"text":"--help"}]}"#
        );

        let colored = render_result(&result, Vec::new(), true).unwrap();
        assert!(colored.contains("\\u001b["));
    }

    #[test]
    fn test_render_diagnostic_and_empty() {
        let handled = DispatchResult {
            state: DispatchState::Done,
            outcome: CompletionOutcome::Handled,
        };
        assert_eq!(
            render_result(&handled, vec!["bad flag".to_string()], true).unwrap(),
            r#"{"diagnostic":"bad flag"}"#
        );

        let empty = DispatchResult {
            state: DispatchState::Done,
            outcome: CompletionOutcome::NoMatches,
        };
        assert_eq!(render_result(&empty, Vec::new(), true).unwrap(), r#"{"matches":[]}"#);
    }
}
