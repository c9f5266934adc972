//! compbridge - completion-provider bridge
//!
//! ```bash
//! # One-shot completion as JSON
//! compbridge --enable complete "git chec"
//!
//! # Demo shell with provider completion on Tab
//! compbridge --enable
//! ```

use std::sync::Arc;

use compbridge::cli::CliInterface;
use compbridge::completion::PopupBuffer;
use compbridge::error::Result;
use compbridge::repl::{BridgePrompt, ReplEngine};

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Handle subcommands or start the demo shell
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    if cli.handle_subcommand().await? {
        return Ok(());
    }

    run_interactive_mode(&cli)
}

/// Run the demo shell until Ctrl-D or `exit`
fn run_interactive_mode(cli: &CliInterface) -> Result<()> {
    let config = cli.config();
    let color = !cli.args().no_color;

    let popups = PopupBuffer::new();
    let dispatcher = Arc::new(cli.dispatcher(Arc::new(popups.clone())));
    let prompt = BridgePrompt::new(
        config.completion.provider.clone(),
        config.completion.enable,
        color,
    );
    let mut repl = ReplEngine::new(dispatcher, popups, prompt, &config.history, color)?;

    if !cli.args().quiet {
        println!("compbridge {} (Tab completes, Ctrl-D exits)", compbridge::VERSION);
        if !config.completion.enable {
            println!("Provider completion is disabled; pass --enable or set completion.enable");
        }
    }

    while repl.is_running() {
        let input = match repl.read_line()? {
            Some(line) => line,
            None => break,
        };

        if let Some(output) = repl.process_input(&input) {
            println!("{}", output);
        }
    }

    Ok(())
}

/// Initialize logging system based on configuration and verbosity flags
///
/// # Arguments
/// * `cli` - CLI interface with effective configuration
fn initialize_logging(cli: &CliInterface) {
    let level = cli.config().logging.level.to_tracing_level();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_ansi(!cli.args().no_color)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
