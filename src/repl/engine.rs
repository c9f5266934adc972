use std::sync::Arc;

use reedline::{
    ColumnarMenu, Emacs, FileBackedHistory, KeyCode, KeyModifiers, MenuBuilder, Reedline,
    ReedlineEvent, ReedlineMenu, Signal, default_emacs_keybindings,
};
use tracing::{debug, warn};

use crate::completion::{Dispatcher, PopupBuffer};
use crate::config::HistoryConfig;
use crate::error::{BridgeError, Result};

use super::completer::BridgeCompleter;
use super::prompt::BridgePrompt;

const COMPLETION_MENU: &str = "completion_menu";

/// Interactive line editor using the bridge as its completer
pub struct ReplEngine {
    /// Line editor for command input
    editor: Reedline,

    /// Prompt shown before each line
    prompt: BridgePrompt,

    /// Whether to continue running
    running: bool,
}

impl ReplEngine {
    /// Create a new REPL engine
    ///
    /// # Arguments
    /// * `dispatcher` - Dispatcher serving completion requests
    /// * `popups` - Notifier buffer the dispatcher writes to
    /// * `prompt` - Prompt to render
    /// * `history_config` - History configuration
    /// * `color` - Enable colored output
    ///
    /// # Returns
    /// * `Result<Self>` - New REPL engine or error
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        popups: PopupBuffer,
        prompt: BridgePrompt,
        history_config: &HistoryConfig,
        color: bool,
    ) -> Result<Self> {
        let completer = Box::new(BridgeCompleter::new(dispatcher, popups));
        let menu = Box::new(ColumnarMenu::default().with_name(COMPLETION_MENU));

        let mut keybindings = default_emacs_keybindings();
        keybindings.add_binding(
            KeyModifiers::NONE,
            KeyCode::Tab,
            ReedlineEvent::UntilFound(vec![
                ReedlineEvent::Menu(COMPLETION_MENU.to_string()),
                ReedlineEvent::MenuNext,
            ]),
        );

        let mut editor = Reedline::create()
            .with_completer(completer)
            .with_menu(ReedlineMenu::EngineCompleter(menu))
            .with_edit_mode(Box::new(Emacs::new(keybindings)))
            .with_ansi_colors(color);

        if history_config.persist {
            if let Some(parent) = history_config.file_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let history = FileBackedHistory::with_file(
                history_config.max_size,
                history_config.file_path.clone(),
            )
            .map_err(|e| BridgeError::Generic(format!("Failed to open history: {}", e)))?;
            editor = editor.with_history(Box::new(history));
        }

        Ok(Self {
            editor,
            prompt,
            running: true,
        })
    }

    /// Read a single line of input
    ///
    /// # Returns
    /// * `Result<Option<String>>` - Input line, empty on Ctrl-C, or None on Ctrl-D
    pub fn read_line(&mut self) -> Result<Option<String>> {
        match self.editor.read_line(&self.prompt)? {
            Signal::Success(line) => Ok(Some(line)),
            Signal::CtrlC => Ok(Some(String::new())),
            Signal::CtrlD => {
                self.running = false;
                Ok(None)
            }
            #[allow(unreachable_patterns)]
            other => {
                warn!(signal = ?other, "Unhandled editor signal");
                Ok(Some(String::new()))
            }
        }
    }

    /// Handle a submitted line
    ///
    /// Lines are echoed back; `exit` and `quit` stop the shell.
    ///
    /// # Returns
    /// * `Option<String>` - Text to print, if any
    pub fn process_input(&mut self, input: &str) -> Option<String> {
        let input = input.trim();
        match input {
            "" => None,
            "exit" | "quit" => {
                debug!("Exit requested");
                self.running = false;
                None
            }
            _ => Some(input.to_string()),
        }
    }

    /// Check if REPL is still running
    pub fn is_running(&self) -> bool {
        self.running
    }
}
