//! Host shell collaborators
//!
//! The dispatcher never talks to the shell directly. Everything it needs from
//! the host goes through the traits in this module:
//!
//! - [`AliasTable`] resolves command aliases
//! - [`PathLookup`] answers search-path and directory questions
//! - [`SettingsStore`] exposes the user's completion settings
//! - [`Notifier`] shows a message in place of the completion list
//! - [`StyleResolver`](super::style::StyleResolver) turns style names into
//!   terminal styles

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

use super::style::{NamedStyles, StyleResolver};

/// Alias lookup.
pub trait AliasTable: Send + Sync {
    /// Expansion text of alias `name`, if defined.
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Search-path and filesystem queries.
pub trait PathLookup: Send + Sync {
    /// Resolve `name` to an executable on the search path.
    fn find_executable(&self, name: &str) -> Option<PathBuf>;

    /// Whether `path` names an existing directory.
    fn is_dir(&self, path: &str) -> bool;
}

/// Read access to completion settings by name.
pub trait SettingsStore: Send + Sync {
    fn get_bool(&self, name: &str) -> Option<bool>;
    fn get_string(&self, name: &str) -> Option<String>;
    fn get_number(&self, name: &str) -> Option<f64>;
}

/// Surfaces a single message to the user.
pub trait Notifier: Send + Sync {
    fn popup(&self, message: &str);
}

impl AliasTable for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl AliasTable for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// [`PathLookup`] over the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPaths;

impl PathLookup for SystemPaths {
    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        match which::which(name) {
            Ok(path) => Some(path),
            Err(e) => {
                trace!(name, error = %e, "Executable not found");
                None
            }
        }
    }

    fn is_dir(&self, path: &str) -> bool {
        Path::new(path).is_dir()
    }
}

/// Notifier that keeps messages until the host collects them.
#[derive(Debug, Clone, Default)]
pub struct PopupBuffer {
    messages: Arc<Mutex<Vec<String>>>,
}

impl PopupBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return every pending message, oldest first.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for PopupBuffer {
    fn popup(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

/// The full set of host collaborators used by a dispatcher.
#[derive(Clone)]
pub struct Host {
    pub aliases: Arc<dyn AliasTable>,
    pub paths: Arc<dyn PathLookup>,
    pub settings: Arc<dyn SettingsStore>,
    pub notifier: Arc<dyn Notifier>,
    pub styles: Arc<dyn StyleResolver>,
}

impl Host {
    /// Collaborators backed by the real filesystem and [`NamedStyles`].
    ///
    /// # Arguments
    /// * `aliases` - Alias definitions
    /// * `settings` - Completion settings
    /// * `notifier` - Destination for popup messages
    pub fn system(
        aliases: Arc<dyn AliasTable>,
        settings: Arc<dyn SettingsStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            aliases,
            paths: Arc::new(SystemPaths),
            settings,
            notifier,
            styles: Arc::new(NamedStyles),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_map_lookup() {
        let mut aliases = HashMap::new();
        aliases.insert("g".to_string(), "git $*".to_string());
        assert_eq!(aliases.lookup("g").as_deref(), Some("git $*"));
        assert_eq!(aliases.lookup("h"), None);
    }

    #[test]
    fn test_popup_buffer_take_drains() {
        let buffer = PopupBuffer::new();
        let notifier: Arc<dyn Notifier> = Arc::new(buffer.clone());
        notifier.popup("first");
        notifier.popup("second");

        assert_eq!(buffer.take(), vec!["first", "second"]);
        assert!(buffer.take().is_empty());
    }

    #[test]
    fn test_system_paths_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();

        let paths = SystemPaths;
        assert!(paths.is_dir(dir.path().to_str().unwrap()));
        assert!(!paths.is_dir(file.to_str().unwrap()));
        assert!(!paths.is_dir(dir.path().join("missing").to_str().unwrap()));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_paths_find_executable() {
        let paths = SystemPaths;
        assert!(paths.find_executable("sh").is_some());
        assert!(paths.find_executable("compbridge-no-such-binary").is_none());
    }
}
