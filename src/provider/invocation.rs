//! Provider command lines

use std::time::Duration;

/// One provider invocation: executable, arguments and idle timeout.
///
/// Built fresh for every completion request and never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInvocation {
    /// Provider executable name or path
    pub executable: String,

    /// Arguments after the executable
    pub args: Vec<String>,

    /// Maximum time without output before the run is abandoned
    pub timeout: Duration,
}

impl ProviderInvocation {
    /// Create a new invocation
    ///
    /// # Arguments
    /// * `executable` - Provider executable
    /// * `args` - Arguments passed verbatim
    /// * `timeout` - Idle timeout
    pub fn new(executable: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            args,
            timeout,
        }
    }

    /// Same command line with a different timeout.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    /// Render the command line for logs, quoting empty or spaced arguments.
    pub fn command_line(&self) -> String {
        std::iter::once(self.executable.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(|part| {
                if part.is_empty() || part.contains(char::is_whitespace) {
                    format!("\"{}\"", part)
                } else {
                    part.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_quotes_empty_and_spaced_args() {
        let invocation = ProviderInvocation::new(
            "carapace",
            vec![
                "git".to_string(),
                "export".to_string(),
                ".".to_string(),
                "commit -m".to_string(),
                String::new(),
            ],
            Duration::from_secs(5),
        );
        assert_eq!(
            invocation.command_line(),
            r#"carapace git export . "commit -m" """#
        );
    }

    #[test]
    fn test_with_timeout_keeps_arguments() {
        let invocation = ProviderInvocation::new("p", vec!["a".to_string()], Duration::from_secs(5));
        let retry = invocation.with_timeout(Duration::from_secs(9));
        assert_eq!(retry.args, invocation.args);
        assert_eq!(retry.timeout, Duration::from_secs(9));
    }
}
