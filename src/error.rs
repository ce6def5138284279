use std::path::PathBuf;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum CommandoError {
    /// Parameters do not line up with the placeholders of the query template.
    #[error("placeholder mismatch: {0}")]
    PlaceholderMismatch(String),
    /// A parameter value has no SQL literal rendering.
    #[error("type '{kind}' is not managed as a query parameter")]
    UnsupportedParameterType { kind: &'static str },
    /// Client output could not be decoded as tab-separated rows.
    ///
    /// `line` is 1-based and counts from the first non-blank line of the
    /// output, so the header is line 1 and the first row is line 2.
    #[error("malformed tabular output at line {line}: {message}")]
    MalformedTabularOutput { line: usize, message: String },
    /// Missing or invalid connection configuration.
    #[error("{0}")]
    Config(String),
    /// Script file could not be opened.
    #[error("cannot open script '{}': {source}", path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The client program could not be started or awaited.
    #[error("cannot run mysql client: {0}")]
    Spawn(#[source] std::io::Error),
    /// The client program exited with a non-zero status.
    #[error("mysql client failed ({}): {stderr}", exit_code_label(*code))]
    Process {
        /// Exit code, `None` when the process was killed by a signal.
        code: Option<i32>,
        /// Trimmed standard error of the client.
        stderr: String,
    },
    /// The client program did not finish in time and was killed.
    #[error("mysql client timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
}

fn exit_code_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use crate::CommandoError;

    #[test]
    fn process_error_mentions_exit_code_and_stderr() {
        let err = CommandoError::Process {
            code: Some(1),
            stderr: "ERROR 1064 (42000): You have an error in your SQL syntax".to_owned(),
        };
        let message = err.to_string();
        assert!(message.contains("exit code 1"));
        assert!(message.contains("You have an error in your SQL syntax"));
    }

    #[test]
    fn script_error_mentions_path() {
        let err = CommandoError::Script {
            path: "script_that_doesnt_exist.sql".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("'script_that_doesnt_exist.sql'"));
    }
}
