/// Configures how the `mysql` client is launched.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DriverOptions {
    /// Client executable, looked up on `PATH` when not absolute.
    pub program: String,
    /// Arguments placed before the connection arguments, e.g. for a wrapper
    /// such as `docker exec -i <container> mysql`.
    pub program_args: Vec<String>,
    /// Cast mode used when a call does not choose one.
    pub cast: bool,
    /// Kills the client after this many milliseconds.
    pub timeout_ms: Option<u64>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            program: "mysql".to_owned(),
            program_args: Vec::new(),
            cast: true,
            timeout_ms: None,
        }
    }
}
