use std::{fmt, path::Path};

use serde::Deserialize;

use crate::{CommandoError, Result};

/// Connection settings passed to the `mysql` client.
#[derive(Clone, Deserialize, Eq, PartialEq)]
pub struct Config {
    pub hostname: String,
    pub database: String,
    pub username: String,
    pub password: String,
    /// Value for `--default-character-set`.
    #[serde(default, alias = "charset")]
    pub encoding: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("hostname", &self.hostname)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("encoding", &self.encoding)
            .finish()
    }
}

impl Config {
    pub fn new(
        hostname: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            database: database.into(),
            username: username.into(),
            password: password.into(),
            encoding: None,
        }
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Parses a JSON object with `hostname`, `database`, `username`,
    /// `password` and an optional `encoding` (or `charset`).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|err| {
            CommandoError::Config(format!("invalid database configuration: {err}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            CommandoError::Config(format!(
                "cannot read database configuration '{}': {err}",
                path.display()
            ))
        })?;
        Self::from_json_str(&content)
    }

    /// Reads the configuration from the environment.
    ///
    /// Reads:
    /// - `MYSQL_COMMANDO_HOSTNAME`
    /// - `MYSQL_COMMANDO_DATABASE`
    /// - `MYSQL_COMMANDO_USERNAME`
    /// - `MYSQL_COMMANDO_PASSWORD`
    /// - `MYSQL_COMMANDO_ENCODING` (optional)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name).ok_or_else(|| {
                CommandoError::Config(format!("missing {name} environment variable"))
            })
        };

        let config = Self {
            hostname: required("MYSQL_COMMANDO_HOSTNAME")?,
            database: required("MYSQL_COMMANDO_DATABASE")?,
            username: required("MYSQL_COMMANDO_USERNAME")?,
            password: required("MYSQL_COMMANDO_PASSWORD")?,
            encoding: lookup("MYSQL_COMMANDO_ENCODING").filter(|value| !value.trim().is_empty()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects empty required fields.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("hostname", &self.hostname),
            ("database", &self.database),
            ("username", &self.username),
            ("password", &self.password),
        ];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(CommandoError::Config(format!(
                "missing database configuration: {name}"
            ))),
            None => Ok(()),
        }
    }
}
