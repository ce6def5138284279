use std::{path::Path, process::Stdio, time::Duration};

use tokio::process::Command;

use crate::{
    command::{query_args, script_args},
    decode_bytes, encode, CommandoError, Config, DriverOptions, Params, Result, ResultSet,
};

const QUERY_LAST_INSERT_ID: &str = ";\nSELECT last_insert_id() AS last_insert_id;";

/// MySQL driver running queries and scripts through the `mysql` client.
///
/// Every call spawns one client process in batch mode and decodes its whole
/// standard output once the process has exited.
#[derive(Clone, Debug)]
pub struct MysqlCommando {
    config: Config,
    options: DriverOptions,
}

impl MysqlCommando {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            options: DriverOptions::default(),
        }
    }

    /// Creates a driver from `MYSQL_COMMANDO_*` environment variables.
    ///
    /// See [`Config::from_env`] for the variable names.
    pub fn from_env() -> Result<Self> {
        Config::from_env().map(Self::new)
    }

    /// Applies driver options such as client program, cast mode and timeout.
    pub fn with_options(mut self, opts: DriverOptions) -> Self {
        self.options = opts;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    /// Runs a query with the default cast mode.
    ///
    /// Parameters are referenced as `%s` (positional) or `%(name)s` (named).
    pub async fn run_query<P: Into<Params>>(&self, sql: &str, params: P) -> Result<ResultSet> {
        self.run_query_with(sql, params, None).await
    }

    /// Runs a query, overriding the default cast mode when `cast` is set.
    pub async fn run_query_with<P: Into<Params>>(
        &self,
        sql: &str,
        params: P,
        cast: Option<bool>,
    ) -> Result<ResultSet> {
        let query = encode(sql, &params.into())?;
        let output = self.execute(query_args(&self.config, &query), None).await?;
        decode_bytes(&output, cast.unwrap_or(self.options.cast))
    }

    /// Runs a statement and returns the identifier generated for an
    /// `AUTO_INCREMENT` column.
    pub async fn last_insert_id<P: Into<Params>>(&self, sql: &str, params: P) -> Result<i64> {
        let mut query = encode(sql, &params.into())?;
        let statement_len = query.trim_end().trim_end_matches(';').len();
        query.truncate(statement_len);
        query.push_str(QUERY_LAST_INSERT_ID);

        let output = self.execute(query_args(&self.config, &query), None).await?;
        decode_bytes(&output, true)?.last_insert_id()
    }

    /// Runs the SQL script at `path` with the default cast mode.
    pub async fn run_script(&self, path: impl AsRef<Path>) -> Result<ResultSet> {
        self.run_script_with(path, None).await
    }

    /// Runs the SQL script at `path`, overriding the default cast mode when
    /// `cast` is set.
    pub async fn run_script_with(
        &self,
        path: impl AsRef<Path>,
        cast: Option<bool>,
    ) -> Result<ResultSet> {
        let path = path.as_ref();
        let script = tokio::fs::File::open(path)
            .await
            .map_err(|source| CommandoError::Script {
                path: path.to_path_buf(),
                source,
            })?
            .into_std()
            .await;

        let output = self
            .execute(script_args(&self.config), Some(Stdio::from(script)))
            .await?;
        decode_bytes(&output, cast.unwrap_or(self.options.cast))
    }

    async fn execute(&self, args: Vec<String>, stdin: Option<Stdio>) -> Result<Vec<u8>> {
        let mut cmd = Command::new(&self.options.program);
        cmd.args(&self.options.program_args)
            .args(&args)
            .stdin(stdin.unwrap_or_else(Stdio::null))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            program = %self.options.program,
            args = ?crate::command::redact(&args),
            "running mysql client"
        );

        let child = cmd.spawn().map_err(CommandoError::Spawn)?;
        let output = match self.options.timeout_ms {
            Some(timeout_ms) => {
                tokio::time::timeout(Duration::from_millis(timeout_ms), child.wait_with_output())
                    .await
                    .map_err(|_| {
                        #[cfg(feature = "tracing")]
                        tracing::warn!("mysql client killed after {} ms", timeout_ms);

                        CommandoError::Timeout { timeout_ms }
                    })?
            }
            None => child.wait_with_output().await,
        }
        .map_err(CommandoError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();

            #[cfg(feature = "tracing")]
            tracing::warn!(code = ?output.status.code(), "mysql client failed: {}", stderr);

            return Err(CommandoError::Process {
                code: output.status.code(),
                stderr,
            });
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("mysql client returned {} bytes", output.stdout.len());

        Ok(output.stdout)
    }
}
