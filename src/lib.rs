//! `mysql-commando` is an async MySQL driver that delegates execution to the
//! `mysql` command-line client.
//!
//! Queries are rendered to plain SQL text before the client runs, and the
//! client's batch-mode output is decoded into records:
//! - [`MysqlCommando::run_query`]
//! - [`MysqlCommando::run_script`]
//! - [`MysqlCommando::last_insert_id`]
//!
//! The [`encode`] and [`decode`] functions are usable on their own.

mod command;
mod config;
mod decode;
mod driver;
mod encode;
mod error;
mod options;
mod params;
mod types;
mod value;

pub use config::Config;
pub use decode::{cast, decode, decode_bytes, decode_with, DecodeOptions, NULL_MARKER};
pub use driver::MysqlCommando;
pub use encode::{encode, render_literal};
pub use error::CommandoError;
pub use options::DriverOptions;
pub use params::Params;
pub use types::{Record, ResultSet};
pub use value::Value;

pub type Result<T> = std::result::Result<T, CommandoError>;
