//! One function per `reef` subcommand. Each takes the loaded `Config` (except `init`, which
//! creates it) and returns an `Out` for `main` to print.

mod dashboard;
mod init;
mod record;
mod report;
mod run;
mod verify;

use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use dashboard::dashboard;
pub use init::init;
pub use record::record;
pub use report::report;
pub use run::run;
pub use verify::{verify, Verified};

/// What a command produced: a line for the person at the terminal and, for most commands, a value
/// that tests and `--log-level debug` runs can inspect.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    message: String,
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    pub fn new(message: impl Into<String>, structure: T) -> Self {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// An outcome with nothing beyond its message.
    pub fn new_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Logs the message at info level and the structure, if any, as JSON at debug level.
    pub fn print(&self) {
        info!("{}", self.message);
        let Some(structure) = self.structure() else {
            return;
        };
        match serde_json::to_string_pretty(structure) {
            Ok(json) => debug!("Command output:\n{json}"),
            Err(e) => debug!("The command output could not be serialized: {e}"),
        }
    }
}
