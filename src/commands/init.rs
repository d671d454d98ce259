use crate::args::InitArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory, its subdirectories and:
/// - Creates an initial `config.json` file from `args`
/// - Copies the service account key into the secrets directory.
///
/// # Arguments
/// - `home` - The directory that will be the root of the home directory, e.g.
///   `$HOME/reefficiency`
/// - `args` - The spreadsheet name and URL, the service account key file and the allowed users.
///
/// # Errors
/// - Returns an error if any file operations fail or the URL has no spreadsheet id.
pub async fn init(home: &Path, args: &InitArgs) -> Result<Out<()>> {
    let config = Config::create(
        home,
        args.service_account(),
        args.sheet_name(),
        args.sheet_url(),
        args.allowed_user_ids().to_vec(),
    )
    .await
    .context("Unable to create the home directory and config")
    .pub_result(ErrorType::Config)?;
    let mut message = format!(
        "Successfully created the reefficiency home directory at {}",
        config.root().display()
    );
    if config.allowed_user_ids().is_empty() {
        message.push_str(
            ". No users are allowed to talk to the bot yet, add their ids to allowed_user_ids",
        );
    }
    Ok(message.into())
}
