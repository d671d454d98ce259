use crate::commands::Out;
use crate::store::{PartitionName, Store};
use crate::{Config, Mode, Result};
use serde::Serialize;

/// What `reef verify` found.
#[derive(Debug, Clone, Serialize)]
pub struct Verified {
    pub title: String,
    pub partitions: Vec<PartitionName>,
}

/// Connects to the spreadsheet, creating the dashboard if it is missing, and lists the monthly
/// sheets.
///
/// # Errors
/// - Returns a `Connection` error if the spreadsheet cannot be opened.
pub async fn verify(config: Config, mode: Mode) -> Result<Out<Verified>> {
    let mut store = Store::new(config, mode);
    store.init().await?;
    let title = store.title().await?;
    let partitions = store.partition_names().await?;
    let names: Vec<String> = partitions.iter().map(ToString::to_string).collect();
    let message = if names.is_empty() {
        format!("Connected to '{title}', no monthly sheets yet")
    } else {
        format!(
            "Connected to '{title}' with {} monthly sheets: {}",
            names.len(),
            names.join(", ")
        )
    };
    Ok(Out::new(message, Verified { title, partitions }))
}
