use crate::args::RecordArgs;
use crate::bot::parse_record;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::parse_date;
use crate::store::{Recorded, Store};
use crate::{Config, Mode, Result};
use chrono::Local;
use tracing::warn;

/// Records one transaction and recomputes the dashboard. The positional arguments are read
/// exactly like those of the `/catat` chat command.
///
/// # Errors
/// - Returns a `Validation` error for a bad kind, amount or date. Nothing is written.
/// - Returns a `Connection` or `Sheet` error if the row could not be written.
pub async fn record(config: Config, mode: Mode, args: &RecordArgs) -> Result<Out<Recorded>> {
    let today = match args.date() {
        Some(date) => parse_date(date).pub_result(ErrorType::Validation)?,
        None => Local::now().date_naive(),
    };
    let transaction = parse_record(args.tokens().as_slice(), today).pub_result(ErrorType::Validation)?;

    let mut store = Store::new(config, mode);
    let recorded = store.add_transaction(&transaction).await?;
    for failure in &recorded.dashboard.failures {
        warn!(
            "The dashboard step {} was not updated: {}",
            failure.step, failure.message
        );
    }
    let message = format!(
        "Recorded {} of {} ({}) in '{}'",
        transaction.kind(),
        transaction.amount(),
        transaction.category(),
        recorded.partition
    );
    Ok(Out::new(message, recorded))
}
