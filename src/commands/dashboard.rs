use crate::args::DashboardArgs;
use crate::commands::Out;
use crate::model::{month_name, parse_month};
use crate::store::{DashboardStatus, Store};
use crate::{Config, Error, ErrorType, Mode, Result};
use tracing::warn;

/// Recomputes the dashboard. With `--year` (and optionally `--month`) the selectors are moved
/// first.
///
/// # Errors
/// - Returns a `Validation` error for an unknown month name.
/// - Returns a `Connection` or `Sheet` error if the spreadsheet cannot be reached or the selectors
///   cannot be written. A step that fails during the recompute is reported in the output instead.
pub async fn dashboard(
    config: Config,
    mode: Mode,
    args: &DashboardArgs,
) -> Result<Out<DashboardStatus>> {
    let month = match args.month() {
        Some(name) => Some(parse_month(name).ok_or_else(|| {
            Error::msg(ErrorType::Validation, format!("Unknown month '{name}'"))
        })?),
        None => None,
    };

    let mut store = Store::new(config, mode);
    let status = match args.year() {
        Some(year) => store.select_dashboard_period(year, month).await?,
        None => store.update_dashboard().await?,
    };

    let period = match status.selection.month {
        Some(m) => format!("{} {}", month_name(m), status.selection.year),
        None => status.selection.year.to_string(),
    };
    let message = if status.is_complete() {
        format!("Dashboard updated for {period}")
    } else {
        for failure in &status.failures {
            warn!("Dashboard step {} failed: {}", failure.step, failure.message);
        }
        format!(
            "Dashboard partially updated for {period}, {} of 4 steps failed",
            status.failures.len()
        )
    };
    Ok(Out::new(message, status))
}
