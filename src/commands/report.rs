use crate::args::ReportArgs;
use crate::bot::parse_report;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::report::{self, Period};
use crate::store::Store;
use crate::{Config, Mode, Result};
use chrono::Local;

/// Renders a monthly or annual report. The period is read exactly like the arguments of the
/// `/laporan` chat command.
///
/// # Errors
/// - Returns a `Validation` error if the period cannot be understood. Problems reading the
///   spreadsheet are reported in the report text instead.
pub async fn report(config: Config, mode: Mode, args: &ReportArgs) -> Result<Out<Period>> {
    let today = Local::now().date_naive();
    let period = parse_report(args.period(), today).pub_result(ErrorType::Validation)?;
    let mut store = Store::new(config, mode);
    let text = report::render(&mut store, period).await;
    Ok(Out::new(text, period))
}
