use clap::Parser;
use reefficiency::args::{Args, Command};
use reefficiency::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().home().path();

    // When REEF_IN_TEST_MODE is set and non-empty the in-memory spreadsheet is used instead of
    // Google Sheets.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args).await?.print(),
        Command::Verify => commands::verify(Config::load(home).await?, mode).await?.print(),
        Command::Record(record_args) => {
            commands::record(Config::load(home).await?, mode, record_args)
                .await?
                .print()
        }
        Command::Report(report_args) => {
            let out = commands::report(Config::load(home).await?, mode, report_args).await?;
            // The report is the output; it goes to stdout rather than the log.
            println!("{}", out.message());
        }
        Command::Dashboard(dashboard_args) => {
            commands::dashboard(Config::load(home).await?, mode, dashboard_args)
                .await?
                .print()
        }
        Command::Run(run_args) => commands::run(Config::load(home).await?, mode, run_args)
            .await?
            .print(),
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
