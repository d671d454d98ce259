use crate::args::RunArgs;
use crate::bot::{AccessList, Bot};
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::intent::GeminiExtractor;
use crate::prefs::FilePreferences;
use crate::store::Store;
use crate::telegram::{self, Telegram};
use crate::{Config, Error, Mode, Result};
use std::sync::Arc;
use tracing::info;

/// Runs the Telegram bot until it is interrupted.
///
/// The spreadsheet connection is attempted once up front; if it fails the bot still starts and
/// retries on each message.
///
/// # Errors
/// - Returns a `Config` error if the bot token or Gemini key is blank or the preferences file
///   cannot be read.
/// - Returns a `Gateway` error if Telegram cannot be reached at startup.
pub async fn run(config: Config, mode: Mode, args: &RunArgs) -> Result<Out<()>> {
    if args.telegram_token().trim().is_empty() {
        return Err(Error::msg(
            ErrorType::Config,
            "TELEGRAM_BOT_TOKEN is required to run the bot",
        ));
    }
    if args.gemini_api_key().trim().is_empty() {
        return Err(Error::msg(
            ErrorType::Config,
            "GEMINI_API_KEY is required to run the bot",
        ));
    }

    let model = args.gemini_model().unwrap_or(config.gemini_model()).to_string();
    info!("Using Gemini model {model}");
    let extractor = GeminiExtractor::new(args.gemini_api_key(), model);
    let prefs = FilePreferences::open(config.preferences_path())
        .await
        .pub_result(ErrorType::Config)?;
    let access = AccessList::new(config.allowed_user_ids().iter().copied());
    info!("{} users are allowed to use the bot", access.len());
    let gateway = Telegram::new(args.telegram_token()).pub_result(ErrorType::Gateway)?;

    let bot = Bot::new(
        Store::new(config, mode),
        Arc::new(extractor),
        access,
        Arc::new(prefs),
    );
    bot.connect().await;
    telegram::run(Arc::new(bot), gateway)
        .await
        .pub_result(ErrorType::Gateway)?;
    Ok("The bot has stopped".into())
}
