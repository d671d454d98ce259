//! A small Telegram Bot API gateway: long polling for updates and sending replies.

use crate::bot::{Bot, Incoming, Reply};
use crate::error::Res;
use anyhow::{bail, Context};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

const API_BASE: &str = "https://api.telegram.org";

/// Telegram rejects longer messages.
pub const MAX_MESSAGE_LEN: usize = 4096;

const POLL_TIMEOUT_SECS: u64 = 30;
const RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct Telegram {
    client: Client,
    base_url: String,
}

impl Telegram {
    pub fn new(token: &str) -> Res<Self> {
        Self::with_base_url(&format!("{API_BASE}/bot{token}"))
    }

    fn with_base_url(base_url: &str) -> Res<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .build()
            .context("Unable to build the HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn call<P, R>(&self, method: &str, payload: &P) -> Res<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        // The URL contains the bot token, so it is stripped from transport errors.
        let res = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(payload)
            .send()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("Unable to call Telegram '{method}'"))?;
        let body: ApiResponse<R> = res
            .json()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("Unable to read the Telegram '{method}' response"))?;
        body.into_result(method)
    }

    /// The bot's own account. Used to check the token.
    pub async fn get_me(&self) -> Res<User> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Waits up to the poll timeout for updates with ids of at least `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Res<Vec<Update>> {
        let payload = GetUpdates {
            offset,
            timeout: POLL_TIMEOUT_SECS,
            allowed_updates: vec!["message", "callback_query"],
        };
        self.call("getUpdates", &payload).await
    }

    /// Sends `reply` to `chat_id`, split into several messages if it is too long. Markdown that
    /// Telegram refuses to parse is resent as plain text.
    pub async fn send(&self, chat_id: i64, reply: &Reply) -> Res<()> {
        let parts = chunks(&reply.text);
        let last = parts.len().saturating_sub(1);
        for (ix, part) in parts.iter().enumerate() {
            // Buttons go on the last message.
            let markup = (ix == last && !reply.buttons.is_empty()).then(|| keyboard(reply));
            let mut message = SendMessage {
                chat_id,
                text: part,
                parse_mode: Some("Markdown"),
                reply_markup: markup.as_ref(),
            };
            if let Err(e) = self.call::<_, serde_json::Value>("sendMessage", &message).await {
                warn!("Sending as Markdown failed, retrying as plain text: {e:#}");
                message.parse_mode = None;
                self.call::<_, serde_json::Value>("sendMessage", &message)
                    .await
                    .context("Unable to send a message")?;
            }
        }
        Ok(())
    }

    /// Stops the client's loading indicator on a pressed button.
    pub async fn answer_callback(&self, callback_query_id: &str) -> Res<()> {
        let payload = serde_json::json!({ "callback_query_id": callback_query_id });
        let _: bool = self.call("answerCallbackQuery", &payload).await?;
        Ok(())
    }
}

/// Polls Telegram until Ctrl-C, handing each update to `bot` on its own task. Handlers still
/// running at Ctrl-C are awaited before returning.
pub async fn run(bot: Arc<Bot>, telegram: Telegram) -> Res<()> {
    let me = telegram
        .get_me()
        .await
        .context("Unable to reach Telegram, check the bot token")?;
    info!(
        "Polling Telegram as @{}",
        me.username.as_deref().unwrap_or("unknown")
    );

    let mut offset: Option<i64> = None;
    let mut tasks = JoinSet::new();
    loop {
        reap(&mut tasks);
        let updates = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down, waiting for {} messages in progress", tasks.len());
                drain(tasks).await;
                return Ok(());
            }
            updates = telegram.get_updates(offset) => updates,
        };
        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                error!("Unable to fetch updates: {e:#}");
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };
        for update in updates {
            offset = Some(update.update_id + 1);
            if let Some(callback) = &update.callback_query {
                if let Err(e) = telegram.answer_callback(&callback.id).await {
                    warn!("Unable to answer callback {}: {e:#}", callback.id);
                }
            }
            let Some((chat_id, incoming)) = update.incoming() else {
                debug!("Ignoring update {}", update.update_id);
                continue;
            };
            let bot = Arc::clone(&bot);
            let telegram = telegram.clone();
            tasks.spawn(async move {
                if let Some(reply) = bot.handle(&incoming).await {
                    if let Err(e) = telegram.send(chat_id, &reply).await {
                        error!("Unable to reply in chat {chat_id}: {e:#}");
                    }
                }
            });
        }
    }
}

/// Collects handlers that have already finished.
fn reap(tasks: &mut JoinSet<()>) {
    while let Some(result) = tasks.try_join_next() {
        log_join(result);
    }
}

/// Waits for every handler so that no append or recompute is cut off.
async fn drain(mut tasks: JoinSet<()>) {
    while let Some(result) = tasks.join_next().await {
        log_join(result);
    }
}

fn log_join(result: std::result::Result<(), JoinError>) {
    if let Err(e) = result {
        error!("A message handler failed: {e}");
    }
}

/// Splits `text` into messages Telegram accepts. Every part after the first is labelled as a
/// continuation.
pub(crate) fn chunks(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(MAX_MESSAGE_LEN)
        .enumerate()
        .map(|(ix, part)| {
            let part: String = part.iter().collect();
            if ix == 0 {
                part
            } else {
                format!("*LANJUTAN {}*\n\n{part}", ix + 1)
            }
        })
        .collect()
}

fn keyboard(reply: &Reply) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: reply
            .buttons
            .iter()
            .map(|b| {
                vec![InlineKeyboardButton {
                    text: b.label.clone(),
                    callback_data: b.data.clone(),
                }]
            })
            .collect(),
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> Res<T> {
        if !self.ok {
            bail!(
                "Telegram '{method}' failed: {}",
                self.description.as_deref().unwrap_or("no description")
            );
        }
        self.result
            .with_context(|| format!("Telegram '{method}' returned no result"))
    }
}

#[derive(Debug, Serialize)]
struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
struct InlineKeyboardMarkup {
    inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Serialize)]
struct InlineKeyboardButton {
    text: String,
    callback_data: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

impl Update {
    /// The chat to reply in and what the user sent, if this is an update the bot handles.
    pub fn incoming(&self) -> Option<(i64, Incoming)> {
        if let Some(callback) = &self.callback_query {
            let chat_id = callback
                .message
                .as_ref()
                .map(|m| m.chat.id)
                .unwrap_or(callback.from.id);
            let data = callback.data.clone()?;
            return Some((
                chat_id,
                Incoming::Callback {
                    user_id: callback.from.id,
                    data,
                },
            ));
        }
        let message = self.message.as_ref()?;
        let user_id = message.from.as_ref()?.id;
        let text = message.text.clone()?;
        Some((message.chat.id, Incoming::Text { user_id, text }))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}
