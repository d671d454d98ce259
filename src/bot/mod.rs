//! The chat orchestrator.
//!
//! `Bot` turns one inbound message into at most one reply. Slash commands are parsed locally;
//! everything else goes through the `IntentExtractor`. Every failure ends up as reply text, so a
//! user always hears back.

mod access;
mod command;

pub use access::AccessList;
pub use command::{parse_dashboard, parse_record, parse_report, Command, Rejection};

use crate::intent::{Intent, IntentExtractor, RecordEntities};
use crate::locale::{bilingual_welcome, Lang, Msg};
use crate::model::{month_name, Transaction, TransactionKind, DATE_FORMAT};
use crate::prefs::PreferenceStore;
use crate::store::{DashboardStatus, Store};
use crate::{report, Error, ErrorType};
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Something a user sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A text message, command or not.
    Text { user_id: i64, text: String },
    /// A press on an inline keyboard button.
    Callback { user_id: i64, data: String },
}

impl Incoming {
    pub fn user_id(&self) -> i64 {
        match self {
            Incoming::Text { user_id, .. } | Incoming::Callback { user_id, .. } => *user_id,
        }
    }
}

/// An inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

/// What the bot says back. Text uses Telegram Markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub buttons: Vec<Button>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }
}

pub struct Bot {
    store: Arc<Mutex<Store>>,
    extractor: Arc<dyn IntentExtractor>,
    access: AccessList,
    prefs: Arc<dyn PreferenceStore>,
}

impl Bot {
    pub fn new(
        store: Store,
        extractor: Arc<dyn IntentExtractor>,
        access: AccessList,
        prefs: Arc<dyn PreferenceStore>,
    ) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            extractor,
            access,
            prefs,
        }
    }

    /// Connects to the spreadsheet ahead of the first message. A failure is logged and the
    /// connection is retried on the next message.
    pub async fn connect(&self) -> bool {
        let connected = self.store.lock().await.ensure_connection().await;
        if !connected {
            warn!("The spreadsheet is not reachable yet, will retry on the next message");
        }
        connected
    }

    /// Handles `incoming` as of today.
    pub async fn handle(&self, incoming: &Incoming) -> Option<Reply> {
        self.handle_at(incoming, Local::now().date_naive()).await
    }

    /// Handles `incoming` as if the current date were `today`. Returns `None` only for callbacks
    /// the bot does not know.
    pub async fn handle_at(&self, incoming: &Incoming, today: NaiveDate) -> Option<Reply> {
        let user_id = incoming.user_id();
        if !self.access.is_allowed(user_id) {
            return Some(Reply::text(Lang::Id.text(Msg::AccessDenied)));
        }
        match incoming {
            Incoming::Callback { data, .. } => match Lang::from_callback_data(data) {
                Some(lang) => Some(self.set_language(user_id, lang).await),
                None => {
                    debug!("Ignoring unknown callback '{data}' from {user_id}");
                    None
                }
            },
            Incoming::Text { text, .. } => Some(match Command::parse(text) {
                Some(command) => self.on_command(user_id, command, today).await,
                None => self.on_text(user_id, text, today).await,
            }),
        }
    }

    async fn on_command(&self, user_id: i64, command: Command, today: NaiveDate) -> Reply {
        debug!("Command from {user_id}: {command:?}");
        let lang = self.prefs.language(user_id).await;
        match command {
            Command::Start => Reply {
                text: bilingual_welcome(),
                buttons: [Lang::Id, Lang::En]
                    .into_iter()
                    .map(|l| Button {
                        label: l.button_label().to_string(),
                        data: l.callback_data(),
                    })
                    .collect(),
            },
            Command::Lang(args) => match args.first().and_then(|a| a.parse::<Lang>().ok()) {
                Some(lang) => self.set_language(user_id, lang).await,
                None => Reply::text(lang.text(Msg::LangUsage)),
            },
            Command::Record(args) => match parse_record(&args, today) {
                Ok(transaction) => {
                    let result = self.store.lock().await.add_transaction(&transaction).await;
                    match result {
                        Ok(recorded) => {
                            info!("User {user_id} recorded a transaction in '{}'", recorded.partition);
                            with_dashboard_warning(recorded_details(&transaction), &recorded.dashboard)
                        }
                        Err(e) => record_failed(lang, &e),
                    }
                }
                Err(rejection) => Reply::text(rejection.message()),
            },
            Command::Report(args) => match parse_report(&args, today) {
                Ok(period) => {
                    let mut store = self.store.lock().await;
                    Reply::text(report::render(&mut store, period).await)
                }
                Err(rejection) => Reply::text(rejection.message()),
            },
            Command::Dashboard(args) => match parse_dashboard(&args, today) {
                Ok(selection) => {
                    let mut store = self.store.lock().await;
                    let result = match selection {
                        Some((year, month)) => store.select_dashboard_period(year, month).await,
                        None => store.update_dashboard().await,
                    };
                    match result {
                        Ok(status) => dashboard_updated(&status),
                        Err(e) => failed(lang, &e),
                    }
                }
                Err(rejection) => Reply::text(rejection.message()),
            },
            Command::Unknown(name) => {
                debug!("Unknown command '/{name}' from {user_id}");
                Reply::text(lang.text(Msg::Unclear))
            }
        }
    }

    async fn on_text(&self, user_id: i64, text: &str, today: NaiveDate) -> Reply {
        info!("Message from {user_id}: '{text}'");
        let lang = self.prefs.language(user_id).await;
        let intent = self.extractor.extract(text, today).await;
        debug!("Intent for {user_id}: {intent:?}");
        match intent {
            Intent::Record(entities) => self.record(lang, &entities, today).await,
            Intent::Report(entities) => match entities.to_period(today) {
                Ok(period) => {
                    let mut store = self.store.lock().await;
                    Reply::text(report::render(&mut store, period).await)
                }
                Err(e) => Reply::text(format!("❌ Gagal membuat laporan: {e}")),
            },
            Intent::Unclear => {
                warn!("Could not understand the message from {user_id}: '{text}'");
                Reply::text(lang.text(Msg::Unclear))
            }
            Intent::Error { details } => {
                error!("Intent extraction failed for {user_id}: {details}");
                Reply::text(lang.text(Msg::ErrorGeneral))
            }
        }
    }

    async fn record(&self, lang: Lang, entities: &RecordEntities, today: NaiveDate) -> Reply {
        let mut transactions = Vec::new();
        let mut rejected = Vec::new();
        for entity in entities.entities() {
            match entity.to_transaction(today) {
                Ok(transaction) => transactions.push(transaction),
                Err(e) => {
                    warn!("Dropping an extracted transaction: {e:#}");
                    rejected.push(format!("{e:#}"));
                }
            }
        }

        if !entities.is_multiple() {
            let Some(transaction) = transactions.first() else {
                let reason = rejected.join(", ");
                return Reply::text(format!("{}: {reason}", lang.text(Msg::RecordError)));
            };
            let result = self.store.lock().await.add_transaction(transaction).await;
            return match result {
                Ok(recorded) => {
                    with_dashboard_warning(lang.text(Msg::RecordSuccess), &recorded.dashboard)
                }
                Err(e) => record_failed(lang, &e),
            };
        }

        if transactions.is_empty() {
            return Reply::text(lang.text(Msg::RecordError));
        }
        let result = self.store.lock().await.add_transactions(&transactions).await;
        match result {
            Ok(batch) if batch.written.is_empty() => Reply::text(lang.text(Msg::RecordError)),
            Ok(batch) => {
                let mut text = lang.recorded_many(batch.written.len());
                let failed = rejected.len() + batch.failures.len();
                if failed > 0 {
                    text = format!("{text}\n{}", lang.batch_failures(failed));
                }
                match &batch.dashboard {
                    Some(dashboard) => with_dashboard_warning(text, dashboard),
                    None => Reply::text(text),
                }
            }
            Err(e) => record_failed(lang, &e),
        }
    }

    async fn set_language(&self, user_id: i64, lang: Lang) -> Reply {
        match self.prefs.set_language(user_id, lang).await {
            Ok(()) => Reply::text(lang.text(Msg::LanguageSet)),
            Err(e) => {
                error!("Unable to save the language of {user_id}: {e:#}");
                Reply::text(lang.text(Msg::ErrorGeneral))
            }
        }
    }
}

fn kind_label(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Income => "Pemasukan",
        TransactionKind::Expense => "Pengeluaran",
    }
}

fn recorded_details(transaction: &Transaction) -> String {
    format!(
        "✅ Berhasil dicatat:\nJenis: {}\nKategori: {}\nJumlah: {}\nDeskripsi: {}\nTanggal: {}",
        kind_label(transaction.kind()),
        transaction.category(),
        transaction.amount(),
        transaction.description(),
        transaction.date().format(DATE_FORMAT),
    )
}

fn with_dashboard_warning(text: impl Into<String>, dashboard: &DashboardStatus) -> Reply {
    let text = text.into();
    if dashboard.is_complete() {
        return Reply::text(text);
    }
    let steps: Vec<String> = dashboard
        .failures
        .iter()
        .map(|f| f.step.to_string())
        .collect();
    Reply::text(format!(
        "{text}\n⚠️ Dashboard belum sepenuhnya diperbarui ({}).",
        steps.join(", ")
    ))
}

fn dashboard_updated(status: &DashboardStatus) -> Reply {
    let period = match status.selection.month {
        Some(month) => format!("{} {}", month_name(month), status.selection.year),
        None => status.selection.year.to_string(),
    };
    with_dashboard_warning(format!("✅ Dashboard diperbarui untuk {period}."), status)
}

fn record_failed(lang: Lang, e: &Error) -> Reply {
    match e.error_type() {
        ErrorType::Validation => Reply::text(format!("{}: {e}", lang.text(Msg::RecordError))),
        _ => failed(lang, e),
    }
}

fn failed(lang: Lang, e: &Error) -> Reply {
    error!("{e}");
    match e.error_type() {
        ErrorType::Connection => Reply::text(lang.text(Msg::NotConnected)),
        _ => Reply::text(lang.text(Msg::ErrorGeneral)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryPreferences;
    use crate::test::TestEnv;
    use crate::Mode;
    use serde_json::json;

    struct FixedIntent(Intent);

    #[async_trait::async_trait]
    impl IntentExtractor for FixedIntent {
        async fn extract(&self, _text: &str, _today: NaiveDate) -> Intent {
            self.0.clone()
        }
    }

    const USER: i64 = 42;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn bot(env: &TestEnv, intent: Intent) -> Bot {
        Bot::new(
            Store::new(env.config(), Mode::Testing),
            Arc::new(FixedIntent(intent)),
            AccessList::new([USER]),
            Arc::new(MemoryPreferences::default()),
        )
    }

    fn text(s: &str) -> Incoming {
        Incoming::Text {
            user_id: USER,
            text: s.to_string(),
        }
    }

    async fn say(bot: &Bot, s: &str) -> String {
        bot.handle_at(&text(s), today()).await.unwrap().text
    }

    #[tokio::test]
    async fn test_access_denied() {
        let env = TestEnv::new().await;
        let bot = bot(&env, Intent::Unclear);
        let incoming = Incoming::Text {
            user_id: 7,
            text: "/start".to_string(),
        };
        let reply = bot.handle_at(&incoming, today()).await.unwrap();
        assert_eq!(reply.text, "⛔️ Anda tidak diizinkan menggunakan bot ini.");
        assert!(env.get_state().tabs.is_empty());
    }

    #[tokio::test]
    async fn test_start_and_language_callback() {
        let env = TestEnv::new().await;
        let bot = bot(&env, Intent::Unclear);
        let reply = bot.handle_at(&text("/start"), today()).await.unwrap();
        assert_eq!(reply.text, bilingual_welcome());
        assert_eq!(reply.buttons.len(), 2);
        assert_eq!(reply.buttons[1].data, "set_lang_en");

        let callback = Incoming::Callback {
            user_id: USER,
            data: "set_lang_en".to_string(),
        };
        let reply = bot.handle_at(&callback, today()).await.unwrap();
        assert!(reply.text.starts_with("Language set to English."));
        assert_eq!(
            say(&bot, "hello").await,
            Lang::En.text(Msg::Unclear),
            "later replies follow the chosen language"
        );

        let unknown = Incoming::Callback {
            user_id: USER,
            data: "something".to_string(),
        };
        assert!(bot.handle_at(&unknown, today()).await.is_none());
    }

    #[tokio::test]
    async fn test_lang_command() {
        let env = TestEnv::new().await;
        let bot = bot(&env, Intent::Unclear);
        assert_eq!(say(&bot, "/lang").await, Lang::Id.text(Msg::LangUsage));
        assert_eq!(say(&bot, "/lang en").await, Lang::En.text(Msg::LanguageSet));
        assert_eq!(say(&bot, "/foo").await, Lang::En.text(Msg::Unclear));
    }

    #[tokio::test]
    async fn test_catat_command_writes_row() {
        let env = TestEnv::new().await;
        let bot = bot(&env, Intent::Unclear);
        let reply = say(&bot, "/catat pengeluaran transportation 150.000 bensin 2025-06-10").await;
        assert_eq!(
            reply,
            "✅ Berhasil dicatat:\nJenis: Pengeluaran\nKategori: transportation\n\
            Jumlah: Rp 150,000\nDeskripsi: bensin\nTanggal: 2025-06-10"
        );
        let values = env.get_state().values("6/25");
        assert_eq!(
            values[1],
            vec!["2025-06-10", "transportation", "bensin", "", "150000"]
        );
    }

    #[tokio::test]
    async fn test_catat_command_usage() {
        let env = TestEnv::new().await;
        let bot = bot(&env, Intent::Unclear);
        let reply = say(&bot, "/catat pengeluaran").await;
        assert!(reply.starts_with("Format salah."), "{reply}");
        assert!(env.get_state().tab("6/25").is_none());
    }

    #[tokio::test]
    async fn test_free_text_single_record() {
        let env = TestEnv::new().await;
        let intent = Intent::from_json(json!({
            "intent": "catat",
            "entities": {
                "transaction_type": "expense",
                "category": "food_dining",
                "amount": 50000,
                "description": "makan siang",
                "date": null
            }
        }));
        let bot = bot(&env, intent);
        assert_eq!(
            say(&bot, "catat makan siang 50 ribu").await,
            "✅ Transaksi berhasil dicatat."
        );
        let values = env.get_state().values("6/25");
        assert_eq!(
            values[1],
            vec!["2025-06-15", "food_dining", "makan siang", "", "50000"]
        );
    }

    #[tokio::test]
    async fn test_free_text_single_record_missing_amount() {
        let env = TestEnv::new().await;
        let intent = Intent::from_json(json!({
            "intent": "catat",
            "entities": {"transaction_type": "expense", "category": "food_dining"}
        }));
        let bot = bot(&env, intent);
        let reply = say(&bot, "catat makan").await;
        assert_eq!(reply, "❌ Gagal mencatat transaksi: Missing amount");
    }

    #[tokio::test]
    async fn test_free_text_multiple_records() {
        let env = TestEnv::new().await;
        let intent = Intent::from_json(json!({
            "intent": "catat",
            "entities": {"transactions": [
                {"transaction_type": "expense", "category": "shopping_clothing", "amount": 100000, "description": "baju"},
                {"transaction_type": "expense", "category": "shopping_clothing", "amount": 50000, "description": "celana"},
                {"transaction_type": "expense", "category": "shopping_clothing", "description": "topi"}
            ]}
        }));
        let bot = bot(&env, intent);
        assert_eq!(
            say(&bot, "beli baju dan celana").await,
            "✅ 2 transaksi berhasil dicatat.\n⚠️ 1 transaksi gagal dicatat."
        );
        let values = env.get_state().values("6/25");
        assert_eq!(values.len(), 3);
        assert_eq!(values[2][2], "celana");
    }

    #[tokio::test]
    async fn test_free_text_report() {
        let env = TestEnv::new().await;
        let intent = Intent::from_json(json!({
            "intent": "laporan",
            "entities": {"period": "monthly", "year": 2025, "month": 6}
        }));
        let bot = bot(&env, intent);
        say(&bot, "/catat pengeluaran transportation 150000 2025-06-10").await;
        let reply = say(&bot, "laporan bulan ini").await;
        assert!(reply.starts_with("📊 *LAPORAN BULANAN - JUNI 2025*"), "{reply}");
        assert!(reply.contains("transportation: Rp 150,000 (100.0%)"), "{reply}");
    }

    #[tokio::test]
    async fn test_laporan_command() {
        let env = TestEnv::new().await;
        let bot = bot(&env, Intent::Unclear);
        assert!(say(&bot, "/laporan").await.starts_with("Format salah."));
        assert_eq!(
            say(&bot, "/laporan mei 2025").await,
            "📊 Tidak ada data transaksi untuk Mei 2025."
        );
        assert_eq!(
            say(&bot, "/laporan 2024").await,
            "📊 Tidak ada data transaksi untuk tahun 2024."
        );
    }

    #[tokio::test]
    async fn test_unclear_and_error_intents() {
        let env = TestEnv::new().await;
        let bot_unclear = bot(&env, Intent::Unclear);
        assert_eq!(say(&bot_unclear, "halo").await, Lang::Id.text(Msg::Unclear));
        let bot_error = bot(
            &env,
            Intent::Error {
                details: "boom".to_string(),
            },
        );
        assert_eq!(say(&bot_error, "halo").await, Lang::Id.text(Msg::ErrorGeneral));
    }

    #[tokio::test]
    async fn test_offline_store() {
        let env = TestEnv::new().await;
        let mut state = env.get_state();
        state.offline = true;
        env.set_state(state);
        let bot = bot(&env, Intent::Unclear);
        assert!(!bot.connect().await);
        assert_eq!(
            say(&bot, "/catat pengeluaran makan 1000").await,
            Lang::Id.text(Msg::NotConnected)
        );
        assert_eq!(
            say(&bot, "/laporan juni").await,
            "❌ Tidak dapat terhubung ke Google Sheets untuk mengambil data laporan."
        );
    }

    #[tokio::test]
    async fn test_dashboard_command() {
        let env = TestEnv::new().await;
        let bot = bot(&env, Intent::Unclear);
        assert_eq!(
            say(&bot, "/dashboard maret 2024").await,
            "✅ Dashboard diperbarui untuk Maret 2024."
        );
        let values = env.get_state().values(crate::store::DASHBOARD);
        assert_eq!(values[2][1], "2024");
        assert_eq!(values[3][1], "Maret");
        assert_eq!(
            say(&bot, "/dashboard 2023").await,
            "✅ Dashboard diperbarui untuk 2023."
        );
    }
}
