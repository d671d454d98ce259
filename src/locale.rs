//! User-facing strings of the chat bot in each supported language.
//!
//! Reports are always Indonesian, like the data they summarize. Everything else the bot says
//! follows the user's language preference.

use serde::{Deserialize, Serialize};

/// A supported language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Id,
    En,
}

serde_plain::derive_display_from_serialize!(Lang);
serde_plain::derive_fromstr_from_deserialize!(Lang);

/// A message with a fixed text per language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    Welcome,
    LanguageSet,
    LangUsage,
    RecordSuccess,
    RecordError,
    ErrorGeneral,
    Unclear,
    AccessDenied,
    NotConnected,
}

impl Lang {
    pub fn text(self, msg: Msg) -> &'static str {
        match (self, msg) {
            (Lang::Id, Msg::Welcome) => {
                "Selamat datang di Reefficiency Bot! Silakan pilih bahasa yang Anda inginkan."
            }
            (Lang::En, Msg::Welcome) => {
                "Welcome to Reefficiency Bot! Please choose your preferred language."
            }
            (Lang::Id, Msg::LanguageSet) => {
                "Bahasa diatur ke Bahasa Indonesia. Ada yang bisa saya bantu?\n\n\
                Anda bisa meminta saya mencatat transaksi seperti:\n\
                - `Catat pengeluaran untuk makan siang 50 ribu`\n\
                - `Input pemasukan dari proyek freelance 2.5 juta`\n\n\
                Atau meminta laporan:\n\
                - `Tolong laporan bulan ini`\n\
                - `Buatkan laporan tahunan 2024`"
            }
            (Lang::En, Msg::LanguageSet) => {
                "Language set to English. How can I help you today?\n\n\
                You can tell me to log transactions like:\n\
                - `Log expense for lunch 50000`\n\
                - `Record income from freelance project 2.5 million`\n\n\
                Or ask for reports:\n\
                - `Show me the report for this month`\n\
                - `Generate annual report for 2024`"
            }
            (Lang::Id, Msg::LangUsage) => "Gunakan: `/lang id` atau `/lang en`",
            (Lang::En, Msg::LangUsage) => "Usage: `/lang id` or `/lang en`",
            (Lang::Id, Msg::RecordSuccess) => "✅ Transaksi berhasil dicatat.",
            (Lang::En, Msg::RecordSuccess) => "✅ Transaction successfully recorded.",
            (Lang::Id, Msg::RecordError) => "❌ Gagal mencatat transaksi",
            (Lang::En, Msg::RecordError) => "❌ Failed to record the transaction",
            (Lang::Id, Msg::ErrorGeneral) => "❌ Maaf, terjadi kesalahan. Silakan coba lagi.",
            (Lang::En, Msg::ErrorGeneral) => "❌ Sorry, an error occurred. Please try again.",
            (Lang::Id, Msg::Unclear) => {
                "🤔 Maaf, saya tidak mengerti. Coba tulis misalnya `catat pengeluaran bensin 50 ribu` \
                atau `laporan bulan ini`."
            }
            (Lang::En, Msg::Unclear) => {
                "🤔 Sorry, I didn't understand that. Try for example `log expense fuel 50000` or \
                `report for this month`."
            }
            (Lang::Id, Msg::AccessDenied) => "⛔️ Anda tidak diizinkan menggunakan bot ini.",
            (Lang::En, Msg::AccessDenied) => "⛔️ You are not allowed to use this bot.",
            (Lang::Id, Msg::NotConnected) => "❌ Tidak dapat terhubung ke Google Sheets.",
            (Lang::En, Msg::NotConnected) => "❌ Unable to connect to Google Sheets.",
        }
    }

    /// Confirms that `count` transactions were recorded.
    pub fn recorded_many(self, count: usize) -> String {
        match self {
            Lang::Id => format!("✅ {count} transaksi berhasil dicatat."),
            Lang::En => format!("✅ {count} transactions successfully recorded."),
        }
    }

    /// Reports the rows of a batch that could not be recorded.
    pub fn batch_failures(self, failed: usize) -> String {
        match self {
            Lang::Id => format!("⚠️ {failed} transaksi gagal dicatat."),
            Lang::En => format!("⚠️ {failed} transactions could not be recorded."),
        }
    }

    /// The label of the language-selection button.
    pub fn button_label(self) -> &'static str {
        match self {
            Lang::Id => "Bahasa Indonesia 🇮🇩",
            Lang::En => "English 🇬🇧",
        }
    }

    /// The callback data of the language-selection button, e.g. `set_lang_id`.
    pub fn callback_data(self) -> String {
        format!("{CALLBACK_PREFIX}{self}")
    }

    /// Reads callback data produced by `callback_data`.
    pub fn from_callback_data(data: &str) -> Option<Lang> {
        data.strip_prefix(CALLBACK_PREFIX)?.parse().ok()
    }
}

const CALLBACK_PREFIX: &str = "set_lang_";

/// The `/start` greeting in both languages, since the user has not chosen one yet.
pub fn bilingual_welcome() -> String {
    format!(
        "{}\n\n{}",
        Lang::Id.text(Msg::Welcome),
        Lang::En.text(Msg::Welcome)
    )
}
