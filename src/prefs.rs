//! Per-user preferences. Only the language is stored.

use crate::error::Res;
use crate::locale::Lang;
use crate::utils;
use anyhow::Context;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Where the bot keeps each user's language.
#[async_trait::async_trait]
pub trait PreferenceStore: Send + Sync {
    /// The user's language, `Lang::default()` if none was chosen.
    async fn language(&self, user_id: i64) -> Lang;

    async fn set_language(&self, user_id: i64, lang: Lang) -> Res<()>;
}

/// Preferences that last as long as the process.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    languages: Mutex<BTreeMap<i64, Lang>>,
}

#[async_trait::async_trait]
impl PreferenceStore for MemoryPreferences {
    async fn language(&self, user_id: i64) -> Lang {
        self.languages
            .lock()
            .await
            .get(&user_id)
            .copied()
            .unwrap_or_default()
    }

    async fn set_language(&self, user_id: i64, lang: Lang) -> Res<()> {
        self.languages.lock().await.insert(user_id, lang);
        Ok(())
    }
}

/// Preferences stored as a JSON object (`{"123456": "en"}`) in a file. The file is read once
/// when opened and rewritten on every change.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    languages: Mutex<BTreeMap<i64, Lang>>,
}

impl FilePreferences {
    /// Opens the file at `path`. A missing file means no preferences yet.
    pub async fn open(path: impl Into<PathBuf>) -> Res<Self> {
        let path = path.into();
        let languages = if path.is_file() {
            utils::deserialize(&path).await?
        } else {
            debug!("No preferences file at {}", path.display());
            BTreeMap::new()
        };
        Ok(Self {
            path,
            languages: Mutex::new(languages),
        })
    }
}

#[async_trait::async_trait]
impl PreferenceStore for FilePreferences {
    async fn language(&self, user_id: i64) -> Lang {
        self.languages
            .lock()
            .await
            .get(&user_id)
            .copied()
            .unwrap_or_default()
    }

    async fn set_language(&self, user_id: i64, lang: Lang) -> Res<()> {
        let mut languages = self.languages.lock().await;
        languages.insert(user_id, lang);
        let json = serde_json::to_string_pretty(&*languages)
            .context("Unable to serialize preferences")?;
        utils::write(&self.path, json)
            .await
            .context("Unable to save preferences")?;
        info!("User {user_id} chose language '{lang}'");
        Ok(())
    }
}
