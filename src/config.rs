//! Configuration file handling.
//!
//! The configuration file is stored at `$REEF_HOME/config.json` and names the Google spreadsheet,
//! the service account key used to reach it and the Telegram users allowed to talk to the bot.
//! Secrets that are not files (the bot token, the Gemini API key) come from the environment.

use crate::error::{IntoResult, Res};
use crate::{ErrorType, Result};
use crate::utils;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "reefficiency";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const SERVICE_ACCOUNT_JSON: &str = "service_account.json";
const CONFIG_JSON: &str = "config.json";
const PREFERENCES_JSON: &str = "preferences.json";
pub(crate) const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$REEF_HOME` and from there it loads `$REEF_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    spreadsheet_id: Option<String>,
}

impl Config {
    /// Creates the home directory, its subdirectories and:
    /// - Creates an initial `config.json` file
    /// - Copies `service_account_file` into its default location in the home directory.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the home directory, e.g. `$HOME/reefficiency`
    /// - `service_account_file` - The service account key JSON downloaded from Google Cloud.
    /// - `sheet_name` - The title of the spreadsheet. Used to find the spreadsheet when
    ///   `sheet_url` is not given.
    /// - `sheet_url` - Optionally, the URL of the spreadsheet, e.g.
    ///   https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    /// - `allowed_user_ids` - Telegram user ids allowed to use the bot.
    pub async fn create(
        dir: impl Into<PathBuf>,
        service_account_file: &Path,
        sheet_name: &str,
        sheet_url: Option<&str>,
        allowed_user_ids: Vec<i64>,
    ) -> Res<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets_dir = root.join(SECRETS);
        utils::make_dir(&secrets_dir).await?;
        utils::copy(service_account_file, secrets_dir.join(SERVICE_ACCOUNT_JSON)).await?;

        let spreadsheet_id = match sheet_url {
            Some(url) => Some(
                extract_spreadsheet_id(url)
                    .context("Failed to extract spreadsheet ID from sheet URL")?
                    .to_string(),
            ),
            None => None,
        };

        let config_file = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_name: sheet_name.to_string(),
            sheet_url: sheet_url.map(str::to_string),
            service_account_path: None,
            allowed_user_ids,
            gemini_model: None,
        };
        let config_path = root.join(CONFIG_JSON);
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets: secrets_dir,
            config_path,
            config_file,
            spreadsheet_id,
        })
    }

    /// This will
    /// - validate that the home directory and the config file exist
    /// - load the config file
    /// - validate that the secrets directory exists
    /// - return the loaded configuration object
    ///
    /// # Errors
    /// - Returns a `Config` error if anything is missing or the config file cannot be parsed.
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        Self::read(home.into()).await.pub_result(ErrorType::Config)
    }

    async fn read(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The home directory is missing, run 'reef init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let spreadsheet_id = match config_file.sheet_url.as_deref() {
            Some(url) if !url.trim().is_empty() => Some(
                extract_spreadsheet_id(url)
                    .context("Failed to extract spreadsheet ID from sheet URL")?
                    .to_string(),
            ),
            _ => None,
        };

        let config = Self {
            secrets: root.join(SECRETS),
            root,
            config_path,
            config_file,
            spreadsheet_id,
        };
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn sheet_name(&self) -> &str {
        &self.config_file.sheet_name
    }

    pub fn sheet_url(&self) -> Option<&str> {
        self.config_file.sheet_url.as_deref()
    }

    /// The spreadsheet id, if a sheet URL was configured.
    pub fn spreadsheet_id(&self) -> Option<&str> {
        self.spreadsheet_id.as_deref()
    }

    /// Identifies the spreadsheet: its id when known, otherwise its name.
    pub fn sheet_key(&self) -> &str {
        self.spreadsheet_id().unwrap_or(self.sheet_name())
    }

    pub fn allowed_user_ids(&self) -> &[i64] {
        &self.config_file.allowed_user_ids
    }

    pub fn gemini_model(&self) -> &str {
        self.config_file
            .gemini_model
            .as_deref()
            .unwrap_or(DEFAULT_GEMINI_MODEL)
    }

    /// Where per-user preferences are persisted.
    pub fn preferences_path(&self) -> PathBuf {
        self.root.join(PREFERENCES_JSON)
    }

    /// Returns the stored `service_account_path` if it is absolute, otherwise resolves the
    /// relative path against the home directory.
    pub fn service_account_path(&self) -> PathBuf {
        let p = self.config_file.service_account_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "reefficiency",
///   "config_version": 1,
///   "sheet_name": "Keuangan Keluarga",
///   "sheet_url": "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
///   "service_account_path": ".secrets/service_account.json",
///   "allowed_user_ids": [123456789],
///   "gemini_model": "gemini-1.5-flash-latest"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "reefficiency"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// The title of the spreadsheet
    sheet_name: String,

    /// URL of the spreadsheet. When absent the spreadsheet is found by `sheet_name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sheet_url: Option<String>,

    /// Path to the service account key (optional, relative to the home directory or absolute).
    /// Defaults to $REEF_HOME/.secrets/service_account.json if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    service_account_path: Option<PathBuf>,

    /// Telegram user ids allowed to use the bot. Empty means nobody.
    #[serde(default)]
    allowed_user_ids: Vec<i64>,

    /// The Gemini model used for intent extraction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gemini_model: Option<String>,
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            !config.sheet_name.trim().is_empty() || config.sheet_url.is_some(),
            "The config file must name the spreadsheet with sheet_name or sheet_url"
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    fn service_account_path(&self) -> PathBuf {
        self.service_account_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(SERVICE_ACCOUNT_JSON))
    }
}

/// Extracts the spreadsheet ID from a Google Sheets URL
///
/// # Arguments
/// * `url` - The Google Sheets URL (e.g., "https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...")
fn extract_spreadsheet_id(url: &str) -> Res<&str> {
    // URL format: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...
    // or: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID?foo=bar
    let parts: Vec<&str> = url.split('/').collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "d" && i + 1 < parts.len() {
            let id_part = parts[i + 1];
            let id = id_part
                .split(['?', '#'])
                .next()
                .unwrap_or(id_part);
            if id.is_empty() {
                break;
            }
            return Ok(id);
        }
    }
    Err(anyhow::anyhow!(
        "Invalid Google Sheets URL format. Expected: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("reef_home");
        let key_file = dir.path().join("key.json");
        let key_content = r#"{"type": "service_account"}"#;
        let sheet_url = "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL/edit";
        utils::write(&key_file, key_content).await.unwrap();

        let config = Config::create(
            &home_dir,
            &key_file,
            "Keuangan",
            Some(sheet_url),
            vec![42],
        )
        .await
        .unwrap();

        assert_eq!(Some(sheet_url), config.sheet_url());
        assert_eq!(
            Some("7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL"),
            config.spreadsheet_id()
        );
        assert_eq!(config.sheet_key(), "7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL");
        assert_eq!(config.allowed_user_ids(), &[42]);
        assert_eq!(config.gemini_model(), DEFAULT_GEMINI_MODEL);

        let found = utils::read(&config.service_account_path()).await.unwrap();
        assert_eq!(key_content, found);
        assert!(config.secrets().is_dir());
        // The original key file is copied, not moved.
        assert!(key_file.is_file());
    }

    #[tokio::test]
    async fn test_config_create_then_load() {
        let dir = TempDir::new().unwrap();
        let key_file = dir.path().join("key.json");
        utils::write(&key_file, "{}").await.unwrap();
        let created = Config::create(dir.path(), &key_file, "Keuangan", None, vec![])
            .await
            .unwrap();
        assert_eq!(created.spreadsheet_id(), None);
        assert_eq!(created.sheet_key(), "Keuangan");

        let loaded = Config::load(dir.path()).await.unwrap();
        assert_eq!(loaded.sheet_name(), "Keuangan");
        assert_eq!(loaded.sheet_url(), None);
        assert!(loaded.allowed_user_ids().is_empty());
        assert_eq!(loaded.root(), created.root());
        assert!(loaded.preferences_path().ends_with(PREFERENCES_JSON));
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("nope")).await.unwrap_err();
        assert!(err.to_string().contains("reef init"));
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "reefficiency",
            "config_version": 1,
            "sheet_name": "Keuangan"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config.sheet_name, "Keuangan");
        assert!(config.allowed_user_ids.is_empty());
        assert_eq!(
            config.service_account_path(),
            PathBuf::from(SECRETS).join(SERVICE_ACCOUNT_JSON)
        );
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "budget-bot",
            "config_version": 1,
            "sheet_name": "Keuangan"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let t = TempDir::new().unwrap();
        let path = t.path().join("file.json");
        let original = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_name: "Keuangan".to_string(),
            sheet_url: None,
            service_account_path: Some(PathBuf::from("/etc/reef/key.json")),
            allowed_user_ids: vec![1, 2],
            gemini_model: Some("gemini-2.0-flash".to_string()),
        };
        original.save(&path).await.unwrap();
        let read = ConfigFile::load(&path).await.unwrap();
        assert_eq!(original, read);

        let json = utils::read(&path).await.unwrap();
        assert!(!json.contains("sheet_url"));
    }

    #[test]
    fn test_extract_spreadsheet_id() {
        let url = "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL/edit";
        let id = extract_spreadsheet_id(url).unwrap();
        assert_eq!(id, "7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL");

        let url = "https://docs.google.com/spreadsheets/d/ABC123?foo=bar";
        assert_eq!(extract_spreadsheet_id(url).unwrap(), "ABC123");

        let url = "https://docs.google.com/spreadsheets/d/ABC123#gid=0";
        assert_eq!(extract_spreadsheet_id(url).unwrap(), "ABC123");

        assert!(extract_spreadsheet_id("https://example.com/invalid").is_err());
        assert!(extract_spreadsheet_id("").is_err());
    }
}
