//! Service account authentication for the Google Sheets and Drive APIs.
//!
//! The bot runs unattended, so instead of an interactive OAuth consent flow it signs in with a
//! service account key (the JSON file downloaded from the Google Cloud console). The spreadsheet
//! must be shared with the service account's email address.

use crate::api::OAUTH_SCOPES;
use crate::error::Res;
use anyhow::Context;
use std::path::Path;
use tracing::{debug, trace};
use yup_oauth2::{AccessToken, ServiceAccountKey};

/// Hands out access tokens, minting a new one when the cached token has expired.
pub(crate) struct TokenProvider {
    key: ServiceAccountKey,
    token: Option<AccessToken>,
}

impl TokenProvider {
    /// Loads the service account key from `path`.
    pub(crate) async fn load(path: &Path) -> Res<Self> {
        let key = yup_oauth2::read_service_account_key(path)
            .await
            .with_context(|| {
                format!("Failed to read service account key at {}", path.display())
            })?;
        debug!(
            "Loaded service account key for {}",
            key.client_email.as_str()
        );
        Ok(Self { key, token: None })
    }

    /// The email address the spreadsheet must be shared with.
    pub(crate) fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Returns a valid access token, refreshing it if needed.
    pub(crate) async fn token(&mut self) -> Res<String> {
        if let Some(token) = self.token.as_ref().filter(|t| !t.is_expired()) {
            if let Some(s) = token.token() {
                trace!("Using cached access token");
                return Ok(s.to_string());
            }
        }

        debug!("Requesting a new access token for {}", self.client_email());
        let auth = yup_oauth2::ServiceAccountAuthenticator::builder(self.key.clone())
            .build()
            .await
            .context("Failed to create the service account authenticator")?;
        let token = auth
            .token(OAUTH_SCOPES)
            .await
            .context("Failed to obtain an access token")?;
        let access = token
            .token()
            .context("The access token response did not contain a token")?
            .to_string();
        if let Some(expiry) = token.expiration_time() {
            debug!("Access token valid until {expiry}");
        }
        self.token = Some(token);
        Ok(access)
    }
}
