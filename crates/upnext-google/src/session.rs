//! Session acquisition for the Google Calendar API.
//!
//! [`SessionProvider`] turns a [`SessionConfig`] into an authenticated
//! [`CalendarClient`], handling the full token lifecycle: a valid cached
//! token is reused directly, an expired token with a refresh token is
//! refreshed silently, and anything else falls back to the interactive
//! browser consent flow. Tokens are persisted through [`TokenStorage`]
//! so consent is a one-time cost per machine.
//!
//! Note that the default configuration requests the full calendar scope
//! even though only reads happen downstream; see
//! [`SessionConfig::scopes`] for narrowing it.

use tracing::{debug, info};

use crate::client::CalendarClient;
use crate::config::{OAuthCredentials, SessionConfig};
use crate::error::{ProviderError, ProviderResult};
use crate::oauth::OAuthFlow;
use crate::tokens::TokenStorage;

/// Provides authenticated calendar clients, managing token state.
#[derive(Debug)]
pub struct SessionProvider {
    config: SessionConfig,
    storage: TokenStorage,
}

impl SessionProvider {
    /// Creates a session provider, loading any persisted token.
    ///
    /// A missing token file is not an error; the first
    /// [`acquire_session`](Self::acquire_session) call will run the
    /// consent flow instead.
    pub fn new(config: SessionConfig) -> ProviderResult<Self> {
        config.validate().map_err(ProviderError::configuration)?;

        let storage = TokenStorage::new(&config.token_path);
        if storage.load()? {
            debug!("loaded persisted tokens from {:?}", storage.path());
        } else {
            debug!("no persisted tokens at {:?}", storage.path());
        }

        Ok(Self { config, storage })
    }

    /// Returns true if a usable (valid or refreshable) token is cached.
    pub fn is_authenticated(&self) -> bool {
        self.storage
            .get()
            .is_some_and(|t| !t.is_expired() || t.is_refreshable())
    }

    /// Returns an authenticated API client, acquiring tokens as needed.
    ///
    /// Uses the cached unexpired access token when one exists, refreshes
    /// silently when the cached token is expired but refreshable, and
    /// runs the interactive browser consent flow only when no usable
    /// token is cached at all. A failed refresh surfaces as an error and
    /// never escalates to the browser. The client secrets file is only
    /// read when a token exchange must run.
    ///
    /// # Errors
    ///
    /// Fails with [`ProviderErrorCode::MissingClientConfig`] when an
    /// exchange is needed but the secrets file is absent, or with the
    /// underlying OAuth error when the exchange itself fails.
    ///
    /// [`ProviderErrorCode::MissingClientConfig`]: crate::error::ProviderErrorCode::MissingClientConfig
    pub async fn acquire_session(&self) -> ProviderResult<CalendarClient> {
        if let Some(tokens) = self.storage.get() {
            if !tokens.is_expired() {
                debug!("using cached access token");
                return CalendarClient::new(tokens.access_token, self.config.timeout);
            }

            if tokens.is_refreshable() {
                info!("access token expired, refreshing");
                let flow = self.oauth_flow()?;
                let refresh_token = tokens.refresh_token.as_deref().unwrap_or_default();
                let (access_token, expires_in) = flow.refresh(refresh_token).await?;
                self.storage
                    .update_access_token(access_token.clone(), expires_in)?;
                return CalendarClient::new(access_token, self.config.timeout);
            }
            debug!("cached token expired and not refreshable");
        }

        info!("no usable token, starting interactive consent");
        let flow = self.oauth_flow()?;
        let tokens = flow
            .consent(&self.config.scopes, self.config.loopback_port_range)
            .await?;
        let access_token = tokens.access_token.clone();
        self.storage.set(tokens)?;

        CalendarClient::new(access_token, self.config.timeout)
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn oauth_flow(&self) -> ProviderResult<OAuthFlow> {
        let credentials = self.load_credentials()?;
        OAuthFlow::new(credentials, self.config.timeout)
    }

    fn load_credentials(&self) -> ProviderResult<OAuthCredentials> {
        let path = &self.config.credentials_path;
        if !path.exists() {
            return Err(ProviderError::missing_client_config(format!(
                "client secrets file not found at {:?}; download it from the \
                 Google Cloud console and place it there",
                path
            )));
        }
        let credentials = OAuthCredentials::from_file(path)?;
        credentials
            .validate()
            .map_err(ProviderError::configuration)?;
        Ok(credentials)
    }
}
