use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::client::{MusicApi, MusicClient};
use crate::error::ClientError;

pub const URL_ENV: &str = "MUSIC_ASSISTANT_URL";
pub const TOKEN_ENV: &str = "MUSIC_ASSISTANT_TOKEN";

/// Resolved connection settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub url: String,
    pub token: Option<String>,
}

/// Produces fresh sessions. Abstracted so tests can substitute a scripted
/// connector for the real WebSocket client.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, settings: &Settings) -> Result<Arc<dyn MusicApi>, ClientError>;
}

struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, settings: &Settings) -> Result<Arc<dyn MusicApi>, ClientError> {
        let client = MusicClient::connect(&settings.url, settings.token.as_deref()).await?;
        Ok(client)
    }
}

/// Owns the single shared Music Assistant session for the process.
///
/// `acquire` lazily connects on first use and transparently replaces a stale
/// session. The inner mutex is held across the whole
/// check-liveness/teardown/reconnect sequence, so concurrent callers wait on
/// one in-flight handshake instead of racing a second one. Ordinary commands
/// on an already-live session run outside the lock and may interleave freely.
pub struct ConnectionManager {
    url: Option<String>,
    token: Option<String>,
    connector: Box<dyn Connector>,
    handle: Mutex<Option<Arc<dyn MusicApi>>>,
}

impl ConnectionManager {
    pub fn new(url: Option<String>, token: Option<String>) -> Self {
        Self::with_connector(url, token, Box::new(WsConnector))
    }

    pub(crate) fn with_connector(
        url: Option<String>,
        token: Option<String>,
        connector: Box<dyn Connector>,
    ) -> Self {
        Self {
            url,
            token,
            connector,
            handle: Mutex::new(None),
        }
    }

    /// Explicit parameters win over the environment. Resolution happens per
    /// acquire so a missing URL surfaces as a tool error instead of killing
    /// the server at startup.
    fn resolve_settings(&self) -> Result<Settings, ClientError> {
        let url = self
            .url
            .clone()
            .or_else(|| std::env::var(URL_ENV).ok())
            .ok_or_else(|| {
                ClientError::Config(format!(
                    "Music Assistant URL required. Set the {URL_ENV} environment variable \
                     or pass --url."
                ))
            })?;
        let token = self
            .token
            .clone()
            .or_else(|| std::env::var(TOKEN_ENV).ok());
        Ok(Settings { url, token })
    }

    /// Return the live session, reconnecting first if the current one went
    /// stale. A fresh connect is followed by a full player/queue state fetch
    /// so subsequent reads are non-stale.
    pub async fn acquire(&self) -> Result<Arc<dyn MusicApi>, ClientError> {
        let mut guard = self.handle.lock().await;

        if let Some(api) = guard.as_ref() {
            if api.is_connected() {
                return Ok(api.clone());
            }
            debug!("connection went stale, tearing it down");
            api.disconnect().await;
            *guard = None;
        }

        let settings = self.resolve_settings()?;
        info!(url = %settings.url, "connecting to Music Assistant");
        let api = self.connector.connect(&settings).await?;
        // A session that fails its initial state fetch is never stored, so
        // it must be closed here or its reader task would leak.
        if let Err(e) = api.fetch_state().await {
            api.disconnect().await;
            return Err(e);
        }
        *guard = Some(api.clone());
        Ok(api)
    }

    /// Drop the current session so the next acquire reconnects.
    pub async fn invalidate(&self) {
        let mut guard = self.handle.lock().await;
        if let Some(api) = guard.take() {
            api.disconnect().await;
        }
    }

    /// Close the session and reset to disconnected. Idempotent.
    pub async fn disconnect(&self) {
        self.invalidate().await;
    }

    /// Run one remote operation with a single reconnect-and-retry.
    ///
    /// Connection-class failures invalidate the session, reconnect once and
    /// rerun the operation; a second failure propagates. Configuration and
    /// remote-rejection errors are never retried.
    pub async fn with_reconnect<T, F, Fut>(&self, op: F) -> Result<T, ClientError>
    where
        F: Fn(Arc<dyn MusicApi>) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let api = self.acquire().await?;
        match op(api).await {
            Err(e) if e.is_connection_lost() => {
                warn!(error = %e, "connection lost mid-operation, reconnecting once");
                self.invalidate().await;
                let api = self.acquire().await?;
                op(api).await
            }
            other => other,
        }
    }
}
