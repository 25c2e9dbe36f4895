use crate::auth::LoopbackAuthenticator;
use crate::endpoint::Endpoints;
use crate::error::{Error, Result};
use crate::token_store::TokenStore;
use async_trait::async_trait;
use serde_derive::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::RwLock;

pub const CLIENT_ID_ENV: &str = "GAPPDATA_CLIENT_ID";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // plain values go before the tables in toml
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub client_id: String,
    pub redirect_port: u16,
    /// Seconds to wait for the user to finish the consent page. 0 waits forever.
    pub consent_timeout_secs: u64,
    /// Seconds before a single api request is abandoned. 0 disables the limit.
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            client_id: String::new(),
            redirect_port: crate::auth::DEFAULT_PORT,
            consent_timeout_secs: 300,
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    fn seconds(value: u64) -> Option<Duration> {
        (value > 0).then(|| Duration::from_secs(value))
    }

    pub fn consent_timeout(&self) -> Option<Duration> {
        Self::seconds(self.consent_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        Self::seconds(self.request_timeout_secs)
    }

    pub fn authenticator(&self) -> LoopbackAuthenticator {
        LoopbackAuthenticator::new()
            .port(self.redirect_port)
            .consent_timeout(self.consent_timeout())
    }
}

/// A toml config file kept in memory and written back on every change. It
/// doubles as the durable token slot of the client.
#[derive(Debug)]
pub struct ConfigFile {
    path: PathBuf,
    config: RwLock<Config>,
}

impl ConfigFile {
    /// Load `path`, or create it with defaults when it does not exist. A file
    /// that exists but does not parse is an error and is left untouched.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if tokio::fs::metadata(&path).await.is_ok() {
            let config = Self::load(&path).await?;
            return Ok(ConfigFile {
                path,
                config: RwLock::new(config),
            });
        }
        let file = ConfigFile {
            path,
            config: RwLock::new(Config::default()),
        };
        file.save().await?;
        Ok(file)
    }

    async fn load(path: &Path) -> Result<Config> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Config(format!("read {} failed: {}", path.display(), e)))?;
        toml::from_str(&text)
            .map_err(|e| Error::Config(format!("parse {} failed: {}", path.display(), e)))
    }

    pub async fn save(&self) -> Result<()> {
        let text = {
            let config = self.config.read().await;
            toml::to_string(&*config).map_err(|e| Error::Config(e.to_string()))?
        };
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|e| Error::Config(format!("write {} failed: {}", self.path.display(), e)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get_config(&self) -> Config {
        self.config.read().await.clone()
    }

    /// The app section, with the client id taken from the environment when
    /// `GAPPDATA_CLIENT_ID` is set.
    pub async fn get_app_config(&self) -> AppConfig {
        let mut app = self.config.read().await.app.clone();
        if let Ok(client_id) = std::env::var(CLIENT_ID_ENV) {
            if !client_id.is_empty() {
                app.client_id = client_id;
            }
        }
        app
    }

    pub async fn set_app_config(&self, app: AppConfig) -> Result<()> {
        self.config.write().await.app = app;
        self.save().await
    }

    pub async fn get_endpoints(&self) -> Endpoints {
        self.config.read().await.endpoints.clone()
    }
}

#[async_trait]
impl TokenStore for ConfigFile {
    async fn get_access_token(&self) -> Result<Option<String>> {
        Ok(self.config.read().await.access_token.clone())
    }

    async fn set_access_token(&self, access_token: &str) -> Result<()> {
        self.config.write().await.access_token = Some(access_token.to_owned());
        self.save()
            .await
            .map_err(|e| Error::TokenStore(e.to_string()))
    }

    async fn clear_access_token(&self) -> Result<()> {
        self.config.write().await.access_token = None;
        self.save()
            .await
            .map_err(|e| Error::TokenStore(e.to_string()))
    }
}
