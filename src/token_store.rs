use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Durable slot for the last acquired access token. Read once when a client
/// is built, written after every successful acquisition, cleared on revoke.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get_access_token(&self) -> Result<Option<String>>;

    async fn set_access_token(&self, access_token: &str) -> Result<()>;

    async fn clear_access_token(&self) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    access_token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(access_token: impl Into<String>) -> Self {
        MemoryTokenStore {
            access_token: RwLock::new(Some(access_token.into())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get_access_token(&self) -> Result<Option<String>> {
        Ok(self.access_token.read().await.clone())
    }

    async fn set_access_token(&self, access_token: &str) -> Result<()> {
        *self.access_token.write().await = Some(access_token.to_owned());
        Ok(())
    }

    async fn clear_access_token(&self) -> Result<()> {
        *self.access_token.write().await = None;
        Ok(())
    }
}
