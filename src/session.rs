use crate::transport::RawResponse;
use tokio::sync::{Mutex, MutexGuard, RwLock};

/// Per-client authentication state, owned by one `AppDataClient`.
///
/// The token lock is only held for a read or a write, never across a consent
/// flow. Acquisitions are serialized by a separate guard so overlapping
/// callers wait for the one in-flight flow instead of starting their own.
#[derive(Debug)]
pub struct Session {
    client_id: String,
    access_token: RwLock<Option<String>>,
    acquiring: Mutex<()>,
    last_response: RwLock<Option<RawResponse>>,
}

impl Session {
    pub fn new(client_id: impl Into<String>, access_token: Option<String>) -> Self {
        Session {
            client_id: client_id.into(),
            access_token: RwLock::new(access_token),
            acquiring: Mutex::new(()),
            last_response: RwLock::new(None),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub async fn access_token(&self) -> Option<String> {
        self.access_token.read().await.clone()
    }

    pub(crate) async fn set_access_token(&self, access_token: Option<String>) {
        *self.access_token.write().await = access_token;
    }

    pub(crate) async fn take_access_token(&self) -> Option<String> {
        self.access_token.write().await.take()
    }

    /// Held for the duration of one token acquisition.
    pub(crate) async fn acquisition(&self) -> MutexGuard<'_, ()> {
        self.acquiring.lock().await
    }

    pub async fn last_response(&self) -> Option<RawResponse> {
        self.last_response.read().await.clone()
    }

    pub(crate) async fn record_response(&self, response: &RawResponse) {
        *self.last_response.write().await = Some(response.clone());
    }
}
