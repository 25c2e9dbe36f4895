mod loopback;

pub use loopback::{LoopbackAuthenticator, DEFAULT_PORT};

use crate::error::Result;
use async_trait::async_trait;

/// Source of bearer tokens. `acquire_token` may suspend for as long as the
/// user needs to finish an interactive consent flow.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn acquire_token(&self, client_id: &str) -> Result<String>;

    async fn revoke_token(&self, access_token: &str) -> Result<()>;
}

/// Shows the consent url to the user.
pub trait ConsentPrompt: Send + Sync {
    fn show(&self, authorize_url: &str);
}

/// Writes the consent url to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPrompt;

impl ConsentPrompt for LogPrompt {
    fn show(&self, authorize_url: &str) {
        tracing::info!("open this url to grant access: {}", authorize_url);
    }
}

impl<F> ConsentPrompt for F
where
    F: Fn(&str) + Send + Sync,
{
    fn show(&self, authorize_url: &str) {
        self(authorize_url)
    }
}
