use super::{Authenticator, ConsentPrompt, LogPrompt};
use crate::endpoint::{build_url, AUTHORIZE_URL, REVOKE_URL, SCOPE};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_derive::Deserialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

pub const DEFAULT_PORT: u16 = 58080;
const CALLBACK_PAGE: &str = include_str!("../../html/callback.html");

/// Implicit-grant consent flow completed through a short-lived local web
/// server.
///
/// The provider redirects the browser to `/oauth_callback`, whose page posts
/// the token from the url fragment back to `/api/token`. That handler
/// completes a oneshot channel which `acquire_token` is waiting on; the
/// server shuts down as soon as the channel resolves.
pub struct LoopbackAuthenticator {
    port: u16,
    scope: String,
    authorize_url: String,
    revoke_url: String,
    consent_timeout: Option<Duration>,
    prompt: Arc<dyn ConsentPrompt>,
    http: reqwest::Client,
}

impl Default for LoopbackAuthenticator {
    fn default() -> Self {
        LoopbackAuthenticator {
            port: DEFAULT_PORT,
            scope: SCOPE.to_string(),
            authorize_url: AUTHORIZE_URL.to_string(),
            revoke_url: REVOKE_URL.to_string(),
            consent_timeout: None,
            prompt: Arc::new(LogPrompt),
            http: reqwest::Client::new(),
        }
    }
}

impl LoopbackAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Port of the redirect uri. It has to match one registered for the
    /// client id; 0 picks a free port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = url.into();
        self
    }

    pub fn revoke_url(mut self, url: impl Into<String>) -> Self {
        self.revoke_url = url.into();
        self
    }

    pub fn consent_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.consent_timeout = timeout;
        self
    }

    pub fn prompt(mut self, prompt: impl ConsentPrompt + 'static) -> Self {
        self.prompt = Arc::new(prompt);
        self
    }

    fn consent_url(&self, client_id: &str, redirect_uri: &str, state: &str) -> String {
        build_url(
            &self.authorize_url,
            None,
            &[
                ("client_id", client_id),
                ("redirect_uri", redirect_uri),
                ("response_type", "token"),
                ("scope", &self.scope),
                ("include_granted_scopes", "true"),
                ("state", state),
            ],
        )
    }

    async fn wait_for_consent(
        &self,
        receiver: oneshot::Receiver<Result<String>>,
    ) -> Result<String> {
        let received = match self.consent_timeout {
            Some(timeout) => tokio::time::timeout(timeout, receiver)
                .await
                .map_err(|_| Error::AuthenticationDenied("consent timed out".to_string()))?,
            None => receiver.await,
        };
        received
            .map_err(|_| Error::AuthenticationDenied("consent flow cancelled".to_string()))?
    }
}

#[async_trait]
impl Authenticator for LoopbackAuthenticator {
    async fn acquire_token(&self, client_id: &str) -> Result<String> {
        if client_id.is_empty() {
            return Err(Error::AuthenticationDenied(
                "client id is not configured".to_string(),
            ));
        }
        let state = random_state();
        let (sender, receiver) = oneshot::channel();
        let pending = Arc::new(Mutex::new(Some(PendingConsent {
            state: state.clone(),
            sender,
        })));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let bind_addr: SocketAddr = ([127, 0, 0, 1], self.port).into();
        let (addr, server) = warp::serve(routes(pending)).try_bind_with_graceful_shutdown(
            bind_addr,
            async move {
                shutdown_rx.await.ok();
            },
        )?;
        let server = tokio::spawn(server);
        tracing::debug!("consent server listening on {}", addr);

        let redirect_uri = format!("http://localhost:{}/oauth_callback", addr.port());
        self.prompt
            .show(&self.consent_url(client_id, &redirect_uri, &state));
        let outcome = self.wait_for_consent(receiver).await;

        let _ = shutdown_tx.send(());
        if let Err(err) = server.await {
            tracing::warn!("consent server stopped abnormally: {}", err);
        }
        match &outcome {
            Ok(_) => tracing::info!("access token acquired"),
            Err(err) => tracing::warn!("consent failed: {}", err),
        }
        outcome
    }

    async fn revoke_token(&self, access_token: &str) -> Result<()> {
        let response = self
            .http
            .post(self.revoke_url.as_str())
            .form(&[("token", access_token)])
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            tracing::info!("access token revoked");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Http {
            status: status.as_u16(),
            message: format!("token revocation failed: {}", body),
        })
    }
}

struct PendingConsent {
    state: String,
    sender: oneshot::Sender<Result<String>>,
}

type Pending = Arc<Mutex<Option<PendingConsent>>>;

#[derive(Debug, Deserialize)]
struct TokenCallback {
    access_token: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

fn random_state() -> String {
    use rand::distributions::Alphanumeric;
    use rand::{thread_rng, Rng};
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

fn routes(pending: Pending) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    callback_page().or(receive_token(pending))
}

fn callback_page() -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    warp::path!("oauth_callback")
        .and(warp::get())
        .map(|| warp::reply::html(CALLBACK_PAGE))
}

fn receive_token(
    pending: Pending,
) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    warp::path!("api" / "token")
        .and(warp::post())
        .and(warp::body::json())
        .and(warp::any().map(move || pending.clone()))
        .and_then(receive_token_body)
}

async fn receive_token_body(
    callback: TokenCallback,
    pending: Pending,
) -> std::result::Result<Response, Infallible> {
    let mut guard = pending.lock().await;
    let expected = match guard.as_ref() {
        Some(consent) => consent.state.as_str(),
        None => return Ok(text_reply("No authorization is pending", StatusCode::GONE)),
    };
    if callback.state.as_deref() != Some(expected) {
        return Ok(text_reply("State does not match", StatusCode::BAD_REQUEST));
    }
    let outcome = match (callback.access_token, callback.error) {
        (_, Some(error)) => Err(Error::AuthenticationDenied(error)),
        (Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(Error::AuthenticationDenied(
            "no access token in callback".to_string(),
        )),
    };
    let reply = match &outcome {
        Ok(_) => text_reply(
            "Authorization success, you can close this page now",
            StatusCode::OK,
        ),
        Err(err) => text_reply(&format!("Error: {}", err), StatusCode::FORBIDDEN),
    };
    if let Some(consent) = guard.take() {
        let _ = consent.sender.send(outcome);
    }
    Ok(reply)
}

fn text_reply(text: &str, status: StatusCode) -> Response {
    warp::reply::with_status(text.to_string(), status).into_response()
}
