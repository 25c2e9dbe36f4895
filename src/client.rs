use crate::auth::{Authenticator, LoopbackAuthenticator};
use crate::endpoint::{build_url, Endpoints, APP_DATA_FOLDER};
use crate::error::{Error, Result};
use crate::model::{Contents, CreateFile, CreatedFile, ErrorBody, FileDescriptor, FileList, RenameFile};
use crate::session::Session;
use crate::token_store::{MemoryTokenStore, TokenStore};
use crate::transport::{RawResponse, ReqwestTransport, Request, Transport};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

/// Name given to files created without one.
pub const DEFAULT_FILE_NAME: &str = "name_not_set";

const LIST_FIELDS: &str = "files/name,files/id,files/modifiedTime";

/// JSON documents in the Drive application data folder of one user.
///
/// Every file operation makes sure a token is available first, then performs
/// exactly one request and fails on any non-2xx status.
pub struct AppDataClient {
    session: Session,
    endpoints: Endpoints,
    transport: Arc<dyn Transport>,
    authenticator: Arc<dyn Authenticator>,
    token_store: Arc<dyn TokenStore>,
}

pub struct AppDataClientBuilder {
    client_id: String,
    endpoints: Endpoints,
    transport: Option<Arc<dyn Transport>>,
    authenticator: Option<Arc<dyn Authenticator>>,
    token_store: Option<Arc<dyn TokenStore>>,
}

impl AppDataClientBuilder {
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    pub fn token_store(mut self, token_store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(token_store);
        self
    }

    /// Finish the client, picking up a token left in the token store by an
    /// earlier run.
    pub async fn build(self) -> Result<AppDataClient> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };
        let authenticator = self
            .authenticator
            .unwrap_or_else(|| Arc::new(LoopbackAuthenticator::new()));
        let token_store = self
            .token_store
            .unwrap_or_else(|| Arc::new(MemoryTokenStore::new()));
        let access_token = token_store.get_access_token().await?;
        if access_token.is_some() {
            tracing::debug!("reusing stored access token");
        }
        Ok(AppDataClient {
            session: Session::new(self.client_id, access_token),
            endpoints: self.endpoints,
            transport,
            authenticator,
            token_store,
        })
    }
}

impl AppDataClient {
    pub fn builder(client_id: impl Into<String>) -> AppDataClientBuilder {
        AppDataClientBuilder {
            client_id: client_id.into(),
            endpoints: Endpoints::default(),
            transport: None,
            authenticator: None,
            token_store: None,
        }
    }

    pub fn client_id(&self) -> &str {
        self.session.client_id()
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub async fn access_token(&self) -> Option<String> {
        self.session.access_token().await
    }

    /// The raw response of the most recent api call, successful or not.
    pub async fn last_response(&self) -> Option<RawResponse> {
        self.session.last_response().await
    }

    /// Return the cached token, acquiring one first if there is none.
    /// Concurrent callers share a single acquisition; the cached token stays
    /// readable while it runs.
    pub async fn ensure_authenticated(&self) -> Result<String> {
        if let Some(token) = self.session.access_token().await {
            return Ok(token);
        }
        let _acquiring = self.session.acquisition().await;
        if let Some(token) = self.session.access_token().await {
            return Ok(token);
        }
        tracing::info!("no access token cached, requesting consent");
        let token = self
            .authenticator
            .acquire_token(self.session.client_id())
            .await?;
        if let Err(err) = self.token_store.set_access_token(&token).await {
            tracing::warn!("access token not persisted: {}", err);
        }
        self.session.set_access_token(Some(token.clone())).await;
        Ok(token)
    }

    /// Use a token obtained elsewhere, replacing any cached one.
    pub async fn set_access_token(&self, access_token: impl Into<String>) -> Result<()> {
        let access_token = access_token.into();
        self.token_store.set_access_token(&access_token).await?;
        self.session.set_access_token(Some(access_token)).await;
        Ok(())
    }

    /// Revoke the token at the provider and forget it locally. The local copy
    /// is dropped even when the provider call fails.
    pub async fn revoke(&self) -> Result<()> {
        let revoked = match self.session.take_access_token().await {
            Some(token) => self.authenticator.revoke_token(&token).await,
            None => Ok(()),
        };
        self.token_store.clear_access_token().await?;
        revoked
    }

    /// Forget the cached token without contacting the provider, so the next
    /// operation authenticates again. Meant for recovering from a 401.
    pub async fn reset_token(&self) -> Result<()> {
        self.session.take_access_token().await;
        self.token_store.clear_access_token().await
    }

    /// Ask the token-info endpoint whether the cached token is still accepted.
    /// Never starts an authentication.
    pub async fn verify(&self) -> Result<bool> {
        let Some(token) = self.access_token().await else {
            return Ok(false);
        };
        let url = build_url(
            &self.endpoints.token_info,
            None,
            &[("access_token", token.as_str())],
        );
        let request = Request::new(Method::POST, url).bearer(&token);
        tracing::debug!("verifying access token");
        let response = self.transport.send(request).await?;
        self.session.record_response(&response).await;
        Ok(response.is_success())
    }

    pub async fn list(&self) -> Result<Vec<FileDescriptor>> {
        let token = self.ensure_authenticated().await?;
        let url = build_url(
            &self.endpoints.metadata,
            None,
            &[("spaces", APP_DATA_FOLDER), ("fields", LIST_FIELDS)],
        );
        let response = self
            .execute(Request::new(Method::GET, url).bearer(&token))
            .await?;
        Ok(response.json::<FileList>()?.files)
    }

    /// Contents of a file. An empty file reads as `{}`.
    pub async fn get(&self, id: &str) -> Result<Value> {
        let token = self.ensure_authenticated().await?;
        let url = build_url(
            &self.endpoints.metadata,
            Some(id),
            &[("spaces", APP_DATA_FOLDER), ("alt", "media")],
        );
        let response = self
            .execute(Request::new(Method::GET, url).bearer(&token))
            .await?;
        if response.text().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        response.json()
    }

    /// Create an empty file and return its id.
    pub async fn create(&self, name: Option<&str>) -> Result<String> {
        let token = self.ensure_authenticated().await?;
        let body = to_json(&CreateFile {
            name: name.unwrap_or(DEFAULT_FILE_NAME),
            parents: [APP_DATA_FOLDER],
        })?;
        let request = Request::new(Method::POST, build_url(&self.endpoints.metadata, None, &[]))
            .bearer(&token)
            .header("Accept", "application/json")
            .json_body(body);
        let response = self.execute(request).await?;
        Ok(response.json::<CreatedFile>()?.id)
    }

    /// Replace the whole contents of a file.
    pub async fn update(&self, id: &str, contents: impl Into<Contents>) -> Result<()> {
        let token = self.ensure_authenticated().await?;
        let contents: Contents = contents.into();
        let body = contents
            .into_body()
            .map_err(|e| Error::Serialize(e.to_string()))?;
        let request = Request::new(Method::PATCH, build_url(&self.endpoints.upload, Some(id), &[]))
            .bearer(&token)
            .json_body(body);
        self.execute(request).await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let token = self.ensure_authenticated().await?;
        let url = build_url(&self.endpoints.metadata, Some(id), &[]);
        self.execute(Request::new(Method::DELETE, url).bearer(&token))
            .await?;
        Ok(())
    }

    pub async fn rename(&self, id: &str, name: &str) -> Result<()> {
        let token = self.ensure_authenticated().await?;
        let body = to_json(&RenameFile { name })?;
        let request = Request::new(
            Method::PATCH,
            build_url(&self.endpoints.metadata, Some(id), &[]),
        )
        .bearer(&token)
        .header("Accept", "application/json")
        .json_body(body);
        self.execute(request).await?;
        Ok(())
    }

    async fn execute(&self, request: Request) -> Result<RawResponse> {
        tracing::debug!("{} {}", request.method, request.url);
        let response = self.transport.send(request).await?;
        self.validate(response).await
    }

    /// Keep `response` as the last one seen and fail unless its status is 2xx.
    async fn validate(&self, response: RawResponse) -> Result<RawResponse> {
        self.session.record_response(&response).await;
        if response.is_success() {
            return Ok(response);
        }
        let message = provider_message(&response).unwrap_or_else(|| {
            format!("request failed with HTTP status {}", response.status)
        });
        tracing::warn!("HTTP {}: {}", response.status, message);
        Err(Error::Http {
            status: response.status,
            message,
        })
    }
}

/// `error.message` of a Drive error body, if the body is one.
pub fn provider_message(response: &RawResponse) -> Option<String> {
    serde_json::from_str::<ErrorBody>(response.text())
        .ok()
        .and_then(|body| body.error.message)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::Serialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<RawResponse>>,
        requests: Mutex<Vec<Request>>,
    }

    impl ScriptedTransport {
        fn replying(replies: Vec<RawResponse>) -> Arc<Self> {
            Arc::new(ScriptedTransport {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(vec![]),
            })
        }

        async fn sent(&self) -> Vec<Request> {
            self.requests.lock().await.clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: Request) -> Result<RawResponse> {
            self.requests.lock().await.push(request);
            self.replies
                .lock()
                .await
                .pop_front()
                .ok_or_else(|| Error::Transport("no scripted reply".to_string()))
        }
    }

    #[derive(Default)]
    struct StaticAuthenticator {
        acquired: AtomicUsize,
        revoked: AtomicUsize,
    }

    #[async_trait]
    impl Authenticator for StaticAuthenticator {
        async fn acquire_token(&self, _client_id: &str) -> Result<String> {
            self.acquired.fetch_add(1, Ordering::SeqCst);
            Ok("tok".to_string())
        }

        async fn revoke_token(&self, _access_token: &str) -> Result<()> {
            self.revoked.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn client(transport: Arc<ScriptedTransport>) -> AppDataClient {
        AppDataClient::builder("cid")
            .transport(transport)
            .authenticator(Arc::new(StaticAuthenticator::default()))
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn list_queries_app_data_folder() {
        let transport = ScriptedTransport::replying(vec![RawResponse::new(
            200,
            r#"{"files":[{"id":"1","name":"a.json","modifiedTime":"2024-01-02T03:04:05Z"}]}"#,
        )]);
        let files = client(transport.clone()).await.list().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "a.json");

        let sent = transport.sent().await;
        assert_eq!(sent[0].method, Method::GET);
        assert_eq!(
            sent[0].url,
            "https://www.googleapis.com/drive/v3/files?spaces=appDataFolder&fields=files%2Fname%2Cfiles%2Fid%2Cfiles%2FmodifiedTime"
        );
        assert_eq!(sent[0].header_value("Authorization"), Some("Bearer tok"));
    }

    #[tokio::test]
    async fn get_reads_media_and_maps_empty_body() {
        let transport = ScriptedTransport::replying(vec![
            RawResponse::new(200, ""),
            RawResponse::new(200, r#"{"a":"apple"}"#),
        ]);
        let client = client(transport.clone()).await;
        assert_eq!(client.get("f1").await.unwrap(), json!({}));
        assert_eq!(client.get("f1").await.unwrap(), json!({"a": "apple"}));
        let sent = transport.sent().await;
        assert_eq!(
            sent[0].url,
            "https://www.googleapis.com/drive/v3/files/f1?spaces=appDataFolder&alt=media"
        );
    }

    #[tokio::test]
    async fn create_posts_name_and_parent() {
        let transport =
            ScriptedTransport::replying(vec![RawResponse::new(200, r#"{"id":"new-id"}"#)]);
        let id = client(transport.clone()).await.create(None).await.unwrap();
        assert_eq!(id, "new-id");

        let sent = transport.sent().await;
        assert_eq!(sent[0].method, Method::POST);
        assert_eq!(sent[0].url, "https://www.googleapis.com/drive/v3/files");
        assert_eq!(sent[0].header_value("Content-Type"), Some("application/json"));
        assert_eq!(sent[0].header_value("Accept"), Some("application/json"));
        let body: Value = serde_json::from_str(sent[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"name": DEFAULT_FILE_NAME, "parents": ["appDataFolder"]}));
    }

    #[tokio::test]
    async fn update_goes_through_upload_endpoint() {
        let transport = ScriptedTransport::replying(vec![
            RawResponse::new(200, "{}"),
            RawResponse::new(200, "{}"),
        ]);
        let client = client(transport.clone()).await;
        client.update("f1", json!({"c": 3})).await.unwrap();
        client.update("f1", "[1, 2]").await.unwrap();

        let sent = transport.sent().await;
        assert_eq!(sent[0].method, Method::PATCH);
        assert_eq!(sent[0].url, "https://www.googleapis.com/upload/drive/v3/files/f1");
        assert_eq!(sent[0].body.as_deref(), Some(r#"{"c":3}"#));
        assert_eq!(sent[1].body.as_deref(), Some("[1, 2]"));
    }

    #[tokio::test]
    async fn delete_and_rename_target_the_file() {
        let transport = ScriptedTransport::replying(vec![
            RawResponse::new(204, ""),
            RawResponse::new(200, r#"{"id":"f1","name":"b.json"}"#),
        ]);
        let client = client(transport.clone()).await;
        client.delete("f1").await.unwrap();
        client.rename("f2", "b.json").await.unwrap();

        let sent = transport.sent().await;
        assert_eq!(sent[0].method, Method::DELETE);
        assert_eq!(sent[0].url, "https://www.googleapis.com/drive/v3/files/f1");
        assert_eq!(sent[0].body, None);
        assert_eq!(sent[1].method, Method::PATCH);
        assert_eq!(sent[1].url, "https://www.googleapis.com/drive/v3/files/f2");
        assert_eq!(sent[1].body.as_deref(), Some(r#"{"name":"b.json"}"#));
    }

    #[tokio::test]
    async fn provider_message_is_surfaced() {
        let transport = ScriptedTransport::replying(vec![RawResponse::new(
            404,
            r#"{"error":{"code":404,"message":"File not found."}}"#,
        )]);
        let client = client(transport).await;
        let err = client.get("missing").await.unwrap_err();
        assert_eq!(err.to_string(), "File not found.");
        assert_eq!(err.status(), Some(404));
        assert_eq!(client.last_response().await.unwrap().status, 404);
    }

    #[tokio::test]
    async fn unparseable_error_body_still_fails() {
        let transport =
            ScriptedTransport::replying(vec![RawResponse::new(502, "<html>Bad Gateway</html>")]);
        let err = client(transport).await.delete("f1").await.unwrap_err();
        assert!(matches!(err, Error::Http { status: 502, .. }));
        assert_eq!(err.to_string(), "request failed with HTTP status 502");
    }

    #[tokio::test]
    async fn invalid_json_on_success_is_malformed() {
        let transport = ScriptedTransport::replying(vec![RawResponse::new(200, "not json")]);
        let err = client(transport).await.get("f1").await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn unauthorized_is_not_retried() {
        let transport = ScriptedTransport::replying(vec![RawResponse::new(
            401,
            r#"{"error":{"message":"Invalid Credentials"}}"#,
        )]);
        let client = client(transport.clone()).await;
        let err = client.list().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(transport.sent().await.len(), 1);
        assert_eq!(client.access_token().await.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn revoke_without_token_skips_provider() {
        let auth = Arc::new(StaticAuthenticator::default());
        let client = AppDataClient::builder("cid")
            .transport(ScriptedTransport::replying(vec![]))
            .authenticator(auth.clone())
            .build()
            .await
            .unwrap();
        client.revoke().await.unwrap();
        assert_eq!(auth.revoked.load(Ordering::SeqCst), 0);

        client.ensure_authenticated().await.unwrap();
        client.revoke().await.unwrap();
        assert_eq!(auth.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(auth.revoked.load(Ordering::SeqCst), 1);
        assert_eq!(client.access_token().await, None);
    }

    struct SlowAuthenticator {
        delay: std::time::Duration,
        reject_revoke: bool,
    }

    #[async_trait]
    impl Authenticator for SlowAuthenticator {
        async fn acquire_token(&self, _client_id: &str) -> Result<String> {
            tokio::time::sleep(self.delay).await;
            Ok("slow-tok".to_string())
        }

        async fn revoke_token(&self, _access_token: &str) -> Result<()> {
            if self.reject_revoke {
                return Err(Error::Http {
                    status: 400,
                    message: "invalid_token".to_string(),
                });
            }
            Ok(())
        }
    }

    /// Reads work, writes always fail.
    struct ReadOnlyTokenStore;

    #[async_trait]
    impl TokenStore for ReadOnlyTokenStore {
        async fn get_access_token(&self) -> Result<Option<String>> {
            Ok(None)
        }

        async fn set_access_token(&self, _access_token: &str) -> Result<()> {
            Err(Error::TokenStore("disk full".to_string()))
        }

        async fn clear_access_token(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn token_accessors_answer_while_consent_is_pending() {
        let client = Arc::new(
            AppDataClient::builder("cid")
                .transport(ScriptedTransport::replying(vec![]))
                .authenticator(Arc::new(SlowAuthenticator {
                    delay: std::time::Duration::from_secs(5),
                    reject_revoke: false,
                }))
                .build()
                .await
                .unwrap(),
        );
        let pending = tokio::spawn({
            let client = client.clone();
            async move { client.ensure_authenticated().await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let quick = std::time::Duration::from_secs(1);
        let token = tokio::time::timeout(quick, client.access_token())
            .await
            .unwrap();
        assert_eq!(token, None);
        let valid = tokio::time::timeout(quick, client.verify())
            .await
            .unwrap()
            .unwrap();
        assert!(!valid);
        pending.abort();
    }

    #[tokio::test]
    async fn rejected_revoke_still_forgets_token() {
        let store = Arc::new(MemoryTokenStore::with_token("stored"));
        let client = AppDataClient::builder("cid")
            .transport(ScriptedTransport::replying(vec![]))
            .authenticator(Arc::new(SlowAuthenticator {
                delay: std::time::Duration::ZERO,
                reject_revoke: true,
            }))
            .token_store(store.clone())
            .build()
            .await
            .unwrap();
        let err = client.revoke().await.unwrap_err();
        assert_eq!(err.to_string(), "invalid_token");
        assert_eq!(client.access_token().await, None);
        assert_eq!(store.get_access_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn unpersisted_token_is_still_used() {
        let transport = ScriptedTransport::replying(vec![RawResponse::new(200, r#"{"files":[]}"#)]);
        let client = AppDataClient::builder("cid")
            .transport(transport.clone())
            .authenticator(Arc::new(StaticAuthenticator::default()))
            .token_store(Arc::new(ReadOnlyTokenStore))
            .build()
            .await
            .unwrap();
        assert!(client.list().await.unwrap().is_empty());
        assert_eq!(client.access_token().await.as_deref(), Some("tok"));
        assert_eq!(
            transport.sent().await[0].header_value("Authorization"),
            Some("Bearer tok")
        );
    }

    #[tokio::test]
    async fn set_access_token_replaces_and_persists() {
        let store = Arc::new(MemoryTokenStore::new());
        let auth = Arc::new(StaticAuthenticator::default());
        let client = AppDataClient::builder("cid")
            .transport(ScriptedTransport::replying(vec![]))
            .authenticator(auth.clone())
            .token_store(store.clone())
            .build()
            .await
            .unwrap();
        client.set_access_token("external").await.unwrap();
        assert_eq!(client.ensure_authenticated().await.unwrap(), "external");
        assert_eq!(auth.acquired.load(Ordering::SeqCst), 0);
        assert_eq!(
            store.get_access_token().await.unwrap().as_deref(),
            Some("external")
        );

        let failing = AppDataClient::builder("cid")
            .transport(ScriptedTransport::replying(vec![]))
            .authenticator(auth)
            .token_store(Arc::new(ReadOnlyTokenStore))
            .build()
            .await
            .unwrap();
        let err = failing.set_access_token("external").await.unwrap_err();
        assert!(matches!(err, Error::TokenStore(_)));
        assert_eq!(failing.access_token().await, None);
    }

    #[test]
    fn request_body_failure_is_not_a_response_error() {
        let mut body = std::collections::BTreeMap::new();
        body.insert(vec![1u8], 1);
        let err = to_json(&body).unwrap_err();
        assert!(matches!(err, Error::Serialize(_)));
    }

    #[tokio::test]
    async fn verify_without_token_makes_no_request() {
        let transport = ScriptedTransport::replying(vec![]);
        let client = client(transport.clone()).await;
        assert!(!client.verify().await.unwrap());
        assert!(transport.sent().await.is_empty());
    }

    #[tokio::test]
    async fn verify_posts_to_token_info() {
        let transport = ScriptedTransport::replying(vec![RawResponse::new(
            200,
            r#"{"expires_in":3599}"#,
        )]);
        let client = AppDataClient::builder("cid")
            .transport(transport.clone())
            .authenticator(Arc::new(StaticAuthenticator::default()))
            .token_store(Arc::new(MemoryTokenStore::with_token("stored")))
            .build()
            .await
            .unwrap();
        assert!(client.verify().await.unwrap());
        let sent = transport.sent().await;
        assert_eq!(sent[0].method, Method::POST);
        assert_eq!(
            sent[0].url,
            "https://www.googleapis.com/oauth2/v1/tokeninfo?access_token=stored"
        );
    }
}
