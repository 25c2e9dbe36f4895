//! Store JSON documents in the Google Drive application data folder.
//!
//! ```no_run
//! # async fn demo() -> gappdata::Result<()> {
//! use gappdata::AppDataClient;
//! use serde_json::json;
//!
//! let client = AppDataClient::builder("1234.apps.googleusercontent.com")
//!     .build()
//!     .await?;
//! let id = client.create(Some("settings.json")).await?;
//! client.update(&id, json!({"theme": "dark"})).await?;
//! assert_eq!(client.get(&id).await?, json!({"theme": "dark"}));
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod model;
pub mod session;
pub mod token_store;
pub mod transport;

pub use auth::{Authenticator, ConsentPrompt, LoopbackAuthenticator};
pub use client::{AppDataClient, AppDataClientBuilder};
pub use config::{AppConfig, Config, ConfigFile};
pub use endpoint::{build_url, Endpoints};
pub use error::{Error, Result};
pub use model::{Contents, FileDescriptor};
pub use token_store::{MemoryTokenStore, TokenStore};
pub use transport::{RawResponse, ReqwestTransport, Request, Transport};
