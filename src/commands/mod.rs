pub mod cat;
pub mod config;
pub mod create;
pub mod login;
pub mod logout;
pub mod ls;
pub mod mv;
pub mod put;
pub mod rm;
pub mod verify;

use anyhow::Context;
use gappdata::{AppDataClient, ConfigFile, ReqwestTransport};
use std::sync::Arc;

/// Build a client from the config file, which also keeps the access token
/// between runs.
pub(crate) async fn client_for_config(config: &Arc<ConfigFile>) -> anyhow::Result<AppDataClient> {
    let app_config = config.get_app_config().await;
    let authenticator = app_config.authenticator().prompt(|url: &str| {
        println!("Open this url in a browser to grant access:\n\n    {}\n", url);
    });
    let transport = ReqwestTransport::with_timeout(app_config.request_timeout())
        .with_context(|| "http client setup failed")?;
    let client = AppDataClient::builder(app_config.client_id.clone())
        .endpoints(config.get_endpoints().await)
        .transport(Arc::new(transport))
        .authenticator(Arc::new(authenticator))
        .token_store(config.clone())
        .build()
        .await?;
    Ok(client)
}

pub(crate) fn required_arg<'a>(args: &'a clap::ArgMatches, name: &str) -> anyhow::Result<&'a String> {
    args.get_one::<String>(name)
        .with_context(|| format!("{} is required", name))
}
