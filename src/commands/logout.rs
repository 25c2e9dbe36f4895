use crate::commands::client_for_config;
use clap::Command;
use gappdata::ConfigFile;
use std::sync::Arc;

pub const COMMAND_NAME: &str = "logout";

pub fn command() -> Command {
    Command::new(COMMAND_NAME).about("Revoke and forget the stored access token")
}

pub(crate) async fn run_sub_command(
    config: &Arc<ConfigFile>,
    _args: &clap::ArgMatches,
) -> anyhow::Result<()> {
    let client = client_for_config(config).await?;
    if let Err(err) = client.revoke().await {
        // the local copy is gone either way
        eprintln!("revocation failed: {}", err);
    }
    println!("logged out");
    Ok(())
}
