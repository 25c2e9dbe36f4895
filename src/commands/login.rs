use crate::commands::client_for_config;
use clap::Command;
use gappdata::ConfigFile;
use std::sync::Arc;

pub const COMMAND_NAME: &str = "login";

pub fn command() -> Command {
    Command::new(COMMAND_NAME).about("Acquire an access token through the browser")
}

pub(crate) async fn run_sub_command(
    config: &Arc<ConfigFile>,
    _args: &clap::ArgMatches,
) -> anyhow::Result<()> {
    let client = client_for_config(config).await?;
    if client.access_token().await.is_some() {
        println!("already logged in, run `logout` first to switch accounts");
        return Ok(());
    }
    client.ensure_authenticated().await?;
    println!("logged in");
    Ok(())
}
