use crate::commands::client_for_config;
use clap::Command;
use gappdata::ConfigFile;
use std::sync::Arc;

pub const COMMAND_NAME: &str = "verify";

pub fn command() -> Command {
    Command::new(COMMAND_NAME).about("Check whether the stored access token is still accepted")
}

pub(crate) async fn run_sub_command(
    config: &Arc<ConfigFile>,
    _args: &clap::ArgMatches,
) -> anyhow::Result<()> {
    let client = client_for_config(config).await?;
    if client.access_token().await.is_none() {
        println!("no access token stored");
    } else if client.verify().await? {
        println!("access token is valid");
    } else {
        println!("access token is no longer accepted");
    }
    Ok(())
}
