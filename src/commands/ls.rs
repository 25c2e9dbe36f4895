use crate::commands::client_for_config;
use clap::Command;
use gappdata::ConfigFile;
use std::sync::Arc;

pub const COMMAND_NAME: &str = "ls";

pub fn command() -> Command {
    Command::new(COMMAND_NAME).about("List the documents")
}

pub(crate) async fn run_sub_command(
    config: &Arc<ConfigFile>,
    _args: &clap::ArgMatches,
) -> anyhow::Result<()> {
    let client = client_for_config(config).await?;
    for file in client.list().await? {
        let modified = file
            .modified_time
            .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{}  {}  {}", file.id, modified, file.name);
    }
    Ok(())
}
