use crate::commands::{client_for_config, required_arg};
use clap::{arg, Command};
use gappdata::ConfigFile;
use std::sync::Arc;

pub const COMMAND_NAME: &str = "rm";

pub fn command() -> Command {
    Command::new(COMMAND_NAME).about("Delete a document").args(args())
}

fn args() -> Vec<clap::Arg> {
    vec![arg!(<id> "File id, as printed by `ls`")]
}

pub(crate) async fn run_sub_command(
    config: &Arc<ConfigFile>,
    args: &clap::ArgMatches,
) -> anyhow::Result<()> {
    let id = required_arg(args, "id")?;
    let client = client_for_config(config).await?;
    client.delete(id).await?;
    Ok(())
}
