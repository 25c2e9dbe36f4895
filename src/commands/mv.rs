use crate::commands::{client_for_config, required_arg};
use clap::{arg, Command};
use gappdata::ConfigFile;
use std::sync::Arc;

pub const COMMAND_NAME: &str = "mv";

pub fn command() -> Command {
    Command::new(COMMAND_NAME).about("Rename a document").args(args())
}

fn args() -> Vec<clap::Arg> {
    vec![
        arg!(<id> "File id, as printed by `ls`"),
        arg!(<name> "New file name"),
    ]
}

pub(crate) async fn run_sub_command(
    config: &Arc<ConfigFile>,
    args: &clap::ArgMatches,
) -> anyhow::Result<()> {
    let id = required_arg(args, "id")?;
    let name = required_arg(args, "name")?;
    let client = client_for_config(config).await?;
    client.rename(id, name).await?;
    Ok(())
}
