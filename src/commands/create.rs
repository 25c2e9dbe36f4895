use crate::commands::client_for_config;
use clap::{arg, Command};
use gappdata::ConfigFile;
use std::sync::Arc;

pub const COMMAND_NAME: &str = "create";

pub fn command() -> Command {
    Command::new(COMMAND_NAME)
        .about("Create an empty document and print its id")
        .args(args())
}

fn args() -> Vec<clap::Arg> {
    vec![arg!([name] "File name, like `settings.json`")]
}

pub(crate) async fn run_sub_command(
    config: &Arc<ConfigFile>,
    args: &clap::ArgMatches,
) -> anyhow::Result<()> {
    let name: Option<&String> = args.get_one("name");
    let client = client_for_config(config).await?;
    let id = client.create(name.map(String::as_str)).await?;
    println!("{}", id);
    Ok(())
}
