use crate::commands::{client_for_config, required_arg};
use anyhow::Context;
use clap::{arg, Command};
use gappdata::{ConfigFile, Contents};
use std::sync::Arc;

pub const COMMAND_NAME: &str = "put";

pub fn command() -> Command {
    Command::new(COMMAND_NAME)
        .about("Replace the contents of a document")
        .args(args())
}

fn args() -> Vec<clap::Arg> {
    vec![
        arg!(<id> "File id, as printed by `ls`"),
        arg!([json] "New contents as JSON text"),
        arg!(-f --file <PATH> "Read the new contents from a file")
            .required(false)
            .conflicts_with("json"),
    ]
}

pub(crate) async fn run_sub_command(
    config: &Arc<ConfigFile>,
    args: &clap::ArgMatches,
) -> anyhow::Result<()> {
    let id = required_arg(args, "id")?;
    let text = if let Some(path) = args.get_one::<String>("file") {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read file failed: {}", path))?
    } else {
        required_arg(args, "json")
            .with_context(|| "pass the contents or --file")?
            .clone()
    };
    let contents: serde_json::Value =
        serde_json::from_str(&text).with_context(|| "contents are not valid JSON")?;
    let client = client_for_config(config).await?;
    client.update(id, Contents::Json(contents)).await?;
    Ok(())
}
