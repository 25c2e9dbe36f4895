use crate::{cli, commands};
use clap::{arg, Command};
use gappdata::ConfigFile;
use std::sync::Arc;

pub const DEFAULT_CONFIG_PATH: &str = "gappdata.toml";

pub fn command() -> Command {
    Command::new("gappdata")
        .about("Keep JSON documents in the Google Drive application data folder")
        .args(args())
        .subcommand(commands::config::command())
        .subcommand(commands::login::command())
        .subcommand(commands::logout::command())
        .subcommand(commands::verify::command())
        .subcommand(commands::ls::command())
        .subcommand(commands::cat::command())
        .subcommand(commands::create::command())
        .subcommand(commands::put::command())
        .subcommand(commands::rm::command())
        .subcommand(commands::mv::command())
}

fn args() -> Vec<clap::Arg> {
    vec![arg!(-c --config <CONFIG_FILE_PATH> "Path to the config file, like `gappdata.toml`")
        .required(false)
        .default_value(DEFAULT_CONFIG_PATH)]
}

pub async fn run_command() -> anyhow::Result<()> {
    let matches = cli::command().get_matches();
    let Some((command_name, args)) = matches.subcommand() else {
        cli::command().print_help()?;
        return Ok(());
    };
    let config_path: &String = matches
        .get_one("config")
        .ok_or_else(|| anyhow::anyhow!("config file path is required"))?;
    let config = Arc::new(ConfigFile::open(config_path).await?);
    let result = match command_name {
        commands::config::COMMAND_NAME => commands::config::run_sub_command(&config, args).await,
        commands::login::COMMAND_NAME => commands::login::run_sub_command(&config, args).await,
        commands::logout::COMMAND_NAME => commands::logout::run_sub_command(&config, args).await,
        commands::verify::COMMAND_NAME => commands::verify::run_sub_command(&config, args).await,
        commands::ls::COMMAND_NAME => commands::ls::run_sub_command(&config, args).await,
        commands::cat::COMMAND_NAME => commands::cat::run_sub_command(&config, args).await,
        commands::create::COMMAND_NAME => commands::create::run_sub_command(&config, args).await,
        commands::put::COMMAND_NAME => commands::put::run_sub_command(&config, args).await,
        commands::rm::COMMAND_NAME => commands::rm::run_sub_command(&config, args).await,
        commands::mv::COMMAND_NAME => commands::mv::run_sub_command(&config, args).await,
        _ => {
            cli::command().print_help()?;
            Ok(())
        }
    };
    if let Err(err) = &result {
        let unauthorized = err
            .downcast_ref::<gappdata::Error>()
            .map(gappdata::Error::is_unauthorized)
            .unwrap_or(false);
        if unauthorized {
            eprintln!("The stored access token was rejected, run `gappdata logout` then `gappdata login`.");
        }
    }
    result
}
