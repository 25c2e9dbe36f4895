use clap::{arg, value_parser, Command};
use gappdata::ConfigFile;
use std::sync::Arc;

pub const COMMAND_NAME: &str = "config";

pub fn command() -> Command {
    Command::new(COMMAND_NAME)
        .about("Show or change the OAuth client settings")
        .args(args())
}

fn args() -> Vec<clap::Arg> {
    vec![
        arg!(--"client-id" <CLIENT_ID> "OAuth client id from the Google api console")
            .required(false),
        arg!(--port <PORT> "Local port of the OAuth redirect uri")
            .required(false)
            .value_parser(value_parser!(u16)),
        arg!(--"consent-timeout" <SECONDS> "Seconds to wait for consent, 0 waits forever")
            .required(false)
            .value_parser(value_parser!(u64)),
        arg!(--"request-timeout" <SECONDS> "Seconds before an api request is abandoned, 0 disables")
            .required(false)
            .value_parser(value_parser!(u64)),
    ]
}

pub(crate) async fn run_sub_command(
    config: &Arc<ConfigFile>,
    args: &clap::ArgMatches,
) -> anyhow::Result<()> {
    let mut app_config = config.get_config().await.app;
    let mut changed = false;
    if let Some(client_id) = args.get_one::<String>("client-id") {
        app_config.client_id = client_id.clone();
        changed = true;
    }
    if let Some(port) = args.get_one::<u16>("port") {
        app_config.redirect_port = *port;
        changed = true;
    }
    if let Some(seconds) = args.get_one::<u64>("consent-timeout") {
        app_config.consent_timeout_secs = *seconds;
        changed = true;
    }
    if let Some(seconds) = args.get_one::<u64>("request-timeout") {
        app_config.request_timeout_secs = *seconds;
        changed = true;
    }
    if changed {
        config.set_app_config(app_config.clone()).await?;
        println!("saved {}", config.path().display());
    }
    println!("client id       : {}", app_config.client_id);
    println!("redirect uri    : http://localhost:{}/oauth_callback", app_config.redirect_port);
    println!("consent timeout : {}s", app_config.consent_timeout_secs);
    println!("request timeout : {}s", app_config.request_timeout_secs);
    Ok(())
}
