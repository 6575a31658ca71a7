//! `blog serve`: runs both admin sites over HTTP.

use async_trait::async_trait;
use backoffice_core::checks::has_errors;
use backoffice_core::{AdminError, AdminResult, Settings};

use crate::app::BlogApp;
use crate::command::ManagementCommand;

/// Starts the HTTP server.
///
/// `--host` and `--port` override the configured bind address. Startup is
/// refused when the site configuration has errors.
#[derive(Debug)]
pub struct ServeCommand;

#[async_trait]
impl ManagementCommand for ServeCommand {
    fn name(&self) -> &'static str {
        "serve"
    }

    fn help(&self) -> &'static str {
        "Runs the back-office server"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(clap::Arg::new("host").long("host").help("Host to bind to"))
            .arg(
                clap::Arg::new("port")
                    .long("port")
                    .value_parser(clap::value_parser!(u16))
                    .help("Port to bind to"),
            )
    }

    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> AdminResult<()> {
        let mut settings = settings.clone();
        if let Some(host) = matches.get_one::<String>("host") {
            settings.host.clone_from(host);
        }
        if let Some(port) = matches.get_one::<u16>("port") {
            settings.port = *port;
        }

        let app = BlogApp::new(settings);
        let messages = app.check();
        for message in &messages {
            tracing::warn!("{message}");
        }
        if has_errors(&messages) {
            return Err(AdminError::Configuration(
                "Refusing to start: the admin configuration has errors.".to_string(),
            ));
        }
        app.bootstrap().await?;
        app.run().await
    }
}
