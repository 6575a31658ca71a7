//! `blog check`: validates the admin configuration of both sites.

use async_trait::async_trait;
use backoffice_core::checks::{has_errors, CheckMessage};
use backoffice_core::{AdminError, AdminResult, Settings};

use crate::app::BlogApp;
use crate::command::ManagementCommand;

/// Prints every configuration problem and fails if any is an error.
#[derive(Debug)]
pub struct CheckCommand;

/// Summary line for a set of check messages.
pub fn summary(messages: &[CheckMessage]) -> String {
    match messages.len() {
        0 => "System check identified no issues.".to_string(),
        1 => "System check identified 1 issue.".to_string(),
        n => format!("System check identified {n} issues."),
    }
}

#[async_trait]
impl ManagementCommand for CheckCommand {
    fn name(&self) -> &'static str {
        "check"
    }

    fn help(&self) -> &'static str {
        "Checks the admin configuration for problems"
    }

    async fn handle(&self, _matches: &clap::ArgMatches, settings: &Settings) -> AdminResult<()> {
        let messages = BlogApp::new(settings.clone()).check();
        for message in &messages {
            println!("{message}");
        }
        let summary = summary(&messages);
        if has_errors(&messages) {
            return Err(AdminError::Configuration(summary));
        }
        println!("{summary}");
        Ok(())
    }
}
