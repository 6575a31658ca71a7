//! `blog createuser`: creates an account and prints it.
//!
//! Accounts live in memory, so the record only shows what the account would
//! look like; the server bootstraps its own superuser from the settings.

use async_trait::async_trait;
use backoffice_admin::auth::{UserContext, UserStore};
use backoffice_core::{AdminError, AdminResult, Settings};

use crate::command::ManagementCommand;

/// Creates an account with the given flags.
#[derive(Debug)]
pub struct CreateUserCommand;

impl CreateUserCommand {
    /// Creates the account described by `matches` and returns its JSON record.
    pub async fn create(matches: &clap::ArgMatches) -> AdminResult<serde_json::Value> {
        let username = matches
            .get_one::<String>("username")
            .ok_or_else(|| AdminError::BadRequest("A username is required.".to_string()))?;
        let password = matches
            .get_one::<String>("password")
            .ok_or_else(|| AdminError::BadRequest("--password is required.".to_string()))?;
        let user = UserContext::new(username.as_str())
            .staff(matches.get_flag("staff"))
            .active(!matches.get_flag("inactive"));
        let user = UserStore::new().create_user(user, password).await?;
        serde_json::to_value(&user).map_err(|e| AdminError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl ManagementCommand for CreateUserCommand {
    fn name(&self) -> &'static str {
        "createuser"
    }

    fn help(&self) -> &'static str {
        "Creates a user account and prints its record"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(clap::Arg::new("username").required(true).help("Login name"))
            .arg(
                clap::Arg::new("password")
                    .long("password")
                    .required(true)
                    .help("Password of the new account"),
            )
            .arg(
                clap::Arg::new("staff")
                    .long("staff")
                    .action(clap::ArgAction::SetTrue)
                    .help("Allow access to the staff site"),
            )
            .arg(
                clap::Arg::new("inactive")
                    .long("inactive")
                    .action(clap::ArgAction::SetTrue)
                    .help("Create the account deactivated"),
            )
    }

    async fn handle(&self, matches: &clap::ArgMatches, _settings: &Settings) -> AdminResult<()> {
        let record = Self::create(matches).await?;
        let text = serde_json::to_string_pretty(&record)
            .map_err(|e| AdminError::Serialization(e.to_string()))?;
        println!("{text}");
        Ok(())
    }
}
