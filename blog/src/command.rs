//! Management command framework for the `blog` binary.
//!
//! Each subcommand implements [`ManagementCommand`]; the [`CommandRegistry`]
//! builds the clap CLI from the registered commands and dispatches parsed
//! arguments to the matching handler.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use backoffice_core::{AdminError, AdminResult, Settings};

/// A subcommand of the `blog` binary.
#[async_trait]
pub trait ManagementCommand: Send + Sync {
    /// Name used to invoke the command.
    fn name(&self) -> &'static str;

    /// Short help text.
    fn help(&self) -> &'static str;

    /// Adds the command's own arguments.
    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd
    }

    /// Runs the command.
    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> AdminResult<()>;
}

/// Registered commands, keyed by name.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, Box<dyn ManagementCommand>>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command, replacing any command with the same name.
    pub fn register(&mut self, command: Box<dyn ManagementCommand>) {
        self.commands.insert(command.name(), command);
    }

    /// Returns the command registered under `name`.
    pub fn get(&self, name: &str) -> Option<&dyn ManagementCommand> {
        self.commands.get(name).map(AsRef::as_ref)
    }

    /// Returns the registered command names in sorted order.
    pub fn list_commands(&self) -> Vec<&str> {
        self.commands.keys().copied().collect()
    }

    /// Builds the top-level clap command with one subcommand per entry and
    /// the global `--config` option.
    pub fn build_cli(&self) -> clap::Command {
        let mut app = clap::Command::new("blog")
            .about("Blog back-office")
            .subcommand_required(true)
            .arg(
                clap::Arg::new("config")
                    .long("config")
                    .global(true)
                    .value_name("FILE")
                    .value_parser(clap::value_parser!(PathBuf))
                    .help("TOML settings file (defaults to ./blog.toml when present)"),
            );
        for (name, cmd) in &self.commands {
            app = app.subcommand(cmd.add_arguments(clap::Command::new(*name).about(cmd.help())));
        }
        app
    }

    /// Dispatches to the subcommand named in `matches`.
    pub async fn execute(&self, matches: &clap::ArgMatches, settings: &Settings) -> AdminResult<()> {
        let (name, sub_matches) = matches
            .subcommand()
            .ok_or_else(|| AdminError::Configuration("No subcommand specified".to_string()))?;
        let cmd = self
            .get(name)
            .ok_or_else(|| AdminError::Configuration(format!("Unknown command: {name}")))?;
        tracing::debug!(command = name, "running command");
        cmd.handle(sub_matches, settings).await
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.list_commands())
            .finish()
    }
}
