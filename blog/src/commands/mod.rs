//! The `blog` subcommands.

pub mod check;
pub mod createuser;
pub mod serve;

pub use check::CheckCommand;
pub use createuser::CreateUserCommand;
pub use serve::ServeCommand;

use crate::command::CommandRegistry;

/// Returns a registry holding every `blog` subcommand.
pub fn default_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register(Box::new(ServeCommand));
    registry.register(Box::new(CheckCommand));
    registry.register(Box::new(CreateUserCommand));
    registry
}
