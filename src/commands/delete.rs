//! Delete command.

use anyhow::{Context, Result};
use clap::Args;

use super::{CommandContext, CommandExecutor};

/// Delete a key pair from the key store.
///
/// Deleting a full key pair destroys the secret key: messages hidden for it
/// can no longer be revealed.
#[derive(Args, Debug)]
pub struct DeleteCommand {
    /// Name of the key pair to delete
    pub name: String,
}

impl CommandExecutor for DeleteCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let store = ctx.open_store()?;
        store
            .delete(&self.name)
            .with_context(|| format!("Failed to delete key pair '{}'", self.name))?;

        println!("Deleted key pair '{}'", self.name);
        Ok(())
    }
}
