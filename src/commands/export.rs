//! Export command - write a public key transfer record.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::{CommandContext, CommandExecutor};

/// Export a public key as a transfer record (`.qkey` JSON file).
///
/// The secret key is never included.
#[derive(Args, Debug)]
pub struct ExportCommand {
    /// Name of the key pair to export
    pub name: String,

    /// Output path (default: <name>_public_key.qkey)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CommandExecutor for ExportCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let store = ctx.open_store()?;
        let path = store
            .export_public_to_file(&self.name, self.output.as_deref())
            .with_context(|| format!("Failed to export public key '{}'", self.name))?;

        println!("Public key '{}' exported to {}", self.name, path.display());
        Ok(())
    }
}
