//! Import commands - register someone else's public key.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::{confirm_replace, replacement_notice, CommandContext, CommandExecutor};

/// Import an armored ML-KEM-1024 public key under a name.
///
/// Replacing an existing entry asks for confirmation unless `--force` is given.
#[derive(Args, Debug)]
pub struct ImportCommand {
    /// Name to register the key under
    pub name: String,

    /// File containing the armored public key
    pub key_file: PathBuf,

    /// Replace an existing key pair without asking
    #[arg(short, long)]
    pub force: bool,
}

impl CommandExecutor for ImportCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let armored = fs::read_to_string(&self.key_file)
            .with_context(|| format!("Failed to read {}", self.key_file.display()))?;

        let store = ctx.open_store()?;
        if let Some(notice) = replacement_notice(&store, &self.name) {
            if !self.force && !confirm_replace(&notice)? {
                println!("Aborted, key pair '{}' left unchanged.", self.name);
                return Ok(());
            }
        }

        let keypair = store
            .import_public(&self.name, &armored)
            .with_context(|| format!("Failed to import public key from {}", self.key_file.display()))?;

        println!("Imported public key '{}'", keypair.name());
        println!("  Fingerprint: {}", keypair.fingerprint()?);
        println!();
        println!("Verify the fingerprint with the owner over a trusted channel.");
        Ok(())
    }
}

/// Import a public key transfer record (`.qkey` file).
///
/// The name stored in the record is used; if it is taken, a numeric suffix
/// is added (`alice_1`, `alice_2`, ...).
#[derive(Args, Debug)]
pub struct ImportFileCommand {
    /// Path to the transfer record
    pub path: PathBuf,
}

impl CommandExecutor for ImportFileCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let store = ctx.open_store()?;
        let keypair = store
            .import_public_from_file(&self.path)
            .with_context(|| format!("Failed to import {}", self.path.display()))?;

        println!("Imported public key '{}'", keypair.name());
        println!("  Fingerprint: {}", keypair.fingerprint()?);
        Ok(())
    }
}
