//! Key generation command.

use anyhow::{Context, Result};
use clap::Args;

use super::{confirm_replace, replacement_notice, CommandContext, CommandExecutor};

/// Generate a new ML-KEM-1024 key pair and store it under a name.
#[derive(Args, Debug)]
pub struct KeygenCommand {
    /// Name of the key pair
    pub name: String,

    /// Replace an existing key pair without asking
    #[arg(short, long)]
    pub force: bool,
}

impl CommandExecutor for KeygenCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let store = ctx.open_store()?;

        if let Some(notice) = replacement_notice(&store, &self.name) {
            if !self.force && !confirm_replace(&notice)? {
                println!("Aborted, key pair '{}' left unchanged.", self.name);
                return Ok(());
            }
        }

        let keypair = store
            .generate(&self.name)
            .with_context(|| format!("Failed to generate key pair '{}'", self.name))?;

        println!("Key pair generated successfully:");
        println!();
        println!("  Name:        {}", keypair.name());
        println!("  Algorithm:   {}", keypair.algorithm());
        println!("  Fingerprint: {}", keypair.fingerprint()?);
        println!("  Stored in:   {}", store.dir().display());
        println!();
        println!("Share your public key with `pqstego export {}`.", keypair.name());
        println!("The secret key never leaves the key store.");

        Ok(())
    }
}
