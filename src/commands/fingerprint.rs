//! Fingerprint command - display key fingerprints for verification.

use anyhow::{Context, Result};
use clap::Args;

use super::{CommandContext, CommandExecutor};

/// Display a key's fingerprint for out-of-band verification.
///
/// Use this to verify keys with your contact over a secure channel
/// (phone call, in person, etc.) to prevent MITM attacks.
#[derive(Args, Debug)]
pub struct FingerprintCommand {
    /// Name of the key pair
    pub name: String,
}

impl CommandExecutor for FingerprintCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let store = ctx.open_store()?;
        let keypair = store.require(&self.name)?;
        let fingerprint = keypair
            .fingerprint()
            .with_context(|| format!("Stored public key for '{}' is invalid", self.name))?;

        println!("Key: {} ({})", keypair.name(), keypair.algorithm());
        println!();
        println!("SHA-256 fingerprint:");
        // Two rows of eight groups read more easily over the phone
        let groups: Vec<&str> = fingerprint.split(':').collect();
        for row in groups.chunks(8) {
            println!("  {}", row.join(" "));
        }

        Ok(())
    }
}
