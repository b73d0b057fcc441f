//! List command.

use anyhow::Result;
use clap::Args;

use super::{CommandContext, CommandExecutor};

/// List all key pairs in the key store.
#[derive(Args, Debug)]
pub struct ListCommand {
    /// Also show fingerprints
    #[arg(short, long)]
    pub verbose: bool,
}

impl CommandExecutor for ListCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let store = ctx.open_store()?;

        if store.is_empty() {
            println!("No key pairs in {}", store.dir().display());
            println!("Create one with `pqstego keygen <name>`.");
            return Ok(());
        }

        println!("Key pairs ({}):", store.len());
        for name in store.list() {
            let Some(keypair) = store.get(&name) else {
                continue;
            };
            let kind = if keypair.has_secret_key() {
                "full"
            } else {
                "public"
            };

            if self.verbose {
                println!("  {:<24} {:<7} {}", name, kind, keypair.fingerprint()?);
            } else {
                println!("  {:<24} {}", name, kind);
            }
        }

        Ok(())
    }
}
