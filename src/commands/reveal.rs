//! Reveal command - extract and decrypt a hidden message.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use pqstego::{reveal_file, RevealConfig};

use super::{CommandContext, CommandExecutor};

/// Reveal a message hidden in a stego image.
///
/// Use -o/--output to write raw bytes to a file (required for binary data).
/// Without -o, output is printed as text (lossy UTF-8 conversion).
#[derive(Args, Debug)]
pub struct RevealCommand {
    /// Stego image
    #[arg(short, long)]
    pub input: PathBuf,

    /// Name of your key pair (must hold the secret key)
    #[arg(short, long)]
    pub key: String,

    /// Output file for the revealed bytes
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CommandExecutor for RevealCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let store = ctx.open_store()?;
        let config = RevealConfig {
            framing: ctx.framing,
        };

        let message = reveal_file(&store, &self.input, &self.key, &config)
            .with_context(|| format!("Failed to reveal message from {}", self.input.display()))?;

        match &self.output {
            Some(path) => {
                fs::write(path, &message)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("Revealed {} bytes to {}", message.len(), path.display());
            }
            None => println!("{}", String::from_utf8_lossy(&message)),
        }

        Ok(())
    }
}
