//! Hide command - encrypt a message and embed it in an image.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use pqstego::{hide_file, HideConfig};

use super::{CommandContext, CommandExecutor};

/// Hide an encrypted message or file inside a carrier image.
///
/// The output must be saved in a lossless format (PNG, BMP). Without -o the
/// result is written next to the carrier as <name>_stego.<ext>.
#[derive(Args, Debug)]
pub struct HideCommand {
    /// Carrier image (PNG, BMP, ...)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Name of the recipient key pair
    #[arg(short = 't', long = "to")]
    pub recipient: String,

    /// Text message to hide (reads stdin if neither -m nor -f is given)
    #[arg(short, long, conflicts_with = "file")]
    pub message: Option<String>,

    /// File whose bytes to hide
    #[arg(short, long, conflicts_with = "message")]
    pub file: Option<PathBuf>,

    /// Output image path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CommandExecutor for HideCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let message = self.read_message()?;
        if message.is_empty() {
            bail!("Message cannot be empty");
        }

        let store = ctx.open_store()?;
        let config = HideConfig {
            framing: ctx.framing,
        };

        let output = hide_file(
            &store,
            &self.input,
            &message,
            &self.recipient,
            self.output.as_deref(),
            &config,
        )
        .with_context(|| format!("Failed to hide message in {}", self.input.display()))?;

        println!("Hid {} bytes for '{}' in {}", message.len(), self.recipient, output.display());
        Ok(())
    }
}

impl HideCommand {
    fn read_message(&self) -> Result<Vec<u8>> {
        if let Some(path) = &self.file {
            return fs::read(path).with_context(|| format!("Failed to read {}", path.display()));
        }
        if let Some(message) = &self.message {
            return Ok(message.as_bytes().to_vec());
        }

        eprintln!("Reading message from stdin (Ctrl+D to finish):");
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read message from stdin")?;
        Ok(buffer.trim().as_bytes().to_vec())
    }
}
