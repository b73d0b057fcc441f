//! Capacity command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use pqstego::stego::{self, Framing};

use super::{CommandContext, CommandExecutor};

/// Envelope overhead for an empty message: JSON keys, base64 KEM ciphertext,
/// salt, tag, plus a short recipient name.
const APPROX_ENVELOPE_OVERHEAD: usize = 2300;

/// Show how many bytes a carrier image can hold.
#[derive(Args, Debug)]
pub struct CapacityCommand {
    /// Carrier image
    #[arg(short, long)]
    pub input: PathBuf,
}

impl CommandExecutor for CapacityCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let grid = stego::load_grid(&self.input)
            .with_context(|| format!("Failed to load {}", self.input.display()))?;

        println!("Carrier: {}", self.input.display());
        println!(
            "  Size:      {}x{} ({} channels, {} samples)",
            grid.width(),
            grid.height(),
            grid.channels(),
            grid.samples().len()
        );
        for framing in [Framing::Delimiter, Framing::LengthPrefix] {
            let marker = if framing == ctx.framing { " (active)" } else { "" };
            println!(
                "  {:<14} {} bytes{}",
                format!("{}:", framing),
                stego::capacity(&grid, framing),
                marker
            );
        }

        let usable = stego::capacity(&grid, ctx.framing).saturating_sub(APPROX_ENVELOPE_OVERHEAD);
        println!();
        // Base64 expands the ciphertext by 4/3
        println!("Approximate message capacity: {} bytes", usable * 3 / 4);

        Ok(())
    }
}
