//! pqstego - post-quantum image steganography
//!
//! A CLI tool that encrypts messages to ML-KEM-1024 keys and hides them in
//! the pixels of lossless images.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pqstego::stego::Framing;
use pqstego::Config;

use commands::{
    CapacityCommand, CommandContext, CommandExecutor, DeleteCommand, ExportCommand,
    FingerprintCommand, HideCommand, ImportCommand, ImportFileCommand, KeygenCommand, ListCommand,
    RevealCommand,
};

/// pqstego - post-quantum image steganography
///
/// Messages are encrypted with ML-KEM-1024 + Argon2id + ChaCha20-Poly1305 and
/// hidden in the least significant bits of PNG/BMP pixels.
#[derive(Parser)]
#[command(name = "pqstego")]
#[command(version)]
#[command(about = "Hide post-quantum encrypted messages in images")]
#[command(long_about = None)]
struct Cli {
    /// Key store directory (default: ~/.pqstego/keys)
    #[arg(long, global = true)]
    keys_dir: Option<PathBuf>,

    /// Config file (default: ~/.pqstego/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Payload framing: delimiter or length-prefix
    #[arg(long, global = true)]
    framing: Option<Framing>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new key pair
    Keygen(KeygenCommand),

    /// Import an armored public key under a name
    Import(ImportCommand),

    /// Import a public key transfer record (.qkey)
    #[command(name = "import-file")]
    ImportFile(ImportFileCommand),

    /// Export a public key as a transfer record (.qkey)
    Export(ExportCommand),

    /// List key pairs
    List(ListCommand),

    /// Delete a key pair
    Delete(DeleteCommand),

    /// Show a key's fingerprint
    Fingerprint(FingerprintCommand),

    /// Hide an encrypted message in an image
    Hide(HideCommand),

    /// Reveal a message hidden in an image
    Reveal(RevealCommand),

    /// Show how much data an image can hold
    Capacity(CapacityCommand),
}

impl Commands {
    fn executor(&self) -> &dyn CommandExecutor {
        match self {
            Commands::Keygen(cmd) => cmd,
            Commands::Import(cmd) => cmd,
            Commands::ImportFile(cmd) => cmd,
            Commands::Export(cmd) => cmd,
            Commands::List(cmd) => cmd,
            Commands::Delete(cmd) => cmd,
            Commands::Fingerprint(cmd) => cmd,
            Commands::Hide(cmd) => cmd,
            Commands::Reveal(cmd) => cmd,
            Commands::Capacity(cmd) => cmd,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };

    // RUST_LOG wins over the config file; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let keys_dir = match cli.keys_dir {
        Some(dir) => dir,
        None => config
            .keys_dir()
            .context("Failed to determine key store directory")?,
    };
    let ctx = CommandContext {
        keys_dir,
        framing: cli.framing.unwrap_or(config.framing),
    };
    debug!(keys_dir = %ctx.keys_dir.display(), framing = %ctx.framing, "resolved settings");

    cli.command.executor().execute(&ctx)
}
