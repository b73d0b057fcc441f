//! Command module - Strategy pattern for CLI commands.
//!
//! Each command is a separate module implementing the `CommandExecutor` trait.
//! Shared settings (key store location, framing) arrive through a
//! [`CommandContext`] built once in `main`.

mod capacity;
mod delete;
mod export;
mod fingerprint;
mod hide;
mod import;
mod keygen;
mod list;
mod reveal;

pub use capacity::CapacityCommand;
pub use delete::DeleteCommand;
pub use export::ExportCommand;
pub use fingerprint::FingerprintCommand;
pub use hide::HideCommand;
pub use import::{ImportCommand, ImportFileCommand};
pub use keygen::KeygenCommand;
pub use list::ListCommand;
pub use reveal::RevealCommand;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

use pqstego::stego::Framing;
use pqstego::KeyStore;

/// Settings resolved from the config file and global flags.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub keys_dir: PathBuf,
    pub framing: Framing,
}

impl CommandContext {
    /// Opens the key store at the configured location.
    pub fn open_store(&self) -> Result<KeyStore> {
        KeyStore::open(&self.keys_dir).with_context(|| {
            format!("Failed to open key store at {}", self.keys_dir.display())
        })
    }
}

/// Trait for command execution - Strategy pattern.
///
/// Each command struct holds its parsed arguments and implements
/// this trait to define its execution logic.
pub trait CommandExecutor {
    /// Executes the command with its parsed arguments.
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// Describes what replacing `name` would destroy, or `None` if the name is free.
pub(crate) fn replacement_notice(store: &KeyStore, name: &str) -> Option<String> {
    let existing = store.get(name)?;
    if existing.has_secret_key() {
        Some(format!(
            "WARNING: key pair '{}' holds a SECRET KEY. Replacing it makes every \
             message hidden for it unreadable.",
            name
        ))
    } else {
        Some(format!("Public key '{}' already exists.", name))
    }
}

/// Prints `notice` and asks on stderr whether to replace the existing entry.
pub(crate) fn confirm_replace(notice: &str) -> Result<bool> {
    eprintln!("{}", notice);
    eprint!("Replace it? [y/N] ");
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
