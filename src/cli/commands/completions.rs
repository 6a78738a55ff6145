//! Shell completions command implementation.

use crate::cli::{Cli, Shell};
use crate::error::Result;
use clap::CommandFactory;
use clap_complete::{generate, shells};
use std::io;

/// Generate shell completions for the specified shell.
///
/// # Errors
///
/// Never fails; the signature matches the other commands.
pub fn execute(shell: &Shell) -> Result<()> {
    let mut cmd = Cli::command();
    let out = &mut io::stdout();

    match shell {
        Shell::Bash => generate(shells::Bash, &mut cmd, "ct", out),
        Shell::Zsh => generate(shells::Zsh, &mut cmd, "ct", out),
        Shell::Fish => generate(shells::Fish, &mut cmd, "ct", out),
        Shell::PowerShell => generate(shells::PowerShell, &mut cmd, "ct", out),
        Shell::Elvish => generate(shells::Elvish, &mut cmd, "ct", out),
    }

    Ok(())
}
