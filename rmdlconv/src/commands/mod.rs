//! Command implementations

pub mod model;
pub mod sequence;

use std::io::{IsTerminal, Write};

use anyhow::{Context, Result};

/// Print a numbered menu and read one reply from the operator
pub(crate) fn prompt(menu: &str) -> Result<String> {
    print!("{menu}");
    std::io::stdout().flush().context("Failed to flush prompt")?;

    let mut reply = String::new();
    std::io::stdin()
        .read_line(&mut reply)
        .context("Failed to read version reply")?;
    Ok(reply.trim().to_string())
}

/// Whether an interactive prompt is possible at all
pub(crate) fn interactive() -> bool {
    std::io::stdin().is_terminal()
}
