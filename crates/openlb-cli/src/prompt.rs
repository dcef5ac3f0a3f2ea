//! Interactive password entry.

use std::io::{self, BufRead, IsTerminal, Write};

use openlb_sdk::PasswordPrompt;

/// Reads a password from the controlling terminal.
///
/// Answers `None` when stdin is not a terminal, so piped invocations
/// fail with a clear error instead of blocking on a read.
pub struct TtyPrompt;

impl PasswordPrompt for TtyPrompt {
    fn read_password(&self) -> Option<String> {
        if !io::stdin().is_terminal() {
            return None;
        }
        eprint!("OS Password: ");
        io::stderr().flush().ok()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).ok()?;
        Some(line.trim_end_matches(['\r', '\n']).to_string())
    }
}
