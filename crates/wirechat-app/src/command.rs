//! Reserved operator commands.
//!
//! A submitted line is checked against these before it reaches the
//! controller. Matching is on the trimmed, lowercased line.

/// Lines that end the session and reset to the first phase.
pub const EXIT_COMMANDS: &[&str] = &["/exit", "--exit", "--salir", "--quit", "--q"];

/// Lines that show usage help.
pub const HELP_COMMANDS: &[&str] = &["/help", "--help", "--ayuda", "--h"];

/// Parsed operator line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Leave the session.
    Exit,
    /// Show help.
    Help,
    /// Ordinary input for the current phase, untouched.
    Line(&'a str),
}

/// Classify a submitted line.
pub fn parse(line: &str) -> Command<'_> {
    let normalized = line.trim().to_lowercase();
    if EXIT_COMMANDS.contains(&normalized.as_str()) {
        Command::Exit
    } else if HELP_COMMANDS.contains(&normalized.as_str()) {
        Command::Help
    } else {
        Command::Line(line)
    }
}

/// One-line usage hint.
pub fn help_text() -> String {
    format!("Leave the chat with {}. Esc quits.", EXIT_COMMANDS.join(", "))
}
