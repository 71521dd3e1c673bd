//! Wire convention for server text lines.
//!
//! The server speaks untagged UTF-8 lines. The only structure is the reply to
//! the display name: a line starting with [`ERROR_PREFIX`] rejects the name,
//! anything else accepts it. Every other part of the client deals in
//! [`ServerLine`] rather than raw prefixes.

/// Literal prefix marking a rejection reply.
pub const ERROR_PREFIX: &str = "ERROR:";

/// Classified server line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerLine {
    /// Line carried the error prefix.
    Rejected {
        /// Human-readable reason following the prefix, trimmed.
        reason: String,
    },
    /// Any other line, verbatim.
    Text(String),
}

impl ServerLine {
    /// Classify a raw line. The prefix match is exact and case-sensitive.
    pub fn parse(line: &str) -> Self {
        match line.strip_prefix(ERROR_PREFIX) {
            Some(reason) => Self::Rejected { reason: reason.trim().to_string() },
            None => Self::Text(line.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_prefix_is_rejection() {
        assert_eq!(ServerLine::parse("ERROR: name taken"), ServerLine::Rejected {
            reason: "name taken".into()
        });
    }

    #[test]
    fn bare_prefix_has_empty_reason() {
        assert_eq!(ServerLine::parse("ERROR:"), ServerLine::Rejected { reason: String::new() });
    }

    #[test]
    fn prefix_must_lead_the_line() {
        assert_eq!(ServerLine::parse(" ERROR: late"), ServerLine::Text(" ERROR: late".into()));
        assert_eq!(ServerLine::parse("error: lower"), ServerLine::Text("error: lower".into()));
    }

    #[test]
    fn other_lines_are_verbatim() {
        assert_eq!(ServerLine::parse("Beto: hey "), ServerLine::Text("Beto: hey ".into()));
    }
}
