//! CLI definitions

use clap::Parser;
use std::path::PathBuf;

/// Tripchat - conversational trip-planning client
#[derive(Debug, Parser)]
#[command(name = "tc", about = "Chat with the trip-planning assistant", version)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)")]
    pub log_level: Option<String>,

    /// Backend base URL override
    #[arg(long, help = "Backend base URL override")]
    pub base_url: Option<String>,

    /// Disable the server push listener
    #[arg(long, help = "Disable the server push listener")]
    pub no_push: bool,

    /// Message to send as the first chat turn
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags_and_initial_message() {
        let cli = Cli::parse_from(["tc", "--base-url", "http://backend:8000", "--no-push", "plan me a trip"]);
        assert_eq!(cli.base_url.as_deref(), Some("http://backend:8000"));
        assert!(cli.no_push);
        assert_eq!(cli.message.as_deref(), Some("plan me a trip"));
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::parse_from(["tc"]);
        assert!(cli.config.is_none());
        assert!(cli.log_level.is_none());
        assert!(!cli.no_push);
        assert!(cli.message.is_none());
    }
}
