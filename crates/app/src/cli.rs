use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "repofinder")]
#[command(about = "Find local Git repositories and watch for new ones")]
pub struct CliArgs {
    /// Directory to search; repeat for several (overrides config)
    #[arg(long, value_name = "PATH")]
    pub scope: Vec<PathBuf>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Keep running and report repositories as they appear or disappear
    #[arg(long)]
    pub watch: bool,

    /// Stop searching after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// How to recognize a repository (overrides config)
    #[arg(long, value_enum)]
    pub matcher: Option<MatcherArg>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherArg {
    /// A marker directory such as .git exists
    Marker,
    /// git2 opens the directory as a repository
    Git,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_scopes() {
        let args = CliArgs::parse_from(["repofinder", "--scope", "/a", "--scope", "/b"]);
        assert_eq!(args.scope, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(args.config, None);
        assert!(!args.watch);
    }

    #[test]
    fn test_cli_parse_watch_with_timeout() {
        let args = CliArgs::parse_from([
            "repofinder",
            "--watch",
            "--timeout",
            "30",
            "--matcher",
            "marker",
            "--config",
            "/custom/config.toml",
        ]);
        assert!(args.watch);
        assert_eq!(args.timeout, Some(30));
        assert_eq!(args.matcher, Some(MatcherArg::Marker));
        assert_eq!(args.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_cli_parse_no_args() {
        let args = CliArgs::parse_from(["repofinder"]);
        assert!(args.scope.is_empty());
        assert_eq!(args.timeout, None);
        assert_eq!(args.matcher, None);
    }
}
