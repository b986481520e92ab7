//! Command-line interface for the replay tool.
//!
//! Options given here override the matching settings from the configuration
//! file.

use clap::{Arg, ArgMatches, Command};
use pursuit_field::IndexKind;
use std::path::PathBuf;

/// Command line arguments parsed from user input.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Path to the replay script
    pub script_path: PathBuf,
    /// Optional override for the index variant
    pub kind: Option<IndexKind>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
}

impl CliArgs {
    /// Parses the process arguments, exiting with usage text on error.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("field.toml")),
            script_path: matches
                .get_one::<String>("script")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("script.toml")),
            kind: matches.get_one::<IndexKind>("kind").copied(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
        }
    }
}

fn command() -> Command {
    Command::new("pursuit-replay")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Replays scripted moves and proximity queries against a pursuit field")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("field.toml"),
        )
        .arg(
            Arg::new("script")
                .short('s')
                .long("script")
                .value_name("FILE")
                .help("Replay script path")
                .default_value("script.toml"),
        )
        .arg(
            Arg::new("kind")
                .short('k')
                .long("kind")
                .value_name("KIND")
                .help("Index variant (quadtree, kdtree)")
                .value_parser(|value: &str| value.parse::<IndexKind>()),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .help("Output logs in JSON format")
                .action(clap::ArgAction::SetTrue),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_from(args: &[&str]) -> CliArgs {
        let matches = command().try_get_matches_from(args).unwrap();
        CliArgs::from_matches(&matches)
    }

    #[test]
    fn test_defaults() {
        let args = parse_from(&["pursuit-replay"]);
        assert_eq!(args.config_path, PathBuf::from("field.toml"));
        assert_eq!(args.script_path, PathBuf::from("script.toml"));
        assert_eq!(args.kind, None);
        assert_eq!(args.log_level, None);
        assert!(!args.json_logs);
    }

    #[test]
    fn test_overrides() {
        let args = parse_from(&[
            "pursuit-replay",
            "--config",
            "custom.toml",
            "-s",
            "chase.toml",
            "--kind",
            "kd",
            "-l",
            "debug",
            "--json-logs",
        ]);
        assert_eq!(args.config_path, PathBuf::from("custom.toml"));
        assert_eq!(args.script_path, PathBuf::from("chase.toml"));
        assert_eq!(args.kind, Some(IndexKind::KdTree));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.json_logs);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!(command()
            .try_get_matches_from(["pursuit-replay", "--kind", "octree"])
            .is_err());
    }
}
