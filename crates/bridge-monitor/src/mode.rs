//! Monitor mode resolution
//!
//! Turns the `bridge monitor` keyword list into a [`MonitorConfig`]. Tokens
//! are processed left to right and each one mutates the state in place, so
//! later keywords win. `link` and `fdb` first narrow the subscription to
//! nothing; their groups are added back once the whole list is consumed.

use crate::error::ArgError;
use crate::types::{Group, GroupSet};
use std::path::PathBuf;

/// Resolved monitoring mode for one session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MonitorConfig {
    /// Multicast groups the live channel subscribes to
    pub groups: GroupSet,
    /// Capture file to replay instead of listening live
    pub replay_file: Option<PathBuf>,
    /// Prefix link and neighbor records with a `[LINK]` / `[NEIGH]` tag
    pub banner: bool,
}

/// Outcome of resolving the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorCommand {
    /// Start monitoring with this configuration
    Monitor(MonitorConfig),
    /// Print usage and stop
    Help,
}

/// Abbreviation match: `token` is a prefix of `keyword`
///
/// The empty token is a prefix of every keyword, so it selects `file`.
fn matches(token: &str, keyword: &str) -> bool {
    keyword.starts_with(token)
}

/// Resolve monitor keywords into a command
pub fn resolve<I, S>(tokens: I) -> Result<MonitorCommand, ArgError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut config = MonitorConfig::default();
    let mut want_link = false;
    let mut want_neigh = false;

    let mut tokens = tokens.into_iter();
    while let Some(token) = tokens.next() {
        let token = token.as_ref();
        if matches(token, "file") {
            let path = tokens.next().ok_or(ArgError::MissingValue("file"))?;
            config.replay_file = Some(PathBuf::from(path.as_ref()));
        } else if matches(token, "link") {
            want_link = true;
            config.groups = GroupSet::EMPTY;
        } else if matches(token, "fdb") {
            want_neigh = true;
            config.groups = GroupSet::EMPTY;
        } else if token == "all" {
            config.groups = GroupSet::DEFAULT;
            config.banner = true;
        } else if matches(token, "help") {
            return Ok(MonitorCommand::Help);
        } else {
            return Err(ArgError::UnknownArgument(token.to_string()));
        }
    }

    if want_link {
        config.groups = config.groups.with(Group::Link);
    }
    if want_neigh {
        config.groups = config.groups.with(Group::Neigh);
    }

    Ok(MonitorCommand::Monitor(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(tokens: &[&str]) -> MonitorConfig {
        match resolve(tokens).unwrap() {
            MonitorCommand::Monitor(config) => config,
            MonitorCommand::Help => panic!("unexpected help for {:?}", tokens),
        }
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg.groups, GroupSet::DEFAULT);
        assert!(!cfg.banner);
        assert!(cfg.replay_file.is_none());
    }

    #[test]
    fn test_link_only() {
        assert_eq!(config(&["link"]).groups, GroupSet::EMPTY.with(Group::Link));
    }

    #[test]
    fn test_fdb_only() {
        assert_eq!(config(&["fdb"]).groups, GroupSet::EMPTY.with(Group::Neigh));
    }

    #[test]
    fn test_link_and_fdb_any_order() {
        let both = GroupSet::EMPTY.with(Group::Link).with(Group::Neigh);
        assert_eq!(config(&["link", "fdb"]).groups, both);
        assert_eq!(config(&["fdb", "link"]).groups, both);
    }

    #[test]
    fn test_repeated_link_is_not_a_toggle() {
        assert_eq!(
            config(&["link", "link"]).groups,
            GroupSet::EMPTY.with(Group::Link)
        );
    }

    #[test]
    fn test_all_overrides_earlier_narrowing() {
        let cfg = config(&["link", "fdb", "all"]);
        assert_eq!(cfg.groups, GroupSet::DEFAULT);
        assert!(cfg.banner);
    }

    #[test]
    fn test_narrowing_after_all_keeps_banner() {
        let cfg = config(&["all", "fdb"]);
        assert_eq!(cfg.groups, GroupSet::EMPTY.with(Group::Neigh));
        assert!(cfg.banner);
    }

    #[test]
    fn test_file_sets_replay_path() {
        let cfg = config(&["file", "/tmp/capture"]);
        assert_eq!(cfg.replay_file, Some(PathBuf::from("/tmp/capture")));
        assert_eq!(cfg.groups, GroupSet::DEFAULT);
    }

    #[test]
    fn test_file_without_path() {
        assert_eq!(
            resolve(["link", "file"]),
            Err(ArgError::MissingValue("file"))
        );
    }

    #[test]
    fn test_abbreviations() {
        assert_eq!(config(&["li"]).groups, GroupSet::EMPTY.with(Group::Link));
        assert_eq!(config(&["fd"]).groups, GroupSet::EMPTY.with(Group::Neigh));
        assert_eq!(
            config(&["f", "cap.bin"]).replay_file,
            Some(PathBuf::from("cap.bin"))
        );
        assert_eq!(resolve(["h"]), Ok(MonitorCommand::Help));
    }

    #[test]
    fn test_all_must_be_exact() {
        assert_eq!(
            resolve(["al"]),
            Err(ArgError::UnknownArgument("al".to_string()))
        );
    }

    #[test]
    fn test_help_anywhere() {
        assert_eq!(resolve(["help"]), Ok(MonitorCommand::Help));
        assert_eq!(resolve(["link", "all", "help"]), Ok(MonitorCommand::Help));
        assert_eq!(resolve(["help", "bogus"]), Ok(MonitorCommand::Help));
    }

    #[test]
    fn test_unknown_argument() {
        assert_eq!(
            resolve(["link", "bogus"]),
            Err(ArgError::UnknownArgument("bogus".to_string()))
        );
    }

    #[test]
    fn test_empty_token_selects_file() {
        match resolve(["", "/tmp/capture", "fdb"]).unwrap() {
            MonitorCommand::Monitor(config) => {
                assert_eq!(config.replay_file, Some(PathBuf::from("/tmp/capture")));
                assert_eq!(config.groups, GroupSet::EMPTY.with(Group::Neigh));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(resolve([""]), Err(ArgError::MissingValue("file")));
    }
}
