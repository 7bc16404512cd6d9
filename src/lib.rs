//! cleanify - rule-based organization of a directory's top-level files
//!
//! This library scans a directory, classifies each file against an ordered
//! list of name-based rules loaded from JSON, and moves matching files into
//! destination subfolders. Moves can be previewed with a dry run, and name
//! conflicts are resolved by numbering (`name(1).ext`, `name(2).ext`, ...).

pub mod classifier;
pub mod cli;
pub mod config;
pub mod file_organizer;
pub mod logging;
pub mod output;
pub mod paths;
pub mod rules;
pub mod scanner;

pub use classifier::{Classification, classify_file, match_rule};
pub use config::{ConfigError, RulesConfig, load_rules};
pub use file_organizer::{
    MoveOutcome, OrganizeError, ensure_destination, move_file, resolve_conflict,
};
pub use paths::resolve_destination;
pub use rules::{MatchCriteria, NamePattern, Rule, RuleSet};
pub use scanner::{FileEntry, is_system_file, scan_directory};

pub use cli::{Cli, RunSummary, organize_directory, run_cli};
