//! Rules configuration loading and validation.
//!
//! Rules are stored in a JSON file with the following structure:
//!
//! ```json
//! {
//!   "rules": [
//!     {
//!       "name": "Screenshots",
//!       "match": { "contains": ["screenshot"], "extensions": [".png"] },
//!       "destination": "Screenshots"
//!     }
//!   ]
//! }
//! ```
//!
//! A missing file is not an error: it yields an empty rule set. A file that
//! exists but is malformed, or that holds any invalid rule, is rejected as a
//! whole.

use crate::rules::{MatchCriteria, Rule, RuleSet};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while loading the rules configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("Failed to read rules file {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    /// The content is not valid JSON.
    #[error("Invalid JSON in rules file: {0}")]
    InvalidJson(String),
    /// The document is JSON but not shaped like a rules file.
    #[error("Invalid rules file: {0}")]
    InvalidStructure(String),
    /// A single rule entry is invalid.
    #[error("Rule {index} ('{name}') {reason}")]
    InvalidRule {
        index: usize,
        name: String,
        reason: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

const CRITERIA_KEYS: [&str; 3] = ["contains", "extensions", "pattern"];
const LEGACY_MATCH_TYPES: [&str; 3] = ["contains", "extension", "pattern"];

/// Top-level shape of the rules file. Individual rules are validated by hand
/// so that errors can point at the offending entry.
#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default)]
    rules: Option<Value>,
}

/// Locates the rules file for a run.
pub struct RulesConfig;

impl RulesConfig {
    /// Picks the rules file to use.
    ///
    /// Looks in the following order:
    /// 1. `explicit`, if provided (returned even when it does not exist)
    /// 2. `config/rules.json` in the current directory
    /// 3. `<config dir>/cleanify/rules.json` for the current user
    ///
    /// Returns `None` when nothing is found; callers treat that as an empty
    /// rule set.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        let local = PathBuf::from("config").join("rules.json");
        if local.is_file() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join("cleanify").join("rules.json"))
            .filter(|path| path.is_file())
    }

    /// Locates and loads the rules for a run.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<RuleSet> {
        match Self::locate(explicit) {
            Some(path) => load_rules(&path),
            None => {
                debug!("no rules file found; using an empty rule set");
                Ok(RuleSet::default())
            }
        }
    }
}

/// Loads and validates the rules stored at `path`.
///
/// # Arguments
///
/// * `path` - Path to a JSON document with a top-level `rules` list
///
/// # Returns
///
/// The rules in file order. A missing file yields an empty rule set.
///
/// # Errors
///
/// Returns `ConfigError::Io` if the file exists but cannot be read, and the
/// other variants if its content is invalid.
///
/// # Examples
///
/// ```no_run
/// use cleanify::config::load_rules;
/// use std::path::Path;
///
/// match load_rules(Path::new("config/rules.json")) {
///     Ok(rules) => println!("loaded {} rule(s)", rules.len()),
///     Err(e) => eprintln!("invalid rules: {}", e),
/// }
/// ```
pub fn load_rules(path: &Path) -> ConfigResult<RuleSet> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "rules file not found; using an empty rule set");
            return Ok(RuleSet::default());
        }
        Err(e) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let rule_set = RuleSet::from_json_str(&content)?;
    debug!(path = %path.display(), rules = rule_set.len(), "loaded rules");
    Ok(rule_set)
}

impl RuleSet {
    /// Parses and validates a rules document held in memory.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or on the first invalid rule.
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let document: Value =
            serde_json::from_str(content).map_err(|e| ConfigError::InvalidJson(e.to_string()))?;

        if !document.is_object() {
            return Err(ConfigError::InvalidStructure(
                "top level must be an object".to_string(),
            ));
        }

        let file: RulesFile = serde_json::from_value(document)
            .map_err(|e| ConfigError::InvalidStructure(e.to_string()))?;

        let entries = match file.rules {
            None | Some(Value::Null) => return Ok(RuleSet::default()),
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                return Err(ConfigError::InvalidStructure(
                    "'rules' must be an array".to_string(),
                ));
            }
        };

        let rules = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| parse_rule(index, entry))
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(RuleSet::new(rules))
    }
}

fn parse_rule(index: usize, entry: &Value) -> ConfigResult<Rule> {
    let Some(object) = entry.as_object() else {
        return Err(invalid(index, "unknown", "is not an object"));
    };

    let label = object
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    for field in ["name", "match", "destination"] {
        if !object.contains_key(field) {
            return Err(invalid(index, &label, &format!("is missing '{}' field", field)));
        }
    }

    let name = required_string(object, "name").ok_or_else(|| {
        invalid(index, &label, "has an invalid 'name' field (must be a non-empty string)")
    })?;
    let destination = required_string(object, "destination").ok_or_else(|| {
        invalid(
            index,
            &label,
            "has an invalid 'destination' field (must be a non-empty string)",
        )
    })?;

    let Some(criteria) = object.get("match").and_then(Value::as_object) else {
        return Err(invalid(
            index,
            &label,
            "has invalid 'match' field (must be an object)",
        ));
    };

    if let Some(kind) = criteria.get("type") {
        let known = kind
            .as_str()
            .is_some_and(|k| LEGACY_MATCH_TYPES.contains(&k));
        if !known {
            return Err(invalid(index, &label, &format!("has invalid match type: {}", kind)));
        }
    }

    if !CRITERIA_KEYS.iter().any(|key| criteria.contains_key(*key)) {
        return Err(invalid(index, &label, "has no valid match criteria"));
    }

    let contains = string_list(criteria, "contains").map_err(|reason| invalid(index, &label, &reason))?;
    let extensions =
        string_list(criteria, "extensions").map_err(|reason| invalid(index, &label, &reason))?;
    let pattern = match criteria.get("pattern") {
        None => None,
        Some(Value::String(pattern)) => Some(pattern.as_str()),
        Some(_) => {
            return Err(invalid(
                index,
                &label,
                "has invalid 'pattern' field (must be a string)",
            ));
        }
    };

    Ok(Rule {
        name,
        criteria: MatchCriteria::new(contains, extensions, pattern),
        destination,
    })
}

fn invalid(index: usize, name: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidRule {
        index,
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn required_string(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Reads a criterion that may be a single string or a list of strings.
fn string_list(object: &Map<String, Value>, key: &str) -> Result<Option<Vec<String>>, String> {
    let shape_error = || format!("has invalid '{}' field (must be a string or a list of strings)", key);

    match object.get(key) {
        None => Ok(None),
        Some(Value::String(single)) => Ok(Some(vec![single.clone()])),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(shape_error))
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(shape_error()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::NamePattern;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_empty_rule_set() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let rules = load_rules(&temp_dir.path().join("rules.json")).expect("missing file is not an error");
        assert!(rules.is_empty());
    }

    #[test]
    fn test_unreadable_path_is_io_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir_as_file = temp_dir.path().join("rules.json");
        fs::create_dir(&dir_as_file).unwrap();

        let err = load_rules(&dir_as_file).unwrap_err();
        match &err {
            ConfigError::Io { path, .. } => assert_eq!(path, &dir_as_file),
            other => panic!("expected an I/O error, got {:?}", other),
        }
        assert!(err.to_string().contains("rules.json"));
    }

    #[test]
    fn test_load_valid_rules_preserves_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("rules.json");
        fs::write(
            &path,
            r#"{
                "rules": [
                    {"name": "Shots", "match": {"contains": "shot"}, "destination": "A"},
                    {"name": "Images", "match": {"extensions": ["PNG", ".jpg"]}, "destination": "B"}
                ]
            }"#,
        )
        .expect("Failed to write rules file");

        let rules = load_rules(&path).expect("rules should load");
        let names: Vec<_> = rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Shots", "Images"]);

        let images = rules.iter().nth(1).unwrap();
        assert_eq!(
            images.criteria.extensions,
            Some(vec![".png".to_string(), ".jpg".to_string()])
        );
        let shots = rules.iter().next().unwrap();
        assert_eq!(shots.criteria.contains, Some(vec!["shot".to_string()]));
    }

    #[test]
    fn test_malformed_json() {
        let result = RuleSet::from_json_str("{ \"rules\": [ ");
        assert!(matches!(result, Err(ConfigError::InvalidJson(_))));
    }

    #[test]
    fn test_missing_rules_key_is_empty() {
        let rules = RuleSet::from_json_str("{}").unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn test_rules_not_an_array() {
        let result = RuleSet::from_json_str(r#"{"rules": {"name": "x"}}"#);
        assert!(matches!(result, Err(ConfigError::InvalidStructure(_))));

        let result = RuleSet::from_json_str("[]");
        assert!(matches!(result, Err(ConfigError::InvalidStructure(_))));
    }

    #[test]
    fn test_rule_not_an_object() {
        let result = RuleSet::from_json_str(r#"{"rules": ["oops"]}"#);
        assert!(matches!(result, Err(ConfigError::InvalidRule { index: 0, .. })));
    }

    #[test]
    fn test_missing_destination_rejects_whole_set() {
        let result = RuleSet::from_json_str(
            r#"{"rules": [
                {"name": "Good", "match": {"contains": "a"}, "destination": "A"},
                {"name": "Bad", "match": {"contains": "b"}}
            ]}"#,
        );

        match result {
            Err(ConfigError::InvalidRule { index, name, reason }) => {
                assert_eq!(index, 1);
                assert_eq!(name, "Bad");
                assert!(reason.contains("destination"));
            }
            other => panic!("expected InvalidRule, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_name_and_match() {
        let no_name = RuleSet::from_json_str(
            r#"{"rules": [{"match": {"contains": "a"}, "destination": "A"}]}"#,
        );
        assert!(matches!(no_name, Err(ConfigError::InvalidRule { .. })));

        let no_match = RuleSet::from_json_str(r#"{"rules": [{"name": "x", "destination": "A"}]}"#);
        assert!(matches!(no_match, Err(ConfigError::InvalidRule { .. })));
    }

    #[test]
    fn test_empty_strings_rejected() {
        let result = RuleSet::from_json_str(
            r#"{"rules": [{"name": "x", "match": {"contains": "a"}, "destination": ""}]}"#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidRule { .. })));
    }

    #[test]
    fn test_match_must_be_object_with_criteria() {
        let not_object = RuleSet::from_json_str(
            r#"{"rules": [{"name": "x", "match": "png", "destination": "A"}]}"#,
        );
        assert!(matches!(not_object, Err(ConfigError::InvalidRule { .. })));

        let no_criteria = RuleSet::from_json_str(
            r#"{"rules": [{"name": "x", "match": {"other": 1}, "destination": "A"}]}"#,
        );
        match no_criteria {
            Err(e) => assert!(e.to_string().contains("no valid match criteria")),
            Ok(_) => panic!("rule without criteria should be rejected"),
        }
    }

    #[test]
    fn test_legacy_type_key() {
        let ok = RuleSet::from_json_str(
            r#"{"rules": [{"name": "x", "match": {"type": "extension", "extensions": "pdf"}, "destination": "A"}]}"#,
        );
        assert!(ok.is_ok());

        let bad = RuleSet::from_json_str(
            r#"{"rules": [{"name": "x", "match": {"type": "size", "extensions": "pdf"}, "destination": "A"}]}"#,
        );
        assert!(matches!(bad, Err(ConfigError::InvalidRule { .. })));
    }

    #[test]
    fn test_non_string_terms_rejected() {
        let result = RuleSet::from_json_str(
            r#"{"rules": [{"name": "x", "match": {"extensions": [1, 2]}, "destination": "A"}]}"#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidRule { .. })));
    }

    #[test]
    fn test_invalid_pattern_does_not_fail_load() {
        let rules = RuleSet::from_json_str(
            r#"{"rules": [{"name": "x", "match": {"pattern": "([a-z"}, "destination": "A"}]}"#,
        )
        .expect("invalid patterns are reported at match time");

        let rule = rules.iter().next().unwrap();
        assert!(matches!(rule.criteria.pattern, Some(NamePattern::Invalid { .. })));
    }

    #[test]
    fn test_locate_prefers_explicit_path() {
        let explicit = Path::new("/definitely/not/here/rules.json");
        assert_eq!(RulesConfig::locate(Some(explicit)), Some(explicit.to_path_buf()));
        let rules = RulesConfig::load(Some(explicit)).expect("absent explicit file is an empty set");
        assert!(rules.is_empty());
    }
}
