//! Rule matching and first-match-wins classification.

use crate::paths::{canonicalize_lenient, resolve_destination};
use crate::rules::{NamePattern, Rule, RuleSet};
use crate::scanner::FileEntry;
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

/// The outcome of classifying a file against a rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Name of the rule that matched.
    pub rule_name: String,
    /// Destination directory relative to the scanned base directory.
    pub destination: PathBuf,
}

/// Checks whether `entry` satisfies every criterion of `rule`.
///
/// Criteria that are not set are skipped. A rule with no criteria never
/// matches. An invalid pattern counts as a non-match and is logged.
pub fn match_rule(entry: &FileEntry, rule: &Rule) -> bool {
    let criteria = &rule.criteria;
    if criteria.is_empty() {
        return false;
    }

    let lower_name = entry.name.to_lowercase();

    if let Some(terms) = &criteria.contains
        && !terms.iter().any(|term| lower_name.contains(term.as_str()))
    {
        return false;
    }

    if let Some(extensions) = &criteria.extensions
        && !extensions.contains(&entry.extension)
    {
        return false;
    }

    match &criteria.pattern {
        None => true,
        Some(NamePattern::Compiled(regex)) => regex.is_match(&entry.name),
        Some(pattern @ NamePattern::Invalid { reason, .. }) => {
            warn!(
                rule = %rule.name,
                pattern = pattern.as_str(),
                error = %reason,
                "invalid regex pattern; rule does not match"
            );
            false
        }
    }
}

/// Returns the destination of the first rule in `rules` that matches `entry`.
///
/// Rules are tried in order and evaluation stops at the first match.
///
/// # Arguments
///
/// * `entry` - The scanned file to classify
/// * `rules` - The ordered rule set
/// * `base_path` - The scanned directory that destinations are resolved against
///
/// # Returns
///
/// `Some` with the matching rule's name and its destination relative to the
/// canonical base (empty when the destination is the base itself), or `None`
/// if no rule matches.
///
/// # Examples
///
/// ```no_run
/// use cleanify::classifier::classify_file;
/// use cleanify::config::load_rules;
/// use cleanify::scanner::FileEntry;
/// use std::path::Path;
///
/// let rules = load_rules(Path::new("config/rules.json")).unwrap_or_default();
/// let entry = FileEntry::from_path(Path::new("/home/u/Desktop/invoice.pdf")).unwrap();
/// if let Some(found) = classify_file(&entry, &rules, Path::new("/home/u/Desktop")) {
///     println!("{} -> {}", found.rule_name, found.destination.display());
/// }
/// ```
pub fn classify_file(entry: &FileEntry, rules: &RuleSet, base_path: &Path) -> Option<Classification> {
    let rule = rules.iter().find(|rule| match_rule(entry, rule))?;

    let base = canonicalize_lenient(base_path);
    let resolved = resolve_destination(&base, &rule.destination);
    let destination = match resolved.strip_prefix(&base) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => resolved.clone(),
    };

    trace!(file = %entry.name, rule = %rule.name, destination = %destination.display(), "classified");
    Some(Classification {
        rule_name: rule.name.clone(),
        destination,
    })
}
