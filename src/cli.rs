//! Command-line interface module for cleanify.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Target directory validation
//! - Rule loading with graceful fallback
//! - Orchestration of scan, classify and move for each file

use crate::classifier::classify_file;
use crate::config::RulesConfig;
use crate::file_organizer::move_file;
use crate::output::OutputFormatter;
use crate::paths::{canonicalize_lenient, default_scan_dir, expand_home};
use crate::rules::RuleSet;
use crate::scanner::scan_directory;
use anyhow::{Context, bail};
use clap::{ArgAction, Parser, ValueHint};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Sort the files of a directory into subfolders using ordered rules.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory to scan and organize (defaults to your Desktop).
    #[arg(long, value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub path: Option<PathBuf>,

    /// Show what would be done without moving any files.
    #[arg(long)]
    pub dry_run: bool,

    /// Rules file to use instead of the default locations.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,
}

/// Counts collected over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Whether the run was a dry run.
    pub dry_run: bool,
    /// Files found by the scan.
    pub scanned: usize,
    /// Files matched by some rule.
    pub classified: usize,
    /// Files no rule matched.
    pub skipped: usize,
    /// Matched files whose destination is the directory they are already in.
    pub in_place: usize,
    /// Files actually moved (always zero in a dry run).
    pub moved: usize,
    /// Files whose move (or planned move) failed.
    pub errors: usize,
    /// Successfully moved or planned files per destination.
    pub destination_counts: BTreeMap<String, usize>,
}

/// Runs the application for parsed arguments.
///
/// # Errors
///
/// Fails if the target directory does not exist or is not a directory.
/// Per-file problems are reported and counted, never returned.
pub fn run_cli(cli: &Cli) -> anyhow::Result<RunSummary> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    let requested = cli.path.clone().unwrap_or_else(default_scan_dir);
    let target = resolve_target(&requested)?;

    let mode = if cli.dry_run { "DRY RUN" } else { "LIVE" };
    OutputFormatter::info(&format!("Running in {} mode.", mode));
    OutputFormatter::info(&format!("Scanning folder: {}", target.display()));

    let rules = match RulesConfig::load(cli.config.as_deref()) {
        Ok(rules) => {
            OutputFormatter::info(&format!("Loaded {} rule(s) from config.", rules.len()));
            rules
        }
        Err(e) => {
            warn!(error = %e, "could not load rules");
            OutputFormatter::warning(&format!("Could not load rules: {}", e));
            OutputFormatter::warning("Continuing with empty ruleset.");
            RuleSet::default()
        }
    };

    let summary = organize_directory(&target, &rules, cli.dry_run);
    OutputFormatter::summary(&summary);
    Ok(summary)
}

/// Expands `~`, checks that `path` is an existing directory and
/// canonicalizes it.
fn resolve_target(path: &Path) -> anyhow::Result<PathBuf> {
    let expanded = expand_home(path);
    if !expanded.exists() {
        bail!("Path does not exist: {}", expanded.display());
    }
    if !expanded.is_dir() {
        bail!("Path is not a directory: {}", expanded.display());
    }
    std::fs::canonicalize(&expanded)
        .with_context(|| format!("Could not resolve path: {}", expanded.display()))
}

/// Organizes the top-level files of `base_path` according to `rules`.
///
/// Files are processed one at a time, end to end: classify, then move (or
/// plan the move when `dry_run` is set). A file that fails is reported and
/// counted; processing continues with the next one. A file whose destination
/// resolves to the scanned directory itself is left untouched.
///
/// # Arguments
///
/// * `base_path` - The directory to organize
/// * `rules` - The ordered rule set to classify with
/// * `dry_run` - Plan the moves without touching the filesystem
///
/// # Returns
///
/// The counts collected over the run. Per-file failures are included in
/// `errors` rather than returned.
///
/// # Examples
///
/// ```no_run
/// use cleanify::cli::organize_directory;
/// use cleanify::config::load_rules;
/// use std::path::Path;
///
/// let rules = load_rules(Path::new("config/rules.json")).unwrap_or_default();
/// let summary = organize_directory(Path::new("/home/u/Desktop"), &rules, true);
/// println!("{} file(s) would move", summary.classified - summary.in_place);
/// ```
pub fn organize_directory(base_path: &Path, rules: &RuleSet, dry_run: bool) -> RunSummary {
    let base = canonicalize_lenient(base_path);
    let files = scan_directory(&base);
    let mut summary = RunSummary {
        dry_run,
        scanned: files.len(),
        ..Default::default()
    };

    OutputFormatter::info(&format!("Found {} file(s).", files.len()));
    if files.is_empty() {
        OutputFormatter::info("No files to organize.");
        return summary;
    }

    let pb = OutputFormatter::create_progress_bar(files.len() as u64);

    for entry in &files {
        pb.set_message(entry.name.clone());

        let Some(classification) = classify_file(entry, rules, &base) else {
            summary.skipped += 1;
            pb.suspend(|| OutputFormatter::skipped(&entry.name));
            pb.inc(1);
            continue;
        };

        summary.classified += 1;
        let display = classification.destination.to_string_lossy().into_owned();
        let destination_dir = base.join(&classification.destination);

        if destination_dir == base {
            summary.in_place += 1;
            warn!(
                file = %entry.name,
                rule = %classification.rule_name,
                "destination is the scanned directory; leaving file in place"
            );
            pb.suspend(|| OutputFormatter::in_place(&entry.name, &classification.rule_name));
            pb.inc(1);
            continue;
        }

        match move_file(entry, &destination_dir, dry_run, &display) {
            Ok(outcome) => {
                if !dry_run {
                    summary.moved += 1;
                }
                *summary.destination_counts.entry(display.clone()).or_insert(0) += 1;
                pb.suspend(|| OutputFormatter::move_outcome(&entry.name, &display, &outcome));
            }
            Err(e) => {
                summary.errors += 1;
                pb.suspend(|| OutputFormatter::move_failed(&entry.name, &e));
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        scanned = summary.scanned,
        classified = summary.classified,
        skipped = summary.skipped,
        in_place = summary.in_place,
        moved = summary.moved,
        errors = summary.errors,
        dry_run,
        "run complete"
    );
    summary
}
