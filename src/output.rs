//! Output formatting and styling module.
//!
//! All user-facing console output goes through [`OutputFormatter`]. The
//! library modules never print; they return outcomes and emit `tracing`
//! events, and the orchestrator hands the outcomes to this module.

use crate::cli::RunSummary;
use crate::file_organizer::{MoveOutcome, OrganizeError};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use cleanify::output::OutputFormatter;
    /// OutputFormatter::error("Path does not exist: /nowhere");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for a run over `total` files.
    ///
    /// The bar draws to stderr and stays hidden when stderr is not a terminal.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Reports a file that no rule matched.
    pub fn skipped(file_name: &str) {
        println!(
            "{} {} {}",
            "[SKIP]".dimmed(),
            file_name,
            "(no matching rule)".dimmed()
        );
    }

    /// Reports a matched file that stays where it is because its rule points
    /// at the scanned directory itself.
    pub fn in_place(file_name: &str, rule_name: &str) {
        println!(
            "{} {} {}",
            "[KEEP]".dimmed(),
            file_name,
            format!("(rule '{}' targets the scanned folder)", rule_name).dimmed()
        );
    }

    /// Reports the outcome of moving (or planning to move) a file.
    ///
    /// `destination` is the destination directory as shown to the user,
    /// relative to the scanned directory.
    pub fn move_outcome(file_name: &str, destination: &str, outcome: &MoveOutcome) {
        match outcome {
            MoveOutcome::WouldMove { .. } => {
                let target = Self::target_label(destination, outcome);
                println!(
                    "{} Would move: {} → {}",
                    "[DRY RUN]".yellow(),
                    file_name,
                    target
                );
            }
            MoveOutcome::Moved { .. } => {
                let target = Self::target_label(destination, outcome);
                println!("{} {} → {}", "[MOVE]".green(), file_name, target);
            }
        }
    }

    /// `dest/` when the name is unchanged, `dest/new-name` when renamed.
    fn target_label(destination: &str, outcome: &MoveOutcome) -> String {
        let new_name = outcome
            .destination()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if outcome.renamed() {
            format!("{}/{}", destination, new_name)
        } else {
            format!("{}/", destination)
        }
    }

    /// Reports a file that could not be moved.
    pub fn move_failed(file_name: &str, error: &OrganizeError) {
        eprintln!("{} {}: {}", "[ERROR]".red(), file_name, error);
    }

    /// Prints the end-of-run summary, including per-destination counts.
    pub fn summary(summary: &RunSummary) {
        Self::header("SUMMARY");

        if !summary.destination_counts.is_empty() {
            let width = summary
                .destination_counts
                .keys()
                .map(|name| name.len())
                .max()
                .unwrap_or(0)
                .max(11); // "Destination"

            println!("{:<width$} | {}", "Destination".bold(), "Files".bold(), width = width);
            println!("{}", "-".repeat(width + 10));
            for (destination, count) in &summary.destination_counts {
                let file_word = if *count == 1 { "file" } else { "files" };
                println!(
                    "{:<width$} | {} {}",
                    destination,
                    count.to_string().green(),
                    file_word,
                    width = width
                );
            }
            println!("{}", "-".repeat(width + 10));
        }

        println!(
            "{} classified, {} skipped",
            summary.classified.to_string().green(),
            summary.skipped.to_string().yellow()
        );
        if summary.in_place > 0 {
            Self::warning(&format!(
                "{} file(s) left in place: their rule targets the scanned folder",
                summary.in_place
            ));
        }

        if summary.dry_run {
            if summary.errors > 0 {
                Self::warning(&format!("{} file(s) could not be planned", summary.errors));
            }
            Self::success("Dry run complete. No files were moved.");
        } else {
            println!(
                "Files moved: {}, Errors: {}",
                summary.moved.to_string().green(),
                if summary.errors > 0 {
                    summary.errors.to_string().red()
                } else {
                    summary.errors.to_string().normal()
                }
            );
            if summary.errors > 0 {
                Self::warning("Some files could not be organized. Please review errors above.");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_target_label_plain() {
        let outcome = MoveOutcome::WouldMove {
            to: PathBuf::from("/base/Images/photo.png"),
            renamed: false,
        };
        assert_eq!(OutputFormatter::target_label("Images", &outcome), "Images/");
    }

    #[test]
    fn test_target_label_renamed() {
        let outcome = MoveOutcome::Moved {
            to: PathBuf::from("/base/Images/photo(1).png"),
            renamed: true,
        };
        assert_eq!(
            OutputFormatter::target_label("Images", &outcome),
            "Images/photo(1).png"
        );
    }
}
