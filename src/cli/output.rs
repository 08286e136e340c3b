//! Terminal output helpers for the referent CLI.
//!
//! Commands print through these so styling stays in one place. The glyphs
//! match the doctor command's check marks.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Stateless print helpers.
pub struct Output;

impl Output {
    /// Informational line.
    pub fn info(msg: &str) {
        println!("{} {}", style(">").cyan().bold(), msg);
    }

    /// Completed-action line.
    pub fn success(msg: &str) {
        println!("{} {}", style("✓").green().bold(), msg);
    }

    /// Warning line, on stderr.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style("!").yellow().bold(), msg);
    }

    /// Error line, on stderr.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style("✗").red().bold(), msg);
    }

    /// Section header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Aligned key/value line, for the serve banner.
    pub fn kv(key: &str, value: &str) {
        let label = format!("{}:", key);
        println!("  {} {}", style(format!("{:<8}", label)).dim(), value);
    }

    /// Spinner for waits with no known length (uploads, polling).
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }
}
