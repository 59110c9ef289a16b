use crate::jobs::{Job, JobStatus};
use crate::ui::icons::{CHECK, CROSS, FOLDER, LINK, ROCKET, SPARKLE};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// Terminal view of one generation job, rendered as a single `indicatif` bar
/// on the 0-100 progress scale. Fed with job snapshots polled from the store.
pub struct JobProgressUI {
    bar: ProgressBar,
    last_message: Mutex<String>,
}

impl JobProgressUI {
    pub fn new(site_slug: &str, site_dir: &Path) -> Self {
        let bar_style = ProgressStyle::default_bar()
            .template("{spinner} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .expect("progress bar template is a valid static string")
            .progress_chars("█▓▒░");

        let bar = ProgressBar::new(100);
        bar.set_style(bar_style);
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.println(format!(
            "{}Generating {} in {}{}",
            ROCKET,
            style(site_slug).bold(),
            FOLDER,
            style(site_dir.display()).dim()
        ));

        Self {
            bar,
            last_message: Mutex::new(String::new()),
        }
    }

    /// Reflect a snapshot. Each new status line is also printed once above the
    /// bar so the phase history stays visible.
    pub fn update(&self, job: &Job) {
        self.bar.set_position(u64::from(job.progress));
        self.bar.set_message(job.message.clone());

        let mut last = self
            .last_message
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *last != job.message {
            self.bar.println(format!(
                "  {} {}",
                style(format!("{:>3}%", job.progress)).dim(),
                job.message
            ));
            *last = job.message.clone();
        }
    }

    /// Final summary for a terminal job.
    pub fn finish(&self, job: &Job) {
        self.update(job);
        match job.status {
            JobStatus::Completed => {
                self.bar.finish_with_message(format!(
                    "{}{}",
                    CHECK,
                    style(&job.message).green().bold()
                ));
                if let Some(url) = &job.repo_url {
                    println!("  {}Repository: {}", LINK, style(url).cyan());
                }
                if let Some(url) = &job.site_url {
                    println!("  {}Site:       {}", SPARKLE, style(url).cyan().bold());
                }
            }
            _ => {
                self.bar.abandon_with_message(format!(
                    "{}{}",
                    CROSS,
                    style(&job.message).red().bold()
                ));
                if let Some(error) = &job.error {
                    eprintln!("\n{}", style(error).red());
                }
            }
        }
    }
}
