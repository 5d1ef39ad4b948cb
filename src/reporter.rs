//! Progress reporting for cleanup runs
//!
//! The cleaner never prints anything itself; it notifies a [`ProgressReporter`]
//! at each step of the run. [`ConsoleProgressReporter`] renders those events
//! with an indicatif spinner (or as log events when running headless) and
//! prints a summary once the run stops.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

use crate::models::Email;

/// Receives lifecycle notifications from the cleaner
///
/// Every callback defaults to a no-op so implementations only override what
/// they care about.
pub trait ProgressReporter: Send + Sync {
    /// Cleaning has started
    fn on_start(&self, _dry_run: bool) {}

    /// Unread emails are being retrieved
    fn on_retrieving_unread_emails(&self) {}

    /// Unread emails were retrieved
    fn on_unread_emails_retrieved(&self, _emails: &[Email]) {}

    /// Trash emails were identified
    fn on_trash_emails_identified(&self, _trash_emails: &[Email]) {}

    /// Trash emails are being deleted
    fn on_deleting_trash(&self) {}

    /// Trash emails were deleted (or skipped in dry-run mode)
    fn on_trash_deleted(&self) {}

    /// Cleaning has stopped, successfully or not
    fn on_stop(&self) {}
}

/// Reporter that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressReporter;

impl ProgressReporter for NoopProgressReporter {}

/// How the binary is being run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Attached to a terminal: show a spinner
    Interactive,
    /// Scheduled or hosted: report through log events only
    Headless,
}

#[derive(Debug, Default)]
struct RunSummary {
    dry_run: bool,
    unread_email_count: usize,
    trash_emails: Vec<Email>,
}

/// Reporter that shows progress on the console and prints a summary on stop
///
/// The summary goes through the `MultiProgress` when it is drawing, and to
/// the plain output (stdout by default) when headless or when the progress
/// target is hidden, e.g. because stderr is not a terminal.
pub struct ConsoleProgressReporter {
    multi: MultiProgress,
    mode: RunMode,
    spinner: Mutex<Option<ProgressBar>>,
    summary: Mutex<RunSummary>,
    output: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleProgressReporter {
    pub fn new(mode: RunMode) -> Self {
        Self::with_multi_progress(MultiProgress::new(), mode)
    }

    /// Use a shared MultiProgress so log lines print above the spinner
    pub fn with_multi_progress(multi: MultiProgress, mode: RunMode) -> Self {
        Self {
            multi,
            mode,
            spinner: Mutex::new(None),
            summary: Mutex::new(RunSummary::default()),
            output: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Print the plain summary to `output` instead of stdout
    pub fn with_output(mut self, output: impl Write + Send + 'static) -> Self {
        self.output = Mutex::new(Box::new(output));
        self
    }

    pub fn multi_progress(&self) -> &MultiProgress {
        &self.multi
    }

    /// Lines printed when the run stops: each trash email, then the totals
    pub fn summary_lines(&self) -> Vec<String> {
        let summary = self.summary.lock().unwrap_or_else(|e| e.into_inner());
        let mut lines = Vec::new();

        for email in &summary.trash_emails {
            lines.push(format!("From: {}", email.from));
            lines.push(format!("Labels: {}", email.labels.join(",")));
            lines.push(format!("Subject: {}", email.subject));
            lines.push(format!("Snippet: {}", email.snippet));
            lines.push(format!("Body: {}", email.body));
            lines.push("-".repeat(60));
        }

        lines.push(format!(
            "Total no. of unread emails: {}",
            summary.unread_email_count
        ));
        lines.push(format!(
            "Total no. of trash emails: {}",
            summary.trash_emails.len()
        ));
        if summary.dry_run {
            lines.push(String::new());
            lines.push("Emails not deleted in dry-run mode.".to_string());
        }

        lines
    }

    fn update(&self, message: String) {
        match self.mode {
            RunMode::Interactive => {
                let spinner = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
                if let Some(pb) = spinner.as_ref() {
                    pb.set_message(message);
                }
            }
            RunMode::Headless => info!("{}", message),
        }
    }

    fn start_spinner(&self) {
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed:>6}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");

        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(250));

        let mut spinner = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = spinner.replace(pb) {
            previous.finish_and_clear();
        }
    }

    fn stop_spinner(&self) {
        let mut spinner = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pb) = spinner.take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn on_start(&self, dry_run: bool) {
        {
            let mut summary = self.summary.lock().unwrap_or_else(|e| e.into_inner());
            *summary = RunSummary {
                dry_run,
                ..Default::default()
            };
        }

        if self.mode == RunMode::Interactive {
            self.start_spinner();
        }
        self.update("Starting cleaning...".to_string());
    }

    fn on_retrieving_unread_emails(&self) {
        self.update("Retrieving emails...".to_string());
    }

    fn on_unread_emails_retrieved(&self, emails: &[Email]) {
        self.summary
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .unread_email_count = emails.len();
        self.update(format!("Retrieved {} emails.", emails.len()));
    }

    fn on_trash_emails_identified(&self, trash_emails: &[Email]) {
        self.summary
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .trash_emails = trash_emails.to_vec();
        self.update(format!("Found {} trash emails.", trash_emails.len()));
    }

    fn on_deleting_trash(&self) {
        self.update("Deleting trash emails...".to_string());
    }

    fn on_trash_deleted(&self) {
        let dry_run = self.summary.lock().unwrap_or_else(|e| e.into_inner()).dry_run;
        self.update(format!(
            "Trash emails{} deleted.",
            if dry_run { " not" } else { "" }
        ));
    }

    fn on_stop(&self) {
        self.stop_spinner();
        let lines = self.summary_lines();

        if self.mode == RunMode::Interactive && !self.multi.is_hidden() {
            for line in lines {
                let _ = self.multi.println(line);
            }
            return;
        }

        let mut output = self.output.lock().unwrap_or_else(|e| e.into_inner());
        for line in lines {
            let _ = writeln!(output, "{}", line);
        }
        let _ = output.flush();
    }
}
