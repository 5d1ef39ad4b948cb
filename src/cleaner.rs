//! Cleanup orchestration: fetch unread, classify, delete

use tracing::{debug, info};

use crate::client::EmailClient;
use crate::error::Result;
use crate::models::Email;
use crate::normalizer::normalize_email;
use crate::reporter::ProgressReporter;
use crate::rules::{RuleSet, TrashKeyword};

/// Outcome of a cleanup run
#[derive(Debug, Clone, Default)]
pub struct CleanupReport {
    pub dry_run: bool,
    pub unread_count: usize,
    /// Normalized trash emails, in fetch order
    pub trash: Vec<Email>,
    /// True only when the provider accepted the delete
    pub deleted: bool,
}

impl CleanupReport {
    pub fn trash_ids(&self) -> Vec<&str> {
        self.trash.iter().map(|email| email.id.as_str()).collect()
    }
}

/// Cleans trash emails from a mailbox
///
/// The run is strictly sequential: fetch, then normalize and filter, then
/// delete. The reporter always receives `on_stop`, even when the run fails.
pub struct TrashCleaner<C, R> {
    client: C,
    rules: RuleSet,
    reporter: R,
}

impl<C, R> TrashCleaner<C, R>
where
    C: EmailClient,
    R: ProgressReporter,
{
    /// Compile `keywords` into rules; an invalid keyword fails before any fetch
    pub fn new(client: C, keywords: &[TrashKeyword], reporter: R) -> Result<Self> {
        let rules = RuleSet::from_keywords(keywords)?;
        Ok(Self::with_rules(client, rules, reporter))
    }

    pub fn with_rules(client: C, rules: RuleSet, reporter: R) -> Self {
        Self {
            client,
            rules,
            reporter,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// True if any rule marks the email as trash
    pub fn is_trash_email(&self, email: &Email) -> bool {
        self.rules.is_trash_email(email)
    }

    /// Run one cleanup; with `dry_run` trash is identified but not deleted
    pub async fn clean_trash(&self, dry_run: bool) -> Result<CleanupReport> {
        self.reporter.on_start(dry_run);
        let result = self.run(dry_run).await;
        self.reporter.on_stop();
        result
    }

    async fn run(&self, dry_run: bool) -> Result<CleanupReport> {
        let (trash, unread_count) = self.find_trash_emails().await?;
        let mut report = CleanupReport {
            dry_run,
            unread_count,
            trash,
            deleted: false,
        };

        if report.trash.is_empty() {
            info!("No trash emails found");
            return Ok(report);
        }

        self.reporter.on_deleting_trash();
        if dry_run {
            info!(
                "Dry run: leaving {} trash emails in place",
                report.trash.len()
            );
        } else {
            self.client
                .delete_emails(&report.trash)
                .await
                .map_err(|e| e.into_delete_failed())?;
            report.deleted = true;
            info!("Deleted {} trash emails", report.trash.len());
        }
        self.reporter.on_trash_deleted();

        Ok(report)
    }

    /// Fetch unread emails and keep the trash; returns (trash, unread count)
    async fn find_trash_emails(&self) -> Result<(Vec<Email>, usize)> {
        self.reporter.on_retrieving_unread_emails();
        let emails = self
            .client
            .get_unread_emails()
            .await
            .map_err(|e| e.into_fetch_failed())?;
        self.reporter.on_unread_emails_retrieved(&emails);

        let unread_count = emails.len();
        debug!("Classifying {} unread emails", unread_count);

        let trash: Vec<Email> = emails
            .into_iter()
            .map(|mut email| {
                normalize_email(&mut email);
                email
            })
            .filter(|email| self.rules.is_trash_email(email))
            .collect();

        self.reporter.on_trash_emails_identified(&trash);
        Ok((trash, unread_count))
    }
}
