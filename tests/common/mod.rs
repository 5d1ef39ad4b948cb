//! Common test utilities and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use mockall::mock;
use std::sync::Mutex;
use trash_cleaner::error::{CleanerError, Result};
use trash_cleaner::models::Email;
use trash_cleaner::reporter::ProgressReporter;
use trash_cleaner::rules::TrashKeyword;

/// Create an unread email with the given labels and body
pub fn create_test_email(id: &str, labels: &[&str], body: &str) -> Email {
    Email {
        id: id.to_string(),
        labels: labels.iter().map(|l| l.to_string()).collect(),
        snippet: body.chars().take(20).collect(),
        subject: format!("Subject {}", id),
        from: "Sender <sender@example.com>".to_string(),
        body: body.to_string(),
    }
}

/// Keyword scoped to the given fields and labels
pub fn keyword(value: &str, fields: &[&str], labels: &[&str]) -> TrashKeyword {
    TrashKeyword::new(
        value,
        fields.iter().map(|f| f.to_string()).collect(),
        labels.iter().map(|l| l.to_string()).collect(),
    )
    .expect("valid test keyword")
}

mock! {
    pub Mailbox {}

    #[async_trait]
    impl trash_cleaner::client::EmailClient for Mailbox {
        async fn get_unread_emails(&self) -> Result<Vec<Email>>;
        async fn delete_emails(&self, emails: &[Email]) -> Result<()>;
    }
}

/// In-memory mailbox that removes deleted emails from its unread list
#[derive(Default)]
pub struct InMemoryMailbox {
    unread: Mutex<Vec<Email>>,
    delete_calls: Mutex<Vec<Vec<String>>>,
    fail_fetch: bool,
}

impl InMemoryMailbox {
    pub fn with_emails(emails: Vec<Email>) -> Self {
        Self {
            unread: Mutex::new(emails),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_fetch: true,
            ..Default::default()
        }
    }

    pub fn delete_calls(&self) -> Vec<Vec<String>> {
        self.delete_calls.lock().unwrap().clone()
    }

    pub fn remaining_ids(&self) -> Vec<String> {
        self.unread
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.id.clone())
            .collect()
    }
}

#[async_trait]
impl trash_cleaner::client::EmailClient for InMemoryMailbox {
    async fn get_unread_emails(&self) -> Result<Vec<Email>> {
        if self.fail_fetch {
            return Err(CleanerError::AuthError("token revoked".to_string()));
        }
        Ok(self.unread.lock().unwrap().clone())
    }

    async fn delete_emails(&self, emails: &[Email]) -> Result<()> {
        let ids: Vec<String> = emails.iter().map(|e| e.id.clone()).collect();
        self.unread.lock().unwrap().retain(|e| !ids.contains(&e.id));
        self.delete_calls.lock().unwrap().push(ids);
        Ok(())
    }
}

/// Reporter that records the name of every event it receives
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| e.as_str() == event).count()
    }

    fn record(&self, event: &str) {
        self.events.lock().unwrap().push(event.to_string());
    }
}

impl ProgressReporter for RecordingReporter {
    fn on_start(&self, _dry_run: bool) {
        self.record("start");
    }
    fn on_retrieving_unread_emails(&self) {
        self.record("retrieving");
    }
    fn on_unread_emails_retrieved(&self, _emails: &[Email]) {
        self.record("retrieved");
    }
    fn on_trash_emails_identified(&self, _trash_emails: &[Email]) {
        self.record("identified");
    }
    fn on_deleting_trash(&self) {
        self.record("deleting");
    }
    fn on_trash_deleted(&self) {
        self.record("deleted");
    }
    fn on_stop(&self) {
        self.record("stop");
    }
}
