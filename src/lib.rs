//! Trash Cleaner
//!
//! Finds unread emails that match configured trash keywords and deletes them
//! in one batch.
//!
//! # Overview
//!
//! - **Rules**: each keyword is a case-insensitive regex scoped to some email
//!   fields (`snippet`, `subject`, `from`, `body`) and some labels, `*` meaning
//!   any. An email is trash when any rule matches it.
//! - **Normalization**: before matching, labels are lower-cased and diacritics
//!   are stripped from text fields, so `Ápplé` matches `apple`.
//! - **Cleaning**: [`TrashCleaner`] fetches unread emails through an
//!   [`EmailClient`], classifies them, and deletes the trash unless running dry.
//!   Progress goes to a [`ProgressReporter`].
//!
//! # Example Usage
//!
//! ```no_run
//! use trash_cleaner::{
//!     auth, config, Config, ConsoleProgressReporter, FileSystemConfigStore,
//!     GmailEmailClient, RunMode, TrashCleaner,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = FileSystemConfigStore::new("config")?;
//!     let config = Config::load(&store.path(config::FILE_CONFIG)).await?;
//!     let keywords = config::load_keywords(&store).await?;
//!
//!     let hub = auth::initialize_gmail_hub(&store, false).await?;
//!     let client = GmailEmailClient::new(hub, &config.client);
//!     let reporter = ConsoleProgressReporter::new(RunMode::Interactive);
//!
//!     let cleaner = TrashCleaner::new(client, &keywords, reporter)?;
//!     cleaner.clean_trash(true).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`models`] - The normalized email shape
//! - [`normalizer`] - Label case-folding and diacritic stripping
//! - [`rules`] - Trash keywords, rules and rule sets
//! - [`cleaner`] - Cleanup orchestration
//! - [`client`] - Email source trait and retry helper
//! - [`gmail`] - Gmail email source
//! - [`auth`] - OAuth2 authentication and Gmail API initialization
//! - [`reporter`] - Progress reporting
//! - [`store`] - Configuration document storage
//! - [`config`] - Application settings and keyword loading
//! - [`cli`] - Command-line interface
//! - [`error`] - Error types and result aliases

pub mod auth;
pub mod cleaner;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod gmail;
pub mod models;
pub mod normalizer;
pub mod reporter;
pub mod rules;
pub mod store;

// Re-export commonly used types for convenience
pub use error::{CleanerError, Result};

pub use models::{Email, EmailField};
pub use normalizer::{normalize_email, strip_diacritics};
pub use rules::{KeywordTrashRule, RuleSet, TrashKeyword, TrashRule};

pub use cleaner::{CleanupReport, TrashCleaner};
pub use client::EmailClient;
pub use gmail::GmailEmailClient;
pub use reporter::{ConsoleProgressReporter, NoopProgressReporter, ProgressReporter, RunMode};

pub use config::Config;
pub use store::{ConfigStore, FileSystemConfigStore};
