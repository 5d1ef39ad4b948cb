//! Command-line interface

use clap::{Parser, Subcommand};
use indicatif::MultiProgress;
use std::path::PathBuf;
use tracing::info;

use crate::auth::{self, FILE_TOKEN};
use crate::cleaner::{CleanupReport, TrashCleaner};
use crate::config::{self, Config, FILE_CONFIG, FILE_KEYWORDS};
use crate::error::{CleanerError, Result};
use crate::gmail::GmailEmailClient;
use crate::reporter::{ConsoleProgressReporter, RunMode};
use crate::rules::RuleSet;
use crate::store::FileSystemConfigStore;

#[derive(Parser, Debug)]
#[command(name = "trash-cleaner")]
#[command(version)]
#[command(about = "Deletes unread trash emails matching configured keywords", long_about = None)]
pub struct Cli {
    /// Directory holding config.toml, keywords.json and Gmail credentials
    #[arg(short, long, default_value = "config")]
    pub config_dir: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Report progress through log lines instead of a spinner
    #[arg(long)]
    pub headless: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run_mode(&self) -> RunMode {
        if self.headless {
            RunMode::Headless
        } else {
            RunMode::Interactive
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find unread trash emails and delete them
    Clean {
        /// Identify trash without deleting anything
        #[arg(long)]
        dry_run: bool,

        /// Discard the cached token and authenticate again first
        #[arg(long)]
        reconfig: bool,
    },

    /// Authenticate with Gmail API
    Auth {
        /// Force re-authentication even if token exists
        #[arg(long)]
        force: bool,
    },

    /// Write an example config.toml and keywords.json
    InitConfig {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
}

/// Run one cleanup against the Gmail mailbox
pub async fn run_clean(
    cli: &Cli,
    dry_run: bool,
    reconfig: bool,
    multi: MultiProgress,
) -> Result<CleanupReport> {
    let store = FileSystemConfigStore::new(&cli.config_dir)?;
    let config = Config::load(&store.path(FILE_CONFIG)).await?;

    // Keywords are compiled before authenticating so a bad pattern fails fast
    let keywords = config::load_keywords(&store).await?;
    let rules = RuleSet::from_keywords(&keywords)?;
    info!("Compiled {} trash rules", rules.len());

    let hub = auth::initialize_gmail_hub(&store, reconfig).await?;
    let client = GmailEmailClient::new(hub, &config.client);
    let reporter = ConsoleProgressReporter::with_multi_progress(multi, cli.run_mode());

    let cleaner = TrashCleaner::with_rules(client, rules, reporter);
    cleaner.clean_trash(dry_run || config.execution.dry_run).await
}

/// Authenticate and return the connected account address
pub async fn run_auth(cli: &Cli, force: bool) -> Result<String> {
    let store = FileSystemConfigStore::new(&cli.config_dir)?;
    let config = Config::load(&store.path(FILE_CONFIG)).await?;

    let hub = auth::initialize_gmail_hub(&store, force).await?;
    info!("Token cached at {:?}", store.path(FILE_TOKEN));

    GmailEmailClient::new(hub, &config.client)
        .account_address()
        .await
}

/// Write example configuration files into the config directory
///
/// Returns the paths written.
pub async fn run_init_config(cli: &Cli, force: bool) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(&cli.config_dir).await.map_err(|e| {
        CleanerError::ConfigError(format!("Failed to create config directory: {}", e))
    })?;
    let store = FileSystemConfigStore::new(&cli.config_dir)?;

    let config_path = store.path(FILE_CONFIG);
    let keywords_path = store.path(FILE_KEYWORDS);
    if !force {
        if let Some(existing) = [&config_path, &keywords_path].into_iter().find(|p| p.exists()) {
            return Err(CleanerError::ConfigError(format!(
                "{:?} already exists. Use --force to overwrite.",
                existing
            )));
        }
    }

    Config::create_example(&config_path).await?;

    let keywords = serde_json::to_string_pretty(&config::example_keywords())?;
    tokio::fs::write(&keywords_path, keywords).await?;

    Ok(vec![config_path, keywords_path])
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::tempdir;

    fn cli_for(config_dir: PathBuf) -> Cli {
        Cli {
            config_dir,
            verbose: false,
            headless: true,
            command: Commands::InitConfig { force: false },
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_clean_with_defaults() {
        let cli = Cli::parse_from(["trash-cleaner", "clean", "--dry-run"]);
        assert_eq!(cli.config_dir, PathBuf::from("config"));
        assert_eq!(cli.run_mode(), RunMode::Interactive);
        assert!(matches!(
            cli.command,
            Commands::Clean {
                dry_run: true,
                reconfig: false
            }
        ));
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::parse_from([
            "trash-cleaner",
            "--config-dir",
            "/etc/trash-cleaner",
            "--headless",
            "-v",
            "auth",
            "--force",
        ]);
        assert_eq!(cli.config_dir, PathBuf::from("/etc/trash-cleaner"));
        assert!(cli.verbose);
        assert_eq!(cli.run_mode(), RunMode::Headless);
        assert!(matches!(cli.command, Commands::Auth { force: true }));
    }

    #[tokio::test]
    async fn test_init_config_writes_loadable_files() {
        let dir = tempdir().unwrap();
        let cli = cli_for(dir.path().join("config"));

        let written = run_init_config(&cli, false).await.unwrap();
        assert_eq!(written.len(), 2);

        let store = FileSystemConfigStore::new(&cli.config_dir).unwrap();
        let config = Config::load(&store.path(FILE_CONFIG)).await.unwrap();
        assert_eq!(config.client.max_concurrent_requests, 40);
        let keywords = config::load_keywords(&store).await.unwrap();
        assert_eq!(keywords.len(), 3);
    }

    #[tokio::test]
    async fn test_init_config_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let cli = cli_for(dir.path().to_path_buf());
        std::fs::write(dir.path().join(FILE_KEYWORDS), "[]").unwrap();

        let err = run_init_config(&cli, false).await.unwrap_err();
        assert!(err.to_string().contains("--force"));

        run_init_config(&cli, true).await.unwrap();
        let content = std::fs::read_to_string(dir.path().join(FILE_KEYWORDS)).unwrap();
        assert!(content.contains("unsubscribe"));
    }

    #[tokio::test]
    async fn test_clean_fails_on_missing_config_dir() {
        let dir = tempdir().unwrap();
        let cli = cli_for(dir.path().join("missing"));

        let err = run_clean(&cli, true, false, MultiProgress::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CleanerError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_clean_rejects_invalid_keywords_before_auth() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(FILE_KEYWORDS),
            r#"[{ "value": "(unclosed", "fields": "*", "labels": "*" }]"#,
        )
        .unwrap();
        let cli = cli_for(dir.path().to_path_buf());

        // No credentials exist, so reaching auth would yield AuthError instead
        let err = run_clean(&cli, true, false, MultiProgress::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CleanerError::InvalidKeyword(_)));
    }
}
