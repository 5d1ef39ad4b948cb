use anyhow::Result;
use clap::Parser;
use indicatif::MultiProgress;
use std::io::Write;
use std::process;
use std::sync::Arc;
use trash_cleaner::cli::{self, Cli, Commands};
use trash_cleaner::error::CleanerError;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// A writer that prints through MultiProgress to avoid progress bar conflicts
#[derive(Clone)]
struct MultiProgressWriter {
    multi: Arc<MultiProgress>,
    buffer: Arc<std::sync::Mutex<Vec<u8>>>,
}

impl MultiProgressWriter {
    fn new(multi: Arc<MultiProgress>) -> Self {
        Self {
            multi,
            buffer: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }
}

impl Write for MultiProgressWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        if !buffer.is_empty() {
            let msg = String::from_utf8_lossy(&buffer);
            let msg = msg.trim_end_matches('\n');
            if !msg.is_empty() {
                let _ = self.multi.println(msg);
            }
            buffer.clear();
        }
        Ok(())
    }
}

impl Drop for MultiProgressWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// MakeWriter implementation for tracing
#[derive(Clone)]
struct MultiProgressMakeWriter {
    multi: Arc<MultiProgress>,
}

impl<'a> MakeWriter<'a> for MultiProgressMakeWriter {
    type Writer = MultiProgressWriter;

    fn make_writer(&'a self) -> Self::Writer {
        MultiProgressWriter::new(Arc::clone(&self.multi))
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        display_error(&e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Several dependencies pull in rustls; pick the provider explicitly
    #[cfg(not(windows))]
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    #[cfg(windows)]
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("trash_cleaner=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("trash_cleaner=info,warn"))
    };

    // Shared with the reporter so log lines print above the spinner
    let multi_progress = Arc::new(MultiProgress::new());
    let make_writer = if writes_through_progress(cli.headless, multi_progress.is_hidden()) {
        BoxMakeWriter::new(MultiProgressMakeWriter {
            multi: Arc::clone(&multi_progress),
        })
    } else {
        // MultiProgress drops println output when it is not drawing
        BoxMakeWriter::new(std::io::stderr)
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(make_writer)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    // Headless runs are usually collected by a log pipeline
    if cli.headless {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Clean { dry_run, reconfig } => {
            let report =
                cli::run_clean(&cli, dry_run, reconfig, (*multi_progress).clone()).await?;
            tracing::debug!(
                "Cleanup finished: {} unread, {} trash, deleted={}",
                report.unread_count,
                report.trash.len(),
                report.deleted
            );
            Ok(())
        }

        Commands::Auth { force } => {
            tracing::info!("Authenticating with Gmail API...");
            let address = cli::run_auth(&cli, force).await?;
            println!("Successfully authenticated with Gmail API");
            println!("Connected to account: {}", address);
            Ok(())
        }

        Commands::InitConfig { force } => {
            let written = cli::run_init_config(&cli, force).await?;
            for path in &written {
                println!("Created {:?}", path);
            }
            println!("\nEdit keywords.json to choose what counts as trash.");
            println!(
                "Place the OAuth client secret from Google Cloud Console at {:?}.",
                cli.config_dir.join(trash_cleaner::auth::FILE_CREDENTIALS)
            );
            Ok(())
        }
    }
}

/// Log lines go through the MultiProgress only when it is drawing a spinner
fn writes_through_progress(headless: bool, progress_hidden: bool) -> bool {
    !headless && !progress_hidden
}

/// Display error with context
fn display_error(error: &anyhow::Error) {
    eprintln!("Error: {}", error);

    let mut cause = error.source();
    while let Some(e) = cause {
        eprintln!("  Caused by: {}", e);
        cause = e.source();
    }

    if let Some(err) = error.downcast_ref::<CleanerError>() {
        match err {
            CleanerError::AuthError(_) => {
                eprintln!("\nHint: Check gmail.credentials.json in the config directory.");
                eprintln!("      You can download it from Google Cloud Console.");
                eprintln!("      Try running: trash-cleaner auth --force");
            }
            CleanerError::ConfigError(_) => {
                eprintln!("\nHint: Check the config directory for errors.");
                eprintln!("      Run: trash-cleaner init-config");
            }
            CleanerError::InvalidKeyword(_) => {
                eprintln!("\nHint: Each keyword needs a valid regex `value` and non-empty");
                eprintln!("      `fields` and `labels` (use \"*\" to match everything).");
            }
            CleanerError::FetchFailed(_) => {
                eprintln!("\nHint: Nothing was deleted. This may be a temporary API error.");
                eprintln!("      Try running the command again.");
            }
            CleanerError::DeleteFailed(_) => {
                eprintln!("\nHint: Trash was identified but not deleted.");
                eprintln!("      Deleting requires the https://mail.google.com/ scope.");
                eprintln!("      Try running: trash-cleaner auth --force");
            }
            _ => {}
        }
    }
}
