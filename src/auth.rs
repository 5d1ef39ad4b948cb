//! OAuth2 authentication for the Gmail API

use google_gmail1::{hyper_rustls, hyper_util, yup_oauth2, Gmail};
use yup_oauth2::ApplicationSecret;

use crate::error::{CleanerError, Result};
use crate::store::{ConfigStore, FileSystemConfigStore};

/// Store key of the OAuth2 client secret
pub const FILE_CREDENTIALS: &str = "gmail.credentials.json";
/// Store key of the cached access/refresh tokens
pub const FILE_TOKEN: &str = "gmail.token.json";

/// Full mailbox scope; batchDelete is rejected under gmail.modify
pub const MAIL_SCOPE: &str = "https://mail.google.com/";

pub const REQUIRED_SCOPES: &[&str] = &[MAIL_SCOPE];

/// Type alias for Gmail Hub to simplify type signatures
pub type GmailHub =
    Gmail<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>;

/// Read the OAuth2 client secret from the config store
pub async fn load_application_secret(store: &dyn ConfigStore) -> Result<ApplicationSecret> {
    let credentials = store.get(FILE_CREDENTIALS).await?.ok_or_else(|| {
        CleanerError::AuthError(format!(
            "{} not found in the config directory",
            FILE_CREDENTIALS
        ))
    })?;

    let content = serde_json::to_vec(&credentials)?;
    yup_oauth2::parse_application_secret(content)
        .map_err(|e| CleanerError::AuthError(format!("Failed to read credentials: {}", e)))
}

/// Initialize the Gmail API hub
///
/// Runs the installed-app flow when no cached token exists (a browser
/// redirect on localhost) and persists tokens in the config directory.
/// With `reconfig` the cached token is discarded first.
pub async fn initialize_gmail_hub(
    store: &FileSystemConfigStore,
    reconfig: bool,
) -> Result<GmailHub> {
    let secret = load_application_secret(store).await?;
    let token_path = store.path(FILE_TOKEN);

    if reconfig && token_path.exists() {
        tokio::fs::remove_file(&token_path).await?;
        tracing::info!("Removed cached token at {:?}", token_path);
    }

    let auth = yup_oauth2::InstalledFlowAuthenticator::builder(
        secret,
        yup_oauth2::InstalledFlowReturnMethod::HTTPRedirect,
    )
    .persist_tokens_to_disk(token_path)
    .build()
    .await
    .map_err(|e| CleanerError::AuthError(format!("Failed to build authenticator: {}", e)))?;

    // Obtain the token up front so the consent prompt happens before any fetch
    auth.token(REQUIRED_SCOPES)
        .await
        .map_err(|e| CleanerError::AuthError(format!("Failed to obtain token: {}", e)))?;

    let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
        .build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(|e| CleanerError::AuthError(format!("Failed to load TLS roots: {}", e)))?
                .https_or_http()
                .enable_http1()
                .build(),
        );

    Ok(Gmail::new(client, auth))
}
