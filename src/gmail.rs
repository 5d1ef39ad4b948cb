//! Gmail implementation of [`EmailClient`]

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use google_gmail1::api::{BatchDeleteMessagesRequest, Message, MessagePart};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::auth::{GmailHub, MAIL_SCOPE};
use crate::client::{with_retry, EmailClient};
use crate::config::ClientConfig;
use crate::error::{CleanerError, Result};
use crate::models::Email;

/// Page size for message listing
const LIST_PAGE_SIZE: u32 = 100;
/// Gmail accepts at most 1000 ids per batchDelete call
const BATCH_DELETE_LIMIT: usize = 1000;
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Gmail mailbox accessed through the REST API
pub struct GmailEmailClient {
    hub: GmailHub,
    rate_limiter: Arc<Semaphore>,
    max_concurrent: usize,
    max_retries: u32,
}

impl GmailEmailClient {
    pub fn new(hub: GmailHub, config: &ClientConfig) -> Self {
        let max_concurrent = config.max_concurrent_requests.max(1);
        Self {
            hub,
            rate_limiter: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            max_retries: config.max_retries,
        }
    }

    /// Address of the authenticated account
    pub async fn account_address(&self) -> Result<String> {
        let (_, profile) = with_retry(
            "get_profile",
            self.max_retries,
            INITIAL_RETRY_DELAY,
            move || async move {
                self.hub
                    .users()
                    .get_profile("me")
                    .add_scope(MAIL_SCOPE)
                    .doit()
                    .await
                    .map_err(CleanerError::from)
            },
        )
        .await?;

        Ok(profile.email_address.unwrap_or_default())
    }

    async fn list_unread_ids(&self) -> Result<Vec<String>> {
        let mut all_ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let token = page_token.clone();
            let (_, response) = with_retry(
                "list_messages",
                self.max_retries,
                INITIAL_RETRY_DELAY,
                move || {
                    let token = token.clone();
                    async move {
                        let mut call = self
                            .hub
                            .users()
                            .messages_list("me")
                            .add_label_ids("UNREAD")
                            .include_spam_trash(true)
                            .max_results(LIST_PAGE_SIZE);

                        if let Some(token) = token.as_ref() {
                            call = call.page_token(token);
                        }

                        call.add_scope(MAIL_SCOPE)
                            .doit()
                            .await
                            .map_err(CleanerError::from)
                    }
                },
            )
            .await?;

            if let Some(messages) = response.messages {
                all_ids.extend(messages.into_iter().filter_map(|msg_ref| msg_ref.id));
            }

            page_token = response.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        debug!("Listed {} unread message ids", all_ids.len());
        Ok(all_ids)
    }

    async fn fetch_email(&self, id: &str) -> Result<Email> {
        let _permit = self.rate_limiter.acquire().await.map_err(|e| {
            CleanerError::ApiError(format!("Failed to acquire rate limit permit: {}", e))
        })?;

        let (_, message) = with_retry(
            "get_message",
            self.max_retries,
            INITIAL_RETRY_DELAY,
            move || async move {
                self.hub
                    .users()
                    .messages_get("me", id)
                    .format("full")
                    .add_scope(MAIL_SCOPE)
                    .doit()
                    .await
                    .map_err(CleanerError::from)
            },
        )
        .await?;

        parse_message(message)
    }
}

#[async_trait]
impl EmailClient for GmailEmailClient {
    async fn get_unread_emails(&self) -> Result<Vec<Email>> {
        let ids = self
            .list_unread_ids()
            .await
            .map_err(|e| e.into_fetch_failed())?;

        // buffered keeps listing order while the semaphore bounds in-flight requests
        let emails: Vec<Email> = stream::iter(ids)
            .map(|id| async move { self.fetch_email(&id).await })
            .buffered(self.max_concurrent)
            .try_collect()
            .await
            .map_err(|e: CleanerError| e.into_fetch_failed())?;

        info!("Fetched {} unread emails", emails.len());
        Ok(emails)
    }

    async fn delete_emails(&self, emails: &[Email]) -> Result<()> {
        if emails.is_empty() {
            return Ok(());
        }

        let ids: Vec<String> = emails.iter().map(|email| email.id.clone()).collect();
        for chunk in ids.chunks(BATCH_DELETE_LIMIT) {
            with_retry(
                "batch_delete",
                self.max_retries,
                INITIAL_RETRY_DELAY,
                move || async move {
                    let request = BatchDeleteMessagesRequest {
                        ids: Some(chunk.to_vec()),
                    };
                    self.hub
                        .users()
                        .messages_batch_delete(request, "me")
                        .add_scope(MAIL_SCOPE)
                        .doit()
                        .await
                        .map_err(CleanerError::from)
                },
            )
            .await
            .map_err(|e| e.into_delete_failed())?;

            debug!("Deleted batch of {} messages", chunk.len());
        }

        info!("Deleted {} messages", ids.len());
        Ok(())
    }
}

/// Map a Gmail API message to an [`Email`]
fn parse_message(message: Message) -> Result<Email> {
    let id = message
        .id
        .ok_or_else(|| CleanerError::InvalidMessageFormat("Missing message ID".to_string()))?;

    let payload = message.payload.as_ref();
    let mut email = Email::new(id);
    email.labels = message.label_ids.unwrap_or_default();
    email.snippet = message.snippet.unwrap_or_default();
    email.subject = payload
        .and_then(|p| header_value(p, "Subject"))
        .unwrap_or_default();
    email.from = payload
        .and_then(|p| header_value(p, "From"))
        .unwrap_or_default();
    email.body = payload.map(message_body).unwrap_or_default();

    Ok(email)
}

fn header_value(part: &MessagePart, name: &str) -> Option<String> {
    part.headers
        .as_ref()?
        .iter()
        .find(|header| {
            header
                .name
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
        .and_then(|header| header.value.clone())
}

/// Concatenated body data of a part and all of its nested parts
fn message_body(part: &MessagePart) -> String {
    let mut body = String::new();
    collect_body(part, &mut body);
    body
}

fn collect_body(part: &MessagePart, body: &mut String) {
    if let Some(data) = part.body.as_ref().and_then(|b| b.data.as_ref()) {
        body.push_str(&String::from_utf8_lossy(data));
    }

    for child in part.parts.iter().flatten() {
        collect_body(child, body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use google_gmail1::api::{MessagePartBody, MessagePartHeader};

    fn header(name: &str, value: &str) -> MessagePartHeader {
        MessagePartHeader {
            name: Some(name.to_string()),
            value: Some(value.to_string()),
        }
    }

    fn text_part(data: &str) -> MessagePart {
        MessagePart {
            body: Some(MessagePartBody {
                data: Some(data.as_bytes().to_vec()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_message_maps_fields() {
        let message = Message {
            id: Some("abc".to_string()),
            label_ids: Some(vec!["UNREAD".to_string(), "SPAM".to_string()]),
            snippet: Some("Cheap stuff".to_string()),
            payload: Some(MessagePart {
                headers: Some(vec![
                    header("From", "Deals <deals@shop.com>"),
                    header("Subject", "Sale"),
                ]),
                ..text_part("Buy now")
            }),
            ..Default::default()
        };

        let email = parse_message(message).unwrap();
        assert_eq!(email.id, "abc");
        assert_eq!(email.labels, vec!["UNREAD", "SPAM"]);
        assert_eq!(email.snippet, "Cheap stuff");
        assert_eq!(email.from, "Deals <deals@shop.com>");
        assert_eq!(email.subject, "Sale");
        assert_eq!(email.body, "Buy now");
    }

    #[test]
    fn test_parse_message_missing_id() {
        let result = parse_message(Message::default());
        assert!(matches!(result, Err(CleanerError::InvalidMessageFormat(_))));
    }

    #[test]
    fn test_parse_message_without_payload_has_empty_fields() {
        let message = Message {
            id: Some("abc".to_string()),
            ..Default::default()
        };

        let email = parse_message(message).unwrap();
        assert!(email.labels.is_empty());
        assert_eq!(email.subject, "");
        assert_eq!(email.from, "");
        assert_eq!(email.body, "");
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let part = MessagePart {
            headers: Some(vec![header("subject", "lower")]),
            ..Default::default()
        };
        assert_eq!(header_value(&part, "Subject"), Some("lower".to_string()));
        assert_eq!(header_value(&part, "From"), None);
    }

    #[test]
    fn test_multipart_body_is_concatenated() {
        let part = MessagePart {
            parts: Some(vec![
                text_part("plain "),
                MessagePart {
                    parts: Some(vec![text_part("nested")]),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        };

        assert_eq!(message_body(&part), "plain nested");
    }
}
