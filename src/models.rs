use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CleanerError;

/// A provider-agnostic unread message
///
/// Every field defaults to empty so rule matching never has to deal with
/// missing values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Email {
    pub id: String,
    pub labels: Vec<String>,
    pub snippet: String,
    pub subject: String,
    pub from: String,
    pub body: String,
}

impl Email {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Text value of one matchable field
    pub fn field(&self, field: EmailField) -> &str {
        match field {
            EmailField::Snippet => &self.snippet,
            EmailField::Subject => &self.subject,
            EmailField::From => &self.from,
            EmailField::Body => &self.body,
        }
    }

    pub fn field_mut(&mut self, field: EmailField) -> &mut String {
        match field {
            EmailField::Snippet => &mut self.snippet,
            EmailField::Subject => &mut self.subject,
            EmailField::From => &mut self.from,
            EmailField::Body => &mut self.body,
        }
    }
}

/// The text fields a keyword rule can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailField {
    Snippet,
    Subject,
    From,
    Body,
}

impl EmailField {
    pub const ALL: [EmailField; 4] = [
        EmailField::Snippet,
        EmailField::Subject,
        EmailField::From,
        EmailField::Body,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmailField::Snippet => "snippet",
            EmailField::Subject => "subject",
            EmailField::From => "from",
            EmailField::Body => "body",
        }
    }
}

impl fmt::Display for EmailField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmailField {
    type Err = CleanerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "snippet" => Ok(EmailField::Snippet),
            "subject" => Ok(EmailField::Subject),
            "from" => Ok(EmailField::From),
            "body" => Ok(EmailField::Body),
            other => Err(CleanerError::InvalidKeyword(format!(
                "unknown field '{}', expected one of snippet, subject, from, body or '*'",
                other
            ))),
        }
    }
}
