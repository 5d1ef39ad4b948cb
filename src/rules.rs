//! Keyword trash rules and rule-set evaluation
//!
//! A [`TrashKeyword`] is the validated configuration record. It compiles into a
//! [`KeywordTrashRule`], which marks an email as trash when its pattern hits one
//! of the selected text fields *and* the email carries one of the required
//! labels. A [`RuleSet`] ORs its rules together.

use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use std::fmt;

use crate::error::{CleanerError, Result};
use crate::models::{Email, EmailField};
use crate::normalizer::strip_diacritics;

/// Wildcard accepted in both the field list and the label list
pub const WILDCARD: &str = "*";

/// One keyword entry from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashKeyword {
    value: String,
    fields: Vec<String>,
    labels: Vec<String>,
}

impl TrashKeyword {
    /// Validate and build a keyword
    ///
    /// Fails with [`CleanerError::InvalidKeyword`] when `value` is empty or when
    /// `fields` or `labels` is empty.
    pub fn new(
        value: impl Into<String>,
        fields: Vec<String>,
        labels: Vec<String>,
    ) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(CleanerError::InvalidKeyword(
                "value must be a non-empty pattern".to_string(),
            ));
        }
        if fields.is_empty() {
            return Err(CleanerError::InvalidKeyword(format!(
                "'{}': fields must be a non-empty list",
                value
            )));
        }
        if labels.is_empty() {
            return Err(CleanerError::InvalidKeyword(format!(
                "'{}': labels must be a non-empty list",
                value
            )));
        }

        Ok(Self {
            value,
            fields,
            labels,
        })
    }

    /// Keyword matching in every field regardless of labels
    pub fn anywhere(value: impl Into<String>) -> Result<Self> {
        Self::new(value, vec![WILDCARD.to_string()], vec![WILDCARD.to_string()])
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Decides whether a single email is trash
pub trait TrashRule: fmt::Debug + Send + Sync {
    fn is_match(&self, email: &Email) -> bool;
}

/// Which text fields a rule searches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelector {
    All,
    Only(HashSet<EmailField>),
}

impl FieldSelector {
    pub fn parse(fields: &[String]) -> Result<Self> {
        if fields.iter().any(|f| f.trim() == WILDCARD) {
            return Ok(FieldSelector::All);
        }

        let selected = fields
            .iter()
            .map(|f| f.parse::<EmailField>())
            .collect::<Result<HashSet<_>>>()?;
        Ok(FieldSelector::Only(selected))
    }

    pub fn selects(&self, field: EmailField) -> bool {
        match self {
            FieldSelector::All => true,
            FieldSelector::Only(fields) => fields.contains(&field),
        }
    }
}

/// Which labels an email must carry for a rule to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelSelector {
    Any,
    AnyOf(HashSet<String>),
}

impl LabelSelector {
    pub fn parse(labels: &[String]) -> Self {
        if labels.iter().any(|l| l.trim() == WILDCARD) {
            return LabelSelector::Any;
        }

        LabelSelector::AnyOf(labels.iter().map(|l| l.trim().to_lowercase()).collect())
    }

    pub fn accepts(&self, email_labels: &[String]) -> bool {
        match self {
            LabelSelector::Any => true,
            LabelSelector::AnyOf(required) => email_labels
                .iter()
                .any(|label| required.contains(&label.to_lowercase())),
        }
    }
}

/// Compiled form of a [`TrashKeyword`]
#[derive(Debug, Clone)]
pub struct KeywordTrashRule {
    pattern: Regex,
    fields: FieldSelector,
    labels: LabelSelector,
}

impl KeywordTrashRule {
    pub fn new(keyword: &TrashKeyword) -> Result<Self> {
        let source = strip_diacritics(keyword.value());
        let pattern = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                CleanerError::InvalidKeyword(format!("'{}': {}", keyword.value(), e))
            })?;

        Ok(Self {
            pattern,
            fields: FieldSelector::parse(keyword.fields())?,
            labels: LabelSelector::parse(keyword.labels()),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn field_selector(&self) -> &FieldSelector {
        &self.fields
    }

    pub fn label_selector(&self) -> &LabelSelector {
        &self.labels
    }

    fn has_field_hit(&self, email: &Email) -> bool {
        EmailField::ALL
            .iter()
            .filter(|field| self.fields.selects(**field))
            .any(|field| self.pattern.is_match(email.field(*field)))
    }
}

impl TrashRule for KeywordTrashRule {
    fn is_match(&self, email: &Email) -> bool {
        self.has_field_hit(email) && self.labels.accepts(&email.labels)
    }
}

/// Ordered rules evaluated with OR semantics
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn TrashRule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Compile one keyword rule per keyword, failing on the first invalid one
    pub fn from_keywords(keywords: &[TrashKeyword]) -> Result<Self> {
        let rules = keywords
            .iter()
            .map(|keyword| {
                KeywordTrashRule::new(keyword).map(|rule| Box::new(rule) as Box<dyn TrashRule>)
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Compiled {} trash rules", rules.len());
        Ok(Self { rules })
    }

    pub fn push(&mut self, rule: impl TrashRule + 'static) {
        self.rules.push(Box::new(rule));
    }

    /// True if any rule matches; an empty set never matches
    pub fn is_trash_email(&self, email: &Email) -> bool {
        self.rules.iter().any(|rule| rule.is_match(email))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
