//! Demo-request ("lead") submission
//!
//! [`ContactRequest`] is raw form input. [`ContactRequest::validate`] trims
//! every field and checks it, reporting every failing field, and yields a
//! [`Lead`] that a [`LeadSink`] stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

pub const NAME_MAX: usize = 100;
pub const EMAIL_MAX: usize = 255;
pub const COMPANY_MAX: usize = 100;
pub const FARM_SIZE_MAX: usize = 50;
pub const MESSAGE_MAX: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    /// First field error in the message; all of them in the payload
    #[error("invalid submission: {}", .0.first().map(ToString::to_string).unwrap_or_default())]
    Validation(Vec<FieldError>),
    #[error("lead transport failed: {0}")]
    Transport(#[from] std::io::Error),
    #[error("lead encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ContactError {
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ContactError::Validation(errors) => errors,
            _ => &[],
        }
    }
}

/// Form input as typed by the visitor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub farm_size: Option<String>,
    pub message: String,
}

/// A validated request, stamped when it was accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub farm_size: Option<String>,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
}

fn required(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    label: &str,
    value: &str,
    max: usize,
) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.push(FieldError::new(field, format!("{label} is required")));
    } else if value.chars().count() > max {
        errors.push(FieldError::new(
            field,
            format!("{label} must be less than {max} characters"),
        ));
    }
    value.to_string()
}

/// Blank optional fields become `None`
fn optional(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    label: &str,
    value: Option<&str>,
    max: usize,
) -> Option<String> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    if value.chars().count() > max {
        errors.push(FieldError::new(
            field,
            format!("{label} must be less than {max} characters"),
        ));
    }
    Some(value.to_string())
}

/// Structural address check: `local@domain.tld`, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|l| !l.is_empty() && !l.starts_with('-') && !l.ends_with('-'))
        && labels.last().is_some_and(|tld| tld.len() >= 2)
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
}

impl ContactRequest {
    pub fn validate(&self) -> Result<Lead, ContactError> {
        let mut errors = Vec::new();

        let name = required(&mut errors, "name", "Name", &self.name, NAME_MAX);

        let email = self.email.trim().to_string();
        if !is_valid_email(&email) {
            errors.push(FieldError::new("email", "Invalid email address"));
        } else if email.chars().count() > EMAIL_MAX {
            errors.push(FieldError::new(
                "email",
                format!("Email must be less than {EMAIL_MAX} characters"),
            ));
        }

        let company = optional(
            &mut errors,
            "company",
            "Company",
            self.company.as_deref(),
            COMPANY_MAX,
        );
        let farm_size = optional(
            &mut errors,
            "farm_size",
            "Farm size",
            self.farm_size.as_deref(),
            FARM_SIZE_MAX,
        );
        let message = required(&mut errors, "message", "Message", &self.message, MESSAGE_MAX);

        if !errors.is_empty() {
            return Err(ContactError::Validation(errors));
        }
        Ok(Lead {
            name,
            email,
            company,
            farm_size,
            message,
            submitted_at: Utc::now(),
        })
    }
}

/// Destination for accepted leads
pub trait LeadSink {
    fn submit(&self, lead: &Lead) -> impl Future<Output = Result<(), ContactError>> + Send;
}

/// Validate, then hand the lead to the sink
pub async fn submit_contact<S: LeadSink>(
    sink: &S,
    request: &ContactRequest,
) -> Result<Lead, ContactError> {
    let lead = request.validate()?;
    sink.submit(&lead).await?;
    tracing::info!("Accepted demo request from {}", lead.email);
    Ok(lead)
}

/// Appends one JSON object per line
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LeadSink for JsonLinesSink {
    fn submit(&self, lead: &Lead) -> impl Future<Output = Result<(), ContactError>> + Send {
        let path = self.path.clone();
        let line = serde_json::to_string(lead).map(|mut line| {
            line.push('\n');
            line
        });
        async move {
            let line = line?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await?;
            file.write_all(line.as_bytes()).await?;
            file.flush().await?;
            tracing::debug!("Appended lead to {}", path.display());
            Ok(())
        }
    }
}
