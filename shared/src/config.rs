use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::file_provider::{is_valid_authority, ImageNaming, DEFAULT_PROVIDER_AUTHORITY};

pub const DEFAULT_RECIPIENT: &str = "hodovychenko@op.edu.ua";
pub const DEFAULT_SUBJECT: &str = "Andrushchenko Vladyslav";
pub const DEFAULT_BODY: &str = "Дякую за курс! За Ваш час! За можливість розвиватися! \
Посилання на репозиторій: https://github.com/V-34-10/Image-Sender";
pub const DEFAULT_MIME_TYPE: &str = "text/plain";
pub const DEFAULT_CHOOSER_TITLE: &str = "Select an application for sending mail";
pub const DEFAULT_CAMERA_REQUEST_CODE: u32 = 1;

pub const MAX_SUBJECT_LENGTH: usize = 256;
pub const MAX_BODY_LENGTH: usize = 16 * 1024;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("invalid provider authority: {0}")]
    InvalidAuthority(String),

    #[error("invalid timestamp format: {0}")]
    InvalidTimestampFormat(String),

    #[error("{field} too long ({len} > {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("malformed config: {0}")]
    Malformed(String),
}

/// Fixed contents of the outgoing message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MailConfig {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub mime_type: String,
    pub chooser_title: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            recipient: DEFAULT_RECIPIENT.to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
            body: DEFAULT_BODY.to_string(),
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            chooser_title: DEFAULT_CHOOSER_TITLE.to_string(),
        }
    }
}

impl MailConfig {
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = recipient.into();
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recipient.trim().is_empty() {
            return Err(ConfigError::Empty { field: "recipient" });
        }
        if !is_plausible_address(&self.recipient) {
            return Err(ConfigError::InvalidRecipient(self.recipient.clone()));
        }
        if self.mime_type.trim().is_empty() {
            return Err(ConfigError::Empty { field: "mime_type" });
        }
        if self.subject.len() > MAX_SUBJECT_LENGTH {
            return Err(ConfigError::TooLong {
                field: "subject",
                len: self.subject.len(),
                max: MAX_SUBJECT_LENGTH,
            });
        }
        if self.body.len() > MAX_BODY_LENGTH {
            return Err(ConfigError::TooLong {
                field: "body",
                len: self.body.len(),
                max: MAX_BODY_LENGTH,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub mail: MailConfig,
    pub naming: ImageNaming,
    pub provider_authority: String,
    pub camera_request_code: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mail: MailConfig::default(),
            naming: ImageNaming::default(),
            provider_authority: DEFAULT_PROVIDER_AUTHORITY.to_string(),
            camera_request_code: DEFAULT_CAMERA_REQUEST_CODE,
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validated()
    }

    pub fn with_mail(mut self, mail: MailConfig) -> Self {
        self.mail = mail;
        self
    }

    pub fn with_naming(mut self, naming: ImageNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_provider_authority(mut self, authority: impl Into<String>) -> Self {
        self.provider_authority = authority.into();
        self
    }

    pub fn with_camera_request_code(mut self, code: u32) -> Self {
        self.camera_request_code = code;
        self
    }

    pub fn validated(self) -> Result<Self, ConfigError> {
        self.mail.validate()?;

        if self.naming.prefix.is_empty() {
            return Err(ConfigError::Empty { field: "naming.prefix" });
        }
        if self.naming.suffix.is_empty() {
            return Err(ConfigError::Empty { field: "naming.suffix" });
        }
        if !self.naming.has_valid_timestamp_format() {
            return Err(ConfigError::InvalidTimestampFormat(
                self.naming.timestamp_format.clone(),
            ));
        }
        if !is_valid_authority(&self.provider_authority) {
            return Err(ConfigError::InvalidAuthority(self.provider_authority.clone()));
        }

        Ok(self)
    }
}

fn is_plausible_address(address: &str) -> bool {
    let mut parts = address.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !address.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}
