use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::MailConfig;
use crate::file_provider::FileHandle;

/// Hands a prefilled message to whichever mail app the user picks from the OS chooser.
#[derive(Clone)]
pub struct Mail<E> {
    context: CapabilityContext<MailOperation, E>,
}

impl<Ev> Capability<Ev> for Mail<Ev> {
    type Operation = MailOperation;
    type MappedSelf<MappedEv> = Mail<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Mail::new(self.context.map_event(f))
    }
}

impl<E> Mail<E>
where
    E: Send + 'static,
{
    pub fn new(context: CapabilityContext<MailOperation, E>) -> Self {
        Self { context }
    }

    pub fn send_via_chooser<F>(&self, message: EmailMessage, chooser_title: String, callback: F)
    where
        F: FnOnce(MailResult) -> E + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context
                .request_from_shell(MailOperation::SendViaChooser {
                    message,
                    chooser_title,
                })
                .await;
            context.update_app(callback(result));
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailMessage {
    pub mime_type: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachment: Option<FileHandle>,
}

impl EmailMessage {
    /// Builds the message from config.
    ///
    /// Fails with [`MailError::Compose`] when the config cannot produce a sendable
    /// message.
    pub fn compose(config: &MailConfig, attachment: Option<FileHandle>) -> Result<Self, MailError> {
        config.validate().map_err(|e| MailError::Compose {
            reason: e.to_string(),
        })?;

        Ok(Self {
            mime_type: config.mime_type.clone(),
            recipients: vec![config.recipient.clone()],
            subject: config.subject.clone(),
            body: config.body.clone(),
            attachment,
        })
    }

    #[must_use]
    pub fn has_attachment(&self) -> bool {
        self.attachment.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum MailOperation {
    SendViaChooser {
        message: EmailMessage,
        chooser_title: String,
    },
}

impl Operation for MailOperation {
    type Output = MailResult;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MailOutput {
    ChooserShown,
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum MailError {
    #[error("could not compose message: {reason}")]
    Compose { reason: String },

    #[error("no application can send the message")]
    NoHandler,
}

pub type MailResult = Result<MailOutput, MailError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_provider::{FileProvider, HandleAccess, PhotoPath};

    #[test]
    fn test_compose_copies_fixed_fields() {
        let message = EmailMessage::compose(&MailConfig::default(), None).unwrap();

        assert_eq!(message.mime_type, "text/plain");
        assert_eq!(message.recipients, vec!["hodovychenko@op.edu.ua".to_string()]);
        assert_eq!(message.subject, "Andrushchenko Vladyslav");
        assert!(!message.has_attachment());
    }

    #[test]
    fn test_compose_keeps_attachment() {
        let path = PhotoPath::new(if cfg!(windows) { "C:/p/a.jpg" } else { "/p/a.jpg" });
        let handle = FileProvider::default()
            .issue(&path, HandleAccess::Read)
            .unwrap();
        let message = EmailMessage::compose(&MailConfig::default(), Some(handle.clone())).unwrap();

        assert_eq!(message.attachment, Some(handle));
    }

    #[test]
    fn test_compose_fails_on_unsendable_config() {
        let config = MailConfig::default().with_recipient("");
        assert!(matches!(
            EmailMessage::compose(&config, None),
            Err(MailError::Compose { .. })
        ));
    }
}
