use std::fs;
use std::path::{Path, PathBuf};
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::message::header::ContentType;
use lettre::{Message, SmtpTransport, Transport};
use lettre::transport::smtp::authentication::Credentials;
use log::info;
use thiserror::Error;
use crate::config::{MailParameters, Secrets};

/// Anything that can deliver the daily report
pub trait MailSender {
    /// Sends the rendered report image as a mail attachment
    ///
    /// # Arguments
    ///
    /// * 'report' - path to the report image
    fn send_report(&self, report: &Path) -> Result<(), MailError>;
}

pub struct Mail {
    smtp_endpoint: String,
    smtp_user: String,
    smtp_password: String,
    from: Mailbox,
    to: Mailbox,
    subject: String,
    content_path: PathBuf,
}

impl Mail {
    /// Returns a new instance of the Mail struct
    ///
    /// # Arguments
    ///
    /// * 'config' - mail configuration parameters
    /// * 'secrets' - sender credentials and addresses
    pub fn new(config: &MailParameters, secrets: &Secrets) -> Result<Self, MailError> {
        let from = secrets.sender_email.parse::<Mailbox>()
            .map_err(|e| MailError::ParseError(format!("from address: {}", e)))?;
        let to = secrets.recipient_email.parse::<Mailbox>()
            .map_err(|e| MailError::ParseError(format!("to address: {}", e)))?;

        Ok(
            Self {
                smtp_endpoint: config.smtp_endpoint.clone(),
                smtp_user: secrets.sender_email.clone(),
                smtp_password: secrets.sender_password.clone(),
                from,
                to,
                subject: config.subject.clone(),
                content_path: config.content_path.clone(),
            }
        )
    }

    /// Composes the report mail from the content file and the report image
    ///
    /// # Arguments
    ///
    /// * 'report' - path to the report image
    fn compose(&self, report: &Path) -> Result<Message, MailError> {
        let content = fs::read_to_string(&self.content_path)
            .map_err(|e| MailError::ContentError(format!("{}: {}", self.content_path.display(), e)))?;
        let image = fs::read(report)
            .map_err(|e| MailError::AttachmentError(format!("{}: {}", report.display(), e)))?;

        let file_name = report.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("report.png")
            .to_string();
        let image_type = ContentType::parse("image/png")
            .map_err(|e| MailError::MessageError(e.to_string()))?;

        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(self.subject.clone())
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(content))
                    .singlepart(Attachment::new(file_name).body(image, image_type)),
            )
            .map_err(|e| MailError::MessageError(e.to_string()))
    }
}

impl MailSender for Mail {
    fn send_report(&self, report: &Path) -> Result<(), MailError> {
        let message = self.compose(report)?;

        // The transport, and with it the connection, lives only for this send
        let credentials = Credentials::new(self.smtp_user.clone(), self.smtp_password.clone());
        let sender = SmtpTransport::starttls_relay(&self.smtp_endpoint)
            .map_err(|e| MailError::SMTPTransportError(e.to_string()))?
            .credentials(credentials)
            .build();

        sender.send(&message)
            .map_err(|e| MailError::TransportError(e.to_string()))?;

        info!("Report mail sent to {}", self.to);

        Ok(())
    }
}

/// Error depicting errors that occur while sending emails
///
#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTPTransportError: {0}")]
    SMTPTransportError(String),
    #[error("TransportError: {0}")]
    TransportError(String),
    #[error("ParseError: {0}")]
    ParseError(String),
    #[error("MessageError: {0}")]
    MessageError(String),
    #[error("ContentError: {0}")]
    ContentError(String),
    #[error("AttachmentError: {0}")]
    AttachmentError(String),
}
