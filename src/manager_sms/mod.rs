use std::time::Duration;
use log::info;
use reqwest::blocking::Client;
use serde::Deserialize;
use thiserror::Error;
use crate::config::{Secrets, SmsParameters};

/// Anything that can deliver a text message to the configured recipient
pub trait Notifier {
    /// Sends a text message
    ///
    /// # Arguments
    ///
    /// * 'body' - the message text
    fn send_sms(&self, body: &str) -> Result<SmsReceipt, SmsError>;
}

/// What the messaging provider reports back for an accepted message
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SmsReceipt {
    pub sid: String,
    pub status: String,
}

/// Struct for sending SMS through Twilio's REST API
pub struct Twilio {
    client: Client,
    endpoint: String,
    account_sid: String,
    auth_token: String,
    from: String,
    to: String,
}

impl Twilio {
    /// Returns a new instance of the Twilio struct
    ///
    /// # Arguments
    ///
    /// * 'config' - sms configuration parameters
    /// * 'secrets' - account credentials and phone numbers
    pub fn new(config: &SmsParameters, secrets: &Secrets) -> Result<Self, SmsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            account_sid: secrets.twilio_sid.clone(),
            auth_token: secrets.twilio_token.clone(),
            from: secrets.sender_pnr.clone(),
            to: secrets.recipient_pnr.clone(),
        })
    }
}

impl Notifier for Twilio {
    fn send_sms(&self, body: &str) -> Result<SmsReceipt, SmsError> {
        let url = format!("{}/Accounts/{}/Messages.json", self.endpoint, self.account_sid);
        let params = [("From", self.from.as_str()), ("To", self.to.as_str()), ("Body", body)];

        let response = self.client
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()?;

        let status = response.status();
        let json = response.text()?;
        if !status.is_success() {
            return Err(SmsError::HttpStatus(status.as_u16(), json));
        }

        let receipt: SmsReceipt = serde_json::from_str(&json)
            .map_err(|e| SmsError::ParseError(e.to_string()))?;

        info!("SMS {} accepted by provider", receipt.sid);

        Ok(receipt)
    }
}

/// Error depicting errors that occur while sending SMS
///
#[derive(Error, Debug)]
pub enum SmsError {
    #[error("HttpStatus: {0}: {1}")]
    HttpStatus(u16, String),
    #[error("ParseError: {0}")]
    ParseError(String),
    #[error("NetworkError: {0}")]
    NetworkError(#[from] reqwest::Error),
}
