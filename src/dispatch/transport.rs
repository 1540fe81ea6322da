// SMS transport seam

use async_trait::async_trait;

/// Errors reported by an SMS transport for a single message
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The carrier or gateway refused the message
    #[error("Message rejected: {0}")]
    Rejected(String),
    /// The transport could not be reached
    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

/// Sends one text message to one phone number
///
/// `Ok(())` means the transport acknowledged the message.
#[async_trait]
pub trait SmsTransport: Send + Sync {
    async fn send(&self, phone_number: &str, text: &str) -> Result<(), TransportError>;
}

/// Transport that writes each message to the log instead of a carrier
///
/// Used by the console binary, where no SMS gateway is configured.
pub struct LogSmsTransport;

#[async_trait]
impl SmsTransport for LogSmsTransport {
    async fn send(&self, phone_number: &str, text: &str) -> Result<(), TransportError> {
        crate::info!("[sms] -> {}: {}", phone_number, text);
        Ok(())
    }
}
