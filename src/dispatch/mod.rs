// Notification dispatch
// Formats the alert text and fans it out to every recipient over SMS

mod dispatcher;
pub mod message;
mod transport;

pub use dispatcher::NotificationDispatcher;
pub use transport::{LogSmsTransport, SmsTransport, TransportError};

#[cfg(test)]
pub(crate) use dispatcher::tests;
