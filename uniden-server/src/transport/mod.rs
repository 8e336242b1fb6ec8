//! Transport abstraction
//!
//! The session never talks to a radio directly. It drives a [`Transport`]:
//! something that can connect to a device address, list the device's
//! characteristic channels, read and write them and deliver notifications.
//!
//! Pairing and discovery over a real Bluetooth stack are out of scope here;
//! [`replay::ReplayTransport`] plays back a recorded capture instead.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

pub mod replay;

#[cfg(test)]
pub(crate) mod mock;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Not connected")]
    NotConnected,
    #[error("Channel '{0}' not found")]
    ChannelNotFound(String),
    #[error("I/O operation failed")]
    Io(#[from] std::io::Error),
    #[error("Cannot parse capture line {line}: {message}")]
    InvalidCapture { line: usize, message: String },
    #[error("Transport closed")]
    Closed,
}

/// One characteristic channel as reported by discovery
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelDescriptor {
    /// Lowercase UUID
    pub uuid: String,
    pub notify: bool,
    pub write: bool,
}

impl ChannelDescriptor {
    pub fn new(uuid: &str, notify: bool, write: bool) -> Self {
        ChannelDescriptor {
            uuid: uuid.to_ascii_lowercase(),
            notify,
            write,
        }
    }
}

/// Payload pushed by the device on one channel
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub uuid: String,
    pub payload: Vec<u8>,
}

#[async_trait]
pub trait Transport: Send {
    /// Establish the link to `address`
    async fn connect(&mut self, address: &str) -> Result<(), TransportError>;

    /// List the channels the connected device exposes
    async fn discover_channels(&mut self) -> Result<Vec<ChannelDescriptor>, TransportError>;

    /// Read the current value of a channel
    async fn read(&mut self, uuid: &str) -> Result<Vec<u8>, TransportError>;

    /// Write without response
    async fn write(&mut self, uuid: &str, data: &[u8]) -> Result<(), TransportError>;

    /// Deliver every notification of `uuid` to `tx` until the link drops.
    ///
    /// The transport owns the sender; dropping all senders tells the session
    /// the link is gone.
    async fn subscribe(
        &mut self,
        uuid: &str,
        tx: mpsc::Sender<Notification>,
    ) -> Result<(), TransportError>;

    async fn disconnect(&mut self) -> Result<(), TransportError>;
}
