//! In-memory transport for session tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use uniden_core::Characteristic;

use super::{ChannelDescriptor, Notification, Transport, TransportError};

#[derive(Default)]
struct Inner {
    connected: bool,
    subscribers: HashMap<String, mpsc::Sender<Notification>>,
    writes: Vec<(String, Vec<u8>)>,
    fail_writes: bool,
}

/// Test side of a [`MockTransport`]
#[derive(Clone, Default)]
pub struct MockDevice {
    inner: Arc<Mutex<Inner>>,
}

impl MockDevice {
    /// Push a notification as the device would
    pub async fn notify(&self, channel: Characteristic, payload: &[u8]) {
        let tx = self
            .inner
            .lock()
            .unwrap()
            .subscribers
            .get(channel.uuid())
            .cloned()
            .expect("channel not subscribed");
        tx.send(Notification {
            uuid: channel.uuid().to_string(),
            payload: payload.to_vec(),
        })
        .await
        .unwrap();
    }

    /// Commands written to the command channel, as text
    pub fn commands(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .writes
            .iter()
            .filter(|(uuid, _)| uuid == Characteristic::Command.uuid())
            .map(|(_, data)| String::from_utf8_lossy(data).to_string())
            .collect()
    }

    pub fn fail_writes(&self) {
        self.inner.lock().unwrap().fail_writes = true;
    }

    /// Drop every notification sender, as a lost link would
    pub fn drop_link(&self) {
        self.inner.lock().unwrap().subscribers.clear();
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().unwrap().connected
    }
}

pub struct MockTransport {
    device: MockDevice,
    channels: Vec<ChannelDescriptor>,
    settings: Vec<u8>,
    connect_delay: Duration,
}

impl MockTransport {
    pub fn new(settings: Vec<u8>) -> (Self, MockDevice) {
        let device = MockDevice::default();
        let channels = Characteristic::ALL
            .iter()
            .map(|c| {
                ChannelDescriptor::new(c.uuid(), c.notifies(), *c == Characteristic::Command)
            })
            .collect();
        (
            MockTransport {
                device: device.clone(),
                channels,
                settings,
                connect_delay: Duration::ZERO,
            },
            device,
        )
    }

    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    pub fn with_channels(mut self, channels: Vec<ChannelDescriptor>) -> Self {
        self.channels = channels;
        self
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self, _address: &str) -> Result<(), TransportError> {
        tokio::time::sleep(self.connect_delay).await;
        self.device.inner.lock().unwrap().connected = true;
        Ok(())
    }

    async fn discover_channels(&mut self) -> Result<Vec<ChannelDescriptor>, TransportError> {
        Ok(self.channels.clone())
    }

    async fn read(&mut self, uuid: &str) -> Result<Vec<u8>, TransportError> {
        if uuid == Characteristic::Settings.uuid() {
            Ok(self.settings.clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn write(&mut self, uuid: &str, data: &[u8]) -> Result<(), TransportError> {
        let mut inner = self.device.inner.lock().unwrap();
        if inner.fail_writes {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "link lost",
            )));
        }
        inner.writes.push((uuid.to_string(), data.to_vec()));
        Ok(())
    }

    async fn subscribe(
        &mut self,
        uuid: &str,
        tx: mpsc::Sender<Notification>,
    ) -> Result<(), TransportError> {
        self.device
            .inner
            .lock()
            .unwrap()
            .subscribers
            .insert(uuid.to_string(), tx);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        let mut inner = self.device.inner.lock().unwrap();
        inner.connected = false;
        inner.subscribers.clear();
        Ok(())
    }
}
