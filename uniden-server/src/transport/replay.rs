//! Capture playback
//!
//! A capture is a JSON-lines file, one record per line:
//!
//! ```text
//! {"atMs": 0, "channel": "Settings", "read": true, "payload": [0, 1, 0, 3]}
//! {"atMs": 250, "channel": "Status", "text": "12.5&0&N,0,10,C&0&4"}
//! {"atMs": 900, "channel": "6eb675ab-8bd1-1b9a-7444-621e52ec6823", "text": "0&12,00,K,5,123,24.109,0,1"}
//! ```
//!
//! `channel` is a channel name (`Settings`, `Status`, `RadarEvent`, ...) or a
//! UUID. Records marked `read` answer reads of that channel; all others are
//! delivered as notifications at `atMs` after connect. Blank lines and lines
//! starting with `#` are skipped. Writes are logged and kept for inspection.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use uniden_core::Characteristic;

use super::{ChannelDescriptor, Notification, Transport, TransportError};

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRecord {
    #[serde(default)]
    pub at_ms: u64,
    pub channel: String,
    #[serde(default)]
    pub payload: Option<Vec<u8>>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub read: bool,
}

impl CaptureRecord {
    fn uuid(&self) -> String {
        Characteristic::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(&self.channel))
            .map(|c| c.uuid().to_string())
            .unwrap_or_else(|| self.channel.to_ascii_lowercase())
    }

    fn bytes(&self) -> Vec<u8> {
        match (&self.payload, &self.text) {
            (Some(payload), _) => payload.clone(),
            (None, Some(text)) => text.as_bytes().to_vec(),
            (None, None) => Vec::new(),
        }
    }
}

type WriteLog = Arc<Mutex<Vec<(String, Vec<u8>)>>>;

pub struct ReplayTransport {
    records: Vec<CaptureRecord>,
    started: Option<Instant>,
    tasks: Vec<JoinHandle<()>>,
    written: WriteLog,
}

impl ReplayTransport {
    pub fn open(path: &Path) -> Result<Self, TransportError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, TransportError> {
        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let record: CaptureRecord =
                serde_json::from_str(line).map_err(|e| TransportError::InvalidCapture {
                    line: index + 1,
                    message: e.to_string(),
                })?;
            records.push(record);
        }
        Ok(Self::new(records))
    }

    pub fn new(records: Vec<CaptureRecord>) -> Self {
        ReplayTransport {
            records,
            started: None,
            tasks: Vec::new(),
            written: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Everything written so far, as `(uuid, bytes)`
    pub fn writes(&self) -> Vec<(String, Vec<u8>)> {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn started(&self) -> Result<Instant, TransportError> {
        self.started.ok_or(TransportError::NotConnected)
    }

    fn channel_uuids(&self) -> BTreeSet<String> {
        Characteristic::ALL
            .iter()
            .map(|c| c.uuid().to_string())
            .chain(self.records.iter().map(|r| r.uuid()))
            .collect()
    }
}

impl Drop for ReplayTransport {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[async_trait]
impl Transport for ReplayTransport {
    async fn connect(&mut self, address: &str) -> Result<(), TransportError> {
        log::info!(
            "{}: replaying {} capture records",
            address,
            self.records.len()
        );
        self.started = Some(Instant::now());
        Ok(())
    }

    async fn discover_channels(&mut self) -> Result<Vec<ChannelDescriptor>, TransportError> {
        self.started()?;
        Ok(self
            .channel_uuids()
            .into_iter()
            .map(|uuid| match Characteristic::from_uuid(&uuid) {
                Some(c) => {
                    ChannelDescriptor::new(&uuid, c.notifies(), c == Characteristic::Command)
                }
                None => ChannelDescriptor::new(&uuid, true, false),
            })
            .collect())
    }

    async fn read(&mut self, uuid: &str) -> Result<Vec<u8>, TransportError> {
        self.started()?;
        let uuid = uuid.to_ascii_lowercase();
        if !self.channel_uuids().contains(&uuid) {
            return Err(TransportError::ChannelNotFound(uuid));
        }
        Ok(self
            .records
            .iter()
            .find(|r| r.read && r.uuid() == uuid)
            .map(CaptureRecord::bytes)
            .unwrap_or_default())
    }

    async fn write(&mut self, uuid: &str, data: &[u8]) -> Result<(), TransportError> {
        self.started()?;
        log::info!(
            "Replay: write to {}: {}",
            uuid,
            String::from_utf8_lossy(data)
        );
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((uuid.to_ascii_lowercase(), data.to_vec()));
        Ok(())
    }

    async fn subscribe(
        &mut self,
        uuid: &str,
        tx: mpsc::Sender<Notification>,
    ) -> Result<(), TransportError> {
        let started = self.started()?;
        let uuid = uuid.to_ascii_lowercase();

        let mut records: Vec<(u64, Vec<u8>)> = self
            .records
            .iter()
            .filter(|r| !r.read && r.uuid() == uuid)
            .map(|r| (r.at_ms, r.bytes()))
            .collect();
        records.sort_by_key(|(at_ms, _)| *at_ms);

        self.tasks.push(tokio::spawn(async move {
            for (at_ms, payload) in records {
                sleep_until(started + Duration::from_millis(at_ms)).await;
                let notification = Notification {
                    uuid: uuid.clone(),
                    payload,
                };
                if tx.send(notification).await.is_err() {
                    return;
                }
            }
            // A device that has nothing more to say is still connected
            tx.closed().await;
        }));
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.started = None;
        Ok(())
    }
}
