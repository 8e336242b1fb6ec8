//! Detector session
//!
//! One session per connected detector. [`SessionBuilder::connect`] brings the
//! link up and spawns an actor task that owns the [`DetectorState`] and the
//! callback scheduler; nothing else touches them. Callers talk to the actor
//! through a cloneable [`SessionHandle`] and listen to [`SessionEvent`]s.
//!
//! The actor ends when
//! - every handle is dropped or [`SessionHandle::disconnect`] is called (`Ok`),
//! - a write to the device fails or the notification stream is lost
//!   (`Err(SessionError::Transport)`).
//!
//! In both cases the transport is disconnected and `Disconnected` is emitted.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use uniden_core::{
    AlertTable, CallbackId, CallbackScheduler, Characteristic, DetectorState, Dispatched,
    ParseError, SettingChange, SettingError, SettingSnapshot, Status,
};

use crate::transport::{Notification, Transport, TransportError};
use crate::SessionConfig;

mod events;

pub use events::SessionEvent;

const MAILBOX_SIZE: usize = 32;
const NOTIFICATION_QUEUE_SIZE: usize = 64;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Timeout")]
    Timeout,
    #[error("No usable channels discovered")]
    NoChannels,
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),
    #[error("{0}")]
    Setting(#[from] SettingError),
    #[error("Shutdown")]
    Shutdown,
}

/// Condition of a conditional callback, evaluated against the device state
pub type Condition = Box<dyn Fn(&DetectorState) -> bool + Send>;
/// One-shot action of a conditional callback
pub type Action = Box<dyn FnOnce(&mut DetectorState) -> Result<(), SettingError> + Send>;

type Reply<T> = oneshot::Sender<T>;

pub enum SessionCommand {
    GetSettings(Reply<Vec<SettingSnapshot>>),
    GetStatus(Reply<Status>),
    GetAlerts(Reply<AlertTable>),
    UpdateSetting {
        name: String,
        id: u8,
        reply: Reply<Result<(), SettingError>>,
    },
    UpdateSettingByValue {
        name: String,
        value: String,
        reply: Reply<Result<(), SettingError>>,
    },
    SendArbitraryCommand {
        text: String,
        reply: Reply<()>,
    },
    Mute(Reply<Result<(), SettingError>>),
    Unmute(Reply<Result<(), SettingError>>),
    SyncTime {
        utc_offset_hours: i32,
        reply: Reply<Result<(), SettingError>>,
    },
    RegisterCallback {
        condition: Condition,
        action: Action,
        timeout: Duration,
        reply: Reply<CallbackId>,
    },
    Disconnect,
}

/// Whole-hour offset of the local time zone
pub fn local_utc_offset_hours() -> i32 {
    chrono::Local::now().offset().local_minus_utc() / 3600
}

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

// =============================================================================
// Handle
// =============================================================================

/// Cloneable client side of a running session
#[derive(Clone, Debug)]
pub struct SessionHandle {
    key: String,
    tx: mpsc::Sender<SessionCommand>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| SessionError::Shutdown)?;
        rx.await.map_err(|_| SessionError::Shutdown)
    }

    pub async fn get_settings(&self) -> Result<Vec<SettingSnapshot>, SessionError> {
        self.request(SessionCommand::GetSettings).await
    }

    pub async fn get_status(&self) -> Result<Status, SessionError> {
        self.request(SessionCommand::GetStatus).await
    }

    pub async fn get_alerts(&self) -> Result<AlertTable, SessionError> {
        self.request(SessionCommand::GetAlerts).await
    }

    /// Validate and send a setting update.
    ///
    /// Returning `Ok` means the command was accepted for writing, not that
    /// the device applied it; watch for `SettingsChanged` to see the effect.
    pub async fn update_setting(&self, name: &str, id: u8) -> Result<(), SessionError> {
        let name = name.to_string();
        self.request(|reply| SessionCommand::UpdateSetting { name, id, reply })
            .await?
            .map_err(SessionError::from)
    }

    /// Like [`update_setting`](Self::update_setting), with the value given by name
    pub async fn update_setting_by_value(
        &self,
        name: &str,
        value: &str,
    ) -> Result<(), SessionError> {
        let name = name.to_string();
        let value = value.to_string();
        self.request(|reply| SessionCommand::UpdateSettingByValue {
            name,
            value,
            reply,
        })
        .await?
        .map_err(SessionError::from)
    }

    pub async fn send_arbitrary_command(&self, text: &str) -> Result<(), SessionError> {
        let text = text.to_string();
        self.request(|reply| SessionCommand::SendArbitraryCommand { text, reply })
            .await
    }

    pub async fn mute(&self) -> Result<(), SessionError> {
        self.request(SessionCommand::Mute)
            .await?
            .map_err(SessionError::from)
    }

    pub async fn unmute(&self) -> Result<(), SessionError> {
        self.request(SessionCommand::Unmute)
            .await?
            .map_err(SessionError::from)
    }

    pub async fn sync_time(&self, utc_offset_hours: i32) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::SyncTime {
            utc_offset_hours,
            reply,
        })
        .await?
        .map_err(SessionError::from)
    }

    /// Run `action` once, the first time `condition` holds after a settings
    /// change. The registration is dropped unfired after `timeout`.
    pub async fn register_conditional_callback<F, A>(
        &self,
        condition: F,
        action: A,
        timeout: Duration,
    ) -> Result<CallbackId, SessionError>
    where
        F: Fn(&DetectorState) -> bool + Send + 'static,
        A: FnOnce(&mut DetectorState) -> Result<(), SettingError> + Send + 'static,
    {
        self.request(|reply| SessionCommand::RegisterCallback {
            condition: Box::new(condition),
            action: Box::new(action),
            timeout,
            reply,
        })
        .await
    }

    /// Ask the session to end; returns once the request is queued
    pub async fn disconnect(&self) {
        let _ = self.tx.send(SessionCommand::Disconnect).await;
    }
}

// =============================================================================
// Builder
// =============================================================================

pub struct SessionBuilder<T: Transport> {
    transport: T,
    config: SessionConfig,
    events: broadcast::Sender<SessionEvent>,
}

impl<T: Transport + 'static> SessionBuilder<T> {
    pub fn new(transport: T, config: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        SessionBuilder {
            transport,
            config,
            events,
        }
    }

    pub fn key(&self) -> &str {
        &self.config.address
    }

    /// Subscribe before connecting to see every event, `Connected` included
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Connect, discover and subscribe, then start the session actor.
    ///
    /// Connecting and channel discovery together are bounded by the
    /// configured discovery timeout.
    pub async fn connect(
        mut self,
    ) -> Result<(SessionHandle, JoinHandle<Result<(), SessionError>>), SessionError> {
        let key = self.config.address.clone();
        log::info!("{}: connecting to {} detector", key, self.config.model);

        let transport = &mut self.transport;
        let channels = tokio::time::timeout(self.config.discovery_timeout(), async {
            transport.connect(&key).await?;
            transport.discover_channels().await
        })
        .await
        .map_err(|_| {
            log::warn!(
                "{}: no device found within {:?}",
                key,
                self.config.discovery_timeout()
            );
            SessionError::Timeout
        })??;

        for channel in &channels {
            log::debug!(
                "{}: found channel {} ({})",
                key,
                channel.uuid,
                Characteristic::from_uuid(&channel.uuid)
                    .map(|c| c.as_str())
                    .unwrap_or("unknown")
            );
        }

        let has = |c: Characteristic| channels.iter().any(|d| d.uuid == c.uuid());
        if !has(Characteristic::Command) || !has(Characteristic::Settings) {
            log::error!("{}: device does not expose the settings channels", key);
            let _ = self.transport.disconnect().await;
            return Err(SessionError::NoChannels);
        }

        let (notify_tx, notifications) = mpsc::channel(NOTIFICATION_QUEUE_SIZE);
        for channel in channels.iter().filter(|c| c.notify) {
            let tx = notify_tx.clone();
            if let Err(e) = self.transport.subscribe(&channel.uuid, tx).await {
                let _ = self.transport.disconnect().await;
                return Err(e.into());
            }
        }
        drop(notify_tx);

        let (tx, mailbox) = mpsc::channel(MAILBOX_SIZE);
        let (expiry_tx, expiries) = mpsc::unbounded_channel();

        let mut actor = SessionActor {
            key: key.clone(),
            transport: self.transport,
            state: DetectorState::new(self.config.model),
            scheduler: CallbackScheduler::new(),
            events: self.events.clone(),
            expiry_tx,
        };

        actor.emit(SessionEvent::Connected);
        if let Err(e) = actor.start(self.config.sync_time).await {
            actor.teardown().await;
            return Err(e);
        }

        let handle = SessionHandle {
            key,
            tx,
            events: self.events,
        };
        let task = tokio::spawn(actor.run(mailbox, notifications, expiries));

        Ok((handle, task))
    }
}

// =============================================================================
// Actor
// =============================================================================

struct SessionActor<T: Transport> {
    key: String,
    transport: T,
    state: DetectorState,
    scheduler: CallbackScheduler<DetectorState, SettingError>,
    events: broadcast::Sender<SessionEvent>,
    expiry_tx: mpsc::UnboundedSender<CallbackId>,
}

impl<T: Transport> SessionActor<T> {
    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Initial settings read and time sync; neither is fatal
    async fn start(&mut self, sync_time: bool) -> Result<(), SessionError> {
        match self.transport.read(Characteristic::Settings.uuid()).await {
            Ok(dump) => {
                let changes = self.state.apply_settings_dump(&dump);
                log::info!("{}: device state synced ({} bytes)", self.key, dump.len());
                self.on_settings(changes, Vec::new());
            }
            Err(e) => log::warn!("{}: cannot read device state: {}", self.key, e),
        }

        if sync_time {
            let offset = local_utc_offset_hours();
            match self.state.sync_time(offset) {
                Ok(()) => log::info!("{}: device time zone set to UTC{:+}", self.key, offset),
                Err(e) => log::warn!("{}: cannot sync time: {}", self.key, e),
            }
        }

        self.flush().await
    }

    async fn run(
        mut self,
        mut mailbox: mpsc::Receiver<SessionCommand>,
        mut notifications: mpsc::Receiver<Notification>,
        mut expiries: mpsc::UnboundedReceiver<CallbackId>,
    ) -> Result<(), SessionError> {
        log::info!("{}: session running", self.key);

        let result = loop {
            tokio::select! { biased;
                command = mailbox.recv() => match command {
                    None | Some(SessionCommand::Disconnect) => {
                        log::info!("{}: disconnect requested", self.key);
                        break Ok(());
                    }
                    Some(command) => self.handle_command(command),
                },

                Some(id) = expiries.recv() => {
                    if self.scheduler.expire(id) {
                        log::debug!("{}: conditional callback {} timed out", self.key, id);
                    }
                },

                notification = notifications.recv() => match notification {
                    None => {
                        log::error!("{}: notification stream lost", self.key);
                        break Err(SessionError::Transport(TransportError::Closed));
                    }
                    Some(notification) => self.handle_notification(notification),
                },
            }

            if let Err(e) = self.flush().await {
                break Err(e);
            }
        };

        self.teardown().await;
        result
    }

    async fn teardown(&mut self) {
        if let Err(e) = self.transport.disconnect().await {
            log::warn!("{}: disconnect failed: {}", self.key, e);
        }
        log::info!("{}: disconnected", self.key);
        self.emit(SessionEvent::Disconnected);
    }

    /// Write queued commands to the command channel
    async fn flush(&mut self) -> Result<(), SessionError> {
        for command in self.state.take_outbox() {
            log::debug!("{}: sending {}", self.key, command);
            if let Err(e) = self
                .transport
                .write(Characteristic::Command.uuid(), command.as_bytes())
                .await
            {
                log::error!("{}: write of '{}' failed: {}", self.key, command, e);
                return Err(e.into());
            }
        }
        Ok(())
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::GetSettings(reply) => {
                let _ = reply.send(self.state.settings());
            }
            SessionCommand::GetStatus(reply) => {
                let _ = reply.send(self.state.status().clone());
            }
            SessionCommand::GetAlerts(reply) => {
                let _ = reply.send(self.state.alerts().clone());
            }
            SessionCommand::UpdateSetting { name, id, reply } => {
                let result = self.state.update_setting(&name, id);
                self.log_rejected(&name, &result);
                let _ = reply.send(result);
            }
            SessionCommand::UpdateSettingByValue { name, value, reply } => {
                let result = self.state.update_setting_by_value(&name, &value);
                self.log_rejected(&name, &result);
                let _ = reply.send(result);
            }
            SessionCommand::SendArbitraryCommand { text, reply } => {
                self.state.send_arbitrary_command(text);
                let _ = reply.send(());
            }
            SessionCommand::Mute(reply) => {
                let _ = reply.send(self.state.mute());
            }
            SessionCommand::Unmute(reply) => {
                let _ = reply.send(self.state.unmute());
            }
            SessionCommand::SyncTime {
                utc_offset_hours,
                reply,
            } => {
                let _ = reply.send(self.state.sync_time(utc_offset_hours));
            }
            SessionCommand::RegisterCallback {
                condition,
                action,
                timeout,
                reply,
            } => {
                let id = self.scheduler.register(condition, action);
                let expiry_tx = self.expiry_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(timeout).await;
                    let _ = expiry_tx.send(id);
                });
                log::debug!(
                    "{}: conditional callback {} armed for {:?}",
                    self.key,
                    id,
                    timeout
                );
                let _ = reply.send(id);
            }
            SessionCommand::Disconnect => {}
        }
    }

    fn log_rejected(&self, name: &str, result: &Result<(), SettingError>) {
        if let Err(e) = result {
            log::warn!("{}: update of '{}' rejected: {}", self.key, name, e);
        }
    }

    fn handle_notification(&mut self, notification: Notification) {
        let Notification { uuid, payload } = notification;

        match self.state.dispatch(&uuid, &payload, now_ms()) {
            Dispatched::Settings {
                changes,
                out_of_range,
            } => self.on_settings(changes, out_of_range),
            Dispatched::Status { errors } => {
                self.log_malformed(&errors);
                self.emit(SessionEvent::StatusUpdated(self.state.status().clone()));
            }
            Dispatched::RadarEvent { errors } => {
                self.log_malformed(&errors);
                self.emit(SessionEvent::RadarEvent(self.state.alerts().clone()));
            }
            Dispatched::Ignored(channel) => {
                log::trace!("{}: {} bytes on {}", self.key, payload.len(), channel);
            }
            Dispatched::Unhandled(uuid) => {
                log::debug!(
                    "{}: received data from unhandled channel {}",
                    self.key,
                    uuid
                );
            }
        }
    }

    fn on_settings(&mut self, changes: Vec<SettingChange>, out_of_range: Vec<String>) {
        for name in &out_of_range {
            log::warn!(
                "{}: device reports a value outside the known values of '{}'",
                self.key,
                name
            );
        }
        if changes.is_empty() {
            return;
        }

        for change in &changes {
            log::debug!(
                "{}: '{}' changed {} -> {}",
                self.key,
                change.name,
                change.previous,
                change.current
            );
        }

        for fired in self.scheduler.evaluate(&mut self.state) {
            match fired.result {
                Ok(()) => log::debug!("{}: conditional callback {} fired", self.key, fired.id),
                Err(e) => log::warn!(
                    "{}: conditional callback {} failed: {}",
                    self.key,
                    fired.id,
                    e
                ),
            }
        }

        self.emit(SessionEvent::SettingsChanged(changes));
    }

    fn log_malformed(&self, errors: &[ParseError]) {
        for e in errors {
            log::debug!("{}: {}", self.key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{MockDevice, MockTransport};
    use crate::transport::ChannelDescriptor;
    use tokio::sync::broadcast::error::TryRecvError;
    use uniden_core::{Band, Model};

    fn config() -> SessionConfig {
        SessionConfig {
            model: Model::R4,
            address: "test".to_string(),
            sync_time: false,
            ..SessionConfig::default()
        }
    }

    fn dump(pairs: &[(usize, u8)]) -> Vec<u8> {
        let mut dump = vec![0u8; 120];
        for &(offset, value) in pairs {
            dump[offset] = value;
        }
        dump
    }

    async fn start(
        settings: Vec<u8>,
    ) -> (
        SessionHandle,
        JoinHandle<Result<(), SessionError>>,
        MockDevice,
        broadcast::Receiver<SessionEvent>,
    ) {
        let (transport, device) = MockTransport::new(settings);
        let builder = SessionBuilder::new(transport, config());
        let mut events = builder.subscribe();
        let (handle, task) = builder.connect().await.unwrap();
        assert_eq!(events.recv().await.unwrap(), SessionEvent::Connected);
        (handle, task, device, events)
    }

    #[tokio::test]
    async fn test_initial_read_populates_registry() {
        let (handle, _task, _device, mut events) = start(dump(&[(60, 1)])).await;

        match events.recv().await.unwrap() {
            SessionEvent::SettingsChanged(changes) => {
                assert_eq!(changes.len(), 1);
                assert_eq!(changes[0].name, "Speed Units");
            }
            other => panic!("unexpected {:?}", other),
        }

        let settings = handle.get_settings().await.unwrap();
        let units = settings.iter().find(|s| s.name == "Speed Units").unwrap();
        assert_eq!(units.value_name.as_deref(), Some("KPH"));
    }

    #[tokio::test]
    async fn test_one_event_per_settings_dump() {
        let (_handle, _task, device, mut events) = start(dump(&[])).await;

        device
            .notify(Characteristic::Settings, &dump(&[(60, 1), (91, 4)]))
            .await;
        match events.recv().await.unwrap() {
            SessionEvent::SettingsChanged(changes) => assert_eq!(changes.len(), 2),
            other => panic!("unexpected {:?}", other),
        }

        // Same dump again: nothing changed, so no event before the status update
        device
            .notify(Characteristic::Settings, &dump(&[(60, 1), (91, 4)]))
            .await;
        device
            .notify(Characteristic::Status, b"12.5&0&N,0,10,C&0&4")
            .await;
        match events.recv().await.unwrap() {
            SessionEvent::StatusUpdated(status) => assert_eq!(status.voltage, 12.5),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_radar_frame_event() {
        let (handle, _task, device, mut events) = start(dump(&[])).await;

        let frame = b"0&12,00,K,5,123,24.109,0,1&0&0";
        device.notify(Characteristic::RadarEvent, frame).await;
        match events.recv().await.unwrap() {
            SessionEvent::RadarEvent(alerts) => {
                assert_eq!(alerts.len(), 4);
                assert_eq!(alerts.get(1).unwrap().band, Band::K);
            }
            other => panic!("unexpected {:?}", other),
        }
        let alerts = handle.get_alerts().await.unwrap();
        assert_eq!(alerts.get(1).unwrap().strength, 5);
    }

    #[tokio::test]
    async fn test_update_writes_command() {
        let (handle, _task, device, _events) = start(dump(&[])).await;

        handle.update_setting("Speed Units", 1).await.unwrap();
        handle.send_arbitrary_command("BTreqSETC:1=2").await.unwrap();
        // Round trip so the previous writes are flushed
        handle.get_status().await.unwrap();

        assert_eq!(
            device.commands(),
            vec!["BTreqSETC:60=1".to_string(), "BTreqSETC:1=2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_rejected_update_writes_nothing() {
        let (handle, _task, device, _events) = start(dump(&[])).await;

        let result = handle.update_setting("Speed Units", 9).await;
        assert!(matches!(
            result,
            Err(SessionError::Setting(SettingError::InvalidValue { .. }))
        ));
        assert!(matches!(
            handle.update_setting("Nonexistent", 0).await,
            Err(SessionError::Setting(SettingError::NotFound(_)))
        ));
        handle.get_status().await.unwrap();
        assert!(device.commands().is_empty());
    }

    #[tokio::test]
    async fn test_mute_and_unmute() {
        let (handle, _task, device, mut events) = start(dump(&[(91, 5)])).await;
        events.recv().await.unwrap();

        handle.mute().await.unwrap();
        device.notify(Characteristic::Settings, &dump(&[(91, 0)])).await;
        events.recv().await.unwrap();
        handle.unmute().await.unwrap();
        handle.get_status().await.unwrap();

        assert_eq!(
            device.commands(),
            vec!["BTreqSETC:91=0".to_string(), "BTreqSETC:91=5".to_string()]
        );
    }

    #[tokio::test]
    async fn test_time_sync_on_connect() {
        let (transport, device) = MockTransport::new(dump(&[]));
        let config = SessionConfig {
            sync_time: true,
            ..config()
        };
        let builder = SessionBuilder::new(transport, config);
        let (handle, _task) = builder.connect().await.unwrap();
        handle.get_status().await.unwrap();

        let commands = device.commands();
        if (-12..=12).contains(&local_utc_offset_hours()) {
            assert_eq!(commands.len(), 1);
            assert!(commands[0].starts_with("BTreqSETC:81="));
        } else {
            // The detector has no GMT+13 or GMT+14
            assert!(commands.is_empty());
        }
    }

    #[tokio::test]
    async fn test_callback_fires_after_change() {
        let (handle, _task, device, mut events) = start(dump(&[])).await;

        handle
            .register_conditional_callback(
                |state| state.value_of("Speed Units") == Some(1),
                |state| state.update_setting("Limit speed", 100),
                Duration::from_secs(30),
            )
            .await
            .unwrap();

        device.notify(Characteristic::Settings, &dump(&[(60, 1)])).await;
        events.recv().await.unwrap();
        handle.get_status().await.unwrap();

        // Speed Units is KPH by the time the action runs
        assert_eq!(device.commands(), vec!["BTreqSETC:80=100".to_string()]);

        // One-shot
        device.notify(Characteristic::Settings, &dump(&[(60, 0)])).await;
        events.recv().await.unwrap();
        device.notify(Characteristic::Settings, &dump(&[(60, 1)])).await;
        events.recv().await.unwrap();
        handle.get_status().await.unwrap();
        assert_eq!(device.commands().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_callback_never_fires() {
        let (handle, _task, device, mut events) = start(dump(&[])).await;

        handle
            .register_conditional_callback(
                |state| state.value_of("Speed Units") == Some(1),
                |state| state.update_setting("X Band", 1),
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(6)).await;

        device.notify(Characteristic::Settings, &dump(&[(60, 1)])).await;
        events.recv().await.unwrap();
        handle.get_status().await.unwrap();
        assert!(device.commands().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_timeout() {
        let (transport, _device) = MockTransport::new(dump(&[]));
        let transport = transport.with_connect_delay(Duration::from_secs(30));
        let result = SessionBuilder::new(transport, config()).connect().await;
        assert!(matches!(result, Err(SessionError::Timeout)));
    }

    #[tokio::test]
    async fn test_missing_command_channel() {
        let (transport, device) = MockTransport::new(dump(&[]));
        let transport = transport.with_channels(vec![ChannelDescriptor::new(
            Characteristic::Status.uuid(),
            true,
            false,
        )]);
        let result = SessionBuilder::new(transport, config()).connect().await;
        assert!(matches!(result, Err(SessionError::NoChannels)));
        assert!(!device.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect() {
        let (handle, task, device, mut events) = start(dump(&[])).await;

        handle.disconnect().await;
        assert!(task.await.unwrap().is_ok());
        assert_eq!(events.recv().await.unwrap(), SessionEvent::Disconnected);
        assert!(!device.is_connected());
        assert!(matches!(
            handle.get_status().await,
            Err(SessionError::Shutdown)
        ));
    }

    #[tokio::test]
    async fn test_write_failure_ends_session() {
        let (handle, task, device, mut events) = start(dump(&[])).await;

        device.fail_writes();
        handle.update_setting("Speed Units", 1).await.unwrap();

        let result = task.await.unwrap();
        assert!(matches!(
            result,
            Err(SessionError::Transport(TransportError::Io(_)))
        ));
        assert_eq!(events.recv().await.unwrap(), SessionEvent::Disconnected);
    }

    #[tokio::test]
    async fn test_lost_link_ends_session() {
        let (_handle, task, device, mut events) = start(dump(&[])).await;

        device.drop_link();

        let result = task.await.unwrap();
        assert!(matches!(
            result,
            Err(SessionError::Transport(TransportError::Closed))
        ));
        assert_eq!(events.recv().await.unwrap(), SessionEvent::Disconnected);
    }
}
