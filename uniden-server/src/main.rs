use std::time::Duration;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tokio::sync::broadcast::error::RecvError;
use tokio_graceful_shutdown::{SubsystemBuilder, SubsystemHandle, Toplevel};

use uniden_server::session::{SessionBuilder, SessionError, SessionEvent};
use uniden_server::transport::replay::ReplayTransport;
use uniden_server::{Cli, SessionConfig, VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let config = args.session_config()?;
    let capture = args.replay.clone().ok_or_else(|| {
        miette::miette!("No live transport; pass a capture file with --replay")
    })?;
    let transport = ReplayTransport::open(&capture).into_diagnostic()?;
    let assignments = args.set.clone();

    log::info!(
        "Uniden server {} starting: {} at {}",
        VERSION,
        config.model,
        config.address
    );

    Toplevel::new(move |s| async move {
        s.start(SubsystemBuilder::new("Detector", move |subsys| {
            run_detector(subsys, transport, config, assignments)
        }));
    })
    .catch_signals()
    .handle_shutdown_requests(Duration::from_secs(5))
    .await
    .map_err(Into::into)
}

async fn run_detector(
    subsys: SubsystemHandle,
    transport: ReplayTransport,
    config: SessionConfig,
    assignments: Vec<(String, u8)>,
) -> Result<(), SessionError> {
    let builder = SessionBuilder::new(transport, config);
    let key = builder.key().to_string();
    let mut events = builder.subscribe();
    let (handle, mut task) = builder.connect().await?;

    for (name, id) in assignments {
        match handle.update_setting(&name, id).await {
            Ok(()) => log::info!("{}: sent '{}' = {}", key, name, id),
            Err(e) => log::error!("{}: cannot set '{}': {}", key, name, e),
        }
    }

    loop {
        tokio::select! {
            _ = subsys.on_shutdown_requested() => {
                log::info!("{}: shutdown", key);
                handle.disconnect().await;
                return (&mut task).await.map_err(|_| SessionError::Shutdown)?;
            },

            result = &mut task => {
                return result.map_err(|_| SessionError::Shutdown)?;
            },

            event = events.recv() => match event {
                Ok(event) => log_event(&key, &event),
                Err(RecvError::Lagged(n)) => log::warn!("{}: missed {} events", key, n),
                Err(RecvError::Closed) => {
                    return (&mut task).await.map_err(|_| SessionError::Shutdown)?;
                }
            },
        }
    }
}

fn log_event(key: &str, event: &SessionEvent) {
    match event {
        SessionEvent::Connected => log::info!("{}: connected", key),
        SessionEvent::Disconnected => log::info!("{}: disconnected", key),
        SessionEvent::SettingsChanged(changes) => {
            for change in changes {
                log::info!("{}: {} = {}", key, change.name, change.current);
            }
        }
        SessionEvent::StatusUpdated(status) => log::debug!(
            "{}: {:.1}V, GPS {:?} heading {} altitude {}, signal {}",
            key,
            status.voltage,
            status.gps.state,
            status.gps.heading,
            status.gps.altitude,
            status.signal
        ),
        SessionEvent::RadarEvent(alerts) => {
            for (slot, alert) in alerts.active() {
                log::info!(
                    "{}: alert {} {} band {:.3} GHz strength {}",
                    key,
                    slot,
                    alert.band,
                    alert.frequency,
                    alert.strength
                );
            }
        }
    }
}
