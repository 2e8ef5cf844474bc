//! Bridge worker - the poll/reconnect loop between the telemetry endpoint
//! and the serial device.
//!
//! One background task, two states (Disconnected, Connected). Each iteration:
//! drain commands, attempt a reconnect when due, rate-limit updates, poll
//! telemetry, forward the sample to the presentation channel and the serial
//! link. HTTP timeouts are swallowed; serial failures drop the link back to
//! Disconnected. The loop only exits on the cooperative shutdown flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use speedlink_common::{BridgeEvent, ConnectionState, TelemetrySample};

use crate::config::Config;
use crate::device::DeviceLink;
use crate::telemetry::{Poll, TelemetrySource};

/// Pause between iterations that have nothing to do. Busy-wait avoidance
/// only, not scheduling.
const IDLE_SLEEP: Duration = Duration::from_millis(1);

/// Command channel capacity. Commands are rare (user port changes).
const COMMAND_CAPACITY: usize = 8;

/// Sample channel capacity. Exactly one: a sample the consumer has not
/// picked up yet blocks nothing and the next one is simply dropped.
const SAMPLE_CAPACITY: usize = 1;

/// Commands flowing from the presentation layer into the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeCommand {
    /// Switch the active serial port. Triggers exactly one immediate
    /// connect attempt against the new port.
    SetPort(String),
}

/// Handle to a spawned bridge worker.
pub struct BridgeHandle {
    commands: mpsc::Sender<BridgeCommand>,
    shutdown: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl BridgeHandle {
    /// Ask the worker to switch ports.
    pub async fn set_port(&self, port: String) {
        if self.commands.send(BridgeCommand::SetPort(port)).await.is_err() {
            warn!("Bridge worker gone, port change dropped");
        }
    }

    /// Set the cooperative shutdown flag and wait for the loop to observe it
    /// and release the serial handle.
    pub async fn shutdown(self) {
        self.shutdown.store(true, Ordering::Relaxed);
        let _ = self.task.await;
    }
}

/// Consumer side of the worker's two outbound channels: link/error events
/// ride a bounded control channel, samples a dedicated capacity-1 lane so
/// a stalled consumer never accumulates stale readings.
pub struct BridgeReceiver {
    control: mpsc::Receiver<BridgeEvent>,
    samples: mpsc::Receiver<TelemetrySample>,
}

impl BridgeReceiver {
    /// Non-blocking receive. Control events win over the pending sample.
    pub fn try_recv(&mut self) -> Option<BridgeEvent> {
        if let Ok(event) = self.control.try_recv() {
            return Some(event);
        }
        if let Ok(sample) = self.samples.try_recv() {
            return Some(BridgeEvent::Sample(sample));
        }
        None
    }

    /// Await the next event from either channel. `None` once the worker is
    /// gone and both channels are drained.
    pub async fn recv(&mut self) -> Option<BridgeEvent> {
        tokio::select! {
            maybe = self.control.recv() => match maybe {
                Some(event) => Some(event),
                None => self.samples.recv().await.map(BridgeEvent::Sample),
            },
            maybe = self.samples.recv() => match maybe {
                Some(sample) => Some(BridgeEvent::Sample(sample)),
                None => self.control.recv().await,
            },
        }
    }
}

/// The worker itself. Generic over its two seams so tests can drive it with
/// fakes.
pub struct Bridge<S, D> {
    source: S,
    link: D,
    port: Option<String>,
    state: ConnectionState,
    events: mpsc::Sender<BridgeEvent>,
    samples: mpsc::Sender<TelemetrySample>,
    reconnect_interval: Duration,
    update_interval: Duration,
}

impl<S, D> Bridge<S, D>
where
    S: TelemetrySource + 'static,
    D: DeviceLink + 'static,
{
    pub fn new(
        config: &Config,
        port: Option<String>,
        source: S,
        link: D,
        events: mpsc::Sender<BridgeEvent>,
        samples: mpsc::Sender<TelemetrySample>,
    ) -> Self {
        Self {
            source,
            link,
            port,
            state: ConnectionState::Disconnected,
            events,
            samples,
            reconnect_interval: config.reconnect_interval(),
            update_interval: config.update_interval(),
        }
    }

    /// Run the loop until the shutdown flag is set or the event channel is
    /// closed. Consumes the worker; the serial handle is released on exit.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<BridgeCommand>,
        shutdown: Arc<AtomicBool>,
    ) {
        info!("Bridge worker started");
        let mut last_attempt: Option<Instant> = None;
        let mut last_update: Option<Instant> = None;

        'run: while !shutdown.load(Ordering::Relaxed) {
            // Port changes reset the reconnect timer and connect right away.
            while let Ok(cmd) = commands.try_recv() {
                match cmd {
                    BridgeCommand::SetPort(port) => {
                        info!("Switching serial port to {}", port);
                        self.port = Some(port);
                        last_attempt = Some(Instant::now());
                        if !self.try_connect().await {
                            break 'run;
                        }
                    }
                }
            }

            if !self.state.is_connected()
                && last_attempt.map_or(true, |t| t.elapsed() >= self.reconnect_interval)
            {
                last_attempt = Some(Instant::now());
                if !self.try_connect().await {
                    break 'run;
                }
            }

            // Rate limit: at most one update per interval.
            if let Some(t) = last_update {
                if t.elapsed() < self.update_interval {
                    sleep(IDLE_SLEEP).await;
                    continue;
                }
            }

            if !self.state.is_connected() {
                // Nothing to poll while the device is down.
                sleep(IDLE_SLEEP).await;
                continue;
            }

            match self.source.poll().await {
                Ok(Poll::Sample(sample)) => {
                    if !self.forward(sample).await {
                        break;
                    }
                    last_update = Some(Instant::now());
                }
                Ok(Poll::TimedOut) => {
                    // Deliberately silent: a slow endpoint is retried next
                    // iteration. Logged so data loss is diagnosable.
                    debug!("Telemetry poll timed out");
                }
                Err(e) => {
                    if !self.emit(BridgeEvent::Error(format!("Telemetry error: {}", e))).await {
                        break;
                    }
                }
            }
        }

        self.link.close();
        info!("Bridge worker stopped");
    }

    /// One connect attempt against the active port. Returns false when the
    /// event channel is closed.
    async fn try_connect(&mut self) -> bool {
        let Some(port) = self.port.clone() else {
            return self
                .emit(BridgeEvent::Error("No serial port selected".to_string()))
                .await;
        };

        match self.link.open(&port) {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                self.emit(BridgeEvent::Link(ConnectionState::Connected)).await
            }
            Err(e) => {
                let was_connected = self.state.is_connected();
                self.state = ConnectionState::Disconnected;
                if !self
                    .emit(BridgeEvent::Error(format!("Serial connection error: {}", e)))
                    .await
                {
                    return false;
                }
                if was_connected {
                    self.emit(BridgeEvent::Link(ConnectionState::Disconnected)).await
                } else {
                    true
                }
            }
        }
    }

    /// Push the sample to the presentation channel and the serial device.
    async fn forward(&mut self, sample: TelemetrySample) -> bool {
        // Lossy on purpose: the lane holds exactly one sample, so if the
        // consumer still has the previous one this one is discarded.
        match self.samples.try_send(sample) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
            Err(mpsc::error::TrySendError::Closed(_)) => return false,
        }

        if let Err(e) = self.link.write_sample(&sample) {
            self.link.close();
            self.state = ConnectionState::Disconnected;
            if !self
                .emit(BridgeEvent::Error(format!("Serial error: {}", e)))
                .await
            {
                return false;
            }
            return self.emit(BridgeEvent::Link(ConnectionState::Disconnected)).await;
        }
        true
    }

    /// Send a must-not-drop event. Returns false when the consumer is gone,
    /// which the loop treats as a shutdown request. Takes `&mut self` so the
    /// worker future stays `Send` without requiring the serial handle to be
    /// `Sync`.
    async fn emit(&mut self, event: BridgeEvent) -> bool {
        self.events.send(event).await.is_ok()
    }
}

/// Spawn a bridge worker onto the runtime.
pub fn spawn_bridge<S, D>(
    config: &Config,
    port: Option<String>,
    source: S,
    link: D,
) -> (BridgeHandle, BridgeReceiver)
where
    S: TelemetrySource + 'static,
    D: DeviceLink + 'static,
{
    let (event_tx, event_rx) = mpsc::channel(config.bridge_loop.event_capacity);
    let (sample_tx, sample_rx) = mpsc::channel(SAMPLE_CAPACITY);
    let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
    let shutdown = Arc::new(AtomicBool::new(false));

    let bridge = Bridge::new(config, port, source, link, event_tx, sample_tx);
    let task = tokio::spawn(bridge.run(command_rx, Arc::clone(&shutdown)));

    (
        BridgeHandle {
            commands: command_tx,
            shutdown,
            task,
        },
        BridgeReceiver {
            control: event_rx,
            samples: sample_rx,
        },
    )
}
