use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use crate::physics::{AircraftState, ControlInputs};
use crate::telemetry::TelemetrySnapshot;
use crate::utils::constants::{
    DEFAULT_TELEMETRY_PORT, DEFAULT_TELEMETRY_RATE, MAX_TELEMETRY_RATE, MIN_TELEMETRY_RATE,
    TELEMETRY_QUEUE_BOUND,
};
use crate::utils::{lock_recover, SimError};

/// Telemetry service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// UDP port the service binds
    pub port: u16,
    /// Drain/send rate [Hz], clamped to [1, 100]
    pub update_rate: f64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_TELEMETRY_PORT,
            update_rate: DEFAULT_TELEMETRY_RATE,
        }
    }
}

/// Cheap cloneable producer handle onto a publisher's snapshot queue.
///
/// Publishing never blocks: when the queue is full the new snapshot is
/// dropped, so a slow network side can never stall the physics tick.
#[derive(Debug, Clone)]
pub struct TelemetryFeed {
    queue: Sender<TelemetrySnapshot>,
}

impl TelemetryFeed {
    /// Capture and enqueue a snapshot of the given state and controls
    pub fn publish(&self, state: &AircraftState, controls: &ControlInputs) {
        self.ingest(TelemetrySnapshot::capture(state, controls));
    }

    /// Enqueue a prebuilt snapshot
    pub fn ingest(&self, snapshot: TelemetrySnapshot) {
        if self.queue.try_send(snapshot).is_err() {
            trace!("telemetry queue full, dropping snapshot");
        }
    }
}

/// Fans simulation snapshots out to registered UDP subscribers.
///
/// Snapshots arrive through [`TelemetryFeed::publish`] or [`ingest`] on a
/// bounded queue and are drained one per cycle by a background thread that
/// runs on its own schedule, decoupling the network send rate from the
/// physics tick rate.
///
/// [`ingest`]: TelemetryPublisher::ingest
pub struct TelemetryPublisher {
    port: u16,
    rate: Arc<Mutex<f64>>,
    queue_tx: Sender<TelemetrySnapshot>,
    queue_rx: Receiver<TelemetrySnapshot>,
    subscribers: Arc<Mutex<Vec<SocketAddr>>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl TelemetryPublisher {
    pub fn new(config: TelemetryConfig) -> Self {
        let (queue_tx, queue_rx) = bounded(TELEMETRY_QUEUE_BOUND);
        Self {
            port: config.port,
            rate: Arc::new(Mutex::new(clamp_rate(config.update_rate))),
            queue_tx,
            queue_rx,
            subscribers: Arc::new(Mutex::new(Vec::new())),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            local_addr: None,
        }
    }

    /// Producer handle for the simulation side
    pub fn feed(&self) -> TelemetryFeed {
        TelemetryFeed {
            queue: self.queue_tx.clone(),
        }
    }

    /// Enqueue a snapshot; drops it silently when the queue is full
    pub fn ingest(&self, snapshot: TelemetrySnapshot) {
        if self.queue_tx.try_send(snapshot).is_err() {
            trace!("telemetry queue full, dropping snapshot");
        }
    }

    /// Number of snapshots currently awaiting transmission
    pub fn pending(&self) -> usize {
        self.queue_rx.len()
    }

    /// Register a subscriber endpoint; adding an existing one is a no-op
    pub fn add_subscriber(&self, addr: SocketAddr) {
        register_endpoint(&self.subscribers, addr);
    }

    /// Remove a subscriber endpoint; removing an unknown one is a no-op
    pub fn remove_subscriber(&self, addr: SocketAddr) {
        unregister_endpoint(&self.subscribers, addr);
    }

    pub fn subscriber_count(&self) -> usize {
        lock_recover(&self.subscribers).len()
    }

    /// Drain rate [Hz]
    pub fn rate(&self) -> f64 {
        *lock_recover(&self.rate)
    }

    /// Set the drain rate, clamped to [1, 100] Hz. Takes effect on the
    /// next drain cycle, including while running.
    pub fn set_rate(&self, hz: f64) {
        *lock_recover(&self.rate) = clamp_rate(hz);
    }

    /// Bind the UDP socket and start the drain thread.
    ///
    /// Fails with [`SimError::Io`] when the socket cannot be bound and with
    /// [`SimError::Lifecycle`] when the publisher is already running.
    pub fn start(&mut self) -> Result<(), SimError> {
        if self.handle.is_some() {
            return Err(SimError::Lifecycle(
                "telemetry publisher already running".into(),
            ));
        }

        let socket = UdpSocket::bind(("0.0.0.0", self.port))?;
        socket.set_nonblocking(true)?;
        // Useful when port 0 asked the OS to pick one
        self.local_addr = socket.local_addr().ok();

        self.running.store(true, Ordering::Release);

        let rx = self.queue_rx.clone();
        let subscribers = Arc::clone(&self.subscribers);
        let rate = Arc::clone(&self.rate);
        let running = Arc::clone(&self.running);

        let handle = thread::Builder::new()
            .name("telemetry".into())
            .spawn(move || drain_loop(socket, rx, subscribers, rate, running))
            .map_err(|e| {
                self.running.store(false, Ordering::Release);
                SimError::Io(e)
            })?;

        self.handle = Some(handle);
        info!("telemetry publisher started on UDP port {}", self.port);
        Ok(())
    }

    /// Stop the drain thread and release the socket. Safe to call at any
    /// time; a stopped publisher stays stopped.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            self.local_addr = None;
            info!("telemetry publisher stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Address the socket is bound to while running
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

impl Drop for TelemetryPublisher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One cycle per publish period: pick up registration datagrams, pop at
/// most one pending snapshot and send it to every subscriber.
fn drain_loop(
    socket: UdpSocket,
    rx: Receiver<TelemetrySnapshot>,
    subscribers: Arc<Mutex<Vec<SocketAddr>>>,
    rate: Arc<Mutex<f64>>,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::Acquire) {
        let cycle_start = Instant::now();

        poll_registrations(&socket, &subscribers);

        if let Ok(snapshot) = rx.try_recv() {
            let message = snapshot.to_wire();
            // Copy the endpoints out so the lock is not held across sends
            let targets = lock_recover(&subscribers).clone();
            for addr in targets {
                if let Err(e) = socket.send_to(message.as_bytes(), addr) {
                    warn!("failed to send telemetry to {}: {}", addr, e);
                }
            }
        }

        let period = Duration::from_secs_f64(1.0 / *lock_recover(&rate));
        let elapsed = cycle_start.elapsed();
        if elapsed < period {
            thread::sleep(period - elapsed);
        }
    }
}

/// Drain any pending control datagrams on the telemetry socket. A client
/// sends the text `REGISTER` to subscribe and `UNREGISTER` to leave;
/// anything else is ignored.
fn poll_registrations(socket: &UdpSocket, subscribers: &Mutex<Vec<SocketAddr>>) {
    let mut buf = [0u8; 64];
    loop {
        match socket.recv_from(&mut buf) {
            Ok((len, src)) => match std::str::from_utf8(&buf[..len]).map(str::trim) {
                Ok("REGISTER") => register_endpoint(subscribers, src),
                Ok("UNREGISTER") => unregister_endpoint(subscribers, src),
                _ => debug!("ignoring unrecognized datagram from {}", src),
            },
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) => {
                warn!("telemetry socket receive error: {}", e);
                break;
            }
        }
    }
}

fn register_endpoint(subscribers: &Mutex<Vec<SocketAddr>>, addr: SocketAddr) {
    let mut subs = lock_recover(subscribers);
    if !subs.contains(&addr) {
        subs.push(addr);
        info!("added telemetry subscriber {}", addr);
    }
}

fn unregister_endpoint(subscribers: &Mutex<Vec<SocketAddr>>, addr: SocketAddr) {
    let mut subs = lock_recover(subscribers);
    if let Some(index) = subs.iter().position(|s| *s == addr) {
        subs.remove(index);
        info!("removed telemetry subscriber {}", addr);
    }
}

fn clamp_rate(hz: f64) -> f64 {
    hz.clamp(MIN_TELEMETRY_RATE, MAX_TELEMETRY_RATE)
}
