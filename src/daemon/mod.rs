//! # Capture Daemon
//!
//! Receive loop that filters link-layer traffic for SADP frames and hands
//! each decoded frame to the registered listeners.
//!
//! ## Lifecycle
//!
//! 1. Register listeners: `daemon.add_listener(Some(listener))`
//! 2. Arm the loop: `daemon.start()`
//! 3. Drive it: `daemon.run()` blocks the calling thread
//! 4. Stop: `daemon.stop()` or a [`StopHandle`]; takes effect once the
//!    in-flight receive returns, since receive has no timeout
//!
//! ## Example
//!
//! ```ignore
//! let daemon = CaptureDaemon::new(Arc::new(RawTransport::new(identity)?));
//! daemon.add_listener(Some(Arc::new(MyListener)));
//! daemon.start();
//! daemon.send_inquiry()?;
//! daemon.run();
//! ```

pub mod listener;

pub use listener::*;

use crate::codec::{peek_ethertype, DecodeMode, LinkFrame, MIN_FRAME_LENGTH, SADP_ETHERTYPE};
use crate::config::SadpConfig;
use crate::error::{Result, SadpError};
use crate::logging::{ConsoleLogger, LogLevel, SadpLogger};
use crate::packet::{self, FrameCounter, PacketBuilder};
use crate::transport::{LinkTransport, RECEIVE_BUFFER_SIZE};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

const COMPONENT: &str = "CaptureDaemon";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DaemonState {
    Idle = 0,
    Running = 1,
    /// Stop requested; the loop exits at its next check.
    Stopping = 2,
}

impl From<u8> for DaemonState {
    fn from(v: u8) -> Self {
        match v {
            1 => DaemonState::Running,
            2 => DaemonState::Stopping,
            _ => DaemonState::Idle,
        }
    }
}

/// Cloneable handle that can stop a daemon from a listener or another thread.
#[derive(Debug, Clone)]
pub struct StopHandle {
    state: Arc<AtomicU8>,
}

impl StopHandle {
    /// Running -> Stopping. Returns false if the daemon was not running.
    pub fn stop(&self) -> bool {
        self.state
            .compare_exchange(
                DaemonState::Running as u8,
                DaemonState::Stopping as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    pub fn state(&self) -> DaemonState {
        DaemonState::from(self.state.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.state() == DaemonState::Running
    }
}

pub struct CaptureDaemon {
    transport: Arc<dyn LinkTransport>,
    control: StopHandle,
    listeners: ListenerRegistry,
    builder: PacketBuilder,
    decode_mode: DecodeMode,
    buffer_size: usize,
    logger: Arc<dyn SadpLogger>,
}

impl CaptureDaemon {
    pub fn new(transport: Arc<dyn LinkTransport>) -> Self {
        CaptureDaemon {
            transport,
            control: StopHandle {
                state: Arc::new(AtomicU8::new(DaemonState::Idle as u8)),
            },
            listeners: ListenerRegistry::new(),
            builder: PacketBuilder::new(Arc::new(FrameCounter::new())),
            decode_mode: DecodeMode::Lenient,
            buffer_size: RECEIVE_BUFFER_SIZE,
            logger: ConsoleLogger::new(),
        }
    }

    pub fn from_config(transport: Arc<dyn LinkTransport>, config: &SadpConfig) -> Self {
        let counter = match config.counter_start {
            Some(start) => FrameCounter::with_start(start),
            None => FrameCounter::new(),
        };
        Self::new(transport)
            .with_counter(Arc::new(counter))
            .with_decode_mode(config.decode_mode())
            .with_buffer_size(config.receive_buffer_size)
    }

    pub fn with_counter(mut self, counter: Arc<FrameCounter>) -> Self {
        self.builder = PacketBuilder::new(counter);
        self
    }

    pub fn with_decode_mode(mut self, mode: DecodeMode) -> Self {
        self.decode_mode = mode;
        self
    }

    /// Receive buffer size; never below [`RECEIVE_BUFFER_SIZE`].
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(RECEIVE_BUFFER_SIZE);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn SadpLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn transport(&self) -> Arc<dyn LinkTransport> {
        self.transport.clone()
    }

    pub fn builder(&self) -> &PacketBuilder {
        &self.builder
    }

    pub fn state(&self) -> DaemonState {
        self.control.state()
    }

    pub fn is_running(&self) -> bool {
        self.control.is_running()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.control.clone()
    }

    /// Arm the loop. No-op (returns false) if already running.
    pub fn start(&self) -> bool {
        let previous = self.control.state.swap(DaemonState::Running as u8, Ordering::SeqCst);
        let started = DaemonState::from(previous) != DaemonState::Running;
        if started {
            self.logger.log(LogLevel::Info, COMPONENT, &format!("Started on '{}'", self.transport.identity().name));
        }
        started
    }

    /// Request the loop to exit after the frame currently being received.
    pub fn stop(&self) -> bool {
        let stopping = self.control.stop();
        if stopping {
            self.logger.log(LogLevel::Info, COMPONENT, "Stop requested");
        }
        stopping
    }

    pub fn add_listener(&self, listener: Option<Arc<dyn PacketListener>>) -> bool {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, listener: &Arc<dyn PacketListener>) -> bool {
        self.listeners.remove(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Broadcast one inquiry from the bound interface.
    pub fn send_inquiry(&self) -> Result<usize> {
        let sent = packet::send_inquiry(self.transport.as_ref(), &self.builder);
        match &sent {
            Ok(n) => self.logger.log(LogLevel::Debug, COMPONENT, &format!("Inquiry sent ({} bytes)", n)),
            Err(e) => self.logger.log(LogLevel::Error, COMPONENT, &format!("Inquiry failed: {}", e)),
        }
        sent
    }

    /// Capture loop. Blocks until [`stop`](Self::stop) is observed.
    ///
    /// Receive, decode and listener failures are logged and never end the
    /// loop. Returns immediately if the daemon was not started.
    pub fn run(&self) {
        match self.state() {
            DaemonState::Running => {}
            DaemonState::Stopping => {
                self.finish();
                return;
            }
            DaemonState::Idle => {
                self.logger.log(LogLevel::Warn, COMPONENT, "run() called before start()");
                return;
            }
        }

        let mut buf = vec![0u8; self.buffer_size];
        while self.is_running() {
            match self.transport.receive(&mut buf) {
                Ok(size) => {
                    let result = match buf.get(..size) {
                        Some(data) => self.process_frame(data),
                        None => Err(SadpError::MalformedFrame {
                            len: size,
                            minimum: MIN_FRAME_LENGTH,
                        }),
                    };
                    if let Err(e) = result {
                        self.logger.log(LogLevel::Warn, COMPONENT, &format!("Dropped frame: {}", e));
                    }
                }
                Err(e) => self.logger.log(
                    LogLevel::Error,
                    COMPONENT,
                    &format!("RX Error: {}", SadpError::Transport(e)),
                ),
            }
        }
        self.finish();
    }

    /// Filter, decode and dispatch one captured frame.
    ///
    /// Frames with another ethertype are skipped (`Ok(0)`). Returns the
    /// number of listeners that handled the frame without error.
    pub fn process_frame(&self, data: &[u8]) -> Result<usize> {
        if peek_ethertype(data) != Some(SADP_ETHERTYPE) {
            return Ok(0);
        }

        let link = LinkFrame::decode(data, self.decode_mode)?;
        self.logger.log(
            LogLevel::Debug,
            COMPONENT,
            &format!(
                "SADP {} from {} ({}), counter 0x{:08x}",
                link.frame.query_label(),
                link.header.source,
                link.frame.source_ip,
                link.frame.counter
            ),
        );

        let event = PacketEvent {
            header: &link.header,
            frame: &link.frame,
            raw: data,
            transport: self.transport.as_ref(),
        };

        let mut handled = 0;
        for listener in self.listeners.snapshot() {
            match panic::catch_unwind(AssertUnwindSafe(|| listener.on_packet_received(&event))) {
                Ok(Ok(())) => handled += 1,
                Ok(Err(e)) => self.logger.log(LogLevel::Warn, COMPONENT, &format!("Listener failed: {}", e)),
                Err(payload) => self.logger.log(
                    LogLevel::Error,
                    COMPONENT,
                    &format!("{}", SadpError::Listener(panic_message(payload.as_ref()))),
                ),
            }
        }
        Ok(handled)
    }

    /// Stopping -> Idle. A concurrent `start()` that already re-armed the
    /// daemon is left Running.
    fn finish(&self) {
        let stopped = self
            .control
            .state
            .compare_exchange(
                DaemonState::Stopping as u8,
                DaemonState::Idle as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        if stopped {
            self.logger.log(LogLevel::Info, COMPONENT, "Capture loop stopped");
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

mod tests;
