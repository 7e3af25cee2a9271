use crate::prelude::{AlarmCommand, CommandSink, ConnectError, SendError, TransportConfig};
use crate::transport::device::SerialDevice;
use crate::transport::line_buffer::LineBuffer;
use log::{debug, error, info, warn};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const READ_CHUNK: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChannelState {
    Closed = 0,
    Open = 1,
    Closing = 2,
}

impl ChannelState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ChannelState::Open,
            2 => ChannelState::Closing,
            _ => ChannelState::Closed,
        }
    }
}

struct Shared {
    address: String,
    device: Mutex<Option<Box<dyn SerialDevice>>>,
    state: AtomicU8,
    poll_interval: Duration,
}

impl Shared {
    fn state(&self) -> ChannelState {
        ChannelState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: ChannelState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    fn device(&self) -> MutexGuard<'_, Option<Box<dyn SerialDevice>>> {
        match self.device.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Newline-framed serial channel with a dedicated reader thread.
///
/// The device sits behind a mutex shared by the reader and `send`; the reader
/// only holds it while draining bytes that are already buffered.
pub struct LineTransport {
    shared: Arc<Shared>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl LineTransport {
    /// Opens a serial port, bounded by `connect_timeout`, then waits out the
    /// settle delay while the device resets.
    pub fn open(config: &TransportConfig) -> Result<Self, ConnectError> {
        let (tx, rx) = mpsc::channel();
        let address = config.address.clone();
        let baud_rate = config.baud_rate;
        let read_timeout = config.poll_interval;

        thread::Builder::new()
            .name("serial-open".into())
            .spawn(move || {
                let result = serialport::new(address, baud_rate)
                    .timeout(read_timeout)
                    .open();
                let _ = tx.send(result);
            })
            .map_err(|err| ConnectError::Open {
                address: config.address.clone(),
                baud_rate,
                reason: err.to_string(),
            })?;

        let port = match rx.recv_timeout(config.connect_timeout) {
            Ok(Ok(port)) => port,
            Ok(Err(err)) => {
                error!("cannot open {}: {}", config.address, err);
                return Err(ConnectError::Open {
                    address: config.address.clone(),
                    baud_rate,
                    reason: err.to_string(),
                });
            }
            Err(_) => {
                error!(
                    "opening {} timed out after {:?}",
                    config.address, config.connect_timeout
                );
                return Err(ConnectError::Timeout {
                    address: config.address.clone(),
                    timeout: config.connect_timeout,
                });
            }
        };

        info!(
            "serial port {} open at {} baud, settling for {:?}",
            config.address, baud_rate, config.settle_delay
        );
        thread::sleep(config.settle_delay);

        Ok(Self::with_device(
            config.address.clone(),
            Box::new(port),
            config.poll_interval,
        ))
    }

    /// Wraps an already-open device; the channel starts in the Open state.
    pub fn with_device(
        address: impl Into<String>,
        device: Box<dyn SerialDevice>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                address: address.into(),
                device: Mutex::new(Some(device)),
                state: AtomicU8::new(ChannelState::Open as u8),
                poll_interval,
            }),
            reader: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ChannelState {
        self.shared.state()
    }

    /// Starts the reader thread; `on_line` runs on that thread once per line.
    ///
    /// Only one reader is associated with a channel; later calls are ignored.
    pub fn spawn_reader<F>(&self, on_line: F) -> io::Result<()>
    where
        F: FnMut(String) + Send + 'static,
    {
        let mut reader = match self.reader.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if reader.is_some() {
            warn!("reader already running on {}", self.shared.address);
            return Ok(());
        }

        let shared = self.shared.clone();
        let handle = thread::Builder::new()
            .name("serial-reader".into())
            .spawn(move || read_loop(shared, on_line))?;
        *reader = Some(handle);
        Ok(())
    }

    /// Writes `command` plus a line terminator.
    pub fn send(&self, command: &str) -> Result<(), SendError> {
        if self.state() != ChannelState::Open {
            warn!("cannot send {}: channel is not open", command);
            return Err(SendError::SendOnClosedChannel);
        }

        let mut guard = self.shared.device();
        let device = guard.as_mut().ok_or(SendError::SendOnClosedChannel)?;
        device.write_all(format!("{}\n", command).as_bytes())?;
        device.flush()?;
        info!("sent {} to {}", command, self.shared.address);
        Ok(())
    }

    /// Stops the reader, waits for it, and releases the device. Idempotent.
    pub fn close(&self) {
        if self
            .shared
            .state
            .compare_exchange(
                ChannelState::Open as u8,
                ChannelState::Closing as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            return;
        }

        let handle = match self.reader.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                error!("reader thread for {} panicked", self.shared.address);
            }
        }

        self.shared.device().take();
        self.shared.set_state(ChannelState::Closed);
        info!("serial channel {} closed", self.shared.address);
    }
}

impl CommandSink for LineTransport {
    fn send_command(&self, command: AlarmCommand) -> Result<(), SendError> {
        self.send(command.as_wire())
    }

    fn is_connected(&self) -> bool {
        self.state() == ChannelState::Open
    }
}

impl Drop for LineTransport {
    fn drop(&mut self) {
        self.close();
    }
}

fn read_loop<F>(shared: Arc<Shared>, mut on_line: F)
where
    F: FnMut(String),
{
    let mut buffer = LineBuffer::default();
    let mut chunk = [0u8; READ_CHUNK];

    while shared.state() == ChannelState::Open {
        let read = {
            let mut guard = shared.device();
            let Some(device) = guard.as_mut() else {
                break;
            };
            match device.bytes_available() {
                Ok(0) => Ok(0),
                Ok(available) => device.read(&mut chunk[..available.min(READ_CHUNK)]),
                Err(err) => Err(err),
            }
        };

        match read {
            Ok(0) => thread::sleep(shared.poll_interval),
            Ok(count) => {
                for line in buffer.push(&chunk[..count]) {
                    debug!("received: {}", line);
                    on_line(line);
                }
            }
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                thread::sleep(shared.poll_interval);
            }
            Err(err) => {
                error!("read from {} failed: {}", shared.address, err);
                // The reader is gone, so the channel can no longer count as open.
                if shared
                    .state
                    .compare_exchange(
                        ChannelState::Open as u8,
                        ChannelState::Closing as u8,
                        Ordering::SeqCst,
                        Ordering::SeqCst,
                    )
                    .is_ok()
                {
                    shared.device().take();
                    shared.set_state(ChannelState::Closed);
                    warn!("serial channel {} closed after read failure", shared.address);
                }
                break;
            }
        }
    }

    debug!("reader for {} stopped", shared.address);
}
