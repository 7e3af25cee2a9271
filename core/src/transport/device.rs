use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

/// Byte channel the line transport reads from and writes to.
pub trait SerialDevice: Read + Write + Send {
    /// Number of bytes that can be read without blocking.
    fn bytes_available(&mut self) -> io::Result<usize>;
}

impl SerialDevice for Box<dyn serialport::SerialPort> {
    fn bytes_available(&mut self) -> io::Result<usize> {
        self.bytes_to_read()
            .map(|count| count as usize)
            .map_err(io::Error::from)
    }
}

/// In-memory device; the handle side feeds input and inspects output.
#[derive(Clone, Default)]
pub struct MemoryDevice {
    incoming: Arc<Mutex<VecDeque<u8>>>,
    written: Arc<Mutex<Vec<u8>>>,
}

impl MemoryDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&self, bytes: &[u8]) {
        if let Ok(mut incoming) = self.incoming.lock() {
            incoming.extend(bytes);
        }
    }

    pub fn written(&self) -> String {
        self.written
            .lock()
            .map(|written| String::from_utf8_lossy(&written).into_owned())
            .unwrap_or_default()
    }
}

impl Read for MemoryDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut incoming = self
            .incoming
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "poisoned input"))?;
        let count = buf.len().min(incoming.len());
        for (slot, byte) in buf.iter_mut().zip(incoming.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }
}

impl Write for MemoryDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut written = self
            .written
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "poisoned output"))?;
        written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SerialDevice for MemoryDevice {
    fn bytes_available(&mut self) -> io::Result<usize> {
        self.incoming
            .lock()
            .map(|incoming| incoming.len())
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "poisoned input"))
    }
}
