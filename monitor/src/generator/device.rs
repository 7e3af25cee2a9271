use crate::generator::lines::{format_line, LineFormat};
use fatiguecore::transport::SerialDevice;
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

/// Configuration for the synthetic microcontroller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub interval_ms: u64,
    pub seed: u64,
    pub format: LineFormat,
    pub locator: Option<String>,
    /// Ticks per scripted cycle; each cycle opens with a fatigue episode.
    pub cycle_ticks: u64,
    pub episode_ticks: u64,
    /// Chance of a stray "close" outside the episode.
    pub noise: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            seed: 0,
            format: LineFormat::Json,
            locator: Some("rtsp://192.168.4.1:554/mjpeg/1".into()),
            cycle_ticks: 200,
            episode_ticks: 60,
            noise: 0.05,
        }
    }
}

/// Serial device stand-in that emits detection lines on a fixed cadence and
/// logs the commands written back to it.
pub struct SimulatedDevice {
    config: SimulatorConfig,
    rng: StdRng,
    tick: u64,
    next_emit: Instant,
    pending: VecDeque<u8>,
    inbound: Vec<u8>,
}

impl SimulatedDevice {
    pub fn new(config: SimulatorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            tick: 0,
            next_emit: Instant::now(),
            pending: VecDeque::new(),
            inbound: Vec::new(),
        }
    }

    /// Produces the next scripted line and advances the tick counter.
    pub fn next_line(&mut self) -> String {
        let cycle = self.config.cycle_ticks.max(1);
        let in_episode = self.tick % cycle < self.config.episode_ticks;
        let noise = self.config.noise.clamp(0.0, 1.0);
        let eyes_closed = in_episode || self.rng.gen_bool(noise);
        let label = if eyes_closed { "close" } else { "open" };
        let confidence = self.rng.gen_range(0.6..0.99);
        self.tick += 1;

        format_line(
            self.config.format,
            label,
            confidence,
            self.config.locator.as_deref(),
        )
    }

    fn interval(&self) -> Duration {
        Duration::from_millis(self.config.interval_ms)
    }
}

impl Read for SimulatedDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = buf.len().min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }
}

impl Write for SimulatedDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inbound.extend_from_slice(buf);
        while let Some(pos) = self.inbound.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.inbound.drain(..=pos).collect();
            info!(
                "[simulator] device received {}",
                String::from_utf8_lossy(&raw).trim()
            );
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SerialDevice for SimulatedDevice {
    fn bytes_available(&mut self) -> io::Result<usize> {
        let now = Instant::now();
        if now >= self.next_emit {
            let line = self.next_line();
            self.pending.extend(line.bytes());
            self.pending.push_back(b'\n');
            self.next_emit = now + self.interval();
        }
        Ok(self.pending.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fatiguecore::prelude::AlarmConfig;
    use fatiguecore::protocol::LineDecoder;

    #[test]
    fn episode_emits_enough_fatigue_lines_to_trip_alarm() {
        let config = SimulatorConfig {
            noise: 0.0,
            ..Default::default()
        };
        let episode = config.episode_ticks as usize;
        let mut device = SimulatedDevice::new(config);
        let decoder = LineDecoder::new(&AlarmConfig::default());

        let fatigue = (0..episode)
            .map(|_| decoder.decode(&device.next_line()).unwrap())
            .filter(|record| record.is_fatigue())
            .count();
        assert_eq!(fatigue, episode);
        assert!(!decoder.decode(&device.next_line()).unwrap().is_fatigue());
    }

    #[test]
    fn same_seed_yields_same_lines() {
        let config = SimulatorConfig {
            seed: 13,
            format: LineFormat::Prefixed,
            ..Default::default()
        };
        let mut first = SimulatedDevice::new(config.clone());
        let mut second = SimulatedDevice::new(config);
        for _ in 0..10 {
            assert_eq!(first.next_line(), second.next_line());
        }
    }

    #[test]
    fn first_poll_has_a_complete_line() {
        let mut device = SimulatedDevice::new(SimulatorConfig::default());
        let available = device.bytes_available().unwrap();
        let mut buf = vec![0u8; available];
        device.read_exact(&mut buf).unwrap();
        assert_eq!(buf.last(), Some(&b'\n'));
    }
}
