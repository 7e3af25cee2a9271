use anyhow::{ensure, Context};
use fatiguecore::prelude::{
    AlarmConfig, ConfidencePolicy, TransportConfig, UnknownLabelPolicy, DEFAULT_CATEGORIES,
};
use fatiguecore::video::PlayerCommand;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub port: String,
    pub baud_rate: u32,
    pub settle_delay_ms: u64,
    pub connect_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub categories: Vec<String>,
    pub fatigue_threshold: f64,
    pub fatigue_increment: f64,
    pub unknown_label_policy: UnknownLabelPolicy,
    pub confidence_policy: ConfidencePolicy,
    pub bind: SocketAddr,
    pub player: Option<PlayerCommand>,
    pub autoplay: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".into(),
            baud_rate: 115_200,
            settle_delay_ms: 2_000,
            connect_timeout_ms: 5_000,
            poll_interval_ms: 100,
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            fatigue_threshold: 5.0,
            fatigue_increment: 0.1,
            unknown_label_policy: UnknownLabelPolicy::Reset,
            confidence_policy: ConfidencePolicy::Clamp,
            bind: SocketAddr::from(([127, 0, 0, 1], 9000)),
            player: None,
            autoplay: false,
        }
    }
}

impl MonitorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading monitor config {}", path_ref.display()))?;
        let config: MonitorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing monitor config {}", path_ref.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_args(port: String, baud_rate: u32, bind: SocketAddr) -> Self {
        Self {
            port,
            baud_rate,
            bind,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.categories.is_empty(), "categories must not be empty");
        ensure!(
            self.fatigue_threshold > 0.0,
            "fatigue_threshold must be positive, got {}",
            self.fatigue_threshold
        );
        ensure!(
            self.fatigue_increment > 0.0,
            "fatigue_increment must be positive, got {}",
            self.fatigue_increment
        );
        ensure!(self.poll_interval_ms > 0, "poll_interval_ms must be positive");
        Ok(())
    }

    pub fn to_alarm_config(&self) -> AlarmConfig {
        AlarmConfig {
            categories: self.categories.clone(),
            fatigue_threshold: self.fatigue_threshold,
            fatigue_increment: self.fatigue_increment,
            unknown_label_policy: self.unknown_label_policy,
            confidence_policy: self.confidence_policy,
        }
    }

    pub fn to_transport_config(&self) -> TransportConfig {
        TransportConfig {
            address: self.port.clone(),
            baud_rate: self.baud_rate,
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_produces_transport_config() {
        let cfg = MonitorConfig::from_args(
            "COM3".into(),
            9600,
            SocketAddr::from(([0, 0, 0, 0], 8080)),
        );
        let transport = cfg.to_transport_config();
        assert_eq!(transport.address, "COM3");
        assert_eq!(transport.baud_rate, 9600);
        assert_eq!(transport.settle_delay, Duration::from_secs(2));
        assert_eq!(cfg.to_alarm_config().categories, vec!["Close", "Open"]);
    }

    #[test]
    fn config_load_reads_yaml_with_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"port: /dev/ttyACM0\nfatigue_threshold: 3.0\nunknown_label_policy: ignore\nplayer:\n  program: ffplay\n  args: [\"-i\", \"{url}\"]\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = MonitorConfig::load(&path).unwrap();
        assert_eq!(cfg.port, "/dev/ttyACM0");
        assert_eq!(cfg.baud_rate, 115_200);
        assert_eq!(cfg.fatigue_threshold, 3.0);
        assert_eq!(cfg.unknown_label_policy, UnknownLabelPolicy::Ignore);
        assert_eq!(cfg.player.unwrap().program, "ffplay");
    }

    #[test]
    fn config_load_rejects_empty_categories() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"categories: []\n").unwrap();
        let path = temp.into_temp_path();
        assert!(MonitorConfig::load(&path).is_err());
    }
}
