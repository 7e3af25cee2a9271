//! Hand-off of the stream locator to an external playback collaborator.

use crate::prelude::VideoError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::process::{Child, Command, Stdio};

const URL_PLACEHOLDER: &str = "{url}";

/// Something that can render a live stream given its locator.
pub trait VideoSurface: Send {
    fn load_and_play(&mut self, locator: &str) -> Result<(), VideoError>;
    fn stop(&mut self);
}

/// Surface used when no player is configured; only logs requests.
#[derive(Default)]
pub struct NullSurface;

impl VideoSurface for NullSurface {
    fn load_and_play(&mut self, locator: &str) -> Result<(), VideoError> {
        info!("no player configured; would play {}", locator);
        Ok(())
    }

    fn stop(&mut self) {}
}

/// Player program and arguments; `{url}` in an argument is replaced by the locator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl PlayerCommand {
    fn build_args(&self, locator: &str) -> Vec<String> {
        if self.args.iter().any(|arg| arg.contains(URL_PLACEHOLDER)) {
            self.args
                .iter()
                .map(|arg| arg.replace(URL_PLACEHOLDER, locator))
                .collect()
        } else {
            let mut args = self.args.clone();
            args.push(locator.to_string());
            args
        }
    }
}

/// Runs a player process such as `vlc` or `ffplay` for the current stream.
pub struct ExternalPlayer {
    command: PlayerCommand,
    child: Option<Child>,
}

impl ExternalPlayer {
    pub fn new(command: PlayerCommand) -> Self {
        Self {
            command,
            child: None,
        }
    }

    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }
}

impl VideoSurface for ExternalPlayer {
    fn load_and_play(&mut self, locator: &str) -> Result<(), VideoError> {
        self.stop();
        let child = Command::new(&self.command.program)
            .args(self.command.build_args(locator))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        info!(
            "started {} (pid {}) for {}",
            self.command.program,
            child.id(),
            locator
        );
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.kill() {
                warn!("failed to stop player: {}", err);
            }
            let _ = child.wait();
        }
    }
}

impl Drop for ExternalPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}
