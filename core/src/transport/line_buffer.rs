use log::warn;

pub const MAX_LINE_BYTES: usize = 4096;

/// Accumulates raw bytes until a line terminator arrives.
pub struct LineBuffer {
    pending: Vec<u8>,
    max_len: usize,
    // Set after an overflow; input is dropped through the next terminator.
    discarding: bool,
}

impl LineBuffer {
    pub fn with_capacity(max_len: usize) -> Self {
        Self {
            pending: Vec::with_capacity(max_len.min(MAX_LINE_BYTES)),
            max_len,
            discarding: false,
        }
    }

    /// Appends `bytes` and returns every completed, trimmed, non-empty line.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            if self.discarding {
                self.discarding = false;
                continue;
            }
            let text = String::from_utf8_lossy(&raw);
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }

        if self.discarding {
            self.pending.clear();
        } else if self.pending.len() > self.max_len {
            warn!(
                "discarding oversize line ({} bytes without a terminator)",
                self.pending.len()
            );
            self.pending.clear();
            self.discarding = true;
        }

        lines
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_capacity(MAX_LINE_BYTES)
    }
}
