use std::path::Path;

use anyhow::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use cadenza_types::TimeUs;

/// A single key press as delivered by the platform layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInput {
    pub input_id: String,
    /// Press time in the active clock domain.
    pub time_us: TimeUs,
}

impl RawInput {
    pub fn new(input_id: impl Into<String>, time_us: TimeUs) -> Self {
        Self {
            input_id: input_id.into(),
            time_us,
        }
    }
}

/// Presses consumed by a session, in the order they were polled.
///
/// Written out as a JSON array, the log replays through a `ScriptedInput`.
#[derive(Debug)]
pub struct InputLogger {
    logs: Vec<RawInput>,
}

impl InputLogger {
    pub fn new() -> Self {
        Self {
            logs: Vec::with_capacity(1024),
        }
    }

    pub fn record(&mut self, input: RawInput) {
        self.logs.push(input);
    }

    pub fn logs(&self) -> &[RawInput] {
        &self.logs
    }

    pub fn into_logs(self) -> Vec<RawInput> {
        self.logs
    }

    pub fn clear(&mut self) {
        self.logs.clear();
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    /// Write the log as a JSON array.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.logs)?;
        std::fs::write(path, json)?;
        debug!("Wrote {} inputs to {}", self.logs.len(), path.display());
        Ok(())
    }

    /// Read a JSON array of inputs, sorted by time (stable for equal times).
    pub fn read(path: &Path) -> Result<Vec<RawInput>> {
        let data = std::fs::read_to_string(path)?;
        let mut inputs: Vec<RawInput> = serde_json::from_str(&data)?;
        inputs.sort_by_key(|i| i.time_us);
        debug!("Read {} inputs from {}", inputs.len(), path.display());
        Ok(inputs)
    }
}

impl Default for InputLogger {
    fn default() -> Self {
        Self::new()
    }
}
