use std::collections::VecDeque;

use cadenza_types::TimeUs;

use crate::input_log::{InputLogger, RawInput};

/// Source of raw presses, polled once per engine tick.
pub trait InputSource {
    /// Return every press with `time_us <= until_us` not returned before.
    fn poll(&mut self, until_us: TimeUs) -> Vec<RawInput>;
}

/// Pre-recorded presses released as time passes.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    pending: VecDeque<RawInput>,
}

impl ScriptedInput {
    pub fn new(mut inputs: Vec<RawInput>) -> Self {
        inputs.sort_by_key(|i| i.time_us);
        Self {
            pending: inputs.into(),
        }
    }

    pub fn push(&mut self, input: RawInput) {
        let pos = self.pending.partition_point(|i| i.time_us <= input.time_us);
        self.pending.insert(pos, input);
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, until_us: TimeUs) -> Vec<RawInput> {
        let ready = self.pending.partition_point(|i| i.time_us <= until_us);
        self.pending.drain(..ready).collect()
    }
}

/// Wraps a source and logs everything it yields.
pub struct RecordingSource<S> {
    inner: S,
    logger: InputLogger,
}

impl<S: InputSource> RecordingSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            logger: InputLogger::new(),
        }
    }

    pub fn logger(&self) -> &InputLogger {
        &self.logger
    }

    pub fn into_parts(self) -> (S, InputLogger) {
        (self.inner, self.logger)
    }
}

impl<S: InputSource> InputSource for RecordingSource<S> {
    fn poll(&mut self, until_us: TimeUs) -> Vec<RawInput> {
        let inputs = self.inner.poll(until_us);
        for input in &inputs {
            self.logger.record(input.clone());
        }
        inputs
    }
}
