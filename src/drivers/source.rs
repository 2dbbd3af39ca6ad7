// src/drivers/source.rs
use std::collections::VecDeque;

use rand::Rng;

use crate::drivers::error::DatalogError;

/// Something that can yield one scalar reading when polled.
///
/// `Ok(None)` means "no data ready yet" -- the caller retries after a short
/// pause without consuming a sample slot. Errors are per-read and transient;
/// the acquisition loop logs them and keeps polling.
pub trait SampleSource {
    fn poll_value(&mut self) -> Result<Option<f64>, DatalogError>;
}

/// Stand-in device producing uniform noise in a fixed range.
pub struct SimulatorSource {
    min_value: f64,
    max_value: f64,
}

impl SimulatorSource {
    pub fn new(min_value: f64, max_value: f64) -> Self {
        Self {
            min_value,
            max_value,
        }
    }
}

impl SampleSource for SimulatorSource {
    fn poll_value(&mut self) -> Result<Option<f64>, DatalogError> {
        let value = rand::thread_rng().gen_range(self.min_value..=self.max_value);
        Ok(Some(value))
    }
}

/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    queue: VecDeque<f64>,
}

impl ManualSource {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            queue: values.into_iter().collect(),
        }
    }
}

impl SampleSource for ManualSource {
    fn poll_value(&mut self) -> Result<Option<f64>, DatalogError> {
        Ok(self.queue.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulator_stays_in_range() {
        let mut source = SimulatorSource::new(0.0, 100.0);
        for _ in 0..200 {
            let value = source.poll_value().unwrap().unwrap();
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn manual_source_drains_in_order() {
        let mut source = ManualSource::new([1.0, 2.0]);
        assert_eq!(source.poll_value().unwrap(), Some(1.0));
        assert_eq!(source.poll_value().unwrap(), Some(2.0));
        assert_eq!(source.poll_value().unwrap(), None);
    }
}
