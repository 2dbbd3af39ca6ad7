// src/drivers/store.rs
use std::collections::BTreeMap;

use crate::types::{ExperimentId, Sample};

/// Count and mean of an experiment's stored (already filtered) values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
}

/// In-memory system of record: experiment id -> ordered sample sequence.
///
/// A sequence is created lazily on the first accepted sample of its
/// experiment and is only ever appended to. Once the active id has moved
/// past an experiment the sequence is read-only.
#[derive(Debug, Default)]
pub struct ExperimentStore {
    experiments: BTreeMap<ExperimentId, Vec<Sample>>,
}

impl ExperimentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, id: ExperimentId, sample: Sample) {
        self.experiments.entry(id).or_default().push(sample);
    }

    pub fn get(&self, id: ExperimentId) -> &[Sample] {
        self.experiments.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Existing experiment ids, ascending.
    pub fn all_ids(&self) -> Vec<ExperimentId> {
        self.experiments.keys().copied().collect()
    }

    /// (id, point count) per experiment, ascending by id.
    pub fn counts(&self) -> Vec<(ExperimentId, usize)> {
        self.experiments
            .iter()
            .map(|(id, samples)| (*id, samples.len()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }

    /// Drops everything. Only used when a file load replaces the store.
    pub fn clear(&mut self) {
        self.experiments.clear();
    }

    /// Owned snapshot of an experiment's values, in arrival order.
    ///
    /// The filter history must be a copy so the acquisition path never
    /// iterates the live sequence while appending to it.
    pub fn values(&self, id: ExperimentId) -> Vec<f64> {
        self.get(id).iter().map(|s| s.value).collect()
    }

    pub fn summarize(&self, id: ExperimentId) -> Option<Summary> {
        let samples = self.experiments.get(&id)?;
        if samples.is_empty() {
            return None;
        }
        let sum: f64 = samples.iter().map(|s| s.value).sum();
        Some(Summary {
            count: samples.len(),
            mean: sum / samples.len() as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(timestamp: f64, value: f64) -> Sample {
        Sample { timestamp, value }
    }

    #[test]
    fn append_creates_sequences_lazily() {
        let mut store = ExperimentStore::new();
        assert!(store.is_empty());
        store.append(3, sample(1.0, 10.0));
        store.append(1, sample(2.0, 20.0));
        store.append(3, sample(3.0, 30.0));
        assert_eq!(store.all_ids(), vec![1, 3]);
        assert_eq!(store.get(3).len(), 2);
        assert_eq!(store.get(2), &[]);
    }

    #[test]
    fn counts_are_ascending_by_id() {
        let mut store = ExperimentStore::new();
        store.append(2, sample(0.0, 1.0));
        store.append(1, sample(0.0, 1.0));
        store.append(2, sample(1.0, 2.0));
        assert_eq!(store.counts(), vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn summarize_reports_count_and_mean() {
        let mut store = ExperimentStore::new();
        store.append(1, sample(0.0, 10.0));
        store.append(1, sample(1.0, 20.0));
        let summary = store.summarize(1).unwrap();
        assert_eq!(summary.count, 2);
        assert!((summary.mean - 15.0).abs() < 1e-9);
    }

    #[test]
    fn summarize_missing_experiment_is_none() {
        let store = ExperimentStore::new();
        assert_eq!(store.summarize(7), None);
    }

    #[test]
    fn clear_replaces_everything() {
        let mut store = ExperimentStore::new();
        store.append(1, sample(0.0, 1.0));
        store.clear();
        assert!(store.is_empty());
    }
}
