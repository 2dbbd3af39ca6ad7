// src/session.rs
use std::path::Path;

use crate::config::AppConfig;
use crate::drivers::{sigma_filter, storage, DatalogError, ExperimentStore, Summary};
use crate::types::{ExperimentId, Sample};

/// Mutable recording state, owned by the engine thread.
///
/// The GUI never touches this directly; it sees copies via the message
/// channel. That keeps all store mutation on one thread.
pub struct Session {
    store: ExperimentStore,
    active_id: ExperimentId,
    filter_window: usize,
    filter_k: f64,
}

impl Session {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: ExperimentStore::new(),
            active_id: 1,
            filter_window: config.filter_window,
            filter_k: config.filter_k,
        }
    }

    pub fn active_id(&self) -> ExperimentId {
        self.active_id
    }

    pub fn store(&self) -> &ExperimentStore {
        &self.store
    }

    /// Filters a raw reading against the active experiment's history and
    /// appends the accepted sample.
    ///
    /// The history is an owned snapshot plus the candidate, so the filter
    /// never reads the sequence it is about to grow.
    pub fn ingest(&mut self, timestamp: f64, raw_value: f64) -> Sample {
        let mut history = self.store.values(self.active_id);
        history.push(raw_value);
        let filtered = sigma_filter(&history, self.filter_window, self.filter_k);

        let sample = Sample {
            timestamp,
            value: filtered,
        };
        self.store.append(self.active_id, sample);
        sample
    }

    /// Closes the active experiment and advances the id. The summary is None
    /// when no samples were recorded (no mean over an empty sequence).
    pub fn finish_experiment(&mut self) -> Option<Summary> {
        let summary = self.store.summarize(self.active_id);
        self.active_id += 1;
        summary
    }

    /// Replaces the whole store with a file's contents; the previous
    /// experiments are dropped. The next experiment records under
    /// max(loaded ids) + 1.
    pub fn load_store(&mut self, path: &Path) -> Result<(), DatalogError> {
        self.active_id = storage::load_csv(path, &mut self.store)?;
        Ok(())
    }

    /// Owned copies of the requested experiments' samples, for analysis.
    pub fn series_for(&self, ids: &[ExperimentId]) -> Vec<(ExperimentId, Vec<Sample>)> {
        ids.iter()
            .map(|&id| (id, self.store.get(id).to_vec()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(&AppConfig::default())
    }

    #[test]
    fn ingest_appends_to_the_active_experiment() {
        let mut s = session();
        s.ingest(100.0, 10.0);
        s.ingest(100.1, 11.0);
        assert_eq!(s.store().get(1).len(), 2);
        assert!(s.store().get(2).is_empty());
    }

    #[test]
    fn ingest_clamps_an_outlier_against_history() {
        let mut s = Session::new(&AppConfig {
            filter_k: 2.0,
            ..AppConfig::default()
        });
        for i in 0..5 {
            s.ingest(i as f64, 10.0);
        }
        // History becomes [10 x5, 100]: mean 25, population std ~33.54,
        // deviation 75 > 2 std, so the stored value is the window mean.
        let accepted = s.ingest(5.0, 100.0);
        assert!((accepted.value - 25.0).abs() < 1e-9);
        assert!((s.store().get(1)[5].value - 25.0).abs() < 1e-9);
    }

    #[test]
    fn first_sample_passes_unfiltered() {
        let mut s = session();
        let accepted = s.ingest(0.0, 73.5);
        assert_eq!(accepted.value, 73.5);
    }

    #[test]
    fn finishing_without_samples_gives_no_summary() {
        let mut s = session();
        assert_eq!(s.finish_experiment(), None);
        assert_eq!(s.active_id(), 2);
    }

    #[test]
    fn finishing_reports_count_and_mean_and_advances() {
        let mut s = session();
        s.ingest(0.0, 10.0);
        s.ingest(0.1, 20.0);
        let summary = s.finish_experiment().unwrap();
        assert_eq!(summary.count, 2);
        assert!((summary.mean - 15.0).abs() < 1e-9);
        assert_eq!(s.active_id(), 2);

        // The closed sequence stays readable and untouched.
        s.ingest(1.0, 50.0);
        assert_eq!(s.store().get(1).len(), 2);
        assert_eq!(s.store().get(2).len(), 1);
    }

    #[test]
    fn load_store_swaps_contents_and_id() {
        let mut s = session();
        s.ingest(0.0, 1.0);

        let path = std::env::temp_dir().join(format!(
            "labtrace_{}_session_load.csv",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "Experiment,Time,Value,Date_and_time\nE5,0.0,2.0,2024-01-01 10:00:00\n",
        )
        .unwrap();
        s.load_store(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(s.store().all_ids(), vec![5]);
        assert_eq!(s.active_id(), 6);
    }
}
