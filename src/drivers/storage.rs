// src/drivers/storage.rs
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{Local, TimeZone};

use crate::drivers::error::DatalogError;
use crate::drivers::store::ExperimentStore;
use crate::types::{ExperimentId, Sample};

pub const CSV_HEADER: &str = "Experiment,Time,Value,Date_and_time";

/// Writes the whole store as CSV, one row per sample, experiments ascending.
pub fn save_csv(store: &ExperimentStore, path: &Path) -> Result<(), DatalogError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{CSV_HEADER}")?;
    for id in store.all_ids() {
        for sample in store.get(id) {
            writeln!(
                writer,
                "E{id},{},{},{}",
                sample.timestamp,
                sample.value,
                format_datetime(sample.timestamp)
            )?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Reads a CSV written by [`save_csv`] (or anything matching its shape)
/// into `store`, replacing its previous contents. Returns the id the next
/// experiment should record under (max loaded id + 1).
///
/// Malformed rows are skipped, not fatal; only opening or reading the file
/// itself can fail, and an unopenable file leaves the store untouched. The
/// first line is always treated as the header.
pub fn load_csv(path: &Path, store: &mut ExperimentStore) -> Result<ExperimentId, DatalogError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    store.clear();
    let mut next_id: ExperimentId = 1;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if index == 0 {
            continue;
        }
        let Some((id, sample)) = parse_row(&line) else {
            continue;
        };
        store.append(id, sample);
        if id >= next_id {
            next_id = id + 1;
        }
    }

    Ok(next_id)
}

fn format_datetime(epoch_seconds: f64) -> String {
    Local
        .timestamp_opt(epoch_seconds as i64, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// One data row, or None when it does not parse. The trailing date column is
/// display-only and ignored here.
fn parse_row(line: &str) -> Option<(ExperimentId, Sample)> {
    let mut fields = line.split(',');
    let label = fields.next()?.trim();
    let timestamp: f64 = fields.next()?.trim().parse().ok()?;
    let value: f64 = fields.next()?.trim().parse().ok()?;
    let id: ExperimentId = label.trim_start_matches(['E', 'e']).parse().ok()?;
    Some((id, Sample { timestamp, value }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("labtrace_{}_{name}", std::process::id()))
    }

    #[test]
    fn round_trip_preserves_ids_and_samples() {
        let mut store = ExperimentStore::new();
        store.append(
            1,
            Sample {
                timestamp: 1700000000.25,
                value: 12.5,
            },
        );
        store.append(
            1,
            Sample {
                timestamp: 1700000000.35,
                value: 13.0,
            },
        );
        store.append(
            4,
            Sample {
                timestamp: 1700000010.0,
                value: -3.75,
            },
        );

        let path = temp_file("round_trip.csv");
        save_csv(&store, &path).unwrap();
        let mut restored = ExperimentStore::new();
        let next_id = load_csv(&path, &mut restored).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(restored.all_ids(), vec![1, 4]);
        assert_eq!(next_id, 5);
        for id in [1, 4] {
            let original = store.get(id);
            let loaded = restored.get(id);
            assert_eq!(original.len(), loaded.len());
            for (a, b) in original.iter().zip(loaded) {
                assert!((a.timestamp - b.timestamp).abs() < 1e-9);
                assert!((a.value - b.value).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let path = temp_file("malformed.csv");
        let contents = "Experiment,Time,Value,Date_and_time\n\
                        E1,100.0,1.5,2024-01-01 10:00:00\n\
                        not a row\n\
                        E1,abc,2.5,2024-01-01 10:00:01\n\
                        Ex,100.2,2.5,2024-01-01 10:00:01\n\
                        E2,101.0,3.5,2024-01-01 10:00:02\n\
                        E2,101.5\n";
        std::fs::write(&path, contents).unwrap();
        let mut store = ExperimentStore::new();
        let next_id = load_csv(&path, &mut store).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(store.all_ids(), vec![1, 2]);
        assert_eq!(store.get(1).len(), 1);
        assert_eq!(store.get(2).len(), 1);
        assert_eq!(next_id, 3);
    }

    #[test]
    fn loading_replaces_previous_contents() {
        let mut store = ExperimentStore::new();
        store.append(
            9,
            Sample {
                timestamp: 0.0,
                value: 1.0,
            },
        );

        let path = temp_file("replace.csv");
        std::fs::write(&path, "Experiment,Time,Value,Date_and_time\nE2,1.0,5.0,x\n").unwrap();
        let next_id = load_csv(&path, &mut store).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(store.all_ids(), vec![2]);
        assert_eq!(next_id, 3);
    }

    #[test]
    fn unopenable_file_leaves_the_store_untouched() {
        let mut store = ExperimentStore::new();
        store.append(
            1,
            Sample {
                timestamp: 0.0,
                value: 1.0,
            },
        );
        let missing = temp_file("does_not_exist.csv");
        assert!(load_csv(&missing, &mut store).is_err());
        assert_eq!(store.all_ids(), vec![1]);
    }

    #[test]
    fn loading_an_empty_file_yields_an_empty_store() {
        let path = temp_file("empty.csv");
        std::fs::write(&path, "").unwrap();
        let mut store = ExperimentStore::new();
        let next_id = load_csv(&path, &mut store).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(store.is_empty());
        assert_eq!(next_id, 1);
    }
}
