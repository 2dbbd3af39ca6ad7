// src/engine.rs
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::warn;

use crate::config::AppConfig;
use crate::drivers::{
    render_comparison_png, storage, DatalogError, PlotProjector, PlotStyle, SampleSource,
    SimulatorSource,
};
use crate::serial::SerialSource;
use crate::session::Session;
use crate::types::*;

/// Every Nth accepted sample also goes to the log panel.
const LOG_EVERY: usize = 5;

pub fn spawn_thread(
    tx: Sender<EngineMessage>,
    rx_cmd: Receiver<GuiCommand>,
    recording: Arc<AtomicBool>,
    config: AppConfig,
) {
    thread::spawn(move || run(tx, rx_cmd, recording, config));
}

fn run(
    tx: Sender<EngineMessage>,
    rx_cmd: Receiver<GuiCommand>,
    recording: Arc<AtomicBool>,
    config: AppConfig,
) {
    let mut session = Session::new(&config);
    let mut source: Option<Box<dyn SampleSource + Send>> = None;
    let mut sample_seq = 0usize;

    tx.send(EngineMessage::Log("acquisition engine ready".to_owned()))
        .ok();
    tx.send(EngineMessage::ActiveExperiment(session.active_id()))
        .ok();

    loop {
        // ============================================================
        // 1. Command handling
        // ============================================================
        for _ in 0..10 {
            match rx_cmd.try_recv() {
                Ok(cmd) => handle_command(
                    cmd,
                    &mut session,
                    &mut source,
                    &mut sample_seq,
                    &recording,
                    &config,
                    &tx,
                ),
                Err(TryRecvError::Empty) => break,
                // GUI is gone; nothing left to do.
                Err(TryRecvError::Disconnected) => return,
            }
        }

        // ============================================================
        // 2. Acquisition tick
        // ============================================================
        if recording.load(Ordering::SeqCst) {
            let Some(src) = source.as_mut() else {
                thread::sleep(Duration::from_millis(50));
                continue;
            };
            match src.poll_value() {
                Ok(Some(raw)) => {
                    let sample = session.ingest(epoch_seconds(), raw);
                    sample_seq += 1;
                    if sample_seq % LOG_EVERY == 0 {
                        tx.send(EngineMessage::Log(format!(
                            "E{}: {:.2}",
                            session.active_id(),
                            sample.value
                        )))
                        .ok();
                    }
                    tx.send(EngineMessage::Point(sample)).ok();
                    thread::sleep(Duration::from_millis(config.sample_interval_ms));
                }
                // No data ready: retry shortly, no sample slot consumed.
                Ok(None) => thread::sleep(Duration::from_millis(config.idle_poll_ms)),
                // A failed read never stops the loop.
                Err(e) => {
                    warn!("sample read failed: {e}");
                    thread::sleep(Duration::from_millis(config.sample_interval_ms));
                }
            }
        } else {
            if source.take().is_some() {
                // The recording flag was cleared since the last iteration:
                // the source is dropped (closing any port) and the active
                // experiment is closed out.
                finish_experiment(&mut session, &tx);
            }
            thread::sleep(Duration::from_millis(50));
        }
    }
}

fn handle_command(
    cmd: GuiCommand,
    session: &mut Session,
    source: &mut Option<Box<dyn SampleSource + Send>>,
    sample_seq: &mut usize,
    recording: &Arc<AtomicBool>,
    config: &AppConfig,
    tx: &Sender<EngineMessage>,
) {
    match cmd {
        GuiCommand::StartRecording { mode, port } => {
            if recording.load(Ordering::SeqCst) {
                tx.send(EngineMessage::Warn(
                    "already recording; stop the current experiment first".to_owned(),
                ))
                .ok();
                return;
            }
            // A stop immediately followed by a start can land before the
            // acquisition branch noticed the cleared flag.
            if source.take().is_some() {
                finish_experiment(session, tx);
            }
            match open_source(mode, port.as_deref(), config) {
                Ok(src) => {
                    *source = Some(src);
                    *sample_seq = 0;
                    recording.store(true, Ordering::SeqCst);
                    tx.send(EngineMessage::Log("=".repeat(40))).ok();
                    tx.send(EngineMessage::Log(format!(
                        "experiment E{} started ({})",
                        session.active_id(),
                        match mode {
                            ConnectionMode::Simulator => "simulator".to_owned(),
                            ConnectionMode::Serial =>
                                port.unwrap_or_else(|| "serial".to_owned()),
                        }
                    )))
                    .ok();
                    tx.send(EngineMessage::RecordingStatus(true)).ok();
                    tx.send(EngineMessage::ActiveExperiment(session.active_id()))
                        .ok();
                }
                Err(e) => {
                    // Connection failures are fatal to this start only.
                    tx.send(EngineMessage::Error(format!("could not connect: {e:#}")))
                        .ok();
                    tx.send(EngineMessage::RecordingStatus(false)).ok();
                }
            }
        }
        GuiCommand::SaveAll(path) => {
            if session.store().is_empty() {
                tx.send(EngineMessage::Warn("no data to save".to_owned())).ok();
                return;
            }
            match storage::save_csv(session.store(), &path) {
                Ok(()) => {
                    tx.send(EngineMessage::Log(format!("saved to {}", path.display())))
                        .ok();
                }
                Err(e) => {
                    tx.send(EngineMessage::Error(format!(
                        "could not save {}: {e}",
                        path.display()
                    )))
                    .ok();
                }
            }
        }
        GuiCommand::Load(path) => {
            if recording.load(Ordering::SeqCst) {
                tx.send(EngineMessage::Warn(
                    "stop recording before loading a file".to_owned(),
                ))
                .ok();
                return;
            }
            match session.load_store(&path) {
                Ok(()) => {
                    let counts = session.store().counts();
                    tx.send(EngineMessage::Log(format!(
                        "loaded from {}",
                        path.display()
                    )))
                    .ok();
                    for (id, count) in &counts {
                        tx.send(EngineMessage::Log(format!("E{id}: {count} points")))
                            .ok();
                    }
                    tx.send(EngineMessage::ActiveExperiment(session.active_id()))
                        .ok();
                    tx.send(EngineMessage::ExperimentList(counts)).ok();
                }
                Err(e) => {
                    tx.send(EngineMessage::Error(format!(
                        "could not load {}: {e}",
                        path.display()
                    )))
                    .ok();
                }
            }
        }
        GuiCommand::Analyze(ids) => {
            if session.store().is_empty() {
                tx.send(EngineMessage::Warn("no data to analyze".to_owned())).ok();
                return;
            }
            if ids.is_empty() {
                tx.send(EngineMessage::Warn("no experiments selected".to_owned()))
                    .ok();
                return;
            }
            let series = session.series_for(&ids);
            if series.iter().all(|(_, samples)| samples.is_empty()) {
                tx.send(EngineMessage::Warn(
                    "selected experiments have no samples".to_owned(),
                ))
                .ok();
                return;
            }
            tx.send(EngineMessage::Analysis(series)).ok();
        }
        GuiCommand::ExportPlot { path, ids } => {
            let series = session.series_for(&ids);
            match PlotProjector::new(&series) {
                Some(projector) => match export_png(&projector, &path) {
                    Ok(()) => {
                        tx.send(EngineMessage::Log(format!(
                            "chart exported to {}",
                            path.display()
                        )))
                        .ok();
                    }
                    Err(e) => {
                        tx.send(EngineMessage::Error(format!(
                            "could not export {}: {e}",
                            path.display()
                        )))
                        .ok();
                    }
                },
                None => {
                    tx.send(EngineMessage::Warn(
                        "nothing to export: selected experiments have no samples".to_owned(),
                    ))
                    .ok();
                }
            }
        }
    }
}

fn finish_experiment(session: &mut Session, tx: &Sender<EngineMessage>) {
    let closed = session.active_id();
    match session.finish_experiment() {
        Some(summary) => {
            tx.send(EngineMessage::Log(format!(
                "experiment E{closed} finished: {} points, mean {:.2}",
                summary.count, summary.mean
            )))
            .ok();
        }
        None => {
            tx.send(EngineMessage::Log(format!(
                "experiment E{closed} finished: no samples"
            )))
            .ok();
        }
    }
    tx.send(EngineMessage::RecordingStatus(false)).ok();
    tx.send(EngineMessage::ActiveExperiment(session.active_id()))
        .ok();
    tx.send(EngineMessage::ExperimentList(session.store().counts()))
        .ok();
}

fn open_source(
    mode: ConnectionMode,
    port: Option<&str>,
    config: &AppConfig,
) -> anyhow::Result<Box<dyn SampleSource + Send>> {
    match mode {
        ConnectionMode::Simulator => Ok(Box::new(SimulatorSource::new(
            config.sim_min,
            config.sim_max,
        ))),
        ConnectionMode::Serial => {
            let port = port.filter(|p| !p.is_empty());
            let Some(port) = port else {
                anyhow::bail!("no serial port selected");
            };
            Ok(Box::new(SerialSource::connect(port, config.baud_rate)?))
        }
    }
}

fn export_png(projector: &PlotProjector, path: &Path) -> Result<(), DatalogError> {
    let png = render_comparison_png(projector, PlotStyle::default())?;
    std::fs::write(path, png)?;
    Ok(())
}

fn epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
