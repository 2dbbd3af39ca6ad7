// src/types.rs
use std::path::PathBuf;

/// Experiment numbers start at 1 and only ever grow within a session.
pub type ExperimentId = u32;

/// One observation: epoch timestamp in seconds plus the (already filtered) value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub timestamp: f64,
    pub value: f64,
}

// Acquisition mode
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum ConnectionMode {
    Simulator,
    Serial,
}

// GUI -> engine commands
#[derive(Clone, Debug)]
pub enum GuiCommand {
    StartRecording {
        mode: ConnectionMode,
        port: Option<String>,
    },
    SaveAll(PathBuf),
    Load(PathBuf),
    Analyze(Vec<ExperimentId>),
    ExportPlot {
        path: PathBuf,
        ids: Vec<ExperimentId>,
    },
}

// Engine -> GUI messages
#[derive(Clone, Debug)]
pub enum EngineMessage {
    Log(String),
    Warn(String),
    Error(String),
    RecordingStatus(bool),
    /// One accepted sample, for the live readout.
    Point(Sample),
    ActiveExperiment(ExperimentId),
    /// (id, point count) for every stored experiment, ascending by id.
    ExperimentList(Vec<(ExperimentId, usize)>),
    /// Raw sample sequences for the experiments picked for analysis.
    Analysis(Vec<(ExperimentId, Vec<Sample>)>),
}
