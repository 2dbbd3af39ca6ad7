// src/drivers/mod.rs
pub mod error;
pub mod filter;
pub mod plot;
pub mod projector;
pub mod source;
pub mod storage;
pub mod store;

pub use error::DatalogError;
pub use filter::{moving_average, sigma_filter};
pub use plot::{render_comparison_png, PlotStyle};
pub use projector::{ExperimentSeries, HoverHit, PlotProjector};
pub use source::{ManualSource, SampleSource, SimulatorSource};
pub use store::{ExperimentStore, Summary};
