// src/drivers/projector.rs
use crate::drivers::filter::moving_average;
use crate::types::{ExperimentId, Sample};

/// Fixed drawing canvas, matching the analysis window layout.
pub const CANVAS_WIDTH: f64 = 950.0;
pub const CANVAS_HEIGHT: f64 = 550.0;

const PLOT_LEFT: f64 = 50.0;
const PLOT_RIGHT: f64 = 900.0;
const PLOT_TOP: f64 = 50.0;
const PLOT_BOTTOM: f64 = 500.0;

/// Vertical padding in value units; horizontal padding is 5% of the duration.
const PADDING_Y: f64 = 10.0;

/// Hover queries match the closest raw point within this many pixels.
pub const HOVER_RADIUS: f64 = 15.0;

pub const PALETTE_LEN: usize = 8;
const SMOOTH_WINDOW: usize = 7;
const AXIS_TICKS: usize = 6;

/// One experiment prepared for drawing: time shifted so the first sample is
/// at t = 0, plus the smoothed overlay series.
pub struct ExperimentSeries {
    pub id: ExperimentId,
    pub times: Vec<f64>,
    pub values: Vec<f64>,
    pub smoothed: Vec<f64>,
}

impl ExperimentSeries {
    pub fn color_index(&self) -> usize {
        self.id as usize % PALETTE_LEN
    }
}

/// Result of a nearest-point hover query, with the projected position.
#[derive(Clone, Copy, Debug)]
pub struct HoverHit {
    pub id: ExperimentId,
    pub time_offset: f64,
    pub value: f64,
    pub x: f64,
    pub y: f64,
}

/// Affine mapping from (time, value) to canvas coordinates for a fixed set
/// of experiments. Pure given its inputs: rebuilding from the same samples
/// yields the same projection, and queries may run once per hover event.
pub struct PlotProjector {
    series: Vec<ExperimentSeries>,
    max_duration: f64,
    min_value: f64,
    value_range: f64,
}

impl PlotProjector {
    /// Builds the projection, skipping empty experiments. Returns None when
    /// nothing selected has any samples.
    pub fn new(selected: &[(ExperimentId, Vec<Sample>)]) -> Option<Self> {
        let mut series = Vec::new();
        let mut max_duration: f64 = 0.0;

        for (id, samples) in selected {
            if samples.is_empty() {
                continue;
            }
            let start = samples[0].timestamp;
            let times: Vec<f64> = samples.iter().map(|s| s.timestamp - start).collect();
            let values: Vec<f64> = samples.iter().map(|s| s.value).collect();

            let mut duration = times.last().copied().unwrap_or(0.0);
            if duration == 0.0 {
                duration = 1.0;
            }
            max_duration = max_duration.max(duration);

            let smoothed = moving_average(&values, SMOOTH_WINDOW.min(values.len()));
            series.push(ExperimentSeries {
                id: *id,
                times,
                values,
                smoothed,
            });
        }

        if series.is_empty() {
            return None;
        }
        if max_duration == 0.0 {
            max_duration = 1.0;
        }

        let mut min_value = f64::INFINITY;
        let mut max_value = f64::NEG_INFINITY;
        for s in &series {
            for &v in &s.values {
                min_value = min_value.min(v);
                max_value = max_value.max(v);
            }
        }
        let mut value_range = max_value - min_value;
        if value_range <= 0.0 {
            value_range = 1.0;
        }

        Some(Self {
            series,
            max_duration,
            min_value,
            value_range,
        })
    }

    pub fn series(&self) -> &[ExperimentSeries] {
        &self.series
    }

    pub fn max_duration(&self) -> f64 {
        self.max_duration
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn value_range(&self) -> f64 {
        self.value_range
    }

    /// Canvas position of a (time offset, value) pair.
    pub fn to_canvas(&self, time: f64, value: f64) -> (f64, f64) {
        let padding_x = self.max_duration * 0.05;
        let x = PLOT_LEFT
            + (time / (self.max_duration + 2.0 * padding_x)) * (PLOT_RIGHT - PLOT_LEFT);
        let y = PLOT_BOTTOM
            - ((value - self.min_value + PADDING_Y) / (self.value_range + 2.0 * PADDING_Y))
                * (PLOT_BOTTOM - PLOT_TOP);
        (x, y)
    }

    pub fn raw_polyline(&self, series: &ExperimentSeries) -> Vec<(f64, f64)> {
        series
            .times
            .iter()
            .zip(&series.values)
            .map(|(&t, &v)| self.to_canvas(t, v))
            .collect()
    }

    pub fn smooth_polyline(&self, series: &ExperimentSeries) -> Vec<(f64, f64)> {
        series
            .times
            .iter()
            .zip(&series.smoothed)
            .map(|(&t, &v)| self.to_canvas(t, v))
            .collect()
    }

    /// Closest raw sample within [`HOVER_RADIUS`] of a canvas position.
    pub fn nearest(&self, x: f64, y: f64) -> Option<HoverHit> {
        let mut best: Option<HoverHit> = None;
        let mut best_dist = HOVER_RADIUS;

        for series in &self.series {
            for (&t, &v) in series.times.iter().zip(&series.values) {
                let (px, py) = self.to_canvas(t, v);
                let dist = (x - px).hypot(y - py);
                if dist < best_dist {
                    best_dist = dist;
                    best = Some(HoverHit {
                        id: series.id,
                        time_offset: t,
                        value: v,
                        x: px,
                        y: py,
                    });
                }
            }
        }
        best
    }

    /// Time axis ticks as (canvas x, seconds) pairs.
    pub fn time_ticks(&self) -> Vec<(f64, f64)> {
        (0..AXIS_TICKS)
            .map(|i| {
                let frac = i as f64 / (AXIS_TICKS - 1) as f64;
                let x = PLOT_LEFT + (PLOT_RIGHT - PLOT_LEFT) * frac;
                (x, self.max_duration * frac)
            })
            .collect()
    }

    /// Value axis ticks as (canvas y, value) pairs.
    pub fn value_ticks(&self) -> Vec<(f64, f64)> {
        (0..AXIS_TICKS)
            .map(|i| {
                let frac = i as f64 / (AXIS_TICKS - 1) as f64;
                let y = PLOT_BOTTOM - (PLOT_BOTTOM - PLOT_TOP) * frac;
                (y, self.min_value + self.value_range * frac)
            })
            .collect()
    }

    /// Axis endpoints for the drawing layer: ((x0, y0), (x1, y1)) per axis.
    pub fn axes() -> [((f64, f64), (f64, f64)); 2] {
        [
            ((PLOT_LEFT, PLOT_BOTTOM), (PLOT_RIGHT, PLOT_BOTTOM)),
            ((PLOT_LEFT, PLOT_TOP), (PLOT_LEFT, PLOT_BOTTOM)),
        ]
    }
}
