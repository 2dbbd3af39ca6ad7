// src/drivers/plot.rs
use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::*;

use crate::drivers::error::DatalogError;
use crate::drivers::projector::PlotProjector;

#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub palette: Vec<RGBColor>,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 950,
            height: 550,
            background: WHITE,
            // Same order as the interactive palette: blue, red, green,
            // purple, orange, brown, pink, gray.
            palette: vec![
                RGBColor(50, 100, 255),
                RGBColor(230, 60, 60),
                RGBColor(60, 180, 75),
                RGBColor(145, 70, 255),
                RGBColor(255, 165, 0),
                RGBColor(160, 110, 60),
                RGBColor(255, 130, 180),
                RGBColor(150, 150, 150),
            ],
        }
    }
}

/// Renders the comparison chart (raw thin + smoothed thick per experiment)
/// as an in-memory PNG.
pub fn render_comparison_png(
    projector: &PlotProjector,
    style: PlotStyle,
) -> Result<Vec<u8>, DatalogError> {
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;

        let y_min = projector.min_value();
        let y_max = y_min + projector.value_range();
        let y_pad = projector.value_range() * 0.05;

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption("Experiment comparison", ("sans-serif", 20).into_font())
            .set_label_area_size(LabelAreaPosition::Left, 45)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(
                0f64..projector.max_duration(),
                (y_min - y_pad)..(y_max + y_pad),
            )?;

        chart
            .configure_mesh()
            .x_desc("time from experiment start (s)")
            .y_desc("value")
            .draw()?;

        for series in projector.series() {
            let color = style.palette[series.id as usize % style.palette.len()];
            let raw = series.times.iter().copied().zip(series.values.iter().copied());
            chart
                .draw_series(LineSeries::new(raw, &color))?
                .label(format!("E{}", series.id))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

            if series.times.len() > 1 {
                let smooth = series
                    .times
                    .iter()
                    .copied()
                    .zip(series.smoothed.iter().copied());
                chart.draw_series(LineSeries::new(smooth, color.stroke_width(3)))?;
            }
        }

        chart
            .configure_series_labels()
            .border_style(BLACK.mix(0.3))
            .background_style(style.background.mix(0.8))
            .draw()?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, DatalogError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| DatalogError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sample;

    #[test]
    fn comparison_chart_renders_to_png() {
        let samples: Vec<Sample> = (0..20)
            .map(|i| Sample {
                timestamp: 100.0 + i as f64 * 0.1,
                value: (i % 5) as f64 * 10.0,
            })
            .collect();
        let projector = PlotProjector::new(&[(1, samples)]).unwrap();
        let png = render_comparison_png(&projector, PlotStyle::default()).unwrap();
        assert!(!png.is_empty());
    }
}
