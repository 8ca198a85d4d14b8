//! # Tide Chart Rendering
//!
//! Draws the day's tide curve as a PNG for inline embedding in the email
//! report: the raw predictions as a solid line, the smoothed curve dashed,
//! and the first two low and first two high tides marked with labeled dots
//! (green for lows, red for highs).
//!
//! Rendering happens entirely in memory: plotters draws into an RGB buffer
//! and the `image` crate encodes it to PNG bytes, so nothing touches disk on
//! the mail path.

use crate::analysis::AnnotatedTides;
use crate::config::ChartConfig;
use crate::TideSeries;
use chrono::NaiveDateTime;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::io::Cursor;
use thiserror::Error;

/// Errors that can occur while rendering the chart.
#[derive(Error, Debug)]
pub enum ChartError {
    /// The series is too small to plot
    #[error("not enough samples to chart: {0}")]
    TooFewSamples(usize),

    /// A plotters drawing operation failed
    #[error("chart rendering: {0}")]
    Render(String),

    /// The rendered buffer could not be encoded as PNG
    #[error("PNG encode: {0}")]
    Encode(#[from] image::ImageError),
}

/// Curve and marker colors.
const RAW_COLOR: RGBColor = RGBColor(31, 82, 199);
const SMOOTH_COLOR: RGBColor = RGBColor(120, 150, 220);
const LOW_COLOR: RGBColor = RGBColor(34, 139, 34);
const HIGH_COLOR: RGBColor = RGBColor(200, 30, 30);

/// Render the annotated tide chart as PNG bytes.
///
/// `smoothed` must be the output of [`crate::analysis::smooth`] over this
/// series (same length); `marks` carries the turning-point indices to label.
pub fn render_png(
    series: &TideSeries,
    smoothed: &[f64],
    marks: &AnnotatedTides,
    config: &ChartConfig,
) -> Result<Vec<u8>, ChartError> {
    if series.samples.len() < 2 {
        return Err(ChartError::TooFewSamples(series.samples.len()));
    }

    let (width, height) = (config.width, config.height);
    let mut rgb = vec![0u8; (width * height * 3) as usize];

    draw(series, smoothed, marks, &mut rgb, width, height)?;

    let img = image::RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| ChartError::Render("buffer size mismatch".to_string()))?;
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    Ok(png)
}

/// Draw the chart into an RGB buffer. Split out so the backend's mutable
/// borrow of the buffer ends before PNG encoding.
fn draw(
    series: &TideSeries,
    smoothed: &[f64],
    marks: &AnnotatedTides,
    rgb: &mut [u8],
    width: u32,
    height: u32,
) -> Result<(), ChartError> {
    let render_err = |e: &dyn std::fmt::Display| ChartError::Render(e.to_string());

    let root = BitMapBackend::with_buffer(rgb, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| render_err(&e))?;

    let t_start = series.samples[0].time;
    let t_end = series.samples[series.samples.len() - 1].time;
    let (y_min, y_max) = height_bounds(series, smoothed);

    let date = t_start.date();
    let title = format!("Tide Predictions for {}", date.format("%Y-%m-%d"));

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(
            Into::<RangedDateTime<NaiveDateTime>>::into(t_start..t_end),
            y_min..y_max,
        )
        .map_err(|e| render_err(&e))?;

    chart
        .configure_mesh()
        .x_labels(12)
        .x_label_formatter(&|t: &NaiveDateTime| t.format("%H:%M").to_string())
        .x_desc("Time")
        .y_desc("Tide Height (ft)")
        .draw()
        .map_err(|e| render_err(&e))?;

    chart
        .draw_series(LineSeries::new(
            series.samples.iter().map(|s| (s.time, s.height_ft)),
            RAW_COLOR.stroke_width(2),
        ))
        .map_err(|e| render_err(&e))?
        .label("Tide Height")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], RAW_COLOR.stroke_width(2)));

    chart
        .draw_series(DashedLineSeries::new(
            series
                .samples
                .iter()
                .zip(smoothed.iter())
                .map(|(s, &v)| (s.time, v)),
            8,
            4,
            SMOOTH_COLOR.stroke_width(1),
        ))
        .map_err(|e| render_err(&e))?;

    // Labeled dots for the surfaced turning points, numbered in index order.
    let marker_sets = [
        (&marks.lows, LOW_COLOR, "Low Tide"),
        (&marks.highs, HIGH_COLOR, "High Tide"),
    ];
    for (indices, color, kind) in marker_sets {
        for (n, &idx) in indices.iter().enumerate() {
            let Some(sample) = series.samples.get(idx) else {
                continue;
            };
            let label = format!("{} {}: {:.2} ft", kind, n + 1, sample.height_ft);
            chart
                .draw_series(std::iter::once(
                    EmptyElement::at((sample.time, sample.height_ft))
                        + Circle::new((0, 0), 5, color.filled())
                        + Text::new(label, (8, -16), ("sans-serif", 14).into_font()),
                ))
                .map_err(|e| render_err(&e))?;
        }
    }

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(|e| render_err(&e))?;

    root.present().map_err(|e| render_err(&e))?;
    Ok(())
}

/// Y-axis bounds over both curves with a little headroom for labels.
fn height_bounds(series: &TideSeries, smoothed: &[f64]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in series.samples.iter().map(|s| s.height_ft).chain(smoothed.iter().copied()) {
        min = min.min(v);
        max = max.max(v);
    }
    let pad = ((max - min) * 0.1).max(0.5);
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis;
    use crate::Sample;
    use chrono::NaiveDate;

    fn synthetic_series(n: usize) -> TideSeries {
        let day = NaiveDate::from_ymd_opt(2025, 8, 6).unwrap();
        TideSeries {
            samples: (0..n)
                .map(|i| Sample {
                    time: day.and_hms_opt(0, 0, 0).unwrap()
                        + chrono::Duration::minutes(6 * i as i64),
                    height_ft: 5.0 + 4.0 * (i as f64 / n as f64 * std::f64::consts::TAU).sin(),
                })
                .collect(),
        }
    }

    #[test]
    fn renders_png_with_markers() {
        let series = synthetic_series(120);
        let smoothed = analysis::smooth(&series.heights()).unwrap();
        let points = analysis::find_turning_points(&smoothed);
        let marks = analysis::annotate(&points);

        let config = ChartConfig {
            width: 640,
            height: 360,
        };
        let png = render_png(&series, &smoothed, &marks, &config).unwrap();

        // PNG signature
        assert!(png.len() > 8);
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn rejects_tiny_series() {
        let series = synthetic_series(1);
        let config = ChartConfig {
            width: 320,
            height: 200,
        };
        let err = render_png(&series, &[5.0], &AnnotatedTides::default(), &config).unwrap_err();
        assert!(matches!(err, ChartError::TooFewSamples(1)));
    }
}
