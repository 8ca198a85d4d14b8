//! # Kayak Report Application Entry Point
//!
//! Coordinates the single-run pipeline: fetch tide predictions and the
//! weather forecast, analyze the tide curve, render the chart, compose the
//! HTML report, and deliver it by email. Intended to be invoked once per day
//! by an external scheduler (cron or a systemd timer); progress and failures
//! go to stderr for the scheduler's journal.

// Test modules
#[cfg(test)]
mod tests;

// Re-export library types for internal use
pub use kayak_report_lib::config::Config;

use anyhow::Context;
use chrono::Local;
use kayak_report_lib::{analysis, chart, email, report, tide_data, weather, TideSeries};
use std::env;

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    // Development mode: print the report to stdout and keep the chart as a
    // local file instead of sending email.
    let development_mode = env::args().any(|arg| arg == "--stdout");

    let config = Config::load();

    // Create Tokio runtime for the fetch and delivery stages
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(&config, development_mode))
}

/// One full pipeline pass.
async fn run(config: &Config, development_mode: bool) -> anyhow::Result<()> {
    eprintln!(
        "Fetching tide predictions for station {} ({})",
        config.station.id, config.station.name
    );
    let series = tide_data::fetch(&config.station)
        .await
        .context("fetching tide predictions")?;
    eprintln!("Fetched {} tide samples", series.samples.len());

    // Analysis: smooth, detect turns, classify the day
    let smoothed = analysis::smooth(&series.heights()).context("smoothing tide curve")?;
    let points = analysis::find_turning_points(&smoothed);
    let marks = analysis::annotate(&points);

    let windows = config
        .windows
        .resolve()
        .context("resolving condition windows")?;
    let turn_times = analysis::turning_times(&series, &points);
    let condition = analysis::classify(&turn_times, Local::now().date_naive(), &windows);
    eprintln!(
        "Detected {} tide turns; kayak condition: {}",
        points.len(),
        condition
    );

    eprintln!(
        "Fetching forecast for gridpoint {}/{},{}",
        config.forecast.office, config.forecast.grid_x, config.forecast.grid_y
    );
    let periods = weather::fetch_forecast(&config.forecast)
        .await
        .context("fetching weather forecast")?;
    eprintln!("Fetched {} forecast periods", periods.len());

    let chart_png = chart::render_png(&series, &smoothed, &marks, &config.chart)
        .context("rendering tide chart")?;

    let report = report::DailyReport::assemble(
        &config.station.name,
        condition,
        series.day(),
        turns(&series, &marks.lows),
        turns(&series, &marks.highs),
        &periods,
    );
    let html = report.to_html();

    if development_mode {
        std::fs::write("tide_chart.png", &chart_png).context("writing tide_chart.png")?;
        eprintln!("Development mode: chart written to tide_chart.png");
        println!("{html}");
        return Ok(());
    }

    match email::EmailConfig::from_env() {
        Some(email_config) => {
            email::send_report(&email_config, &report.subject(), &html, chart_png)
                .await
                .context("sending report email")?;
        }
        None => {
            eprintln!("SMTP not configured (set SMTP_HOST and SMTP_TO); printing report instead");
            println!("{html}");
        }
    }

    Ok(())
}

/// Resolve annotation indices to report tide turns.
fn turns(series: &TideSeries, indices: &[usize]) -> Vec<report::TideTurn> {
    indices
        .iter()
        .filter_map(|&i| series.samples.get(i))
        .map(|s| report::TideTurn {
            time: s.time,
            height_ft: s.height_ft,
        })
        .collect()
}
