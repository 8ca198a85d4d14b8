//! # Kayak Report Core Library
//!
//! This library provides the data structures and processing stages for the
//! kayak report job: fetch today's NOAA tide predictions and the weather.gov
//! forecast, score the day's kayak condition from the tide turning points,
//! render a tide chart, and deliver everything as an HTML email.
//!
//! ## Pipeline
//!
//! 1. **Fetch**: [`tide_data::fetch`] pulls today's 6-minute tide predictions
//!    for the configured station (cache-first); [`weather::fetch_forecast`]
//!    pulls the multi-day gridpoint forecast.
//! 2. **Analyze**: [`analysis::smooth`] stabilizes the curve with a local
//!    quadratic fit, [`analysis::find_turning_points`] locates high/low tides,
//!    and [`analysis::classify`] maps their times onto the configured morning
//!    and evening windows to produce a [`analysis::ConditionLabel`].
//! 3. **Present**: [`chart::render_png`] draws the annotated tide chart,
//!    [`report::DailyReport`] composes the HTML, and [`email::send_report`]
//!    ships it over SMTP.
//!
//! Each run is a single pass over freshly fetched data; nothing besides the
//! short-TTL fetch cache is written to disk.
//!
//! ## Core Types
//!
//! - [`Sample`]: a single tide prediction at a station-local time
//! - [`TideSeries`]: the full day of predictions, in chronological order

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// Module declarations
pub mod analysis;
pub mod chart;
pub mod config;
pub mod email;
pub mod report;
pub mod tide_data;
pub mod weather;

/// A single tide prediction at a specific station-local time.
///
/// NOAA's `lst_ldt` time zone option returns wall-clock times for the
/// station, so timestamps are naive date-times; heights are feet above MLLW.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use kayak_report_lib::Sample;
///
/// let sample = Sample {
///     time: NaiveDate::from_ymd_opt(2025, 8, 6)
///         .unwrap()
///         .and_hms_opt(7, 30, 0)
///         .unwrap(),
///     height_ft: 3.2,
/// };
/// assert_eq!(sample.height_ft, 3.2);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Station-local prediction time
    pub time: NaiveDateTime,
    /// Predicted tide height in feet above MLLW
    pub height_ft: f64,
}

/// A full day of tide predictions in chronological order.
///
/// The CO-OPS predictions product returns samples at a fixed interval
/// (typically 6 minutes, ~240 samples per day). Samples are strictly
/// increasing in time; the analysis stages rely on that ordering.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use kayak_report_lib::{Sample, TideSeries};
///
/// let day = NaiveDate::from_ymd_opt(2025, 8, 6).unwrap();
/// let series = TideSeries {
///     samples: (0..5)
///         .map(|i| Sample {
///             time: day.and_hms_opt(0, i * 6, 0).unwrap(),
///             height_ft: f64::from(i),
///         })
///         .collect(),
/// };
/// assert_eq!(series.samples.len(), 5);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TideSeries {
    /// Tide predictions, strictly increasing in time
    pub samples: Vec<Sample>,
}

impl TideSeries {
    /// Heights only, in sample order. Input shape for [`analysis::smooth`].
    pub fn heights(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.height_ft).collect()
    }

    /// The calendar day this series covers, taken from the first sample.
    /// `None` for an empty series.
    pub fn day(&self) -> Option<chrono::NaiveDate> {
        self.samples.first().map(|s| s.time.date())
    }
}
