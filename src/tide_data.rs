//! # NOAA Tide Prediction Fetching and Caching
//!
//! Network operations for pulling today's tide predictions from the NOAA
//! CO-OPS data API, with a short-lived cache to keep re-runs (manual retries,
//! scheduler restarts) from hammering the provider.
//!
//! ## Data Source
//!
//! ### CO-OPS Data API
//! - **URL**: https://api.tidesandcurrents.noaa.gov/api/prod/datagetter
//! - **Product**: `predictions` for the configured station
//! - **Window**: `date=today` in station-local time (`lst_ldt`)
//! - **Format**: JSON; heights in feet above MLLW at a 6-minute interval
//!
//! ### Pipeline
//! 1. **Cache check**: load `/tmp/kayak_tide_cache.json` if fresh and covering
//!    the current day
//! 2. **Fetch**: HTTP GET with the prediction query parameters
//! 3. **Parse**: every record's timestamp and height are validated; one bad
//!    record fails the whole fetch rather than producing a partial series
//! 4. **Cache**: write-through with best-effort semantics
//!
//! ## Error Handling
//!
//! Failure modes propagate through [`TideError`]:
//! - **Network**: connect/timeout/HTTP-status errors from the client
//! - **Malformed data**: unparseable timestamps, non-numeric heights, or an
//!   empty prediction set (the API reports unknown stations inside a JSON
//!   body, not as an HTTP error)
//! - **Cache IO**: surfaced from the loader, ignored on write
//!
//! There is no retry logic here and no fallback series: the caller decides
//! whether a failed fetch aborts the run.

use crate::config::StationConfig;
use crate::{Sample, TideSeries};
use chrono::{Local, NaiveDateTime};
use serde::Deserialize;
use std::{fs, io, time::SystemTime};
use thiserror::Error;

/// Errors that can occur while fetching or parsing tide predictions.
#[derive(Error, Debug)]
pub enum TideError {
    /// HTTP request failed (network, server, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A prediction record could not be parsed, or the set was empty
    #[error("malformed prediction data: {0}")]
    Malformed(String),

    /// Cache file operations failed
    #[error("cache IO: {0}")]
    Cache(#[from] io::Error),
}

/// CO-OPS data API endpoint.
const API_URL: &str = "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter";

/// Timestamp format used by the predictions product.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Cache file location. `/tmp` clears on reboot and keeps the cache out of
/// the way of the config directory.
const CACHE: &str = "/tmp/kayak_tide_cache.json";

/// Cache time-to-live in seconds (30 minutes). Long enough to absorb a rerun
/// after a transient SMTP failure, short enough that a manual evening run
/// still refreshes.
const TTL: u64 = 1800;

/// Fetch today's tide series for the configured station, cache-first.
///
/// # Errors
/// All failures surface as [`TideError`]; the caller chooses whether to abort
/// the run. There is deliberately no synthetic fallback: a mailed report must
/// not score kayak conditions from made-up tides.
pub async fn fetch(station: &StationConfig) -> Result<TideSeries, TideError> {
    // Cache first: a fresh series for today skips the network entirely.
    if let Ok(series) = load_cache() {
        return Ok(series);
    }

    let series = fetch_predictions(&station.id).await?;

    // Best effort; a read-only /tmp should not fail the run.
    let _ = save_cache(&series);

    Ok(series)
}

// -- Private Implementation --

/// Raw JSON shape of the predictions response.
#[derive(Deserialize)]
struct RawPredictions {
    #[serde(default)]
    predictions: Vec<RawPrediction>,
}

/// One raw prediction record. Both fields arrive as strings.
#[derive(Deserialize)]
struct RawPrediction {
    /// Station-local timestamp, e.g. "2025-08-06 07:36"
    t: String,
    /// Height in feet, e.g. "3.214"
    v: String,
}

/// GET today's predictions and convert them to a validated series.
async fn fetch_predictions(station_id: &str) -> Result<TideSeries, TideError> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let raw: RawPredictions = client
        .get(API_URL)
        .query(&[
            ("station", station_id),
            ("product", "predictions"),
            ("date", "today"),
            ("datum", "MLLW"),
            ("units", "english"),
            ("time_zone", "lst_ldt"),
            ("format", "json"),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    convert(raw.predictions)
}

/// Validate and convert raw records into a [`TideSeries`].
///
/// Rejects the whole payload on the first bad record: a report built from a
/// partially parsed day would silently misplace tide turns.
fn convert(raw: Vec<RawPrediction>) -> Result<TideSeries, TideError> {
    if raw.is_empty() {
        return Err(TideError::Malformed(
            "empty prediction set (unknown station id?)".into(),
        ));
    }

    let mut samples = Vec::with_capacity(raw.len());
    for p in raw {
        let time = NaiveDateTime::parse_from_str(p.t.trim(), TIME_FORMAT)
            .map_err(|_| TideError::Malformed(format!("bad timestamp {:?}", p.t)))?;
        let height_ft: f64 = p
            .v
            .trim()
            .parse()
            .map_err(|_| TideError::Malformed(format!("bad height {:?}", p.v)))?;
        samples.push(Sample { time, height_ft });
    }

    Ok(TideSeries { samples })
}

/// Load the cached series if it is fresh and still covers the current day.
fn load_cache() -> Result<TideSeries, io::Error> {
    let meta = fs::metadata(CACHE)?;

    let age = SystemTime::now()
        .duration_since(meta.modified()?)
        .map_err(|_| io::Error::other("time error"))?
        .as_secs();
    if age > TTL {
        return Err(io::Error::other("stale"));
    }

    let data = fs::read(CACHE)?;
    let series: TideSeries = serde_json::from_slice(&data)?;

    // A cache written before midnight is fresh by mtime but describes the
    // wrong day's tides.
    if series.day() != Some(Local::now().date_naive()) {
        return Err(io::Error::other("cache covers a different day"));
    }

    Ok(series)
}

/// Write the series to the cache file. Failures are the caller's to ignore.
fn save_cache(series: &TideSeries) -> Result<(), io::Error> {
    let data = serde_json::to_vec(series)?;
    fs::write(CACHE, data)?;
    Ok(())
}
