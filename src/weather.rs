//! # weather.gov Forecast Fetching
//!
//! Pulls the multi-day forecast for the configured gridpoint from the
//! National Weather Service API. The API is keyless but rejects clients
//! without a `User-Agent`, so the client always identifies itself.
//!
//! The response carries a `properties.periods` array of half-day periods
//! (Today, Tonight, Wednesday, ...). Only the fields the report surfaces are
//! parsed: start time, temperature, wind speed, and the short conditions
//! string. Wind speed arrives as prose ("10 mph", "5 to 10 mph"); the leading
//! integer is the value used.

use crate::config::ForecastConfig;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while fetching or parsing the forecast.
#[derive(Error, Debug)]
pub enum WeatherError {
    /// HTTP request failed (network, server, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A forecast period could not be parsed
    #[error("malformed forecast data: {0}")]
    Malformed(String),
}

/// Identify the job to api.weather.gov; anonymous clients get 403s.
const USER_AGENT: &str = concat!("kayak-report/", env!("CARGO_PKG_VERSION"));

/// One forecast period, reduced to the fields the report shows.
#[derive(Clone, Debug)]
pub struct ForecastPeriod {
    /// Period start, with the office's UTC offset
    pub start_time: DateTime<FixedOffset>,
    /// Temperature in the unit the office publishes (°F for US offices)
    pub temperature: i64,
    /// Sustained wind speed in mph (leading value of a range)
    pub wind_speed_mph: u32,
    /// Short conditions text, e.g. "Partly Sunny"
    pub conditions: String,
}

/// Fetch the gridpoint forecast for the configured office and grid cell.
pub async fn fetch_forecast(forecast: &ForecastConfig) -> Result<Vec<ForecastPeriod>, WeatherError> {
    let url = format!(
        "https://api.weather.gov/gridpoints/{}/{},{}/forecast",
        forecast.office, forecast.grid_x, forecast.grid_y
    );

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let raw: RawForecast = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    raw.properties
        .periods
        .into_iter()
        .map(convert_period)
        .collect()
}

// -- Private Implementation --

#[derive(Deserialize)]
struct RawForecast {
    properties: RawProperties,
}

#[derive(Deserialize)]
struct RawProperties {
    #[serde(default)]
    periods: Vec<RawPeriod>,
}

#[derive(Deserialize)]
struct RawPeriod {
    #[serde(rename = "startTime")]
    start_time: String,
    temperature: i64,
    #[serde(rename = "windSpeed")]
    wind_speed: String,
    #[serde(rename = "shortForecast")]
    short_forecast: String,
}

fn convert_period(p: RawPeriod) -> Result<ForecastPeriod, WeatherError> {
    let start_time = DateTime::parse_from_rfc3339(&p.start_time)
        .map_err(|_| WeatherError::Malformed(format!("bad period start {:?}", p.start_time)))?;
    let wind_speed_mph = parse_wind_speed(&p.wind_speed)
        .ok_or_else(|| WeatherError::Malformed(format!("bad wind speed {:?}", p.wind_speed)))?;

    Ok(ForecastPeriod {
        start_time,
        temperature: p.temperature,
        wind_speed_mph,
        conditions: p.short_forecast,
    })
}

/// Leading integer of a wind-speed phrase: "10 mph" → 10, "5 to 10 mph" → 5.
fn parse_wind_speed(text: &str) -> Option<u32> {
    text.split_whitespace().next()?.parse().ok()
}
