//! # HTML Report Composition
//!
//! Assembles the email body: today's kayak condition and weather, the tide
//! turn times surfaced by the detector, the inline chart, and the multi-day
//! forecast table.
//!
//! The tide-derived condition is only meaningful for the day the tide series
//! covers. Forecast rows for other days show a placeholder instead of
//! recycling today's turning points.

use crate::analysis::ConditionLabel;
use crate::weather::ForecastPeriod;
use chrono::{NaiveDate, NaiveDateTime};

/// A labeled tide turn shown in the report narrative.
#[derive(Clone, Debug)]
pub struct TideTurn {
    pub time: NaiveDateTime,
    pub height_ft: f64,
}

/// One row of the forecast table.
#[derive(Clone, Debug)]
pub struct ForecastRow {
    pub date: NaiveDate,
    pub temperature: i64,
    pub wind_speed_mph: u32,
    pub conditions: String,
    /// Tide-derived condition; `None` when no tide data covers this date
    pub condition: Option<ConditionLabel>,
}

/// Everything the email body needs, assembled before rendering.
#[derive(Clone, Debug)]
pub struct DailyReport {
    pub station_name: String,
    pub condition: ConditionLabel,
    /// First forecast period, shown as today's weather summary
    pub today: Option<ForecastPeriod>,
    pub lows: Vec<TideTurn>,
    pub highs: Vec<TideTurn>,
    pub forecast: Vec<ForecastRow>,
}

impl DailyReport {
    /// Assemble the report from pipeline outputs.
    ///
    /// `tide_day` is the calendar day the tide series covers; only forecast
    /// periods on that day get the tide-derived condition.
    pub fn assemble(
        station_name: &str,
        condition: ConditionLabel,
        tide_day: Option<NaiveDate>,
        lows: Vec<TideTurn>,
        highs: Vec<TideTurn>,
        periods: &[ForecastPeriod],
    ) -> Self {
        let forecast = periods
            .iter()
            .map(|p| {
                let date = p.start_time.date_naive();
                ForecastRow {
                    date,
                    temperature: p.temperature,
                    wind_speed_mph: p.wind_speed_mph,
                    conditions: p.conditions.clone(),
                    condition: (Some(date) == tide_day).then_some(condition),
                }
            })
            .collect();

        DailyReport {
            station_name: station_name.to_string(),
            condition,
            today: periods.first().cloned(),
            lows,
            highs,
            forecast,
        }
    }

    /// Email subject line.
    pub fn subject(&self) -> String {
        format!("Kayak Conditions and Tide Chart for {}", self.station_name)
    }

    /// Render the HTML body. The chart image is referenced by content id and
    /// must be attached inline as `tide_chart`.
    pub fn to_html(&self) -> String {
        let mut html = String::with_capacity(2048);

        html.push_str("<html>\n<body>\n");
        html.push_str(&format!(
            "<h2>Kayak Conditions for Today ({})</h2>\n",
            escape(&self.station_name)
        ));
        html.push_str(&format!(
            "<p>Tide-Based Kayak Condition: <b>{}</b></p>\n",
            self.condition
        ));

        if let Some(today) = &self.today {
            html.push_str(&format!(
                "<p>Temperature: {}&deg;F<br>Wind Speed: {} mph<br>Weather Conditions: {}</p>\n",
                today.temperature,
                today.wind_speed_mph,
                escape(&today.conditions)
            ));
        }

        html.push_str(&self.tide_turns_html());

        html.push_str("<h3>Tide Chart</h3>\n");
        html.push_str("<img src=\"cid:tide_chart\" alt=\"Tide Chart\" />\n");

        html.push_str(&self.forecast_table_html());

        html.push_str("</body>\n</html>\n");
        html
    }

    fn tide_turns_html(&self) -> String {
        if self.lows.is_empty() && self.highs.is_empty() {
            return "<p>No tide turns detected today.</p>\n".to_string();
        }

        let fmt_turns = |turns: &[TideTurn]| {
            turns
                .iter()
                .map(|t| format!("{} ({:.2} ft)", t.time.format("%H:%M"), t.height_ft))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut out = String::from("<p>");
        if !self.lows.is_empty() {
            out.push_str(&format!("Low tides: {}", fmt_turns(&self.lows)));
        }
        if !self.highs.is_empty() {
            if !self.lows.is_empty() {
                out.push_str("<br>");
            }
            out.push_str(&format!("High tides: {}", fmt_turns(&self.highs)));
        }
        out.push_str("</p>\n");
        out
    }

    fn forecast_table_html(&self) -> String {
        let mut out = String::from(
            "<h3>Forecast</h3>\n<table border=\"1\">\
             <tr><th>Date</th><th>Temperature (&deg;F)</th><th>Wind Speed (mph)</th>\
             <th>Conditions</th><th>Kayak Condition</th></tr>\n",
        );

        for row in &self.forecast {
            let condition = row
                .condition
                .map(|c| c.to_string())
                .unwrap_or_else(|| "&mdash;".to_string());
            out.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                row.date.format("%Y-%m-%d"),
                row.temperature,
                row.wind_speed_mph,
                escape(&row.conditions),
                condition
            ));
        }

        out.push_str("</table>\n");
        out
    }
}

/// Minimal HTML escaping for provider-supplied text.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn period(start: &str, temp: i64, wind: u32, conditions: &str) -> ForecastPeriod {
        ForecastPeriod {
            start_time: DateTime::parse_from_rfc3339(start).unwrap(),
            temperature: temp,
            wind_speed_mph: wind,
            conditions: conditions.to_string(),
        }
    }

    fn tide_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 6).unwrap()
    }

    fn sample_report() -> DailyReport {
        let periods = vec![
            period("2025-08-06T06:00:00-07:00", 72, 10, "Sunny"),
            period("2025-08-06T18:00:00-07:00", 64, 5, "Clear"),
            period("2025-08-07T06:00:00-07:00", 70, 8, "Partly Sunny"),
        ];
        let lows = vec![TideTurn {
            time: tide_day().and_hms_opt(6, 12, 0).unwrap(),
            height_ft: 1.24,
        }];
        let highs = vec![TideTurn {
            time: tide_day().and_hms_opt(12, 30, 0).unwrap(),
            height_ft: 8.91,
        }];
        DailyReport::assemble(
            "Seattle, WA",
            ConditionLabel::Great,
            Some(tide_day()),
            lows,
            highs,
            &periods,
        )
    }

    #[test]
    fn html_contains_condition_and_chart_reference() {
        let html = sample_report().to_html();
        assert!(html.contains("<b>Great</b>"));
        assert!(html.contains("cid:tide_chart"));
        assert!(html.contains("Seattle, WA"));
    }

    #[test]
    fn html_has_one_row_per_forecast_period() {
        let html = sample_report().to_html();
        assert_eq!(html.matches("<tr><td>").count(), 3);
    }

    #[test]
    fn condition_only_applies_to_tide_day() {
        let report = sample_report();
        assert_eq!(report.forecast[0].condition, Some(ConditionLabel::Great));
        assert_eq!(report.forecast[1].condition, Some(ConditionLabel::Great));
        assert_eq!(report.forecast[2].condition, None);

        let html = report.to_html();
        assert!(
            html.contains("&mdash;"),
            "rows without tide data should show a placeholder"
        );
    }

    #[test]
    fn tide_turns_are_listed() {
        let html = sample_report().to_html();
        assert!(html.contains("Low tides: 06:12 (1.24 ft)"));
        assert!(html.contains("High tides: 12:30 (8.91 ft)"));
    }

    #[test]
    fn empty_turns_note_is_rendered() {
        let report = DailyReport::assemble(
            "Seattle, WA",
            ConditionLabel::Poor,
            Some(tide_day()),
            vec![],
            vec![],
            &[],
        );
        let html = report.to_html();
        assert!(html.contains("No tide turns detected"));
    }

    #[test]
    fn provider_text_is_escaped() {
        let periods = vec![period(
            "2025-08-06T06:00:00-07:00",
            72,
            10,
            "Showers & <Thunderstorms>",
        )];
        let report = DailyReport::assemble(
            "Seattle, WA",
            ConditionLabel::Poor,
            Some(tide_day()),
            vec![],
            vec![],
            &periods,
        );
        let html = report.to_html();
        assert!(html.contains("Showers &amp; &lt;Thunderstorms&gt;"));
        assert!(!html.contains("<Thunderstorms>"));
    }

    #[test]
    fn subject_names_the_station() {
        assert_eq!(
            sample_report().subject(),
            "Kayak Conditions and Tide Chart for Seattle, WA"
        );
    }
}
