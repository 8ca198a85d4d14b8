//! # Tide Curve Analysis
//!
//! The analytical heart of the report: smooth the day's tide curve, find the
//! turning points (high and low tides), and score the day against the
//! configured paddling windows.
//!
//! ## Processing Stages
//!
//! 1. [`smooth`]: local quadratic regression (5-sample window) over the raw
//!    heights. CO-OPS predictions are model output and already fairly smooth,
//!    but piecewise-interpolation artifacts can introduce spurious inflections;
//!    a light polynomial fit stabilizes extrema detection without shifting the
//!    true peak and trough timing.
//! 2. [`find_turning_points`]: strict local comparison over the smoothed
//!    curve. Every interior sample that is strictly above both neighbors is a
//!    high tide, strictly below both a low tide.
//! 3. [`classify`]: map turning-point times onto the morning and evening
//!    windows for a given day and reduce to a single [`ConditionLabel`].
//!
//! All three stages are pure functions over their inputs; nothing here does
//! I/O or looks at the clock.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

use crate::TideSeries;

/// Samples in the local regression window. Two neighbors on each side of the
/// evaluated point.
const SMOOTHING_WINDOW: usize = 5;

/// Errors from the analysis stages.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The input series is shorter than the smoothing window.
    #[error("not enough samples: need {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },
}

/// Which way the tide turned at a detected extremum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TideKind {
    /// Local maximum of the smoothed curve
    High,
    /// Local minimum of the smoothed curve
    Low,
}

/// A detected tide extremum, indexed into the series it was computed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurningPoint {
    /// Index into the (smoothed) series
    pub index: usize,
    /// High or low tide
    pub kind: TideKind,
}

/// Qualitative kayak condition for the day.
///
/// Ordered so that the classifier can reduce a set of turning points with
/// `max`: `Poor < Good < Great`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConditionLabel {
    Poor,
    Good,
    Great,
}

impl std::fmt::Display for ConditionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ConditionLabel::Poor => "Poor",
            ConditionLabel::Good => "Good",
            ConditionLabel::Great => "Great",
        })
    }
}

/// Daily time windows a tide turn is scored against.
///
/// Ideal windows are half-open (`start` inclusive, `end` exclusive); the
/// margin extends each window on both sides and scores `Good` instead of
/// `Great`. A turn at exactly the ideal end therefore lands in the margin.
#[derive(Clone, Debug)]
pub struct ConditionWindows {
    pub morning_start: NaiveTime,
    pub morning_end: NaiveTime,
    pub evening_start: NaiveTime,
    pub evening_end: NaiveTime,
    /// Extension on both sides of each ideal window
    pub margin: Duration,
}

impl Default for ConditionWindows {
    fn default() -> Self {
        // Calm-water paddling windows: mid-morning and early evening,
        // with an hour of slack on either side.
        ConditionWindows {
            morning_start: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            morning_end: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            evening_start: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            evening_end: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            margin: Duration::hours(1),
        }
    }
}

/// Smooth a tide curve with a 5-point, degree-2 local regression
/// (Savitzky–Golay).
///
/// Every output value is the least-squares quadratic fit over the five
/// nearest samples, evaluated at the sample's own position. Interior points
/// use two neighbors on each side; the first two and last two points fit the
/// nearest full window and evaluate the polynomial at their offset within it,
/// so the output has exactly the input's length and no value is shifted in
/// time.
///
/// Returns [`AnalysisError::InsufficientData`] when fewer than five samples
/// are supplied.
pub fn smooth(heights: &[f64]) -> Result<Vec<f64>, AnalysisError> {
    let n = heights.len();
    if n < SMOOTHING_WINDOW {
        return Err(AnalysisError::InsufficientData {
            needed: SMOOTHING_WINDOW,
            got: n,
        });
    }

    let mut smoothed = Vec::with_capacity(n);
    for i in 0..n {
        // Window start clamped so the window always holds 5 samples.
        let start = i.saturating_sub(2).min(n - SMOOTHING_WINDOW);
        let coeffs = quadratic_fit(&heights[start..start + SMOOTHING_WINDOW]);
        let x = (i - start) as f64;
        smoothed.push(coeffs[0] + coeffs[1] * x + coeffs[2] * x * x);
    }
    Ok(smoothed)
}

/// Least-squares quadratic `a + b·x + c·x²` through five unit-spaced samples
/// at x = 0..4. Returns `[a, b, c]`.
fn quadratic_fit(window: &[f64]) -> [f64; 3] {
    debug_assert_eq!(window.len(), SMOOTHING_WINDOW);

    // Power sums of x = 0..4 (design matrix is constant for a fixed window).
    const N: f64 = 5.0;
    const SX: f64 = 10.0;
    const SXX: f64 = 30.0;
    const SXXX: f64 = 100.0;
    const SXXXX: f64 = 354.0;

    let (mut sy, mut sxy, mut sxxy) = (0.0, 0.0, 0.0);
    for (i, &y) in window.iter().enumerate() {
        let x = i as f64;
        sy += y;
        sxy += x * y;
        sxxy += x * x * y;
    }

    // Cramer's rule on the 3x3 normal equations.
    let det3 = |m: [[f64; 3]; 3]| -> f64 {
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    };
    let det = det3([[N, SX, SXX], [SX, SXX, SXXX], [SXX, SXXX, SXXXX]]);
    let a = det3([[sy, SX, SXX], [sxy, SXX, SXXX], [sxxy, SXXX, SXXXX]]) / det;
    let b = det3([[N, sy, SXX], [SX, sxy, SXXX], [SXX, sxxy, SXXXX]]) / det;
    let c = det3([[N, SX, sy], [SX, SXX, sxy], [SXX, SXXX, sxxy]]) / det;
    [a, b, c]
}

/// Find tide turning points by strict local comparison.
///
/// Every interior index strictly above both neighbors is reported as
/// [`TideKind::High`], strictly below both as [`TideKind::Low`]. The first and
/// last samples are never candidates, and a flat run never registers: an
/// extremum that lands exactly on a plateau is missed. That trade keeps
/// noise-free flat segments from producing false positives and matches the
/// behavior the rest of the pipeline was tuned against.
///
/// Fewer than three samples yield an empty result.
pub fn find_turning_points(smoothed: &[f64]) -> Vec<TurningPoint> {
    let n = smoothed.len();
    if n < 3 {
        return Vec::new();
    }

    let mut points = Vec::new();
    for i in 1..n - 1 {
        if smoothed[i - 1] < smoothed[i] && smoothed[i] > smoothed[i + 1] {
            points.push(TurningPoint {
                index: i,
                kind: TideKind::High,
            });
        } else if smoothed[i - 1] > smoothed[i] && smoothed[i] < smoothed[i + 1] {
            points.push(TurningPoint {
                index: i,
                kind: TideKind::Low,
            });
        }
    }
    points
}

/// Turning points surfaced downstream: at most the first two of each kind,
/// in index order. Later turns in the same day are computed but not labeled
/// on the chart or in the report narrative.
#[derive(Clone, Debug, Default)]
pub struct AnnotatedTides {
    /// Indices of the first (up to) two low tides
    pub lows: Vec<usize>,
    /// Indices of the first (up to) two high tides
    pub highs: Vec<usize>,
}

/// Partition turning points by kind and keep the first two of each.
pub fn annotate(points: &[TurningPoint]) -> AnnotatedTides {
    let mut out = AnnotatedTides::default();
    for p in points {
        match p.kind {
            TideKind::Low if out.lows.len() < 2 => out.lows.push(p.index),
            TideKind::High if out.highs.len() < 2 => out.highs.push(p.index),
            _ => {}
        }
    }
    out
}

/// Resolve turning-point indices to their sample times.
pub fn turning_times(series: &TideSeries, points: &[TurningPoint]) -> Vec<NaiveDateTime> {
    points
        .iter()
        .filter_map(|p| series.samples.get(p.index).map(|s| s.time))
        .collect()
}

/// Classify the kayak condition for `day` from the tide turning times.
///
/// Each turning point scores independently: [`ConditionLabel::Great`] inside
/// either ideal window, [`ConditionLabel::Good`] inside a margin band,
/// [`ConditionLabel::Poor`] otherwise. The day's label is the maximum over
/// all turning points, so the result does not depend on the order the points
/// are supplied in. No turning points at all score `Poor`.
pub fn classify(
    turns: &[NaiveDateTime],
    day: NaiveDate,
    windows: &ConditionWindows,
) -> ConditionLabel {
    let morning = (day.and_time(windows.morning_start), day.and_time(windows.morning_end));
    let evening = (day.and_time(windows.evening_start), day.and_time(windows.evening_end));

    turns
        .iter()
        .map(|&t| score_turn(t, morning, evening, windows.margin))
        .max()
        .unwrap_or(ConditionLabel::Poor)
}

/// Score a single turning time against the anchored windows.
fn score_turn(
    t: NaiveDateTime,
    morning: (NaiveDateTime, NaiveDateTime),
    evening: (NaiveDateTime, NaiveDateTime),
    margin: Duration,
) -> ConditionLabel {
    let in_ideal = |(start, end): (NaiveDateTime, NaiveDateTime)| start <= t && t < end;
    let in_margin =
        |(start, end): (NaiveDateTime, NaiveDateTime)| start - margin <= t && t < end + margin;

    if in_ideal(morning) || in_ideal(evening) {
        ConditionLabel::Great
    } else if in_margin(morning) || in_margin(evening) {
        ConditionLabel::Good
    } else {
        ConditionLabel::Poor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 6).unwrap()
    }

    #[test]
    fn smooth_preserves_length() {
        for n in [5, 6, 17, 240] {
            let heights: Vec<f64> = (0..n).map(|i| (i as f64 * 0.3).sin()).collect();
            let smoothed = smooth(&heights).unwrap();
            assert_eq!(smoothed.len(), n);
        }
    }

    #[test]
    fn smooth_rejects_short_input() {
        let err = smooth(&[1.0, 2.0, 3.0, 4.0]).unwrap_err();
        match err {
            AnalysisError::InsufficientData { needed, got } => {
                assert_eq!(needed, 5);
                assert_eq!(got, 4);
            }
        }
    }

    #[test]
    fn smooth_keeps_constant_series_constant() {
        let heights = vec![4.2; 24];
        let smoothed = smooth(&heights).unwrap();
        for v in smoothed {
            assert!((v - 4.2).abs() < 1e-9, "constant series drifted to {v}");
        }
    }

    #[test]
    fn smooth_is_exact_on_quadratics() {
        // A degree-2 polynomial is reproduced exactly by a degree-2 local
        // fit, boundaries included, so smoothing is idempotent on it.
        let heights: Vec<f64> = (0..20)
            .map(|i| {
                let x = i as f64;
                1.5 + 0.25 * x - 0.03 * x * x
            })
            .collect();
        let once = smooth(&heights).unwrap();
        let twice = smooth(&once).unwrap();
        for (a, b) in heights.iter().zip(once.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
        for (a, b) in once.iter().zip(twice.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn detector_finds_one_high_one_low_on_sine_period() {
        // One full period: peak near the quarter mark, trough near the
        // three-quarter mark.
        let n = 48;
        let heights: Vec<f64> = (0..n)
            .map(|i| (i as f64 / n as f64 * std::f64::consts::TAU).sin())
            .collect();
        let points = find_turning_points(&smooth(&heights).unwrap());
        let highs: Vec<_> = points.iter().filter(|p| p.kind == TideKind::High).collect();
        let lows: Vec<_> = points.iter().filter(|p| p.kind == TideKind::Low).collect();
        assert_eq!(highs.len(), 1, "expected one high, got {points:?}");
        assert_eq!(lows.len(), 1, "expected one low, got {points:?}");
        assert!(
            highs[0].index < lows[0].index,
            "high should precede low over one sine period"
        );
    }

    #[test]
    fn detector_ignores_monotonic_series() {
        let rising: Vec<f64> = (0..30).map(f64::from).collect();
        assert!(find_turning_points(&rising).is_empty());
    }

    #[test]
    fn detector_ignores_constant_series() {
        let flat = vec![2.0; 30];
        assert!(find_turning_points(&smooth(&flat).unwrap()).is_empty());
    }

    #[test]
    fn detector_requires_strict_inequality_on_plateaus() {
        // Peak value repeated: neither plateau sample is strictly above both
        // neighbors, so no turning point is reported. Known blind spot.
        let heights = [1.0, 2.0, 3.0, 3.0, 2.0, 1.0];
        assert!(find_turning_points(&heights).is_empty());
    }

    #[test]
    fn detector_never_reports_boundaries() {
        let heights = [5.0, 1.0, 2.0, 1.0, 5.0];
        let points = find_turning_points(&heights);
        assert!(points.iter().all(|p| p.index != 0 && p.index != 4));
    }

    #[test]
    fn detector_handles_tiny_input() {
        assert!(find_turning_points(&[]).is_empty());
        assert!(find_turning_points(&[1.0]).is_empty());
        assert!(find_turning_points(&[1.0, 2.0]).is_empty());
    }

    #[test]
    fn annotate_keeps_first_two_per_kind() {
        let points = [
            TurningPoint { index: 3, kind: TideKind::Low },
            TurningPoint { index: 9, kind: TideKind::High },
            TurningPoint { index: 15, kind: TideKind::Low },
            TurningPoint { index: 21, kind: TideKind::High },
            TurningPoint { index: 27, kind: TideKind::Low },
            TurningPoint { index: 33, kind: TideKind::High },
        ];
        let marks = annotate(&points);
        assert_eq!(marks.lows, vec![3, 15]);
        assert_eq!(marks.highs, vec![9, 21]);
    }

    #[test]
    fn classify_great_inside_morning_window() {
        let label = classify(&[at(7, 30)], day(), &ConditionWindows::default());
        assert_eq!(label, ConditionLabel::Great);
    }

    #[test]
    fn classify_good_inside_margin_only() {
        let label = classify(&[at(6, 15)], day(), &ConditionWindows::default());
        assert_eq!(label, ConditionLabel::Good);
    }

    #[test]
    fn classify_poor_outside_all_windows() {
        let label = classify(&[at(3, 0)], day(), &ConditionWindows::default());
        assert_eq!(label, ConditionLabel::Poor);
    }

    #[test]
    fn classify_is_order_insensitive() {
        let windows = ConditionWindows::default();
        let forward = classify(&[at(6, 15), at(8, 0)], day(), &windows);
        let reverse = classify(&[at(8, 0), at(6, 15)], day(), &windows);
        assert_eq!(forward, ConditionLabel::Great);
        assert_eq!(reverse, ConditionLabel::Great);
    }

    #[test]
    fn classify_window_end_is_exclusive() {
        // Exactly 11:00 is outside the ideal window but inside its margin.
        let label = classify(&[at(11, 0)], day(), &ConditionWindows::default());
        assert_eq!(label, ConditionLabel::Good);
    }

    #[test]
    fn classify_empty_input_is_poor() {
        let label = classify(&[], day(), &ConditionWindows::default());
        assert_eq!(label, ConditionLabel::Poor);
    }

    #[test]
    fn classify_ignores_turns_on_other_days() {
        let other_day = NaiveDate::from_ymd_opt(2025, 8, 7)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let label = classify(&[other_day], day(), &ConditionWindows::default());
        assert_eq!(label, ConditionLabel::Poor);
    }
}
