//! End-to-end scenarios over the public analytics API.

use analytics::{
    analyze_series, classify, compute_statistics, find_similar_events, AnalyticsError,
};
use chrono::{Days, NaiveDate};
use configuration::{AnalysisConfig, DetectionMethod};
use core_types::{DataPoint, Severity};

fn daily(start: NaiveDate, vals: &[f64]) -> Vec<DataPoint> {
    vals.iter()
        .enumerate()
        .map(|(i, v)| DataPoint::new(start + Days::new(i as u64), *v))
        .collect()
}

fn jan_1() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 1, 1).unwrap()
}

/// Sawtooth with a slowly growing amplitude, so no two windows share a shape exactly.
fn sawtooth(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 50.0 + (i % 11) as f64 * (1.0 + i as f64 / 1000.0) - (i % 3) as f64)
        .collect()
}

#[test]
fn single_point_statistics() {
    let summary = compute_statistics(&daily(jan_1(), &[3.75])).unwrap();
    assert_eq!(summary.std_dev, 0.0);
    assert_eq!(summary.min, 3.75);
    assert_eq!(summary.max, 3.75);
}

#[test]
fn constant_history_never_alarms() {
    for len in [1usize, 5, 31, 200] {
        let history = daily(jan_1(), &vec![2.5; len]);
        for method in [DetectionMethod::ZScore, DetectionMethod::ConditionalVolatility] {
            let config = AnalysisConfig { method, ..Default::default() };
            let result = classify("CONST", 2.5, &history, &config).unwrap();
            assert_eq!(result.z_score, 0.0);
            assert_eq!(result.severity, Severity::Normal);
        }
    }
}

#[test]
fn ewma_and_raw_zscore_disagree_on_a_steady_ramp() {
    let levels: Vec<f64> = (0..60).map(|i| 5.0 + i as f64 * 0.01).collect();
    let history = daily(jan_1(), &levels);

    let ewma = classify("RAMP", 5.60, &history, &AnalysisConfig::default()).unwrap();
    assert_eq!(ewma.severity, Severity::Normal);
    assert!(ewma.conditional_volatility < 0.01);

    // Against the last three raw levels the next step of the ramp looks extreme.
    let raw = classify(
        "RAMP",
        5.60,
        &history,
        &AnalysisConfig {
            method: DetectionMethod::ZScore,
            zscore_window: 3,
            ..Default::default()
        },
    )
    .unwrap();
    assert!(raw.z_score > ewma.z_score.abs());
    assert!(raw.is_anomaly);
}

#[test]
fn injected_pattern_is_the_top_match() {
    let mut levels = sawtooth(500);
    let current: Vec<f64> = (0..30).map(|i| 80.0 - (i as f64 * 0.7).sin() * 5.0 - i as f64).collect();
    levels[470..].copy_from_slice(&current);
    levels[120..150].copy_from_slice(&current);
    let history = daily(jan_1(), &levels);

    let config = AnalysisConfig { similarity_threshold: 0.85, ..Default::default() };
    let events = find_similar_events(&history[470..], &history, &config).unwrap();

    let top = &events[0];
    assert_eq!(top.start_date, history[120].date);
    assert!((top.similarity_score - 1.0).abs() < 1e-12);
    assert!(top.change_percent < 0.0);
}

#[test]
fn full_report_round_trips_through_json() {
    let mut levels = sawtooth(240);
    let tail: Vec<f64> = levels[60..90].to_vec();
    levels[210..].copy_from_slice(&tail);
    let points = daily(jan_1(), &levels);

    let report = analyze_series("SAW", &points, &AnalysisConfig::default()).unwrap();
    assert!(report.similar_events.len() <= 5);
    assert!(report.similar_events.iter().any(|e| e.start_date == points[60].date));

    let json = serde_json::to_string(&report).unwrap();
    let back: analytics::AnalysisReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.series_id, "SAW");
    assert_eq!(back.similar_events.len(), report.similar_events.len());
    assert_eq!(back.anomaly.severity, report.anomaly.severity);
}

#[test]
fn invalid_input_is_surfaced() {
    let config = AnalysisConfig::default();
    let unsorted = vec![
        DataPoint::new(NaiveDate::from_ymd_opt(2020, 5, 2).unwrap(), 1.0),
        DataPoint::new(NaiveDate::from_ymd_opt(2020, 5, 1).unwrap(), 1.0),
    ];
    assert!(matches!(
        analyze_series("BAD", &unsorted, &config),
        Err(AnalyticsError::Series(_))
    ));

    let bad_window = AnalysisConfig { window_size: 400, ..Default::default() };
    assert!(matches!(
        analyze_series("BAD", &daily(jan_1(), &[1.0, 2.0]), &bad_window),
        Err(AnalyticsError::Config(_))
    ));
}
