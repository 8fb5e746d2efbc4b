use analytics::{classify, compare_methods, AnomalyResult, HistoricalSimilarEvent};
use chrono::{Days, NaiveDate};
use configuration::AnalysisConfig;
use core_types::{Analyzer, DataPoint, Locale, Severity};
use reporter::{
    events_table, format_anomaly, format_comparison, format_forecast, format_similar_events,
    format_volatility, no_events_message, render_json, TableStyle,
};

fn event(score: f64) -> HistoricalSimilarEvent {
    HistoricalSimilarEvent {
        event_name: "Sharp decline (Mar 2020 to Apr 2020)".to_string(),
        start_date: NaiveDate::from_ymd_opt(2020, 3, 2).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2020, 4, 10).unwrap(),
        duration: 39,
        similarity_score: score,
        start_value: 1.5876,
        end_value: 0.0512,
        change_percent: -96.77503149,
        volatility: 12.345678,
        trend_description: "sharp decline with elevated volatility".to_string(),
        historical_context: "context".to_string(),
        market_impact: "impact | with a pipe".to_string(),
        investment_insight: "insight".to_string(),
    }
}

fn anomaly() -> AnomalyResult {
    AnomalyResult {
        series_id: "SOFR".to_string(),
        current_value: 5.31,
        z_score: 2.4567,
        conditional_volatility: 0.123456,
        persistence: 0.94,
        half_life: 11.2023,
        long_run_variance: 0.02,
        severity: Severity::Warning,
        is_anomaly: true,
        confidence: 87.654,
        explanation: "explanation text".to_string(),
        analyzer: Analyzer::Ewma,
        value_at_risk: 0.2632,
        confidence_level: 0.95,
        sample_size: 91,
    }
}

#[test]
fn empty_event_list_has_a_distinct_message_per_locale() {
    let en = format_similar_events(&[], Locale::En);
    let zh = format_similar_events(&[], Locale::Zh);
    assert_eq!(en.trim_end(), no_events_message(Locale::En));
    assert_eq!(zh.trim_end(), no_events_message(Locale::Zh));
    assert_ne!(en, zh);
    assert_eq!(format_similar_events(&[], Locale::En), en);
}

#[test]
fn percentages_are_rounded_to_one_decimal() {
    let text = format_similar_events(&[event(0.97349)], Locale::En);
    assert!(text.contains("similarity 97.3%"));
    assert!(text.contains("-96.8%"));
    assert!(text.contains("volatility 12.3%"));
    assert!(text.contains("39 days"));
}

#[test]
fn anomaly_text_rounds_for_display_only() {
    let result = anomaly();
    let en = format_anomaly(&result, Locale::En);
    assert!(en.contains("Z-score: 2.46"));
    assert!(en.contains("Confidence: 87.7%"));
    assert!(en.contains("Conditional volatility: 0.1235%"));
    assert!(en.contains("Severity: warning (anomaly: yes)"));
    assert!(en.contains("highly persistent"));
    assert!(en.contains("shocks fade quickly"));

    let zh = format_anomaly(&result, Locale::Zh);
    assert!(zh.contains("严重程度: 警告"));
    assert!(zh.contains("波动率半衰期约11天"));
    // The struct itself is untouched.
    assert_eq!(result.z_score, 2.4567);
}

#[test]
fn markdown_table_escapes_pipes_and_keeps_rank_order() {
    let mut noisy = event(0.91);
    noisy.trend_description = "a | b".to_string();
    let table = events_table(&[event(0.99), noisy], Locale::En, TableStyle::Markdown);

    assert!(table.contains("| # "));
    assert!(table.contains("a \\| b"));
    let first = table.find("99.0%").unwrap();
    let second = table.find("91.0%").unwrap();
    assert!(first < second);
}

#[test]
fn empty_table_falls_back_to_message() {
    assert_eq!(
        events_table(&[], Locale::Zh, TableStyle::Utf8),
        no_events_message(Locale::Zh)
    );
}

#[test]
fn renders_engine_output() {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let history: Vec<DataPoint> = (0..60)
        .map(|i| DataPoint::new(start + Days::new(i), 5.0 + i as f64 * 0.01))
        .collect();
    let config = AnalysisConfig::default();

    let comparison = compare_methods("RAMP", 5.60, &history, &config).unwrap();
    let text = format_comparison(&comparison, Locale::En);
    assert!(text.starts_with("Method comparison: RAMP"));
    assert!(text.contains("zscore"));
    assert!(text.contains("ewma"));

    let result = classify("RAMP", 5.60, &history, &config).unwrap();
    let json = render_json(&result).unwrap();
    assert!(json.contains("\"analyzer\": \"ewma\""));
    assert!(json.contains("\"severity\": \"normal\""));
}

#[test]
fn short_history_sections_stop_after_the_notice() {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let history: Vec<DataPoint> = (0..10)
        .map(|i| DataPoint::new(start + Days::new(i), 100.0 + i as f64))
        .collect();
    let config = AnalysisConfig::default();

    let volatility = analytics::analyze_volatility(111.0, &history, &config).unwrap();
    assert_eq!(
        format_volatility("CPI", &volatility, Locale::En),
        "Volatility analysis: CPI\n  Not enough history for a volatility estimate.\n"
    );

    let forecast = analytics::forecast_volatility(&history, &config).unwrap();
    assert_eq!(
        format_forecast("CPI", &forecast, Locale::Zh),
        "波动率预测: CPI\n  历史数据不足，无法估计波动率。\n"
    );
}
