//! Plain-text rendering in English and Chinese.
//!
//! Numbers arrive at full precision and are only rounded for display: one decimal for
//! percentages, two for Z-scores, four for volatilities and levels.

use analytics::{
    AnalysisReport, AnomalyResult, ForecastTrend, HistoricalSimilarEvent, MethodComparison,
    StatisticsSummary, VolatilityAnalysisResult, VolatilityForecast,
};
use analytics::volatility::MIN_RETURNS;
use core_types::{Analyzer, Locale, Severity, VolatilityRegime};
use std::fmt::{self, Write};

/// Rendered when a similarity search returns no events.
pub fn no_events_message(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "No historical periods resembling the current trend were found.",
        Locale::Zh => "未找到与当前走势相似的历史时期。",
    }
}

struct Labels {
    anomaly_title: &'static str,
    volatility_title: &'static str,
    forecast_title: &'static str,
    comparison_title: &'static str,
    events_title: &'static str,
    statistics_title: &'static str,
    current_value: &'static str,
    z_score: &'static str,
    severity: &'static str,
    anomaly: &'static str,
    yes: &'static str,
    no: &'static str,
    conditional_volatility: &'static str,
    annualized: &'static str,
    confidence: &'static str,
    method: &'static str,
    value_at_risk: &'static str,
    persistence: &'static str,
    half_life: &'static str,
    days: &'static str,
    bands: &'static str,
    breakout_up: &'static str,
    breakout_down: &'static str,
    regime: &'static str,
    horizon: &'static str,
    trend: &'static str,
    step: &'static str,
    similarity: &'static str,
    period: &'static str,
    change: &'static str,
    volatility: &'static str,
    agree: &'static str,
    disagree: &'static str,
    mean: &'static str,
    std_dev: &'static str,
    range: &'static str,
    observations: &'static str,
    insufficient: &'static str,
    to: &'static str,
}

const EN: Labels = Labels {
    anomaly_title: "Anomaly check",
    volatility_title: "Volatility analysis",
    forecast_title: "Volatility forecast",
    comparison_title: "Method comparison",
    events_title: "Historical periods similar to the current trend",
    statistics_title: "Summary statistics",
    current_value: "Current value",
    z_score: "Z-score",
    severity: "Severity",
    anomaly: "anomaly",
    yes: "yes",
    no: "no",
    conditional_volatility: "Conditional volatility",
    annualized: "annualized",
    confidence: "Confidence",
    method: "Method",
    value_at_risk: "Value at risk",
    persistence: "Persistence",
    half_life: "Half-life",
    days: "days",
    bands: "Expected range",
    breakout_up: "Current value is above the upper band.",
    breakout_down: "Current value is below the lower band.",
    regime: "Regime",
    horizon: "Horizon",
    trend: "Trend",
    step: "Step",
    similarity: "similarity",
    period: "Period",
    change: "Change",
    volatility: "volatility",
    agree: "Both methods agree.",
    disagree: "The methods disagree.",
    mean: "Mean",
    std_dev: "Std dev",
    range: "Range",
    observations: "Observations",
    insufficient: "Not enough history for a volatility estimate.",
    to: "to",
};

const ZH: Labels = Labels {
    anomaly_title: "异常检测",
    volatility_title: "波动率分析",
    forecast_title: "波动率预测",
    comparison_title: "方法对比",
    events_title: "与当前走势相似的历史时期",
    statistics_title: "统计摘要",
    current_value: "当前值",
    z_score: "Z 值",
    severity: "严重程度",
    anomaly: "异常",
    yes: "是",
    no: "否",
    conditional_volatility: "条件波动率",
    annualized: "年化",
    confidence: "置信度",
    method: "方法",
    value_at_risk: "风险价值",
    persistence: "持续性",
    half_life: "半衰期",
    days: "天",
    bands: "预期区间",
    breakout_up: "当前值突破上轨。",
    breakout_down: "当前值跌破下轨。",
    regime: "波动状态",
    horizon: "预测期数",
    trend: "趋势",
    step: "第",
    similarity: "相似度",
    period: "时间段",
    change: "变动",
    volatility: "波动率",
    agree: "两种方法结论一致。",
    disagree: "两种方法结论不一致。",
    mean: "均值",
    std_dev: "标准差",
    range: "区间",
    observations: "观测数",
    insufficient: "历史数据不足，无法估计波动率。",
    to: "至",
};

fn labels(locale: Locale) -> &'static Labels {
    match locale {
        Locale::En => &EN,
        Locale::Zh => &ZH,
    }
}

pub fn severity_label(severity: Severity, locale: Locale) -> &'static str {
    match (locale, severity) {
        (Locale::En, s) => s.as_str(),
        (Locale::Zh, Severity::Normal) => "正常",
        (Locale::Zh, Severity::Warning) => "警告",
        (Locale::Zh, Severity::Critical) => "严重",
    }
}

fn regime_label(regime: VolatilityRegime, locale: Locale) -> &'static str {
    match (locale, regime) {
        (Locale::En, r) => r.as_str(),
        (Locale::Zh, VolatilityRegime::Low) => "低",
        (Locale::Zh, VolatilityRegime::Normal) => "正常",
        (Locale::Zh, VolatilityRegime::High) => "高",
    }
}

fn trend_label(trend: ForecastTrend, locale: Locale) -> &'static str {
    match (locale, trend) {
        (Locale::En, ForecastTrend::Rising) => "rising",
        (Locale::En, ForecastTrend::Falling) => "falling",
        (Locale::En, ForecastTrend::Stable) => "stable",
        (Locale::Zh, ForecastTrend::Rising) => "上升",
        (Locale::Zh, ForecastTrend::Falling) => "下降",
        (Locale::Zh, ForecastTrend::Stable) => "稳定",
    }
}

/// How long a volatility shock lingers, judged from `α + β` (or `λ`).
pub fn persistence_interpretation(persistence: f64, locale: Locale) -> &'static str {
    match locale {
        Locale::En if persistence > 0.9 => {
            "Volatility is highly persistent; large moves keep echoing for a long time."
        }
        Locale::En if persistence > 0.7 => {
            "Volatility is moderately persistent; shocks fade within one to two weeks."
        }
        Locale::En => "Volatility mean-reverts quickly; the market is relatively stable.",
        Locale::Zh if persistence > 0.9 => "波动率具有极强的持续性，大波动后会持续较长时间。",
        Locale::Zh if persistence > 0.7 => "波动率有一定持续性，冲击影响约1-2周。",
        Locale::Zh => "波动率回归较快，市场相对稳定。",
    }
}

pub fn half_life_interpretation(half_life: f64, locale: Locale) -> String {
    if half_life.is_infinite() {
        return match locale {
            Locale::En => "Volatility does not converge; stay alert.".to_string(),
            Locale::Zh => "波动率不收敛，需要警惕。".to_string(),
        };
    }
    match locale {
        Locale::En if half_life > 30.0 => {
            format!("Volatility half-life is about {half_life:.0} days; shocks are long-lasting.")
        }
        Locale::En if half_life > 14.0 => format!(
            "Volatility half-life is about {half_life:.0} days; shocks last roughly two to four weeks."
        ),
        Locale::En => {
            format!("Volatility half-life is about {half_life:.0} days; shocks fade quickly.")
        }
        Locale::Zh if half_life > 30.0 => {
            format!("波动率半衰期约{half_life:.0}天，冲击影响持久。")
        }
        Locale::Zh if half_life > 14.0 => {
            format!("波动率半衰期约{half_life:.0}天，冲击影响约2-4周。")
        }
        Locale::Zh => format!("波动率半衰期约{half_life:.0}天，冲击影响较快消退。"),
    }
}

fn format_half_life(half_life: f64) -> String {
    if half_life.is_infinite() {
        "∞".to_string()
    } else {
        format!("{half_life:.1}")
    }
}

/// Runs `write` against a fresh buffer and returns what it produced.
fn render(write: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    if write(&mut out).is_err() {
        tracing::warn!("Text rendering stopped early.");
    }
    out
}

pub fn format_statistics(series_id: &str, stats: &StatisticsSummary, locale: Locale) -> String {
    let l = labels(locale);
    render(|out| {
        writeln!(out, "{}: {series_id}", l.statistics_title)?;
        writeln!(
            out,
            "  {}: {} ({} {} {})",
            l.observations, stats.count, stats.start_date, l.to, stats.end_date
        )?;
        writeln!(out, "  {}: {:.4}", l.mean, stats.mean)?;
        writeln!(out, "  {}: {:.4}", l.std_dev, stats.std_dev)?;
        writeln!(out, "  {}: {:.4} {} {:.4}", l.range, stats.min, l.to, stats.max)
    })
}

pub fn format_anomaly(result: &AnomalyResult, locale: Locale) -> String {
    let l = labels(locale);
    render(|out| {
        writeln!(out, "{}: {}", l.anomaly_title, result.series_id)?;
        writeln!(out, "  {}: {:.4}", l.current_value, result.current_value)?;
        writeln!(out, "  {}: {:.2}", l.z_score, result.z_score)?;
        writeln!(
            out,
            "  {}: {} ({}: {})",
            l.severity,
            severity_label(result.severity, locale),
            l.anomaly,
            if result.is_anomaly { l.yes } else { l.no }
        )?;
        writeln!(out, "  {}: {}", l.method, result.analyzer)?;
        writeln!(out, "  {}: {:.1}%", l.confidence, result.confidence)?;

        if result.analyzer == Analyzer::ZScore {
            writeln!(out, "  {}: {:.4}", l.std_dev, result.conditional_volatility)?;
        } else if result.sample_size >= MIN_RETURNS {
            writeln!(
                out,
                "  {}: {:.4}%",
                l.conditional_volatility, result.conditional_volatility
            )?;
            writeln!(
                out,
                "  {} ({:.0}%): {:.4}%",
                l.value_at_risk,
                result.confidence_level * 100.0,
                result.value_at_risk
            )?;
            writeln!(out, "  {}: {:.4}", l.persistence, result.persistence)?;
            writeln!(
                out,
                "  {}: {} {}",
                l.half_life,
                format_half_life(result.half_life),
                l.days
            )?;
            writeln!(out, "  {}", persistence_interpretation(result.persistence, locale))?;
            writeln!(out, "  {}", half_life_interpretation(result.half_life, locale))?;
        }
        writeln!(out, "  {}", result.explanation)
    })
}

pub fn format_volatility(
    series_id: &str,
    result: &VolatilityAnalysisResult,
    locale: Locale,
) -> String {
    let l = labels(locale);
    render(|out| {
        writeln!(out, "{}: {series_id}", l.volatility_title)?;
        if !result.sufficient_data {
            return writeln!(out, "  {}", l.insufficient);
        }
        writeln!(
            out,
            "  {}: {:.4}% ({} {:.1}%)",
            l.conditional_volatility,
            result.conditional_volatility,
            l.annualized,
            result.annualized_volatility
        )?;
        writeln!(out, "  {}: {}", l.regime, regime_label(result.regime, locale))?;
        writeln!(
            out,
            "  {}: {:.4} {} {:.4}",
            l.bands, result.lower_band, l.to, result.upper_band
        )?;
        if result.upper_breakout {
            writeln!(out, "  {}", l.breakout_up)?;
        }
        if result.lower_breakout {
            writeln!(out, "  {}", l.breakout_down)?;
        }
        writeln!(
            out,
            "  {} ({:.0}%): {:.4}%",
            l.value_at_risk,
            result.confidence_level * 100.0,
            result.value_at_risk
        )?;
        writeln!(
            out,
            "  {}: {:.4}, {}: {} {}",
            l.persistence,
            result.persistence,
            l.half_life,
            format_half_life(result.half_life),
            l.days
        )?;
        writeln!(out, "  {}", persistence_interpretation(result.persistence, locale))?;
        writeln!(out, "  {}", half_life_interpretation(result.half_life, locale))
    })
}

pub fn format_forecast(series_id: &str, forecast: &VolatilityForecast, locale: Locale) -> String {
    let l = labels(locale);
    render(|out| {
        writeln!(out, "{}: {series_id}", l.forecast_title)?;
        if !forecast.sufficient_data {
            return writeln!(out, "  {}", l.insufficient);
        }
        writeln!(out, "  {}: {}", l.horizon, forecast.horizon)?;
        writeln!(out, "  {}: {}", l.trend, trend_label(forecast.trend, locale))?;
        for (i, vol) in forecast.volatility_forecast.iter().enumerate() {
            let lower = forecast.lower_bound.get(i).copied().unwrap_or(*vol);
            let upper = forecast.upper_bound.get(i).copied().unwrap_or(*vol);
            let annual = forecast.annualized_volatility.get(i).copied().unwrap_or(0.0);
            let step = match locale {
                Locale::En => format!("{} {}", l.step, i + 1),
                Locale::Zh => format!("{}{}期", l.step, i + 1),
            };
            writeln!(
                out,
                "  {step}: {vol:.4}% [{lower:.4}, {upper:.4}] ({} {annual:.1}%)",
                l.annualized
            )?;
        }
        Ok(())
    })
}

pub fn format_comparison(comparison: &MethodComparison, locale: Locale) -> String {
    let l = labels(locale);
    render(|out| {
        writeln!(out, "{}: {}", l.comparison_title, comparison.series_id)?;
        for result in [&comparison.zscore, &comparison.conditional] {
            writeln!(
                out,
                "  {:<8} {}: {:>7.2}  {}: {}",
                result.analyzer.as_str(),
                l.z_score,
                result.z_score,
                l.severity,
                severity_label(result.severity, locale)
            )?;
        }
        writeln!(
            out,
            "  {}",
            if comparison.agree { l.agree } else { l.disagree }
        )
    })
}

/// Numbered list of similar events, or the "no events" message for an empty list.
pub fn format_similar_events(events: &[HistoricalSimilarEvent], locale: Locale) -> String {
    if events.is_empty() {
        return format!("{}\n", no_events_message(locale));
    }
    let l = labels(locale);
    render(|out| {
        writeln!(out, "{}:", l.events_title)?;
        for (i, event) in events.iter().enumerate() {
            writeln!(
                out,
                "{}. {} ({} {:.1}%)",
                i + 1,
                event.event_name,
                l.similarity,
                event.similarity_score * 100.0
            )?;
            writeln!(
                out,
                "   {}: {} {} {} ({} {})",
                l.period, event.start_date, l.to, event.end_date, event.duration, l.days
            )?;
            writeln!(
                out,
                "   {}: {:+.1}%, {} {:.1}%",
                l.change, event.change_percent, l.volatility, event.volatility
            )?;
            writeln!(out, "   {}: {}", l.trend, event.trend_description)?;
            writeln!(out, "   {}", event.historical_context)?;
            writeln!(out, "   {}", event.market_impact)?;
            writeln!(out, "   {}", event.investment_insight)?;
        }
        Ok(())
    })
}

/// Every section of a report except the similar events, in display order.
pub fn format_analysis_sections(report: &AnalysisReport, locale: Locale) -> Vec<String> {
    let mut sections = vec![
        format_statistics(&report.series_id, &report.statistics, locale),
        format_anomaly(&report.anomaly, locale),
    ];
    if let Some(volatility) = &report.volatility {
        sections.push(format_volatility(&report.series_id, volatility, locale));
    }
    if let Some(forecast) = &report.forecast {
        sections.push(format_forecast(&report.series_id, forecast, locale));
    }
    sections
}

pub fn format_full_report(report: &AnalysisReport, locale: Locale) -> String {
    let mut sections = format_analysis_sections(report, locale);
    sections.push(format_similar_events(&report.similar_events, locale));
    sections.join("\n")
}
