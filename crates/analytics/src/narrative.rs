//! Localized narrative text attached to analytical results.
//!
//! Everything here is templated from numbers that were already computed. The text never
//! feeds back into a classification.

use chrono::NaiveDate;
use core_types::{Analyzer, Locale, Severity};

/// Absolute change (in %) below which a window counts as flat.
const FLAT_CHANGE: f64 = 1.0;
/// Absolute change (in %) from which a move counts as sharp.
const SHARP_CHANGE: f64 = 10.0;
/// Window volatility (in % per step) below which a window counts as calm.
const LOW_VOLATILITY: f64 = 0.5;
const ELEVATED_VOLATILITY: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    SharpRise,
    Rise,
    Flat,
    Decline,
    SharpDecline,
}

impl Direction {
    fn of(change_percent: f64) -> Self {
        let magnitude = change_percent.abs();
        if magnitude < FLAT_CHANGE {
            Direction::Flat
        } else if change_percent > 0.0 {
            if magnitude >= SHARP_CHANGE {
                Direction::SharpRise
            } else {
                Direction::Rise
            }
        } else if magnitude >= SHARP_CHANGE {
            Direction::SharpDecline
        } else {
            Direction::Decline
        }
    }

    fn label(&self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::En, Direction::SharpRise) => "sharp rise",
            (Locale::En, Direction::Rise) => "moderate rise",
            (Locale::En, Direction::Flat) => "sideways movement",
            (Locale::En, Direction::Decline) => "moderate decline",
            (Locale::En, Direction::SharpDecline) => "sharp decline",
            (Locale::Zh, Direction::SharpRise) => "急剧上升",
            (Locale::Zh, Direction::Rise) => "温和上升",
            (Locale::Zh, Direction::Flat) => "横盘整理",
            (Locale::Zh, Direction::Decline) => "温和下降",
            (Locale::Zh, Direction::SharpDecline) => "急剧下降",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Turbulence {
    Low,
    Moderate,
    Elevated,
}

impl Turbulence {
    fn of(volatility: f64) -> Self {
        if volatility < LOW_VOLATILITY {
            Turbulence::Low
        } else if volatility < ELEVATED_VOLATILITY {
            Turbulence::Moderate
        } else {
            Turbulence::Elevated
        }
    }

    fn label(&self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::En, Turbulence::Low) => "low volatility",
            (Locale::En, Turbulence::Moderate) => "moderate volatility",
            (Locale::En, Turbulence::Elevated) => "elevated volatility",
            (Locale::Zh, Turbulence::Low) => "低波动",
            (Locale::Zh, Turbulence::Moderate) => "中等波动",
            (Locale::Zh, Turbulence::Elevated) => "高波动",
        }
    }
}

/// Qualitative description such as "sharp decline with elevated volatility".
pub fn trend_description(locale: Locale, change_percent: f64, volatility: f64) -> String {
    let direction = Direction::of(change_percent).label(locale);
    let turbulence = Turbulence::of(volatility).label(locale);
    match locale {
        Locale::En => format!("{direction} with {turbulence}"),
        Locale::Zh => format!("{direction}，{turbulence}"),
    }
}

pub fn event_name(locale: Locale, start: NaiveDate, end: NaiveDate, change_percent: f64) -> String {
    let direction = Direction::of(change_percent).label(locale);
    match locale {
        Locale::En => {
            let mut label = direction.to_string();
            if let Some(first) = label.get_mut(0..1) {
                first.make_ascii_uppercase();
            }
            format!("{label} ({} to {})", start.format("%b %Y"), end.format("%b %Y"))
        }
        Locale::Zh => format!(
            "{}至{}{}",
            start.format("%Y年%m月"),
            end.format("%Y年%m月"),
            direction
        ),
    }
}

pub fn historical_context(
    locale: Locale,
    start: NaiveDate,
    end: NaiveDate,
    duration_days: i64,
    start_value: f64,
    end_value: f64,
    change_percent: f64,
) -> String {
    match locale {
        Locale::En => format!(
            "From {start} to {end} ({duration_days} days) the series moved from {start_value:.4} to {end_value:.4}, a change of {change_percent:+.1}%."
        ),
        Locale::Zh => format!(
            "{start}至{end}（共{duration_days}天），数值由{start_value:.4}变为{end_value:.4}，变动{change_percent:+.1}%。"
        ),
    }
}

pub fn market_impact(locale: Locale, change_percent: f64, volatility: f64) -> String {
    let direction = Direction::of(change_percent);
    let turbulence = Turbulence::of(volatility);
    match locale {
        Locale::En => {
            let movement = match direction {
                Direction::SharpRise => "Markets faced a rapid repricing upward",
                Direction::Rise => "Markets saw a gradual upward adjustment",
                Direction::Flat => "Markets held a broadly stable level",
                Direction::Decline => "Markets saw a gradual downward adjustment",
                Direction::SharpDecline => "Markets faced a rapid repricing downward",
            };
            let conditions = match turbulence {
                Turbulence::Low => "under orderly conditions",
                Turbulence::Moderate => "with intermittent swings",
                Turbulence::Elevated => "amid pronounced turbulence",
            };
            format!("{movement} {conditions}.")
        }
        Locale::Zh => {
            let movement = match direction {
                Direction::SharpRise => "市场经历了快速的向上重新定价",
                Direction::Rise => "市场呈现逐步上行调整",
                Direction::Flat => "市场整体保持平稳",
                Direction::Decline => "市场呈现逐步下行调整",
                Direction::SharpDecline => "市场经历了快速的向下重新定价",
            };
            let conditions = match turbulence {
                Turbulence::Low => "运行有序",
                Turbulence::Moderate => "期间伴随间歇性波动",
                Turbulence::Elevated => "期间波动剧烈",
            };
            format!("{movement}，{conditions}。")
        }
    }
}

pub fn investment_insight(locale: Locale, similarity: f64, change_percent: f64) -> String {
    let direction = Direction::of(change_percent).label(locale);
    let magnitude = change_percent.abs();
    match locale {
        Locale::En => format!(
            "The current trend matches this period with a similarity of {similarity:.2}. Back then the pattern ended in a {direction} of {magnitude:.1}%; treat it as a reference scenario, not a forecast."
        ),
        Locale::Zh => format!(
            "当前走势与该时期的相似度为{similarity:.2}。当时该形态以{direction}{magnitude:.1}%告终，仅可作为参考情景，而非预测。"
        ),
    }
}

pub fn anomaly_explanation(
    locale: Locale,
    analyzer: Analyzer,
    severity: Severity,
    current_value: f64,
    z_score: f64,
    volatility: f64,
) -> String {
    match (locale, analyzer, severity) {
        (Locale::En, Analyzer::ZScore, Severity::Normal) => format!(
            "Current value {current_value:.4} is within the normal range of recent levels (Z={z_score:.2})."
        ),
        (Locale::En, Analyzer::ZScore, Severity::Warning) => format!(
            "Current value {current_value:.4} deviates noticeably from recent levels (Z={z_score:.2}, std {volatility:.4})."
        ),
        (Locale::En, Analyzer::ZScore, Severity::Critical) => format!(
            "Current value {current_value:.4} is far outside recent levels (Z={z_score:.2}, std {volatility:.4})."
        ),
        (Locale::En, _, Severity::Normal) => format!(
            "Current value {current_value:.4} moves normally (Z={z_score:.2}) within the conditional volatility range."
        ),
        (Locale::En, _, Severity::Warning) => format!(
            "Movement is elevated (Z={z_score:.2}); conditional volatility {volatility:.4}% is above its usual level."
        ),
        (Locale::En, _, Severity::Critical) => format!(
            "Abnormal movement (Z={z_score:.2})! Conditional volatility {volatility:.4}% may signal stress in this market."
        ),
        (Locale::Zh, Analyzer::ZScore, Severity::Normal) => format!(
            "当前值 {current_value:.4} 处于近期水平的正常范围内 (Z={z_score:.2})。"
        ),
        (Locale::Zh, Analyzer::ZScore, Severity::Warning) => format!(
            "当前值 {current_value:.4} 明显偏离近期水平 (Z={z_score:.2}，标准差 {volatility:.4})。"
        ),
        (Locale::Zh, Analyzer::ZScore, Severity::Critical) => format!(
            "当前值 {current_value:.4} 远超近期水平 (Z={z_score:.2}，标准差 {volatility:.4})。"
        ),
        (Locale::Zh, _, Severity::Normal) => format!(
            "当前值 {current_value:.4} 波动正常 (Z={z_score:.2})，处于条件波动率范围内。"
        ),
        (Locale::Zh, _, Severity::Warning) => format!(
            "波动偏高 (Z={z_score:.2})，当前条件波动率 {volatility:.4}% 高于历史平均。"
        ),
        (Locale::Zh, _, Severity::Critical) => format!(
            "异常波动 (Z={z_score:.2})！当前条件波动率 {volatility:.4}%，可能预示市场压力。"
        ),
    }
}

pub fn insufficient_data_explanation(locale: Locale, have: usize, need: usize) -> String {
    match locale {
        Locale::En => format!(
            "Insufficient data: conditional volatility needs at least {need} returns, only {have} available."
        ),
        Locale::Zh => format!("数据不足：条件波动率至少需要{need}个收益率，当前仅有{have}个。"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_direction_and_turbulence() {
        assert_eq!(
            trend_description(Locale::En, -15.0, 3.0),
            "sharp decline with elevated volatility"
        );
        assert_eq!(
            trend_description(Locale::En, 0.4, 0.1),
            "sideways movement with low volatility"
        );
        assert_eq!(trend_description(Locale::Zh, 5.0, 1.0), "温和上升，中等波动");
    }

    #[test]
    fn event_names_are_capitalized() {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2020, 4, 15).unwrap();
        assert_eq!(
            event_name(Locale::En, start, end, -20.0),
            "Sharp decline (Mar 2020 to Apr 2020)"
        );
        assert_eq!(
            event_name(Locale::Zh, start, end, -20.0),
            "2020年03月至2020年04月急剧下降"
        );
    }

    #[test]
    fn explanation_carries_the_numbers() {
        let text = anomaly_explanation(
            Locale::En,
            Analyzer::Ewma,
            Severity::Critical,
            5.3,
            -3.456,
            0.1234,
        );
        assert!(text.contains("Z=-3.46"));
        assert!(text.contains("0.1234%"));
    }
}
