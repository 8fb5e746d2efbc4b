//! Historical similarity search.
//!
//! A window of `window_size` points slides over the full history. Each candidate is
//! z-normalized and compared with the z-normalized current window, so only the *shape*
//! of the trend matters, not its level or amplitude.
//!
//! Candidates that survive the threshold are merged into regions of overlapping windows,
//! and each region contributes its single best window as one event.

use crate::error::AnalyticsError;
use crate::narrative;
use crate::returns::percent_changes;
use crate::statistics::{mean_std, z_normalize, Shape};
use chrono::NaiveDate;
use configuration::{AnalysisConfig, CurrentWindowPolicy};
use core_types::{validate_series, values, DataPoint};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A historical window whose shape resembles the current trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSimilarEvent {
    pub event_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Calendar days between `start_date` and `end_date`.
    pub duration: i64,
    pub similarity_score: f64,
    pub start_value: f64,
    pub end_value: f64,
    pub change_percent: f64,
    /// Population standard deviation of the step-to-step % changes in the window.
    pub volatility: f64,
    pub trend_description: String,
    pub historical_context: String,
    pub market_impact: String,
    pub investment_insight: String,
}

/// Shape similarity of two equally long sequences, in `[0, 1]`.
///
/// `1 - RMSE / 2` of the z-normalized sequences. Two z-normalized sequences are at most
/// an RMSE of 2 apart, so the score covers the whole interval. It is symmetric and is
/// exactly 1 for identical shapes. A flat sequence only matches another flat sequence.
pub fn similarity_score(a: &[f64], b: &[f64]) -> Result<f64, AnalyticsError> {
    if a.len() != b.len() || a.is_empty() {
        return Err(AnalyticsError::InvalidInput(format!(
            "similarity requires two non-empty sequences of equal length, got {} and {}",
            a.len(),
            b.len()
        )));
    }
    Ok(shape_similarity(&z_normalize(a), &z_normalize(b)))
}

fn shape_similarity(a: &Shape, b: &Shape) -> f64 {
    match (a, b) {
        (Shape::Flat, Shape::Flat) => 1.0,
        (Shape::Flat, _) | (_, Shape::Flat) => 0.0,
        (Shape::Normalized(a), Shape::Normalized(b)) => {
            let sum_sq: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
            let rmse = (sum_sq / a.len() as f64).sqrt();
            (1.0 - rmse / 2.0).clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    score: f64,
}

/// Consecutive overlapping candidates above the threshold.
#[derive(Debug, Clone, Copy)]
struct Region {
    first_start: usize,
    /// Exclusive end index of the last window in the region.
    end: usize,
    best: Candidate,
}

impl Region {
    fn point_count(&self) -> usize {
        self.end - self.first_start
    }
}

/// Picks the current window actually compared against history.
///
/// A longer window is cut to its trailing `window_size` points. A shorter one is
/// rejected, or used at its own length under `CurrentWindowPolicy::Shrink`.
fn effective_window<'a>(
    current_window: &'a [DataPoint],
    config: &AnalysisConfig,
) -> Result<&'a [DataPoint], AnalyticsError> {
    let len = current_window.len();
    if len >= config.window_size {
        return Ok(&current_window[len - config.window_size..]);
    }
    match config.current_window_policy {
        CurrentWindowPolicy::Reject => Err(AnalyticsError::InvalidInput(format!(
            "current window has {len} points, window_size is {}",
            config.window_size
        ))),
        CurrentWindowPolicy::Shrink if len >= 2 => {
            tracing::debug!(len, window_size = config.window_size, "Shrinking search window.");
            Ok(current_window)
        }
        CurrentWindowPolicy::Shrink => Err(AnalyticsError::InvalidInput(format!(
            "current window needs at least 2 points to have a shape, got {len}"
        ))),
    }
}

/// Finds the historical windows most similar in shape to `current_window`.
///
/// Candidates overlapping the current window's date range are never considered, so the
/// current window cannot match itself. Results are sorted by descending similarity
/// (ties by earliest start) and capped at `config.max_events`. A history shorter than
/// `config.window_size` yields an empty list under either current-window policy.
#[instrument(skip_all, fields(current = current_window.len(), history = full_history.len()))]
pub fn find_similar_events(
    current_window: &[DataPoint],
    full_history: &[DataPoint],
    config: &AnalysisConfig,
) -> Result<Vec<HistoricalSimilarEvent>, AnalyticsError> {
    config.validate()?;
    if current_window.is_empty() {
        return Err(AnalyticsError::InvalidInput(
            "current window must contain at least one observation".to_string(),
        ));
    }
    validate_series(current_window)?;
    validate_series(full_history)?;

    if full_history.len() < config.window_size {
        tracing::warn!(
            have = full_history.len(),
            need = config.window_size,
            "History shorter than the search window; no events."
        );
        return Ok(Vec::new());
    }

    let current = effective_window(current_window, config)?;
    let width = current.len();

    let (current_from, current_to) = match (current.first(), current.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => return Ok(Vec::new()),
    };
    let current_shape = z_normalize(&values(current));

    let mut candidates = Vec::new();
    let mut scanned = 0usize;
    for start in (0..=full_history.len() - width).step_by(config.stride) {
        let window = &full_history[start..start + width];
        let (from, to) = (window[0].date, window[width - 1].date);
        if from <= current_to && to >= current_from {
            continue;
        }
        scanned += 1;
        let score = shape_similarity(&current_shape, &z_normalize(&values(window)));
        if score >= config.similarity_threshold {
            candidates.push(Candidate { start, score });
        }
    }

    let regions = merge_overlapping(&candidates, width);
    tracing::debug!(
        scanned,
        above_threshold = candidates.len(),
        regions = regions.len(),
        "Similarity scan complete."
    );

    let mut best: Vec<Candidate> = regions
        .iter()
        .filter(|region| region.point_count() >= config.min_event_duration)
        .map(|region| region.best)
        .collect();
    best.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.start.cmp(&b.start))
    });
    best.truncate(config.max_events);

    Ok(best
        .iter()
        .map(|c| describe_event(&full_history[c.start..c.start + width], c.score, config))
        .collect())
}

/// Candidates arrive in ascending `start` order; a candidate joins the open region
/// when its window starts before the region's last window ends.
fn merge_overlapping(candidates: &[Candidate], width: usize) -> Vec<Region> {
    let mut regions: Vec<Region> = Vec::new();
    for &candidate in candidates {
        match regions.last_mut() {
            Some(region) if candidate.start < region.end => {
                region.end = region.end.max(candidate.start + width);
                if candidate.score > region.best.score {
                    region.best = candidate;
                }
            }
            _ => regions.push(Region {
                first_start: candidate.start,
                end: candidate.start + width,
                best: candidate,
            }),
        }
    }
    regions
}

fn describe_event(window: &[DataPoint], score: f64, config: &AnalysisConfig) -> HistoricalSimilarEvent {
    let first = window[0];
    let last = window[window.len() - 1];
    let change_percent = if first.value != 0.0 {
        (last.value - first.value) / first.value * 100.0
    } else {
        0.0
    };
    let (_, volatility) = mean_std(&percent_changes(&values(window)));
    let duration = (last.date - first.date).num_days();
    let locale = config.locale;

    HistoricalSimilarEvent {
        event_name: narrative::event_name(locale, first.date, last.date, change_percent),
        start_date: first.date,
        end_date: last.date,
        duration,
        similarity_score: score,
        start_value: first.value,
        end_value: last.value,
        change_percent,
        volatility,
        trend_description: narrative::trend_description(locale, change_percent, volatility),
        historical_context: narrative::historical_context(
            locale,
            first.date,
            last.date,
            duration,
            first.value,
            last.value,
            change_percent,
        ),
        market_impact: narrative::market_impact(locale, change_percent, volatility),
        investment_insight: narrative::investment_insight(locale, score, change_percent),
    }
}
