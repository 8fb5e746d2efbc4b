use crate::text::no_events_message;
use analytics::HistoricalSimilarEvent;
use comfy_table::presets::{ASCII_MARKDOWN, UTF8_FULL};
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use core_types::Locale;

/// Visual preset of a rendered table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStyle {
    /// Box-drawing characters for terminals.
    Utf8,
    /// GitHub-flavored Markdown, for downloadable exports.
    Markdown,
}

fn headers(locale: Locale) -> [&'static str; 8] {
    match locale {
        Locale::En => [
            "#",
            "Event",
            "Period",
            "Days",
            "Similarity",
            "Change",
            "Volatility",
            "Trend",
        ],
        Locale::Zh => ["#", "事件", "时间段", "天数", "相似度", "变动", "波动率", "趋势"],
    }
}

/// Pipes end a Markdown cell early.
fn escape_cell(text: &str, style: TableStyle) -> String {
    match style {
        TableStyle::Utf8 => text.to_string(),
        TableStyle::Markdown => text.replace('|', "\\|"),
    }
}

/// Renders similar events as a table, one row per event in ranking order.
///
/// An empty list renders as the same "no events" sentence the text formatter uses.
pub fn events_table(events: &[HistoricalSimilarEvent], locale: Locale, style: TableStyle) -> String {
    if events.is_empty() {
        return no_events_message(locale).to_string();
    }

    let mut table = Table::new();
    match style {
        TableStyle::Utf8 => {
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);
        }
        TableStyle::Markdown => {
            table.load_preset(ASCII_MARKDOWN);
        }
    }
    table.set_header(headers(locale));

    let to = match locale {
        Locale::En => "to",
        Locale::Zh => "至",
    };
    for (i, event) in events.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(escape_cell(&event.event_name, style)),
            Cell::new(format!("{} {to} {}", event.start_date, event.end_date)),
            Cell::new(event.duration).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}%", event.similarity_score * 100.0))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{:+.1}%", event.change_percent)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}%", event.volatility)).set_alignment(CellAlignment::Right),
            Cell::new(escape_cell(&event.trend_description, style)),
        ]);
    }
    tracing::debug!(rows = events.len(), ?style, "Rendered events table.");

    table.to_string()
}
