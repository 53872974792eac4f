use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;

use crate::text_manipulators::strip_tags;

// Day-marker rows carry the day's UTC-midnight epoch directly in their id
// attribute; event rows carry the origin's numeric row identifier.
static DAY_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"id="theDay(\d+)""#).unwrap());
static EVENT_ROW_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"id="eventRowId_(\d+)""#).unwrap());
// Pagination matches the bare token, not the attribute form. The origin
// repeats the token in places other than the id attribute and the
// last-seen comparison has to see those too.
static EVENT_ROW_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"eventRowId_(\d+)").unwrap());
static EVENT_DATETIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-event-datetime="([^"]+)""#).unwrap());

static EVENT_NAME_CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<td[^>]*class="[^"]*event[^"]*"[^>]*>(.*?)</td>"#).unwrap()
});
static ACTUAL_CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<td[^>]*id="eventActual_[^"]*"[^>]*>(.*?)</td>"#).unwrap()
});
static FORECAST_CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<td[^>]*id="eventForecast_[^"]*"[^>]*>(.*?)</td>"#).unwrap()
});
static PREVIOUS_CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<td[^>]*id="eventPrevious_[^"]*"[^>]*>(.*?)</td>"#).unwrap()
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EconomicEvent {
    pub id: String,
    pub timestamp: i64,
    pub event: String,
    pub actual: String,
    pub forecast: String,
    pub previous: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventField {
    Name,
    Actual,
    Forecast,
    Previous,
}

/// Seam between row classification and field extraction. The regex
/// implementation below matches the origin's irregular fragments; a
/// structural parser can be swapped in here without touching row
/// classification or pagination.
pub trait FieldExtractor {
    fn extract_field(&self, row: &str, field: EventField) -> Option<String>;
}

pub struct RegexFieldExtractor;

impl FieldExtractor for RegexFieldExtractor {
    fn extract_field(&self, row: &str, field: EventField) -> Option<String> {
        let cell_re = match field {
            EventField::Name => &EVENT_NAME_CELL_RE,
            EventField::Actual => &ACTUAL_CELL_RE,
            EventField::Forecast => &FORECAST_CELL_RE,
            EventField::Previous => &PREVIOUS_CELL_RE,
        };
        cell_re
            .captures(row)
            .and_then(|caps| caps.get(1))
            .map(|cell| strip_tags(cell.as_str()))
    }
}

/// The identifier of the last event row appearing in a page's markup,
/// used by the pagination termination rule.
pub(crate) fn last_event_row_id(page_html: &str) -> Option<String> {
    EVENT_ROW_TOKEN_RE
        .captures_iter(page_html)
        .last()
        .map(|caps| caps[1].to_string())
}

/// Parse the combined calendar markup into an ordered event sequence.
///
/// Rows are delimited by `</tr>`. Date-marker rows update the carried
/// day context and emit nothing; event rows emit one record each,
/// inheriting the day context when they carry no explicit datetime.
/// Rows matching neither shape are skipped. The day context is threaded
/// through the fold as an explicit accumulator, so the parser works on
/// arbitrary row subsets.
pub fn parse_economic_calendar(
    html: &str,
    fields: &impl FieldExtractor,
) -> Vec<EconomicEvent> {
    let (events, _) = html.split("</tr>").fold(
        (Vec::new(), None::<i64>),
        |(mut events, mut current_day), row| {
            if row.contains("theDay") {
                if let Some(day) = day_marker_timestamp(row) {
                    current_day = Some(day);
                }
                return (events, current_day);
            }

            // Rows whose identifier cannot be captured are treated as
            // noise; every emitted event has a non-empty id.
            let Some(id) = EVENT_ROW_ATTR_RE
                .captures(row)
                .map(|caps| caps[1].to_string())
            else {
                return (events, current_day);
            };

            // All-day events carry no datetime attribute and fall back
            // to the day marker's UTC midnight. Zero means no day
            // context had been seen yet.
            let timestamp = explicit_event_timestamp(row)
                .or(current_day)
                .unwrap_or(0);

            events.push(EconomicEvent {
                id,
                timestamp,
                event: fields
                    .extract_field(row, EventField::Name)
                    .unwrap_or_default(),
                actual: fields
                    .extract_field(row, EventField::Actual)
                    .unwrap_or_default(),
                forecast: fields
                    .extract_field(row, EventField::Forecast)
                    .unwrap_or_default(),
                previous: fields
                    .extract_field(row, EventField::Previous)
                    .unwrap_or_default(),
            });
            (events, current_day)
        },
    );
    events
}

fn day_marker_timestamp(row: &str) -> Option<i64> {
    DAY_MARKER_RE
        .captures(row)
        .and_then(|caps| caps[1].parse::<i64>().ok())
}

/// `data-event-datetime` values look like `2024/12/25 13:30:00` and are
/// already UTC because the fetch pins `timeZone=0`.
fn explicit_event_timestamp(row: &str) -> Option<i64> {
    let raw = EVENT_DATETIME_RE.captures(row)?.get(1)?.as_str();
    let normalized = raw.replace('/', "-");
    let parsed = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M"))
        .ok()?;
    Some(parsed.and_utc().timestamp())
}
