use std::sync::LazyLock;

use chrono::NaiveDate;
use log::{info, warn};
use regex::Regex;
use reqwest::header;
use serde::Deserialize;

use crate::{
    calendar_parser::{EconomicEvent, RegexFieldExtractor, last_event_row_id, parse_economic_calendar},
    scrape_error::ScrapeError,
    scraping_context::ScrapingContext,
};

/// Hard ceiling on page requests. The origin never reports a total, so
/// this is the only bound when the repetition heuristic can't fire.
pub const MAX_CALENDAR_PAGES: u32 = 200;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

static INPUT_DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").unwrap());

/// A validated calendar date range. `from_date`/`to_date` keep the
/// caller's `DD/MM/YYYY` form for echoing back; the origin-form fields
/// are what the filter endpoint expects.
#[derive(Debug, Clone)]
pub struct CalendarQuery {
    pub from_date: String,
    pub to_date: String,
    pub(crate) date_from: String,
    pub(crate) date_to: String,
}

impl CalendarQuery {
    pub fn parse(from_date: &str, to_date: &str) -> Result<Self, ScrapeError> {
        let date_from = convert_input_date(from_date)?;
        let date_to = convert_input_date(to_date)?;
        Ok(CalendarQuery {
            from_date: from_date.to_string(),
            to_date: to_date.to_string(),
            date_from,
            date_to,
        })
    }
}

fn convert_input_date(input: &str) -> Result<String, ScrapeError> {
    if !INPUT_DATE_SHAPE.is_match(input) {
        return Err(ScrapeError::Validation(
            "Invalid date format. Use DD/MM/YYYY".to_string(),
        ));
    }
    let parsed = NaiveDate::parse_from_str(input, "%d/%m/%Y").map_err(|_| {
        ScrapeError::Validation(format!("{input} is not a real calendar date"))
    })?;
    Ok(parsed.format("%Y-%m-%d").to_string())
}

/// One decoded page of the filter endpoint's JSON envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarPage {
    pub data: Option<String>,
    pub rows_num: Option<u64>,
}

/// Seam between the page loop and HTTP, so the termination behavior can
/// be driven by an in-memory double.
#[allow(async_fn_in_trait)]
pub trait CalendarPageSource {
    async fn fetch_page(&mut self, page: u32) -> anyhow::Result<CalendarPage>;
}

#[derive(Debug, PartialEq, Eq)]
enum PageVerdict {
    Continue,
    Stop,
}

/// Inferred-progress cursor for an origin with no total-count contract.
/// Page 0 records its last row identifier unconditionally; every later
/// page stops the loop when the identifier is missing or repeats the
/// previous page's (the origin serves repeated content past the end).
/// An explicit `rows_num` of zero is a stronger stop signal and wins
/// regardless of page index.
struct PaginationCursor {
    page: u32,
    last_seen_row_id: Option<String>,
}

impl PaginationCursor {
    fn new() -> Self {
        PaginationCursor {
            page: 0,
            last_seen_row_id: None,
        }
    }

    fn observe(&mut self, page_html: &str, rows_num: Option<u64>) -> PageVerdict {
        let page_last_id = last_event_row_id(page_html);

        let verdict = if self.page == 0 {
            self.last_seen_row_id = page_last_id;
            PageVerdict::Continue
        } else {
            match page_last_id {
                None => PageVerdict::Stop,
                Some(id) if self.last_seen_row_id.as_deref() == Some(id.as_str()) => {
                    PageVerdict::Stop
                }
                Some(id) => {
                    self.last_seen_row_id = Some(id);
                    PageVerdict::Continue
                }
            }
        };
        self.page += 1;

        if rows_num == Some(0) {
            return PageVerdict::Stop;
        }
        verdict
    }
}

/// Drive a page source until the cursor stops it, the source fails, or
/// the page cap is reached, concatenating every page's markup. A failed
/// or empty page is a final truncation, not an error; whatever was
/// assembled before it is returned.
pub async fn assemble_calendar_pages<S: CalendarPageSource>(source: &mut S) -> String {
    let mut combined_html = String::new();
    let mut cursor = PaginationCursor::new();

    for page in 0..MAX_CALENDAR_PAGES {
        let payload = match source.fetch_page(page).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!("calendar page {page} failed, truncating to what was assembled: {e}");
                break;
            }
        };
        let Some(page_html) = payload.data.filter(|html| !html.is_empty()) else {
            break;
        };

        combined_html.push_str(&page_html);

        if cursor.observe(&page_html, payload.rows_num) == PageVerdict::Stop {
            break;
        }
    }

    combined_html
}

/// Live page source: primes a session against the listing page, then
/// POSTs the filter endpoint with the fixed high-importance/UTC filter
/// and an incrementing `limit_from` cursor.
pub struct HttpCalendarPageSource<'a> {
    ctx: &'a ScrapingContext,
    query: CalendarQuery,
    session_cookie: String,
}

impl<'a> HttpCalendarPageSource<'a> {
    /// The priming request is the one network call whose failure is
    /// terminal. A response without `Set-Cookie` is fine; we proceed
    /// with an empty cookie like a fresh browser would.
    pub async fn prime(
        ctx: &'a ScrapingContext,
        query: CalendarQuery,
    ) -> Result<HttpCalendarPageSource<'a>, ScrapeError> {
        let listing_url = ctx.scraping_config.calendar_listing_url();
        let request = ctx
            .request_client
            .client()
            .get(&listing_url)
            .header(header::USER_AGENT, BROWSER_USER_AGENT)
            .header(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            )
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(header::CACHE_CONTROL, "no-cache");

        let response = ctx
            .request_client
            .send(request)
            .await
            .map_err(|e| ScrapeError::Network(format!("calendar priming request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(ScrapeError::Network(format!(
                "calendar listing page returned {}",
                response.status()
            )));
        }

        let session_cookie = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join("; ");
        info!("calendar session primed (cookie captured: {})", !session_cookie.is_empty());

        Ok(HttpCalendarPageSource {
            ctx,
            query,
            session_cookie,
        })
    }
}

impl CalendarPageSource for HttpCalendarPageSource<'_> {
    async fn fetch_page(&mut self, page: u32) -> anyhow::Result<CalendarPage> {
        let limit_from = page.to_string();
        let form: [(&str, &str); 9] = [
            ("country[]", "5"),
            ("importance[]", "3"),
            ("timeZone", "0"),
            ("timeFilter", "timeRemain"),
            ("currentTab", "custom"),
            ("submitFilters", "1"),
            ("limit_from", limit_from.as_str()),
            ("dateFrom", self.query.date_from.as_str()),
            ("dateTo", self.query.date_to.as_str()),
        ];

        let request = self
            .ctx
            .request_client
            .client()
            .post(self.ctx.scraping_config.calendar_service_url())
            .header(header::USER_AGENT, BROWSER_USER_AGENT)
            .header("X-Requested-With", "XMLHttpRequest")
            .header(header::ACCEPT, "application/json, text/javascript, */*; q=0.01")
            .header(header::REFERER, self.ctx.scraping_config.calendar_listing_url())
            .header(header::ORIGIN, self.ctx.scraping_config.calendar_origin())
            .header(header::COOKIE, self.session_cookie.as_str())
            .form(&form);

        let response = self.ctx.request_client.send(request).await?;
        if !response.status().is_success() {
            anyhow::bail!("calendar page request returned {}", response.status());
        }
        Ok(response.json::<CalendarPage>().await?)
    }
}

pub struct CalendarScraper {
    pub query: CalendarQuery,
}

impl CalendarScraper {
    pub fn new(query: CalendarQuery) -> Self {
        CalendarScraper { query }
    }

    pub async fn scrape(
        &self,
        ctx: &ScrapingContext,
    ) -> Result<Vec<EconomicEvent>, ScrapeError> {
        let mut source = HttpCalendarPageSource::prime(ctx, self.query.clone()).await?;
        let combined_html = assemble_calendar_pages(&mut source).await;
        let events = parse_economic_calendar(&combined_html, &RegexFieldExtractor);
        info!(
            "calendar scrape for {}..{} produced {} events",
            self.query.from_date,
            self.query.to_date,
            events.len()
        );
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_ids(ids: &[u64]) -> CalendarPage {
        let html: String = ids
            .iter()
            .map(|id| format!(r#"<tr id="eventRowId_{id}"><td class="event">x</td></tr>"#))
            .collect();
        CalendarPage {
            data: Some(html),
            rows_num: Some(ids.len() as u64),
        }
    }

    /// Serves a fixed script of pages and counts how many were asked for.
    struct ScriptedSource {
        pages: Vec<CalendarPage>,
        calls: u32,
    }

    impl ScriptedSource {
        fn new(pages: Vec<CalendarPage>) -> Self {
            ScriptedSource { pages, calls: 0 }
        }
    }

    impl CalendarPageSource for ScriptedSource {
        async fn fetch_page(&mut self, page: u32) -> anyhow::Result<CalendarPage> {
            self.calls += 1;
            match self.pages.get(page as usize) {
                Some(p) => Ok(p.clone()),
                None => anyhow::bail!("no page scripted for index {page}"),
            }
        }
    }

    /// Always answers with fresh identifiers, so only the cap stops it.
    struct EndlessSource {
        calls: u32,
    }

    impl CalendarPageSource for EndlessSource {
        async fn fetch_page(&mut self, page: u32) -> anyhow::Result<CalendarPage> {
            self.calls += 1;
            Ok(page_with_ids(&[u64::from(page) + 1]))
        }
    }

    #[tokio::test]
    async fn repeated_last_id_stops_after_the_repeating_page() {
        let mut source = ScriptedSource::new(vec![
            page_with_ids(&[1, 2, 3]),
            page_with_ids(&[1, 2, 3]),
            page_with_ids(&[7, 8, 9]),
        ]);
        let combined = assemble_calendar_pages(&mut source).await;
        // Page 2's markup is still appended; page 3 is never requested.
        assert_eq!(source.calls, 2);
        assert_eq!(combined.matches("eventRowId_3").count(), 2);
        assert!(!combined.contains("eventRowId_7"));
    }

    #[tokio::test]
    async fn distinct_ids_keep_paginating() {
        let mut source = ScriptedSource::new(vec![
            page_with_ids(&[1, 2]),
            page_with_ids(&[3, 4]),
            page_with_ids(&[5, 6]),
        ]);
        let combined = assemble_calendar_pages(&mut source).await;
        // All three pages land, then the out-of-script failure truncates.
        assert_eq!(source.calls, 4);
        assert!(combined.contains("eventRowId_6"));
    }

    #[tokio::test]
    async fn page_without_identifiers_after_page_zero_stops() {
        let mut source = ScriptedSource::new(vec![
            page_with_ids(&[1]),
            CalendarPage {
                data: Some("<tr><td>filler with no rows</td></tr>".to_string()),
                rows_num: None,
            },
            page_with_ids(&[2]),
        ]);
        let combined = assemble_calendar_pages(&mut source).await;
        assert_eq!(source.calls, 2);
        // The unidentifiable page is still part of the buffer.
        assert!(combined.contains("filler"));
    }

    #[tokio::test]
    async fn page_zero_without_identifiers_does_not_stop() {
        let mut source = ScriptedSource::new(vec![
            CalendarPage {
                data: Some("<tr><td>header only</td></tr>".to_string()),
                rows_num: None,
            },
            page_with_ids(&[5]),
        ]);
        let _ = assemble_calendar_pages(&mut source).await;
        // Page 0 records unconditionally, even a missing id; pagination
        // continues and stops on the scripted exhaustion afterwards.
        assert_eq!(source.calls, 3);
    }

    #[tokio::test]
    async fn zero_rows_num_stops_immediately_even_on_page_zero() {
        let mut source = ScriptedSource::new(vec![
            CalendarPage {
                data: Some(page_with_ids(&[1]).data.unwrap()),
                rows_num: Some(0),
            },
            page_with_ids(&[2]),
        ]);
        let combined = assemble_calendar_pages(&mut source).await;
        assert_eq!(source.calls, 1);
        assert!(combined.contains("eventRowId_1"));
    }

    #[tokio::test]
    async fn missing_markup_body_truncates_without_error() {
        let mut source = ScriptedSource::new(vec![
            page_with_ids(&[1]),
            CalendarPage {
                data: None,
                rows_num: Some(10),
            },
        ]);
        let combined = assemble_calendar_pages(&mut source).await;
        assert_eq!(source.calls, 2);
        assert!(combined.contains("eventRowId_1"));
    }

    #[tokio::test]
    async fn failed_page_returns_what_was_assembled() {
        let mut source = ScriptedSource::new(vec![page_with_ids(&[1, 2])]);
        let combined = assemble_calendar_pages(&mut source).await;
        assert_eq!(source.calls, 2);
        assert!(combined.contains("eventRowId_2"));
    }

    #[tokio::test]
    async fn pagination_never_exceeds_the_page_cap() {
        let mut source = EndlessSource { calls: 0 };
        let _ = assemble_calendar_pages(&mut source).await;
        assert_eq!(source.calls, MAX_CALENDAR_PAGES);
    }

    #[test]
    fn input_dates_convert_to_origin_form() {
        let query = CalendarQuery::parse("01/12/2024", "31/12/2024").unwrap();
        assert_eq!(query.date_from, "2024-12-01");
        assert_eq!(query.date_to, "2024-12-31");
        assert_eq!(query.from_date, "01/12/2024");
    }

    #[test]
    fn malformed_dates_fail_validation_before_any_fetch() {
        // No page source can even be constructed from a bad query, so
        // zero outbound calls is implied by construction.
        let err = CalendarQuery::parse("invalid", "31/12/2024").unwrap_err();
        assert!(matches!(err, ScrapeError::Validation(_)));

        let err = CalendarQuery::parse("2024-12-01", "31/12/2024").unwrap_err();
        assert!(matches!(err, ScrapeError::Validation(_)));
    }

    #[test]
    fn impossible_dates_are_rejected() {
        let err = CalendarQuery::parse("31/02/2024", "31/12/2024").unwrap_err();
        assert!(matches!(err, ScrapeError::Validation(_)));
    }

    #[test]
    fn cursor_updates_last_seen_across_pages() {
        let mut cursor = PaginationCursor::new();
        let first = page_with_ids(&[1, 2]).data.unwrap();
        let second = page_with_ids(&[3]).data.unwrap();
        assert_eq!(cursor.observe(&first, None), PageVerdict::Continue);
        assert_eq!(cursor.last_seen_row_id.as_deref(), Some("2"));
        assert_eq!(cursor.observe(&second, None), PageVerdict::Continue);
        assert_eq!(cursor.last_seen_row_id.as_deref(), Some("3"));
        assert_eq!(cursor.observe(&second, None), PageVerdict::Stop);
    }
}
