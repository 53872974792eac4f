mod building_parser;
mod building_scraper;
mod calendar_parser;
mod calendar_scraper;
pub mod config;
mod ratelimit;
pub mod requests;
mod response;
mod scrape_error;
mod scraping_context;
mod text_manipulators;
mod usage_log;

pub use building_parser::{BuildingSearchResult, parse_building_results};
pub use building_scraper::{BuildingQuery, BuildingSearchScraper, SearchLanguage};
pub use calendar_parser::{
    EconomicEvent, EventField, FieldExtractor, RegexFieldExtractor, parse_economic_calendar,
};
pub use calendar_scraper::{
    CalendarPage, CalendarPageSource, CalendarQuery, CalendarScraper, HttpCalendarPageSource,
    MAX_CALENDAR_PAGES, assemble_calendar_pages,
};
pub use response::{BuildingSearchResponse, CalendarResponse, ErrorResponse};
pub use scrape_error::ScrapeError;
pub use scraping_context::ScrapingContext;
pub use usage_log::{UsageRecord, send_usage_record};
