use serde::Serialize;

use crate::{
    building_parser::BuildingSearchResult,
    building_scraper::BuildingQuery,
    calendar_parser::EconomicEvent,
    calendar_scraper::CalendarQuery,
    scrape_error::ScrapeError,
};

/// Envelope for calendar results. Zero events is a success, not an
/// error.
#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub success: bool,
    pub count: usize,
    pub from_date: String,
    pub to_date: String,
    pub timezone: String,
    pub events: Vec<EconomicEvent>,
}

impl CalendarResponse {
    pub fn new(query: &CalendarQuery, events: Vec<EconomicEvent>) -> Self {
        CalendarResponse {
            success: true,
            count: events.len(),
            from_date: query.from_date.clone(),
            to_date: query.to_date.clone(),
            // The fetch pins the origin to timeZone=0.
            timezone: "GMT".to_string(),
            events,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BuildingSearchResponse {
    pub success: bool,
    pub query: String,
    pub lang: String,
    pub session_id: f64,
    pub count: usize,
    pub buildings: Vec<BuildingSearchResult>,
}

impl BuildingSearchResponse {
    pub fn new(query: &BuildingQuery, buildings: Vec<BuildingSearchResult>) -> Self {
        BuildingSearchResponse {
            success: true,
            query: query.building.clone(),
            lang: query.lang.code().to_string(),
            session_id: query.sid,
            count: buildings.len(),
            buildings,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&ScrapeError> for ErrorResponse {
    fn from(err: &ScrapeError) -> Self {
        match err {
            ScrapeError::Validation(details) => ErrorResponse {
                error: details.clone(),
                details: None,
            },
            ScrapeError::Network(details) => ErrorResponse {
                error: "Failed to fetch upstream data".to_string(),
                details: Some(details.clone()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_calendar_result_serializes_as_success() {
        let query = CalendarQuery::parse("01/12/2024", "31/12/2024").unwrap();
        let body = serde_json::to_value(CalendarResponse::new(&query, vec![])).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 0);
        assert_eq!(body["timezone"], "GMT");
        assert_eq!(body["from_date"], "01/12/2024");
        assert!(body["events"].as_array().unwrap().is_empty());
    }

    #[test]
    fn building_response_echoes_query_and_session() {
        let query = BuildingQuery::parse("Wing On", "zh_TW", 0.25).unwrap();
        let body = serde_json::to_value(BuildingSearchResponse::new(&query, vec![])).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["query"], "Wing On");
        assert_eq!(body["lang"], "zh_TW");
        assert_eq!(body["session_id"], 0.25);
        assert_eq!(body["count"], 0);
    }

    #[test]
    fn validation_errors_surface_their_detail_directly() {
        let err = ScrapeError::Validation("Invalid date format. Use DD/MM/YYYY".to_string());
        let body = serde_json::to_value(ErrorResponse::from(&err)).unwrap();
        assert_eq!(body["error"], "Invalid date format. Use DD/MM/YYYY");
        assert!(body.get("details").is_none());
    }
}
