use log::info;
use reqwest::header;

use crate::{
    building_parser::{BuildingSearchResult, parse_building_results},
    scrape_error::ScrapeError,
    scraping_context::ScrapingContext,
};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLanguage {
    EnUs,
    ZhTw,
}

impl SearchLanguage {
    pub fn parse(code: &str) -> Result<Self, ScrapeError> {
        match code {
            "en_US" => Ok(SearchLanguage::EnUs),
            "zh_TW" => Ok(SearchLanguage::ZhTw),
            _ => Err(ScrapeError::Validation(
                "Invalid language. Use en_US or zh_TW".to_string(),
            )),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            SearchLanguage::EnUs => "en_US",
            SearchLanguage::ZhTw => "zh_TW",
        }
    }

    // The search endpoint wants the language twice, once as a code and
    // once as this boolean.
    fn iseng(&self) -> &'static str {
        match self {
            SearchLanguage::EnUs => "true",
            SearchLanguage::ZhTw => "false",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildingQuery {
    pub building: String,
    pub lang: SearchLanguage,
    /// Per-call random session token, generated by the caller.
    pub sid: f64,
}

impl BuildingQuery {
    pub fn parse(building: &str, lang: &str, sid: f64) -> Result<Self, ScrapeError> {
        if building.trim().is_empty() {
            return Err(ScrapeError::Validation(
                "Missing required parameter: query".to_string(),
            ));
        }
        Ok(BuildingQuery {
            building: building.to_string(),
            lang: SearchLanguage::parse(lang)?,
            sid,
        })
    }
}

/// Single-shot search against the postal origin: prime a session via the
/// index page (body discarded), then issue one fixed-paging search GET.
/// Unlike the calendar pipeline there is no pagination loop, and both
/// network calls are terminal on failure.
pub struct BuildingSearchScraper {
    pub query: BuildingQuery,
}

impl BuildingSearchScraper {
    pub fn new(query: BuildingQuery) -> Self {
        BuildingSearchScraper { query }
    }

    pub async fn scrape(
        &self,
        ctx: &ScrapingContext,
    ) -> Result<Vec<BuildingSearchResult>, ScrapeError> {
        let index_url = ctx
            .scraping_config
            .building_index_url(self.query.lang.code());

        let priming = ctx
            .request_client
            .client()
            .get(&index_url)
            .header(header::USER_AGENT, BROWSER_USER_AGENT)
            .header(header::ACCEPT, "*/*")
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(header::CONNECTION, "keep-alive");
        ctx.request_client
            .send(priming)
            .await
            .map_err(|e| ScrapeError::Network(format!("building priming request failed: {e}")))?;

        let sid = self.query.sid.to_string();
        let request = ctx
            .request_client
            .client()
            .get(ctx.scraping_config.building_search_url())
            .query(&[
                ("building", self.query.building.as_str()),
                ("iseng", self.query.lang.iseng()),
                ("lang1", self.query.lang.code()),
                ("n", "50"),
                ("a", "1"),
                ("currpage", "1"),
                ("sid", sid.as_str()),
            ])
            .header(header::USER_AGENT, BROWSER_USER_AGENT)
            .header(header::ACCEPT, "*/*")
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(header::CONNECTION, "keep-alive")
            .header(header::REFERER, &index_url);

        let response = ctx
            .request_client
            .send(request)
            .await
            .map_err(|e| ScrapeError::Network(format!("building search request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(ScrapeError::Network(format!(
                "building search returned {}",
                response.status()
            )));
        }

        let html = response.text().await.map_err(ScrapeError::from)?;
        let results = parse_building_results(&html);
        info!(
            "building search for {:?} produced {} results",
            self.query.building,
            results.len()
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_fails_validation() {
        let err = BuildingQuery::parse("  ", "en_US", 0.5).unwrap_err();
        assert!(matches!(err, ScrapeError::Validation(_)));
    }

    #[test]
    fn unknown_language_fails_validation() {
        let err = BuildingQuery::parse("Wing On", "fr_FR", 0.5).unwrap_err();
        assert!(matches!(err, ScrapeError::Validation(_)));
    }

    #[test]
    fn languages_map_to_origin_codes() {
        assert_eq!(SearchLanguage::parse("en_US").unwrap().iseng(), "true");
        assert_eq!(SearchLanguage::parse("zh_TW").unwrap().iseng(), "false");
        assert_eq!(SearchLanguage::ZhTw.code(), "zh_TW");
    }
}
