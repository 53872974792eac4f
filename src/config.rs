use anyhow::Context;
use serde::{Deserialize, de::DeserializeOwned};

const DEFAULT_CALENDAR_BASE_URL: &str = "https://www.investing.com";
const DEFAULT_BUILDING_SEARCH_BASE_URL: &str =
    "https://webapp.hongkongpost.hk/correct_addressing";

/// The env vars the scraper reads. Every knob is optional; the defaults
/// point at the live origins. Overriding the base URLs is mainly useful
/// for pointing a test run at a local fixture server.
#[derive(Debug, Deserialize)]
struct ScrapingEnv {
    calendar_base_url: Option<String>,
    building_search_base_url: Option<String>,
    usage_log_url: Option<String>,
}

pub struct ScrapingConfig {
    calendar_base_url: String,
    building_search_base_url: String,
    usage_log_url: Option<String>,
}

impl ScrapingConfig {
    pub fn new() -> anyhow::Result<Self> {
        let scraping_env = ScrapingEnv::load_from_env()?;
        Ok(Self {
            calendar_base_url: scraping_env
                .calendar_base_url
                .unwrap_or_else(|| DEFAULT_CALENDAR_BASE_URL.to_string()),
            building_search_base_url: scraping_env
                .building_search_base_url
                .unwrap_or_else(|| DEFAULT_BUILDING_SEARCH_BASE_URL.to_string()),
            usage_log_url: scraping_env.usage_log_url,
        })
    }

    /// Origin header value for the filter endpoint's POST requests.
    pub fn calendar_origin(&self) -> &str {
        &self.calendar_base_url
    }

    /// The listing page that hands out the session cookie.
    pub fn calendar_listing_url(&self) -> String {
        format!("{}/economic-calendar/", self.calendar_base_url)
    }

    /// The paginated filter endpoint behind the listing page.
    pub fn calendar_service_url(&self) -> String {
        format!(
            "{}/economic-calendar/Service/getCalendarFilteredData",
            self.calendar_base_url
        )
    }

    pub fn building_index_url(&self, language_code: &str) -> String {
        format!(
            "{}/index.jsp?lang1={}",
            self.building_search_base_url, language_code
        )
    }

    pub fn building_search_url(&self) -> String {
        format!("{}/GetBuildingAddr.jsp", self.building_search_base_url)
    }

    pub fn usage_log_url(&self) -> Option<&str> {
        self.usage_log_url.as_deref()
    }
}

// Extension trait.
pub trait LoadFromEnv: DeserializeOwned {
    fn load_from_env() -> anyhow::Result<Self> {
        // Don't throw an error if .env file doesn't exist.
        let _ = dotenv::dotenv();
        let config =
            envy::from_env::<Self>().context("failed to load env variables into config struct")?;
        Ok(config)
    }
}

impl<T: DeserializeOwned> LoadFromEnv for T {}
