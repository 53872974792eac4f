use chrono::Utc;
use log::{info, warn};
use serde::Serialize;

use crate::{building_scraper::BuildingQuery, scraping_context::ScrapingContext};

/// One usage record, posted after a successful building search when a
/// log endpoint is configured.
#[derive(Debug, Serialize)]
pub struct UsageRecord {
    pub timestamp: String,
    pub service: String,
    pub query: String,
    pub lang: String,
    pub session_id: f64,
    pub building_count: usize,
}

impl UsageRecord {
    pub fn building_search(query: &BuildingQuery, building_count: usize) -> Self {
        UsageRecord {
            timestamp: Utc::now().to_rfc3339(),
            service: "building-search".to_string(),
            query: query.building.clone(),
            lang: query.lang.code().to_string(),
            session_id: query.sid,
            building_count,
        }
    }
}

/// Best-effort delivery: failures are logged and never interrupt the
/// main flow. A missing endpoint config disables the call entirely.
pub async fn send_usage_record(ctx: &ScrapingContext, record: &UsageRecord) {
    let Some(url) = ctx.scraping_config.usage_log_url() else {
        return;
    };

    let request = ctx.request_client.client().post(url).json(record);
    match ctx.request_client.send(request).await {
        Ok(response) if response.status().is_success() => {
            info!("usage record sent");
        }
        Ok(response) => {
            warn!("usage record rejected: {}", response.status());
        }
        Err(e) => {
            warn!("usage record failed: {e}");
        }
    }
}
