use dotenv::dotenv;
use huntsman::{
    BuildingQuery, BuildingSearchResponse, BuildingSearchScraper, CalendarQuery,
    CalendarResponse, CalendarScraper, ErrorResponse, ScrapeError, ScrapingContext, UsageRecord,
    send_usage_record,
};
use std::env;

extern crate env_logger;
extern crate log;

use log::LevelFilter;

use log::error;

async fn run_calendar_job(
    ctx: &ScrapingContext,
    from_date: &str,
    to_date: &str,
) -> Result<String, ScrapeError> {
    let query = CalendarQuery::parse(from_date, to_date)?;
    let events = CalendarScraper::new(query.clone()).scrape(ctx).await?;
    let body = CalendarResponse::new(&query, events);
    Ok(serde_json::to_string_pretty(&body).expect("calendar response is serializable"))
}

async fn run_building_search_job(
    ctx: &ScrapingContext,
    building: &str,
    lang: &str,
) -> Result<String, ScrapeError> {
    // The search endpoint wants a fresh random session token per call.
    let sid = rand::random::<f64>();
    let query = BuildingQuery::parse(building, lang, sid)?;
    let results = BuildingSearchScraper::new(query.clone()).scrape(ctx).await?;

    let record = UsageRecord::building_search(&query, results.len());
    send_usage_record(ctx, &record).await;

    let body = BuildingSearchResponse::new(&query, results);
    Ok(serde_json::to_string_pretty(&body).expect("building response is serializable"))
}

fn print_usage() {
    eprintln!("usage: huntsman calendar <from_date> <to_date>   (dates as DD/MM/YYYY)");
    eprintln!("       huntsman buildings <query> [en_US|zh_TW]");
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();

    let ctx = match ScrapingContext::new() {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("could not initialise scraping context: {e}");
            std::process::exit(1);
        }
    };

    let outcome = match args.get(1).map(String::as_str) {
        Some("calendar") if args.len() >= 4 => {
            run_calendar_job(&ctx, &args[2], &args[3]).await
        }
        Some("buildings") if args.len() >= 3 => {
            let lang = args.get(3).map(String::as_str).unwrap_or("en_US");
            run_building_search_job(&ctx, &args[2], lang).await
        }
        _ => {
            print_usage();
            std::process::exit(2);
        }
    };

    match outcome {
        Ok(body) => println!("{body}"),
        Err(err) => {
            error!("{err}");
            let body = ErrorResponse::from(&err);
            println!(
                "{}",
                serde_json::to_string_pretty(&body).expect("error response is serializable")
            );
            std::process::exit(1);
        }
    }
}
