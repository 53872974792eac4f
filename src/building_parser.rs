use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::text_manipulators::{clean_html_light, extract_text};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildingSearchResult {
    pub loc_id: String,
    pub sub_loc_no: String,
    pub district: String,
    pub building_desc: String,
    /// Derived convenience field; reconstructible from `district` and
    /// `building_desc` at any time.
    pub display_text: String,
}

/// Extract building matches from the search response document.
///
/// Each match is a radio control named `buildingaddr` whose value holds
/// a `locId|subLocNo` pair. The enclosing table row supplies the fields:
/// district in the 2nd cell, building description in the 4th. Controls
/// with an unsplittable value, a half-empty pair, or too few cells in
/// their row are skipped, never an error.
pub fn parse_building_results(html: &str) -> Vec<BuildingSearchResult> {
    let document = Html::parse_document(html);
    let radio_selector = Selector::parse(r#"input[type="radio"][name="buildingaddr"]"#).unwrap();
    let cell_selector = Selector::parse("td").unwrap();

    let mut results = Vec::new();
    for radio in document.select(&radio_selector) {
        let Some(value) = radio.value().attr("value") else {
            continue;
        };
        let Some((loc_id, sub_loc_no)) = value.split_once('|') else {
            continue;
        };
        if loc_id.is_empty() || sub_loc_no.is_empty() {
            continue;
        }

        let Some(row) = radio
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "tr")
        else {
            continue;
        };

        let cells: Vec<String> = row.select(&cell_selector).map(extract_text).collect();
        if cells.len() < 4 {
            continue;
        }

        let district = clean_html_light(&cells[1]);
        let building_desc = clean_html_light(&cells[3]);
        let display_text = format!("{} - {}", district, building_desc);
        results.push(BuildingSearchResult {
            loc_id: loc_id.to_string(),
            sub_loc_no: sub_loc_no.to_string(),
            district,
            building_desc,
            display_text,
        });
    }

    results
}
