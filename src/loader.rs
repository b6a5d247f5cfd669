//! Builds the [`ReferenceTables`] from the raw reference sources: the An Post delivery zone
//! page (saved as HTML) and the satellite town list (JSON).

use std::collections::HashMap;
use std::io::Read;
use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::data::ReferenceTables;
use crate::errors::Result;
use crate::html::{inner_after_open_tag, split_br, strip_tags, tag_blocks_ci};

/// Entries the delivery zone page gets wrong or leaves out.
const POSTCODE_OVERRIDES: [(&str, &str); 3] = [
    ("Dublin 6W", "D6W"),
    ("Blanchardstown", "D15"),
    ("Rathmines", "D6"),
];

const NUMBERED_DISTRICTS: std::ops::RangeInclusive<u32> = 1..=24;

fn postcode_format() -> &'static Regex {
    static INSTANCE: OnceLock<Regex> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        Regex::new(r"D[0-9]{1,2}W?\.[0-9]").expect("postcode pattern is valid")
    })
}

/// Place names listed in a table cell, separated by line breaks, commas or slashes.
fn place_names(cell: &str) -> Vec<String> {
    split_br(cell)
        .into_iter()
        .map(strip_tags)
        .flat_map(|line| {
            let separator = if line.contains(',') { ',' } else { '/' };
            line.split(separator)
                .map(|place| place.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|place| !place.is_empty())
        .collect()
}

/// Place name to postal district, as listed in the second table of the delivery zone page.
///
/// The header row is skipped. Rows whose second cell has no delivery zone code
/// (`D6W.1`, `D15.3`, ...) are ignored. The district is the part of the code before the dot,
/// and the places are taken from the second-to-last cell.
pub fn parse_postal_districts(html: &str) -> Result<HashMap<String, String>> {
    let tables = tag_blocks_ci(html, "<table", "</table>");
    let table = tables.get(1).ok_or("Postal district page has fewer than two tables")?;

    let mut postcodes = HashMap::new();
    for row in tag_blocks_ci(table, "<tr", "</tr>").into_iter().skip(1) {
        let cells: Vec<&str> = tag_blocks_ci(row, "<td", "</td>")
            .into_iter()
            .map(inner_after_open_tag)
            .collect();
        if cells.len() < 2 {
            continue;
        }
        let code_text = strip_tags(cells[1]);
        let Some(code) = postcode_format().find(&code_text) else {
            debug!(cell = code_text.as_str(); "Row without delivery zone code");
            continue;
        };
        let postcode = code.as_str().split('.').next().unwrap_or_default();
        for place in place_names(cells[cells.len() - 2]) {
            postcodes.insert(place, postcode.to_string());
        }
    }
    Ok(postcodes)
}

/// `Dublin 1` to `Dublin 24` plus hand-checked entries, overwriting whatever was scraped.
pub fn add_postcode_overrides(postcodes: &mut HashMap<String, String>) {
    for district in NUMBERED_DISTRICTS {
        postcodes.insert(format!("Dublin {}", district), format!("D{}", district));
    }
    for (place, postcode) in POSTCODE_OVERRIDES {
        postcodes.insert(place.to_string(), postcode.to_string());
    }
}

/// Postcode table for the reconciler: the scraped page with overrides applied.
pub fn postcode_table(html: &str) -> Result<HashMap<String, String>> {
    let mut postcodes = parse_postal_districts(html)?;
    add_postcode_overrides(&mut postcodes);
    Ok(postcodes)
}

/// Merge a list of single-key `{"town": "county"}` objects. Later entries win.
pub fn merge_towns(entries: Vec<HashMap<String, String>>) -> HashMap<String, String> {
    entries.into_iter().flatten().collect()
}

pub fn load_towns<R: Read>(reader: R) -> Result<HashMap<String, String>> {
    let entries: Vec<HashMap<String, String>> = serde_json::from_reader(reader)?;
    Ok(merge_towns(entries))
}

pub fn reference_tables<R: Read>(postal_districts_html: &str, towns_json: R) -> Result<ReferenceTables> {
    Ok(ReferenceTables::new(
        postcode_table(postal_districts_html)?,
        load_towns(towns_json)?,
    ))
}
