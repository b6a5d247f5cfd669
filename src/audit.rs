//! Frequency counts used to explore an extract before deciding on cleaning rules.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::BufRead;
use std::sync::OnceLock;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;

use crate::data::{RawElement, ReferenceTables};
use crate::errors::Result;

pub type Counts = HashMap<String, usize>;

fn bump(counts: &mut Counts, key: &str) {
    *counts.entry(key.to_string()).or_insert(0) += 1;
}

/// Occurrences of every element name in the document, at any depth.
pub fn element_counts<R: BufRead>(mut reader: Reader<R>) -> Result<Counts> {
    let mut counts = Counts::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) => {
                bump(&mut counts, &String::from_utf8_lossy(e.name().as_ref()));
            },
            _ => (),
        }
        buf.clear();
    }
    Ok(counts)
}

/// Run `f` over the tags of every node and way.
fn for_each_tag<I, F>(elements: I, mut f: F) -> Result<()>
where
    I: IntoIterator<Item = Result<RawElement>>,
    F: FnMut(&str, &str),
{
    for element in elements {
        let element = element?;
        if element.kind.is_primitive() {
            for (key, value) in element.tags() {
                f(key, value);
            }
        }
    }
    Ok(())
}

/// How often each tag key is used by nodes and ways.
pub fn key_counts<I>(elements: I) -> Result<Counts>
where
    I: IntoIterator<Item = Result<RawElement>>,
{
    let mut counts = Counts::new();
    for_each_tag(elements, |key, _| bump(&mut counts, key.trim()))?;
    Ok(counts)
}

/// How often each value of `key` is used by nodes and ways.
pub fn value_counts<I>(elements: I, key: &str) -> Result<Counts>
where
    I: IntoIterator<Item = Result<RawElement>>,
{
    let mut counts = Counts::new();
    for_each_tag(elements, |k, v| if k == key { bump(&mut counts, v) })?;
    Ok(counts)
}

/// `addr:city` values with no entry in the postcode table, with their number of uses.
pub fn unmatched_cities<I>(elements: I, tables: &ReferenceTables) -> Result<Counts>
where
    I: IntoIterator<Item = Result<RawElement>>,
{
    let mut counts = Counts::new();
    for_each_tag(elements, |key, city| {
        if key == "addr:city" && tables.postcode(city).is_none() {
            bump(&mut counts, city);
        }
    })?;
    Ok(counts)
}

/// Counts sorted from least to most frequent, ties by name.
pub fn by_frequency(counts: &Counts) -> Vec<(&str, usize)> {
    let mut sorted: Vec<_> = counts.iter().map(|(key, count)| (key.as_str(), *count)).collect();
    sorted.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    sorted
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreetTypePosition {
    /// `Upper Leeson Street` -> `Upper`
    Front,
    /// `Upper Leeson Street` -> `Street`
    Back,
}

fn street_type_regex(position: StreetTypePosition) -> &'static Regex {
    static FRONT: OnceLock<Regex> = OnceLock::new();
    static BACK: OnceLock<Regex> = OnceLock::new();
    match position {
        StreetTypePosition::Front => FRONT.get_or_init(|| {
            Regex::new(r"(?i)^\S+\.?\b").expect("street type pattern is valid")
        }),
        StreetTypePosition::Back => BACK.get_or_init(|| {
            Regex::new(r"(?i)\b\S+\.?$").expect("street type pattern is valid")
        }),
    }
}

/// Group street names by their first or last word.
pub fn street_types<'a, I>(streets: I, position: StreetTypePosition) -> BTreeMap<String, BTreeSet<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let regex = street_type_regex(position);
    let mut types: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for street in streets {
        if let Some(m) = regex.find(street) {
            types.entry(m.as_str().to_string()).or_default().insert(street.to_string());
        }
    }
    types
}
