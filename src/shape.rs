pub mod classify;
pub mod reconcile;

use std::collections::BTreeMap;

use log::debug;

use crate::data::{Child, Created, ElementKind, PrimitiveType, RawElement, ReferenceTables, ShapedRecord};
use crate::data::record::STRUCTURAL_KEYS;
use crate::errors::{Error, Result};

use self::classify::{classify, is_address_key, is_problem_key, TagClass};
use self::reconcile::reconcile;

fn parse_coordinate(element_id: &str, name: &str, value: Option<&str>) -> Result<f64> {
    let context = format!("element {}: attribute {}", element_id, name);
    let value = value.ok_or_else(|| Error::from("missing").context(&context))?;
    let parsed: f64 = value.trim().parse().map_err(|err| Error::from(err).context(&context))?;
    if !parsed.is_finite() {
        return Err(Error::from(format!("non-finite value {:?}", value)).context(&context));
    }
    Ok(parsed)
}

fn created(element: &RawElement) -> Created {
    let get = |name: &str| element.attribute(name).map(str::to_string);
    Created {
        version: get("version"),
        changeset: get("changeset"),
        timestamp: get("timestamp"),
        user: get("user"),
        uid: get("uid"),
    }
}

fn keep_top_level(element_id: &str, key: &str) -> bool {
    if is_problem_key(key) {
        debug!(element_id = element_id, key = key; "Dropping key with problem characters");
        return false;
    }
    if STRUCTURAL_KEYS.contains(&key) {
        debug!(element_id = element_id, key = key; "Dropping tag shadowing a record field");
        return false;
    }
    !is_address_key(key)
}

/// Shape one element into a record. Elements other than nodes and ways yield `None`.
///
/// Fails when the element has no `id`, or when it has a `lat` attribute and either
/// coordinate does not parse as a finite number.
pub fn shape_element(element: &RawElement, tables: &ReferenceTables) -> Result<Option<ShapedRecord>> {
    let element_type = match element.kind {
        ElementKind::Node => PrimitiveType::Node,
        ElementKind::Way => PrimitiveType::Way,
        ElementKind::Other(_) => return Ok(None),
    };

    let id = element.attribute("id").ok_or("node or way without id")?;

    let pos = match element.attribute("lat") {
        Some(lat) => Some([
            parse_coordinate(id, "lat", Some(lat))?,
            parse_coordinate(id, "lon", element.attribute("lon"))?,
        ]),
        None => None,
    };

    let mut tags: BTreeMap<String, String> = BTreeMap::new();
    let mut address: BTreeMap<String, String> = BTreeMap::new();
    let mut node_refs: Vec<String> = Vec::new();

    for child in &element.children {
        match child {
            Child::Tag { key, value } => match classify(key) {
                TagClass::Ignored => (),
                TagClass::Address(field) if is_problem_key(field) => {
                    debug!(element_id = id, key = key.as_str(); "Dropping address key with problem characters");
                },
                TagClass::Address(field) => address.extend(reconcile(field, value, tables)),
                TagClass::Ordinary => {
                    tags.insert(key.clone(), value.clone());
                },
            },
            Child::NodeRef(node_ref) => node_refs.push(node_ref.clone()),
        }
    }

    tags.retain(|key, _| keep_top_level(id, key));

    Ok(Some(ShapedRecord {
        id: id.to_string(),
        element_type,
        visible: element.attribute("visible").map(str::to_string),
        pos,
        created: created(element),
        address,
        node_refs,
        tags,
    }))
}
