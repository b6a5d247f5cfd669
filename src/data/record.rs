use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Keys owned by the record layout itself. Tags with these names never reach the top level.
pub const STRUCTURAL_KEYS: [&str; 7] = ["id", "type", "visible", "pos", "created", "address", "node_refs"];

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Node,
    Way,
}

/// Edit metadata of an element. All five keys are always serialized, missing ones as `null`.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Created {
    pub version: Option<String>,
    pub changeset: Option<String>,
    pub timestamp: Option<String>,
    pub user: Option<String>,
    pub uid: Option<String>,
}

/// A node or way shaped for loading into a document store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShapedRecord {
    pub id: String,

    #[serde(rename = "type")]
    pub element_type: PrimitiveType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<String>,

    /// `[lat, lon]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<[f64; 2]>,

    pub created: Created,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub address: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_refs: Vec<String>,

    /// Plain tags, stored as top level keys.
    #[serde(flatten)]
    pub tags: BTreeMap<String, String>,
}
