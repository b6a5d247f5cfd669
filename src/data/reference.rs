use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Lookup tables used to reconcile `addr:city` values. Built once before any conversion and
/// only read afterwards.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct ReferenceTables {
    /// Place name (`Rathmines`, `Dublin 6`, ...) to postal district (`D6`).
    pub postcodes: HashMap<String, String>,
    /// Satellite town to county.
    pub towns: HashMap<String, String>,
}

impl ReferenceTables {
    pub fn new(postcodes: HashMap<String, String>, towns: HashMap<String, String>) -> Self {
        ReferenceTables { postcodes, towns }
    }

    pub fn postcode(&self, place: &str) -> Option<&str> {
        self.postcodes.get(place).map(String::as_str)
    }

    pub fn county(&self, town: &str) -> Option<&str> {
        self.towns.get(town).map(String::as_str)
    }
}
