use crate::data::ReferenceTables;

/// How a free-text `addr:city` value maps onto the reference tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CityMatch<'a> {
    /// Numbered Dublin district: the postcode alone names it.
    Postcode(&'a str),
    District { district: &'a str, postcode: &'a str },
    Town { town: &'a str, county: &'a str },
}

impl<'a> CityMatch<'a> {
    pub fn find(city: &'a str, tables: &'a ReferenceTables) -> Option<Self> {
        if let Some(postcode) = tables.postcode(city) {
            if city.contains("Dublin") {
                Some(CityMatch::Postcode(postcode))
            } else {
                Some(CityMatch::District { district: city, postcode })
            }
        } else {
            tables.county(city).map(|county| CityMatch::Town { town: city, county })
        }
    }

    pub fn into_fields(self) -> Vec<(String, String)> {
        match self {
            CityMatch::Postcode(postcode) => vec![field("postcode", postcode)],
            CityMatch::District { district, postcode } => vec![
                field("district", district),
                field("postcode", postcode),
            ],
            CityMatch::Town { town, county } => vec![
                field("town", town),
                field("county", county),
            ],
        }
    }
}

fn field(key: &str, value: &str) -> (String, String) {
    (key.to_string(), value.to_string())
}

/// Address fields to store for one `addr:<subfield>` tag. Only `city` is reconciled; unmatched
/// cities and every other sub-field are kept verbatim.
pub fn reconcile(subfield: &str, raw: &str, tables: &ReferenceTables) -> Vec<(String, String)> {
    if subfield == "city" {
        if let Some(city_match) = CityMatch::find(raw, tables) {
            return city_match.into_fields();
        }
    }
    vec![field(subfield, raw)]
}
