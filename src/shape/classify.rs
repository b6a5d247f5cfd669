use std::sync::OnceLock;

use regex::Regex;

const ADDRESS_PREFIX: &str = "addr:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass<'a> {
    /// Stored as a top level key, including single-colon keys such as `tiger:cfcc`.
    Ordinary,
    /// `addr:<field>`, routed into the address sub-mapping.
    Address(&'a str),
    /// Multi-level keys like `addr:street:name`.
    Ignored,
}

pub fn classify(key: &str) -> TagClass<'_> {
    if key.matches(':').count() > 1 {
        return TagClass::Ignored;
    }
    match key.strip_prefix(ADDRESS_PREFIX) {
        Some("") => TagClass::Ignored,
        Some(field) => TagClass::Address(field),
        None => TagClass::Ordinary,
    }
}

pub fn is_address_key(key: &str) -> bool {
    key.starts_with(ADDRESS_PREFIX)
}

fn problem_chars() -> &'static Regex {
    static INSTANCE: OnceLock<Regex> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        Regex::new(r#"[=+/&<>;'"?%#$@,.\s]"#).expect("problem character pattern is valid")
    })
}

/// Keys with characters that do not survive as document store field names. Checked for
/// top-level keys and for the sub-field of `addr:` keys.
pub fn is_problem_key(key: &str) -> bool {
    problem_chars().is_match(key)
}
