//! Value correction for address tags.

use std::collections::BTreeMap;

use regex::Regex;

use crate::errors::{Error, ErrorKind, Result};

pub const STREET_KEY: &str = "addr:street";
pub const POSTCODE_KEY: &str = "addr:postcode";

/// Last whitespace delimited token of a street name, trailing dot included.
const STREET_TYPE_PATTERN: &str = r"\S+\.?$";
/// Optional letter prefix (state code), five digits, optional four digit extension.
const POSTCODE_PATTERN: &str = r"^[A-Za-z]*[\s-]*(\d{5})(?:[\s-]?\d{4})?$";

pub trait Normalize {
    /// Corrected value for a tag. `key` is the full raw tag key, before any
    /// namespace split.
    fn normalize(&self, key: &str, value: &str) -> String;
}

/// Leaves every value as it is.
pub struct Passthrough;

impl Normalize for Passthrough {
    fn normalize(&self, _key: &str, value: &str) -> String {
        value.to_string()
    }
}

pub fn default_street_mapping() -> BTreeMap<String, String> {
    [
        ("St", "Street"),
        ("St.", "Street"),
        ("ST", "Street"),
        ("street", "Street"),
        ("Ave", "Avenue"),
        ("Ave.", "Avenue"),
        ("ave", "Avenue"),
        ("Rd", "Road"),
        ("Rd.", "Road"),
        ("Blvd", "Boulevard"),
        ("Blvd.", "Boulevard"),
        ("Dr", "Drive"),
        ("Dr.", "Drive"),
        ("Ct", "Court"),
        ("Pl", "Place"),
        ("Ln", "Lane"),
        ("Pkwy", "Parkway"),
        ("Sq", "Square"),
    ]
    .into_iter()
    .map(|(abbreviation, full)| (abbreviation.to_string(), full.to_string()))
    .collect()
}

pub struct StreetTypes {
    re: Regex,
}

impl StreetTypes {
    pub fn new() -> Result<Self> {
        Ok(StreetTypes {
            re: Regex::new(STREET_TYPE_PATTERN)?,
        })
    }

    /// The street type of `name`, e.g. "Ave" for "N. Lincoln Ave".
    pub fn street_type<'a>(&self, name: &'a str) -> Option<&'a str> {
        self.re.find(name).map(|m| m.as_str())
    }

    fn replace(&self, name: &str, mapping: &BTreeMap<String, String>) -> String {
        match self.re.find(name) {
            Some(m) => match mapping.get(m.as_str()) {
                Some(full) => format!("{}{}", &name[..m.start()], full),
                None => name.to_string(),
            },
            None => name.to_string(),
        }
    }
}

/// Fixes over-abbreviated street types and cleans up postcodes.
pub struct AddressNormalizer {
    street_mapping: BTreeMap<String, String>,
    street_types: StreetTypes,
    postcode_re: Regex,
}

impl AddressNormalizer {
    pub fn new(street_mapping: BTreeMap<String, String>) -> Result<Self> {
        let street_types = StreetTypes::new()?;
        // The street type of a full name must not be an abbreviation, or a second pass rewrites it.
        if let Some((abbreviation, full)) = street_mapping.iter().find(|(_, full)| {
            street_types
                .street_type(full.as_str())
                .is_some_and(|street_type| street_mapping.contains_key(street_type))
        }) {
            return Err(Error::new(
                ErrorKind::Config,
                format!("street mapping '{}' -> '{}' maps onto another abbreviation", abbreviation, full),
            ));
        }
        Ok(AddressNormalizer {
            street_mapping,
            street_types,
            postcode_re: Regex::new(POSTCODE_PATTERN)?,
        })
    }

    pub fn update_street(&self, name: &str) -> String {
        self.street_types.replace(name, &self.street_mapping)
    }

    pub fn update_postcode(&self, postcode: &str) -> String {
        let trimmed = postcode.trim();
        match self.postcode_re.captures(trimmed) {
            Some(caps) => caps[1].to_string(),
            None => trimmed.to_string(),
        }
    }
}

impl Normalize for AddressNormalizer {
    fn normalize(&self, key: &str, value: &str) -> String {
        match key {
            STREET_KEY => self.update_street(value),
            POSTCODE_KEY => self.update_postcode(value),
            _ => value.to_string(),
        }
    }
}
