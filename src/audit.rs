//! Street name audit: lists street types that are not in the expected list,
//! which is where new entries for the street mapping come from.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::data::osm::{ElementKind, RawElement};
use crate::errors::Result;
use crate::etl::normalize::{StreetTypes, STREET_KEY};

pub fn default_expected_street_types() -> Vec<String> {
    [
        "Street", "Avenue", "Boulevard", "Drive", "Court", "Place", "Square", "Lane", "Road",
        "Trail", "Parkway", "Commons", "Way", "Alley", "Terrace", "Highway",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Unexpected street type -> every street name seen with it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StreetAudit {
    pub street_types: BTreeMap<String, BTreeSet<String>>,
}

impl fmt::Display for StreetAudit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (street_type, names) in &self.street_types {
            writeln!(f, "{} ({})", street_type, names.len())?;
            for name in names {
                writeln!(f, "    {}", name)?;
            }
        }
        Ok(())
    }
}

pub fn audit_street_types<I>(elements: I, expected: &[String]) -> Result<StreetAudit>
where
    I: Iterator<Item = Result<RawElement>>,
{
    let street_types = StreetTypes::new()?;
    let mut audit = StreetAudit::default();

    for element in elements {
        let element = element?;
        if element.kind == ElementKind::Relation {
            continue;
        }
        for tag in element.tags.iter().filter(|tag| tag.k == STREET_KEY) {
            if let Some(street_type) = street_types.street_type(&tag.v) {
                if !expected.iter().any(|known| known == street_type) {
                    audit
                        .street_types
                        .entry(street_type.to_string())
                        .or_default()
                        .insert(tag.v.clone());
                }
            }
        }
    }
    Ok(audit)
}
