//! Turns raw map elements into table rows.
//!
//! Node tags whose key contains a problem character are dropped. Way tags are
//! never filtered, see `shape_way`.

use log::debug;
use regex::Regex;

use crate::data::osm::{ElementKind, RawElement};
use crate::data::table::{MemberRecord, PrimaryRecord, ShapedRecord, TagRecord, NODE_FIELDS, WAY_FIELDS};
use crate::errors::{Error, Result};
use crate::etl::normalize::Normalize;

pub const LOWER_COLON: &str = r"^[a-z_]+:[a-z_]+";
pub const PROBLEM_CHARS: &str = r#"[=+/&<>;'"?%#$@,. \t\r\n]"#;
pub const DEFAULT_TAG_TYPE: &str = "regular";

/// Splits tag keys like `addr:street` into a namespace and a local key.
pub struct TagClassifier {
    lower_colon: Regex,
    default_type: String,
}

impl TagClassifier {
    pub fn new(pattern: &str, default_type: &str) -> Result<Self> {
        Ok(TagClassifier {
            lower_colon: Regex::new(pattern)?,
            default_type: default_type.to_string(),
        })
    }

    pub fn standard() -> Result<Self> {
        TagClassifier::new(LOWER_COLON, DEFAULT_TAG_TYPE)
    }

    /// Returns `(type, key)`. Only the first colon splits; the rest stays in the key.
    pub fn classify<'a>(&'a self, raw_key: &'a str) -> (&'a str, &'a str) {
        if self.lower_colon.is_match(raw_key) {
            if let Some((tag_type, key)) = raw_key.split_once(':') {
                return (tag_type, key);
            }
        }
        (self.default_type.as_str(), raw_key)
    }
}

pub struct ShaperConfig {
    pub node_fields: &'static [&'static str],
    pub way_fields: &'static [&'static str],
    pub problem_chars: Regex,
}

impl ShaperConfig {
    pub fn standard() -> Result<Self> {
        Ok(ShaperConfig {
            node_fields: NODE_FIELDS,
            way_fields: WAY_FIELDS,
            problem_chars: Regex::new(PROBLEM_CHARS)?,
        })
    }
}

pub struct ElementShaper<N: Normalize> {
    config: ShaperConfig,
    classifier: TagClassifier,
    normalizer: N,
}

impl<N: Normalize> ElementShaper<N> {
    pub fn new(config: ShaperConfig, classifier: TagClassifier, normalizer: N) -> Self {
        ElementShaper {
            config,
            classifier,
            normalizer,
        }
    }

    pub fn with_normalizer(normalizer: N) -> Result<Self> {
        Ok(ElementShaper::new(ShaperConfig::standard()?, TagClassifier::standard()?, normalizer))
    }

    /// Shapes a node or way. Anything else yields `None`.
    pub fn shape(&self, element: &RawElement) -> Result<Option<ShapedRecord>> {
        match element.kind {
            ElementKind::Node => self.shape_node(element).map(Some),
            ElementKind::Way => self.shape_way(element).map(Some),
            ElementKind::Relation => Ok(None),
        }
    }

    pub fn has_problem_chars(&self, raw_key: &str) -> bool {
        self.config.problem_chars.is_match(raw_key)
    }

    fn shape_node(&self, element: &RawElement) -> Result<ShapedRecord> {
        let primary = primary_record(element, self.config.node_fields);
        let id = primary_id(&primary, element)?;

        let mut tags = Vec::with_capacity(element.tags.len());
        for tag in &element.tags {
            if self.has_problem_chars(&tag.k) {
                debug!(id = id, key = tag.k.as_str(); "Dropping node tag with problem characters");
                continue;
            }
            tags.push(self.tag_record(id, &tag.k, &tag.v));
        }

        Ok(ShapedRecord {
            kind: ElementKind::Node,
            primary,
            tags,
            members: Vec::new(),
        })
    }

    // Way tags skip the problem character filter that nodes get.
    fn shape_way(&self, element: &RawElement) -> Result<ShapedRecord> {
        let primary = primary_record(element, self.config.way_fields);
        let id = primary_id(&primary, element)?;

        let members = element
            .node_refs
            .iter()
            .enumerate()
            .map(|(position, node_id)| MemberRecord {
                id: id.to_string(),
                node_id: node_id.clone(),
                position,
            })
            .collect();

        let tags = element
            .tags
            .iter()
            .map(|tag| self.tag_record(id, &tag.k, &tag.v))
            .collect();

        Ok(ShapedRecord {
            kind: ElementKind::Way,
            primary,
            tags,
            members,
        })
    }

    fn tag_record(&self, id: &str, raw_key: &str, raw_value: &str) -> TagRecord {
        let (tag_type, key) = self.classifier.classify(raw_key);
        TagRecord {
            id: id.to_string(),
            key: key.to_string(),
            value: self.normalizer.normalize(raw_key, raw_value),
            tag_type: tag_type.to_string(),
        }
    }
}

/// Picks `fields` off the element, skipping the ones that are missing or empty.
fn primary_record(element: &RawElement, fields: &'static [&'static str]) -> PrimaryRecord {
    let fields = fields
        .iter()
        .filter_map(|field| match element.attribute(field) {
            Some(value) if !value.is_empty() => Some((*field, value.to_string())),
            _ => None,
        })
        .collect();
    PrimaryRecord { fields }
}

fn primary_id<'a>(primary: &'a PrimaryRecord, element: &RawElement) -> Result<&'a str> {
    primary
        .id()
        .ok_or_else(|| Error::missing_attribute(element.kind.name(), "id"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::etl::normalize::{AddressNormalizer, Passthrough};
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn shaper() -> ElementShaper<Passthrough> {
        ElementShaper::with_normalizer(Passthrough).unwrap()
    }

    fn node(id: &str) -> RawElement {
        RawElement::new(ElementKind::Node)
            .with_attribute("id", id)
            .with_attribute("lat", "37.77")
            .with_attribute("lon", "-122.41")
            .with_attribute("user", "mapper")
            .with_attribute("uid", "42")
            .with_attribute("version", "3")
            .with_attribute("changeset", "1001")
            .with_attribute("timestamp", "2016-01-01T00:00:00Z")
    }

    #[test]
    fn classify_splits_at_first_colon() {
        let c = TagClassifier::standard().unwrap();
        assert_eq!(c.classify("addr:street"), ("addr", "street"));
        assert_eq!(c.classify("addr:street:name"), ("addr", "street:name"));
        assert_eq!(c.classify("gnis:feature_id"), ("gnis", "feature_id"));
    }

    #[test]
    fn classify_falls_back_to_regular() {
        let c = TagClassifier::standard().unwrap();
        assert_eq!(c.classify("name"), ("regular", "name"));
        assert_eq!(c.classify("Addr:street"), ("regular", "Addr:street"));
        assert_eq!(c.classify("addr:Street"), ("regular", "addr:Street"));
        assert_eq!(c.classify(":street"), ("regular", ":street"));
        assert_eq!(c.classify("addr:"), ("regular", "addr:"));
        assert_eq!(c.classify(""), ("regular", ""));
    }

    #[test]
    fn classify_only_needs_lowercase_prefix() {
        let c = TagClassifier::standard().unwrap();
        assert_eq!(c.classify("addr:street2"), ("addr", "street2"));
        assert_eq!(c.classify("tiger:name_base_1"), ("tiger", "name_base_1"));
    }

    #[test]
    fn node_tags_with_problem_chars_are_dropped() {
        let el = RawElement::new(ElementKind::Node)
            .with_attribute("id", "123")
            .with_tag("addr street", "x")
            .with_tag("name", "Main St");
        let shaped = shaper().shape(&el).unwrap().unwrap();
        assert_eq!(
            shaped.tags,
            vec![TagRecord {
                id: "123".to_string(),
                key: "name".to_string(),
                value: "Main St".to_string(),
                tag_type: "regular".to_string(),
            }]
        );
        assert!(shaped.members.is_empty());
    }

    #[test]
    fn way_tags_are_not_filtered() {
        let el = RawElement::new(ElementKind::Way)
            .with_attribute("id", "55")
            .with_tag("addr street", "x")
            .with_tag("fixme?", "y")
            .with_tag("name", "Main St");
        let shaped = shaper().shape(&el).unwrap().unwrap();
        assert_eq!(shaped.tags.len(), 3);
        assert_eq!(shaped.tags[0].key, "addr street");
        assert_eq!(shaped.tags[0].tag_type, "regular");
    }

    #[test]
    fn way_members_keep_document_order() {
        let el = RawElement::new(ElementKind::Way)
            .with_attribute("id", "55")
            .with_node_ref("1")
            .with_node_ref("2")
            .with_node_ref("3");
        let shaped = shaper().shape(&el).unwrap().unwrap();
        let rows: Vec<_> = shaped.members.iter().map(|m| m.row()).collect();
        assert_eq!(
            rows,
            vec![
                ["55".to_string(), "1".to_string(), "0".to_string()],
                ["55".to_string(), "2".to_string(), "1".to_string()],
                ["55".to_string(), "3".to_string(), "2".to_string()],
            ]
        );
    }

    #[test]
    fn street_values_are_normalized_with_full_key() {
        let mapping = BTreeMap::from([("Ave".to_string(), "Avenue".to_string())]);
        let shaper = ElementShaper::with_normalizer(AddressNormalizer::new(mapping).unwrap()).unwrap();
        let el = RawElement::new(ElementKind::Node)
            .with_attribute("id", "9")
            .with_tag("addr:street", "N. Lincoln Ave");
        let shaped = shaper.shape(&el).unwrap().unwrap();
        assert_eq!(shaped.tags[0].key, "street");
        assert_eq!(shaped.tags[0].tag_type, "addr");
        assert_eq!(shaped.tags[0].value, "N. Lincoln Avenue");
    }

    #[test]
    fn primary_fields_follow_column_order_and_skip_empty() {
        let el = node("1").with_attribute("visible", "true");
        let shaped = shaper().shape(&el).unwrap().unwrap();
        let names: Vec<_> = shaped.primary.fields.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, NODE_FIELDS.to_vec());

        let sparse = RawElement::new(ElementKind::Way)
            .with_attribute("user", "")
            .with_attribute("id", "5");
        let shaped = shaper().shape(&sparse).unwrap().unwrap();
        assert_eq!(shaped.primary.fields, vec![("id", "5".to_string())]);
    }

    #[test]
    fn missing_id_is_fatal() {
        let el = RawElement::new(ElementKind::Node).with_attribute("lat", "1.0");
        let err = shaper().shape(&el).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingAttribute);

        let el = RawElement::new(ElementKind::Way).with_attribute("id", "");
        assert_eq!(shaper().shape(&el).unwrap_err().kind, ErrorKind::MissingAttribute);
    }

    #[test]
    fn relations_are_skipped() {
        let el = RawElement::new(ElementKind::Relation).with_attribute("id", "1");
        assert!(shaper().shape(&el).unwrap().is_none());
    }

    proptest! {
        #[test]
        fn lower_colon_keys_split_at_first_colon(
            prefix in "[a-z_]{1,8}",
            rest in "[a-z_]{1,8}(:[a-z0-9_]{0,4})?",
        ) {
            let c = TagClassifier::standard().unwrap();
            let raw = format!("{}:{}", prefix, rest);
            prop_assert_eq!(c.classify(&raw), (prefix.as_str(), rest.as_str()));
        }

        #[test]
        fn keys_without_lowercase_colon_are_regular(raw in "[A-Z0-9 ]{0,8}(:[a-z]{0,3})?") {
            let c = TagClassifier::standard().unwrap();
            prop_assert_eq!(c.classify(&raw), ("regular", raw.as_str()));
        }

        #[test]
        fn node_tag_count_excludes_problem_keys(keys in prop::collection::vec("[a-z .:?]{1,6}", 0..8)) {
            let s = shaper();
            let el = keys.iter().fold(node("1"), |el, k| el.with_tag(k, "v"));
            let expected = keys.iter().filter(|k| !s.has_problem_chars(k)).count();
            prop_assert_eq!(s.shape(&el).unwrap().unwrap().tags.len(), expected);

            let way = keys.iter().fold(
                RawElement::new(ElementKind::Way).with_attribute("id", "2"),
                |el, k| el.with_tag(k, "v"),
            );
            prop_assert_eq!(s.shape(&way).unwrap().unwrap().tags.len(), keys.len());
        }

        #[test]
        fn member_positions_are_contiguous(refs in prop::collection::vec("[0-9]{1,6}", 0..20)) {
            let way = refs.iter().fold(
                RawElement::new(ElementKind::Way).with_attribute("id", "3"),
                |el, r| el.with_node_ref(r),
            );
            let shaped = shaper().shape(&way).unwrap().unwrap();
            for (i, member) in shaped.members.iter().enumerate() {
                prop_assert_eq!(member.position, i);
                prop_assert_eq!(&member.node_id, &refs[i]);
                prop_assert_eq!(member.id.as_str(), "3");
            }
            prop_assert_eq!(shaped.members.len(), refs.len());
        }
    }
}
