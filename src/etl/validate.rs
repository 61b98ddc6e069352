//! Optional schema check on shaped records. Roughly ten times slower than
//! shaping alone; run it on a sample of the map when iterating.

use crate::data::osm::ElementKind;
use crate::data::table::{MemberRecord, ShapedRecord, TagRecord};
use crate::errors::{Error, Result};

pub trait Validate {
    /// Errors with `ErrorKind::SchemaViolation` on the first offending field.
    fn validate(&self, record: &ShapedRecord) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Float,
    String,
}

#[derive(Debug, Clone)]
pub struct ColumnRule {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
}

const fn required(name: &'static str, field_type: FieldType) -> ColumnRule {
    ColumnRule {
        name,
        field_type,
        required: true,
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub node: Vec<ColumnRule>,
    pub node_tags: Vec<ColumnRule>,
    pub way: Vec<ColumnRule>,
    pub way_nodes: Vec<ColumnRule>,
    pub way_tags: Vec<ColumnRule>,
}

impl Default for Schema {
    fn default() -> Self {
        use FieldType::{Float, Integer, String as Str};

        let tags = vec![
            required("id", Integer),
            required("key", Str),
            required("value", Str),
            required("type", Str),
        ];
        Schema {
            node: vec![
                required("id", Integer),
                required("lat", Float),
                required("lon", Float),
                required("user", Str),
                required("uid", Integer),
                required("version", Str),
                required("changeset", Integer),
                required("timestamp", Str),
            ],
            node_tags: tags.clone(),
            way: vec![
                required("id", Integer),
                required("user", Str),
                required("uid", Integer),
                required("version", Str),
                required("changeset", Integer),
                required("timestamp", Str),
            ],
            way_nodes: vec![
                required("id", Integer),
                required("node_id", Integer),
                required("position", Integer),
            ],
            way_tags: tags,
        }
    }
}

fn tag_cell<'a>(tag: &'a TagRecord, column: &str) -> Option<&'a str> {
    match column {
        "id" => Some(&tag.id),
        "key" => Some(&tag.key),
        "value" => Some(&tag.value),
        "type" => Some(&tag.tag_type),
        _ => None,
    }
}

fn member_cell(member: &MemberRecord, column: &str) -> Option<String> {
    match column {
        "id" => Some(member.id.clone()),
        "node_id" => Some(member.node_id.clone()),
        "position" => Some(member.position.to_string()),
        _ => None,
    }
}

fn check_value(field: &str, rule: &ColumnRule, value: Option<&str>) -> Result<()> {
    let value = match value {
        Some(value) => value,
        None if rule.required => return Err(Error::schema_violation(field, "required field")),
        None => return Ok(()),
    };
    let type_name = match rule.field_type {
        FieldType::Integer if value.trim().parse::<i64>().is_err() => "integer",
        FieldType::Float if value.trim().parse::<f64>().is_err() => "float",
        _ => return Ok(()),
    };
    let detail = format!("must be of {} type, got '{}'", type_name, value);
    Err(Error::schema_violation(field, &detail))
}

impl Schema {
    fn check_tags(&self, table: &str, rules: &[ColumnRule], tags: &[TagRecord]) -> Result<()> {
        for (i, tag) in tags.iter().enumerate() {
            for rule in rules {
                let field = format!("{}[{}].{}", table, i, rule.name);
                check_value(&field, rule, tag_cell(tag, rule.name))?;
            }
        }
        Ok(())
    }
}

impl Validate for Schema {
    fn validate(&self, record: &ShapedRecord) -> Result<()> {
        let (table, primary_rules) = match record.kind {
            ElementKind::Node => ("node", &self.node),
            ElementKind::Way => ("way", &self.way),
            ElementKind::Relation => return Ok(()),
        };
        for rule in primary_rules {
            let field = format!("{}.{}", table, rule.name);
            check_value(&field, rule, record.primary.get(rule.name))?;
        }

        match record.kind {
            ElementKind::Way => {
                for (i, member) in record.members.iter().enumerate() {
                    for rule in &self.way_nodes {
                        let field = format!("way_nodes[{}].{}", i, rule.name);
                        check_value(&field, rule, member_cell(member, rule.name).as_deref())?;
                    }
                }
                self.check_tags("way_tags", &self.way_tags, &record.tags)
            }
            _ => self.check_tags("node_tags", &self.node_tags, &record.tags),
        }
    }
}
