use super::osm::ElementKind;

pub const NODE_FIELDS: &[&str] = &["id", "lat", "lon", "user", "uid", "version", "changeset", "timestamp"];
pub const NODE_TAGS_FIELDS: &[&str] = &["id", "key", "value", "type"];
pub const WAY_FIELDS: &[&str] = &["id", "user", "uid", "version", "changeset", "timestamp"];
pub const WAY_NODES_FIELDS: &[&str] = &["id", "node_id", "position"];
pub const WAY_TAGS_FIELDS: &[&str] = &["id", "key", "value", "type"];

/// The five destination tables. Column order matches the SQL table schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Nodes,
    NodeTags,
    Ways,
    WayNodes,
    WayTags,
}

impl Table {
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Table::Nodes => NODE_FIELDS,
            Table::NodeTags => NODE_TAGS_FIELDS,
            Table::Ways => WAY_FIELDS,
            Table::WayNodes => WAY_NODES_FIELDS,
            Table::WayTags => WAY_TAGS_FIELDS,
        }
    }
}

/// Attributes of a node or way that made it into the row, in column order.
/// Columns absent from the source (or empty there) are simply not listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryRecord {
    pub fields: Vec<(&'static str, String)>,
}

impl PrimaryRecord {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id")
    }

    /// Cells for `columns`, empty where the record has no value.
    pub fn row(&self, columns: &[&str]) -> Vec<String> {
        columns
            .iter()
            .map(|column| self.get(column).unwrap_or_default().to_string())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub id: String,
    pub key: String,
    pub value: String,
    pub tag_type: String,
}

impl TagRecord {
    pub fn row(&self) -> [&str; 4] {
        [&self.id, &self.key, &self.value, &self.tag_type]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    pub id: String,
    pub node_id: String,
    pub position: usize,
}

impl MemberRecord {
    pub fn row(&self) -> [String; 3] {
        [self.id.clone(), self.node_id.clone(), self.position.to_string()]
    }
}

/// Everything one node or way contributes to the tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapedRecord {
    pub kind: ElementKind,
    pub primary: PrimaryRecord,
    pub tags: Vec<TagRecord>,
    pub members: Vec<MemberRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_row_leaves_missing_columns_empty() {
        let record = PrimaryRecord {
            fields: vec![("id", "7".to_string()), ("user", "bob".to_string())],
        };
        assert_eq!(record.row(WAY_FIELDS), vec!["7", "bob", "", "", "", ""]);
        assert_eq!(record.id(), Some("7"));
    }

    #[test]
    fn tag_row_follows_column_order() {
        let tag = TagRecord {
            id: "1".to_string(),
            key: "street".to_string(),
            value: "Main Street".to_string(),
            tag_type: "addr".to_string(),
        };
        assert_eq!(tag.row(), ["1", "street", "Main Street", "addr"]);
        assert_eq!(Table::NodeTags.columns(), &["id", "key", "value", "type"]);
    }
}
