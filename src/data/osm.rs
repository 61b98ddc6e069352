#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    pub const ALL: [ElementKind; 3] = [ElementKind::Node, ElementKind::Way, ElementKind::Relation];

    pub fn from_name(name: &[u8]) -> Option<ElementKind> {
        match name {
            b"node" => Some(ElementKind::Node),
            b"way" => Some(ElementKind::Way),
            b"relation" => Some(ElementKind::Relation),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }
}

/// A `<tag k=".." v=".."/>` child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTag {
    pub k: String,
    pub v: String,
}

impl RawTag {
    pub fn new(k: impl Into<String>, v: impl Into<String>) -> Self {
        RawTag { k: k.into(), v: v.into() }
    }
}

/// One top level element of the map, fully parsed and owned.
///
/// Attributes keep document order. `node_refs` holds the `ref` of every
/// `<nd>` child and is only ever filled for ways.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawElement {
    pub kind: ElementKind,
    pub attributes: Vec<(String, String)>,
    pub tags: Vec<RawTag>,
    pub node_refs: Vec<String>,
}

impl RawElement {
    pub fn new(kind: ElementKind) -> Self {
        RawElement {
            kind,
            attributes: Vec::new(),
            tags: Vec::new(),
            node_refs: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_tag(mut self, k: &str, v: &str) -> Self {
        self.tags.push(RawTag::new(k, v));
        self
    }

    pub fn with_node_ref(mut self, node_ref: &str) -> Self {
        self.node_refs.push(node_ref.to_string());
        self
    }
}
