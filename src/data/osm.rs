use std::collections::HashMap;

/// Element name as found in the .osm file. Only nodes and ways carry children we care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Node,
    Way,
    Other(String),
}

impl ElementKind {
    pub fn from_name(name: &[u8]) -> Self {
        match name {
            b"node" => ElementKind::Node,
            b"way" => ElementKind::Way,
            other => ElementKind::Other(String::from_utf8_lossy(other).into_owned()),
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, ElementKind::Node | ElementKind::Way)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    /// `<tag k=".." v=".."/>`
    Tag { key: String, value: String },
    /// `<nd ref=".."/>`
    NodeRef(String),
}

/// One top level element of an OSM document together with its `tag` and `nd` children.
/// Lives only for the duration of a single shaping step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawElement {
    pub kind: ElementKind,
    pub attributes: HashMap<String, String>,
    pub children: Vec<Child>,
}

impl RawElement {
    pub fn new(kind: ElementKind) -> Self {
        RawElement {
            kind,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.children.iter().filter_map(|child| match child {
            Child::Tag { key, value } => Some((key.as_str(), value.as_str())),
            Child::NodeRef(_) => None,
        })
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.children.push(Child::Tag {
            key: key.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn with_node_ref(mut self, node_ref: &str) -> Self {
        self.children.push(Child::NodeRef(node_ref.to_string()));
        self
    }
}
