use indextree::{Arena, NodeId};
use std::fmt;

/// Text Encoding Initiative namespace.
pub const TEI_NS: &str = "http://www.tei-c.org/ns/1.0";

/// Namespace of xmlns declarations themselves.
pub const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";

/// The xml: namespace (xml:id, xml:lang).
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct XName {
    pub namespace: Option<String>,
    pub local_name: String,
}

impl XName {
    pub fn new(namespace: &str, local_name: &str) -> Self {
        Self {
            namespace: if namespace.is_empty() {
                None
            } else {
                Some(namespace.to_string())
            },
            local_name: local_name.to_string(),
        }
    }

    pub fn local(local_name: &str) -> Self {
        Self {
            namespace: None,
            local_name: local_name.to_string(),
        }
    }

    pub fn tei(local_name: &str) -> Self {
        Self::new(TEI_NS, local_name)
    }

    pub fn is_tei(&self, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace.as_deref() == Some(TEI_NS)
    }
}

impl fmt::Display for XName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XAttribute {
    pub name: XName,
    pub value: String,
}

impl XAttribute {
    pub fn new(name: XName, value: &str) -> Self {
        Self {
            name,
            value: value.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum XmlNodeData {
    Element {
        name: XName,
        attributes: Vec<XAttribute>,
    },
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, data: String },
}

impl XmlNodeData {
    pub fn element(name: XName) -> Self {
        Self::Element {
            name,
            attributes: Vec::new(),
        }
    }

    pub fn text(content: &str) -> Self {
        Self::Text(content.to_string())
    }

    pub fn name(&self) -> Option<&XName> {
        match self {
            Self::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attributes(&self) -> Option<&[XAttribute]> {
        match self {
            Self::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element { .. })
    }

    pub fn text_content(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Mutable XML document held as an indextree arena.
#[derive(Debug)]
pub struct XmlTree {
    arena: Arena<XmlNodeData>,
    root: Option<NodeId>,
}

impl XmlTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&XmlNodeData> {
        self.arena.get(id).map(|node| node.get())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut XmlNodeData> {
        self.arena.get_mut(id).map(|node| node.get_mut())
    }

    pub fn add_root(&mut self, data: XmlNodeData) -> NodeId {
        let id = self.arena.new_node(data);
        self.root = Some(id);
        id
    }

    pub fn add_child(&mut self, parent: NodeId, data: XmlNodeData) -> NodeId {
        let child = self.arena.new_node(data);
        parent.append(child, &mut self.arena);
        child
    }

    pub fn children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        parent.children(&self.arena)
    }

    pub fn descendants(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.descendants(&self.arena)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.get(node)?.parent()
    }

    pub fn element_name(&self, node: NodeId) -> Option<&XName> {
        self.get(node).and_then(XmlNodeData::name)
    }

    pub fn attribute(&self, node: NodeId, local_name: &str) -> Option<&str> {
        self.get(node)?
            .attributes()?
            .iter()
            .find(|a| a.name.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    /// All descendant elements with the given TEI local name, in document
    /// order.
    pub fn tei_elements(&self, root: NodeId, local_name: &str) -> Vec<NodeId> {
        self.descendants(root)
            .filter(|&id| {
                self.element_name(id)
                    .map(|n| n.is_tei(local_name))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Concatenated text of all descendant text nodes, in document order.
    /// Equivalent to walking leading text, child text and tails.
    pub fn text_of(&self, node: NodeId) -> String {
        let mut out = String::new();
        for id in self.descendants(node) {
            if let Some(XmlNodeData::Text(t)) = self.get(id) {
                out.push_str(t);
            }
        }
        out
    }

    /// The descendant text nodes of `node`, in document order. These are
    /// the segments an in-text character offset must be mapped across.
    pub fn text_segments(&self, node: NodeId) -> Vec<NodeId> {
        self.descendants(node)
            .filter(|&id| matches!(self.get(id), Some(XmlNodeData::Text(_))))
            .collect()
    }

    /// Splice `insert` into the text node `segment` at char offset `at`.
    pub fn splice_text(&mut self, segment: NodeId, at: usize, insert: &str) -> bool {
        if let Some(XmlNodeData::Text(t)) = self.get_mut(segment) {
            if let Some((byte_at, _)) = t.char_indices().nth(at) {
                t.insert_str(byte_at, insert);
                return true;
            }
            if at == t.chars().count() {
                t.push_str(insert);
                return true;
            }
        }
        false
    }

    /// Index-style path of an element from the root, counting positions
    /// among same-named element siblings: `/TEI/text[1]/body[1]/div[2]/l[57]`.
    pub fn element_path(&self, node: NodeId) -> String {
        let mut steps = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(name) = self.element_name(id) {
                let step = match self.parent(id) {
                    Some(parent) => {
                        let position = self
                            .children(parent)
                            .filter(|&sib| {
                                self.element_name(sib)
                                    .map(|n| n.local_name == name.local_name)
                                    .unwrap_or(false)
                            })
                            .position(|sib| sib == id)
                            .map(|i| i + 1)
                            .unwrap_or(1);
                        format!("{}[{}]", name.local_name, position)
                    }
                    None => name.local_name.clone(),
                };
                steps.push(step);
            }
            current = self.parent(id);
        }
        steps.reverse();
        format!("/{}", steps.join("/"))
    }
}

impl Default for XmlTree {
    fn default() -> Self {
        Self::new()
    }
}
