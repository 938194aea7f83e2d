use super::tree::{XAttribute, XName, XmlNodeData, XmlTree, XMLNS_NS};
use crate::error::{ApostilError, Result};

/// Parse an XML document into a mutable arena tree.
pub fn parse(xml: &str) -> Result<XmlTree> {
    let doc = roxmltree::Document::parse_with_options(
        xml,
        roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        },
    )
    .map_err(|e| ApostilError::XmlParse {
        message: e.to_string(),
        location: format!("line {}", e.pos().row),
    })?;

    let mut tree = XmlTree::new();
    build_tree(doc.root_element(), &mut tree, None);
    Ok(tree)
}

fn build_tree(node: roxmltree::Node, tree: &mut XmlTree, parent: Option<indextree::NodeId>) {
    let data = match node.node_type() {
        roxmltree::NodeType::Element => {
            let name = XName::new(
                node.tag_name().namespace().unwrap_or(""),
                node.tag_name().name(),
            );

            let mut attributes: Vec<XAttribute> = node
                .attributes()
                .map(|attr| {
                    XAttribute::new(
                        XName::new(attr.namespace().unwrap_or(""), attr.name()),
                        attr.value(),
                    )
                })
                .collect();

            // roxmltree separates namespace declarations from attributes;
            // fold them back in so serialization reproduces them.
            for ns in node.namespaces() {
                match ns.name() {
                    Some(prefix) => {
                        attributes.push(XAttribute::new(XName::new(XMLNS_NS, prefix), ns.uri()))
                    }
                    None => attributes.push(XAttribute::new(XName::local("xmlns"), ns.uri())),
                }
            }

            XmlNodeData::Element { name, attributes }
        }
        roxmltree::NodeType::Text => match node.text() {
            Some(text) => XmlNodeData::Text(text.to_string()),
            None => return,
        },
        roxmltree::NodeType::Comment => match node.text() {
            Some(text) => XmlNodeData::Comment(text.to_string()),
            None => return,
        },
        roxmltree::NodeType::PI => XmlNodeData::ProcessingInstruction {
            target: node
                .pi()
                .map(|pi| pi.target.to_string())
                .unwrap_or_default(),
            data: node
                .pi()
                .and_then(|pi| pi.value.map(|s| s.to_string()))
                .unwrap_or_default(),
        },
        _ => return,
    };

    let new_id = match parent {
        Some(parent_id) => tree.add_child(parent_id, data),
        None => tree.add_root(data),
    };

    for child in node.children() {
        build_tree(child, tree, Some(new_id));
    }
}
