use super::tree::{XAttribute, XName, XmlNodeData, XmlTree, XMLNS_NS, XML_NS};
use crate::error::{ApostilError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::HashMap;
use std::io::Cursor;

/// Serialize the tree with an XML declaration. Whitespace text nodes are
/// emitted as parsed, so a read-modify-write pass keeps the document's
/// original formatting.
pub fn serialize(tree: &XmlTree) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_err)?;
    writer
        .write_event(Event::Text(BytesText::from_escaped("\n")))
        .map_err(write_err)?;

    if let Some(root) = tree.root() {
        write_node(tree, root, &mut writer, &HashMap::new())?;
    }

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| ApostilError::XmlWrite(e.to_string()))
}

/// Maps namespace URIs to the prefix declared for them in scope; the empty
/// string marks the default namespace.
type NamespaceMap = HashMap<String, String>;

fn write_err<E: std::fmt::Display>(e: E) -> ApostilError {
    ApostilError::XmlWrite(e.to_string())
}

fn extend_namespace_map(map: &mut NamespaceMap, attributes: &[XAttribute]) {
    for attr in attributes {
        match &attr.name.namespace {
            None if attr.name.local_name == "xmlns" => {
                map.insert(attr.value.clone(), String::new());
            }
            Some(ns) if ns == XMLNS_NS => {
                map.insert(attr.value.clone(), attr.name.local_name.clone());
            }
            _ => {}
        }
    }
}

fn qualified_name(name: &XName, map: &NamespaceMap) -> String {
    let Some(ns) = &name.namespace else {
        return name.local_name.clone();
    };

    if ns == XMLNS_NS {
        return format!("xmlns:{}", name.local_name);
    }
    if ns == XML_NS {
        return format!("xml:{}", name.local_name);
    }

    match map.get(ns) {
        Some(prefix) if prefix.is_empty() => name.local_name.clone(),
        Some(prefix) => format!("{}:{}", prefix, name.local_name),
        None => name.local_name.clone(),
    }
}

fn write_node<W: std::io::Write>(
    tree: &XmlTree,
    node: indextree::NodeId,
    writer: &mut Writer<W>,
    namespace_map: &NamespaceMap,
) -> Result<()> {
    let Some(data) = tree.get(node) else {
        return Ok(());
    };

    match data {
        XmlNodeData::Element { name, attributes } => {
            let mut scoped = namespace_map.clone();
            extend_namespace_map(&mut scoped, attributes);

            let tag = qualified_name(name, &scoped);
            let mut elem = BytesStart::new(&tag);
            for attr in attributes {
                let attr_name = qualified_name(&attr.name, &scoped);
                elem.push_attribute((attr_name.as_str(), attr.value.as_str()));
            }

            let children: Vec<_> = tree.children(node).collect();
            if children.is_empty() {
                writer.write_event(Event::Empty(elem)).map_err(write_err)?;
            } else {
                writer.write_event(Event::Start(elem)).map_err(write_err)?;
                for child in children {
                    write_node(tree, child, writer, &scoped)?;
                }
                writer
                    .write_event(Event::End(BytesEnd::new(&tag)))
                    .map_err(write_err)?;
            }
        }
        XmlNodeData::Text(text) => {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_err)?;
        }
        XmlNodeData::Comment(text) => {
            writer
                .write_event(Event::Comment(BytesText::new(text)))
                .map_err(write_err)?;
        }
        XmlNodeData::ProcessingInstruction { target, data } => {
            let content = if data.is_empty() {
                target.clone()
            } else {
                format!("{} {}", target, data)
            };
            writer
                .write_event(Event::PI(BytesPI::new(&content)))
                .map_err(write_err)?;
        }
    }

    Ok(())
}
