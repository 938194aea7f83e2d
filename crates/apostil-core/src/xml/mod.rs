pub mod read;
pub mod tree;
pub mod write;

pub use read::parse;
pub use tree::{XmlTree, XmlNodeData, XName, XAttribute, TEI_NS, XMLNS_NS, XML_NS};
pub use write::serialize;
