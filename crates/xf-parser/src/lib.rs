pub mod xml;

pub use xml::{
    parse_xml_document, XmlAttribute, XmlDocument, XmlElementNode, XmlNode, XmlTextNode,
};
