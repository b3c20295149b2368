/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Embedded document parsing.
//!
//! Fields marked as carrying an embedded document hold an XML payload. Its
//! attributes and leaf elements are name/value pairs; names that match a
//! dictionary field are coerced to that field's type, anything else is kept
//! as an unknown string leaf. Nested elements become nested composites.

use crate::coerce::parse_value;
use crate::config::CodecConfig;
use fixlane_core::{Composite, DecodeError, FieldValue, Leaf, Node, RawField};
use fixlane_dictionary::Dictionary;
use xmltree::{Element, XMLNode};

/// Parses an embedded document into a composite.
///
/// The returned composite holds a single slot named after the root element.
///
/// # Errors
/// Returns `DecodeError::SubDocument` if the payload is not well-formed, or
/// `DecodeError::Coercion` if a known field carries a value of the wrong
/// type.
pub fn parse_document(
    tag: u32,
    payload: &[u8],
    dictionary: &Dictionary,
    config: &CodecConfig,
) -> Result<Composite, DecodeError> {
    let root = Element::parse(payload).map_err(|e| DecodeError::SubDocument {
        tag,
        reason: e.to_string(),
    })?;
    let mut document = Composite::new();
    document.push(
        root.name.clone(),
        Node::Composite(element_to_composite(&root, dictionary, config)?),
    );
    Ok(document)
}

fn element_to_composite(
    element: &Element,
    dictionary: &Dictionary,
    config: &CodecConfig,
) -> Result<Composite, DecodeError> {
    let mut composite = Composite::new();

    let mut attributes: Vec<(&String, &String)> = element.attributes.iter().collect();
    attributes.sort();
    for (name, value) in attributes {
        composite.push_leaf(name.clone(), leaf(name, value, dictionary, config)?);
    }

    for child in element.children.iter().filter_map(XMLNode::as_element) {
        let is_leaf = child.attributes.is_empty()
            && child.children.iter().all(|node| !matches!(node, XMLNode::Element(_)));
        if is_leaf {
            let text = child.get_text().unwrap_or_default();
            composite.push_leaf(child.name.clone(), leaf(&child.name, &text, dictionary, config)?);
        } else {
            composite.push(
                child.name.clone(),
                Node::Composite(element_to_composite(child, dictionary, config)?),
            );
        }
    }
    Ok(composite)
}

fn leaf(
    name: &str,
    value: &str,
    dictionary: &Dictionary,
    config: &CodecConfig,
) -> Result<Leaf, DecodeError> {
    match dictionary.get_field_by_name(name) {
        Some(def) => {
            let raw = RawField::new(def.tag, value.as_bytes());
            Ok(Leaf::new(def.tag, parse_value(&raw, def, config)?))
        }
        None => Ok(Leaf::unknown(0, FieldValue::String(value.to_string()))),
    }
}
