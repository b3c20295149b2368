/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Typed, nested message tree.
//!
//! A decoded message is a [`MessageTree`]: three [`Composite`]s (header, body
//! and trailer), each an ordered list of named [`Slot`]s. A slot holds a
//! [`Node`], which is exactly one of:
//! - [`Node::Leaf`]: a single typed field
//! - [`Node::Composite`]: a nested aggregate (embedded documents)
//! - [`Node::Group`]: the ordered instances of a repeating group
//!
//! BodyLength (9) and CheckSum (10) are framing fields and are never stored
//! in the tree; the encoder recomputes them.

use crate::field::FieldValue;
use crate::message::MsgType;
use crate::tags;
use serde::{Deserialize, Serialize};

/// Reserved slot name of the header composite.
pub const HEADER_SLOT: &str = "Header";

/// Reserved slot name of the trailer composite.
pub const TRAILER_SLOT: &str = "Trailer";

/// Suffix of the slot under which a parsed embedded document is attached.
pub const EMBEDDED_DOCUMENT_SLOT: &str = "EmbeddedDocument";

/// Returns the slot name holding the document parsed from `field_name`.
///
/// Each embedded-document field gets its own slot, so a message carrying
/// several of them keeps every document addressable.
#[must_use]
pub fn embedded_document_slot(field_name: &str) -> String {
    format!("{field_name}.{EMBEDDED_DOCUMENT_SLOT}")
}

/// A single typed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    /// Field tag number (`0` for an unresolved field name).
    pub tag: u32,
    /// Typed value.
    pub value: FieldValue,
    /// True when the field is not part of the schema at this position.
    pub unknown: bool,
}

impl Leaf {
    /// Creates a schema-conformant leaf.
    #[must_use]
    pub fn new(tag: u32, value: impl Into<FieldValue>) -> Self {
        Self {
            tag,
            value: value.into(),
            unknown: false,
        }
    }

    /// Creates a leaf for a field the schema does not place here.
    #[must_use]
    pub fn unknown(tag: u32, value: impl Into<FieldValue>) -> Self {
        Self {
            tag,
            value: value.into(),
            unknown: true,
        }
    }
}

/// The instances of one repeating group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatedGroup {
    /// Tag of the NumInGroup counter field.
    pub count_tag: u32,
    /// Count carried by the counter field on the wire.
    pub declared: usize,
    /// Group instances in wire order.
    pub instances: Vec<Composite>,
}

impl RepeatedGroup {
    /// Creates a group whose declared count matches its instances.
    #[must_use]
    pub fn new(count_tag: u32, instances: Vec<Composite>) -> Self {
        Self {
            count_tag,
            declared: instances.len(),
            instances,
        }
    }

    /// Returns true if the declared count matches the instances present.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.declared == self.instances.len()
    }
}

/// A message tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// A single typed field.
    Leaf(Leaf),
    /// A nested aggregate.
    Composite(Composite),
    /// A repeating group.
    Group(RepeatedGroup),
}

/// A named position inside a composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    /// Field, group or reserved name.
    pub name: String,
    /// Slot content.
    pub node: Node,
}

/// An ordered collection of named slots.
///
/// Slot order is kept for iteration and unordered encoding, but equality
/// ignores it: two composites are equal when they hold the same slots.
/// Group instances still compare in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Composite {
    slots: Vec<Slot>,
}

impl PartialEq for Composite {
    fn eq(&self, other: &Self) -> bool {
        if self.slots.len() != other.slots.len() {
            return false;
        }
        let mut matched = vec![false; other.slots.len()];
        self.slots.iter().all(|slot| {
            let found = other
                .slots
                .iter()
                .enumerate()
                .position(|(i, candidate)| !matched[i] && candidate == slot);
            match found {
                Some(i) => {
                    matched[i] = true;
                    true
                }
                None => false,
            }
        })
    }
}

impl Composite {
    /// Creates an empty composite.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a slot.
    pub fn push(&mut self, name: impl Into<String>, node: Node) {
        self.slots.push(Slot {
            name: name.into(),
            node,
        });
    }

    /// Appends a leaf.
    pub fn push_leaf(&mut self, name: impl Into<String>, leaf: Leaf) {
        self.push(name, Node::Leaf(leaf));
    }

    /// Appends a repeating group.
    pub fn push_group(&mut self, name: impl Into<String>, group: RepeatedGroup) {
        self.push(name, Node::Group(group));
    }

    /// Builder-style variant of [`Composite::set_field`].
    #[must_use]
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        tag: u32,
        value: impl Into<FieldValue>,
    ) -> Self {
        self.set_field(name, tag, value);
        self
    }

    /// Builder-style variant of [`Composite::push_group`].
    #[must_use]
    pub fn with_group(mut self, name: impl Into<String>, group: RepeatedGroup) -> Self {
        self.push_group(name, group);
        self
    }

    /// Replaces the value of the leaf with `tag`, or appends a new leaf.
    pub fn set_field(&mut self, name: impl Into<String>, tag: u32, value: impl Into<FieldValue>) {
        let value = value.into();
        for slot in &mut self.slots {
            if let Node::Leaf(leaf) = &mut slot.node
                && leaf.tag == tag
            {
                leaf.value = value;
                return;
            }
        }
        self.push_leaf(name, Leaf::new(tag, value));
    }

    /// Removes every leaf or group identified by `tag`.
    pub fn remove(&mut self, tag: u32) {
        self.slots.retain(|slot| match &slot.node {
            Node::Leaf(leaf) => leaf.tag != tag,
            Node::Group(group) => group.count_tag != tag,
            Node::Composite(_) => true,
        });
    }

    /// Returns the slots in order.
    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    /// Returns the first leaf with the given tag.
    #[must_use]
    pub fn leaf(&self, tag: u32) -> Option<&Leaf> {
        self.slots.iter().find_map(|slot| match &slot.node {
            Node::Leaf(leaf) if leaf.tag == tag => Some(leaf),
            _ => None,
        })
    }

    /// Returns the value of the first leaf with the given tag.
    #[must_use]
    pub fn value(&self, tag: u32) -> Option<&FieldValue> {
        self.leaf(tag).map(|leaf| &leaf.value)
    }

    /// Returns the group counted by `count_tag`.
    #[must_use]
    pub fn group(&self, count_tag: u32) -> Option<&RepeatedGroup> {
        self.slots.iter().find_map(|slot| match &slot.node {
            Node::Group(group) if group.count_tag == count_tag => Some(group),
            _ => None,
        })
    }

    /// Returns the nested composite stored under `name`.
    #[must_use]
    pub fn composite(&self, name: &str) -> Option<&Composite> {
        self.slots.iter().find_map(|slot| match &slot.node {
            Node::Composite(composite) if slot.name == name => Some(composite),
            _ => None,
        })
    }

    /// Returns the embedded document parsed from the field named `field_name`.
    #[must_use]
    pub fn embedded_document(&self, field_name: &str) -> Option<&Composite> {
        self.composite(&embedded_document_slot(field_name))
    }

    /// Returns true if a leaf or group is identified by `tag`.
    #[must_use]
    pub fn contains(&self, tag: u32) -> bool {
        self.leaf(tag).is_some() || self.group(tag).is_some()
    }

    /// Returns the number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if there are no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// A complete message: header, body and trailer composites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTree {
    header: Composite,
    body: Composite,
    trailer: Composite,
    admin: bool,
}

impl MessageTree {
    /// Creates a message with BeginString and MsgType set in the header.
    ///
    /// The admin classification defaults to the standard session message set.
    #[must_use]
    pub fn new(begin_string: &str, msg_type: &str) -> Self {
        let header = Composite::new()
            .with_field("BeginString", tags::BEGIN_STRING, begin_string)
            .with_field("MsgType", tags::MSG_TYPE, msg_type);
        let admin = MsgType::is_admin_code(msg_type);
        Self::from_parts(header, Composite::new(), Composite::new(), admin)
    }

    /// Assembles a message from already-built composites.
    #[must_use]
    pub fn from_parts(header: Composite, body: Composite, trailer: Composite, admin: bool) -> Self {
        Self {
            header,
            body,
            trailer,
            admin,
        }
    }

    /// Returns the BeginString value.
    #[must_use]
    pub fn begin_string(&self) -> Option<&str> {
        self.header
            .value(tags::BEGIN_STRING)
            .and_then(FieldValue::as_str)
    }

    /// Returns the MsgType value.
    #[must_use]
    pub fn msg_type(&self) -> Option<&str> {
        self.header.value(tags::MSG_TYPE).and_then(FieldValue::as_str)
    }

    /// Returns true for session-level messages.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.admin
    }

    /// Overrides the admin classification.
    pub fn set_admin(&mut self, admin: bool) {
        self.admin = admin;
    }

    /// Returns the header composite.
    #[must_use]
    pub const fn header(&self) -> &Composite {
        &self.header
    }

    /// Returns the header composite mutably.
    pub fn header_mut(&mut self) -> &mut Composite {
        &mut self.header
    }

    /// Returns the body composite.
    #[must_use]
    pub const fn body(&self) -> &Composite {
        &self.body
    }

    /// Returns the body composite mutably.
    pub fn body_mut(&mut self) -> &mut Composite {
        &mut self.body
    }

    /// Returns the trailer composite.
    #[must_use]
    pub const fn trailer(&self) -> &Composite {
        &self.trailer
    }

    /// Returns the trailer composite mutably.
    pub fn trailer_mut(&mut self) -> &mut Composite {
        &mut self.trailer
    }

    /// Looks up the header or trailer by its reserved slot name.
    #[must_use]
    pub fn part(&self, name: &str) -> Option<&Composite> {
        match name {
            HEADER_SLOT => Some(&self.header),
            TRAILER_SLOT => Some(&self.trailer),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_tree_new() {
        let tree = MessageTree::new("FIX.4.4", "0");
        assert_eq!(tree.begin_string(), Some("FIX.4.4"));
        assert_eq!(tree.msg_type(), Some("0"));
        assert!(tree.is_admin());
        assert!(tree.body().is_empty());
        assert!(!MessageTree::new("FIX.4.4", "D").is_admin());
    }

    #[test]
    fn test_composite_equality_ignores_slot_order() {
        let a = Composite::new()
            .with_field("SenderCompID", 49, "A")
            .with_field("MsgSeqNum", 34, 1i64);
        let b = Composite::new()
            .with_field("MsgSeqNum", 34, 1i64)
            .with_field("SenderCompID", 49, "A");
        assert_eq!(a, b);
        assert_ne!(a, b.clone().with_field("TargetCompID", 56, "B"));
        let renamed = Composite::new()
            .with_field("SenderCompID", 49, "A")
            .with_field("X", 34, 1i64);
        assert_ne!(a, renamed);
    }

    #[test]
    fn test_group_instance_order_matters() {
        let first = Composite::new().with_field("ClOrdID", 11, "A1");
        let second = Composite::new().with_field("ClOrdID", 11, "A2");
        let forward = RepeatedGroup::new(73, vec![first.clone(), second.clone()]);
        let reversed = RepeatedGroup::new(73, vec![second, first]);
        assert_ne!(
            Composite::new().with_group("NoOrders", forward),
            Composite::new().with_group("NoOrders", reversed)
        );
    }

    #[test]
    fn test_composite_set_field_replaces() {
        let mut composite = Composite::new().with_field("Symbol", 55, "IBM");
        composite.set_field("Symbol", 55, "MSFT");
        assert_eq!(composite.len(), 1);
        assert_eq!(composite.value(55).and_then(FieldValue::as_str), Some("MSFT"));
    }

    #[test]
    fn test_composite_group_lookup() {
        let order = Composite::new().with_field("ClOrdID", 11, "A1");
        let composite = Composite::new().with_group("NoOrders", RepeatedGroup::new(73, vec![order]));
        let group = composite.group(73).unwrap();
        assert!(group.is_consistent());
        assert_eq!(group.instances.len(), 1);
        assert!(composite.contains(73));
        assert!(composite.leaf(73).is_none());
    }

    #[test]
    fn test_composite_remove() {
        let mut composite = Composite::new()
            .with_field("Symbol", 55, "IBM")
            .with_field("Side", 54, '1');
        composite.remove(55);
        assert!(!composite.contains(55));
        assert!(composite.contains(54));
    }

    #[test]
    fn test_part_reserved_names() {
        let tree = MessageTree::new("FIX.4.4", "0");
        assert!(tree.part(HEADER_SLOT).is_some());
        assert!(tree.part(TRAILER_SLOT).is_some());
        assert!(tree.part("Body").is_none());
    }
}
