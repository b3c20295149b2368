/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Structural validation of message trees.
//!
//! Checks, in header → body → trailer order and recursing into every group
//! instance:
//! - required fields and groups are present
//! - enumerated fields carry an allowed code (each token for multi-value
//!   fields)
//! - group counters match the number of instances
//!
//! Validation stops at the first violation.

use fixlane_core::{Composite, FieldValue, Leaf, MessageTree, Node, SchemaError, tags};
use fixlane_dictionary::{Dictionary, Layout};
use std::borrow::Cow;

/// Validates message trees against a dictionary.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'d> {
    dictionary: &'d Dictionary,
}

impl<'d> Validator<'d> {
    /// Creates a validator.
    #[must_use]
    pub const fn new(dictionary: &'d Dictionary) -> Self {
        Self { dictionary }
    }

    /// Validates header, body and trailer.
    ///
    /// # Errors
    /// Returns the first [`SchemaError`] found.
    pub fn validate(&self, tree: &MessageTree) -> Result<(), SchemaError> {
        let header = self.dictionary.header();
        self.check(tree.header(), header, header.required_tags())?;
        self.validate_body(tree)?;
        let trailer = self.dictionary.trailer();
        self.check(tree.trailer(), trailer, trailer.required_tags())
    }

    /// Validates only the body, for messages whose header was already
    /// accepted.
    ///
    /// # Errors
    /// Returns the first [`SchemaError`] found.
    pub fn validate_body(&self, tree: &MessageTree) -> Result<(), SchemaError> {
        let msg_type = tree.msg_type().ok_or(SchemaError::MissingMsgType)?;
        let schema = self
            .dictionary
            .get_message(msg_type)
            .ok_or_else(|| SchemaError::UnknownMessageType(msg_type.to_string()))?;
        self.check(
            tree.body(),
            schema.layout(),
            schema.required_tags().iter().copied(),
        )
    }

    fn check(
        &self,
        composite: &Composite,
        layout: &Layout,
        required: impl IntoIterator<Item = u32>,
    ) -> Result<(), SchemaError> {
        for tag in required {
            if tags::is_framing_tag(tag) {
                continue;
            }
            let present = composite.leaf(tag).is_some()
                || composite
                    .group(tag)
                    .is_some_and(|group| !group.instances.is_empty());
            if !present {
                return Err(SchemaError::MissingRequiredField { tag });
            }
        }

        for slot in composite.slots() {
            match &slot.node {
                Node::Leaf(leaf) if leaf.unknown => {}
                Node::Leaf(leaf) => self.check_enum(leaf)?,
                Node::Group(group) => {
                    if !group.is_consistent() {
                        return Err(SchemaError::GroupCountMismatch {
                            count_tag: group.count_tag,
                            declared: group.declared,
                            actual: group.instances.len(),
                        });
                    }
                    if let Some(group_layout) = layout.group(group.count_tag) {
                        for instance in &group.instances {
                            self.check(
                                instance,
                                &group_layout.layout,
                                group_layout.layout.required_tags(),
                            )?;
                        }
                    }
                }
                Node::Composite(_) => {}
            }
        }
        Ok(())
    }

    fn check_enum(&self, leaf: &Leaf) -> Result<(), SchemaError> {
        let Some(codes) = self.dictionary.enum_values(leaf.tag) else {
            return Ok(());
        };
        if self
            .dictionary
            .get_field(leaf.tag)
            .is_some_and(|field| field.allows_other_values)
        {
            return Ok(());
        }

        let invalid = |value: &str| SchemaError::InvalidEnumValue {
            tag: leaf.tag,
            value: value.to_string(),
        };
        match &leaf.value {
            FieldValue::MultiValue(values) => match values.iter().find(|v| !codes.contains(*v)) {
                Some(value) => Err(invalid(value)),
                None => Ok(()),
            },
            other => match enum_code(other) {
                Some(code) if !codes.contains(&*code) => Err(invalid(&code)),
                _ => Ok(()),
            },
        }
    }
}

/// Returns the wire code of a scalar value, if it can be enumerated.
fn enum_code(value: &FieldValue) -> Option<Cow<'_, str>> {
    match value {
        FieldValue::String(s) => Some(Cow::Borrowed(s.as_str())),
        FieldValue::Char(c) => Some(Cow::Owned(c.to_string())),
        FieldValue::Int(v) => Some(Cow::Owned(v.to_string())),
        FieldValue::Bool(b) => Some(Cow::Borrowed(if *b { "Y" } else { "N" })),
        FieldValue::Decimal(d) => Some(Cow::Owned(d.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixlane_core::{RepeatedGroup, Timestamp, ValidationKind};
    use fixlane_dictionary::embedded;

    fn header(tree: &mut MessageTree) {
        let header = tree.header_mut();
        header.set_field("SenderCompID", 49, "A");
        header.set_field("TargetCompID", 56, "B");
        header.set_field("MsgSeqNum", 34, 1i64);
        header.set_field("SendingTime", 52, Timestamp::from_millis(0));
    }

    fn order(cl_ord_id: &str) -> Composite {
        Composite::new()
            .with_field("ClOrdID", 11, cl_ord_id)
            .with_field("ListSeqNo", 67, 1i64)
            .with_field("Symbol", 55, "IBM")
            .with_field("Side", 54, '1')
            .with_field("OrderQty", 38, rust_decimal::Decimal::from(100))
    }

    fn order_list(declared: usize, orders: Vec<Composite>) -> MessageTree {
        let mut tree = MessageTree::new("FIX.4.4", "E");
        header(&mut tree);
        let mut group = RepeatedGroup::new(73, orders);
        group.declared = declared;
        let body = tree.body_mut();
        body.set_field("ListID", 66, "L1");
        body.set_field("BidType", 394, 3i64);
        body.set_field("TotNoOrders", 68, declared as i64);
        body.push_group("NoOrders", group);
        tree
    }

    #[test]
    fn test_heartbeat_is_valid() {
        let dict = embedded::fix44().unwrap();
        let mut tree = MessageTree::new("FIX.4.4", "0");
        header(&mut tree);
        assert_eq!(Validator::new(&dict).validate(&tree), Ok(()));
    }

    #[test]
    fn test_missing_header_field() {
        let dict = embedded::fix44().unwrap();
        let tree = MessageTree::new("FIX.4.4", "0");
        assert_eq!(
            Validator::new(&dict).validate(&tree),
            Err(SchemaError::MissingRequiredField { tag: 49 })
        );
        assert_eq!(Validator::new(&dict).validate_body(&tree), Ok(()));
    }

    #[test]
    fn test_missing_required_body_field() {
        let dict = embedded::fix44().unwrap();
        let mut tree = MessageTree::new("FIX.4.4", "1");
        header(&mut tree);
        let err = Validator::new(&dict).validate(&tree).unwrap_err();
        assert_eq!(err, SchemaError::MissingRequiredField { tag: 112 });
        assert_eq!(err.tag(), Some(112));
        assert_eq!(err.kind(), ValidationKind::MissingRequired);
    }

    #[test]
    fn test_group_count_mismatch() {
        let dict = embedded::fix44().unwrap();
        let tree = order_list(2, vec![order("A1")]);
        assert_eq!(
            Validator::new(&dict).validate(&tree),
            Err(SchemaError::GroupCountMismatch {
                count_tag: 73,
                declared: 2,
                actual: 1,
            })
        );
    }

    #[test]
    fn test_group_instance_required_field() {
        let dict = embedded::fix44().unwrap();
        let mut incomplete = order("A2");
        incomplete.remove(55);
        let tree = order_list(2, vec![order("A1"), incomplete]);
        assert_eq!(
            Validator::new(&dict).validate(&tree),
            Err(SchemaError::MissingRequiredField { tag: 55 })
        );
    }

    #[test]
    fn test_enum_values() {
        let dict = embedded::fix44().unwrap();
        let mut tree = order_list(1, vec![order("A1")]);
        tree.body_mut().set_field("BidType", 394, 7i64);
        assert_eq!(
            Validator::new(&dict).validate(&tree),
            Err(SchemaError::InvalidEnumValue {
                tag: 394,
                value: "7".to_string(),
            })
        );
    }

    #[test]
    fn test_multi_value_tokens_checked_individually() {
        let dict = embedded::fix44().unwrap();
        let mut tree = MessageTree::new("FIX.4.4", "D");
        header(&mut tree);
        let body = tree.body_mut();
        body.set_field("ClOrdID", 11, "C1");
        body.set_field("Symbol", 55, "IBM");
        body.set_field("Side", 54, '1');
        body.set_field("TransactTime", 60, Timestamp::from_millis(0));
        body.set_field("OrderQty", 38, rust_decimal::Decimal::from(10));
        body.set_field("OrdType", 40, '1');
        body.push_leaf(
            "ExecInst",
            Leaf::new(18, FieldValue::MultiValue(vec!["G".into(), "1".into()])),
        );
        assert_eq!(Validator::new(&dict).validate(&tree), Ok(()));

        tree.body_mut().remove(18);
        tree.body_mut().push_leaf(
            "ExecInst",
            Leaf::new(18, FieldValue::MultiValue(vec!["G".into(), "Z".into()])),
        );
        assert_eq!(
            Validator::new(&dict).validate(&tree),
            Err(SchemaError::InvalidEnumValue {
                tag: 18,
                value: "Z".to_string(),
            })
        );
    }

    #[test]
    fn test_allows_other_values() {
        let dict = embedded::fix44().unwrap();
        let mut tree = MessageTree::new("FIX.4.4", "3");
        header(&mut tree);
        tree.body_mut().set_field("RefSeqNum", 45, 7i64);
        tree.body_mut().set_field("SessionRejectReason", 373, 42i64);
        assert_eq!(Validator::new(&dict).validate(&tree), Ok(()));
    }

    #[test]
    fn test_unknown_message_type() {
        let dict = embedded::fix44().unwrap();
        let tree = MessageTree::new("FIX.4.4", "ZZ");
        assert_eq!(
            Validator::new(&dict).validate_body(&tree),
            Err(SchemaError::UnknownMessageType("ZZ".to_string()))
        );
    }
}
