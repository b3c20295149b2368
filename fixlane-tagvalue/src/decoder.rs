/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Structural message decoder.
//!
//! Turns a framed message into either a typed [`MessageTree`] (dictionary
//! mode) or a flat [`RawForm`] (raw mode). The decoder holds only immutable
//! state, so one instance can serve many sessions.
//!
//! In dictionary mode:
//! - header and trailer fields are routed by tag membership, wherever they
//!   appear in the frame
//! - a group counter opens a group; each instance starts at the group's
//!   delimiter tag and ends at a tag the group does not define
//! - fields the message does not define are rejected, kept as unknown
//!   leaves or dropped, per configuration
//! - embedded documents are parsed and attached next to their field

use crate::coerce::parse_value;
use crate::config::CodecConfig;
use crate::error::{ConfigError, DecodeFailure};
use crate::filter::MessageFilter;
use crate::subdoc::parse_document;
use crate::tokenizer::{RawFields, Tokenizer};
use crate::validator::Validator;
use bytes::Bytes;
use fixlane_core::tree::embedded_document_slot;
use fixlane_core::{
    Composite, DecodeError, FieldValue, Leaf, MessageTree, MsgType, Node, RawField,
    RepeatedGroup, SchemaError, tags,
};
use fixlane_dictionary::{Dictionary, GroupLayout, Layout};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, warn};

/// One field of a raw-mode message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    /// Tag number, `0` for an unresolved name.
    pub tag: u32,
    /// Dictionary or wire name, when known.
    pub name: Option<String>,
    /// Value text (invalid UTF-8 replaced).
    pub value: String,
}

/// Opaque structured form produced in raw mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawForm {
    /// MsgType value, when present.
    pub msg_type: Option<String>,
    /// Session-level classification by message type code.
    pub admin: bool,
    /// Fields in wire order.
    pub fields: Vec<RawEntry>,
    /// The frame bytes.
    pub raw: Bytes,
}

/// Decoded content of one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedContent {
    /// Dictionary-validated tree.
    Structured(MessageTree),
    /// Raw-mode form.
    Raw(RawForm),
}

/// A successfully decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    /// The frame bytes.
    pub raw: Bytes,
    /// Decoded content.
    pub content: DecodedContent,
}

impl DecodedMessage {
    /// Returns the tree in dictionary mode.
    #[must_use]
    pub const fn tree(&self) -> Option<&MessageTree> {
        match &self.content {
            DecodedContent::Structured(tree) => Some(tree),
            DecodedContent::Raw(_) => None,
        }
    }

    /// Consumes the message and returns the tree in dictionary mode.
    #[must_use]
    pub fn into_tree(self) -> Option<MessageTree> {
        match self.content {
            DecodedContent::Structured(tree) => Some(tree),
            DecodedContent::Raw(_) => None,
        }
    }

    /// Returns the raw form in raw mode.
    #[must_use]
    pub const fn raw_form(&self) -> Option<&RawForm> {
        match &self.content {
            DecodedContent::Raw(form) => Some(form),
            DecodedContent::Structured(_) => None,
        }
    }

    /// Returns the MsgType value.
    #[must_use]
    pub fn msg_type(&self) -> Option<&str> {
        match &self.content {
            DecodedContent::Structured(tree) => tree.msg_type(),
            DecodedContent::Raw(form) => form.msg_type.as_deref(),
        }
    }

    /// Returns true for session-level messages.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        match &self.content {
            DecodedContent::Structured(tree) => tree.is_admin(),
            DecodedContent::Raw(form) => form.admin,
        }
    }
}

/// Dictionary-driven decoder.
#[derive(Debug, Clone)]
pub struct StructuralDecoder {
    dictionary: Arc<Dictionary>,
    config: CodecConfig,
    tokenizer: Tokenizer,
    filter: Option<MessageFilter>,
}

impl StructuralDecoder {
    /// Creates a decoder.
    ///
    /// # Errors
    /// Returns `ConfigError` for an invalid separator or filter expression.
    pub fn new(dictionary: Arc<Dictionary>, config: CodecConfig) -> Result<Self, ConfigError> {
        let separator = config.separator()?;
        let filter = match config.filter_expression.as_deref() {
            Some(expression) => Some(MessageFilter::parse(expression, separator.clone())?)
                .filter(|filter| !filter.is_empty()),
            None => None,
        };
        let tokenizer =
            Tokenizer::new(separator).with_empty_normalization(config.normalize_empty_fields);
        Ok(Self {
            dictionary,
            config,
            tokenizer,
            filter,
        })
    }

    /// Returns the dictionary.
    #[must_use]
    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decodes one frame, copying it for the result.
    ///
    /// # Errors
    /// Returns a [`DecodeFailure`] carrying the frame and the cause.
    pub fn decode(&self, frame: &[u8]) -> Result<DecodedMessage, DecodeFailure> {
        self.decode_bytes(Bytes::copy_from_slice(frame))
    }

    /// Decodes one frame already held in a shared buffer.
    ///
    /// # Errors
    /// Returns a [`DecodeFailure`] carrying the frame and the cause.
    pub fn decode_bytes(&self, frame: Bytes) -> Result<DecodedMessage, DecodeFailure> {
        match self.decode_content(&frame) {
            Ok(content) => Ok(DecodedMessage { raw: frame, content }),
            Err(cause) => {
                warn!(len = frame.len(), %cause, "decode failed");
                Err(DecodeFailure { raw: frame, cause })
            }
        }
    }

    fn decode_content(&self, frame: &Bytes) -> Result<DecodedContent, DecodeError> {
        if let Some(filter) = &self.filter {
            filter.check(frame)?;
        }

        let fields = if self.config.field_name_mode {
            self.tokenizer.tokenize_names(frame, &self.dictionary)?
        } else {
            self.tokenizer.tokenize(frame)?
        };

        if self.config.decode_by_dictionary {
            self.decode_tree(&fields).map(DecodedContent::Structured)
        } else {
            Ok(DecodedContent::Raw(self.raw_form(&fields, frame)))
        }
    }

    fn raw_form(&self, fields: &RawFields<'_>, frame: &Bytes) -> RawForm {
        let msg_type = fields
            .iter()
            .find(|field| field.tag == tags::MSG_TYPE)
            .map(RawField::lossy);
        let admin = msg_type.as_deref().is_some_and(MsgType::is_admin_code);
        let fields = fields
            .iter()
            .map(|field| RawEntry {
                tag: field.tag,
                name: field
                    .label
                    .map(str::to_string)
                    .or_else(|| self.dictionary.field_name(field.tag).map(str::to_string)),
                value: field.lossy(),
            })
            .collect();
        RawForm {
            msg_type,
            admin,
            fields,
            raw: frame.clone(),
        }
    }

    fn decode_tree(&self, fields: &[RawField<'_>]) -> Result<MessageTree, DecodeError> {
        let msg_type_field = fields
            .iter()
            .find(|field| field.tag == tags::MSG_TYPE)
            .ok_or(SchemaError::MissingMsgType)?;
        let msg_type = msg_type_field.as_str()?;
        let schema = self
            .dictionary
            .get_message(msg_type)
            .ok_or_else(|| SchemaError::UnknownMessageType(msg_type.to_string()))?;

        let mut header_fields: SmallVec<[RawField<'_>; 16]> = SmallVec::new();
        let mut body_fields: SmallVec<[RawField<'_>; 32]> = SmallVec::new();
        let mut trailer_fields: SmallVec<[RawField<'_>; 4]> = SmallVec::new();
        for field in fields {
            if tags::is_framing_tag(field.tag) {
                continue;
            }
            if !field.is_unknown() && self.dictionary.is_header_tag(field.tag) {
                header_fields.push(*field);
            } else if !field.is_unknown() && self.dictionary.is_trailer_tag(field.tag) {
                trailer_fields.push(*field);
            } else {
                body_fields.push(*field);
            }
        }

        let context = Context { msg_type };
        let header = self.decode_level(&header_fields, self.dictionary.header(), &context)?;
        let body = self.decode_level(&body_fields, schema.layout(), &context)?;
        let trailer = self.decode_level(&trailer_fields, self.dictionary.trailer(), &context)?;
        let tree = MessageTree::from_parts(header, body, trailer, schema.is_admin());

        if self.config.verify_fields {
            Validator::new(&self.dictionary).validate(&tree)?;
        }
        Ok(tree)
    }

    /// Decodes a top-level section, where undefined fields are handled per
    /// configuration instead of ending the section.
    fn decode_level(
        &self,
        fields: &[RawField<'_>],
        layout: &Layout,
        context: &Context<'_>,
    ) -> Result<Composite, DecodeError> {
        let mut composite = Composite::new();
        let mut pos = 0;
        while let Some(field) = fields.get(pos) {
            pos += 1;
            if let Some(group) = layout.group(field.tag) {
                let decoded = self.decode_group(field, fields, &mut pos, group)?;
                composite.push_group(group.name.clone(), decoded);
            } else if !field.is_unknown() && layout.contains(field.tag) {
                self.push_leaf(&mut composite, field)?;
            } else {
                self.push_unknown(&mut composite, field, context)?;
            }
        }
        Ok(composite)
    }

    fn decode_group(
        &self,
        count: &RawField<'_>,
        fields: &[RawField<'_>],
        pos: &mut usize,
        group: &GroupLayout,
    ) -> Result<RepeatedGroup, DecodeError> {
        let declared: usize = count.parse("integer")?;
        let mut instances = Vec::with_capacity(declared.min(64));
        while fields
            .get(*pos)
            .is_some_and(|field| field.tag == group.delimiter_tag)
        {
            instances.push(self.decode_instance(fields, pos, group)?);
        }
        Ok(RepeatedGroup {
            count_tag: group.count_tag,
            declared,
            instances,
        })
    }

    /// Decodes one group instance starting at its delimiter.
    ///
    /// The instance ends at the next delimiter, at a tag the group does not
    /// define, or at a tag already seen in this instance.
    fn decode_instance(
        &self,
        fields: &[RawField<'_>],
        pos: &mut usize,
        group: &GroupLayout,
    ) -> Result<Composite, DecodeError> {
        let layout = &group.layout;
        let mut instance = Composite::new();
        let mut seen: SmallVec<[u32; 16]> = SmallVec::new();
        while let Some(field) = fields.get(*pos) {
            let repeats = !seen.is_empty() && field.tag == group.delimiter_tag;
            if repeats
                || field.is_unknown()
                || !layout.contains(field.tag)
                || seen.contains(&field.tag)
            {
                break;
            }
            seen.push(field.tag);
            *pos += 1;
            if let Some(nested) = layout.group(field.tag) {
                let decoded = self.decode_group(field, fields, pos, nested)?;
                instance.push_group(nested.name.clone(), decoded);
            } else {
                self.push_leaf(&mut instance, field)?;
            }
        }
        Ok(instance)
    }

    fn push_leaf(&self, composite: &mut Composite, field: &RawField<'_>) -> Result<(), DecodeError> {
        let Some(def) = self.dictionary.get_field(field.tag) else {
            composite.push_leaf(field.tag.to_string(), Leaf::unknown(field.tag, field.lossy()));
            return Ok(());
        };
        let value = parse_value(field, def, &self.config)?;
        composite.push_leaf(def.name.clone(), Leaf::new(field.tag, value));

        if def.embedded_document && !field.value.is_empty() {
            let document = parse_document(field.tag, field.value, &self.dictionary, &self.config)?;
            composite.push(embedded_document_slot(&def.name), Node::Composite(document));
        }
        Ok(())
    }

    fn push_unknown(
        &self,
        composite: &mut Composite,
        field: &RawField<'_>,
        context: &Context<'_>,
    ) -> Result<(), DecodeError> {
        if self.config.verify_tags {
            return Err(SchemaError::TagNotDefined {
                tag: field.tag,
                msg_type: context.msg_type.to_string(),
            }
            .into());
        }
        if !self.config.allow_unknown_fields {
            debug!(tag = field.tag, msg_type = context.msg_type, "dropping undefined field");
            return Ok(());
        }

        debug!(tag = field.tag, msg_type = context.msg_type, "keeping undefined field");
        let name = field
            .label
            .map(str::to_string)
            .or_else(|| self.dictionary.field_name(field.tag).map(str::to_string))
            .unwrap_or_else(|| field.tag.to_string());
        composite.push_leaf(name, Leaf::unknown(field.tag, FieldValue::String(field.lossy())));
        Ok(())
    }
}

/// Per-message decode context.
struct Context<'a> {
    msg_type: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::calculate_checksum;
    use fixlane_core::CoercionError;
    use fixlane_dictionary::embedded;

    const HEADER: &str = "49=A\x0156=B\x0134=1\x0152=20240101-12:30:00.000\x01";

    fn frame(msg_type: &str, body: &str) -> Vec<u8> {
        let body = format!("35={msg_type}\x01{HEADER}{body}");
        let mut msg = format!("8=FIX.4.4\x019={}\x01{body}", body.len());
        let sum = calculate_checksum(msg.as_bytes());
        msg.push_str(&format!("10={sum:03}\x01"));
        msg.into_bytes()
    }

    fn decoder(config: CodecConfig) -> StructuralDecoder {
        StructuralDecoder::new(Arc::new(embedded::fix44().unwrap()), config).unwrap()
    }

    #[test]
    fn test_decode_heartbeat() {
        let msg = frame("0", "");
        let decoded = decoder(CodecConfig::default()).decode(&msg).unwrap();
        assert_eq!(&decoded.raw[..], &msg[..]);
        assert!(decoded.is_admin());

        let tree = decoded.tree().unwrap();
        assert!(tree.body().is_empty());
        assert!(tree.trailer().is_empty());
        assert_eq!(tree.begin_string(), Some("FIX.4.4"));
        assert_eq!(tree.header().value(49).and_then(FieldValue::as_str), Some("A"));
        assert_eq!(tree.header().value(34).and_then(FieldValue::as_i64), Some(1));
        assert!(tree.header().leaf(9).is_none());
    }

    #[test]
    fn test_decode_nested_groups() {
        let body = "66=L1\x01394=3\x0168=2\x0173=2\x01\
                    11=A1\x0167=1\x01453=1\x01448=TRADER\x01452=11\x0155=IBM\x0154=1\x0138=100\x01\
                    11=A2\x0167=2\x0155=MSFT\x0154=2\x0138=50\x0144=10.25\x01";
        let tree = decoder(CodecConfig::default())
            .decode(&frame("E", body))
            .unwrap()
            .into_tree()
            .unwrap();

        let orders = tree.body().group(73).unwrap();
        assert_eq!(orders.declared, 2);
        assert_eq!(orders.instances.len(), 2);
        let first = &orders.instances[0];
        assert_eq!(first.value(55).and_then(FieldValue::as_str), Some("IBM"));
        let parties = first.group(453).unwrap();
        assert_eq!(parties.instances.len(), 1);
        assert_eq!(
            parties.instances[0].value(448).and_then(FieldValue::as_str),
            Some("TRADER")
        );
        let second = &orders.instances[1];
        assert_eq!(second.value(11).and_then(FieldValue::as_str), Some("A2"));
        assert!(second.value(44).and_then(FieldValue::as_decimal).is_some());
    }

    #[test]
    fn test_group_count_mismatch_fails_with_raw() {
        let body = "66=L1\x01394=3\x0168=2\x0173=2\x01\
                    11=A1\x0167=1\x0155=IBM\x0154=1\x0138=100\x01";
        let msg = frame("E", body);
        let failure = decoder(CodecConfig::default()).decode(&msg).unwrap_err();
        assert_eq!(&failure.raw[..], &msg[..]);
        assert_eq!(
            failure.cause,
            DecodeError::Schema(SchemaError::GroupCountMismatch {
                count_tag: 73,
                declared: 2,
                actual: 1,
            })
        );
    }

    #[test]
    fn test_header_fields_routed_out_of_order() {
        let body = "112=PING\x0143=N\x01";
        let tree = decoder(CodecConfig::default())
            .decode(&frame("1", body))
            .unwrap()
            .into_tree()
            .unwrap();
        assert_eq!(tree.header().value(43).and_then(FieldValue::as_bool), Some(false));
        assert_eq!(tree.body().len(), 1);
    }

    #[test]
    fn test_unknown_field_policies() {
        let msg = frame("0", "9999=x\x01");

        let err = decoder(CodecConfig::default()).decode(&msg).unwrap_err();
        assert_eq!(
            err.cause,
            DecodeError::Schema(SchemaError::TagNotDefined {
                tag: 9999,
                msg_type: "0".to_string(),
            })
        );

        let tolerant = decoder(CodecConfig::new().with_verify_tags(false));
        let tree = tolerant.decode(&msg).unwrap().into_tree().unwrap();
        let leaf = tree.body().leaf(9999).unwrap();
        assert!(leaf.unknown);
        assert_eq!(leaf.value.as_str(), Some("x"));

        let dropping = decoder(
            CodecConfig::new()
                .with_verify_tags(false)
                .with_allow_unknown_fields(false),
        );
        let tree = dropping.decode(&msg).unwrap().into_tree().unwrap();
        assert!(tree.body().is_empty());
    }

    #[test]
    fn test_tolerated_field_skips_enum_check() {
        let msg = frame("0", "54=Z\x01");
        let tolerant = decoder(CodecConfig::new().with_verify_tags(false));
        let tree = tolerant.decode(&msg).unwrap().into_tree().unwrap();
        let leaf = tree.body().leaf(54).unwrap();
        assert!(leaf.unknown);
        assert_eq!(leaf.value.as_str(), Some("Z"));
    }

    #[test]
    fn test_coercion_failure() {
        let failure = decoder(CodecConfig::default())
            .decode(&frame("A", "98=0\x01108=soon\x01"))
            .unwrap_err();
        assert_eq!(
            failure.cause,
            DecodeError::Coercion(CoercionError::InvalidValue {
                tag: 108,
                value: "soon".to_string(),
                expected: "integer",
            })
        );
    }

    #[test]
    fn test_unknown_message_type() {
        let failure = decoder(CodecConfig::default())
            .decode(&frame("ZZ", ""))
            .unwrap_err();
        assert_eq!(
            failure.cause,
            DecodeError::Schema(SchemaError::UnknownMessageType("ZZ".to_string()))
        );
    }

    #[test]
    fn test_raw_mode() {
        let decoder = decoder(CodecConfig::new().with_decode_by_dictionary(false));
        let msg = frame("ZZ", "9999=x\x01");
        let decoded = decoder.decode(&msg).unwrap();
        let form = decoded.raw_form().unwrap();
        assert_eq!(form.msg_type.as_deref(), Some("ZZ"));
        assert!(!form.admin);
        assert_eq!(form.fields[0].name.as_deref(), Some("BeginString"));
        assert_eq!(form.fields.last().map(|f| f.tag), Some(10));
        assert_eq!(&form.raw[..], &msg[..]);

        let logout = decoder.decode(&frame("5", "")).unwrap();
        assert!(logout.is_admin());
    }

    #[test]
    fn test_filter_rejects_before_decode() {
        let decoder = decoder(CodecConfig::new().with_filter_expression("35:D|8"));
        let failure = decoder.decode(&frame("0", "")).unwrap_err();
        assert_eq!(
            failure.cause,
            DecodeError::Filtered {
                term: "35:D|8".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_filter_rejected_at_construction() {
        let result = StructuralDecoder::new(
            Arc::new(embedded::fix44().unwrap()),
            CodecConfig::new().with_filter_expression("35"),
        );
        assert!(matches!(result, Err(ConfigError::InvalidFilter { .. })));
    }

    #[test]
    fn test_embedded_document_attached() {
        let xml = r#"<Order Symbol="IBM"/>"#;
        let body = format!("212={}\x01213={xml}\x01", xml.len());
        let tree = decoder(CodecConfig::default())
            .decode(&frame("n", &body))
            .unwrap()
            .into_tree()
            .unwrap();
        let document = tree.body().embedded_document("XmlData").unwrap();
        let order = document.composite("Order").unwrap();
        assert_eq!(order.value(55).and_then(FieldValue::as_str), Some("IBM"));
    }

    #[test]
    fn test_each_embedded_document_keeps_its_own_slot() {
        use fixlane_dictionary::{FieldDef, FieldType, Member, MessageCategory, MessageDef, Version};

        let mut builder = Dictionary::builder(Version::Fix44);
        for (tag, name, field_type) in [
            (8, "BeginString", FieldType::String),
            (9, "BodyLength", FieldType::Length),
            (10, "CheckSum", FieldType::String),
            (34, "MsgSeqNum", FieldType::SeqNum),
            (35, "MsgType", FieldType::String),
            (49, "SenderCompID", FieldType::String),
            (52, "SendingTime", FieldType::UtcTimestamp),
            (56, "TargetCompID", FieldType::String),
            (55, "Symbol", FieldType::String),
        ] {
            builder.add_field(FieldDef::new(tag, name, field_type));
        }
        builder
            .add_field(FieldDef::new(213, "XmlData", FieldType::XmlData).with_embedded_document())
            .add_field(FieldDef::new(5001, "RiskXml", FieldType::XmlData).with_embedded_document())
            .header(vec![
                Member::required(8),
                Member::required(9),
                Member::required(35),
                Member::required(49),
                Member::required(56),
                Member::required(34),
                Member::required(52),
            ])
            .trailer(vec![Member::required(10)])
            .add_message(MessageDef::new(
                "n",
                "XMLnonFIX",
                MessageCategory::App,
                vec![Member::optional(213), Member::optional(5001)],
            ));
        let decoder =
            StructuralDecoder::new(Arc::new(builder.build().unwrap()), CodecConfig::default())
                .unwrap();

        let body = "213=<Order Symbol=\"IBM\"/>\x015001=<Order Symbol=\"MSFT\"/>\x01";
        let tree = decoder.decode(&frame("n", body)).unwrap().into_tree().unwrap();

        let symbol = |field: &str| {
            tree.body()
                .embedded_document(field)
                .and_then(|document| document.composite("Order"))
                .and_then(|order| order.value(55))
                .and_then(FieldValue::as_str)
                .map(str::to_string)
        };
        assert_eq!(symbol("XmlData").as_deref(), Some("IBM"));
        assert_eq!(symbol("RiskXml").as_deref(), Some("MSFT"));
    }

    #[test]
    fn test_field_name_mode() {
        let decoder = decoder(CodecConfig::new().with_field_name_mode(true));
        let msg = b"BeginString=FIX.4.4\x01MsgType=0\x01SenderCompID=A\x01TargetCompID=B\x01\
                    MsgSeqNum=1\x01SendingTime=20240101-12:30:00\x01";
        let tree = decoder.decode(msg).unwrap().into_tree().unwrap();
        assert_eq!(tree.msg_type(), Some("0"));
        assert_eq!(tree.header().value(56).and_then(FieldValue::as_str), Some("B"));
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let body = "66=L1\x01394=3\x0168=2\x0173=2\x01\
                    11=A1\x0167=1\x0155=IBM\x0154=1\x0138=100\x01";
        let decoder = decoder(CodecConfig::new().with_verify_fields(false));
        let tree = decoder.decode(&frame("E", body)).unwrap().into_tree().unwrap();
        assert!(!tree.body().group(73).unwrap().is_consistent());
    }
}
