/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! FIX message encoders.
//!
//! [`Encoder`] appends `tag=value` fields and frames them with BeginString,
//! BodyLength and CheckSum. [`StructuralEncoder`] walks a [`MessageTree`] in
//! dictionary order on top of it, and also offers the dirty paths that keep
//! caller order for deliberately non-conformant messages.

use crate::checksum::{calculate_checksum, format_checksum};
use crate::coerce::{effective_precision, write_value};
use crate::config::CodecConfig;
use crate::error::ConfigError;
use crate::separator::Separator;
use bytes::{BufMut, BytesMut};
use chrono::Timelike;
use fixlane_core::{Composite, EncodeError, FieldValue, Leaf, MessageTree, Node, RepeatedGroup, tags};
use fixlane_dictionary::{Dictionary, FieldDef, Layout, LayoutEntry};
use std::sync::Arc;

/// Low-level FIX message encoder.
///
/// The encoder builds FIX messages by appending fields in tag=value format.
/// It handles BeginString, BodyLength, and Checksum fields automatically.
#[derive(Debug)]
pub struct Encoder {
    /// Buffer for the message body (between BodyLength and Checksum).
    body: BytesMut,
    /// The BeginString value (e.g., "FIX.4.4").
    begin_string: String,
    separator: Separator,
}

impl Encoder {
    /// Creates a new encoder with the specified BeginString.
    ///
    /// # Arguments
    /// * `begin_string` - The FIX version string (e.g., "FIX.4.4")
    #[must_use]
    pub fn new(begin_string: impl Into<String>) -> Self {
        Self::with_capacity(begin_string, 256)
    }

    /// Creates a new encoder with pre-allocated capacity.
    ///
    /// # Arguments
    /// * `begin_string` - The FIX version string
    /// * `capacity` - Initial buffer capacity in bytes
    #[must_use]
    pub fn with_capacity(begin_string: impl Into<String>, capacity: usize) -> Self {
        Self {
            body: BytesMut::with_capacity(capacity),
            begin_string: begin_string.into(),
            separator: Separator::soh(),
        }
    }

    /// Sets the field separator.
    #[must_use]
    pub fn with_separator(mut self, separator: Separator) -> Self {
        self.separator = separator;
        self
    }

    /// Appends a field with a string value.
    #[inline]
    pub fn put_str(&mut self, tag: u32, value: &str) {
        self.put_raw(tag, value.as_bytes());
    }

    /// Appends a field with an integer value.
    #[inline]
    pub fn put_int(&mut self, tag: u32, value: i64) {
        let mut buf = itoa::Buffer::new();
        self.put_raw(tag, buf.format(value).as_bytes());
    }

    /// Appends a field with an unsigned integer value.
    #[inline]
    pub fn put_uint(&mut self, tag: u32, value: u64) {
        let mut buf = itoa::Buffer::new();
        self.put_raw(tag, buf.format(value).as_bytes());
    }

    /// Appends a field with a boolean value (Y/N).
    #[inline]
    pub fn put_bool(&mut self, tag: u32, value: bool) {
        self.put_raw(tag, if value { b"Y" } else { b"N" });
    }

    /// Appends a field with a single character value.
    #[inline]
    pub fn put_char(&mut self, tag: u32, value: char) {
        let mut buf = [0u8; 4];
        self.put_raw(tag, value.encode_utf8(&mut buf).as_bytes());
    }

    /// Appends a field with raw bytes.
    ///
    /// # Arguments
    /// * `tag` - The field tag number
    /// * `value` - The field value bytes
    #[inline]
    pub fn put_raw(&mut self, tag: u32, value: &[u8]) {
        self.put_tag(tag);
        self.body.put_slice(value);
        self.body.put_slice(self.separator.as_bytes());
    }

    /// Appends a typed field using the definition's formatting rules.
    ///
    /// # Errors
    /// Returns `EncodeError::InvalidFieldValue` if a textual value contains
    /// the field separator, or a time value has digits finer than the
    /// field's effective precision.
    pub fn put_field(
        &mut self,
        tag: u32,
        value: &FieldValue,
        def: Option<&FieldDef>,
        config: &CodecConfig,
    ) -> Result<(), EncodeError> {
        let embeds_separator = match value {
            FieldValue::String(s) => self.separator.find(s.as_bytes()).is_some(),
            FieldValue::MultiValue(values) => values
                .iter()
                .any(|v| self.separator.find(v.as_bytes()).is_some()),
            _ => false,
        };
        if embeds_separator {
            return Err(EncodeError::InvalidFieldValue {
                tag,
                reason: "value contains the field separator".to_string(),
            });
        }

        let precision = effective_precision(def, config);
        let too_fine = match value {
            FieldValue::Timestamp(ts) => !ts.fits(precision),
            FieldValue::Time(t) => u64::from(t.nanosecond()) % precision.unit_nanos() != 0,
            _ => false,
        };
        if too_fine {
            return Err(EncodeError::InvalidFieldValue {
                tag,
                reason: format!("value is finer than {precision} precision"),
            });
        }

        self.put_tag(tag);
        write_value(&mut self.body, value, def, config);
        self.body.put_slice(self.separator.as_bytes());
        Ok(())
    }

    #[inline]
    fn put_tag(&mut self, tag: u32) {
        let mut tag_buf = itoa::Buffer::new();
        self.body.put_slice(tag_buf.format(tag).as_bytes());
        self.body.put_u8(b'=');
    }

    /// Finalizes the message and returns the complete encoded bytes.
    ///
    /// BeginString (tag 8) and BodyLength (tag 9) are prepended and
    /// CheckSum (tag 10) is appended.
    #[must_use]
    pub fn finish(self) -> BytesMut {
        let sep = self.separator.as_bytes();
        let body_len = self.body.len();

        let mut message = BytesMut::with_capacity(body_len + self.begin_string.len() + 32);
        message.put_slice(b"8=");
        message.put_slice(self.begin_string.as_bytes());
        message.put_slice(sep);
        message.put_slice(b"9=");
        let mut len_buf = itoa::Buffer::new();
        message.put_slice(len_buf.format(body_len).as_bytes());
        message.put_slice(sep);
        message.put_slice(&self.body);

        let checksum = calculate_checksum(&message);
        message.put_slice(b"10=");
        message.put_slice(&format_checksum(checksum));
        message.put_slice(sep);

        message
    }

    /// Returns the current body length.
    #[inline]
    #[must_use]
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Clears the encoder for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.body.clear();
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new("FIX.4.4")
    }
}

/// Dictionary-driven encoder for message trees.
#[derive(Debug, Clone)]
pub struct StructuralEncoder {
    dictionary: Arc<Dictionary>,
    config: CodecConfig,
    separator: Separator,
}

impl StructuralEncoder {
    /// Creates an encoder.
    ///
    /// # Errors
    /// Returns `ConfigError::EmptySeparator` for an empty separator.
    pub fn new(dictionary: Arc<Dictionary>, config: CodecConfig) -> Result<Self, ConfigError> {
        let separator = config.separator()?;
        Ok(Self {
            dictionary,
            config,
            separator,
        })
    }

    /// Returns the dictionary.
    #[must_use]
    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }

    fn encoder(&self, begin_string: &str) -> Encoder {
        Encoder::new(begin_string).with_separator(self.separator.clone())
    }

    fn begin_string<'t>(&'t self, tree: &'t MessageTree) -> &'t str {
        tree.begin_string()
            .unwrap_or_else(|| self.dictionary.version().begin_string())
    }

    /// Encodes a tree in dictionary order.
    ///
    /// MsgType leads the header; header, body and trailer fields follow in
    /// layout order, then any fields the layout does not place, in stored
    /// order. Group counters are recomputed from the instances present.
    /// Without a BeginString in the header the dictionary version is used.
    ///
    /// # Errors
    /// Returns `EncodeError` if MsgType is missing or unknown, or a value
    /// cannot be written.
    pub fn encode(&self, tree: &MessageTree) -> Result<BytesMut, EncodeError> {
        let msg_type = tree.msg_type().ok_or(EncodeError::MissingField {
            tag: tags::MSG_TYPE,
        })?;
        let schema = self
            .dictionary
            .get_message(msg_type)
            .ok_or_else(|| EncodeError::UnknownMessageType(msg_type.to_string()))?;

        let mut encoder = self.encoder(self.begin_string(tree));
        encoder.put_str(tags::MSG_TYPE, msg_type);
        self.write_ordered(
            &mut encoder,
            tree.header(),
            self.dictionary.header(),
            &[tags::BEGIN_STRING, tags::MSG_TYPE],
        )?;
        self.write_ordered(&mut encoder, tree.body(), schema.layout(), &[])?;
        self.write_ordered(&mut encoder, tree.trailer(), self.dictionary.trailer(), &[])?;
        Ok(encoder.finish())
    }

    /// Encodes fields in the order given, with no schema checks.
    ///
    /// BodyLength and CheckSum are still computed; entries for tags 8, 9
    /// and 10 are ignored.
    ///
    /// # Errors
    /// Returns `EncodeError::InvalidFieldValue` if a value cannot be written.
    pub fn encode_dirty(
        &self,
        begin_string: &str,
        fields: &[(u32, FieldValue)],
    ) -> Result<BytesMut, EncodeError> {
        let mut encoder = self.encoder(begin_string);
        for (tag, value) in fields {
            if *tag == tags::BEGIN_STRING || tags::is_framing_tag(*tag) {
                continue;
            }
            encoder.put_field(*tag, value, self.dictionary.get_field(*tag), &self.config)?;
        }
        Ok(encoder.finish())
    }

    /// Encodes a tree in its stored slot order.
    ///
    /// Group counters are written as declared, so a tree whose counts
    /// disagree with its instances is reproduced as is.
    ///
    /// # Errors
    /// Returns `EncodeError::InvalidFieldValue` if a value cannot be written.
    pub fn encode_unordered(&self, tree: &MessageTree) -> Result<BytesMut, EncodeError> {
        let mut encoder = self.encoder(self.begin_string(tree));
        for part in [tree.header(), tree.body(), tree.trailer()] {
            self.write_stored(&mut encoder, part)?;
        }
        Ok(encoder.finish())
    }

    fn write_ordered(
        &self,
        encoder: &mut Encoder,
        composite: &Composite,
        layout: &Layout,
        skip: &[u32],
    ) -> Result<(), EncodeError> {
        for entry in layout.entries() {
            match entry {
                LayoutEntry::Field { tag, .. } => {
                    if skip.contains(tag) || tags::is_framing_tag(*tag) {
                        continue;
                    }
                    if let Some(leaf) = composite.leaf(*tag)
                        && !leaf.unknown
                    {
                        self.write_leaf(encoder, leaf)?;
                    }
                }
                LayoutEntry::Group(group_layout) => {
                    if let Some(group) = composite.group(group_layout.count_tag) {
                        encoder.put_uint(group.count_tag, group.instances.len() as u64);
                        for instance in &group.instances {
                            self.write_ordered(encoder, instance, &group_layout.layout, &[])?;
                        }
                    }
                }
            }
        }

        for slot in composite.slots() {
            match &slot.node {
                Node::Leaf(leaf) => {
                    let placed = !leaf.unknown && layout.contains(leaf.tag);
                    let writable = leaf.tag != 0
                        && !tags::is_framing_tag(leaf.tag)
                        && !skip.contains(&leaf.tag);
                    if !placed && writable {
                        self.write_leaf(encoder, leaf)?;
                    }
                }
                Node::Group(group) if layout.group(group.count_tag).is_none() => {
                    self.write_group_stored(encoder, group, group.instances.len())?;
                }
                Node::Group(_) | Node::Composite(_) => {}
            }
        }
        Ok(())
    }

    fn write_stored(&self, encoder: &mut Encoder, composite: &Composite) -> Result<(), EncodeError> {
        for slot in composite.slots() {
            match &slot.node {
                Node::Leaf(leaf) => {
                    if leaf.tag != 0
                        && leaf.tag != tags::BEGIN_STRING
                        && !tags::is_framing_tag(leaf.tag)
                    {
                        self.write_leaf(encoder, leaf)?;
                    }
                }
                Node::Group(group) => self.write_group_stored(encoder, group, group.declared)?,
                Node::Composite(_) => {}
            }
        }
        Ok(())
    }

    fn write_group_stored(
        &self,
        encoder: &mut Encoder,
        group: &RepeatedGroup,
        count: usize,
    ) -> Result<(), EncodeError> {
        encoder.put_uint(group.count_tag, count as u64);
        for instance in &group.instances {
            self.write_stored(encoder, instance)?;
        }
        Ok(())
    }

    fn write_leaf(&self, encoder: &mut Encoder, leaf: &Leaf) -> Result<(), EncodeError> {
        encoder.put_field(
            leaf.tag,
            &leaf.value,
            self.dictionary.get_field(leaf.tag),
            &self.config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::parse_checksum;
    use fixlane_core::Timestamp;
    use fixlane_dictionary::embedded;
    use rust_decimal::Decimal;

    fn encoder() -> StructuralEncoder {
        StructuralEncoder::new(Arc::new(embedded::fix44().unwrap()), CodecConfig::default())
            .unwrap()
    }

    fn with_header(msg_type: &str) -> MessageTree {
        let mut tree = MessageTree::new("FIX.4.4", msg_type);
        let header = tree.header_mut();
        header.set_field("SendingTime", 52, Timestamp::from_millis(1_704_112_200_000));
        header.set_field("MsgSeqNum", 34, 7i64);
        header.set_field("TargetCompID", 56, "B");
        header.set_field("SenderCompID", 49, "A");
        tree
    }

    fn text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).replace('\x01', "|")
    }

    #[test]
    fn test_encoder_basic() {
        let mut encoder = Encoder::new("FIX.4.4");
        encoder.put_str(35, "0");
        encoder.put_uint(34, 1);
        encoder.put_bool(43, false);
        encoder.put_char(54, '1');
        encoder.put_int(36, -2);
        let message = text(&encoder.finish());
        assert!(message.starts_with("8=FIX.4.4|9=26|35=0|"));
        assert!(message.contains("|43=N|54=1|36=-2|"));
    }

    #[test]
    fn test_encoder_trailer_invariants() {
        let mut encoder = Encoder::new("FIX.4.4");
        encoder.put_str(35, "0");
        encoder.put_str(49, "SENDER");
        let message = encoder.finish();

        let checksum_start = message.len() - 7;
        assert_eq!(&message[checksum_start..checksum_start + 3], b"10=");
        assert_eq!(
            parse_checksum(&message[checksum_start + 3..checksum_start + 6]),
            Some(calculate_checksum(&message[..checksum_start]))
        );
        let body_start = b"8=FIX.4.4\x019=15\x01".len();
        assert_eq!(checksum_start - body_start, 15);
    }

    #[test]
    fn test_encoder_custom_separator() {
        let mut encoder = Encoder::new("FIX.4.4").with_separator(Separator::new(b"|").unwrap());
        encoder.put_str(35, "0");
        let message = encoder.finish();
        assert!(message.starts_with(b"8=FIX.4.4|9=5|35=0|10="));
        assert_eq!(message.last(), Some(&b'|'));
    }

    #[test]
    fn test_encoder_clear() {
        let mut encoder = Encoder::default();
        encoder.put_str(35, "0");
        assert!(encoder.body_len() > 0);
        encoder.clear();
        assert_eq!(encoder.body_len(), 0);
    }

    #[test]
    fn test_encode_orders_header_by_layout() {
        let message = text(&encoder().encode(&with_header("0")).unwrap());
        assert!(message.starts_with("8=FIX.4.4|9="));
        assert!(message.contains("|35=0|49=A|56=B|34=7|52=20240101-12:30:00.000|10="));
    }

    #[test]
    fn test_encode_recomputes_group_count() {
        let mut tree = with_header("W");
        let entry = |kind: char, px: i64| {
            Composite::new()
                .with_field("MDEntryType", 269, kind)
                .with_field("MDEntryPx", 270, Decimal::from(px))
        };
        let mut group = RepeatedGroup::new(268, vec![entry('0', 10), entry('1', 11)]);
        group.declared = 5;
        let body = tree.body_mut();
        body.push_group("NoMDEntries", group);
        body.set_field("Symbol", 55, "IBM");

        let encoder = encoder();
        let ordered = text(&encoder.encode(&tree).unwrap());
        assert!(ordered.contains("|55=IBM|268=2|269=0|270=10|269=1|270=11|10="));

        let unordered = text(&encoder.encode_unordered(&tree).unwrap());
        assert!(unordered.contains("|268=5|269=0|270=10|269=1|270=11|55=IBM|10="));
    }

    #[test]
    fn test_encode_unknown_leaves_follow_layout() {
        let mut tree = with_header("0");
        tree.body_mut().push_leaf("9999", Leaf::unknown(9999, "x"));
        tree.body_mut().set_field("TestReqID", 112, "T1");
        let message = text(&encoder().encode(&tree).unwrap());
        assert!(message.contains("|112=T1|9999=x|10="));
    }

    #[test]
    fn test_encode_requires_known_msg_type() {
        let encoder = encoder();
        let tree = MessageTree::from_parts(
            Composite::new(),
            Composite::new(),
            Composite::new(),
            false,
        );
        assert_eq!(
            encoder.encode(&tree),
            Err(EncodeError::MissingField { tag: 35 })
        );
        assert_eq!(
            encoder.encode(&with_header("ZZ")),
            Err(EncodeError::UnknownMessageType("ZZ".to_string()))
        );
    }

    #[test]
    fn test_encode_rejects_embedded_separator() {
        let mut tree = with_header("1");
        tree.body_mut().set_field("TestReqID", 112, "a\x01b");
        assert!(matches!(
            encoder().encode(&tree),
            Err(EncodeError::InvalidFieldValue { tag: 112, .. })
        ));
    }

    #[test]
    fn test_encode_dirty_keeps_caller_order() {
        let fields = vec![
            (35, FieldValue::from("D")),
            (9, FieldValue::from(999i64)),
            (55, FieldValue::from("IBM")),
            (49, FieldValue::from("A")),
            (55, FieldValue::from("MSFT")),
        ];
        let message = encoder().encode_dirty("FIX.4.2", &fields).unwrap();
        let rendered = text(&message);
        assert!(rendered.starts_with("8=FIX.4.2|9=25|35=D|55=IBM|49=A|55=MSFT|10="));
    }
}
