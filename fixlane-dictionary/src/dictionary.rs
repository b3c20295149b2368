/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Immutable dictionary and its builder.
//!
//! A [`DictionaryBuilder`] collects authored definitions and, in
//! [`DictionaryBuilder::build`], resolves every tag, inlines components,
//! checks group delimiters and precomputes the lookup indexes. The resulting
//! [`Dictionary`] is read-only, `Send + Sync`, and is meant to be shared
//! behind an `Arc` by any number of decoders and encoders.

use crate::error::DictionaryError;
use crate::layout::{GroupLayout, Layout, LayoutEntry};
use crate::schema::{
    ComponentDef, EnumValue, FieldDef, MessageCategory, MessageDef, Member, Version,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A message definition with its flattened layout.
#[derive(Debug, Clone)]
pub struct MessageSchema {
    def: MessageDef,
    layout: Layout,
    required: Vec<u32>,
}

impl MessageSchema {
    /// Returns the message type code.
    #[must_use]
    pub fn msg_type(&self) -> &str {
        &self.def.msg_type
    }

    /// Returns the message name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Returns the message category.
    #[must_use]
    pub const fn category(&self) -> MessageCategory {
        self.def.category
    }

    /// Returns true for session-level messages.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.def.category == MessageCategory::Admin
    }

    /// Returns the authored definition.
    #[must_use]
    pub const fn definition(&self) -> &MessageDef {
        &self.def
    }

    /// Returns the flattened body layout.
    #[must_use]
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Returns the required top-level body tags.
    #[must_use]
    pub fn required_tags(&self) -> &[u32] {
        &self.required
    }
}

/// A built, immutable FIX dictionary.
#[derive(Debug, Clone)]
pub struct Dictionary {
    version: Version,
    fields: HashMap<u32, FieldDef>,
    fields_by_name: HashMap<String, u32>,
    messages: HashMap<String, MessageSchema>,
    messages_by_name: HashMap<String, String>,
    components: HashMap<String, ComponentDef>,
    enum_codes: HashMap<u32, HashSet<String>>,
    header: Layout,
    trailer: Layout,
}

impl Dictionary {
    /// Starts building a dictionary for the given version.
    #[must_use]
    pub fn builder(version: Version) -> DictionaryBuilder {
        DictionaryBuilder::new(version)
    }

    /// Returns the FIX version.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// Gets a field definition by tag.
    #[must_use]
    pub fn get_field(&self, tag: u32) -> Option<&FieldDef> {
        self.fields.get(&tag)
    }

    /// Gets a field definition by name.
    #[must_use]
    pub fn get_field_by_name(&self, name: &str) -> Option<&FieldDef> {
        self.fields_by_name
            .get(name)
            .and_then(|tag| self.fields.get(tag))
    }

    /// Resolves a field name to its tag.
    #[must_use]
    pub fn tag_for_name(&self, name: &str) -> Option<u32> {
        self.fields_by_name.get(name).copied()
    }

    /// Returns the field name for a tag.
    #[must_use]
    pub fn field_name(&self, tag: u32) -> Option<&str> {
        self.fields.get(&tag).map(|field| field.name.as_str())
    }

    /// Gets a message schema by type code.
    #[must_use]
    pub fn get_message(&self, msg_type: &str) -> Option<&MessageSchema> {
        self.messages.get(msg_type)
    }

    /// Gets a message schema by name.
    #[must_use]
    pub fn get_message_by_name(&self, name: &str) -> Option<&MessageSchema> {
        self.messages_by_name
            .get(name)
            .and_then(|msg_type| self.messages.get(msg_type))
    }

    /// Gets a component definition by name.
    #[must_use]
    pub fn get_component(&self, name: &str) -> Option<&ComponentDef> {
        self.components.get(name)
    }

    /// Finds the group of a message whose entries start with `delimiter_tag`.
    ///
    /// Header and trailer groups are searched as well.
    #[must_use]
    pub fn group(&self, msg_type: &str, delimiter_tag: u32) -> Option<&GroupLayout> {
        self.messages
            .get(msg_type)
            .and_then(|message| message.layout.find_group_by_delimiter(delimiter_tag))
            .or_else(|| self.header.find_group_by_delimiter(delimiter_tag))
            .or_else(|| self.trailer.find_group_by_delimiter(delimiter_tag))
    }

    /// Returns the enumerated codes of a field, if it is enumerated.
    #[must_use]
    pub fn enum_values(&self, tag: u32) -> Option<&HashSet<String>> {
        self.enum_codes.get(&tag)
    }

    /// Returns true if `code` is acceptable for `tag`.
    ///
    /// Fields without an enumeration, or that allow other values, accept
    /// anything.
    #[must_use]
    pub fn is_valid_value(&self, tag: u32, code: &str) -> bool {
        match (self.enum_codes.get(&tag), self.fields.get(&tag)) {
            (Some(codes), Some(field)) => field.allows_other_values || codes.contains(code),
            _ => true,
        }
    }

    /// Returns the required body tags of a message type.
    #[must_use]
    pub fn required_fields(&self, msg_type: &str) -> Option<&[u32]> {
        self.messages
            .get(msg_type)
            .map(MessageSchema::required_tags)
    }

    /// Returns the flattened header layout.
    #[must_use]
    pub const fn header(&self) -> &Layout {
        &self.header
    }

    /// Returns the flattened trailer layout.
    #[must_use]
    pub const fn trailer(&self) -> &Layout {
        &self.trailer
    }

    /// Returns true if `tag` belongs to the header at any depth.
    #[inline]
    #[must_use]
    pub fn is_header_tag(&self, tag: u32) -> bool {
        self.header.contains_deep(tag)
    }

    /// Returns true if `tag` belongs to the trailer at any depth.
    #[inline]
    #[must_use]
    pub fn is_trailer_tag(&self, tag: u32) -> bool {
        self.trailer.contains_deep(tag)
    }

    /// Returns an iterator over all field definitions.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.values()
    }

    /// Returns an iterator over all message schemas.
    pub fn messages(&self) -> impl Iterator<Item = &MessageSchema> {
        self.messages.values()
    }
}

/// Collects authored definitions and validates them into a [`Dictionary`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryBuilder {
    version: Version,
    #[serde(default)]
    fields: Vec<FieldDef>,
    #[serde(default)]
    components: Vec<ComponentDef>,
    #[serde(default)]
    messages: Vec<MessageDef>,
    #[serde(default)]
    header: Vec<Member>,
    #[serde(default)]
    trailer: Vec<Member>,
}

impl DictionaryBuilder {
    /// Creates an empty builder.
    ///
    /// # Arguments
    /// * `version` - The FIX version
    #[must_use]
    pub fn new(version: Version) -> Self {
        Self {
            version,
            fields: Vec::new(),
            components: Vec::new(),
            messages: Vec::new(),
            header: Vec::new(),
            trailer: Vec::new(),
        }
    }

    /// Adds a field definition.
    pub fn add_field(&mut self, field: FieldDef) -> &mut Self {
        self.fields.push(field);
        self
    }

    /// Adds a component definition.
    pub fn add_component(&mut self, component: ComponentDef) -> &mut Self {
        self.components.push(component);
        self
    }

    /// Adds a message definition.
    pub fn add_message(&mut self, message: MessageDef) -> &mut Self {
        self.messages.push(message);
        self
    }

    /// Sets the header member list.
    pub fn header(&mut self, members: Vec<Member>) -> &mut Self {
        self.header = members;
        self
    }

    /// Sets the trailer member list.
    pub fn trailer(&mut self, members: Vec<Member>) -> &mut Self {
        self.trailer = members;
        self
    }

    /// Validates the definitions and builds the dictionary.
    ///
    /// # Errors
    /// Returns a [`DictionaryError`] for unresolved tags, unknown or cyclic
    /// components, misplaced group delimiters, or duplicate definitions.
    pub fn build(&self) -> Result<Dictionary, DictionaryError> {
        let mut fields = HashMap::with_capacity(self.fields.len());
        let mut fields_by_name = HashMap::with_capacity(self.fields.len());
        let mut enum_codes = HashMap::new();
        for field in &self.fields {
            if fields.contains_key(&field.tag) {
                return Err(DictionaryError::DuplicateField(field.tag));
            }
            if fields_by_name.contains_key(&field.name) {
                return Err(DictionaryError::DuplicateFieldName(field.name.clone()));
            }
            if field.is_enumerated() {
                let codes: HashSet<String> = field
                    .values
                    .iter()
                    .map(|EnumValue { code, .. }| code.clone())
                    .collect();
                enum_codes.insert(field.tag, codes);
            }
            fields_by_name.insert(field.name.clone(), field.tag);
            fields.insert(field.tag, field.clone());
        }

        let components: HashMap<String, ComponentDef> = self
            .components
            .iter()
            .map(|component| (component.name.clone(), component.clone()))
            .collect();

        let flattener = Flattener {
            fields: &fields,
            components: &components,
        };
        let header = flattener.layout(&self.header, "header")?;
        let trailer = flattener.layout(&self.trailer, "trailer")?;

        let mut messages = HashMap::with_capacity(self.messages.len());
        let mut messages_by_name = HashMap::with_capacity(self.messages.len());
        for def in &self.messages {
            if messages.contains_key(&def.msg_type) {
                return Err(DictionaryError::DuplicateMessage(def.msg_type.clone()));
            }
            let context = format!("message {}", def.msg_type);
            let layout = flattener.layout(&def.members, &context)?;
            let required = layout
                .required_tags()
                .filter(|tag| !header.contains_deep(*tag) && !trailer.contains_deep(*tag))
                .collect();
            messages_by_name.insert(def.name.clone(), def.msg_type.clone());
            messages.insert(
                def.msg_type.clone(),
                MessageSchema {
                    def: def.clone(),
                    layout,
                    required,
                },
            );
        }

        Ok(Dictionary {
            version: self.version,
            fields,
            fields_by_name,
            messages,
            messages_by_name,
            components,
            enum_codes,
            header,
            trailer,
        })
    }
}

/// Inlines components into flat layouts.
struct Flattener<'a> {
    fields: &'a HashMap<u32, FieldDef>,
    components: &'a HashMap<String, ComponentDef>,
}

impl Flattener<'_> {
    fn layout(&self, members: &[Member], context: &str) -> Result<Layout, DictionaryError> {
        let mut entries = Vec::with_capacity(members.len());
        let mut stack = Vec::new();
        self.flatten(members, true, context, &mut stack, &mut entries)?;
        self.layout_from(entries, context)
    }

    fn flatten(
        &self,
        members: &[Member],
        parent_required: bool,
        context: &str,
        stack: &mut Vec<String>,
        out: &mut Vec<LayoutEntry>,
    ) -> Result<(), DictionaryError> {
        for member in members {
            match member {
                Member::Field { tag, required } => {
                    self.resolve(*tag, context)?;
                    out.push(LayoutEntry::Field {
                        tag: *tag,
                        required: *required && parent_required,
                    });
                }
                Member::Component { name, required } => {
                    let component = self.components.get(name).ok_or_else(|| {
                        DictionaryError::UnknownComponent {
                            name: name.clone(),
                            context: context.to_string(),
                        }
                    })?;
                    if stack.contains(name) {
                        return Err(DictionaryError::ComponentCycle { name: name.clone() });
                    }
                    stack.push(name.clone());
                    let component_context = format!("component {name}");
                    self.flatten(
                        &component.members,
                        *required && parent_required,
                        &component_context,
                        stack,
                        out,
                    )?;
                    stack.pop();
                }
                Member::Group(group) => {
                    self.resolve(group.count_tag, context)?;
                    let group_context = format!("group {}", group.name);
                    let mut entries = Vec::with_capacity(group.members.len());
                    self.flatten(&group.members, true, &group_context, stack, &mut entries)?;
                    match entries.first() {
                        Some(LayoutEntry::Field { tag, .. }) if *tag == group.delimiter_tag => {}
                        _ => {
                            return Err(DictionaryError::InvalidGroupDelimiter {
                                count_tag: group.count_tag,
                                delimiter_tag: group.delimiter_tag,
                            });
                        }
                    }
                    let layout = self.layout_from(entries, &group_context)?;
                    out.push(LayoutEntry::Group(GroupLayout {
                        count_tag: group.count_tag,
                        name: group.name.clone(),
                        delimiter_tag: group.delimiter_tag,
                        required: group.required && parent_required,
                        layout,
                    }));
                }
            }
        }
        Ok(())
    }

    fn layout_from(
        &self,
        entries: Vec<LayoutEntry>,
        context: &str,
    ) -> Result<Layout, DictionaryError> {
        // Each tag may appear once per nesting level.
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.tag()) {
                return Err(DictionaryError::DuplicateMember {
                    tag: entry.tag(),
                    context: context.to_string(),
                });
            }
        }
        Ok(Layout::new(entries))
    }

    fn resolve(&self, tag: u32, context: &str) -> Result<(), DictionaryError> {
        if self.fields.contains_key(&tag) {
            Ok(())
        } else {
            Err(DictionaryError::UnresolvedTag {
                tag,
                context: context.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldType, GroupDef};

    fn base() -> DictionaryBuilder {
        let mut builder = DictionaryBuilder::new(Version::Fix44);
        builder
            .add_field(FieldDef::new(8, "BeginString", FieldType::String))
            .add_field(FieldDef::new(35, "MsgType", FieldType::String))
            .add_field(FieldDef::new(10, "CheckSum", FieldType::String))
            .add_field(FieldDef::new(11, "ClOrdID", FieldType::String))
            .add_field(FieldDef::new(55, "Symbol", FieldType::String))
            .add_field(
                FieldDef::new(54, "Side", FieldType::Char).with_values([("1", "BUY"), ("2", "SELL")]),
            )
            .add_field(FieldDef::new(73, "NoOrders", FieldType::NumInGroup))
            .header(vec![Member::required(8), Member::required(35)])
            .trailer(vec![Member::required(10)]);
        builder
    }

    #[test]
    fn test_build_resolves_components() {
        let mut builder = base();
        builder
            .add_component(ComponentDef::new("Instrument", vec![Member::required(55)]))
            .add_message(MessageDef::new(
                "D",
                "NewOrderSingle",
                MessageCategory::App,
                vec![
                    Member::required(11),
                    Member::component("Instrument", true),
                    Member::required(54),
                ],
            ));
        let dict = builder.build().unwrap();
        let message = dict.get_message("D").unwrap();
        let tags: Vec<u32> = message.layout().entries().iter().map(LayoutEntry::tag).collect();
        assert_eq!(tags, vec![11, 55, 54]);
        assert_eq!(message.required_tags(), &[11, 55, 54]);
        assert!(dict.get_message_by_name("NewOrderSingle").is_some());
        assert!(!message.is_admin());
    }

    #[test]
    fn test_optional_component_relaxes_required() {
        let mut builder = base();
        builder
            .add_component(ComponentDef::new("Instrument", vec![Member::required(55)]))
            .add_message(MessageDef::new(
                "D",
                "NewOrderSingle",
                MessageCategory::App,
                vec![Member::required(11), Member::component("Instrument", false)],
            ));
        let dict = builder.build().unwrap();
        assert_eq!(dict.required_fields("D"), Some(&[11][..]));
    }

    #[test]
    fn test_unresolved_tag_rejected() {
        let mut builder = base();
        builder.add_message(MessageDef::new(
            "D",
            "NewOrderSingle",
            MessageCategory::App,
            vec![Member::required(9999)],
        ));
        assert_eq!(
            builder.build().unwrap_err(),
            DictionaryError::UnresolvedTag {
                tag: 9999,
                context: "message D".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_component_rejected() {
        let mut builder = base();
        builder.add_message(MessageDef::new(
            "D",
            "NewOrderSingle",
            MessageCategory::App,
            vec![Member::component("Missing", true)],
        ));
        assert!(matches!(
            builder.build(),
            Err(DictionaryError::UnknownComponent { .. })
        ));
    }

    #[test]
    fn test_component_cycle_rejected() {
        let mut builder = base();
        builder
            .add_component(ComponentDef::new("A", vec![Member::component("B", true)]))
            .add_component(ComponentDef::new("B", vec![Member::component("A", true)]))
            .add_message(MessageDef::new(
                "D",
                "NewOrderSingle",
                MessageCategory::App,
                vec![Member::component("A", true)],
            ));
        assert!(matches!(
            builder.build(),
            Err(DictionaryError::ComponentCycle { .. })
        ));
    }

    #[test]
    fn test_group_delimiter_must_be_first() {
        let mut builder = base();
        builder.add_message(MessageDef::new(
            "E",
            "NewOrderList",
            MessageCategory::App,
            vec![Member::Group(GroupDef::new(
                73,
                "NoOrders",
                11,
                vec![Member::required(55), Member::required(11)],
                true,
            ))],
        ));
        assert_eq!(
            builder.build().unwrap_err(),
            DictionaryError::InvalidGroupDelimiter {
                count_tag: 73,
                delimiter_tag: 11,
            }
        );
    }

    #[test]
    fn test_group_lookup_by_delimiter() {
        let mut builder = base();
        builder.add_message(MessageDef::new(
            "E",
            "NewOrderList",
            MessageCategory::App,
            vec![Member::Group(GroupDef::new(
                73,
                "NoOrders",
                11,
                vec![Member::required(11), Member::optional(55)],
                true,
            ))],
        ));
        let dict = builder.build().unwrap();
        let group = dict.group("E", 11).unwrap();
        assert_eq!(group.count_tag, 73);
        assert_eq!(group.name, "NoOrders");
        assert!(dict.group("E", 55).is_none());
    }

    #[test]
    fn test_duplicate_definitions_rejected() {
        let mut builder = base();
        builder.add_field(FieldDef::new(11, "Other", FieldType::String));
        assert_eq!(builder.build().unwrap_err(), DictionaryError::DuplicateField(11));

        let mut builder = base();
        builder.add_message(MessageDef::new(
            "D",
            "NewOrderSingle",
            MessageCategory::App,
            vec![Member::required(11), Member::optional(11)],
        ));
        assert!(matches!(
            builder.build(),
            Err(DictionaryError::DuplicateMember { tag: 11, .. })
        ));
    }

    #[test]
    fn test_enum_and_membership_lookups() {
        let dict = base().build().unwrap();
        assert!(dict.is_valid_value(54, "1"));
        assert!(!dict.is_valid_value(54, "X"));
        assert!(dict.is_valid_value(55, "anything"));
        assert_eq!(dict.enum_values(54).map(HashSet::len), Some(2));
        assert!(dict.is_header_tag(35));
        assert!(dict.is_trailer_tag(10));
        assert!(!dict.is_header_tag(55));
        assert_eq!(dict.tag_for_name("Symbol"), Some(55));
        assert_eq!(dict.field_name(54), Some("Side"));
    }
}
