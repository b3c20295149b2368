/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Schema definitions for FIX dictionaries.
//!
//! This module defines the structures that describe a FIX protocol version as
//! authored (before components are inlined):
//! - [`FieldDef`]: Field definitions with tag, name, type and enumeration
//! - [`MessageDef`]: Message definitions with an ordered member list
//! - [`ComponentDef`]: Named, non-repeating member aggregates
//! - [`GroupDef`]: Repeating group definitions
//! - [`Member`]: One entry of a message, component or group member list

use fixlane_core::TimePrecision;
use serde::{Deserialize, Serialize};

/// FIX protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Version {
    /// FIX 4.0
    Fix40,
    /// FIX 4.1
    Fix41,
    /// FIX 4.2
    Fix42,
    /// FIX 4.3
    Fix43,
    /// FIX 4.4
    Fix44,
    /// FIX 5.0 SP2 over FIXT 1.1
    Fix50Sp2,
}

impl Version {
    /// Returns the BeginString value for this version.
    #[must_use]
    pub const fn begin_string(&self) -> &'static str {
        match self {
            Self::Fix40 => "FIX.4.0",
            Self::Fix41 => "FIX.4.1",
            Self::Fix42 => "FIX.4.2",
            Self::Fix43 => "FIX.4.3",
            Self::Fix44 => "FIX.4.4",
            Self::Fix50Sp2 => "FIXT.1.1",
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.begin_string())
    }
}

/// FIX field data type as named by the dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Integer value.
    Int,
    /// Length field (for data fields).
    Length,
    /// Sequence number.
    SeqNum,
    /// Number of entries in a repeating group.
    NumInGroup,
    /// Tag number reference.
    TagNum,
    /// Day of month (1-31).
    DayOfMonth,
    /// Floating point number.
    Float,
    /// Quantity.
    Qty,
    /// Price.
    Price,
    /// Price offset.
    PriceOffset,
    /// Amount (price * quantity).
    Amt,
    /// Percentage.
    Percentage,
    /// Single character.
    Char,
    /// Boolean (Y/N).
    Boolean,
    /// String.
    String,
    /// Multiple character value (space-separated).
    MultipleCharValue,
    /// Multiple string value (space-separated).
    MultipleStringValue,
    /// Country code (ISO 3166).
    Country,
    /// Currency code (ISO 4217).
    Currency,
    /// Exchange code (ISO 10383 MIC).
    Exchange,
    /// Month-year (YYYYMM or YYYYMMDD or YYYYMMWW).
    MonthYear,
    /// UTC timestamp.
    UtcTimestamp,
    /// UTC time only.
    UtcTimeOnly,
    /// UTC date only.
    UtcDateOnly,
    /// Local market date.
    LocalMktDate,
    /// Local market time.
    LocalMktTime,
    /// Time with timezone offset.
    TzTimeOnly,
    /// Timestamp with timezone offset.
    TzTimestamp,
    /// Raw data (binary).
    Data,
    /// XML data.
    XmlData,
    /// Language code (ISO 639-1).
    Language,
}

/// Primitive value representation a [`FieldType`] coerces to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Free text.
    String,
    /// Signed integer.
    Int,
    /// Decimal number.
    Decimal,
    /// `Y`/`N`.
    Boolean,
    /// Single character.
    Char,
    /// `YYYYMMDD`.
    Date,
    /// `HH:MM:SS[.fff]`.
    Time,
    /// `YYYYMMDD-HH:MM:SS[.fff]`.
    Timestamp,
    /// Opaque bytes.
    Data,
    /// Space-separated values.
    MultiValue,
}

impl Primitive {
    /// Returns a short name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "integer",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Char => "character",
            Self::Date => "date",
            Self::Time => "time",
            Self::Timestamp => "timestamp",
            Self::Data => "data",
            Self::MultiValue => "multi-value string",
        }
    }
}

impl FieldType {
    /// Returns the primitive representation of this type.
    #[must_use]
    pub const fn primitive(&self) -> Primitive {
        match self {
            Self::Int
            | Self::Length
            | Self::SeqNum
            | Self::NumInGroup
            | Self::TagNum
            | Self::DayOfMonth => Primitive::Int,
            Self::Float
            | Self::Qty
            | Self::Price
            | Self::PriceOffset
            | Self::Amt
            | Self::Percentage => Primitive::Decimal,
            Self::Char => Primitive::Char,
            Self::Boolean => Primitive::Boolean,
            Self::MultipleCharValue | Self::MultipleStringValue => Primitive::MultiValue,
            Self::UtcTimestamp => Primitive::Timestamp,
            Self::UtcTimeOnly | Self::LocalMktTime => Primitive::Time,
            Self::UtcDateOnly | Self::LocalMktDate => Primitive::Date,
            Self::Data | Self::XmlData => Primitive::Data,
            Self::String
            | Self::Country
            | Self::Currency
            | Self::Exchange
            | Self::MonthYear
            | Self::TzTimeOnly
            | Self::TzTimestamp
            | Self::Language => Primitive::String,
        }
    }
}

impl std::str::FromStr for FieldType {
    type Err = std::convert::Infallible;

    /// Creates a FieldType from a dictionary type name; unknown names map to
    /// `String`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_uppercase().as_str() {
            "INT" => Self::Int,
            "LENGTH" => Self::Length,
            "SEQNUM" => Self::SeqNum,
            "NUMINGROUP" => Self::NumInGroup,
            "TAGNUM" => Self::TagNum,
            "DAYOFMONTH" => Self::DayOfMonth,
            "FLOAT" => Self::Float,
            "QTY" | "QUANTITY" => Self::Qty,
            "PRICE" => Self::Price,
            "PRICEOFFSET" => Self::PriceOffset,
            "AMT" | "AMOUNT" => Self::Amt,
            "PERCENTAGE" => Self::Percentage,
            "CHAR" => Self::Char,
            "BOOLEAN" => Self::Boolean,
            "MULTIPLECHARVALUE" => Self::MultipleCharValue,
            "MULTIPLESTRINGVALUE" | "MULTIPLEVALUESTRING" => Self::MultipleStringValue,
            "COUNTRY" => Self::Country,
            "CURRENCY" => Self::Currency,
            "EXCHANGE" => Self::Exchange,
            "MONTHYEAR" => Self::MonthYear,
            "UTCTIMESTAMP" => Self::UtcTimestamp,
            "UTCTIMEONLY" => Self::UtcTimeOnly,
            "UTCDATEONLY" | "UTCDATE" => Self::UtcDateOnly,
            "LOCALMKTDATE" => Self::LocalMktDate,
            "LOCALMKTTIME" => Self::LocalMktTime,
            "TZTIMEONLY" => Self::TzTimeOnly,
            "TZTIMESTAMP" => Self::TzTimestamp,
            "DATA" => Self::Data,
            "XMLDATA" => Self::XmlData,
            "LANGUAGE" => Self::Language,
            _ => Self::String,
        })
    }
}

/// One enumerated value of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    /// Wire code.
    pub code: String,
    /// Semantic name.
    pub description: String,
}

/// Definition of a FIX field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field tag number.
    pub tag: u32,
    /// Field name.
    pub name: String,
    /// Field data type.
    pub field_type: FieldType,
    /// Ordered enumeration of valid values; empty when not enumerated.
    #[serde(default)]
    pub values: Vec<EnumValue>,
    /// Whether values outside the enumeration are accepted.
    #[serde(default)]
    pub allows_other_values: bool,
    /// Timestamp precision attribute overriding the codec configuration.
    #[serde(default)]
    pub precision: Option<TimePrecision>,
    /// Whether the value carries an embedded (XML-like) document.
    #[serde(default)]
    pub embedded_document: bool,
}

impl FieldDef {
    /// Creates a new field definition.
    ///
    /// # Arguments
    /// * `tag` - The field tag number
    /// * `name` - The field name
    /// * `field_type` - The field data type
    #[must_use]
    pub fn new(tag: u32, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            tag,
            name: name.into(),
            field_type,
            values: Vec::new(),
            allows_other_values: false,
            precision: None,
            embedded_document: false,
        }
    }

    /// Adds the ordered `(code, description)` enumeration.
    #[must_use]
    pub fn with_values<I, C, D>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (C, D)>,
        C: Into<String>,
        D: Into<String>,
    {
        self.values = values
            .into_iter()
            .map(|(code, description)| EnumValue {
                code: code.into(),
                description: description.into(),
            })
            .collect();
        self
    }

    /// Accepts values outside the enumeration.
    #[must_use]
    pub const fn allowing_other_values(mut self) -> Self {
        self.allows_other_values = true;
        self
    }

    /// Sets the timestamp precision attribute.
    #[must_use]
    pub const fn with_precision(mut self, precision: TimePrecision) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Marks the field as carrying an embedded document.
    #[must_use]
    pub const fn with_embedded_document(mut self) -> Self {
        self.embedded_document = true;
        self
    }

    /// Returns true if the field has an enumeration.
    #[must_use]
    pub fn is_enumerated(&self) -> bool {
        !self.values.is_empty()
    }

    /// Returns the semantic name of an enumerated code.
    #[must_use]
    pub fn describe(&self, code: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.code == code)
            .map(|v| v.description.as_str())
    }
}

/// One entry of an ordered member list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Member {
    /// A field reference.
    Field {
        /// Field tag number.
        tag: u32,
        /// Whether the field is required.
        required: bool,
    },
    /// A component reference, inlined at build time.
    Component {
        /// Component name.
        name: String,
        /// Whether the component is required.
        required: bool,
    },
    /// A repeating group.
    Group(GroupDef),
}

impl Member {
    /// Creates a required field member.
    #[must_use]
    pub const fn required(tag: u32) -> Self {
        Self::Field {
            tag,
            required: true,
        }
    }

    /// Creates an optional field member.
    #[must_use]
    pub const fn optional(tag: u32) -> Self {
        Self::Field {
            tag,
            required: false,
        }
    }

    /// Creates a component member.
    #[must_use]
    pub fn component(name: impl Into<String>, required: bool) -> Self {
        Self::Component {
            name: name.into(),
            required,
        }
    }
}

/// Definition of a repeating group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDef {
    /// Tag of the count field (NumInGroup).
    pub count_tag: u32,
    /// Name of the group.
    pub name: String,
    /// Tag of the first field in each group entry (delimiter).
    pub delimiter_tag: u32,
    /// Ordered members of each group entry.
    pub members: Vec<Member>,
    /// Whether the group is required.
    pub required: bool,
}

impl GroupDef {
    /// Creates a group definition.
    #[must_use]
    pub fn new(
        count_tag: u32,
        name: impl Into<String>,
        delimiter_tag: u32,
        members: Vec<Member>,
        required: bool,
    ) -> Self {
        Self {
            count_tag,
            name: name.into(),
            delimiter_tag,
            members,
            required,
        }
    }
}

/// Definition of a reusable component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDef {
    /// Component name.
    pub name: String,
    /// Ordered members.
    pub members: Vec<Member>,
}

impl ComponentDef {
    /// Creates a component definition.
    #[must_use]
    pub fn new(name: impl Into<String>, members: Vec<Member>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }
}

/// Message category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageCategory {
    /// Administrative message (session level).
    Admin,
    /// Application message.
    App,
}

/// Definition of a FIX message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDef {
    /// Message type value (tag 35).
    pub msg_type: String,
    /// Message name.
    pub name: String,
    /// Message category (admin or app).
    pub category: MessageCategory,
    /// Ordered body members; header and trailer are shared and excluded.
    pub members: Vec<Member>,
}

impl MessageDef {
    /// Creates a message definition.
    #[must_use]
    pub fn new(
        msg_type: impl Into<String>,
        name: impl Into<String>,
        category: MessageCategory,
        members: Vec<Member>,
    ) -> Self {
        Self {
            msg_type: msg_type.into(),
            name: name.into(),
            category,
            members,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_begin_string() {
        assert_eq!(Version::Fix42.begin_string(), "FIX.4.2");
        assert_eq!(Version::Fix44.begin_string(), "FIX.4.4");
        assert_eq!(Version::Fix50Sp2.begin_string(), "FIXT.1.1");
    }

    #[test]
    fn test_field_type_from_str() {
        assert_eq!("INT".parse::<FieldType>().unwrap(), FieldType::Int);
        assert_eq!("STRING".parse::<FieldType>().unwrap(), FieldType::String);
        assert_eq!(
            "UTCTIMESTAMP".parse::<FieldType>().unwrap(),
            FieldType::UtcTimestamp
        );
        assert_eq!("unknown".parse::<FieldType>().unwrap(), FieldType::String);
    }

    #[test]
    fn test_field_type_primitive() {
        assert_eq!(FieldType::SeqNum.primitive(), Primitive::Int);
        assert_eq!(FieldType::Price.primitive(), Primitive::Decimal);
        assert_eq!(FieldType::MultipleCharValue.primitive(), Primitive::MultiValue);
        assert_eq!(FieldType::LocalMktDate.primitive(), Primitive::Date);
        assert_eq!(FieldType::Currency.primitive(), Primitive::String);
        assert_eq!(FieldType::XmlData.primitive(), Primitive::Data);
    }

    #[test]
    fn test_field_def_enumeration() {
        let side = FieldDef::new(54, "Side", FieldType::Char)
            .with_values([("1", "BUY"), ("2", "SELL")]);
        assert!(side.is_enumerated());
        assert_eq!(side.describe("2"), Some("SELL"));
        assert_eq!(side.describe("9"), None);
        assert!(!side.allows_other_values);
    }
}
