/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Conversion between wire values and typed [`FieldValue`]s.
//!
//! Parsing follows the field's [`Primitive`] type; formatting follows the
//! value variant, with timestamp precision taken from the field definition
//! or, failing that, from the codec configuration.

use crate::config::CodecConfig;
use bytes::{BufMut, Bytes, BytesMut};
use chrono::{NaiveDate, NaiveTime};
use fixlane_core::{CoercionError, FieldValue, RawField, TimePrecision, Timestamp};
use fixlane_dictionary::{FieldDef, Primitive};
use rust_decimal::Decimal;

const DATE_FORMAT: &str = "%Y%m%d";
const TIME_PARSE_FORMAT: &str = "%H:%M:%S%.f";

/// Parses a raw field into the typed value its definition declares.
///
/// # Errors
/// Returns `CoercionError` naming the tag and raw value when the text does
/// not match the declared type.
pub fn parse_value(
    field: &RawField<'_>,
    def: &FieldDef,
    config: &CodecConfig,
) -> Result<FieldValue, CoercionError> {
    let primitive = def.field_type.primitive();
    if primitive == Primitive::Data {
        return Ok(FieldValue::Data(Bytes::copy_from_slice(field.value)));
    }

    let text = field.as_str()?;
    let invalid = || CoercionError::InvalidValue {
        tag: field.tag,
        value: text.to_string(),
        expected: primitive.name(),
    };

    let value = match primitive {
        Primitive::String => FieldValue::String(text.to_string()),
        Primitive::Int => FieldValue::Int(text.parse().map_err(|_| invalid())?),
        Primitive::Decimal => {
            let decimal: Decimal = text.parse().map_err(|_| invalid())?;
            FieldValue::Decimal(if config.remove_trailing_zeros {
                decimal.normalize()
            } else {
                decimal
            })
        }
        Primitive::Boolean => match text {
            "Y" => FieldValue::Bool(true),
            "N" => FieldValue::Bool(false),
            _ => return Err(invalid()),
        },
        Primitive::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => FieldValue::Char(c),
                _ => return Err(invalid()),
            }
        }
        Primitive::Date => FieldValue::Date(
            NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| invalid())?,
        ),
        Primitive::Time => FieldValue::Time(
            NaiveTime::parse_from_str(text, TIME_PARSE_FORMAT).map_err(|_| invalid())?,
        ),
        Primitive::Timestamp => {
            FieldValue::Timestamp(Timestamp::parse_fix(text).ok_or_else(invalid)?)
        }
        Primitive::MultiValue => FieldValue::MultiValue(
            text.split_whitespace().map(str::to_string).collect(),
        ),
        Primitive::Data => FieldValue::Data(Bytes::copy_from_slice(field.value)),
    };
    Ok(value)
}

/// Appends the wire representation of `value` to `buf`.
///
/// `def` supplies the timestamp precision attribute when present. Time
/// values are cut to that precision; the encoder rejects values that would
/// lose digits before calling this.
pub fn write_value(
    buf: &mut BytesMut,
    value: &FieldValue,
    def: Option<&FieldDef>,
    config: &CodecConfig,
) {
    let precision = effective_precision(def, config);

    match value {
        FieldValue::String(s) => buf.put_slice(s.as_bytes()),
        FieldValue::Int(v) => {
            let mut itoa_buf = itoa::Buffer::new();
            buf.put_slice(itoa_buf.format(*v).as_bytes());
        }
        FieldValue::Decimal(d) => {
            let d = if config.remove_trailing_zeros {
                d.normalize()
            } else {
                *d
            };
            buf.put_slice(d.to_string().as_bytes());
        }
        FieldValue::Bool(b) => buf.put_u8(if *b { b'Y' } else { b'N' }),
        FieldValue::Char(c) => {
            let mut tmp = [0u8; 4];
            buf.put_slice(c.encode_utf8(&mut tmp).as_bytes());
        }
        FieldValue::Data(bytes) => buf.put_slice(bytes),
        FieldValue::MultiValue(values) => {
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    buf.put_u8(b' ');
                }
                buf.put_slice(v.as_bytes());
            }
        }
        FieldValue::Date(d) => buf.put_slice(d.format(DATE_FORMAT).to_string().as_bytes()),
        FieldValue::Time(t) => {
            let text = format!(
                "{}{}",
                t.format("%H:%M:%S"),
                t.format(precision.fraction_format())
            );
            buf.put_slice(text.as_bytes());
        }
        FieldValue::Timestamp(ts) => buf.put_slice(ts.format(precision).as_bytes()),
    }
}

/// Returns the precision a timestamp field is written with.
#[must_use]
pub fn effective_precision(def: Option<&FieldDef>, config: &CodecConfig) -> TimePrecision {
    def.and_then(|def| def.precision)
        .unwrap_or_else(|| config.default_precision())
}
