use std::collections::BTreeMap;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bigdecimal::BigDecimal;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::value::RawValue;

use crate::record::EncodedAttribute;

/// Decoded attribute content.
#[derive(Debug, Clone, PartialEq)]
pub enum GenericValue {
    Integer(i64),
    Decimal(BigDecimal),
    String(String),
    Boolean(bool),
    Null,
    Map(BTreeMap<String, GenericValue>),
    List(Vec<GenericValue>),
}

impl Serialize for GenericValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Integer(value) => serializer.serialize_i64(*value),
            // Written as a raw JSON number so no digits are lost to f64. The
            // plain form keeps the scale and never switches to exponent notation.
            Self::Decimal(value) => RawValue::from_string(value.to_plain_string())
                .map_err(S::Error::custom)?
                .serialize(serializer),
            Self::String(value) => serializer.serialize_str(value),
            Self::Boolean(value) => serializer.serialize_bool(*value),
            Self::Null => serializer.serialize_unit(),
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a nested attribute, outermost segment first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if position == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unrecognized attribute encoding{}", describe_path(.path))]
    Unrecognized { path: FieldPath },
    #[error("invalid number `{text}`{}", describe_path(.path))]
    InvalidNumber { text: String, path: FieldPath },
    #[error("invalid base64 binary attribute{}", describe_path(.path))]
    InvalidBinary { path: FieldPath },
}

impl DecodeError {
    fn invalid_number(text: &str) -> Self {
        Self::InvalidNumber {
            text: text.to_string(),
            path: FieldPath::default(),
        }
    }

    pub fn path(&self) -> &FieldPath {
        match self {
            Self::Unrecognized { path }
            | Self::InvalidNumber { path, .. }
            | Self::InvalidBinary { path } => path,
        }
    }

    /// Re-roots the error one level deeper, under `segment`.
    pub fn within(mut self, segment: PathSegment) -> Self {
        match &mut self {
            Self::Unrecognized { path }
            | Self::InvalidNumber { path, .. }
            | Self::InvalidBinary { path } => path.0.insert(0, segment),
        }
        self
    }
}

fn describe_path(path: &FieldPath) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" at `{path}`")
    }
}

/// Decodes one attribute.
///
/// Slots are inspected in a fixed order and the first populated one wins:
/// N, S, M, L, BOOL, NULL, B, BS, SS, NS.
pub fn decode(attribute: &EncodedAttribute) -> Result<GenericValue, DecodeError> {
    if let Some(text) = non_empty(attribute.number.as_deref()) {
        return decode_number(text);
    }

    if let Some(text) = non_empty(attribute.string.as_deref()) {
        return Ok(GenericValue::String(text.to_string()));
    }

    if let Some(entries) = &attribute.map {
        let mut decoded = BTreeMap::new();
        for (key, value) in entries {
            let value = decode(value).map_err(|error| error.within(PathSegment::Key(key.clone())))?;
            decoded.insert(key.clone(), value);
        }
        return Ok(GenericValue::Map(decoded));
    }

    if let Some(items) = &attribute.list {
        return items
            .iter()
            .enumerate()
            .map(|(index, item)| decode(item).map_err(|error| error.within(PathSegment::Index(index))))
            .collect::<Result<Vec<_>, _>>()
            .map(GenericValue::List);
    }

    if let Some(value) = attribute.boolean {
        return Ok(GenericValue::Boolean(value));
    }

    if attribute.null == Some(true) {
        return Ok(GenericValue::Null);
    }

    if let Some(text) = &attribute.binary {
        return canonical_base64(text).map(GenericValue::String);
    }

    if !attribute.binary_set.is_empty() {
        return attribute
            .binary_set
            .iter()
            .enumerate()
            .map(|(index, text)| {
                canonical_base64(text)
                    .map(GenericValue::String)
                    .map_err(|error| error.within(PathSegment::Index(index)))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(GenericValue::List);
    }

    if !attribute.string_set.is_empty() {
        return Ok(GenericValue::List(
            attribute
                .string_set
                .iter()
                .cloned()
                .map(GenericValue::String)
                .collect(),
        ));
    }

    if !attribute.number_set.is_empty() {
        return attribute
            .number_set
            .iter()
            .enumerate()
            .map(|(index, text)| {
                parse_decimal(text)
                    .map(GenericValue::Decimal)
                    .map_err(|error| error.within(PathSegment::Index(index)))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(GenericValue::List);
    }

    Err(DecodeError::Unrecognized {
        path: FieldPath::default(),
    })
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|value| !value.is_empty())
}

fn decode_number(text: &str) -> Result<GenericValue, DecodeError> {
    if text.contains('.') {
        return parse_decimal(text).map(GenericValue::Decimal);
    }

    // DynamoDB numbers carry up to 38 digits; anything past i64 stays exact.
    match text.parse::<i64>() {
        Ok(value) => Ok(GenericValue::Integer(value)),
        Err(_) => parse_decimal(text).map(GenericValue::Decimal),
    }
}

/// Standard padded base64 of the bytes carried by a `B` / `BS` element.
fn canonical_base64(text: &str) -> Result<String, DecodeError> {
    STANDARD
        .decode(text.as_bytes())
        .map(|bytes| STANDARD.encode(bytes))
        .map_err(|_| DecodeError::InvalidBinary {
            path: FieldPath::default(),
        })
}

fn parse_decimal(text: &str) -> Result<BigDecimal, DecodeError> {
    BigDecimal::from_str(text).map_err(|_| DecodeError::invalid_number(text))
}
