//! Tagged attribute values.
//!
//! On the wire every attribute is a single-key JSON object whose key names the
//! type: `{"S": "text"}`, `{"N": "42"}`, `{"M": {...}}` and so on. Only the nine
//! tags below are understood; anything else is rejected while parsing so that
//! decoding never has to guess.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single wire-encoded attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum TaggedValue {
    /// `NULL`: explicit null. The payload is conventionally `true`.
    Null,
    /// `S`: a string.
    String(String),
    /// `BOOL`: a boolean.
    Bool(bool),
    /// `N`: a number, kept in its textual form until decoded.
    Number(String),
    /// `M`: a nested attribute map.
    Map(AttributeMap),
    /// `BS`: a set of binary values, base64 encoded.
    ByteSet(Vec<String>),
    /// `L`: a heterogeneous list of tagged values.
    List(Vec<TaggedValue>),
    /// `SS`: a set of strings.
    StringSet(Vec<String>),
    /// `NS`: a set of numbers in textual form.
    NumberSet(Vec<String>),
}

impl TaggedValue {
    /// Every tag this crate understands.
    pub const TAGS: [&'static str; 9] = ["NULL", "S", "BOOL", "N", "M", "BS", "L", "SS", "NS"];

    /// Returns the wire tag of this value.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::String(_) => "S",
            Self::Bool(_) => "BOOL",
            Self::Number(_) => "N",
            Self::Map(_) => "M",
            Self::ByteSet(_) => "BS",
            Self::List(_) => "L",
            Self::StringSet(_) => "SS",
            Self::NumberSet(_) => "NS",
        }
    }

    /// Parses a wire value such as `{"N": "42"}`.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(entry) = value else {
            return Err(Error::InvalidPayload {
                tag: "attribute",
                reason: format!("expected a single-key object, got {value}"),
            });
        };

        let mut entries = entry.iter();
        let (tag, payload) = match (entries.next(), entries.next()) {
            (Some(pair), None) => pair,
            _ => {
                return Err(Error::InvalidPayload {
                    tag: "attribute",
                    reason: format!("expected exactly one type tag, found {}", entry.len()),
                });
            }
        };

        match tag.as_str() {
            "NULL" => Ok(Self::Null),
            "S" => expect_string("S", payload).map(Self::String),
            "BOOL" => payload
                .as_bool()
                .map(Self::Bool)
                .ok_or_else(|| unexpected("BOOL", "a boolean", payload)),
            "N" => expect_string("N", payload).map(Self::Number),
            "M" => match payload {
                Value::Object(map) => AttributeMap::from_json(map).map(Self::Map),
                other => Err(unexpected("M", "an object", other)),
            },
            "BS" => expect_string_list("BS", payload).map(Self::ByteSet),
            "L" => match payload {
                Value::Array(items) => items
                    .iter()
                    .map(Self::from_json)
                    .collect::<Result<Vec<_>>>()
                    .map(Self::List),
                other => Err(unexpected("L", "an array", other)),
            },
            "SS" => expect_string_list("SS", payload).map(Self::StringSet),
            "NS" => expect_string_list("NS", payload).map(Self::NumberSet),
            other => Err(Error::UnsupportedTag(other.to_string())),
        }
    }

    /// Renders the value back into its wire form.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let payload = match self {
            Self::Null => Value::Bool(true),
            Self::String(s) | Self::Number(s) => Value::String(s.clone()),
            Self::Bool(b) => Value::Bool(*b),
            Self::Map(map) => Value::Object(map.to_json()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::ByteSet(items) | Self::StringSet(items) | Self::NumberSet(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        };

        let mut entry = Map::with_capacity(1);
        entry.insert(self.tag().to_string(), payload);
        Value::Object(entry)
    }
}

impl TryFrom<Value> for TaggedValue {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_json(&value)
    }
}

impl From<TaggedValue> for Value {
    fn from(value: TaggedValue) -> Self {
        value.to_json()
    }
}

/// An ordered map of attribute names to tagged values.
///
/// Keeps the order attributes were declared in on the wire, which the
/// positional identity fallback depends on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct AttributeMap(Vec<(String, TaggedValue)>);

impl AttributeMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses every attribute of a wire object, preserving order.
    pub fn from_json(map: &Map<String, Value>) -> Result<Self> {
        map.iter()
            .map(|(name, value)| TaggedValue::from_json(value).map(|parsed| (name.clone(), parsed)))
            .collect()
    }

    /// Inserts an attribute, replacing an existing one of the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, value: TaggedValue) {
        let name = name.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Chainable form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: TaggedValue) -> Self {
        self.insert(name, value);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TaggedValue> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates attributes in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaggedValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Renders the map back into its wire form.
    #[must_use]
    pub fn to_json(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect()
    }
}

impl FromIterator<(String, TaggedValue)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (String, TaggedValue)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

impl TryFrom<Map<String, Value>> for AttributeMap {
    type Error = Error;

    fn try_from(map: Map<String, Value>) -> Result<Self> {
        Self::from_json(&map)
    }
}

impl From<AttributeMap> for Map<String, Value> {
    fn from(map: AttributeMap) -> Self {
        map.to_json()
    }
}

fn unexpected(tag: &'static str, expected: &str, payload: &Value) -> Error {
    Error::InvalidPayload {
        tag,
        reason: format!("expected {expected}, got {payload}"),
    }
}

fn expect_string(tag: &'static str, payload: &Value) -> Result<String> {
    payload
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| unexpected(tag, "a string", payload))
}

fn expect_string_list(tag: &'static str, payload: &Value) -> Result<Vec<String>> {
    let Value::Array(items) = payload else {
        return Err(unexpected(tag, "an array of strings", payload));
    };
    items.iter().map(|item| expect_string(tag, item)).collect()
}
