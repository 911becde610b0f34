//! Change events read from the change stream.
//!
//! A change event describes one item being inserted, modified or removed in a
//! source table. Events are immutable once parsed and are consumed exactly
//! once by the dispatcher.

use crate::{AttributeMap, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// The kind of change an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// `INSERT`: a new item was written.
    #[serde(rename = "INSERT")]
    Created,
    /// `MODIFY`: an existing item was overwritten.
    #[serde(rename = "MODIFY")]
    Updated,
    /// `REMOVE`: an item was deleted.
    #[serde(rename = "REMOVE")]
    Deleted,
}

impl EventKind {
    /// Returns the stream's name for this kind.
    #[must_use]
    pub fn event_name(self) -> &'static str {
        match self {
            Self::Created => "INSERT",
            Self::Updated => "MODIFY",
            Self::Deleted => "REMOVE",
        }
    }

    /// Returns true if the event carries a new image to index.
    #[must_use]
    pub fn is_upsert(self) -> bool {
        matches!(self, Self::Created | Self::Updated)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "INSERT" => Ok(Self::Created),
            "MODIFY" => Ok(Self::Updated),
            "REMOVE" => Ok(Self::Deleted),
            other => Err(Error::UnknownEventName(other.to_string())),
        }
    }
}

/// One notification from the change stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Stream-assigned event identifier, when present.
    pub event_id: Option<String>,
    /// Resource path of the table that emitted the event.
    pub source_locator: String,
    /// What happened to the item.
    pub kind: EventKind,
    /// The item's key attributes. Always present.
    pub key_attributes: AttributeMap,
    /// The item as it looks after the change. Absent for removals.
    pub new_image: Option<AttributeMap>,
}

impl ChangeEvent {
    /// Creates an event without a stream identifier.
    #[must_use]
    pub fn new(
        kind: EventKind,
        source_locator: impl Into<String>,
        key_attributes: AttributeMap,
        new_image: Option<AttributeMap>,
    ) -> Self {
        Self {
            event_id: None,
            source_locator: source_locator.into(),
            kind,
            key_attributes,
            new_image,
        }
    }

    /// Creates an `INSERT` event.
    #[must_use]
    pub fn created(
        source_locator: impl Into<String>,
        key_attributes: AttributeMap,
        new_image: AttributeMap,
    ) -> Self {
        Self::new(EventKind::Created, source_locator, key_attributes, Some(new_image))
    }

    /// Creates a `MODIFY` event.
    #[must_use]
    pub fn updated(
        source_locator: impl Into<String>,
        key_attributes: AttributeMap,
        new_image: AttributeMap,
    ) -> Self {
        Self::new(EventKind::Updated, source_locator, key_attributes, Some(new_image))
    }

    /// Creates a `REMOVE` event.
    #[must_use]
    pub fn deleted(source_locator: impl Into<String>, key_attributes: AttributeMap) -> Self {
        Self::new(EventKind::Deleted, source_locator, key_attributes, None)
    }

    /// Attaches a stream identifier.
    #[must_use]
    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    /// Parses a raw stream record.
    ///
    /// Expects the record shape emitted by the stream:
    /// `{"eventID", "eventName", "eventSourceARN", "dynamodb": {"Keys", "NewImage"}}`.
    pub fn from_record(record: &Value) -> Result<Self> {
        let kind: EventKind = string_field(record, "eventName")?.parse()?;
        let source_locator = string_field(record, "eventSourceARN")?.to_string();
        let event_id = record
            .get("eventID")
            .and_then(Value::as_str)
            .map(str::to_string);

        let stream = record
            .get("dynamodb")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::InvalidRecord("missing `dynamodb` section".to_string()))?;

        let key_attributes = match stream.get("Keys") {
            Some(Value::Object(keys)) => AttributeMap::from_json(keys)?,
            _ => return Err(Error::InvalidRecord("missing `dynamodb.Keys`".to_string())),
        };

        let new_image = match stream.get("NewImage") {
            Some(Value::Object(image)) => Some(AttributeMap::from_json(image)?),
            None | Some(Value::Null) => None,
            Some(other) => {
                return Err(Error::InvalidRecord(format!(
                    "`dynamodb.NewImage` must be an object, got {other}"
                )));
            }
        };

        Ok(Self {
            event_id,
            source_locator,
            kind,
            key_attributes,
            new_image,
        })
    }

    /// Renders the event back into the stream record shape.
    #[must_use]
    pub fn to_record(&self) -> Value {
        let mut stream = Map::new();
        stream.insert("Keys".to_string(), Value::Object(self.key_attributes.to_json()));
        if let Some(image) = &self.new_image {
            stream.insert("NewImage".to_string(), Value::Object(image.to_json()));
        }

        let mut record = Map::new();
        if let Some(id) = &self.event_id {
            record.insert("eventID".to_string(), Value::String(id.clone()));
        }
        record.insert(
            "eventName".to_string(),
            Value::String(self.kind.event_name().to_string()),
        );
        record.insert(
            "eventSourceARN".to_string(),
            Value::String(self.source_locator.clone()),
        );
        record.insert("dynamodb".to_string(), Value::Object(stream));
        Value::Object(record)
    }
}

fn string_field<'a>(record: &'a Value, name: &str) -> Result<&'a str> {
    record
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidRecord(format!("missing string field `{name}`")))
}

/// A batch of raw stream records, as delivered by the stream trigger.
///
/// Records stay unparsed so that one malformed record cannot poison the
/// whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamBatch {
    #[serde(rename = "Records", default)]
    pub records: Vec<Value>,
}

impl StreamBatch {
    /// Parses a batch from its JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
