use crate::error::{DecodeError, DecodeResult};
use crate::sanitize::sanitize_field_name;
use serde_json::{Number, Value};
use streamdex_types::{AttributeMap, Document, TaggedValue};

/// Decodes a tagged value into a plain JSON value.
///
/// `force_numeric` controls whether `N` and `NS` payloads are parsed into
/// numbers or kept as strings. Map members are always decoded with
/// `force_numeric = true`; list members always with `false`.
pub fn decode(value: &TaggedValue, force_numeric: bool) -> DecodeResult<Value> {
    match value {
        TaggedValue::Null => Ok(Value::Null),
        TaggedValue::String(s) => Ok(Value::String(s.clone())),
        TaggedValue::Bool(b) => Ok(Value::Bool(*b)),
        TaggedValue::Number(text) if force_numeric => parse_number(text),
        TaggedValue::Number(text) => Ok(Value::String(text.clone())),
        TaggedValue::Map(map) => decode_map(map).map(Value::Object),
        TaggedValue::List(items) => items
            .iter()
            .map(|item| decode(item, false))
            .collect::<DecodeResult<Vec<_>>>()
            .map(Value::Array),
        // Binary members are base64 text on the wire and stay that way.
        TaggedValue::ByteSet(items) | TaggedValue::StringSet(items) => Ok(strings(items)),
        TaggedValue::NumberSet(items) if force_numeric => items
            .iter()
            .map(|text| parse_number(text))
            .collect::<DecodeResult<Vec<_>>>()
            .map(Value::Array),
        TaggedValue::NumberSet(items) => Ok(strings(items)),
    }
}

/// Decodes the members of a map, escaping reserved field names.
pub fn decode_map(map: &AttributeMap) -> DecodeResult<Document> {
    let mut document = Document::new();
    for (name, value) in map.iter() {
        document.insert(sanitize_field_name(name).into_owned(), decode(value, true)?);
    }
    Ok(document)
}

/// Decodes a top-level attribute map (an item image or key set) into a document.
pub fn decode_record(map: &AttributeMap) -> DecodeResult<Document> {
    decode_map(map)
}

/// Parses a raw wire value and decodes it.
pub fn decode_json(value: &Value, force_numeric: bool) -> DecodeResult<Value> {
    let tagged = TaggedValue::from_json(value)?;
    decode(&tagged, force_numeric)
}

/// Parses number text as an integer when possible, otherwise as a float.
///
/// Integers wider than 64 bits keep their exact digits. Text that is neither
/// an integer nor a float, or that only parses to an infinite or NaN float,
/// is an error.
pub fn parse_number(text: &str) -> DecodeResult<Value> {
    if let Ok(int) = text.parse::<i64>() {
        return Ok(Value::Number(int.into()));
    }
    if let Ok(uint) = text.parse::<u64>() {
        return Ok(Value::Number(uint.into()));
    }
    if is_integer_text(text)
        && let Ok(wide) = text.parse::<Number>()
    {
        return Ok(Value::Number(wide));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| DecodeError::NumericParseFailure(text.to_string()))
}

fn is_integer_text(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn strings(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}
