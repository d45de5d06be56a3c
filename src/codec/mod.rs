//! Request codec: typed values to wire bodies and back.
//!
//! Decoding never panics and never leaks a parse failure as a crash. The service
//! sometimes answers with the bare texts `None` or `Expected object or value`
//! instead of an object; those map onto the target type's null variant with the
//! literal text as the diagnostic. Every other malformed payload is reported as
//! [`Error::Decode`], which callers fold into a null variant via [`decode_or_null`].

use crate::model::NullVariant;
use crate::utils::error::{Error, Result};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Payload texts the service uses in place of a real object.
pub const SENTINELS: [&str; 2] = ["None", "Expected object or value"];

/// Serializes a request value to its JSON wire body.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Returns the sentinel a body consists of, if any.
///
/// Accepts both the bare text and the JSON string literal form (`"None"`).
pub fn sentinel(body: &str) -> Option<&'static str> {
    let trimmed = body.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed);
    SENTINELS.iter().copied().find(|s| *s == unquoted)
}

/// Decodes a response body into `T`.
///
/// Sentinel payloads decode successfully into `T::null(sentinel)`. Every result
/// type is a JSON object on the wire; any other shape is a decode error.
pub fn decode<T: DeserializeOwned + NullVariant>(body: &str) -> Result<T> {
    if let Some(text) = sentinel(body) {
        return Ok(T::null(text));
    }
    let value: Value = serde_json::from_str(body).map_err(|e| Error::Decode(e.to_string()))?;
    decode_value(value)
}

/// Like [`decode`], but a failure becomes the null variant carrying the error text.
pub fn decode_or_null<T: DeserializeOwned + NullVariant>(body: &str) -> T {
    decode(body).unwrap_or_else(|e| T::null(e.to_string()))
}

/// Decodes an already-parsed JSON value, applying the same sentinel rules.
///
/// JSON `null` is treated like the `None` sentinel.
pub fn decode_value<T: DeserializeOwned + NullVariant>(value: Value) -> Result<T> {
    let found = match &value {
        | Value::Null => Some(SENTINELS[0]),
        | Value::String(text) => sentinel(text),
        | _ => None,
    };
    if let Some(text) = found {
        return Ok(T::null(text));
    }
    if !value.is_object() {
        return Err(Error::Decode(format!("expected a JSON object, got {}", kind(&value))));
    }
    serde_json::from_value(value).map_err(|e| Error::Decode(e.to_string()))
}

fn kind(value: &Value) -> &'static str {
    match value {
        | Value::Null => "null",
        | Value::Bool(_) => "a boolean",
        | Value::Number(_) => "a number",
        | Value::String(_) => "a string",
        | Value::Array(_) => "an array",
        | Value::Object(_) => "an object",
    }
}

/// `deserialize_with` adapter for nested result values.
///
/// A malformed nested value degrades to its null variant instead of failing the
/// enclosing object.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + NullVariant,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decode_value(value).unwrap_or_else(|e| T::null(e.to_string())))
}

/// `deserialize_with` adapter for opaque artifact payloads.
///
/// Strings are kept verbatim, any other JSON value is kept as its compact text.
/// A sentinel string means the artifact is absent.
pub(crate) fn opaque<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        | None | Some(Value::Null) => None,
        | Some(Value::String(text)) if sentinel(&text).is_some() => None,
        | Some(Value::String(text)) => Some(text),
        | Some(other) => Some(other.to_string()),
    })
}

/// `deserialize_with` adapter for result flags sent either as a JSON bool or as
/// a `"yes"`/`"no"` token.
pub(crate) fn loose_flag<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        | None | Some(Value::Null) => Ok(None),
        | Some(Value::Bool(flag)) => Ok(Some(flag)),
        | Some(Value::String(token)) => match token.to_ascii_lowercase().as_str() {
            | "yes" | "true" => Ok(Some(true)),
            | "no" | "false" => Ok(Some(false)),
            | _ => Err(D::Error::custom(format!("unexpected flag token {:?}", token))),
        },
        | Some(other) => Err(D::Error::custom(format!("unexpected flag value {}", other))),
    }
}

/// Literal `yes`/`no` tokens used for boolean flags on the wire.
pub mod yes_no {
    use super::*;
    use serde::Serializer;

    pub const YES: &str = "yes";
    pub const NO: &str = "no";

    pub fn token(flag: bool) -> &'static str {
        if flag {
            YES
        } else {
            NO
        }
    }

    /// Parses a token, naming the offending field when it is neither `yes` nor `no`.
    pub fn parse(field: &'static str, token: &str) -> Result<bool> {
        match token {
            | YES => Ok(true),
            | NO => Ok(false),
            | other => Err(Error::OutOfRange { field, value: other.to_string() }),
        }
    }

    pub fn serialize<S: Serializer>(flag: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(token(*flag))
    }
}
