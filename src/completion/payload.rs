//! Provider output document
//!
//! The provider prints one JSON object:
//!
//! ```text
//! { "messages": [..], "values": [{ "value", "display", "description", "tag", "style" }], "nospace": ".." }
//! ```
//!
//! Every field is optional. Fields of the wrong type are treated as absent
//! rather than rejected, so a partly unexpected document still yields what
//! it can.

use crate::codec::{self, Value};
use crate::error::Result;

/// One raw candidate record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSpec {
    pub value: String,
    pub display: Option<String>,
    pub description: Option<String>,
    pub tag: Option<String>,
    pub style: Option<String>,
}

/// Decoded provider document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    pub messages: Vec<String>,
    pub values: Vec<CandidateSpec>,
    pub nospace: Option<String>,
}

fn string_field(object: &Value, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

impl CandidateSpec {
    /// Read a candidate from a decoded record; non-objects yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object()?;
        Some(Self {
            value: string_field(value, "value").unwrap_or_default(),
            display: string_field(value, "display"),
            description: string_field(value, "description"),
            tag: string_field(value, "tag"),
            style: string_field(value, "style"),
        })
    }
}

impl Payload {
    /// Interpret a decoded document. Returns `None` unless it is an object.
    pub fn from_value(document: &Value) -> Option<Self> {
        document.as_object()?;

        let messages = document
            .get("messages")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let values = document
            .get("values")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(CandidateSpec::from_value).collect())
            .unwrap_or_default();

        Some(Self {
            messages,
            values,
            nospace: string_field(document, "nospace"),
        })
    }

    /// Decode provider output text.
    ///
    /// # Returns
    /// * `Result<Option<Payload>>` - `None` when the document is not an object
    pub fn decode(text: &str) -> Result<Option<Self>> {
        let document = codec::decode(text)?;
        Ok(Self::from_value(&document))
    }
}
