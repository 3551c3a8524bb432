use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::Debug;
use std::marker::PhantomData;

use crate::error::{Result, UmiError};

/// `code` value the service uses for success.
pub const SUCCESS_CODE: i64 = 100;

pub fn is_success_code(code: i64) -> bool {
    code == SUCCESS_CODE
}

/// A point as `[x, y]`.
pub type Point = [f64; 2];

/// Quadrilateral corners, clockwise from the top-left.
pub type Quad = Vec<Point>;

/// The `data` field of a response.
///
/// On success it holds the typed payload. When the service reports a
/// non-success `code` it holds the diagnostic string it sent instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseData<T> {
    Value(T),
    Message(String),
}

impl<T> ResponseData<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            ResponseData::Value(value) => Some(value),
            ResponseData::Message(_) => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            ResponseData::Value(value) => Some(value),
            ResponseData::Message(_) => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ResponseData::Value(_) => None,
            ResponseData::Message(message) => Some(message),
        }
    }
}

impl<T: DeserializeOwned> ResponseData<T> {
    /// Interprets a raw `data` value according to the response `code`.
    ///
    /// A successful response must decode into `T`, except that a bare string
    /// is kept as a message. Failed responses always become a message.
    pub(crate) fn decode(
        operation: &'static str,
        code: i64,
        data: serde_json::Value,
    ) -> Result<Self> {
        if !is_success_code(code) {
            return Ok(ResponseData::Message(json_to_message(data)));
        }
        match serde_json::from_value::<T>(data.clone()) {
            Ok(value) => Ok(ResponseData::Value(value)),
            Err(_) if data.is_string() => Ok(ResponseData::Message(json_to_message(data))),
            Err(e) => Err(UmiError::Decode {
                operation,
                message: format!("unexpected data for code {code}: {e}"),
            }),
        }
    }
}

fn json_to_message(data: serde_json::Value) -> String {
    match data {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Wire value of the `data.format` / `format` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResultFormat {
    /// Raw dictionaries with positions and scores.
    #[default]
    Dict,
    /// Plain text.
    Text,
}

impl std::fmt::Display for ResultFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dict => write!(f, "dict"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// Selects, at compile time, which shape recognized content takes.
///
/// The requested `format` is derived from the implementing type, so a
/// caller cannot ask for one shape and decode the other.
pub trait DataFormat: Debug + Clone + Copy + Default + Send + Sync + 'static {
    const FORMAT: ResultFormat;

    /// `data` of an image OCR result.
    type ImageData: DeserializeOwned + Serialize + Debug + Clone + PartialEq + Send + Sync + 'static;

    /// One entry of a document query result.
    type DocEntry: DeserializeOwned + Serialize + Debug + Clone + PartialEq + Send + Sync + 'static;
}

/// Serializes as the wire name of `F`'s format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatTag<F>(PhantomData<F>);

impl<F: DataFormat> Serialize for FormatTag<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        F::FORMAT.serialize(serializer)
    }
}
