use serde::{de::DeserializeOwned, Serialize};
use serde_json::error::Category;

use crate::error::DecodeError;

pub fn encode<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

/// Decodes `text` into `T`, rejecting any key `T` does not declare.
/// The error names the first such key by its dotted path, e.g. `items.0.extra`.
pub fn decode_strict<T: DeserializeOwned>(text: &str) -> Result<T, DecodeError> {
    let mut unknown: Option<String> = None;
    let mut deserializer = serde_json::Deserializer::from_str(text);
    let decoded: T = serde_ignored::deserialize(&mut deserializer, |path| {
        unknown.get_or_insert_with(|| path.to_string());
    })
    .map_err(classify)?;
    deserializer.end().map_err(DecodeError::Syntax)?;

    match unknown {
        Some(path) => Err(DecodeError::UnknownField { path }),
        None => Ok(decoded),
    }
}

fn classify(err: serde_json::Error) -> DecodeError {
    match err.classify() {
        Category::Data => DecodeError::Shape(err),
        Category::Syntax | Category::Eof | Category::Io => DecodeError::Syntax(err),
    }
}
